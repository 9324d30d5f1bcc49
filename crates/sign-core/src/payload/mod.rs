//! Cuerpos de envío hacia el backend de generación.
//!
//! Dos modos mutuamente excluyentes por llamada:
//! - `Form`: multipart/form-data con los campos del formulario más un campo
//!   por firma (`/htmlgen`).
//! - `Json`: el reporte completo como cuerpo JSON (`/jsonhtmlgen`).
//!
//! En ambos el token anti-forgery viaja aparte (cabecera), nunca como campo.

mod merge;

pub use merge::merge_fields;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::CSRF_FORM_FIELD;
use crate::hashing::hash_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionMode {
    Form,
    Json,
}

/// Entradas del formulario distintas de las firmas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInputs {
    pub fields: IndexMap<String, String>,
    /// Token anti-forgery opaco (emitido por el backend junto con la página).
    pub csrf_token: Option<String>,
}

impl FormInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construye las entradas a partir de los elementos del formulario tal
    /// como los entrega la página. El campo del token se extrae y no se envía
    /// como campo.
    pub fn from_fields<I, K, V>(elements: I) -> Self
        where I: IntoIterator<Item = (K, V)>,
              K: Into<String>,
              V: Into<String>
    {
        let mut fields: IndexMap<String, String> = elements.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        let csrf_token = fields.shift_remove(CSRF_FORM_FIELD);
        Self { fields, csrf_token }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }
}

/// Cuerpo multipart listo para `/htmlgen`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub fields: IndexMap<String, String>,
    pub csrf_token: Option<String>,
}

impl FormSubmission {
    /// Fusiona las entradas con los campos de firma; los de firma prevalecen.
    pub fn merge(inputs: &FormInputs, signature_fields: &IndexMap<String, String>) -> Self {
        Self { fields: merge_fields(&inputs.fields, signature_fields),
               csrf_token: inputs.csrf_token.clone() }
    }

    /// Huella determinista de los campos (el token no participa).
    pub fn fingerprint(&self) -> String {
        hash_value(&json!(self.fields))
    }
}

/// Cuerpo JSON listo para `/jsonhtmlgen`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonSubmission {
    pub payload: Value,
    pub csrf_token: Option<String>,
}

impl JsonSubmission {
    pub fn new(payload: Value, csrf_token: Option<String>) -> Self {
        Self { payload, csrf_token }
    }

    pub fn fingerprint(&self) -> String {
        hash_value(&self.payload)
    }

    /// Número de claves de primer nivel (sólo informativo para el log).
    pub fn field_count(&self) -> usize {
        self.payload.as_object().map(|m| m.len()).unwrap_or(0)
    }
}
