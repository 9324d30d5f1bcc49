//! Document source y resultado de generación.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::WorkflowError;

/// Origen del payload estructurado del formulario. Exactamente una forma es
/// autoritativa en cada momento.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentSource {
    /// Referencia opaca devuelta por el backend tras generar (campo `JSON`).
    Reference(String),
    /// Contenido crudo obtenido al cargar (o editado localmente).
    /// `origin` es la referencia de la que se obtuvo, si la hay.
    Payload { content: String, origin: Option<String> },
}

impl DocumentSource {
    /// Referencia asociada: la propia, o el origen del payload.
    pub fn reference(&self) -> Option<&str> {
        match self {
            DocumentSource::Reference(r) => Some(r),
            DocumentSource::Payload { origin, .. } => origin.as_deref(),
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            DocumentSource::Reference(_) => None,
            DocumentSource::Payload { content, .. } => Some(content),
        }
    }

    /// Interpreta el contenido como JSON (sólo payloads).
    pub fn as_json(&self) -> Result<Value, WorkflowError> {
        let content = self.content()
                          .ok_or_else(|| WorkflowError::InvalidSource("source is a bare reference; load it first".into()))?;
        serde_json::from_str(content).map_err(|e| WorkflowError::InvalidSource(e.to_string()))
    }
}

/// Referencias producidas por un ciclo de generación.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub html_ref: Option<String>,
    pub pdf_refs: BTreeMap<String, String>,
}
