//! Codificación de imagen de una firma.
//!
//! El widget de captura entrega el contenido del canvas como un data URI
//! (`data:image/png;base64,...`). Este módulo sólo valida la forma y permite
//! decodificar el payload; el algoritmo de codificación es del widget.
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::DomainError;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataUri {
    raw: String,
    // posición de la coma que separa cabecera y payload
    comma: usize,
}

impl DataUri {
    /// Valida y construye un data URI a partir de su forma textual.
    ///
    /// # Errores
    /// `DomainError::InvalidDataUri` si falta el esquema `data:`, la coma
    /// separadora, o si un payload marcado como base64 no decodifica.
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if !raw.starts_with(SCHEME) {
            return Err(DomainError::InvalidDataUri("falta el esquema data:".to_string()));
        }
        let comma = raw.find(',')
                       .ok_or_else(|| DomainError::InvalidDataUri("falta la coma separadora".to_string()))?;
        let uri = DataUri { raw, comma };
        if uri.is_base64() {
            STANDARD.decode(uri.payload())
                    .map_err(|e| DomainError::InvalidDataUri(format!("payload base64: {e}")))?;
        }
        Ok(uri)
    }

    /// Codifica bytes crudos de imagen como data URI base64.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        let header = format!("{SCHEME}{mime}{BASE64_MARKER}");
        let comma = header.len();
        DataUri { raw: format!("{header},{}", STANDARD.encode(bytes)),
                  comma }
    }

    fn header(&self) -> &str {
        &self.raw[SCHEME.len()..self.comma]
    }

    fn payload(&self) -> &str {
        &self.raw[self.comma + 1..]
    }

    /// Tipo MIME declarado (vacío equivale a `text/plain` según RFC 2397).
    pub fn mime(&self) -> &str {
        self.header().split(';').next().unwrap_or_default()
    }

    pub fn is_base64(&self) -> bool {
        self.header().ends_with(BASE64_MARKER)
    }

    /// Bytes del payload. Para payloads no-base64 se devuelven tal cual.
    pub fn decode(&self) -> Result<Vec<u8>, DomainError> {
        if self.is_base64() {
            STANDARD.decode(self.payload())
                    .map_err(|e| DomainError::InvalidDataUri(format!("payload base64: {e}")))
        } else {
            Ok(self.payload().as_bytes().to_vec())
        }
    }

    /// Huella sha256 (hex) del texto completo; útil para trazas sin volcar la imagen.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.raw.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl TryFrom<String> for DataUri {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DataUri::parse(value)
    }
}

impl From<DataUri> for String {
    fn from(value: DataUri) -> Self {
        value.raw
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<data-uri {} ({} bytes)>", self.mime(), self.raw.len())
    }
}
