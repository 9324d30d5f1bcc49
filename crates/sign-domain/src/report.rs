// report.rs
//! Modelo del reporte de inspección (payload estructurado del formulario).
//!
//! Es la forma del JSON que el backend acepta en `/jsonhtmlgen` y que publica
//! como source reference. Todos los campos son opcionales al deserializar:
//! el frontend puede enviar formularios parciales y el backend valida.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{DataUri, DomainError};

/// Firma manuscrita de una persona.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signature {
    pub name: String,
    pub role: String,
    /// Debe coincidir con el creador para considerar que el reporte fue firmado por él.
    pub email: String,
    #[serde(deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub data_uri: Option<DataUri>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Case {
    pub title: String,
    pub images: Vec<String>,
    pub category: String,
    pub status: String,
    pub details: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Information {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
    pub postcode: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Unit {
    pub information: Information,
}

/// Elemento de inventario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub name: String,
    pub images: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Room {
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub cases: Vec<Case>,
    pub inventory: Vec<Item>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Report {
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub cases: Vec<Case>,
    pub inventory: Vec<Item>,
    pub rooms: Vec<Room>,
    pub comments: String,
}

/// Estructura raíz de un reporte.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionReport {
    pub id: String,
    pub logo: String,
    pub date: Option<DateTime<Utc>>,
    pub signatures: Vec<Signature>,
    pub unit: Unit,
    pub report: Report,
    /// URL de una plantilla alternativa; vacío usa la plantilla por defecto del backend.
    pub template: String,
    /// Conserva `id` y fecha tal cual en lugar de sufijar un identificador aleatorio.
    pub force: bool,
}

impl InspectionReport {
    /// Interpreta el contenido crudo de un document source.
    pub fn from_source(content: &str) -> Result<Self, DomainError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn signed_count(&self) -> usize {
        self.signatures.iter().filter(|s| s.data_uri.is_some()).count()
    }
}

// Los formularios serializan una firma ausente como "" en lugar de omitirla.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<DataUri>, D::Error>
    where D: Deserializer<'de>
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => DataUri::parse(s).map(Some).map_err(serde::de::Error::custom),
    }
}
