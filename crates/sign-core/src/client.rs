//! Interfaz con el backend de generación de documentos.
//!
//! El core sólo conoce este trait; la implementación HTTP vive en
//! `sign-adapters`. Todas las llamadas son puntos de suspensión del ciclo.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::DEFAULT_ENGINE;
use crate::errors::WorkflowError;
use crate::payload::{FormSubmission, JsonSubmission};

/// Respuesta de `/htmlgen` y `/jsonhtmlgen`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlGenResponse {
    /// Referencia al HTML generado.
    #[serde(rename = "HTML")]
    pub html: String,
    /// Nueva source reference del payload que produjo ese HTML.
    #[serde(rename = "JSON")]
    pub json: String,
}

/// Respuesta de `/pdfgen`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfGenResponse {
    #[serde(rename = "PDF")]
    pub pdf: String,
}

/// Variante de backend de renderizado PDF.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RenderEngine(String);

impl RenderEngine {
    pub fn named(name: impl Into<String>) -> Self {
        RenderEngine(name.into())
    }

    pub fn default_engine() -> Self {
        RenderEngine(DEFAULT_ENGINE.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_ENGINE
    }

    /// Valor del selector `svc`; el engine por defecto no lo envía.
    pub fn selector(&self) -> Option<&str> {
        if self.is_default() {
            None
        } else {
            Some(&self.0)
        }
    }

    /// Parsea una lista separada por comas (`"default,raptor"`), ignorando
    /// vacíos y duplicados.
    pub fn parse_list(list: &str) -> Vec<RenderEngine> {
        let mut out: Vec<RenderEngine> = Vec::new();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let engine = RenderEngine::named(name);
            if !out.contains(&engine) {
                out.push(engine);
            }
        }
        out
    }
}

impl fmt::Display for RenderEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait RemoteGenerationClient: Send + Sync {
    /// GET del contenido crudo de un document source.
    async fn fetch_source(&self, reference: &str) -> Result<String, WorkflowError>;

    /// POST multipart a `/htmlgen`.
    async fn generate_html(&self, submission: &FormSubmission) -> Result<HtmlGenResponse, WorkflowError>;

    /// POST JSON a `/jsonhtmlgen`.
    async fn generate_html_json(&self, submission: &JsonSubmission) -> Result<HtmlGenResponse, WorkflowError>;

    /// GET `/pdfgen?url=<html_ref>[&svc=<engine>]`.
    async fn render_pdf(&self, html_ref: &str, engine: &RenderEngine) -> Result<PdfGenResponse, WorkflowError>;
}
