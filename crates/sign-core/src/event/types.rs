//! Tipos de evento del ciclo de generación y estructura `GenerationEvent`.
//!
//! Rol en el flujo:
//! - El orquestador emite un evento por cada transición de la máquina de
//!   estados (envío, HTML listo, pdf pedido / listo / fallido).
//! - Los eventos permiten reconstruir el estado de un ciclo (`CycleRepository`)
//!   sin que el orquestador guarde estado propio.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::WorkflowError;
use crate::payload::SubmissionMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GenerationEventKind {
    /// Idle -> Submitting. `fingerprint` es el hash canónico del cuerpo enviado.
    SubmissionStarted { mode: SubmissionMode, fingerprint: String, field_count: usize },
    /// Submitting -> HtmlReady.
    HtmlReady { html_ref: String, source_ref: String },
    /// Submitting -> Idle. No se escribió nada en el store.
    SubmissionFailed { error: WorkflowError },
    /// Pedido de renderizado emitido para un engine.
    PdfRequested { engine: String },
    /// Renderizado terminado; `pdf_ref` quedó en el store.
    PdfReady { engine: String, pdf_ref: String },
    /// Renderizado fallido; la referencia de ese engine queda ausente.
    PdfFailed { engine: String, error: WorkflowError },
    /// Una finalización llegó tarde y la política del store la descartó.
    CompletionDiscarded { target: String },
}

impl GenerationEventKind {
    /// Etiqueta corta (útil para comparar secuencias en tests y logs).
    pub fn label(&self) -> &'static str {
        match self {
            GenerationEventKind::SubmissionStarted { .. } => "submit",
            GenerationEventKind::HtmlReady { .. } => "html",
            GenerationEventKind::SubmissionFailed { .. } => "submit-failed",
            GenerationEventKind::PdfRequested { .. } => "pdf-requested",
            GenerationEventKind::PdfReady { .. } => "pdf",
            GenerationEventKind::PdfFailed { .. } => "pdf-failed",
            GenerationEventKind::CompletionDiscarded { .. } => "discarded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationEvent {
    pub seq: u64, // asignado por el EventStore (orden append dentro del ciclo)
    pub cycle_id: Uuid,
    pub kind: GenerationEventKind,
    pub ts: DateTime<Utc>, // metadato
}
