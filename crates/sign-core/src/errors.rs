//! Errores del core de orquestación.
//!
//! Son `Clone + Serialize` para poder registrarlos dentro de los eventos del
//! ciclo (`SubmissionFailed`, `PdfFailed`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum WorkflowError {
    #[error("invalid signature slot {index} (signatures needed: {needed})")] InvalidSlotIndex { index: usize, needed: usize },
    #[error("transport: {0}")] Transport(String),
    #[error("backend answered {status} on {endpoint}")] BackendStatus { endpoint: String, status: u16 },
    #[error("malformed response from {endpoint}: {detail}")] MalformedResponse { endpoint: String, detail: String },
    #[error("could not fetch document source {reference}: {detail}")] SourceFetch { reference: String, detail: String },
    #[error("invalid document source: {0}")] InvalidSource(String),
    #[error("history: {0}")] History(String),
    #[error("internal: {0}")] Internal(String),
}

impl WorkflowError {
    /// Errores de red o de estado HTTP (los que la UI suele ofrecer reintentar a mano).
    pub fn is_remote(&self) -> bool {
        matches!(self,
                 WorkflowError::Transport(_)
                 | WorkflowError::BackendStatus { .. }
                 | WorkflowError::MalformedResponse { .. }
                 | WorkflowError::SourceFetch { .. })
    }
}

impl From<sign_domain::DomainError> for WorkflowError {
    fn from(e: sign_domain::DomainError) -> Self {
        WorkflowError::InvalidSource(e.to_string())
    }
}
