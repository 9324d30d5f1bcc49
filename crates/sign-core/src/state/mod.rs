//! Estado del workflow: document source y resultado de generación.

mod source;
mod store;

pub use source::{DocumentSource, GenerationResult};
pub use store::{CompletionPolicy, StateChange, StateSnapshot, SubmissionTicket, WorkflowStateStore};
