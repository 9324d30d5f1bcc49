//! sign-core: captura de firmas y ciclo de generación HTML → PDF.
pub mod client;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod payload;
pub mod repo;
pub mod signature;
pub mod state;
pub mod url_sync;

pub use client::{HtmlGenResponse, PdfGenResponse, RemoteGenerationClient, RenderEngine};
pub use engine::{CycleReport, GenerationOrchestrator, RenderingReport, Submission};
pub use errors::WorkflowError;
pub use event::{EventStore, GenerationEvent, GenerationEventKind, InMemoryEventStore};
pub use payload::{FormInputs, FormSubmission, JsonSubmission, SubmissionMode};
pub use repo::{CycleInstance, CycleRepository, InMemoryCycleRepository};
pub use signature::{DrawingSurface, SignatureCapture, SignatureCollection, SlotUpdate, StaticImageSurface};
pub use state::{CompletionPolicy, DocumentSource, StateChange, StateSnapshot, SubmissionTicket, WorkflowStateStore};
pub use url_sync::{HistoryPort, MemoryHistory, UrlStateSync};
