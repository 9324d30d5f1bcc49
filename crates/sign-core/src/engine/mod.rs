//! Engine module: orquestación de un ciclo de generación.

pub mod orchestrator;

pub use orchestrator::{CycleReport, GenerationOrchestrator, RenderingReport, Submission};
