pub mod types;
pub use types::{CycleInstance, CycleRepository, EngineSlot, InMemoryCycleRepository, RenderStatus, SubmissionPhase};
