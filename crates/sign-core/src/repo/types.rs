//! Estado reconstruido de un ciclo (`CycleInstance`) a partir de sus eventos.
//!
//! El repositorio aplica un replay lineal: consume eventos en orden de `seq`
//! y actualiza la fase del envío y el estado de cada engine.
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::WorkflowError;
use crate::event::{GenerationEvent, GenerationEventKind};

/// Fase del envío. Un envío fallido vuelve a `Idle`.
///
/// Transiciones válidas:
/// - `Idle` -> `Submitting`
/// - `Submitting` -> `HtmlReady`
/// - `Submitting` -> `Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Submitting,
    HtmlReady,
}

/// Sub-estado de un engine dentro del ciclo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Requested,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSlot {
    pub engine: String,
    pub status: RenderStatus,
    pub pdf_ref: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleInstance {
    pub id: Uuid,
    pub phase: SubmissionPhase,
    pub html_ref: Option<String>,
    pub source_ref: Option<String>,
    pub last_error: Option<WorkflowError>,
    /// En orden de pedido.
    pub engines: Vec<EngineSlot>,
    pub discarded: Vec<String>,
}

impl CycleInstance {
    pub fn engine(&self, name: &str) -> Option<&EngineSlot> {
        self.engines.iter().find(|e| e.engine == name)
    }

    /// Todos los engines pedidos terminaron (bien o mal).
    pub fn renderings_settled(&self) -> bool {
        self.engines.iter().all(|e| e.status != RenderStatus::Requested)
    }
}

/// Trait para reconstruir (`replay`) el estado de un ciclo a partir de eventos.
pub trait CycleRepository {
    fn load(&self, cycle_id: Uuid, events: &[GenerationEvent]) -> CycleInstance;
}

#[derive(Debug, Default)]
pub struct InMemoryCycleRepository;

impl InMemoryCycleRepository {
    pub fn new() -> Self {
        Self
    }
}

impl CycleRepository for InMemoryCycleRepository {
    fn load(&self, cycle_id: Uuid, events: &[GenerationEvent]) -> CycleInstance {
        let mut cycle = CycleInstance { id: cycle_id,
                                        phase: SubmissionPhase::Idle,
                                        html_ref: None,
                                        source_ref: None,
                                        last_error: None,
                                        engines: Vec::new(),
                                        discarded: Vec::new() };
        for ev in events {
            match &ev.kind {
                GenerationEventKind::SubmissionStarted { .. } => {
                    cycle.phase = SubmissionPhase::Submitting;
                    cycle.last_error = None;
                }
                GenerationEventKind::HtmlReady { html_ref, source_ref } => {
                    cycle.phase = SubmissionPhase::HtmlReady;
                    cycle.html_ref = Some(html_ref.clone());
                    cycle.source_ref = Some(source_ref.clone());
                }
                GenerationEventKind::SubmissionFailed { error } => {
                    cycle.phase = SubmissionPhase::Idle;
                    cycle.last_error = Some(error.clone());
                }
                GenerationEventKind::PdfRequested { engine } => {
                    cycle.engines.push(EngineSlot { engine: engine.clone(),
                                                    status: RenderStatus::Requested,
                                                    pdf_ref: None,
                                                    requested_at: ev.ts,
                                                    finished_at: None });
                }
                GenerationEventKind::PdfReady { engine, pdf_ref } => {
                    if let Some(slot) = cycle.engines.iter_mut().find(|s| &s.engine == engine) {
                        slot.status = RenderStatus::Ready;
                        slot.pdf_ref = Some(pdf_ref.clone());
                        slot.finished_at = Some(ev.ts);
                    }
                }
                GenerationEventKind::PdfFailed { engine, .. } => {
                    if let Some(slot) = cycle.engines.iter_mut().find(|s| &s.engine == engine) {
                        slot.status = RenderStatus::Failed;
                        slot.finished_at = Some(ev.ts);
                    }
                }
                GenerationEventKind::CompletionDiscarded { target } => cycle.discarded.push(target.clone()),
            }
        }
        cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventStore, InMemoryEventStore};
    use crate::payload::SubmissionMode;

    #[test]
    fn replay_tracks_engines_independently() {
        let store = InMemoryEventStore::default();
        let id = Uuid::new_v4();
        store.append_kind(id, GenerationEventKind::SubmissionStarted { mode: SubmissionMode::Form,
                                                                       fingerprint: "fp".into(),
                                                                       field_count: 2 });
        store.append_kind(id, GenerationEventKind::HtmlReady { html_ref: "doc123".into(), source_ref: "src456".into() });
        store.append_kind(id, GenerationEventKind::PdfRequested { engine: "default".into() });
        store.append_kind(id, GenerationEventKind::PdfRequested { engine: "raptor".into() });
        store.append_kind(id, GenerationEventKind::PdfReady { engine: "raptor".into(), pdf_ref: "pdfB".into() });

        let cycle = InMemoryCycleRepository::new().load(id, &store.list(id));
        assert_eq!(cycle.phase, SubmissionPhase::HtmlReady);
        assert_eq!(cycle.engine("raptor").unwrap().status, RenderStatus::Ready);
        assert_eq!(cycle.engine("default").unwrap().status, RenderStatus::Requested);
        assert!(!cycle.renderings_settled());

        store.append_kind(id, GenerationEventKind::PdfFailed { engine: "default".into(),
                                                               error: WorkflowError::Transport("reset".into()) });
        let cycle = InMemoryCycleRepository::new().load(id, &store.list(id));
        assert_eq!(cycle.engine("default").unwrap().status, RenderStatus::Failed);
        assert!(cycle.engine("default").unwrap().pdf_ref.is_none());
        assert!(cycle.renderings_settled());
    }

    #[test]
    fn failed_submission_returns_to_idle() {
        let id = Uuid::new_v4();
        let store = InMemoryEventStore::default();
        store.append_kind(id, GenerationEventKind::SubmissionStarted { mode: SubmissionMode::Json,
                                                                       fingerprint: "fp".into(),
                                                                       field_count: 0 });
        store.append_kind(id, GenerationEventKind::SubmissionFailed { error: WorkflowError::Transport("down".into()) });
        let cycle = InMemoryCycleRepository::new().load(id, &store.list(id));
        assert_eq!(cycle.phase, SubmissionPhase::Idle);
        assert!(cycle.html_ref.is_none());
        assert!(cycle.engines.is_empty());
        assert!(cycle.last_error.is_some());
    }
}
