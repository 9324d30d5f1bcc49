use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::{GenerationEvent, GenerationEventKind};

/// Almacenamiento de eventos append-only.
///
/// Recibe `&self`: las finalizaciones de pdf de distintos engines registran
/// eventos del mismo ciclo de forma concurrente.
pub trait EventStore: Send + Sync {
    /// Agrega un evento a partir de su kind y devuelve el evento completo (con seq y ts).
    fn append_kind(&self, cycle_id: Uuid, kind: GenerationEventKind) -> GenerationEvent;
    /// Lista eventos de un ciclo (orden ascendente por seq).
    fn list(&self, cycle_id: Uuid) -> Vec<GenerationEvent>;
}

#[derive(Default)]
pub struct InMemoryEventStore {
    inner: DashMap<Uuid, Vec<GenerationEvent>>,
}

impl InMemoryEventStore {
    /// Ciclos registrados hasta ahora.
    pub fn cycles(&self) -> Vec<Uuid> {
        self.inner.iter().map(|e| *e.key()).collect()
    }
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&self, cycle_id: Uuid, kind: GenerationEventKind) -> GenerationEvent {
        let mut events = self.inner.entry(cycle_id).or_default();
        let seq = events.len() as u64;
        let ev = GenerationEvent { seq, cycle_id, kind, ts: Utc::now() };
        events.push(ev.clone());
        ev
    }

    fn list(&self, cycle_id: Uuid) -> Vec<GenerationEvent> {
        self.inner.get(&cycle_id).map(|e| e.value().clone()).unwrap_or_default()
    }
}
