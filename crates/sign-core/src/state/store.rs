//! `WorkflowStateStore`: contenedor del estado de generación.
//!
//! Tres campos independientes (source, html, pdfs por engine). Cada mutador
//! toca un único campo y es atómico sólo respecto a ese campo; escrituras
//! concurrentes sobre el mismo campo quedan en orden de finalización
//! (last-write-wins). Los pdfs viven en un mapa concurrente por engine, de
//! modo que dos engines nunca compiten entre sí.
//!
//! Los renderers se suscriben con `subscribe()` y, al recibir un
//! `StateChange`, leen el estado actual con los accesores o `snapshot()`.
use dashmap::DashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;

use super::source::{DocumentSource, GenerationResult};

const CHANGE_CAPACITY: usize = 64;

/// Campo que cambió. El receptor lee el valor nuevo del store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateChange {
    Source,
    Html,
    Pdf { engine: String },
}

/// Qué hacer con una finalización que llega después de otra más nueva.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompletionPolicy {
    /// Se aplica siempre, en orden de finalización (comportamiento base).
    #[default]
    LastWriteWins,
    /// Se descarta si ya se aplicó un ciclo con ticket mayor.
    DiscardStale,
}

/// Número de secuencia monótono de un ciclo de envío.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionTicket(pub u64);

/// Copia inmutable del estado para renderizar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub source: Option<DocumentSource>,
    pub result: GenerationResult,
}

pub struct WorkflowStateStore {
    source: RwLock<Option<DocumentSource>>,
    html_ref: RwLock<Option<String>>,
    pdf_refs: DashMap<String, String>,
    policy: CompletionPolicy,
    next_ticket: AtomicU64,
    // ticket más alto cuya generación HTML ya se aplicó (0 = ninguno)
    committed: AtomicU64,
    changes: broadcast::Sender<StateChange>,
}

impl WorkflowStateStore {
    pub fn new() -> Self {
        Self::with_policy(CompletionPolicy::default())
    }

    pub fn with_policy(policy: CompletionPolicy) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self { source: RwLock::new(None),
               html_ref: RwLock::new(None),
               pdf_refs: DashMap::new(),
               policy,
               next_ticket: AtomicU64::new(1),
               committed: AtomicU64::new(0),
               changes }
    }

    pub fn policy(&self) -> CompletionPolicy {
        self.policy
    }

    /// Suscripción a cambios; cada receptor ve los cambios posteriores a su alta.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    fn notify(&self, change: StateChange) {
        // sin receptores no es un error
        let _ = self.changes.send(change);
    }

    // ---- mutadores por campo ----

    pub fn set_source(&self, source: DocumentSource) {
        *self.source.write().unwrap_or_else(PoisonError::into_inner) = Some(source);
        self.notify(StateChange::Source);
    }

    pub fn set_html(&self, html_ref: impl Into<String>) {
        *self.html_ref.write().unwrap_or_else(PoisonError::into_inner) = Some(html_ref.into());
        self.notify(StateChange::Html);
    }

    pub fn set_pdf(&self, engine: impl Into<String>, pdf_ref: impl Into<String>) {
        let engine = engine.into();
        self.pdf_refs.insert(engine.clone(), pdf_ref.into());
        self.notify(StateChange::Pdf { engine });
    }

    // ---- commits con ticket ----

    /// Reserva el ticket del siguiente ciclo.
    pub fn issue_ticket(&self) -> SubmissionTicket {
        SubmissionTicket(self.next_ticket.fetch_add(1, Ordering::SeqCst))
    }

    fn is_stale(&self, ticket: SubmissionTicket) -> bool {
        self.policy == CompletionPolicy::DiscardStale && ticket.0 < self.committed.load(Ordering::SeqCst)
    }

    /// Aplica el resultado HTML de un ciclo: html, nueva source, y descarta
    /// los pdfs del HTML anterior. Devuelve `false` si la política lo descartó.
    pub fn commit_generation(&self, ticket: SubmissionTicket, html_ref: &str, source: DocumentSource) -> bool {
        let previous = self.committed.fetch_max(ticket.0, Ordering::SeqCst);
        if self.policy == CompletionPolicy::DiscardStale && previous > ticket.0 {
            warn!("discarding stale generation ticket={} (newest={previous})", ticket.0);
            return false;
        }
        // html y pdfs cambian bajo el mismo lock: un commit_pdf concurrente ve
        // el html viejo con sus pdfs o el nuevo sin ninguno
        let obsolete: Vec<String> = {
            let mut html = self.html_ref.write().unwrap_or_else(PoisonError::into_inner);
            let obsolete = self.pdf_refs.iter().map(|e| e.key().clone()).collect::<Vec<_>>();
            self.pdf_refs.clear();
            *html = Some(html_ref.to_string());
            obsolete
        };
        for engine in obsolete {
            self.notify(StateChange::Pdf { engine });
        }
        self.notify(StateChange::Html);
        self.set_source(source);
        debug!("generation committed ticket={} html={html_ref}", ticket.0);
        true
    }

    /// Aplica la referencia PDF de un engine, renderizada desde `html_ref`,
    /// para el ciclo `ticket`. Con `DiscardStale` se descarta si el ciclo es
    /// viejo o si `html_ref` ya no es el HTML vigente.
    pub fn commit_pdf(&self, ticket: SubmissionTicket, html_ref: &str, engine: &str, pdf_ref: &str) -> bool {
        {
            let html = self.html_ref.read().unwrap_or_else(PoisonError::into_inner);
            if self.policy == CompletionPolicy::DiscardStale {
                if self.is_stale(ticket) {
                    warn!("discarding stale pdf engine={engine} ticket={}", ticket.0);
                    return false;
                }
                if let Some(current) = html.as_deref().filter(|current| *current != html_ref) {
                    warn!("discarding pdf engine={engine} of {html_ref}: current html is {current}");
                    return false;
                }
            }
            self.pdf_refs.insert(engine.to_string(), pdf_ref.to_string());
        }
        self.notify(StateChange::Pdf { engine: engine.to_string() });
        true
    }

    // ---- accesores ----

    pub fn source(&self) -> Option<DocumentSource> {
        self.source.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn html_ref(&self) -> Option<String> {
        self.html_ref.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn pdf_ref(&self, engine: &str) -> Option<String> {
        self.pdf_refs.get(engine).map(|r| r.value().clone())
    }

    pub fn pdf_refs(&self) -> BTreeMap<String, String> {
        self.pdf_refs
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot { source: self.source(),
                        result: GenerationResult { html_ref: self.html_ref(),
                                                   pdf_refs: self.pdf_refs() } }
    }
}

impl Default for WorkflowStateStore {
    fn default() -> Self {
        Self::new()
    }
}
