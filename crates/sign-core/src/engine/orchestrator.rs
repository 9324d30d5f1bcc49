//! `GenerationOrchestrator`: secuencia envío → HTML → PDFs.
//!
//! Por ciclo:
//!
//! ```text
//! Idle -> Submitting -> HtmlReady -> PdfRequested(engine) -> PdfReady(engine)
//! ```
//!
//! - El HTML siempre se espera antes de pedir cualquier PDF (los pedidos se
//!   parametrizan con la referencia HTML).
//! - Los PDFs de distintos engines se piden a la vez sobre la misma tarea y
//!   cada uno escribe su referencia al terminar; un engine lento o fallido no
//!   bloquea ni cancela a los demás.
//! - Un envío fallido no escribe nada: ni HTML, ni source, ni URL.
//!
//! El orquestador no guarda estado propio: lee y escribe el store, lee la
//! colección de firmas y deja cada transición en el event log.
use futures::future::join_all;
use log::{debug, error, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::client::{HtmlGenResponse, RemoteGenerationClient, RenderEngine};
use crate::errors::WorkflowError;
use crate::event::{EventStore, GenerationEventKind, InMemoryEventStore};
use crate::payload::{FormInputs, FormSubmission, JsonSubmission, SubmissionMode};
use crate::repo::{CycleInstance, CycleRepository, InMemoryCycleRepository};
use crate::signature::SignatureCollection;
use crate::state::{DocumentSource, SubmissionTicket, WorkflowStateStore};
use crate::url_sync::{HistoryPort, UrlStateSync};

/// Resultado de un envío exitoso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub cycle_id: Uuid,
    pub ticket: SubmissionTicket,
    pub html_ref: String,
    pub source_ref: String,
    /// `false` si el store lo descartó por llegar después de un ciclo más nuevo.
    pub applied: bool,
    /// La URL de la página quedó con `source_ref`. `false` si el historial
    /// rechazó la escritura o el envío fue descartado.
    pub persisted: bool,
}

/// Resultado por engine de una ronda de renderizado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderingReport {
    pub cycle_id: Uuid,
    pub outcomes: BTreeMap<String, Result<String, WorkflowError>>,
}

impl RenderingReport {
    pub fn ready(&self) -> BTreeMap<&str, &str> {
        self.outcomes
            .iter()
            .filter_map(|(engine, r)| r.as_ref().ok().map(|pdf| (engine.as_str(), pdf.as_str())))
            .collect()
    }

    pub fn failed(&self) -> Vec<(&str, &WorkflowError)> {
        self.outcomes
            .iter()
            .filter_map(|(engine, r)| r.as_ref().err().map(|e| (engine.as_str(), e)))
            .collect()
    }
}

/// Envío más renderizados de un ciclo completo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub submission: Submission,
    pub renderings: RenderingReport,
}

pub struct GenerationOrchestrator<C, H, E = InMemoryEventStore>
    where C: RemoteGenerationClient,
          H: HistoryPort,
          E: EventStore
{
    client: Arc<C>,
    store: Arc<WorkflowStateStore>,
    url_sync: Arc<UrlStateSync<H>>,
    events: Arc<E>,
    engines: Vec<RenderEngine>,
}

impl<C, H, E> GenerationOrchestrator<C, H, E>
    where C: RemoteGenerationClient,
          H: HistoryPort,
          E: EventStore
{
    pub fn new(client: Arc<C>, store: Arc<WorkflowStateStore>, url_sync: Arc<UrlStateSync<H>>, events: Arc<E>) -> Self {
        Self { client,
               store,
               url_sync,
               events,
               engines: vec![RenderEngine::default_engine(), RenderEngine::named(crate::constants::RAPTOR_ENGINE)] }
    }

    /// Fija el conjunto de engines usado por los ciclos completos.
    pub fn with_engines(mut self, engines: Vec<RenderEngine>) -> Self {
        self.engines = engines;
        self
    }

    pub fn engines(&self) -> &[RenderEngine] {
        &self.engines
    }

    pub fn store(&self) -> &Arc<WorkflowStateStore> {
        &self.store
    }

    pub fn url_sync(&self) -> &Arc<UrlStateSync<H>> {
        &self.url_sync
    }

    pub fn events(&self) -> &Arc<E> {
        &self.events
    }

    /// Estado de un ciclo reconstruido desde el event log.
    pub fn cycle(&self, cycle_id: Uuid) -> CycleInstance {
        InMemoryCycleRepository::new().load(cycle_id, &self.events.list(cycle_id))
    }

    /// Carga inicial del document source desde la URL (o la ubicación por defecto).
    pub async fn load_source(&self) -> Result<DocumentSource, WorkflowError> {
        self.url_sync.load(self.client.as_ref(), &self.store).await
    }

    // ---- envío ----

    /// Modo formulario: campos + un campo por firma, multipart a `/htmlgen`.
    pub async fn submit_form(&self, inputs: &FormInputs, signatures: &SignatureCollection) -> Result<Submission, WorkflowError> {
        let body = FormSubmission::merge(inputs, &signatures.to_submission_fields());
        let (cycle_id, ticket) = self.begin(SubmissionMode::Form, body.fingerprint(), body.fields.len());
        let response = self.client.generate_html(&body).await;
        self.complete_submission(cycle_id, ticket, response)
    }

    /// Modo JSON: el payload tal cual como cuerpo de `/jsonhtmlgen`.
    pub async fn submit_json(&self, payload: Value, csrf_token: Option<String>) -> Result<Submission, WorkflowError> {
        let body = JsonSubmission::new(payload, csrf_token);
        let (cycle_id, ticket) = self.begin(SubmissionMode::Json, body.fingerprint(), body.field_count());
        let response = self.client.generate_html_json(&body).await;
        self.complete_submission(cycle_id, ticket, response)
    }

    /// Modo JSON a partir del source cargado, con las firmas escritas en
    /// `signatures[i].data_uri`.
    pub async fn submit_loaded_source(&self, signatures: &SignatureCollection, csrf_token: Option<String>) -> Result<Submission, WorkflowError> {
        let source = self.store
                         .source()
                         .ok_or_else(|| WorkflowError::InvalidSource("no document source loaded".into()))?;
        let mut payload = source.as_json()?;
        signatures.attach_to_payload(&mut payload)?;
        self.submit_json(payload, csrf_token).await
    }

    fn begin(&self, mode: SubmissionMode, fingerprint: String, field_count: usize) -> (Uuid, SubmissionTicket) {
        let cycle_id = Uuid::new_v4();
        let ticket = self.store.issue_ticket();
        debug!("submit:start cycle={cycle_id} ticket={} mode={mode:?} fields={field_count}", ticket.0);
        self.events
            .append_kind(cycle_id, GenerationEventKind::SubmissionStarted { mode, fingerprint, field_count });
        (cycle_id, ticket)
    }

    fn complete_submission(&self,
                           cycle_id: Uuid,
                           ticket: SubmissionTicket,
                           response: Result<HtmlGenResponse, WorkflowError>)
                           -> Result<Submission, WorkflowError> {
        let response = response.and_then(|r| {
                                   if r.html.is_empty() || r.json.is_empty() {
                                       Err(WorkflowError::MalformedResponse { endpoint: "htmlgen".into(),
                                                                              detail: "empty HTML or JSON reference".into() })
                                   } else {
                                       Ok(r)
                                   }
                               });
        let HtmlGenResponse { html, json } = match response {
            Ok(r) => r,
            Err(err) => {
                error!("submit:failed cycle={cycle_id}: {err}");
                self.events
                    .append_kind(cycle_id, GenerationEventKind::SubmissionFailed { error: err.clone() });
                return Err(err);
            }
        };

        self.events.append_kind(cycle_id,
                                GenerationEventKind::HtmlReady { html_ref: html.clone(),
                                                                 source_ref: json.clone() });
        let applied = self.store.commit_generation(ticket, &html, DocumentSource::Reference(json.clone()));
        let mut persisted = false;
        if applied {
            // el ciclo sigue aunque la URL no se pueda escribir; el llamador lo ve en `persisted`
            match self.url_sync.persist(&json) {
                Ok(_) => persisted = true,
                Err(e) => warn!("persist:failed cycle={cycle_id} reference={json}: {e}"),
            }
        } else {
            self.events
                .append_kind(cycle_id, GenerationEventKind::CompletionDiscarded { target: "html".into() });
        }
        debug!("submit:done cycle={cycle_id} html={html} source={json} applied={applied}");
        Ok(Submission { cycle_id,
                        ticket,
                        html_ref: html,
                        source_ref: json,
                        applied,
                        persisted })
    }

    // ---- renderizado ----

    /// Pide un PDF por engine para `html_ref`, como ciclo de renderizado suelto.
    pub async fn request_renderings(&self, html_ref: &str, engines: &[RenderEngine]) -> RenderingReport {
        let cycle_id = Uuid::new_v4();
        let ticket = self.store.issue_ticket();
        self.render_all(cycle_id, ticket, html_ref, engines).await
    }

    /// Pide los PDFs del HTML producido por `submission`, dentro de su ciclo.
    pub async fn request_renderings_for(&self, submission: &Submission, engines: &[RenderEngine]) -> RenderingReport {
        self.render_all(submission.cycle_id, submission.ticket, &submission.html_ref, engines)
            .await
    }

    async fn render_all(&self, cycle_id: Uuid, ticket: SubmissionTicket, html_ref: &str, engines: &[RenderEngine]) -> RenderingReport {
        let requests = engines.iter().map(|engine| self.render_one(cycle_id, ticket, html_ref, engine));
        let outcomes = join_all(requests).await.into_iter().collect();
        RenderingReport { cycle_id, outcomes }
    }

    async fn render_one(&self,
                        cycle_id: Uuid,
                        ticket: SubmissionTicket,
                        html_ref: &str,
                        engine: &RenderEngine)
                        -> (String, Result<String, WorkflowError>) {
        let name = engine.name().to_string();
        self.events
            .append_kind(cycle_id, GenerationEventKind::PdfRequested { engine: name.clone() });
        let result = self.client.render_pdf(html_ref, engine).await.and_then(|r| {
                                                                       if r.pdf.is_empty() {
                                                                           Err(WorkflowError::MalformedResponse { endpoint: "pdfgen".into(),
                                                                                                                  detail: "empty PDF reference".into() })
                                                                       } else {
                                                                           Ok(r.pdf)
                                                                       }
                                                                   });
        match &result {
            Ok(pdf) => {
                if self.store.commit_pdf(ticket, html_ref, &name, pdf) {
                    self.events.append_kind(cycle_id,
                                            GenerationEventKind::PdfReady { engine: name.clone(),
                                                                            pdf_ref: pdf.clone() });
                    debug!("pdf:ready cycle={cycle_id} engine={name} pdf={pdf}");
                } else {
                    self.events
                        .append_kind(cycle_id, GenerationEventKind::CompletionDiscarded { target: format!("pdf:{name}") });
                }
            }
            Err(err) => {
                warn!("pdf:failed cycle={cycle_id} engine={name}: {err}");
                self.events.append_kind(cycle_id,
                                        GenerationEventKind::PdfFailed { engine: name.clone(),
                                                                         error: err.clone() });
            }
        }
        (name, result)
    }

    // ---- ciclos completos ----

    /// Envío de formulario seguido de los renderizados de todos los engines.
    pub async fn generate_form(&self, inputs: &FormInputs, signatures: &SignatureCollection) -> Result<CycleReport, WorkflowError> {
        let submission = self.submit_form(inputs, signatures).await?;
        Ok(self.render_submission(submission).await)
    }

    /// Envío JSON seguido de los renderizados de todos los engines.
    pub async fn generate_json(&self, payload: Value, csrf_token: Option<String>) -> Result<CycleReport, WorkflowError> {
        let submission = self.submit_json(payload, csrf_token).await?;
        Ok(self.render_submission(submission).await)
    }

    async fn render_submission(&self, submission: Submission) -> CycleReport {
        let renderings = if submission.applied {
            self.request_renderings_for(&submission, &self.engines).await
        } else {
            RenderingReport { cycle_id: submission.cycle_id,
                              outcomes: BTreeMap::new() }
        };
        CycleReport { submission, renderings }
    }
}
