//! Cliente de generación guionado para los tests de integración.
#![allow(dead_code)]

use async_trait::async_trait;
use sign_core::payload::{FormSubmission, JsonSubmission};
use sign_core::{GenerationOrchestrator, HistoryPort, HtmlGenResponse, MemoryHistory, PdfGenResponse, RemoteGenerationClient, RenderEngine,
                UrlStateSync, WorkflowError, WorkflowStateStore};
use sign_core::{CompletionPolicy, InMemoryEventStore};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Scripted<T> = (Duration, Result<T, WorkflowError>);

/// Responde según lo programado y registra cada llamada en orden.
#[derive(Default)]
pub struct ScriptedClient {
    sources: Mutex<HashMap<String, String>>,
    html: Mutex<VecDeque<Scripted<HtmlGenResponse>>>,
    pdf: Mutex<HashMap<String, Scripted<String>>>,
    calls: Mutex<Vec<String>>,
    forms: Mutex<Vec<FormSubmission>>,
    jsons: Mutex<Vec<JsonSubmission>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(self, reference: &str, content: &str) -> Self {
        self.sources.lock().unwrap().insert(reference.into(), content.into());
        self
    }

    /// Encola la respuesta del próximo envío (form o json).
    pub fn with_html(self, delay_ms: u64, response: Result<(&str, &str), WorkflowError>) -> Self {
        let response = response.map(|(html, json)| HtmlGenResponse { html: html.into(), json: json.into() });
        self.html.lock().unwrap().push_back((Duration::from_millis(delay_ms), response));
        self
    }

    pub fn with_pdf(self, engine: &str, delay_ms: u64, response: Result<&str, WorkflowError>) -> Self {
        self.pdf
            .lock()
            .unwrap()
            .insert(engine.into(), (Duration::from_millis(delay_ms), response.map(str::to_string)));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn last_form(&self) -> Option<FormSubmission> {
        self.forms.lock().unwrap().last().cloned()
    }

    pub fn last_json(&self) -> Option<JsonSubmission> {
        self.jsons.lock().unwrap().last().cloned()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn next_html(&self) -> Result<HtmlGenResponse, WorkflowError> {
        let next = self.html.lock().unwrap().pop_front();
        let (delay, response) = next.ok_or_else(|| WorkflowError::Internal("no scripted html response".into()))?;
        tokio::time::sleep(delay).await;
        response
    }
}

#[async_trait]
impl RemoteGenerationClient for ScriptedClient {
    async fn fetch_source(&self, reference: &str) -> Result<String, WorkflowError> {
        self.record(format!("fetch:{reference}"));
        self.sources
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| WorkflowError::SourceFetch { reference: reference.into(),
                                                        detail: "404".into() })
    }

    async fn generate_html(&self, submission: &FormSubmission) -> Result<HtmlGenResponse, WorkflowError> {
        self.record("htmlgen".into());
        self.forms.lock().unwrap().push(submission.clone());
        self.next_html().await
    }

    async fn generate_html_json(&self, submission: &JsonSubmission) -> Result<HtmlGenResponse, WorkflowError> {
        self.record("jsonhtmlgen".into());
        self.jsons.lock().unwrap().push(submission.clone());
        self.next_html().await
    }

    async fn render_pdf(&self, html_ref: &str, engine: &RenderEngine) -> Result<PdfGenResponse, WorkflowError> {
        self.record(format!("pdfgen:{engine}:{html_ref}"));
        let scripted = self.pdf.lock().unwrap().get(engine.name()).cloned();
        let (delay, response) = scripted.ok_or_else(|| WorkflowError::BackendStatus { endpoint: "pdfgen".into(),
                                                                                       status: 404 })?;
        tokio::time::sleep(delay).await;
        response.map(|pdf| PdfGenResponse { pdf })
    }
}

pub type TestOrchestrator = GenerationOrchestrator<ScriptedClient, MemoryHistory, InMemoryEventStore>;

pub fn orchestrator(client: ScriptedClient, page: &str, policy: CompletionPolicy) -> (Arc<ScriptedClient>, TestOrchestrator) {
    orchestrator_with(client, MemoryHistory::new(page).expect("valid page url"), policy)
}

pub fn orchestrator_with<H: HistoryPort>(client: ScriptedClient,
                                         history: H,
                                         policy: CompletionPolicy)
                                         -> (Arc<ScriptedClient>, GenerationOrchestrator<ScriptedClient, H, InMemoryEventStore>) {
    let client = Arc::new(client);
    let orch = GenerationOrchestrator::new(client.clone(),
                                           Arc::new(WorkflowStateStore::with_policy(policy)),
                                           Arc::new(UrlStateSync::new(history)),
                                           Arc::new(InMemoryEventStore::default()));
    (client, orch)
}

/// Historial que se lee normalmente pero rechaza toda escritura.
pub struct ReadOnlyHistory(pub MemoryHistory);

impl HistoryPort for ReadOnlyHistory {
    fn current_url(&self) -> String {
        self.0.current_url()
    }

    fn query_param(&self, name: &str) -> Option<String> {
        self.0.query_param(name)
    }

    fn push_with_param(&self, _name: &str, _value: &str) -> Result<(), WorkflowError> {
        Err(WorkflowError::History("pushState rejected".into()))
    }
}
