//! Una corrida completa: cargar el source, firmar, generar y renderizar.
use log::{info, warn};
use serde::Serialize;
use sign_core::{FormInputs, GenerationOrchestrator, HistoryPort, InMemoryEventStore, MemoryHistory, RemoteGenerationClient,
                SignatureCollection, StaticImageSurface, UrlStateSync, WorkflowStateStore};
use sign_domain::InspectionReport;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cli::CliArgs;
use crate::config::AppConfig;
use crate::errors::CoreError;

/// Resultado impreso al terminar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub html_ref: String,
    pub source_ref: String,
    pub pdf_refs: BTreeMap<String, String>,
    pub pdf_failures: BTreeMap<String, String>,
    pub signed: usize,
    /// URL final de la página (con `jsonurl`).
    pub page_url: String,
    /// `page_url` quedó apuntando a `source_ref`.
    pub persisted: bool,
}

pub async fn run<C>(client: Arc<C>, cfg: &AppConfig, args: &CliArgs) -> Result<RunSummary, CoreError>
    where C: RemoteGenerationClient
{
    let page = args.page.as_deref().unwrap_or(&cfg.page_url);
    let url_sync = UrlStateSync::new(MemoryHistory::new(page)?).with_default_location(cfg.default_source.clone());
    let orch = GenerationOrchestrator::new(client,
                                           Arc::new(WorkflowStateStore::with_policy(cfg.completion_policy)),
                                           Arc::new(url_sync),
                                           Arc::new(InMemoryEventStore::default())).with_engines(cfg.engines.clone());

    let source = orch.load_source().await?;
    if let Some(content) = source.content() {
        match InspectionReport::from_source(content) {
            Ok(report) => info!("loaded report id={} signatures={} signed={}",
                                report.id,
                                report.signatures.len(),
                                report.signed_count()),
            Err(e) => warn!("source is not an inspection report: {e}"),
        }
    }

    let needed = cfg.signatures_needed.max(args.signatures.len());
    let mut signatures = SignatureCollection::new(needed);
    for path in &args.signatures {
        let bytes = std::fs::read(path)?;
        let slot = signatures.attach(Box::new(StaticImageSurface::from_png_bytes(&bytes)))?;
        signatures.stroke_session_ended(slot)?;
    }
    if !signatures.is_complete() {
        warn!("{} of {} signatures provided", signatures.filled(), needed);
    }

    let token = cfg.csrf_token.clone();
    let submission = if args.form {
        let mut inputs = FormInputs::from_fields(args.fields.iter().cloned());
        if inputs.csrf_token.is_none() {
            inputs.csrf_token = token;
        }
        orch.submit_form(&inputs, &signatures).await?
    } else {
        orch.submit_loaded_source(&signatures, token).await?
    };
    if !submission.persisted {
        warn!("page url was not updated with {}", submission.source_ref);
    }
    let renderings = orch.request_renderings_for(&submission, orch.engines()).await;

    let pdf_refs = renderings.ready()
                             .into_iter()
                             .map(|(engine, pdf)| (engine.to_string(), pdf.to_string()))
                             .collect();
    let pdf_failures = renderings.failed()
                                 .into_iter()
                                 .map(|(engine, err)| (engine.to_string(), err.to_string()))
                                 .collect();
    Ok(RunSummary { html_ref: submission.html_ref,
                    source_ref: submission.source_ref,
                    pdf_refs,
                    pdf_failures,
                    signed: signatures.filled(),
                    page_url: orch.url_sync().history().current_url(),
                    persisted: submission.persisted })
}
