mod support;

use serde_json::json;
use sign_core::repo::{RenderStatus, SubmissionPhase};
use sign_core::{CompletionPolicy, DocumentSource, EventStore, FormInputs, GenerationEventKind, HistoryPort, RenderEngine,
                SignatureCollection, StateChange, StaticImageSurface, WorkflowError};
use sign_core::MemoryHistory;
use support::{orchestrator, orchestrator_with, ReadOnlyHistory, ScriptedClient};
use tokio_test::{assert_err, assert_ok};

const PAGE: &str = "https://app.example/signoff/";

fn signed(n: usize) -> SignatureCollection {
    let mut sigs = SignatureCollection::new(n);
    for i in 0..n {
        let slot = sigs.attach(Box::new(StaticImageSurface::from_png_bytes(&[0x89, b'P', i as u8]))).unwrap();
        sigs.stroke_session_ended(slot).unwrap();
    }
    sigs
}

#[tokio::test]
async fn form_cycle_end_to_end() {
    let client = ScriptedClient::new().with_html(0, Ok(("doc123", "src456")))
                                      .with_pdf("default", 0, Ok("pdfA"))
                                      .with_pdf("raptor", 0, Ok("pdfB"));
    let (client, orch) = orchestrator(client, PAGE, CompletionPolicy::LastWriteWins);
    let mut changes = orch.store().subscribe();

    let sigs = signed(2);
    let inputs = FormInputs::from_fields(vec![("Case.Number", "C-1"), ("gorilla.csrf.Token", "tok")]);
    let report = orch.generate_form(&inputs, &sigs).await.expect("cycle should succeed");

    // cuerpo enviado: campos + una firma por slot, token aparte
    let form = client.last_form().unwrap();
    assert_eq!(form.csrf_token.as_deref(), Some("tok"));
    assert_eq!(form.fields["Case.Number"], "C-1");
    assert!(form.fields["Signatures.0.DataURI"].starts_with("data:image/png;base64,"));
    assert!(form.fields.contains_key("Signatures.1.DataURI"));
    assert!(!form.fields.contains_key("gorilla.csrf.Token"));

    // html antes que cualquier pdf, ambos pdf parametrizados con doc123
    let calls = client.calls();
    assert_eq!(calls[0], "htmlgen");
    assert!(calls[1..].contains(&"pdfgen:default:doc123".to_string()));
    assert!(calls[1..].contains(&"pdfgen:raptor:doc123".to_string()));

    let snap = orch.store().snapshot();
    assert_eq!(snap.result.html_ref.as_deref(), Some("doc123"));
    assert_eq!(snap.source, Some(DocumentSource::Reference("src456".into())));
    assert_eq!(snap.result.pdf_refs.get("default").map(String::as_str), Some("pdfA"));
    assert_eq!(snap.result.pdf_refs.get("raptor").map(String::as_str), Some("pdfB"));
    assert_eq!(orch.url_sync().history().query_param("jsonurl").as_deref(), Some("src456"));

    assert!(report.submission.persisted);
    assert_eq!(report.renderings.ready().len(), 2);
    assert!(report.renderings.failed().is_empty());

    let cycle = orch.cycle(report.submission.cycle_id);
    assert_eq!(cycle.phase, SubmissionPhase::HtmlReady);
    assert!(cycle.renderings_settled());

    // observadores: html y source llegan antes que los pdf
    let mut seen = Vec::new();
    while let Ok(change) = changes.try_recv() {
        seen.push(change);
    }
    let html_pos = seen.iter().position(|c| *c == StateChange::Html).unwrap();
    let pdf_pos = seen.iter().position(|c| matches!(c, StateChange::Pdf { .. })).unwrap();
    assert!(html_pos < pdf_pos);
}

#[tokio::test]
async fn failed_submission_leaves_everything_untouched() {
    let client = ScriptedClient::new().with_source("https://app.example/templates/signoff.json", r#"{"id":"r-1"}"#)
                                      .with_html(0, Err(WorkflowError::BackendStatus { endpoint: "htmlgen".into(),
                                                                                        status: 500 }));
    let (client, orch) = orchestrator(client, PAGE, CompletionPolicy::LastWriteWins);
    orch.load_source().await.unwrap();
    let before = orch.store().snapshot();

    let err = orch.generate_form(&FormInputs::new(), &signed(1)).await.unwrap_err();
    assert_eq!(err, WorkflowError::BackendStatus { endpoint: "htmlgen".into(), status: 500 });

    assert_eq!(orch.store().snapshot(), before);
    assert_eq!(client.count("pdfgen"), 0);
    assert_eq!(orch.url_sync().history().len(), 1);
    assert_eq!(orch.url_sync().history().query_param("jsonurl"), None);

    let cycles = orch.events().cycles();
    assert_eq!(cycles.len(), 1);
    let cycle = orch.cycle(cycles[0]);
    assert_eq!(cycle.phase, SubmissionPhase::Idle);
    assert!(cycle.last_error.is_some());
}

#[tokio::test]
async fn empty_html_reference_counts_as_failure() {
    let client = ScriptedClient::new().with_html(0, Ok(("", "src456")));
    let (client, orch) = orchestrator(client, PAGE, CompletionPolicy::LastWriteWins);
    let err = orch.submit_form(&FormInputs::new(), &signed(1)).await.unwrap_err();
    assert!(matches!(err, WorkflowError::MalformedResponse { .. }));
    assert_eq!(orch.store().html_ref(), None);
    assert_eq!(client.count("pdfgen"), 0);
}

#[tokio::test(start_paused = true)]
async fn raptor_may_finish_before_default() {
    let client = ScriptedClient::new().with_html(5, Ok(("doc123", "src456")))
                                      .with_pdf("default", 300, Ok("pdfA"))
                                      .with_pdf("raptor", 20, Ok("pdfB"));
    let (_client, orch) = orchestrator(client, PAGE, CompletionPolicy::LastWriteWins);

    let report = orch.generate_form(&FormInputs::new(), &signed(1)).await.unwrap();

    let order: Vec<String> = orch.events()
                                 .list(report.submission.cycle_id)
                                 .into_iter()
                                 .filter_map(|e| match e.kind {
                                     GenerationEventKind::PdfReady { engine, .. } => Some(engine),
                                     _ => None,
                                 })
                                 .collect();
    assert_eq!(order, vec!["raptor".to_string(), "default".to_string()]);
    assert_eq!(orch.store().pdf_ref("default").as_deref(), Some("pdfA"));
    assert_eq!(orch.store().pdf_ref("raptor").as_deref(), Some("pdfB"));
}

#[tokio::test]
async fn one_engine_failing_does_not_block_the_other() {
    let client = ScriptedClient::new().with_html(0, Ok(("doc123", "src456")))
                                      .with_pdf("default", 0, Ok("pdfA"))
                                      .with_pdf("raptor", 0, Err(WorkflowError::Transport("connection reset".into())));
    let (_client, orch) = orchestrator(client, PAGE, CompletionPolicy::LastWriteWins);

    let report = orch.generate_form(&FormInputs::new(), &signed(1)).await.unwrap();
    assert_eq!(report.renderings.failed().len(), 1);
    assert_eq!(orch.store().pdf_ref("default").as_deref(), Some("pdfA"));
    assert_eq!(orch.store().pdf_ref("raptor"), None);
    assert_eq!(orch.store().html_ref().as_deref(), Some("doc123"));

    let cycle = orch.cycle(report.submission.cycle_id);
    assert_eq!(cycle.engine("raptor").unwrap().status, RenderStatus::Failed);
    assert_eq!(cycle.engine("default").unwrap().status, RenderStatus::Ready);
}

#[tokio::test]
async fn new_generation_replaces_previous_pdfs() {
    let client = ScriptedClient::new().with_html(0, Ok(("doc1", "src1")))
                                      .with_html(0, Ok(("doc2", "src2")))
                                      .with_pdf("default", 0, Ok("pdfA"));
    let (_client, orch) = orchestrator(client, PAGE, CompletionPolicy::LastWriteWins);
    let orch = orch.with_engines(vec![RenderEngine::default_engine()]);

    orch.generate_form(&FormInputs::new(), &signed(1)).await.unwrap();
    assert!(orch.store().pdf_ref("default").is_some());

    let second = orch.submit_form(&FormInputs::new(), &signed(1)).await.unwrap();
    assert_eq!(second.html_ref, "doc2");
    assert_eq!(orch.store().pdf_ref("default"), None);
    assert_eq!(orch.url_sync().history().query_param("jsonurl").as_deref(), Some("src2"));
}

#[tokio::test]
async fn load_uses_url_reference_then_persist_is_idempotent() {
    let client = ScriptedClient::new().with_source("https://media.example/r.json", r#"{"id":"r-9"}"#)
                                      .with_html(0, Ok(("doc123", "https://media.example/r.json")));
    let (client, orch) = orchestrator(client, "https://app.example/?jsonurl=https%3A%2F%2Fmedia.example%2Fr.json",
                                      CompletionPolicy::LastWriteWins);

    let source = assert_ok!(orch.load_source().await);
    assert_eq!(source.reference(), Some("https://media.example/r.json"));
    assert_eq!(client.calls(), vec!["fetch:https://media.example/r.json".to_string()]);

    // el backend devuelve la misma referencia que ya está en la URL: no hay entrada nueva
    orch.submit_form(&FormInputs::new(), &signed(1)).await.unwrap();
    assert_eq!(orch.url_sync().history().len(), 1);
}

#[tokio::test]
async fn load_failure_leaves_source_empty() {
    let (_client, orch) = orchestrator(ScriptedClient::new(), PAGE, CompletionPolicy::LastWriteWins);
    let err = assert_err!(orch.load_source().await);
    assert!(matches!(err, WorkflowError::SourceFetch { .. }));
    assert_eq!(orch.store().source(), None);
}

#[tokio::test]
async fn json_mode_embeds_signatures_in_loaded_source() {
    let client = ScriptedClient::new().with_source("https://app.example/templates/signoff.json",
                                                   r#"{"id":"r-1","signatures":[{"name":"Ana","data_uri":""}]}"#)
                                      .with_html(0, Ok(("doc9", "src9")))
                                      .with_pdf("default", 0, Ok("pdf9"));
    let (client, orch) = orchestrator(client, PAGE, CompletionPolicy::LastWriteWins);
    orch.load_source().await.unwrap();

    let sigs = signed(2);
    let submission = orch.submit_loaded_source(&sigs, Some("tok".into())).await.unwrap();
    assert_eq!(submission.html_ref, "doc9");

    let body = client.last_json().unwrap();
    assert_eq!(body.csrf_token.as_deref(), Some("tok"));
    assert_eq!(body.payload["id"], "r-1");
    assert_eq!(body.payload["signatures"][0]["name"], "Ana");
    assert!(body.payload["signatures"][0]["data_uri"].as_str().unwrap().starts_with("data:image/png"));
    assert!(body.payload["signatures"][1]["data_uri"].is_string());
    assert_eq!(client.count("htmlgen"), 0);
}

#[tokio::test]
async fn generate_json_runs_the_full_cycle() {
    let client = ScriptedClient::new().with_html(0, Ok(("doc7", "src7")))
                                      .with_pdf("default", 0, Ok("pdf7"))
                                      .with_pdf("raptor", 0, Ok("pdf7r"));
    let (_client, orch) = orchestrator(client, PAGE, CompletionPolicy::LastWriteWins);
    let report = orch.generate_json(json!({"id": "x"}), None).await.unwrap();
    assert_eq!(report.renderings.ready().get("raptor"), Some(&"pdf7r"));
    assert_eq!(orch.store().source(), Some(DocumentSource::Reference("src7".into())));
}

#[tokio::test(start_paused = true)]
async fn overlapping_cycles_last_write_wins_by_default() {
    let client = ScriptedClient::new().with_html(50, Ok(("doc-old", "src-old")))
                                      .with_html(10, Ok(("doc-new", "src-new")));
    let (_client, orch) = orchestrator(client, PAGE, CompletionPolicy::LastWriteWins);
    let sigs = signed(1);
    let inputs = FormInputs::new();

    let (old, new) = tokio::join!(orch.submit_form(&inputs, &sigs), orch.submit_form(&inputs, &sigs));
    assert!(old.unwrap().applied);
    assert!(new.unwrap().applied);
    // la finalización más tardía queda
    assert_eq!(orch.store().html_ref().as_deref(), Some("doc-old"));
}

#[tokio::test(start_paused = true)]
async fn overlapping_cycles_discard_stale_keeps_newest() {
    let client = ScriptedClient::new().with_html(50, Ok(("doc-old", "src-old")))
                                      .with_html(10, Ok(("doc-new", "src-new")));
    let (_client, orch) = orchestrator(client, PAGE, CompletionPolicy::DiscardStale);
    let sigs = signed(1);
    let inputs = FormInputs::new();

    let (old, new) = tokio::join!(orch.submit_form(&inputs, &sigs), orch.submit_form(&inputs, &sigs));
    let old = old.unwrap();
    assert!(!old.applied);
    assert!(!old.persisted);
    assert!(new.unwrap().applied);
    assert_eq!(orch.store().html_ref().as_deref(), Some("doc-new"));
    assert_eq!(orch.url_sync().history().query_param("jsonurl").as_deref(), Some("src-new"));
    assert_eq!(orch.cycle(old.cycle_id).discarded, vec!["html".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn discard_stale_drops_rendering_of_replaced_html() {
    let client = ScriptedClient::new().with_html(0, Ok(("doc1", "src1")))
                                      .with_html(10, Ok(("doc2", "src2")))
                                      .with_pdf("default", 50, Ok("pdf-of-doc1"));
    let (_client, orch) = orchestrator(client, PAGE, CompletionPolicy::DiscardStale);
    let sigs = signed(1);
    let inputs = FormInputs::new();
    assert_ok!(orch.submit_form(&inputs, &sigs).await);

    // el renderizado suelto de doc1 termina después de que doc2 lo reemplazó
    let engines = [RenderEngine::default_engine()];
    let (submission, renderings) = tokio::join!(orch.submit_form(&inputs, &sigs), orch.request_renderings("doc1", &engines));
    assert!(submission.unwrap().applied);

    assert_eq!(orch.store().html_ref().as_deref(), Some("doc2"));
    assert_eq!(orch.store().pdf_ref("default"), None);
    assert_eq!(orch.cycle(renderings.cycle_id).discarded, vec!["pdf:default".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn last_write_wins_keeps_rendering_of_replaced_html() {
    let client = ScriptedClient::new().with_html(0, Ok(("doc1", "src1")))
                                      .with_html(10, Ok(("doc2", "src2")))
                                      .with_pdf("default", 50, Ok("pdf-of-doc1"));
    let (_client, orch) = orchestrator(client, PAGE, CompletionPolicy::LastWriteWins);
    let sigs = signed(1);
    let inputs = FormInputs::new();
    assert_ok!(orch.submit_form(&inputs, &sigs).await);

    let engines = [RenderEngine::default_engine()];
    let (_, renderings) = tokio::join!(orch.submit_form(&inputs, &sigs), orch.request_renderings("doc1", &engines));
    assert_eq!(orch.store().pdf_ref("default").as_deref(), Some("pdf-of-doc1"));
    assert!(orch.cycle(renderings.cycle_id).discarded.is_empty());
}

#[tokio::test]
async fn rejected_url_write_is_reported_on_the_submission() {
    let client = ScriptedClient::new().with_html(0, Ok(("doc123", "src456")));
    let history = ReadOnlyHistory(MemoryHistory::new(PAGE).unwrap());
    let (_client, orch) = orchestrator_with(client, history, CompletionPolicy::LastWriteWins);

    let submission = assert_ok!(orch.submit_form(&FormInputs::new(), &signed(1)).await);
    assert!(submission.applied);
    assert!(!submission.persisted);
    // el resultado queda igual en el store
    assert_eq!(orch.store().html_ref().as_deref(), Some("doc123"));
    assert_eq!(orch.store().source(), Some(DocumentSource::Reference("src456".into())));
    assert_eq!(orch.url_sync().history().query_param("jsonurl"), None);
}
