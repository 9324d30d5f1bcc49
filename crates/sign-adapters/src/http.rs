//! Cliente HTTP del backend de generación.
//!
//! Endpoints relativos a la raíz del host (`/htmlgen`, `/jsonhtmlgen`,
//! `/pdfgen`). El token anti-forgery viaja en `X-CSRF-Token` cuando existe.
//! Sin reintentos: cada fallo se devuelve tal cual al orquestador.
use async_trait::async_trait;
use log::debug;
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use sign_core::constants::CSRF_HEADER;
use sign_core::payload::{FormSubmission, JsonSubmission};
use sign_core::{HtmlGenResponse, PdfGenResponse, RemoteGenerationClient, RenderEngine, WorkflowError};

const HTMLGEN: &str = "/htmlgen";
const JSONHTMLGEN: &str = "/jsonhtmlgen";
const PDFGEN: &str = "/pdfgen";

pub struct HttpGenerationClient {
    client: Client,
    base: Url,
}

impl HttpGenerationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WorkflowError> {
        let base = Url::parse(base_url).map_err(|e| WorkflowError::Internal(format!("invalid base url {base_url}: {e}")))?;
        let client = Client::builder().timeout(timeout)
                                      .build()
                                      .map_err(|e| WorkflowError::Internal(e.to_string()))?;
        Ok(Self::with_client(client, base))
    }

    pub fn with_client(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn endpoint_url(&self, path: &str) -> Result<Url, WorkflowError> {
        self.base
            .join(path)
            .map_err(|e| WorkflowError::Internal(format!("cannot join {path} to {}: {e}", self.base)))
    }

    /// `/pdfgen?url=<html_ref>`, más `svc=<engine>` fuera del engine por defecto.
    pub fn pdfgen_url(&self, html_ref: &str, engine: &RenderEngine) -> Result<Url, WorkflowError> {
        let mut url = self.endpoint_url(PDFGEN)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("url", html_ref);
            if let Some(svc) = engine.selector() {
                query.append_pair("svc", svc);
            }
        }
        Ok(url)
    }

    /// Referencias absolutas se usan tal cual; las relativas se resuelven contra la base.
    pub fn source_url(&self, reference: &str) -> Result<Url, WorkflowError> {
        Url::parse(reference).or_else(|_| self.base.join(reference))
                             .map_err(|e| WorkflowError::SourceFetch { reference: reference.to_string(),
                                                                       detail: e.to_string() })
    }

    fn with_token(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.header(CSRF_HEADER, token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(endpoint: &str, request: RequestBuilder) -> Result<T, WorkflowError> {
        let response = request.send()
                              .await
                              .map_err(|e| WorkflowError::Transport(format!("{endpoint}: {e}")))?;
        Self::handle_response(endpoint, response).await
    }

    async fn handle_response<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, WorkflowError> {
        let status = response.status();
        if !status.is_success() {
            return Err(WorkflowError::BackendStatus { endpoint: endpoint.to_string(),
                                                      status: status.as_u16() });
        }
        let body = response.text()
                           .await
                           .map_err(|e| WorkflowError::Transport(format!("{endpoint}: {e}")))?;
        parse_body(endpoint, &body)
    }
}

/// Decodifica el cuerpo JSON de una respuesta exitosa.
pub fn parse_body<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, WorkflowError> {
    serde_json::from_str(body).map_err(|e| WorkflowError::MalformedResponse { endpoint: endpoint.to_string(),
                                                                             detail: e.to_string() })
}

#[async_trait]
impl RemoteGenerationClient for HttpGenerationClient {
    async fn fetch_source(&self, reference: &str) -> Result<String, WorkflowError> {
        let url = self.source_url(reference)?;
        debug!("GET {url}");
        let fail = |detail: String| WorkflowError::SourceFetch { reference: reference.to_string(),
                                                                 detail };
        let response = self.client.get(url).send().await.map_err(|e| fail(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("status {}", status.as_u16())));
        }
        response.text().await.map_err(|e| fail(e.to_string()))
    }

    async fn generate_html(&self, submission: &FormSubmission) -> Result<HtmlGenResponse, WorkflowError> {
        let url = self.endpoint_url(HTMLGEN)?;
        debug!("POST {url} fields={}", submission.fields.len());
        let form = submission.fields
                             .iter()
                             .fold(Form::new(), |form, (name, value)| form.text(name.clone(), value.clone()));
        let request = Self::with_token(self.client.post(url).multipart(form), submission.csrf_token.as_deref());
        Self::send("htmlgen", request).await
    }

    async fn generate_html_json(&self, submission: &JsonSubmission) -> Result<HtmlGenResponse, WorkflowError> {
        let url = self.endpoint_url(JSONHTMLGEN)?;
        debug!("POST {url}");
        let request = Self::with_token(self.client.post(url).json(&submission.payload), submission.csrf_token.as_deref());
        Self::send("jsonhtmlgen", request).await
    }

    async fn render_pdf(&self, html_ref: &str, engine: &RenderEngine) -> Result<PdfGenResponse, WorkflowError> {
        let url = self.pdfgen_url(html_ref, engine)?;
        debug!("GET {url}");
        Self::send("pdfgen", self.client.get(url)).await
    }
}
