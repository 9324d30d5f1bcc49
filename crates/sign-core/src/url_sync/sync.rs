//! Sincronización del estado reanudable con la URL.
//!
//! Sólo la source reference vive en la URL (`?jsonurl=`). Al arrancar se lee
//! de ahí (o de la ubicación por defecto) y se carga el contenido; después de
//! cada generación exitosa se reescribe para que recargar la página reanude
//! el documento recién generado.
use log::debug;
use url::Url;

use super::history::HistoryPort;
use crate::client::RemoteGenerationClient;
use crate::constants::{DEFAULT_SOURCE_LOCATION, JSONURL_PARAM};
use crate::errors::WorkflowError;
use crate::state::{DocumentSource, WorkflowStateStore};

pub struct UrlStateSync<H: HistoryPort> {
    history: H,
    param: String,
    default_location: String,
}

impl<H: HistoryPort> UrlStateSync<H> {
    pub fn new(history: H) -> Self {
        Self { history,
               param: JSONURL_PARAM.to_string(),
               default_location: DEFAULT_SOURCE_LOCATION.to_string() }
    }

    /// Ubicación usada cuando la URL no trae referencia. Puede ser relativa a la página.
    pub fn with_default_location(mut self, location: impl Into<String>) -> Self {
        self.default_location = location.into();
        self
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// Referencia a cargar: la de la URL o la ubicación por defecto resuelta
    /// contra la URL actual.
    pub fn source_reference(&self) -> Result<String, WorkflowError> {
        if let Some(reference) = self.history.query_param(&self.param).filter(|r| !r.is_empty()) {
            return Ok(reference);
        }
        let current = self.history.current_url();
        let resolved = match Url::parse(&current) {
            Ok(base) => base.join(&self.default_location),
            Err(_) => Url::parse(&self.default_location),
        };
        resolved.map(|u| u.to_string())
                .map_err(|e| WorkflowError::History(format!("cannot resolve {} against {current}: {e}", self.default_location)))
    }

    /// Carga inicial: obtiene el contenido crudo e inicializa el document source.
    /// Si la descarga falla el store no se toca.
    pub async fn load<C>(&self, client: &C, store: &WorkflowStateStore) -> Result<DocumentSource, WorkflowError>
        where C: RemoteGenerationClient + ?Sized
    {
        let reference = self.source_reference()?;
        debug!("load:start reference={reference}");
        let content = client.fetch_source(&reference).await?;
        let source = DocumentSource::Payload { content,
                                               origin: Some(reference) };
        store.set_source(source.clone());
        debug!("load:done");
        Ok(source)
    }

    /// Refleja `reference` en la URL. Si ya está, no empuja otra entrada.
    /// Devuelve si se empujó una entrada.
    pub fn persist(&self, reference: &str) -> Result<bool, WorkflowError> {
        if self.history.query_param(&self.param).as_deref() == Some(reference) {
            debug!("persist:unchanged reference={reference}");
            return Ok(false);
        }
        self.history.push_with_param(&self.param, reference)?;
        debug!("persist:pushed reference={reference}");
        Ok(true)
    }
}
