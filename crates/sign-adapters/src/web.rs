//! Historial del navegador (`window.history`) para builds wasm.
use log::Level;
use sign_core::url_sync::{query_param_of, with_query_param};
use sign_core::{HistoryPort, WorkflowError};
use url::Url;
use wasm_bindgen::JsValue;

/// Envía los registros de `log` a la consola del navegador.
pub fn init_console_logging(level: Level) -> Result<(), WorkflowError> {
    console_log::init_with_level(level).map_err(|e| WorkflowError::Internal(e.to_string()))
}

/// Lee y escribe la URL de la ventana actual sin recargar la página.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebHistory;

fn js_err(e: JsValue) -> WorkflowError {
    WorkflowError::History(format!("{e:?}"))
}

impl WebHistory {
    fn window() -> Result<web_sys::Window, WorkflowError> {
        web_sys::window().ok_or_else(|| WorkflowError::History("no window".into()))
    }

    fn location() -> Result<Url, WorkflowError> {
        let href = Self::window()?.location().href().map_err(js_err)?;
        Url::parse(&href).map_err(|e| WorkflowError::History(format!("{href}: {e}")))
    }
}

impl HistoryPort for WebHistory {
    fn current_url(&self) -> String {
        Self::location().map(|u| u.to_string()).unwrap_or_default()
    }

    fn query_param(&self, name: &str) -> Option<String> {
        Self::location().ok().and_then(|u| query_param_of(&u, name))
    }

    fn push_with_param(&self, name: &str, value: &str) -> Result<(), WorkflowError> {
        let next = with_query_param(&Self::location()?, name, value);
        Self::window()?.history()
                       .map_err(js_err)?
                       .push_state_with_url(&JsValue::NULL, "", Some(next.as_str()))
                       .map_err(js_err)
    }
}
