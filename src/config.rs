//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable
//! evaluada una sola vez (`config()`).
use once_cell::sync::OnceCell;
use sign_core::{CompletionPolicy, RenderEngine};
use std::env;
use std::time::Duration;

use crate::errors::CoreError;

/// Configuración del cliente de generación.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Origen del backend (`/htmlgen`, `/jsonhtmlgen`, `/pdfgen` cuelgan de aquí).
    pub base_url: String,
    /// URL inicial de la página; su `jsonurl` decide qué source se carga.
    pub page_url: String,
    pub csrf_token: Option<String>,
    pub signatures_needed: usize,
    pub engines: Vec<RenderEngine>,
    /// Source por defecto cuando la URL no trae `jsonurl`.
    pub default_source: String,
    pub timeout: Duration,
    pub completion_policy: CompletionPolicy,
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T, CoreError>
    where T::Err: std::fmt::Display
{
    match raw.filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(v) => v.trim()
                    .parse()
                    .map_err(|e| CoreError::Config(format!("{name}={v}: {e}"))),
    }
}

impl AppConfig {
    /// Construye la configuración leyendo cada variable con `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
        where F: Fn(&str) -> Option<String>
    {
        let base_url = lookup("SIGNFLOW_BASE_URL").unwrap_or_else(|| "http://localhost:3000".to_string());
        let page_url = lookup("SIGNFLOW_PAGE_URL").unwrap_or_else(|| format!("{}/", base_url.trim_end_matches('/')));
        let csrf_token = lookup("SIGNFLOW_CSRF_TOKEN").filter(|t| !t.is_empty());
        let signatures_needed = parse_var("SIGNFLOW_SIGNATURES_NEEDED", lookup("SIGNFLOW_SIGNATURES_NEEDED"), 1usize)?;
        let engines = RenderEngine::parse_list(&lookup("SIGNFLOW_ENGINES").unwrap_or_else(|| "default,raptor".to_string()));
        if engines.is_empty() {
            return Err(CoreError::Config("SIGNFLOW_ENGINES must name at least one engine".into()));
        }
        let default_source =
            lookup("SIGNFLOW_DEFAULT_SOURCE").unwrap_or_else(|| sign_core::constants::DEFAULT_SOURCE_LOCATION.to_string());
        let timeout = Duration::from_secs(parse_var("SIGNFLOW_TIMEOUT_SECS", lookup("SIGNFLOW_TIMEOUT_SECS"), 30u64)?);
        let completion_policy = if parse_var("SIGNFLOW_DISCARD_STALE", lookup("SIGNFLOW_DISCARD_STALE"), false)? {
            CompletionPolicy::DiscardStale
        } else {
            CompletionPolicy::LastWriteWins
        };
        Ok(AppConfig { base_url,
                       page_url,
                       csrf_token,
                       signatures_needed,
                       engines,
                       default_source,
                       timeout,
                       completion_policy })
    }

    /// Carga `.env` (si existe) y lee el entorno del proceso.
    pub fn from_env() -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }
}

static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub fn config() -> Result<&'static AppConfig, CoreError> {
    CONFIG.get_or_try_init(AppConfig::from_env)
}
