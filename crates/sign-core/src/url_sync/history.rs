//! Abstracción del historial del navegador.
//!
//! El core sólo necesita leer un parámetro de la URL actual y reemplazarlo
//! empujando una entrada nueva (sin recargar). `MemoryHistory` implementa eso
//! sobre una pila de `Url`; en wasm `sign-adapters` lo implementa sobre
//! `window.history`.
use std::sync::{Mutex, PoisonError};
use url::{form_urlencoded, Url};

use crate::errors::WorkflowError;

pub trait HistoryPort: Send + Sync {
    /// URL de la entrada actual.
    fn current_url(&self) -> String;

    /// Valor decodificado del parámetro `name` en la URL actual.
    fn query_param(&self, name: &str) -> Option<String>;

    /// Reescribe `name=value` en la URL actual y empuja la entrada resultante.
    fn push_with_param(&self, name: &str, value: &str) -> Result<(), WorkflowError>;
}

/// Devuelve `url` con `name=value`: reemplaza la primera aparición en su
/// posición, elimina repeticiones y lo agrega al final si no existía.
///
/// Sólo se reescribe el par `name`; los demás segmentos conservan su texto
/// original (`?debug` sigue sin `=`, `%20` no pasa a `+`).
pub fn with_query_param(url: &Url, name: &str, value: &str) -> Url {
    let pair = form_urlencoded::Serializer::new(String::new()).append_pair(name, value)
                                                              .finish();
    let mut segments: Vec<String> = Vec::new();
    let mut replaced = false;
    for raw in url.query().unwrap_or("").split('&').filter(|s| !s.is_empty()) {
        let matches = form_urlencoded::parse(raw.as_bytes()).next()
                                                            .is_some_and(|(k, _)| k == name);
        if !matches {
            segments.push(raw.to_string());
        } else if !replaced {
            segments.push(pair.clone());
            replaced = true;
        }
    }
    if !replaced {
        segments.push(pair);
    }
    let mut next = url.clone();
    next.set_query(Some(&segments.join("&")));
    next
}

/// Lee un parámetro de query de una URL textual.
pub fn query_param_of(url: &Url, name: &str) -> Option<String> {
    url.query_pairs().find(|(k, _)| k == name).map(|(_, v)| v.into_owned())
}

/// Historial en memoria: la última entrada es la actual.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<Vec<Url>>,
}

impl MemoryHistory {
    pub fn new(initial: &str) -> Result<Self, WorkflowError> {
        let url = Url::parse(initial).map_err(|e| WorkflowError::History(format!("{initial}: {e}")))?;
        Ok(Self { entries: Mutex::new(vec![url]) })
    }

    fn current(&self) -> Url {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        // nunca vacío: se crea con una entrada y sólo se agregan
        entries[entries.len() - 1].clone()
    }

    /// Cantidad de entradas (la inicial incluida).
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|u| u.to_string())
            .collect()
    }
}

impl HistoryPort for MemoryHistory {
    fn current_url(&self) -> String {
        self.current().to_string()
    }

    fn query_param(&self, name: &str) -> Option<String> {
        query_param_of(&self.current(), name)
    }

    fn push_with_param(&self, name: &str, value: &str) -> Result<(), WorkflowError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let next = with_query_param(&entries[entries.len() - 1], name, value);
        entries.push(next);
        Ok(())
    }
}
