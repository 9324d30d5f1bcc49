//! Adaptadores de sign-core hacia el exterior: backend HTTP y, en wasm, el
//! historial del navegador.
#[cfg(not(target_arch = "wasm32"))]
pub mod http;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpGenerationClient;
#[cfg(target_arch = "wasm32")]
pub use web::{init_console_logging, WebHistory};
