//! SignFlow Rust Library
//!
//! Este crate une los crates del workspace en una aplicación:
//! - `config`: configuración desde el entorno (.env).
//! - `errors`: error de nivel aplicación.
//! - `cli` y `app`: argumentos y corrida completa del binario `signflow`.

pub mod app;
pub mod cli;
pub mod config;
pub mod errors;

pub use app::{run, RunSummary};
pub use cli::CliArgs;
pub use config::{config, AppConfig};
pub use errors::CoreError;
