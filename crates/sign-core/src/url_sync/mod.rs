//! Estado reanudable en la URL de la página.

mod history;
mod sync;

pub use history::{query_param_of, with_query_param, HistoryPort, MemoryHistory};
pub use sync::UrlStateSync;
