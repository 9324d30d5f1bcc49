use signflow_rust::cli::USAGE;
use signflow_rust::{config, run, CliArgs, CoreError};
use sign_adapters::HttpGenerationClient;
use log::error;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    // RUST_LOG controla el nivel; los registros de `log` de los crates pasan por aquí
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                             .init();

    let args = CliArgs::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }
    let cfg = config()?;
    let client = Arc::new(HttpGenerationClient::new(&cfg.base_url, cfg.timeout)?);

    let summary = match run(client, cfg, &args).await {
        Ok(summary) => summary,
        Err(CoreError::Workflow(e)) if e.is_remote() => {
            // nada quedó escrito: volver a correr es el reintento
            error!("backend request failed, nothing was generated: {e}");
            return Err(e.into());
        }
        Err(e) => return Err(e),
    };
    let rendered = serde_json::to_string_pretty(&summary).map_err(|e| CoreError::Internal(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}
