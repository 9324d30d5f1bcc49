//! Argumentos de línea de comandos de `signflow`.
use std::path::PathBuf;

use crate::errors::CoreError;

pub const USAGE: &str = "usage: signflow [--form] [--page <url>] [--field <name>=<value>]... [--signature <png>]...";

/// Opciones de una corrida.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// Envía como formulario multipart en lugar de JSON.
    pub form: bool,
    /// Sobrescribe la URL inicial de la página.
    pub page: Option<String>,
    pub fields: Vec<(String, String)>,
    /// Una imagen PNG por slot, en orden.
    pub signatures: Vec<PathBuf>,
    pub help: bool,
}

impl CliArgs {
    pub fn parse<I>(args: I) -> Result<Self, CoreError>
        where I: IntoIterator<Item = String>
    {
        let mut out = CliArgs::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| args.next().ok_or_else(|| CoreError::Config(format!("{flag} requires a value")));
            match arg.as_str() {
                "--form" => out.form = true,
                "--page" => out.page = Some(value("--page")?),
                "--signature" => out.signatures.push(PathBuf::from(value("--signature")?)),
                "--field" => {
                    let raw = value("--field")?;
                    let (name, val) = raw.split_once('=')
                                         .ok_or_else(|| CoreError::Config(format!("--field expects name=value, got {raw}")))?;
                    out.fields.push((name.to_string(), val.to_string()));
                }
                "-h" | "--help" => out.help = true,
                other => return Err(CoreError::Config(format!("unknown argument {other}\n{USAGE}"))),
            }
        }
        Ok(out)
    }
}
