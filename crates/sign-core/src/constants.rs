//! Constantes del contrato con el backend y con la URL de la página.
//!
//! Son parte del contrato externo: cambiarlas rompe enlaces ya publicados
//! (`JSONURL_PARAM`) o la decodificación del formulario en el backend
//! (`SIGNATURE_FIELD_*`).

/// Parámetro de query que guarda la source reference (estado reanudable).
pub const JSONURL_PARAM: &str = "jsonurl";

/// Campo del formulario donde la página recibe el token anti-forgery.
pub const CSRF_FORM_FIELD: &str = "gorilla.csrf.Token";

/// Cabecera en la que se reenvía el token anti-forgery.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Nombre del engine por defecto; en `pdfgen` no lleva parámetro `svc`.
pub const DEFAULT_ENGINE: &str = "default";

/// Engine alternativo conocido.
pub const RAPTOR_ENGINE: &str = "raptor";

/// Prefijo y sufijo del nombre de campo por slot: `Signatures.{i}.DataURI`.
pub const SIGNATURE_FIELD_PREFIX: &str = "Signatures";
pub const SIGNATURE_FIELD_SUFFIX: &str = "DataURI";

/// Ubicación por defecto del document source cuando la URL no trae `jsonurl`.
pub const DEFAULT_SOURCE_LOCATION: &str = "/templates/signoff.json";
