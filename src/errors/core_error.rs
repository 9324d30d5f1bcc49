use sign_core::WorkflowError;
use sign_domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Error interno: {0}")]
    Internal(String),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error del ciclo de generación: {0}")]
    Workflow(#[from] WorkflowError),
    #[error("Error de dominio: {0}")]
    Domain(#[from] DomainError),
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_internal_variant_format() {
        let err = CoreError::Internal("algo malo".into());
        assert_eq!(err.to_string(), "Error interno: algo malo");
    }

    #[test]
    fn test_io_variant_from() {
        let io_err = std::io::Error::other("falló IO");
        let err: CoreError = io_err.into();
        assert_eq!(err.to_string(), "Error en IO: falló IO");
    }

    #[test]
    fn test_workflow_variant_from() {
        let err: CoreError = WorkflowError::BackendStatus { endpoint: "htmlgen".into(),
                                                            status: 500 }.into();
        assert_eq!(err.to_string(), "Error del ciclo de generación: backend answered 500 on htmlgen");
    }

    #[test]
    fn test_domain_variant_from() {
        let err: CoreError = DomainError::InvalidDataUri("x".into()).into();
        assert!(matches!(err, CoreError::Domain(_)));
    }
}
