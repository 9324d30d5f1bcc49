// sign-domain library entry point
pub mod data_uri;
pub mod error;
pub mod report;
pub use data_uri::DataUri;
pub use error::DomainError;
pub use report::{Case, Information, InspectionReport, Item, Report, Room, Signature, Unit};
