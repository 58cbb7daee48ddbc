//! Data shared between the controller and its collaborators

pub mod form;
pub mod preset;

pub use form::{FieldKind, FieldMap, FormField, FormSubmission, Page};
pub use preset::{Board, PresetCatalog, RBPI_HEADPHONES};
