//! Domain entities and value types

pub mod errors;
pub mod newtypes;
pub mod unit;

pub use errors::DomainError;
pub use newtypes::UnitId;
pub use unit::{ChecklistItem, ImageRef, Note, SyncUnit};
