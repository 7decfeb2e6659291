//! Port definitions (trait interfaces for adapters)

pub mod backend;
pub mod local_store;

pub use backend::{RemoteBackend, RemoteFile};
pub use local_store::LocalStore;
