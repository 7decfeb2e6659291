//! QuillSync Core - Domain logic and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Note`, `ChecklistItem`, `ImageRef`, `SyncUnit`
//! - **Status taxonomy** - `OpStatus`, `TaskError`, `EngineStatus`, `TaskStatus`
//! - **Port definitions** - Traits for adapters: `RemoteBackend`, `LocalStore`
//! - **Manifest wire format** - the remote `noteCombos.json` document
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that the backend adapters and the local
//! store implement. The engine and sync crates orchestrate domain entities
//! through the port interfaces.

pub mod config;
pub mod domain;
pub mod manifest;
pub mod ports;
pub mod status;
