//! Core state and persistence logic for pointnotes.
//! This crate is the single source of truth for note/points invariants.

pub mod config;
pub mod db;
pub mod kv;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::StoreConfig;
pub use kv::{FileKeyValueStore, KeyValueStore, KvError, KvResult, MemoryKeyValueStore};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::points::{ADD_REWARD, DELETE_REWARD};
pub use model::snapshot::StateSnapshot;
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::state_controller::{
    AddOutcome, ControllerError, ControllerPhase, ControllerResult, DeleteOutcome, ErrorKind,
    ErrorSignal, StateController, StoreFailure,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
