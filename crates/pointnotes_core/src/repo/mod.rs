//! Relational store abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the note storage contract used by the state controller.
//! - Isolate SQLite query details from controller orchestration.
//!
//! # Invariants
//! - The store holds raw note text only; deduplication is not enforced here.

pub mod note_repo;
