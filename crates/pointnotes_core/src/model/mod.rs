//! Domain values shared by the controller and its callers.
//!
//! # Responsibility
//! - Define the points reward policy and the persisted counter encoding.
//! - Define the serializable snapshot of application state.
//!
//! # Invariants
//! - Notes are plain `String` values; equality is exact text equality.
//! - Points never decrease.

pub mod points;
pub mod snapshot;
