//! Core use-case services.
//!
//! # Responsibility
//! - Reconcile in-memory application state with the two durable stores.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod state_controller;
