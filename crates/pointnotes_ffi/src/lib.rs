//! Flutter-facing bindings for pointnotes core.

pub mod api;
