//! Flutter-facing bindings for `gridpad_core`.

pub mod api;
