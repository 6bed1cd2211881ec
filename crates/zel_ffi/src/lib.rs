//! Flutter-facing bindings for `zel_core`.

pub mod api;
