//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-codec`, `core-runtime`). Host applications can
//! depend on `mp3-stream-workspace` and enable the documented features without
//! needing to wire each crate individually.
//!
//! - `native-engines` (default): LAME and Symphonia engines for `core-codec`
//! - `logging`: exposes `core-runtime` for tracing setup

pub use core_codec as codec;

#[cfg(feature = "logging")]
pub use core_runtime as runtime;
