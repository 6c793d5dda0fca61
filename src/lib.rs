//! preflight — startup profile manager host shim.
//!
//! The library side of the root crate wires the profile pipeline to a real
//! process: CLI parsing, a stderr logging backend, and a simple
//! default-configuration store the manager registers its output with.

pub mod cli;
pub mod host;
pub mod logging;

pub use host::PinnedConfigStore;
