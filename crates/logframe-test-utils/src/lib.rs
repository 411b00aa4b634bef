#![deny(unsafe_code)]

//! Shared test utilities for the logframe workspace.
//!
//! Provides catalog fixtures, config builders and a temp-dir workspace so
//! that individual crate tests stay concise and consistent. Tests capture
//! tracing output with `test-log`.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! logframe-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod fixtures;
pub mod workspace;
