//! Common test utilities for HTTP integration tests.

pub mod app;

pub use app::*;
