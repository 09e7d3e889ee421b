//! Shared test utilities for filepulse integration tests.
//!
//! This module provides:
//! - `TestHarness` running the full upload flow against an isolated upload
//!   directory and an in-memory database
//! - Store wrappers that count calls, record writes and inject failures
//! - Builders for fixture file contents

pub mod builders;
pub mod harness;
pub mod stores;

pub use builders::*;
pub use harness::TestHarness;
pub use stores::{FailingStore, RecordingStore, StoreWrite};
