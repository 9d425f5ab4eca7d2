// Path: crates/api/src/test_utils/mod.rs

//! Test doubles for the engine boundary.

mod mock_engine;

pub use mock_engine::{MockEngine, RecordedPut};
