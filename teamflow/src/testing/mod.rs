//! Testing utilities for teamflow teams.
//!
//! This module provides:
//! - Mock stages (recording, failing, slow)
//! - Context assertions
//! - A fixture wiring recording collaborators into a factory

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_added_exactly, assert_flag, assert_has_keys, assert_lacks_keys, assert_text,
};
pub use fixtures::TestFixture;
pub use mocks::{FailingStage, RecordingStage, SlowStage};
