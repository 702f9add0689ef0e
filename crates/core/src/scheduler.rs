//! Task schedulers a project can choose from.

use crate::error::CoreError;

/// Scheduler used when a project never picked one.
pub const DEFAULT: &str = "default";

pub const KNOWN: &[&str] = &[DEFAULT, "breadth_first", "depth_first", "random", "incremental"];

/// Reject scheduler names the platform does not know.
pub fn validate(name: &str) -> Result<(), CoreError> {
    if KNOWN.contains(&name) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unknown scheduler '{name}'. Expected one of: {}",
            KNOWN.join(", ")
        )))
    }
}
