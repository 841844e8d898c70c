//! Utility functions and helpers

use std::any::Any;
use std::time::{SystemTime, UNIX_EPOCH};

/// Get current timestamp in milliseconds
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Extract a readable message from a panic payload
pub fn panic_message(panic_info: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Parse a version string into components
pub fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() >= 3 {
        if let (Ok(major), Ok(minor), Ok(patch)) = (
            parts[0].parse::<u32>(),
            parts[1].parse::<u32>(),
            parts[2].parse::<u32>(),
        ) {
            return Some((major, minor, patch));
        }
    }
    None
}

/// Check if a version is compatible with another version (major.minor matching)
pub fn is_version_compatible(version1: &str, version2: &str) -> bool {
    if let (Some((major1, minor1, _)), Some((major2, minor2, _))) =
        (parse_version(version1), parse_version(version2))
    {
        major1 == major2 && minor1 == minor2
    } else {
        version1 == version2
    }
}
