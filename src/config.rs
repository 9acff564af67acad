//! Tunable constants for rope shape and buffer history
//!
//! Both structs deserialize with `#[serde(default)]`, so a configuration
//! document only needs the fields it wants to change:
//!
//! ```rust
//! use editkit_core::RopeConfig;
//!
//! let config = RopeConfig::from_json(r#"{ "fusion_threshold": 16 }"#).unwrap();
//! assert_eq!(config.fusion_threshold, 16);
//! assert_eq!(config.balance_factor, 2);
//! ```

use crate::error::{EditError, Result};
use serde::{Deserialize, Serialize};

/// Shape policy for ropes
///
/// - **balance_factor** (K): an internal node is balanced while neither
///   child is more than K times as deep as the other
/// - **fusion_threshold** (S): concatenations whose combined length is
///   below S collapse into a single leaf
/// - **depth_threshold** (D): an unbalanced concatenation is rebuilt only
///   once its depth exceeds D
/// - **node_size**: preferred leaf length when building from text; also
///   the largest leaf the in-place append path will grow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RopeConfig {
    pub balance_factor: usize,
    pub fusion_threshold: usize,
    pub depth_threshold: usize,
    pub node_size: usize,
}

impl Default for RopeConfig {
    fn default() -> Self {
        Self {
            balance_factor: 2,
            fusion_threshold: 64,
            depth_threshold: 20,
            node_size: 1024,
        }
    }
}

impl RopeConfig {
    /// Parse a JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RopeConfig =
            serde_json::from_str(json).map_err(|e| EditError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the constants are usable together
    pub fn validate(&self) -> Result<()> {
        if self.balance_factor == 0 {
            return Err(EditError::Config(
                "balance_factor must be at least 1".to_string(),
            ));
        }
        if self.node_size == 0 {
            return Err(EditError::Config("node_size must be at least 1".to_string()));
        }
        if self.fusion_threshold > self.node_size {
            return Err(EditError::Config(format!(
                "fusion_threshold ({}) exceeds node_size ({})",
                self.fusion_threshold, self.node_size
            )));
        }
        Ok(())
    }
}

/// Settings for an editing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Shape policy for every rope the buffer builds
    pub rope: RopeConfig,

    /// Maximum number of undo records kept (oldest dropped first)
    pub undo_limit: Option<usize>,
}

impl BufferConfig {
    /// Parse a JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BufferConfig =
            serde_json::from_str(json).map_err(|e| EditError::Config(e.to_string()))?;
        config.rope.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RopeConfig::default();
        assert_eq!(config.balance_factor, 2);
        assert_eq!(config.depth_threshold, 20);
        assert_eq!(config.node_size, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = RopeConfig::from_json(r#"{ "node_size": 256 }"#).unwrap();
        assert_eq!(config.node_size, 256);
        assert_eq!(config.fusion_threshold, 64);
    }

    #[test]
    fn test_invalid_balance_factor() {
        let result = RopeConfig::from_json(r#"{ "balance_factor": 0 }"#);
        assert!(matches!(result, Err(EditError::Config(_))));
    }

    #[test]
    fn test_fusion_larger_than_node_rejected() {
        let result = RopeConfig::from_json(r#"{ "node_size": 8, "fusion_threshold": 16 }"#);
        assert!(matches!(result, Err(EditError::Config(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = RopeConfig::from_json("{ node_size: ");
        assert!(matches!(result, Err(EditError::Config(_))));
    }

    #[test]
    fn test_buffer_config() {
        let config = BufferConfig::from_json(r#"{ "undo_limit": 100, "rope": { "depth_threshold": 8 } }"#)
            .unwrap();
        assert_eq!(config.undo_limit, Some(100));
        assert_eq!(config.rope.depth_threshold, 8);
        assert_eq!(config.rope.balance_factor, 2);

        assert_eq!(BufferConfig::default().undo_limit, None);
    }
}
