//! Matcher configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Default bound on `Nested`/`Continue` recursion
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Maximum nesting of sub-matcher invocations within one match
    pub max_depth: usize,

    /// Limits applied when compiling regex literals
    pub regex: RegexLimits,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            regex: RegexLimits::default(),
        }
    }
}

impl MatchConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the recursion bound
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Replace the regex limits
    pub fn with_regex_limits(mut self, limits: RegexLimits) -> Self {
        self.regex = limits;
        self
    }
}

/// Limits for regex compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegexLimits {
    /// Maximum length of a regex body
    pub max_pattern_length: usize,
    /// Maximum group nesting depth
    pub max_nesting_depth: usize,
    /// Compiled program size limit (bytes)
    pub size_limit: usize,
    /// Lazy DFA cache limit (bytes)
    pub dfa_size_limit: usize,
}

impl Default for RegexLimits {
    fn default() -> Self {
        Self {
            max_pattern_length: 1000,
            max_nesting_depth: 10,
            size_limit: 10 * 1024 * 1024,
            dfa_size_limit: 2 * 1024 * 1024,
        }
    }
}
