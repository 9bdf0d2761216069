//! Guarded regex compilation
//!
//! Regex bodies come from case descriptions, so compilation enforces the
//! length, nesting and program-size limits from [`RegexLimits`].

use crate::config::RegexLimits;
use regex::{Regex, RegexBuilder};

/// Validate and compile a regex body under the given limits
pub fn safe_regex_compile(pattern: &str, limits: &RegexLimits) -> Result<Regex, String> {
    compile_within_limits(pattern, pattern, limits)
}

/// Compile `pattern`, charging the length and nesting limits to `source`,
/// the body as written before any rewriting
pub(crate) fn compile_within_limits(
    source: &str,
    pattern: &str,
    limits: &RegexLimits,
) -> Result<Regex, String> {
    if source.is_empty() {
        return Err("empty regex pattern".to_string());
    }

    if source.len() > limits.max_pattern_length {
        return Err(format!(
            "pattern too long: {} characters (max: {})",
            source.len(),
            limits.max_pattern_length
        ));
    }

    if nesting_depth(source) > limits.max_nesting_depth {
        return Err(format!(
            "pattern nests groups deeper than {}",
            limits.max_nesting_depth
        ));
    }

    RegexBuilder::new(pattern)
        .size_limit(limits.size_limit)
        .dfa_size_limit(limits.dfa_size_limit)
        .build()
        .map_err(|e| format!("regex compilation failed: {}", e))
}

/// Deepest group nesting, ignoring escaped parentheses
fn nesting_depth(pattern: &str) -> usize {
    let mut depth: usize = 0;
    let mut max_depth: usize = 0;
    let mut escaped = false;

    for ch in pattern.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '(' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    max_depth
}
