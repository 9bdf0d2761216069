//! Regex literals and the standard regex collaborator
//!
//! A regex literal is written the way PCRE-style libraries expect it:
//! `/body/flags`, `#body#`, `{body}i` and so on. [`StandardRegex`]
//! recognizes such literals, translates them to `regex` crate syntax and
//! caches the compiled program by literal.
//!
//! Unless `m` or `D` is given, `$` also matches before a final newline, as
//! in PCRE. The `regex` crate has no lookahead, so that newline is consumed
//! and shows up in the whole-match capture.

use crate::capture::CaptureFragment;
use crate::config::RegexLimits;
use crate::error::PatternBuildError;
use crate::pattern::security::compile_within_limits;
use crate::pattern::traits::{RegexCaptures, RegexMatcher, RegexService};
use crate::value::Value;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Modifier letters accepted after the closing delimiter
pub const MODIFIERS: &str = "imsxuADU";

/// Modifiers that translate to inline `regex` flags
const INLINE_FLAGS: &str = "imsxU";

/// Characters that keep their backslash when used as a delimiter
const REGEX_META: &str = r"\.+*?()|[]{}^$#&-~";

static SHARED: Lazy<Arc<StandardRegex>> = Lazy::new(|| Arc::new(StandardRegex::default()));

/// A literal split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
struct RegexLiteral<'a> {
    delimiter: char,
    body: &'a str,
    modifiers: &'a str,
}

fn closing_delimiter(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        other => other,
    }
}

/// Whether the byte at `index` is preceded by an odd number of backslashes
fn is_escaped(literal: &str, index: usize) -> bool {
    literal.as_bytes()[..index]
        .iter()
        .rev()
        .take_while(|b| **b == b'\\')
        .count()
        % 2
        == 1
}

fn parse_literal(literal: &str) -> Option<RegexLiteral<'_>> {
    let open = literal.chars().next()?;
    if open.is_alphanumeric() || open == '\\' || open.is_whitespace() {
        return None;
    }

    let close = closing_delimiter(open);
    let start = open.len_utf8();
    let end = literal.rfind(close)?;
    if end < start {
        return None;
    }

    let body = &literal[start..end];
    let modifiers = &literal[end + close.len_utf8()..];
    if body.is_empty() || is_escaped(literal, end) {
        return None;
    }
    if !modifiers.chars().all(|m| MODIFIERS.contains(m)) {
        return None;
    }

    Some(RegexLiteral {
        delimiter: open,
        body,
        modifiers,
    })
}

/// Whether a string is a delimiter-bounded regex literal
pub fn is_regex_literal(literal: &str) -> bool {
    parse_literal(literal).is_some()
}

/// Drop the backslash in front of escaped delimiters the regex engine has no use for
fn unescape_delimiter(body: &str, delimiter: char) -> String {
    if REGEX_META.contains(delimiter) {
        return body.to_string();
    }
    let close = closing_delimiter(delimiter);

    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some(next) if next == delimiter || next == close => result.push(next),
            Some(next) => {
                result.push('\\');
                result.push(next);
            }
            None => result.push('\\'),
        }
    }
    result
}

/// Rewrite `$` outside character classes to also match before a final newline
fn dollar_before_final_newline(body: &str) -> String {
    let mut result = String::with_capacity(body.len() + 8);
    let mut chars = body.chars().peekable();
    let mut class_depth = 0usize;

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                result.push(ch);
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
            '[' => {
                class_depth += 1;
                result.push(ch);
                // `]` right after the opening bracket (or `^`) is literal
                if chars.peek() == Some(&'^') {
                    result.push('^');
                    chars.next();
                }
                if chars.peek() == Some(&']') {
                    result.push(']');
                    chars.next();
                }
            }
            ']' if class_depth > 0 => {
                class_depth -= 1;
                result.push(ch);
            }
            '$' if class_depth == 0 => result.push_str(r"(?:\n?\z)"),
            _ => result.push(ch),
        }
    }
    result
}

/// Translate a parsed literal to `regex` crate syntax
fn translate(literal: &RegexLiteral<'_>) -> String {
    let mut body = unescape_delimiter(literal.body, literal.delimiter);
    if !literal.modifiers.contains('m') && !literal.modifiers.contains('D') {
        body = dollar_before_final_newline(&body);
    }
    let flags: String = literal
        .modifiers
        .chars()
        .filter(|m| INLINE_FLAGS.contains(*m))
        .collect();

    let mut pattern = String::with_capacity(body.len() + flags.len() + 12);
    if !flags.is_empty() {
        pattern.push_str("(?");
        pattern.push_str(&flags);
        pattern.push(')');
    }
    if literal.modifiers.contains('A') {
        pattern.push_str(r"\A(?:");
        pattern.push_str(&body);
        // A trailing comment in extended mode would swallow the group end
        if flags.contains('x') {
            pattern.push('\n');
        }
        pattern.push(')');
    } else {
        pattern.push_str(&body);
    }
    pattern
}

/// Groups that did not participate in the match capture an empty string
fn group_text(m: Option<regex::Match<'_>>) -> String {
    m.map_or_else(String::new, |m| m.as_str().to_string())
}

/// A compiled regex literal
#[derive(Debug)]
pub struct CompiledRegex {
    literal: String,
    regex: Regex,
    group_names: Vec<String>,
}

impl CompiledRegex {
    /// Compile a literal under the given limits
    pub fn new(literal: &str, limits: &RegexLimits) -> Result<Self, PatternBuildError> {
        let parsed = parse_literal(literal).ok_or_else(|| PatternBuildError::InvalidRegex {
            literal: literal.to_string(),
            reason: "not a delimited regex literal".to_string(),
        })?;

        let regex = compile_within_limits(parsed.body, &translate(&parsed), limits)
            .map_err(|reason| {
                tracing::warn!(literal, %reason, "regex literal rejected");
                PatternBuildError::InvalidRegex {
                    literal: literal.to_string(),
                    reason,
                }
            })?;

        let group_names = regex.capture_names().flatten().map(String::from).collect();

        Ok(Self {
            literal: literal.to_string(),
            regex,
            group_names,
        })
    }

    /// The underlying `regex::Regex`
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl RegexMatcher for CompiledRegex {
    fn literal(&self) -> &str {
        &self.literal
    }

    fn group_names(&self) -> &[String] {
        &self.group_names
    }

    fn try_match(&self, subject: &str) -> Option<RegexCaptures> {
        let captures = self.regex.captures(subject)?;

        Some(RegexCaptures {
            named: self
                .group_names
                .iter()
                .map(|name| (name.clone(), group_text(captures.name(name))))
                .collect(),
            positional: captures.iter().map(group_text).collect(),
        })
    }
}

/// Regex collaborator backed by the `regex` crate
#[derive(Debug, Default)]
pub struct StandardRegex {
    limits: RegexLimits,
    cache: DashMap<String, Arc<CompiledRegex>>,
}

impl StandardRegex {
    /// Create a service with its own cache
    pub fn new(limits: RegexLimits) -> Self {
        Self {
            limits,
            cache: DashMap::new(),
        }
    }

    /// Process-wide service using default limits
    pub fn shared() -> Arc<StandardRegex> {
        Arc::clone(&SHARED)
    }

    /// Limits applied to new compilations
    pub fn limits(&self) -> &RegexLimits {
        &self.limits
    }

    /// Number of distinct literals compiled so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl RegexService for StandardRegex {
    fn looks_like_regex_literal(&self, literal: &str) -> bool {
        is_regex_literal(literal)
    }

    fn compile(&self, literal: &str) -> Result<Arc<dyn RegexMatcher>, PatternBuildError> {
        if let Some(compiled) = self.cache.get(literal) {
            return Ok(Arc::clone(compiled.value()) as Arc<dyn RegexMatcher>);
        }

        let compiled = Arc::new(CompiledRegex::new(literal, &self.limits)?);
        let compiled = self
            .cache
            .entry(literal.to_string())
            .or_insert(compiled)
            .value()
            .clone();
        Ok(compiled as Arc<dyn RegexMatcher>)
    }
}

/// The compiled form of a `Regex` pattern
#[derive(Debug, Clone)]
pub struct RegexPattern {
    matcher: Arc<dyn RegexMatcher>,
}

impl RegexPattern {
    /// Wrap a compiled regex
    pub fn new(matcher: Arc<dyn RegexMatcher>) -> Self {
        Self { matcher }
    }

    /// The literal the regex was compiled from
    pub fn literal(&self) -> &str {
        self.matcher.literal()
    }

    /// Named groups of the regex
    pub fn group_names(&self) -> &[String] {
        self.matcher.group_names()
    }

    /// Match a subject and shape the groups into a fragment.
    ///
    /// Named groups win: when the regex declares any, only they are
    /// captured. Otherwise all groups are captured as one positional array.
    pub fn capture(&self, subject: &str) -> Option<CaptureFragment> {
        let captures = self.matcher.try_match(subject)?;

        if !captures.named.is_empty() {
            let mut fragment = CaptureFragment::empty();
            for (name, text) in captures.named {
                fragment = fragment.with_named(name, Value::String(text));
            }
            return Some(fragment);
        }

        Some(CaptureFragment::positional(Value::Array(
            captures.positional.into_iter().map(Value::String).collect(),
        )))
    }
}
