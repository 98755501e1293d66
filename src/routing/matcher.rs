//! URL pattern compilation and matching.
//!
//! # Responsibilities
//! - Compile a `url_pattern` into literal and capture segments
//! - Match a request path segment-by-segment
//! - Extract named path parameters
//!
//! # Design Decisions
//! - Path matching is case-sensitive and byte-exact
//! - Segment counts must be equal (no wildcard tails)
//! - Captures bind the raw segment, no decoding
//! - No regex to guarantee O(segments) matching

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Errors raised while compiling a URL pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern must start with '/': {0:?}")]
    MissingLeadingSlash(String),

    #[error("capture in segment {0:?} has an empty name")]
    EmptyCaptureName(String),

    #[error("segment {0:?} has unbalanced braces")]
    UnbalancedBraces(String),

    #[error("capture name {0:?} is used more than once")]
    DuplicateCapture(String),
}

/// One unit of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Capture(String),
}

/// Path parameters captured by a successful match, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Get a captured value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn push(&mut self, name: &str, value: &str) {
        self.0.push((name.to_string(), value.to_string()));
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A compiled URL pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a pattern such as `/listDir/{dirname}`.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let rest = pattern
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(pattern.to_string()))?;

        let mut seen = HashSet::new();
        let mut segments = Vec::new();

        for raw in rest.split('/') {
            let segment = parse_segment(raw)?;
            if let Segment::Capture(name) = &segment {
                if !seen.insert(name.clone()) {
                    return Err(PatternError::DuplicateCapture(name.clone()));
                }
            }
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Match a request path, returning the captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let rest = path.strip_prefix('/')?;

        let mut params = Params::new();
        let mut parts = rest.split('/');

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Capture(name) => params.push(name, part),
            }
        }

        // Request path has more segments than the pattern
        if parts.next().is_some() {
            return None;
        }

        Some(params)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => write!(f, "/{}", literal)?,
                Segment::Capture(name) => write!(f, "/{{{}}}", name)?,
            }
        }
        Ok(())
    }
}

fn parse_segment(raw: &str) -> Result<Segment, PatternError> {
    let opens = raw.matches('{').count();
    let closes = raw.matches('}').count();

    if opens == 0 && closes == 0 {
        return Ok(Segment::Literal(raw.to_string()));
    }

    // A capture must span the whole segment
    match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        Some(name) if opens == 1 && closes == 1 => {
            if name.is_empty() {
                Err(PatternError::EmptyCaptureName(raw.to_string()))
            } else {
                Ok(Segment::Capture(name.to_string()))
            }
        }
        _ => Err(PatternError::UnbalancedBraces(raw.to_string())),
    }
}
