//! Path pattern compilation.
//!
//! # Responsibilities
//! - Parse patterns like `/user/:id/posts/:post` into segments
//! - Reject malformed patterns at attach time
//! - Test request paths and extract named parameters
//!
//! # Design Decisions
//! - Segment comparison instead of regex: no per-call compiled state to share
//! - Literal segments are case-sensitive
//! - One trailing slash on the request path is tolerated (`/about/` == `/about`)
//! - Parameter values are returned raw (no percent-decoding)

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Parameters extracted from a matched path.
pub type Params = HashMap<String, String>;

/// Reasons a path pattern is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern `{0}` must start with `/`")]
    MissingLeadingSlash(String),

    #[error("pattern `{0}` contains an empty segment")]
    EmptySegment(String),

    #[error("pattern `{pattern}` has an invalid parameter name `{name}`")]
    InvalidParamName { pattern: String, name: String },

    #[error("pattern `{pattern}` declares parameter `{name}` more than once")]
    DuplicateParam { pattern: String, name: String },

    #[error("pattern `{pattern}` uses unsupported token `{token}`")]
    UnsupportedToken { pattern: String, token: char },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a pattern string.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let rest = pattern
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(pattern.to_string()))?;
        if rest.starts_with('/') {
            return Err(PatternError::EmptySegment(pattern.to_string()));
        }

        // "/" and "/users/" both compile; the trailing slash carries no segment.
        let rest = rest.strip_suffix('/').unwrap_or(rest);

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for raw in rest.split('/') {
                segments.push(parse_segment(pattern, raw, &segments)?);
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of the parameter segments in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Returns true if the path's segment structure matches.
    pub fn is_match(&self, path: &str) -> bool {
        self.zip_segments(path)
            .map(|mut pairs| {
                pairs.all(|(segment, value)| match segment {
                    Segment::Literal(lit) => lit == value,
                    Segment::Param(_) => !value.is_empty(),
                })
            })
            .unwrap_or(false)
    }

    /// Extract parameters, or `None` if the path does not match.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let mut params = Params::new();
        for (segment, value) in self.zip_segments(path)? {
            match segment {
                Segment::Literal(lit) if lit == value => {}
                Segment::Param(name) if !value.is_empty() => {
                    params.insert(name.clone(), value.to_string());
                }
                _ => return None,
            }
        }
        Some(params)
    }

    fn zip_segments<'a>(
        &'a self,
        path: &'a str,
    ) -> Option<impl Iterator<Item = (&'a Segment, &'a str)>> {
        let path = if path.is_empty() { "/" } else { path };
        let rest = path.strip_prefix('/')?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);

        let count = if rest.is_empty() { 0 } else { rest.split('/').count() };
        if count != self.segments.len() {
            return None;
        }

        let values = rest.split('/').filter(move |_| count > 0);
        Some(self.segments.iter().zip(values))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segment(pattern: &str, raw: &str, seen: &[Segment]) -> Result<Segment, PatternError> {
    if raw.is_empty() {
        return Err(PatternError::EmptySegment(pattern.to_string()));
    }

    if let Some(token) = raw.chars().find(|c| matches!(c, '*' | '?' | '(' | ')')) {
        return Err(PatternError::UnsupportedToken {
            pattern: pattern.to_string(),
            token,
        });
    }

    let Some(name) = raw.strip_prefix(':') else {
        return Ok(Segment::Literal(raw.to_string()));
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PatternError::InvalidParamName {
            pattern: pattern.to_string(),
            name: name.to_string(),
        });
    }

    if seen.iter().any(|s| matches!(s, Segment::Param(n) if n == name)) {
        return Err(PatternError::DuplicateParam {
            pattern: pattern.to_string(),
            name: name.to_string(),
        });
    }

    Ok(Segment::Param(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_pattern() {
        let p = Pattern::compile("/about/team").unwrap();
        assert!(p.is_match("/about/team"));
        assert!(p.is_match("/about/team/"));
        assert!(!p.is_match("/about"));
        assert!(!p.is_match("/about/team/extra"));
        assert!(!p.is_match("/About/team")); // Case sensitive
        assert_eq!(p.captures("/about/team"), Some(Params::new()));
    }

    #[test]
    fn test_root_pattern() {
        let p = Pattern::compile("/").unwrap();
        assert!(p.is_match("/"));
        assert!(p.is_match(""));
        assert!(!p.is_match("/x"));
    }

    #[test]
    fn test_param_extraction() {
        let p = Pattern::compile("/user/:id").unwrap();
        assert!(p.is_match("/user/42"));
        assert!(!p.is_match("/user/"));
        assert!(!p.is_match("/user"));

        let params = p.captures("/user/42").unwrap();
        assert_eq!(params.get("id"), Some(&"42".to_string()));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_multiple_params() {
        let p = Pattern::compile("/org/:org/repo/:repo").unwrap();
        let params = p.captures("/org/rust-lang/repo/cargo").unwrap();
        assert_eq!(params["org"], "rust-lang");
        assert_eq!(params["repo"], "cargo");
        assert_eq!(p.param_names().collect::<Vec<_>>(), vec!["org", "repo"]);
        assert!(p.captures("/org/rust-lang/issues/cargo").is_none());
    }

    #[test]
    fn test_raw_values_are_not_decoded() {
        let p = Pattern::compile("/search/:term").unwrap();
        assert_eq!(p.captures("/search/a%20b").unwrap()["term"], "a%20b");
    }

    #[test]
    fn test_malformed_patterns() {
        assert!(matches!(
            Pattern::compile("user/:id"),
            Err(PatternError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            Pattern::compile("/a//b"),
            Err(PatternError::EmptySegment(_))
        ));
        assert!(matches!(
            Pattern::compile("//"),
            Err(PatternError::EmptySegment(_))
        ));
        assert!(matches!(
            Pattern::compile("//users"),
            Err(PatternError::EmptySegment(_))
        ));
        assert!(matches!(
            Pattern::compile("/user/:"),
            Err(PatternError::InvalidParamName { .. })
        ));
        assert!(matches!(
            Pattern::compile("/user/:na-me"),
            Err(PatternError::InvalidParamName { .. })
        ));
        assert!(matches!(
            Pattern::compile("/a/:id/b/:id"),
            Err(PatternError::DuplicateParam { .. })
        ));
        assert!(matches!(
            Pattern::compile("/files/*"),
            Err(PatternError::UnsupportedToken { token: '*', .. })
        ));
    }
}
