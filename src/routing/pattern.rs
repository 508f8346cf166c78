//! Route pattern syntax.
//!
//! Patterns are plain paths with parameter tokens:
//!
//! * `<name>` captures one segment,
//! * `<name:regex>` captures one segment constrained by `regex`,
//! * `<*name>` captures the rest of the path, slashes included.
//!
//! Several tokens may be glued inside one segment with literal text between
//! them (`<name>-<id:\d+>.json`); such a segment is matched by one combined
//! regex built by [`capture_segment`].

use std::collections::HashSet;
use std::fmt::Write;

use super::params::ParamValue;
use crate::error::{RouterError, RouterResult};

/// Constraint every open-ended token is normalized to
pub const WIDE_OPEN: &str = ".+";

fn is_wide_open(constraint: &str) -> bool {
    matches!(constraint, "" | ".*" | "[^/]*" | "[^/]+" | WIDE_OPEN)
}

/// Normalizes a raw pattern.
///
/// The result starts with `/` and every token carries an explicit constraint,
/// so `users/<id>` becomes `/users/<id:.+>`. Normalizing twice is a no-op.
pub fn normalize_path(raw: &str) -> RouterResult<String> {
    let mut normalized = String::with_capacity(raw.len() + 1);
    if !raw.starts_with('/') {
        normalized.push('/');
    }

    let mut seen = HashSet::new();
    let mut segment_has_param = false;
    let mut rest = raw;

    while let Some(open) = rest.find('<') {
        let (literal, tail) = rest.split_at(open);
        if literal.contains('>') {
            return Err(RouterError::pattern(raw, "'>' without a matching '<'"));
        }
        if literal.contains('/') {
            segment_has_param = false;
        }
        normalized.push_str(literal);

        let close = tail
            .find('>')
            .ok_or_else(|| RouterError::pattern(raw, "unclosed '<'"))?;
        let token = &tail[1..close];
        if token.contains('<') {
            return Err(RouterError::pattern(raw, "nested '<' inside a parameter"));
        }

        let (name, constraint) = token.split_once(':').unwrap_or((token, ""));
        if name.trim_start_matches('*').is_empty() {
            return Err(RouterError::pattern(raw, "parameter without a name"));
        }
        if name.contains('/') {
            return Err(RouterError::pattern(raw, format!("parameter name '{}' contains '/'", name)));
        }
        if !seen.insert(name.trim_start_matches('*')) {
            return Err(RouterError::pattern(raw, format!("duplicate parameter '{}'", name)));
        }

        let constraint = if is_wide_open(constraint) { WIDE_OPEN } else { constraint };
        rest = &tail[close + 1..];

        if name.starts_with('*') {
            if constraint != WIDE_OPEN {
                return Err(RouterError::pattern(raw, format!("wildcard '{}' cannot carry a constraint", name)));
            }
            if !rest.is_empty() {
                return Err(RouterError::pattern(raw, format!("wildcard '{}' must end the pattern", name)));
            }
            if segment_has_param {
                return Err(RouterError::pattern(raw, format!("wildcard '{}' shares its segment with another parameter", name)));
            }
        }
        segment_has_param = true;

        let _ = write!(normalized, "<{}:{}>", name, constraint);
    }

    if rest.contains('>') {
        return Err(RouterError::pattern(raw, "'>' without a matching '<'"));
    }
    normalized.push_str(rest);
    Ok(normalized)
}

/// Captures of one path segment, ready to compile into a node matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentCapture {
    /// Parameter names in capture order
    pub names: Vec<String>,
    /// Escaped literal text with one `(constraint)` group per parameter
    pub pattern: String,
    /// Exclusive byte index where the segment ends
    pub end: usize,
}

impl SegmentCapture {
    /// A single open-ended capture needs no regex at all
    pub fn is_plain(&self) -> bool {
        self.names.len() == 1 && self.pattern == format!("({})", WIDE_OPEN)
    }
}

/// Scans a normalized pattern from `start` to the next `/` outside a token.
pub fn capture_segment(path: &str, start: usize) -> RouterResult<SegmentCapture> {
    let mut names = Vec::new();
    let mut pattern = String::new();
    let mut i = start;

    while i < path.len() {
        let rest = &path[i..];
        if rest.starts_with('/') {
            break;
        }
        if rest.starts_with('<') {
            let close = rest
                .find('>')
                .ok_or_else(|| RouterError::pattern(path, "unclosed '<'"))?;
            let token = &rest[1..close];
            let (name, constraint) = token.split_once(':').unwrap_or((token, WIDE_OPEN));
            names.push(name.to_string());
            pattern.push('(');
            pattern.push_str(constraint);
            pattern.push(')');
            i += close + 1;
        } else {
            let len = rest.find(['/', '<']).unwrap_or(rest.len());
            pattern.push_str(&regex::escape(&rest[..len]));
            i += len;
        }
    }

    Ok(SegmentCapture { names, pattern, end: i })
}

/// Joins a zone's pattern with a sub-pattern using exactly one `/`.
pub fn join_path(base: &str, sub: &str) -> String {
    if sub.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), sub.trim_start_matches('/'))
}

/// Pieces of a normalized pattern, used to rebuild concrete URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece<'a> {
    Literal(&'a str),
    Param(&'a str),
}

pub(crate) fn pieces(normalized: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut rest = normalized;
    while let Some(open) = rest.find('<') {
        if open > 0 {
            pieces.push(Piece::Literal(&rest[..open]));
        }
        let Some(close) = rest[open..].find('>').map(|c| open + c) else {
            break;
        };
        let token = &rest[open + 1..close];
        pieces.push(Piece::Param(token.split_once(':').map_or(token, |(name, _)| name)));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest));
    }
    pieces
}

/// Builds a concrete path from a normalized pattern.
///
/// Values are written verbatim, without escaping or checking them against the
/// token's constraint. A wildcard token `<*path>` takes its value from either
/// `*path` or `path`.
pub fn reverse_pattern(route: &str, normalized: &str, params: &[(&str, ParamValue)]) -> RouterResult<String> {
    let mut url = String::with_capacity(normalized.len());
    for piece in pieces(normalized) {
        match piece {
            Piece::Literal(text) => url.push_str(text),
            Piece::Param(name) => {
                let bare = name.trim_start_matches('*');
                let value = params
                    .iter()
                    .find(|(key, _)| *key == name || *key == bare)
                    .map(|(_, value)| value)
                    .ok_or_else(|| RouterError::MissingArgument {
                        route: route.to_string(),
                        name: name.to_string(),
                    })?;
                let _ = write!(url, "{}", value);
            }
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_leading_slash_and_explicit_constraints() {
        assert_eq!(normalize_path("users/<id>").unwrap(), "/users/<id:.+>");
        assert_eq!(normalize_path("/users/<id:\\d+>").unwrap(), "/users/<id:\\d+>");
        assert_eq!(normalize_path("").unwrap(), "/");
    }

    #[test]
    fn open_ended_constraints_collapse_to_one_marker() {
        for raw in ["/<a>", "/<a:>", "/<a:.*>", "/<a:[^/]*>", "/<a:[^/]+>", "/<a:.+>"] {
            assert_eq!(normalize_path(raw).unwrap(), "/<a:.+>", "{}", raw);
        }
        assert_eq!(normalize_path("/files/<*path>").unwrap(), "/files/<*path:.+>");
    }

    #[test]
    fn normalizing_is_idempotent() {
        let once = normalize_path("/users/<name>-<id:\\d+>.json").unwrap();
        assert_eq!(normalize_path(&once).unwrap(), once);
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(normalize_path("/users/<id").is_err());
        assert!(normalize_path("/users/id>").is_err());
        assert!(normalize_path("/users/<a<b>>").is_err());
        assert!(normalize_path("/users/<>").is_err());
        assert!(normalize_path("/users/<:\\d+>").is_err());
        assert!(normalize_path("/users/<*>").is_err());
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = normalize_path("/users/<id>/posts/<id>").unwrap_err();
        assert!(err.to_string().contains("duplicate parameter 'id'"));
        assert!(normalize_path("/a/<path>/<*path>").is_err());
    }

    #[test]
    fn wildcards_must_be_open_and_terminal() {
        assert!(normalize_path("/files/<*path:\\w+>").is_err());
        assert!(normalize_path("/files/<*path>/meta").is_err());
        assert!(normalize_path("/files/<name>-<*path>").is_err());
        assert!(normalize_path("/files/x-<*path>").is_ok());
    }

    #[test]
    fn captures_a_single_segment() {
        let capture = capture_segment("<id:.+>/edit", 0).unwrap();
        assert_eq!(capture.names, vec!["id"]);
        assert_eq!(capture.pattern, "(.+)");
        assert_eq!(capture.end, 7);
        assert!(capture.is_plain());
    }

    #[test]
    fn captures_glued_tokens_with_escaped_literals() {
        let path = "<name:.+>-<id:\\d+>.json";
        let capture = capture_segment(path, 0).unwrap();
        assert_eq!(capture.names, vec!["name", "id"]);
        assert_eq!(capture.pattern, "(.+)\\-(\\d+)\\.json");
        assert_eq!(capture.end, path.len());
        assert!(!capture.is_plain());
    }

    #[test]
    fn captures_from_an_offset() {
        let capture = capture_segment("/users/<id:.+>.json", 7).unwrap();
        assert_eq!(capture.names, vec!["id"]);
        assert_eq!(capture.pattern, "(.+)\\.json");
    }

    #[test]
    fn joins_with_exactly_one_slash() {
        assert_eq!(join_path("/users", "<id>"), "/users/<id>");
        assert_eq!(join_path("/users/", "/<id>"), "/users/<id>");
        assert_eq!(join_path("/users", "/<id>"), "/users/<id>");
        assert_eq!(join_path("/", "about"), "/about");
        assert_eq!(join_path("/users", "/"), "/users/");
        assert_eq!(join_path("/users", ""), "/users");
    }

    #[test]
    fn splits_into_pieces() {
        assert_eq!(
            pieces("/users/<name:.+>-<id:\\d+>.json"),
            vec![
                Piece::Literal("/users/"),
                Piece::Param("name"),
                Piece::Literal("-"),
                Piece::Param("id"),
                Piece::Literal(".json"),
            ]
        );
    }

    #[test]
    fn reverses_glued_and_wildcard_tokens() {
        let pattern = normalize_path("/users/<name>-<id:\\d+>.json").unwrap();
        let url = reverse_pattern("user", &pattern, &[("id", 123.into()), ("name", "chris".into())]).unwrap();
        assert_eq!(url, "/users/chris-123.json");

        let files = normalize_path("/files/<*path>").unwrap();
        assert_eq!(reverse_pattern("f", &files, &[("path", "a/b".into())]).unwrap(), "/files/a/b");
        assert_eq!(reverse_pattern("f", &files, &[("*path", "c".into())]).unwrap(), "/files/c");
    }

    #[test]
    fn reversal_reports_the_missing_argument() {
        let pattern = normalize_path("/users/<id>").unwrap();
        let err = reverse_pattern("user", &pattern, &[("name", "x".into())]).unwrap_err();
        assert_eq!(
            err,
            RouterError::MissingArgument {
                route: "user".to_string(),
                name: "id".to_string()
            }
        );
    }
}
