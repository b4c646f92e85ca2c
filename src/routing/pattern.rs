//! Path pattern validation.
//!
//! Patterns use the router's own template syntax: `:name` binds exactly
//! one segment, `*name` binds every remaining segment and may only appear
//! last. Matching itself is left to axum; this module only checks that a
//! pattern is well formed before it is handed over.

/// One segment of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'p> {
    /// Matched verbatim.
    Literal(&'p str),
    /// `:name`, exactly one segment.
    Param(&'p str),
    /// `*name`, one or more trailing segments.
    Wildcard(&'p str),
}

/// Classifies a single segment.
pub fn classify_segment(segment: &str) -> Segment<'_> {
    if let Some(name) = segment.strip_prefix(':') {
        Segment::Param(name)
    } else if let Some(name) = segment.strip_prefix('*') {
        Segment::Wildcard(name)
    } else {
        Segment::Literal(segment)
    }
}

/// Splits and validates a pattern.
///
/// The root pattern `/` yields no segments. A single trailing slash is
/// allowed and ignored; empty segments elsewhere are rejected.
pub fn parse_pattern(pattern: &str) -> Result<Vec<Segment<'_>>, &'static str> {
    let Some(rest) = pattern.strip_prefix('/') else {
        return Err("must start with '/'");
    };
    if rest.is_empty() {
        return Ok(Vec::new());
    }

    let rest = rest.strip_suffix('/').unwrap_or(rest);
    let raw: Vec<&str> = rest.split('/').collect();
    let last = raw.len() - 1;

    let mut segments = Vec::with_capacity(raw.len());
    for (index, raw_segment) in raw.into_iter().enumerate() {
        let segment = classify_segment(raw_segment);
        match segment {
            Segment::Literal("") => return Err("empty segment"),
            Segment::Literal(text) if text.contains([':', '*']) => {
                return Err("parameters must span a whole segment")
            }
            Segment::Param("") => return Err("parameter without a name"),
            Segment::Wildcard("") => return Err("wildcard without a name"),
            Segment::Param(name) | Segment::Wildcard(name) if name.contains([':', '*']) => {
                return Err("parameter name contains a reserved character")
            }
            Segment::Wildcard(_) if index != last => {
                return Err("wildcard must be the last segment")
            }
            _ => {}
        }
        segments.push(segment);
    }

    Ok(segments)
}

/// Joins a group prefix and a relative path.
pub fn join_paths(prefix: &str, path: &str) -> String {
    if path.is_empty() {
        return prefix.to_string();
    }

    let mut joined = prefix.trim_end_matches('/').to_string();
    if !path.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(path);
    joined
}
