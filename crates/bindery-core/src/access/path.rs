#![forbid(unsafe_code)]

//! Property-path parsing.
//!
//! Grammar:
//!
//! ```text
//! path     := head ( '.' name | accessor )*
//! head     := name | accessor
//! accessor := '[' ( digits | quoted | bare ) ']'
//! name     := ( alphanumeric | '_' )+
//! quoted   := '\'' .* '\'' | '"' .* '"'
//! ```
//!
//! `digits` yields an [`PathSegment::Index`]; anything else yields a
//! [`PathSegment::Key`]. Quoting forces a key even for digits (`m['7']`).
//! Malformed input is rejected eagerly with [`BindingError::InvalidPath`].
//!
//! The canonical rendering ([`fmt::Display`]) is what caches key on, so
//! `a . b` style variants never reach a cache: they fail to parse.

use std::fmt;

use crate::error::BindingError;

/// One step of a property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Named property of an object (`address`).
    Property(String),
    /// Position in a list or array (`[2]`).
    Index(usize),
    /// Entry of a map (`[home]`).
    Key(String),
}

/// A parsed, canonical property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl PropertyPath {
    /// Parse `path`. The empty string is rejected.
    pub fn parse(path: &str) -> Result<Self, BindingError> {
        let fail = |reason: String| BindingError::invalid_path(path, reason);
        if path.is_empty() {
            return Err(fail("path is empty".to_string()));
        }

        let mut segments = Vec::new();
        let mut chars = path.char_indices().peekable();
        let mut after_dot = false;

        while let Some(&(pos, c)) = chars.peek() {
            match c {
                '.' => {
                    if segments.is_empty() || after_dot {
                        return Err(fail(format!("empty property name at offset {pos}")));
                    }
                    chars.next();
                    after_dot = true;
                }
                '[' => {
                    if after_dot {
                        return Err(fail(format!("expected property name at offset {pos}")));
                    }
                    chars.next();
                    segments.push(Self::parse_accessor(&mut chars, pos).map_err(fail)?);
                }
                ']' => return Err(fail(format!("unbalanced ']' at offset {pos}"))),
                c if is_name_char(c) => {
                    if !segments.is_empty() && !after_dot {
                        return Err(fail(format!("expected '.' or '[' at offset {pos}")));
                    }
                    let mut name = String::new();
                    while let Some(&(_, c)) = chars.peek() {
                        if !is_name_char(c) {
                            break;
                        }
                        name.push(c);
                        chars.next();
                    }
                    segments.push(PathSegment::Property(name));
                    after_dot = false;
                }
                other => {
                    return Err(fail(format!("unexpected character {other:?} at offset {pos}")));
                }
            }
        }

        if after_dot {
            return Err(fail("path ends with '.'".to_string()));
        }
        Ok(Self { segments })
    }

    fn parse_accessor(
        chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
        open: usize,
    ) -> Result<PathSegment, String> {
        let quote = match chars.peek() {
            Some(&(_, q @ ('\'' | '"'))) => {
                chars.next();
                Some(q)
            }
            _ => None,
        };

        let mut raw = String::new();
        loop {
            match chars.next() {
                None => return Err(format!("unclosed '[' at offset {open}")),
                Some((_, c)) if Some(c) == quote => {
                    return match chars.next() {
                        Some((_, ']')) => Ok(PathSegment::Key(raw)),
                        _ => Err(format!("expected ']' after quoted key opened at {open}")),
                    };
                }
                Some((_, ']')) if quote.is_none() => break,
                Some((pos, '[')) if quote.is_none() => {
                    return Err(format!("nested '[' at offset {pos}"));
                }
                Some((_, c)) => raw.push(c),
            }
        }

        if raw.is_empty() {
            return Err(format!("empty accessor at offset {open}"));
        }
        if raw.chars().all(|c| c.is_ascii_digit()) {
            return raw
                .parse::<usize>()
                .map(PathSegment::Index)
                .map_err(|_| format!("index `{raw}` out of range"));
        }
        Ok(PathSegment::Key(raw))
    }

    /// Build a path directly from segments.
    #[must_use]
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The first `len` segments.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Path without its last segment; `None` for single-segment paths.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        (self.segments.len() > 1).then(|| self.prefix(self.segments.len() - 1))
    }

    /// `self` followed by `tail`.
    #[must_use]
    pub fn join(&self, tail: &Self) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(tail.segments.iter().cloned());
        Self { segments }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Property(name) if i == 0 => f.write_str(name)?,
                PathSegment::Property(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) => {
                    let bare = key.chars().all(is_name_char)
                        && !key.chars().all(|c| c.is_ascii_digit());
                    if bare {
                        write!(f, "[{key}]")?;
                    } else if key.contains('\'') {
                        write!(f, "[\"{key}\"]")?;
                    } else {
                        write!(f, "['{key}']")?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for PropertyPath {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(path: &str) -> Vec<PathSegment> {
        PropertyPath::parse(path).unwrap().segments().to_vec()
    }

    fn p(name: &str) -> PathSegment {
        PathSegment::Property(name.to_string())
    }

    #[test]
    fn simple_and_nested() {
        assert_eq!(segs("name"), vec![p("name")]);
        assert_eq!(segs("address.city"), vec![p("address"), p("city")]);
    }

    #[test]
    fn indexed_and_keyed() {
        assert_eq!(segs("items[0]"), vec![p("items"), PathSegment::Index(0)]);
        assert_eq!(
            segs("phones[home]"),
            vec![p("phones"), PathSegment::Key("home".into())]
        );
        assert_eq!(
            segs("a.b[0].c"),
            vec![p("a"), p("b"), PathSegment::Index(0), p("c")]
        );
        assert_eq!(
            segs("grid[1][2]"),
            vec![p("grid"), PathSegment::Index(1), PathSegment::Index(2)]
        );
    }

    #[test]
    fn quoted_keys() {
        assert_eq!(
            segs("m['7']"),
            vec![p("m"), PathSegment::Key("7".into())]
        );
        assert_eq!(
            segs("m[\"a.b]\"]"),
            vec![p("m"), PathSegment::Key("a.b]".into())]
        );
    }

    #[test]
    fn leading_accessor_is_allowed() {
        assert_eq!(segs("[3].name"), vec![PathSegment::Index(3), p("name")]);
    }

    #[test]
    fn malformed_paths_are_rejected() {
        for bad in [
            "", ".a", "a.", "a..b", "a[", "a[]", "a]", "a[0", "a.[0]", "a b", "a[1[2]]",
            "a['x'", "a['x'y]", "a-b",
        ] {
            let err = PropertyPath::parse(bad).expect_err(bad);
            assert!(
                matches!(err, BindingError::InvalidPath { ref path, .. } if path == bad),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn oversized_index_is_rejected() {
        let huge = format!("a[{}0]", usize::MAX);
        assert!(PropertyPath::parse(&huge).is_err());
    }

    #[test]
    fn canonical_rendering() {
        for path in ["a", "a.b", "a[0]", "a.b[0].c", "m[home]", "m['7']", "[1][2]"] {
            assert_eq!(PropertyPath::parse(path).unwrap().to_string(), path);
        }
        assert_eq!(
            PropertyPath::parse("m[\"x\"]").unwrap().to_string(),
            "m[x]"
        );
        let odd = PropertyPath::from_segments(vec![p("m"), PathSegment::Key("it's".into())]);
        assert_eq!(odd.to_string(), "m[\"it's\"]");
    }

    #[test]
    fn prefix_parent_join() {
        let path = PropertyPath::parse("a.b[0].c").unwrap();
        assert_eq!(path.prefix(2).to_string(), "a.b");
        assert_eq!(path.parent().unwrap().to_string(), "a.b[0]");
        assert!(PropertyPath::parse("a").unwrap().parent().is_none());

        let head = PropertyPath::parse("items").unwrap();
        let tail = PropertyPath::parse("[1].name").unwrap();
        assert_eq!(head.join(&tail).to_string(), "items[1].name");
    }
}
