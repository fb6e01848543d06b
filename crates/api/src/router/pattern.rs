use std::collections::HashSet;
use std::fmt;

use crate::PathParams;
use crate::error::ConfigError;

type Matcher = matchit::Router<()>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Variable(String),
}

/// A route path pattern such as `/users/{user_id}/profile`.
///
/// A variable occupies a whole segment and matches any non-empty segment value. Each pattern owns
/// its own compiled matcher, so patterns never compete with each other: ordering between routes
/// is decided by the route table alone.
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    matcher: Matcher,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let Some(rest) = raw.strip_prefix('/') else {
            return Err(ConfigError::invalid_pattern(raw, "must start with `/`"));
        };

        let mut seen = HashSet::new();
        let mut segments = Vec::new();
        for segment in rest.split('/') {
            let segment = match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                        return Err(ConfigError::invalid_pattern(raw, format!("invalid variable name `{name}`")));
                    }
                    if !seen.insert(name) {
                        return Err(ConfigError::invalid_pattern(raw, format!("variable `{name}` appears twice")));
                    }
                    Segment::Variable(name.to_owned())
                }
                None if segment.contains(['{', '}']) => {
                    return Err(ConfigError::invalid_pattern(raw, "a variable must span a whole segment"));
                }
                None => Segment::Literal(segment.to_owned()),
            };
            segments.push(segment);
        }

        let mut matcher = Matcher::new();
        matcher.insert(raw, ()).map_err(|e| ConfigError::invalid_pattern(raw, e))?;
        Ok(Self { raw: raw.to_owned(), segments, matcher })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Variable(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables().any(|variable| variable == name)
    }

    /// The pattern with every variable name erased, e.g. `/users/{}/profile`.
    ///
    /// Two patterns with the same shape accept exactly the same paths.
    pub fn shape(&self) -> String {
        let mut shape = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            shape.push('/');
            match segment {
                Segment::Literal(literal) => shape.push_str(literal),
                Segment::Variable(_) => shape.push_str("{}"),
            }
        }
        shape
    }

    /// Matches a raw path (without query string), capturing the percent-decoded variable segments.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let matched = self.matcher.at(path).ok()?;
        if matched.params.iter().any(|(_, value)| value.is_empty()) {
            return None;
        }
        Some(PathParams::decode(matched.params.iter()))
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPattern").field("raw", &self.raw).field("segments", &self.segments).finish()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_segments() {
        let pattern = PathPattern::parse("/users/{username}/profile").unwrap();
        assert_eq!(
            pattern.segments(),
            [
                Segment::Literal("users".into()),
                Segment::Variable("username".into()),
                Segment::Literal("profile".into())
            ]
        );
        assert!(pattern.has_variable("username"));
        assert!(!pattern.has_variable("profile"));
    }

    #[test]
    fn matches_and_captures() {
        let pattern = PathPattern::parse("/items/{item_id}/details").unwrap();
        let params = pattern.matches("/items/5/details").unwrap();
        assert_eq!(params.get("item_id"), Some("5"));
        assert!(pattern.matches("/items/5").is_none());
        assert!(pattern.matches("/items/5/details/more").is_none());
    }

    #[test]
    fn captures_are_percent_decoded() {
        let pattern = PathPattern::parse("/users/username/{username}").unwrap();
        let params = pattern.matches("/users/username/john%20doe").unwrap();
        assert_eq!(params.get("username"), Some("john doe"));

        let params = pattern.matches("/users/username/%C0").unwrap();
        assert!(params.is_undecodable("username"));
    }

    #[test]
    fn literal_requires_equality() {
        let pattern = PathPattern::parse("/products/latest").unwrap();
        assert!(pattern.matches("/products/latest").unwrap().is_empty());
        assert!(pattern.matches("/products/oldest").is_none());
    }

    #[test]
    fn variable_rejects_empty_segment() {
        let pattern = PathPattern::parse("/users/{user_id}").unwrap();
        assert!(pattern.matches("/users/").is_none());
    }

    #[test]
    fn shape_erases_variable_names() {
        let by_id = PathPattern::parse("/users/{id}/profile").unwrap();
        let by_user_id = PathPattern::parse("/users/{user_id}/profile").unwrap();
        assert_eq!(by_id.shape(), "/users/{}/profile");
        assert_eq!(by_id.shape(), by_user_id.shape());
        assert_eq!(PathPattern::parse("/").unwrap().shape(), "/");
        assert_ne!(PathPattern::parse("/products/latest").unwrap().shape(), by_id.shape());
    }

    #[test]
    fn root() {
        let pattern = PathPattern::parse("/").unwrap();
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/greet").is_none());
    }

    #[test]
    fn malformed_patterns() {
        for raw in ["users", "/users/{}", "/users/{id", "/files/{name}.txt", "/a/{id}/b/{id}", "/static/{*rest}"] {
            let error = PathPattern::parse(raw).unwrap_err();
            assert!(matches!(error, ConfigError::InvalidPattern { .. }), "{raw} should be rejected");
        }
    }
}
