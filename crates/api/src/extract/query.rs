//! URL query string parsing.

/// Decoded `key=value` pairs of a query string, in their original order.
///
/// A key may repeat; scalar parameters take the last occurrence and list parameters take all of
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(query: Option<&str>) -> Result<Self, serde_urlencoded::de::Error> {
        match query {
            Some(query) if !query.is_empty() => {
                serde_urlencoded::from_str::<Vec<(String, String)>>(query).map(|pairs| Self { pairs })
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn last(&self, key: &str) -> Option<&str> {
        self.pairs.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_pairs() {
        let query = QueryParams::parse(Some("q=rust%20lang&limit=5&tag=a&tag=b")).unwrap();
        assert_eq!(query.last("q"), Some("rust lang"));
        assert_eq!(query.last("limit"), Some("5"));
        assert_eq!(query.all("tag").collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(query.last("missing"), None);
    }

    #[test]
    fn last_occurrence_wins() {
        let query = QueryParams::parse(Some("skip=1&skip=7")).unwrap();
        assert_eq!(query.last("skip"), Some("7"));
    }

    #[test]
    fn absent_or_empty_query() {
        assert!(QueryParams::parse(None).unwrap().is_empty());
        assert!(QueryParams::parse(Some("")).unwrap().is_empty());
    }

    #[test]
    fn key_without_value_is_empty_string() {
        let query = QueryParams::parse(Some("token")).unwrap();
        assert_eq!(query.last("token"), Some(""));
    }
}
