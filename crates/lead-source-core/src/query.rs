use url::Url;
use url::form_urlencoded;

/// Decoded query-string pairs in the order they appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parses a raw query string. A leading `?` is accepted.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }

    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        url.query().map(Self::parse).unwrap_or_default()
    }

    /// First value for `name`, if the parameter is present and non-empty.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plus_and_percent_escapes() {
        let params = QueryParams::parse("?utm_campaign=spring+sale&utm_term=shoes%20red");
        assert_eq!(params.get("utm_campaign"), Some("spring sale"));
        assert_eq!(params.get("utm_term"), Some("shoes red"));
    }

    #[test]
    fn empty_values_read_as_absent() {
        let params = QueryParams::parse("utm_source=&gclid");
        assert_eq!(params.get("utm_source"), None);
        assert_eq!(params.get("gclid"), None);
        assert_eq!(params.get("fbclid"), None);
    }

    #[test]
    fn first_occurrence_wins() {
        let params = QueryParams::parse("utm_source=a&utm_source=b");
        assert_eq!(params.get("utm_source"), Some("a"));
    }

    #[test]
    fn names_are_case_sensitive() {
        let params = QueryParams::parse("ScCid=snap&sccid=other");
        assert_eq!(params.get("ScCid"), Some("snap"));
    }

    #[test]
    fn url_without_query_is_empty() {
        let url = Url::parse("https://shop.example.com/pricing#plans").expect("url");
        assert!(QueryParams::from_url(&url).is_empty());
    }
}
