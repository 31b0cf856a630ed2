//! Query-string building for GET requests.

use url::form_urlencoded;

/// Ordered query parameters. A `None` value drops the pair entirely; `Some("")` is kept.
pub type QueryParams = Vec<(String, Option<String>)>;

/// Form-encode `params` (`application/x-www-form-urlencoded`: space becomes `+`, reserved
/// characters are percent-encoded), preserving order.
#[must_use]
pub fn encode_query(params: &[(String, Option<String>)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        if let Some(value) = value {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

/// Append the encoded `params` to `path`, joining with `&` when `path` already has a query.
#[must_use]
pub fn append_query(path: &str, params: &[(String, Option<String>)]) -> String {
    let query = encode_query(params);
    if query.is_empty() {
        return path.to_string();
    }
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, Option<&str>)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn encodes_spaces_and_reserved_characters() {
        let qs = encode_query(&params(&[
            ("q", Some("hello world")),
            ("category", Some("tech & science")),
        ]));
        assert_eq!(qs, "q=hello+world&category=tech+%26+science");
    }

    #[test]
    fn keeps_empty_strings_and_drops_missing_values() {
        let qs = encode_query(&params(&[("a", Some("")), ("b", None), ("c", Some("1"))]));
        assert_eq!(qs, "a=&c=1");
    }

    #[test]
    fn appends_with_question_mark_or_ampersand() {
        let p = params(&[("page", Some("2"))]);
        assert_eq!(append_query("/posts", &p), "/posts?page=2");
        assert_eq!(append_query("/posts?sort=asc", &p), "/posts?sort=asc&page=2");
    }

    #[test]
    fn leaves_path_alone_when_nothing_to_encode() {
        assert_eq!(append_query("/posts", &[]), "/posts");
        assert_eq!(append_query("/posts", &params(&[("x", None)])), "/posts");
    }

    #[test]
    fn encodes_keys_and_non_ascii() {
        let qs = encode_query(&params(&[("filter[name]", Some("café=ok"))]));
        assert_eq!(qs, "filter%5Bname%5D=caf%C3%A9%3Dok");
    }
}
