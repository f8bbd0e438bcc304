use serde_json::{Map, Value};
use url::{form_urlencoded, Url};

use crate::AidrError;

/// Placeholder replaced with the service slug everywhere it occurs in a
/// resolved URL.
pub(crate) const SERVICE_NAME_PLACEHOLDER: &str = "{SERVICE_NAME}";

/// Returns true when the path carries a URI scheme prefix (`[a-z][a-z0-9+.-]*:`).
pub(crate) fn is_absolute_url(path: &str) -> bool {
    let mut chars = path.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    for ch in chars {
        match ch {
            ':' => return true,
            c if c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-') => {}
            _ => return false,
        }
    }
    false
}

/// Serializes a query object into a percent-encoded query string.
///
/// String, number, and boolean values become `key=value`; `null` keeps the
/// key with an empty value. Arrays and objects cannot be represented and
/// fail with [`AidrError::Stringify`].
pub(crate) fn stringify_query(query: &Map<String, Value>) -> Result<String, AidrError> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        match value {
            Value::String(text) => {
                serializer.append_pair(key, text);
            }
            Value::Number(number) => {
                serializer.append_pair(key, &number.to_string());
            }
            Value::Bool(flag) => {
                serializer.append_pair(key, if *flag { "true" } else { "false" });
            }
            Value::Null => {
                serializer.append_pair(key, "");
            }
            Value::Array(_) => return Err(AidrError::Stringify("array".to_owned())),
            Value::Object(_) => return Err(AidrError::Stringify("object".to_owned())),
        }
    }
    Ok(serializer.finish())
}

/// Resolves a path against the base URL template.
///
/// Absolute paths are used verbatim; otherwise the path is appended to the
/// template without doubling the slash between them. The service-name
/// placeholder is substituted everywhere in the result, including inside
/// absolute paths.
pub(crate) fn build_url(
    path: &str,
    query: Option<&Map<String, Value>>,
    template: &str,
    service_name: &str,
) -> Result<String, AidrError> {
    let joined = if is_absolute_url(path) {
        path.to_owned()
    } else if template.ends_with('/') && path.starts_with('/') {
        format!("{template}{}", &path[1..])
    } else {
        format!("{template}{path}")
    };
    let resolved = joined.replace(SERVICE_NAME_PLACEHOLDER, service_name);

    let mut url = Url::parse(&resolved).map_err(|source| AidrError::Url {
        url: resolved.clone(),
        source,
    })?;

    if let Some(query) = query {
        let encoded = stringify_query(query)?;
        url.set_query((!encoded.is_empty()).then_some(encoded.as_str()));
    }

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::{build_url, is_absolute_url, stringify_query};
    use crate::AidrError;

    fn query(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn detects_scheme_prefixes() {
        assert!(is_absolute_url("https://api.example.com/v1"));
        assert!(is_absolute_url("custom+scheme.v1://host"));
        assert!(!is_absolute_url("/v1/request/abc"));
        assert!(!is_absolute_url("v1 request"));
        assert!(!is_absolute_url("1https://nope"));
    }

    #[test]
    fn collapses_double_slash_between_template_and_path() {
        let url = build_url(
            "/v1/guard",
            None,
            "https://aidr.example.com/",
            "aiguard",
        )
        .expect("must build");
        assert_eq!(url, "https://aidr.example.com/v1/guard");
    }

    #[test]
    fn substitutes_every_placeholder_occurrence() {
        let url = build_url(
            "/{SERVICE_NAME}/check",
            None,
            "https://{SERVICE_NAME}.example.com",
            "aiguard",
        )
        .expect("must build");
        assert_eq!(url, "https://aiguard.example.com/aiguard/check");
    }

    #[test]
    fn absolute_path_ignores_template_but_still_substitutes() {
        let url = build_url(
            "https://{SERVICE_NAME}.other.example.com/v1/request/abc",
            None,
            "https://unused.example.com",
            "aiguard",
        )
        .expect("must build");
        assert_eq!(url, "https://aiguard.other.example.com/v1/request/abc");
    }

    #[test]
    fn stringifies_scalar_query_values() {
        let encoded = stringify_query(&query(json!({
            "name": "a b",
            "count": 3,
            "ratio": 1.5,
            "verbose": true,
            "cursor": null,
        })))
        .expect("must stringify");

        assert_eq!(encoded, "count=3&cursor=&name=a+b&ratio=1.5&verbose=true");
    }

    #[test]
    fn rejects_array_and_object_query_values() {
        let err = stringify_query(&query(json!({"items": [1, 2]}))).expect_err("must fail");
        assert!(matches!(err, AidrError::Stringify(kind) if kind == "array"));

        let err = stringify_query(&query(json!({"nested": {"a": 1}}))).expect_err("must fail");
        assert!(matches!(err, AidrError::Stringify(kind) if kind == "object"));
    }

    #[test]
    fn empty_query_leaves_url_without_question_mark() {
        let url = build_url(
            "/v1/guard",
            Some(&Map::new()),
            "https://aidr.example.com",
            "aiguard",
        )
        .expect("must build");
        assert_eq!(url, "https://aidr.example.com/v1/guard");
    }

    #[test]
    fn invalid_resolved_url_is_reported() {
        let err = build_url("/v1/guard", None, "not a url", "aiguard").expect_err("must fail");
        assert!(matches!(err, AidrError::Url { .. }));
    }
}
