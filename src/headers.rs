use std::collections::BTreeMap;

/// Ordered collection of header entries where a `None` value marks the
/// header for deletion instead of setting an empty string.
///
/// Sources are composed in order: later entries (and later sources) override
/// earlier ones key-by-key, matching names case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NullableHeaders {
    entries: Vec<(String, Option<String>)>,
}

impl NullableHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a source from name/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), Some(value.into())))
                .collect(),
        }
    }

    /// Sets a header value.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((name.into(), Some(value.into())));
        self
    }

    /// Marks a header for deletion, removing any value set by an earlier
    /// entry or a lower-precedence source.
    pub fn unset(mut self, name: impl Into<String>) -> Self {
        self.entries.push((name.into(), None));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(String, Option<String>)] {
        &self.entries
    }
}

/// Folds an ordered sequence of header sources into a single collection
/// keyed by lowercased header name. Pure function of its inputs.
pub(crate) fn compose<'a, I>(sources: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = Option<&'a NullableHeaders>>,
{
    let mut composed = BTreeMap::new();
    for source in sources.into_iter().flatten() {
        for (name, value) in source.entries() {
            let name = name.to_ascii_lowercase();
            match value {
                Some(value) => {
                    composed.insert(name, value.clone());
                }
                None => {
                    composed.remove(&name);
                }
            }
        }
    }
    composed
}
