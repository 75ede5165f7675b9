use super::param::encode_component;

/// Query string pairs, kept in insertion order.
///
/// Keys and values are percent-encoded when rendered, pairs are joined by `&`.
#[derive(Debug, Clone, Default)]
pub(in crate::client) struct QueryPairs {
    pairs: Vec<(String, String)>,
}

impl QueryPairs {
    pub(in crate::client) fn push(&mut self, name: &str, value: String) {
        self.pairs.push((name.to_string(), value));
    }

    pub(in crate::client) fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub(in crate::client) fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(name, value)| {
                [encode_component(name), encode_component(value)].join("=")
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}
