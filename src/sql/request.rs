//! Query-string parameters of a request, in arrival order.

/// Parameter names with a fixed meaning; never compiled as filters.
pub const RESERVED_PARAMS: [&str; 6] = ["select", "order", "limit", "offset", "or", "single"];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_PARAMS.contains(&name)
}

#[derive(Clone, Debug, Default)]
pub struct RequestParams {
    pairs: Vec<(String, String)>,
}

impl RequestParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        RequestParams { pairs }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// First value given for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn select(&self) -> Option<&str> {
        self.get("select").filter(|s| !s.trim().is_empty())
    }

    pub fn order(&self) -> Option<&str> {
        self.get("order").filter(|s| !s.trim().is_empty())
    }

    /// Unparseable values are ignored.
    pub fn limit(&self) -> Option<u64> {
        self.get("limit").and_then(|v| v.trim().parse().ok())
    }

    pub fn offset(&self) -> Option<u64> {
        self.get("offset").and_then(|v| v.trim().parse().ok())
    }

    /// `single`, `single=true` and `single=1` ask for one object instead of an array.
    pub fn single(&self) -> bool {
        matches!(self.get("single"), Some("" | "true" | "1"))
    }
}
