//! Query predicates and options for the search endpoint

use std::fmt;

/// A single filter understood by the search API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Exact match of a field against a value
    At { path: String, value: String },
}

impl Predicate {
    /// `at(path, "value")`
    pub fn at(path: &str, value: &str) -> Self {
        Predicate::At {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    /// Match documents of a custom type
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }

    /// Match the document of a custom type with the given uid
    pub fn uid(doc_type: &str, uid: &str) -> Self {
        Self::at(&format!("my.{}.uid", doc_type), uid)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::At { path, value } => {
                write!(f, "[at({}, \"{}\")]", path, escape_value(value))
            }
        }
    }
}

fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render the `q` parameter: every predicate wrapped in one outer bracket pair
pub fn render_query(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(|p| p.to_string()).collect();
    format!("[{}]", inner)
}

/// Options for a search request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Restrict returned data to these `type.field` names (empty: everything)
    pub fetch: Vec<String>,
    pub page_size: Option<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch only the given fields of `doc_type`
    pub fn fetch_fields(mut self, doc_type: &str, fields: &[&str]) -> Self {
        self.fetch = fields
            .iter()
            .map(|field| format!("{}.{}", doc_type, field))
            .collect();
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Query string pairs, excluding `ref`, `q` and the access token
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.fetch.is_empty() {
            pairs.push(("fetch", self.fetch.join(",")));
        }
        if let Some(size) = self.page_size {
            pairs.push(("pageSize", size.to_string()));
        }
        pairs
    }
}
