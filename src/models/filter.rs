//! Metadata filters for nearest-neighbor queries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::project::{NOT_JOINT, ProjectMetadata};

/// Predicate applied to a single metadata field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Predicate {
    /// Field must equal the value.
    Eq(String),
    /// Field must differ from the value.
    Ne(String),
}

impl Predicate {
    fn matches(&self, actual: Option<&str>) -> bool {
        match self {
            Predicate::Eq(expected) => actual == Some(expected.as_str()),
            Predicate::Ne(excluded) => actual != Some(excluded.as_str()),
        }
    }
}

/// One `(field, predicate)` pair of a filter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilterClause {
    pub field: String,
    pub predicate: Predicate,
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.predicate {
            Predicate::Eq(v) => write!(f, "{} = {:?}", self.field, v),
            Predicate::Ne(v) => write!(f, "{} != {:?}", self.field, v),
        }
    }
}

/// Conjunction of clauses. An empty filter matches everything.
///
/// Clauses live in an ordered set, so two filters built from the same
/// clauses in a different order are equal and render identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    clauses: BTreeSet<FilterClause>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality clause.
    #[must_use]
    pub fn eq(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(field, Predicate::Eq(value.into()))
    }

    /// Add an inequality clause.
    #[must_use]
    pub fn ne(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(field, Predicate::Ne(value.into()))
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, predicate: Predicate) -> Self {
        self.clauses.insert(FilterClause {
            field: field.into(),
            predicate,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> impl Iterator<Item = &FilterClause> {
        self.clauses.iter()
    }

    /// Evaluate the filter against stored metadata.
    pub fn matches(&self, metadata: &ProjectMetadata) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.predicate.matches(metadata.field(&clause.field)))
    }

    /// Render as a Pinecone metadata filter, or `None` when unrestricted.
    pub fn to_pinecone(&self) -> Option<serde_json::Value> {
        let mut rendered: Vec<serde_json::Value> = self
            .clauses
            .iter()
            .map(|clause| {
                let (op, value) = match &clause.predicate {
                    Predicate::Eq(v) => ("$eq", v),
                    Predicate::Ne(v) => ("$ne", v),
                };
                let mut condition = serde_json::Map::new();
                condition.insert(op.to_string(), serde_json::Value::from(value.as_str()));
                let mut object = serde_json::Map::new();
                object.insert(clause.field.clone(), serde_json::Value::Object(condition));
                serde_json::Value::Object(object)
            })
            .collect();

        match rendered.len() {
            0 => None,
            1 => rendered.pop(),
            _ => Some(serde_json::json!({ "$and": rendered })),
        }
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return write!(f, "(none)");
        }
        let parts: Vec<String> = self.clauses.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(" AND "))
    }
}

/// Optional structured constraints a caller can put on a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConstraints {
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default, rename = "type")]
    pub project_type: Option<String>,

    #[serde(default)]
    pub supervisor: Option<String>,

    /// Only joint or URECA projects (anything whose flag is not "No").
    #[serde(default)]
    pub joint: bool,
}

impl SearchConstraints {
    /// Build a fresh filter from the constraints that are present.
    ///
    /// Blank strings count as absent.
    pub fn to_filter(&self) -> QueryFilter {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }

        let mut filter = QueryFilter::new();
        if let Some(category) = present(&self.category) {
            filter = filter.eq("category", category);
        }
        if let Some(project_type) = present(&self.project_type) {
            filter = filter.eq("type", project_type);
        }
        if let Some(supervisor) = present(&self.supervisor) {
            filter = filter.eq("supervisor", supervisor);
        }
        if self.joint {
            filter = filter.ne("isJointOrURECA", NOT_JOINT);
        }
        filter
    }
}
