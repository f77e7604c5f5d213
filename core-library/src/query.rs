//! Table-scoped query model.
//!
//! Repositories describe reads as a [`TableQuery`]: a table name plus
//! equality / case-insensitive substring filters, an optional ordering and a
//! row limit. Backend providers translate it into their own wire format.
//!
//! ```
//! use core_library::query::{TableQuery, Order};
//!
//! let query = TableQuery::from_table("tracks")
//!     .eq("album_id", "al1")
//!     .order_by("track_number", Order::Ascending);
//! assert_eq!(
//!     query.to_query_string(),
//!     "select=*&album_id=eq.al1&order=track_number.asc"
//! );
//! ```

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    fn as_str(&self) -> &'static str {
        match self {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        }
    }
}

/// A single column predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: String },
    /// Case-insensitive substring match on `column`.
    Contains { column: String, term: String },
}

impl Filter {
    fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } | Filter::Contains { column, .. } => column,
        }
    }

    fn operand(&self) -> String {
        match self {
            Filter::Eq { value, .. } => format!("eq.{}", urlencoding::encode(value)),
            Filter::Contains { term, .. } => {
                format!("ilike.{}", urlencoding::encode(&format!("%{}%", term)))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableQuery {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Option<(String, Order)>,
    pub limit: Option<usize>,
}

impl TableQuery {
    pub fn from_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn contains(mut self, column: impl Into<String>, term: impl Into<String>) -> Self {
        self.filters.push(Filter::Contains {
            column: column.into(),
            term: term.into(),
        });
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order = Some((column.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Only the row filters, e.g. `id=eq.t1`. Used to target updates and
    /// deletes.
    pub fn filter_string(&self) -> String {
        self.filters
            .iter()
            .map(|filter| format!("{}={}", filter.column(), filter.operand()))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Render as a PostgREST-style query string (without the leading `?`).
    pub fn to_query_string(&self) -> String {
        let mut parts = vec!["select=*".to_string()];

        if !self.filters.is_empty() {
            parts.push(self.filter_string());
        }

        if let Some((column, order)) = &self.order {
            parts.push(format!("order={}.{}", column, order.as_str()));
        }

        if let Some(limit) = self.limit {
            parts.push(format!("limit={}", limit));
        }

        parts.join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_string() {
        let query = TableQuery::from_table("artists")
            .contains("name", "nin")
            .limit(10);
        assert_eq!(
            query.to_query_string(),
            "select=*&name=ilike.%25nin%25&limit=10"
        );
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let query = TableQuery::from_table("tracks").contains("title", "rock & roll");
        assert_eq!(
            query.to_query_string(),
            "select=*&title=ilike.%25rock%20%26%20roll%25"
        );
    }

    #[test]
    fn test_filter_string_targets_rows() {
        let query = TableQuery::from_table("tracks").eq("id", "t1");
        assert_eq!(query.filter_string(), "id=eq.t1");
        assert_eq!(TableQuery::from_table("tracks").filter_string(), "");
    }

    #[test]
    fn test_owner_listing_newest_first() {
        let query = TableQuery::from_table("artists")
            .eq("owner_id", "u1")
            .order_by("created_at", Order::Descending);
        assert_eq!(
            query.to_query_string(),
            "select=*&owner_id=eq.u1&order=created_at.desc"
        );
    }
}
