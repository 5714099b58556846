//! Query inputs for listing entities.

use crate::error::Result;
use tablestore_core::SelectQuery;
use tokio_util::sync::CancellationToken;

/// What to list and how.
///
/// All inputs are optional and independent: an empty request lists every
/// entity in the table.
///
/// # Example
///
/// ```
/// use tablestore::ListRequest;
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// let request = ListRequest::new()
///     .filter("c.Name = 'n'")
///     .columns(["Name", "Key"])
///     .cancel_token(token.clone());
/// assert_eq!(
///     request.to_query().unwrap().to_string(),
///     "SELECT c.Name, c.Key FROM c WHERE c.Name = 'n'"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    filter: Option<String>,
    columns: Vec<String>,
    cancel: Option<CancellationToken>,
}

impl ListRequest {
    /// Request for every entity
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter entities.
    ///
    /// Accepts a bare predicate (`c.Name = 'x'`), a `WHERE` clause, or a full
    /// `SELECT ... FROM c ...` query.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Only populate these fields on returned entities.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Stop paging once `token` is cancelled.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Filter text, if any
    pub fn filter_text(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Projected columns (empty for whole entities)
    pub fn projected_columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether the request's token has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, CancellationToken::is_cancelled)
    }

    /// Build the query this request sends.
    pub fn to_query(&self) -> Result<SelectQuery> {
        let query = SelectQuery::from_filter(self.filter.as_deref().unwrap_or_default())?;
        if self.columns.is_empty() {
            Ok(query)
        } else {
            Ok(query.with_columns(&self.columns)?)
        }
    }
}
