//! The capability contract for storable entities

use crate::key::EntityKey;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A record that can be stored in a table.
///
/// Implementors serialize to a JSON object. The key is serialized under
/// [`TableItem::KEY_FIELD`]; the id is never stored by the entity itself, it is
/// derived from the key and written by the client as the document `id`.
///
/// Fields the entity does not always populate (for example when a query
/// projects a subset of columns) should be `Option` or carry
/// `#[serde(default)]`.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use tablestore_core::TableItem;
///
/// #[derive(Serialize, Deserialize)]
/// #[serde(rename_all = "PascalCase")]
/// struct Customer {
///     key: String,
///     name: Option<String>,
/// }
///
/// impl TableItem for Customer {
///     fn key(&self) -> &str {
///         &self.key
///     }
/// }
///
/// let customer = Customer { key: "emea/42".into(), name: None };
/// assert_eq!(customer.id(), "42");
/// ```
pub trait TableItem: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Document field holding the key.
    const KEY_FIELD: &'static str = "Key";

    /// Unique key of this entity within its table.
    fn key(&self) -> &str;

    /// Id derived from the key: the suffix after a partition prefix, or the
    /// whole key when there is none.
    fn id(&self) -> &str {
        EntityKey::parse(self.key()).id()
    }
}
