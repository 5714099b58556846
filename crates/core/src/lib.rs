//! Core types for tablestore
//!
//! This crate defines the vocabulary shared by the client and the document
//! service boundary:
//! - [`TableItem`]: capability trait every storable entity implements
//! - [`TableName`]: container name with an optional partition field
//! - [`EntityKey`]: the `partition/suffix` key convention
//! - [`Document`] and [`PartitionValue`]: stored JSON documents
//! - [`query`]: the SQL-like query subset (AST, parser, renderer, evaluator)
//! - [`StorageConfig`]: connection and tuning configuration

#![warn(missing_docs)]

pub mod config;
pub mod document;
pub mod entity;
pub mod error;
pub mod key;
pub mod query;
pub mod table;

pub use config::{ServicePrincipal, StorageConfig};
pub use document::{Document, PartitionValue, SYSTEM_FIELDS};
pub use entity::TableItem;
pub use error::{Error, Result};
pub use key::EntityKey;
pub use query::{Expr, FieldPath, Projection, SelectQuery};
pub use table::TableName;
