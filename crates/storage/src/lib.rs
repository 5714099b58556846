//! Document service boundary for tablestore
//!
//! This crate defines the contract between the table storage client and the
//! document database it delegates to:
//! - [`DocumentService`]: async control-plane and data-plane operations
//! - [`QueryRequest`] / [`QueryPage`]: paged query execution with opaque
//!   continuation tokens
//! - [`InMemoryDocumentService`]: an in-process implementation of the
//!   contract, used for tests and local development

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod memory;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use memory::InMemoryDocumentService;
pub use service::{ContainerProperties, DocumentService, QueryPage, QueryRequest};
