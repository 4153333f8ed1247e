//! Scenario catalog access for linesim.
//!
//! The catalog is an external collaborator: something that returns a JSON
//! payload which should be an array of scenario records. This crate provides
//! the [`CatalogSource`] seam with HTTP, file and in-memory implementations,
//! the defensive [`ingest`] step that turns a payload into scenarios, and the
//! [`CatalogCache`] the operator layer reads from.
//!
//! A failed fetch or a malformed payload never escapes as a crash: the cache
//! becomes empty and the failure is reported for the operator to see.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod cache;
pub mod error;
pub mod group;
pub mod ingest;
pub mod source;

/// Prelude re-exports for convenient use.
pub mod prelude {
    pub use crate::cache::{CatalogCache, RefreshReport};
    pub use crate::error::{CatalogError, CatalogResult};
    pub use crate::group::{CategoryGroup, group_by_category};
    pub use crate::ingest::{Ingested, RejectReason, RejectedEntry, ingest};
    pub use crate::source::{CatalogSource, FileCatalog, HttpCatalog, StaticCatalog};
}

// Re-export key types at crate root for convenience.
pub use cache::{CatalogCache, RefreshReport};
pub use error::{CatalogError, CatalogResult};
pub use group::{CategoryGroup, group_by_category};
pub use ingest::{Ingested, RejectReason, RejectedEntry, ingest};
pub use source::{CatalogSource, FileCatalog, HttpCatalog, StaticCatalog};
