//! estemplate: multi-cluster document operations for Elasticsearch-compatible clusters
//!
//! # Architecture
//!
//! - **Config**: per-cluster hosts, credentials and timeouts
//! - **Registry**: one live connection handle per cluster name, built once at
//!   startup and torn down explicitly
//! - **Template**: single and bulk insert/update/delete, existence checks,
//!   get-by-id, search and scroll, with failures reported as plain values
//! - **Query**: query values and search request construction
//!
//! # Example
//!
//! ```no_run
//! use estemplate::{ClientRegistry, ClusterConnectionConfig, DocumentTemplate, IndexTarget};
//! use estemplate::query::{Query, SearchSpec};
//! use std::sync::Arc;
//!
//! # async fn run() -> estemplate::Result<()> {
//! let registry = Arc::new(ClientRegistry::initialize(&[
//!     ClusterConnectionConfig::new("primary", vec!["localhost:9200".into()]),
//! ]));
//! let template = DocumentTemplate::new(registry.clone());
//!
//! let target = IndexTarget::new("primary", "articles");
//! let spec = SearchSpec::new(Query::match_query("title", "rust")).page(0, 20);
//! if let Some(response) = template.search(&target, &spec).await? {
//!     println!("{} hits", response.total());
//! }
//!
//! registry.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod banner;
pub mod bulk;
pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod registry;
pub mod response;
pub mod template;
pub mod types;

pub use client::ConnectionHandle;
pub use config::{ClusterConnectionConfig, EsConfig};
pub use error::{Error, Result};
pub use registry::ClientRegistry;
pub use response::SearchResponse;
pub use template::DocumentTemplate;
pub use types::{BulkOutcome, DocumentRecord, IndexTarget};
