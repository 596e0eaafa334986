pub mod cluster;
pub mod document;
pub mod search;

pub use cluster::{run_clusters, run_ping};
pub use document::{run_delete_all, run_exists, run_get};
pub use search::{run_search, SearchOptions};
