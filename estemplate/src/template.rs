//! Document operations over the client registry
//!
//! Every operation resolves its cluster first; an unknown cluster is the only
//! error returned to the caller. Any failure talking to the cluster is logged
//! with its context and collapsed into `false`, `0` or `None`.

use crate::bulk::BulkAction;
use crate::client::ConnectionHandle;
use crate::error::{Error, Result};
use crate::query::search::keep_alive;
use crate::query::{build_search_request, Query, SearchSpec};
use crate::registry::ClientRegistry;
use crate::response::SearchResponse;
use crate::types::{BulkOutcome, DocumentRecord, IndexTarget};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Stateless CRUD and search surface shared across callers
#[derive(Debug, Clone)]
pub struct DocumentTemplate {
    registry: Arc<ClientRegistry>,
}

impl DocumentTemplate {
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    pub fn cluster_names(&self) -> Vec<String> {
        self.registry.cluster_names()
    }

    pub async fn is_cluster_connected(&self, cluster: &str) -> bool {
        self.registry.ping(cluster).await
    }

    fn handle(&self, target: &IndexTarget) -> Result<Arc<ConnectionHandle>> {
        self.registry.lookup(&target.cluster_name)
    }

    /// Insert (or overwrite) one document
    pub async fn insert(&self, target: &IndexTarget, record: &DocumentRecord) -> Result<bool> {
        let handle = self.handle(target)?;
        let result = handle
            .index_document(&target.index_name, record.id(), &record.fields)
            .await;

        Ok(match result {
            Ok(response) => {
                debug!(
                    cluster = %target.cluster_name,
                    index = %target.index_name,
                    doc_id = %response.id,
                    "Inserted document"
                );
                true
            }
            Err(e) => {
                log_failure("insert", target, record.id(), &e);
                false
            }
        })
    }

    /// Insert a batch in a single bulk request
    pub async fn batch_insert(&self, target: &IndexTarget, records: &[DocumentRecord]) -> Result<bool> {
        let handle = self.handle(target)?;
        if records.is_empty() {
            warn!(index = %target.index_name, "Document list is empty, skipping batch insert");
            return Ok(true);
        }

        let actions: Vec<BulkAction> = records
            .iter()
            .map(|r| BulkAction::index(&target.index_name, r))
            .collect();

        Ok(self.run_bulk("batch_insert", &handle, target, &actions).await)
    }

    /// Partial update of one document; the record must carry an id
    pub async fn update(&self, target: &IndexTarget, record: &DocumentRecord) -> Result<bool> {
        let handle = self.handle(target)?;
        let result = match record.id() {
            Some(id) => handle
                .update_document(&target.index_name, id, &record.fields)
                .await
                .map(|_| ()),
            None => Err(Error::InvalidRequest("update requires a document id".to_string())),
        };

        Ok(match result {
            Ok(()) => {
                debug!(
                    cluster = %target.cluster_name,
                    index = %target.index_name,
                    doc_id = record.id().unwrap_or_default(),
                    "Updated document"
                );
                true
            }
            Err(e) => {
                log_failure("update", target, record.id(), &e);
                false
            }
        })
    }

    /// Update a batch; records without an id are skipped
    pub async fn batch_update(&self, target: &IndexTarget, records: &[DocumentRecord]) -> Result<bool> {
        let handle = self.handle(target)?;
        if records.is_empty() {
            warn!(index = %target.index_name, "Document list is empty, skipping batch update");
            return Ok(true);
        }

        let actions: Vec<BulkAction> = records
            .iter()
            .filter_map(|r| BulkAction::update(&target.index_name, r))
            .collect();

        let skipped = records.len() - actions.len();
        if skipped > 0 {
            warn!(
                index = %target.index_name,
                skipped,
                "Skipping records without a document id in batch update"
            );
        }
        if actions.is_empty() {
            return Ok(true);
        }

        Ok(self.run_bulk("batch_update", &handle, target, &actions).await)
    }

    /// Delete one document. Deleting a missing document counts as success.
    pub async fn delete(&self, target: &IndexTarget, doc_id: &str) -> Result<bool> {
        let handle = self.handle(target)?;
        let result = match non_blank(doc_id) {
            Some(id) => handle.delete_document(&target.index_name, id).await,
            None => Err(Error::InvalidRequest("delete requires a document id".to_string())),
        };

        Ok(match result {
            Ok(response) => {
                debug!(
                    cluster = %target.cluster_name,
                    index = %target.index_name,
                    doc_id,
                    result = %response.result,
                    "Deleted document"
                );
                true
            }
            Err(e) => {
                log_failure("delete", target, Some(doc_id), &e);
                false
            }
        })
    }

    /// Delete a batch of ids in one bulk request
    pub async fn batch_delete<S: AsRef<str>>(&self, target: &IndexTarget, doc_ids: &[S]) -> Result<bool> {
        let handle = self.handle(target)?;
        if doc_ids.is_empty() {
            warn!(index = %target.index_name, "Document ID list is empty, skipping batch delete");
            return Ok(true);
        }

        if let Some(position) = doc_ids.iter().position(|id| non_blank(id.as_ref()).is_none()) {
            let e = Error::InvalidRequest(format!("blank document id at position {}", position));
            log_failure("batch_delete", target, None, &e);
            return Ok(false);
        }

        let actions: Vec<BulkAction> = doc_ids
            .iter()
            .map(|id| BulkAction::delete(&target.index_name, id.as_ref()))
            .collect();

        Ok(self.run_bulk("batch_delete", &handle, target, &actions).await)
    }

    /// Delete every document in the index. Returns the number removed, or
    /// `0` when the request fails.
    pub async fn delete_all(&self, target: &IndexTarget) -> Result<u64> {
        let handle = self.handle(target)?;
        let result = handle
            .delete_by_query(&target.index_name, &Query::match_all())
            .await;

        Ok(match result {
            Ok(response) => {
                info!(
                    cluster = %target.cluster_name,
                    index = %target.index_name,
                    deleted = response.deleted,
                    "Deleted all documents from index"
                );
                response.deleted
            }
            Err(e) => {
                log_failure("delete_all", target, None, &e);
                0
            }
        })
    }

    pub async fn exists(&self, target: &IndexTarget, doc_id: &str) -> Result<bool> {
        let handle = self.handle(target)?;
        Ok(match handle.document_exists(&target.index_name, doc_id).await {
            Ok(found) => found,
            Err(e) => {
                log_failure("exists", target, Some(doc_id), &e);
                false
            }
        })
    }

    /// Fetch a document's fields, optionally limited to `fields`
    pub async fn get_by_id(
        &self,
        target: &IndexTarget,
        doc_id: &str,
        fields: Option<&[String]>,
    ) -> Result<Option<Map<String, Value>>> {
        let handle = self.handle(target)?;
        Ok(match handle.get_document(&target.index_name, doc_id, fields).await {
            Ok(source) => source,
            Err(e) => {
                log_failure("get_by_id", target, Some(doc_id), &e);
                None
            }
        })
    }

    /// Run a search and return the raw response
    pub async fn search(&self, target: &IndexTarget, spec: &SearchSpec) -> Result<Option<SearchResponse>> {
        let handle = self.handle(target)?;
        let request = build_search_request(&target.index_name, spec);

        Ok(match handle.search(&request).await {
            Ok(response) => {
                debug!(
                    cluster = %target.cluster_name,
                    index = %target.index_name,
                    hits = response.hits.hits.len(),
                    scroll = response.scroll_id.is_some(),
                    "Search completed"
                );
                Some(response)
            }
            Err(e) => {
                log_failure("search", target, None, &e);
                None
            }
        })
    }

    /// Fetch the next page of a scroll opened by [`search`](Self::search)
    pub async fn scroll(
        &self,
        cluster: &str,
        scroll_id: &str,
        ttl_minutes: u32,
    ) -> Result<Option<SearchResponse>> {
        let handle = self.registry.lookup(cluster)?;
        Ok(match handle.scroll(scroll_id, &keep_alive(ttl_minutes)).await {
            Ok(response) => Some(response),
            Err(e) => {
                error!(
                    cluster = %cluster,
                    error_type = e.error_type(),
                    "Failed to continue scroll: {}",
                    e
                );
                None
            }
        })
    }

    /// Release a scroll cursor
    pub async fn clear_scroll(&self, cluster: &str, scroll_id: &str) -> Result<bool> {
        let handle = self.registry.lookup(cluster)?;
        Ok(match handle.clear_scroll(scroll_id).await {
            Ok(response) => response.succeeded,
            Err(e) => {
                error!(
                    cluster = %cluster,
                    error_type = e.error_type(),
                    "Failed to clear scroll: {}",
                    e
                );
                false
            }
        })
    }

    async fn run_bulk(
        &self,
        op: &'static str,
        handle: &ConnectionHandle,
        target: &IndexTarget,
        actions: &[BulkAction],
    ) -> bool {
        match try_bulk(handle, actions).await {
            Ok(outcome) if outcome.succeeded => {
                debug!(
                    cluster = %target.cluster_name,
                    index = %target.index_name,
                    count = actions.len(),
                    "{} completed",
                    op
                );
                true
            }
            Ok(outcome) => {
                error!(
                    cluster = %target.cluster_name,
                    index = %target.index_name,
                    "{} has failures: {}",
                    op,
                    outcome.failure_detail.unwrap_or_default()
                );
                false
            }
            Err(e) => {
                log_failure(op, target, None, &e);
                false
            }
        }
    }
}

async fn try_bulk(handle: &ConnectionHandle, actions: &[BulkAction]) -> Result<BulkOutcome> {
    let response = handle.bulk(actions).await?;
    if response.has_failures() {
        return Ok(BulkOutcome::failure(response.failure_message()));
    }
    Ok(BulkOutcome::success())
}

fn non_blank(id: &str) -> Option<&str> {
    Some(id).filter(|id| !id.trim().is_empty())
}

fn log_failure(op: &str, target: &IndexTarget, doc_id: Option<&str>, e: &Error) {
    error!(
        cluster = %target.cluster_name,
        index = %target.index_name,
        doc_id = doc_id.unwrap_or_default(),
        error_type = e.error_type(),
        "Failed to {}: {}",
        op,
        e
    );
}
