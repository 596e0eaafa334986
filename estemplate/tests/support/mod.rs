//! In-process mock search cluster for integration tests.
//!
//! Serves the subset of the document, bulk, search, scroll and
//! delete-by-query endpoints the template uses, backed by in-memory maps.
//! Documents whose source contains `"__fail": true` are rejected inside bulk
//! requests so partial failures can be exercised.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use estemplate::{ClientRegistry, ClusterConnectionConfig, DocumentTemplate};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::cmp::Ordering as CmpOrdering;
use std::sync::Arc;
use std::time::Duration;

type Index = BTreeMap<String, Map<String, Value>>;

struct OpenScroll {
    remaining: Vec<Value>,
    size: usize,
}

#[derive(Default)]
pub struct MockState {
    indices: Mutex<HashMap<String, Index>>,
    scrolls: Mutex<HashMap<String, OpenScroll>>,
    requests: AtomicUsize,
    next_id: AtomicUsize,
    last_search: Mutex<Option<Value>>,
    last_search_params: Mutex<HashMap<String, String>>,
    last_bulk: Mutex<Option<String>>,
    scores: Mutex<HashMap<(String, String), f64>>,
    sourceless: Mutex<HashSet<String>>,
    required_auth: Option<String>,
    delay: Option<Duration>,
}

pub struct MockCluster {
    pub state: Arc<MockState>,
    pub base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for MockCluster {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl MockCluster {
    /// Start an open (unauthenticated) cluster on a random port
    pub async fn start() -> Self {
        Self::start_with_state(MockState::default()).await
    }

    /// Start a cluster that rejects requests without the given basic auth header value
    pub async fn start_with_auth(authorization: &str) -> Self {
        Self::start_with_state(MockState {
            required_auth: Some(authorization.to_string()),
            ..MockState::default()
        })
        .await
    }

    /// Start a cluster that stalls every request for `delay` before answering
    pub async fn start_with_delay(delay: Duration) -> Self {
        Self::start_with_state(MockState {
            delay: Some(delay),
            ..MockState::default()
        })
        .await
    }

    async fn start_with_state(state: MockState) -> Self {
        let state = Arc::new(state);
        let router = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        // Give the server a moment to start accepting connections.
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;

        Self {
            state,
            base_url,
            handle,
        }
    }

    /// Cluster config pointing at this mock
    pub fn config(&self, name: &str) -> ClusterConnectionConfig {
        ClusterConnectionConfig::new(name, vec![self.base_url.clone()])
    }

    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn last_search(&self) -> Option<Value> {
        self.state.last_search.lock().clone()
    }

    pub fn last_search_param(&self, key: &str) -> Option<String> {
        self.state.last_search_params.lock().get(key).cloned()
    }

    pub fn last_bulk(&self) -> Option<String> {
        self.state.last_bulk.lock().clone()
    }

    pub fn doc_count(&self, index: &str) -> usize {
        self.state
            .indices
            .lock()
            .get(index)
            .map(|i| i.len())
            .unwrap_or(0)
    }

    pub fn seed(&self, index: &str, id: &str, doc: Value) {
        let fields = doc.as_object().cloned().unwrap_or_default();
        self.state
            .indices
            .lock()
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Seed a document that every matching search scores at `score`
    pub fn seed_scored(&self, index: &str, id: &str, score: f64, doc: Value) {
        self.seed(index, id, doc);
        self.state
            .scores
            .lock()
            .insert((index.to_string(), id.to_string()), score);
    }

    /// Serve documents of `index` without `_source`, as when it is disabled in the mapping
    pub fn disable_source(&self, index: &str) {
        self.state.sourceless.lock().insert(index.to_string());
    }

    pub fn create_index(&self, index: &str) {
        self.state
            .indices
            .lock()
            .entry(index.to_string())
            .or_default();
    }
}

/// Registry and template wired to a single mock cluster named `name`
pub fn template_for(cluster: &MockCluster, name: &str) -> (Arc<ClientRegistry>, DocumentTemplate) {
    let registry = Arc::new(ClientRegistry::initialize(&[cluster.config(name)]));
    let template = DocumentTemplate::new(registry.clone());
    (registry, template)
}

/// A config whose only host refuses connections
pub fn unreachable_config(name: &str) -> ClusterConnectionConfig {
    let mut config = ClusterConnectionConfig::new(name, vec!["127.0.0.1:1".to_string()]);
    config.connect_timeout_ms = 200;
    config.socket_timeout_ms = 200;
    config
}

pub fn fields(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/_bulk", post(bulk))
        .route("/_search/scroll", post(scroll).delete(clear_scroll))
        .route("/:index/_doc", post(index_auto_id))
        .route(
            "/:index/_doc/:id",
            put(index_with_id).get(get_doc).delete(delete_doc),
        )
        .route("/:index/_update/:id", post(update_doc))
        .route("/:index/_delete_by_query", post(delete_by_query))
        .route("/:index/_search", post(search))
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state)
}

async fn guard(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    if let Some(expected) = &state.required_auth {
        let provided = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            return error_response(StatusCode::UNAUTHORIZED, "security_exception", "missing authentication credentials");
        }
    }

    next.run(request).await
}

fn error_response(status: StatusCode, error_type: &str, reason: &str) -> Response {
    (
        status,
        Json(json!({
            "error": {"type": error_type, "reason": reason},
            "status": status.as_u16()
        })),
    )
        .into_response()
}

fn index_missing(index: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "index_not_found_exception",
        &format!("no such index [{}]", index),
    )
}

async fn root() -> Json<Value> {
    Json(json!({"cluster_name": "mock", "version": {"number": "8.13.0"}}))
}

fn write_result(index: &str, id: &str, result: &str) -> Value {
    json!({"_index": index, "_id": id, "result": result})
}

fn store(state: &MockState, index: &str, id: &str, doc: Map<String, Value>) -> &'static str {
    let mut indices = state.indices.lock();
    let previous = indices
        .entry(index.to_string())
        .or_default()
        .insert(id.to_string(), doc);
    if previous.is_some() {
        "updated"
    } else {
        "created"
    }
}

async fn index_with_id(
    State(state): State<Arc<MockState>>,
    Path((index, id)): Path<(String, String)>,
    Json(doc): Json<Map<String, Value>>,
) -> Response {
    let result = store(&state, &index, &id, doc);
    let status = if result == "created" {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(write_result(&index, &id, result))).into_response()
}

async fn index_auto_id(
    State(state): State<Arc<MockState>>,
    Path(index): Path<String>,
    Json(doc): Json<Map<String, Value>>,
) -> Response {
    let id = format!("auto-{}", state.next_id.fetch_add(1, Ordering::SeqCst));
    store(&state, &index, &id, doc);
    (StatusCode::CREATED, Json(write_result(&index, &id, "created"))).into_response()
}

fn project(doc: &Map<String, Value>, includes: Option<&[String]>) -> Map<String, Value> {
    match includes {
        Some(fields) if !fields.is_empty() => doc
            .iter()
            .filter(|(k, _)| fields.iter().any(|f| f == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        _ => doc.clone(),
    }
}

async fn get_doc(
    State(state): State<Arc<MockState>>,
    Path((index, id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let indices = state.indices.lock();
    let Some(docs) = indices.get(&index) else {
        return index_missing(&index);
    };

    match docs.get(&id) {
        Some(_) if state.sourceless.lock().contains(&index) => {
            Json(json!({"_index": index, "_id": id, "found": true})).into_response()
        }
        Some(doc) => {
            let includes: Option<Vec<String>> = params
                .get("_source_includes")
                .map(|s| s.split(',').map(str::to_string).collect());
            Json(json!({
                "_index": index,
                "_id": id,
                "found": true,
                "_source": project(doc, includes.as_deref()),
            }))
            .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"_index": index, "_id": id, "found": false})),
        )
            .into_response(),
    }
}

async fn update_doc(
    State(state): State<Arc<MockState>>,
    Path((index, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let partial = body.get("doc").and_then(Value::as_object).cloned().unwrap_or_default();
    match apply_update(&state, &index, &id, partial) {
        Ok(()) => Json(write_result(&index, &id, "updated")).into_response(),
        Err(reason) => error_response(StatusCode::NOT_FOUND, "document_missing_exception", &reason),
    }
}

fn apply_update(state: &MockState, index: &str, id: &str, partial: Map<String, Value>) -> Result<(), String> {
    let mut indices = state.indices.lock();
    let doc = indices
        .get_mut(index)
        .and_then(|docs| docs.get_mut(id))
        .ok_or_else(|| format!("[{}]: document missing", id))?;
    doc.extend(partial);
    Ok(())
}

async fn delete_doc(
    State(state): State<Arc<MockState>>,
    Path((index, id)): Path<(String, String)>,
) -> Response {
    let removed = state
        .indices
        .lock()
        .get_mut(&index)
        .and_then(|docs| docs.remove(&id));
    match removed {
        Some(_) => Json(write_result(&index, &id, "deleted")).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(write_result(&index, &id, "not_found")),
        )
            .into_response(),
    }
}

async fn bulk(State(state): State<Arc<MockState>>, body: Bytes) -> Response {
    let text = String::from_utf8_lossy(&body).to_string();
    *state.last_bulk.lock() = Some(text.clone());

    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let mut items = Vec::new();
    let mut errors = false;

    while let Some(line) = lines.next() {
        let Ok(Value::Object(action)) = serde_json::from_str::<Value>(line) else {
            return error_response(StatusCode::BAD_REQUEST, "parse_exception", "malformed action line");
        };
        let Some((op, meta)) = action.into_iter().next() else {
            return error_response(StatusCode::BAD_REQUEST, "parse_exception", "empty action line");
        };
        let index = meta["_index"].as_str().unwrap_or_default().to_string();
        let id = meta["_id"].as_str().map(str::to_string);

        let item = match op.as_str() {
            "index" | "create" => {
                let doc: Map<String, Value> = lines
                    .next()
                    .and_then(|l| serde_json::from_str(l).ok())
                    .unwrap_or_default();
                let id = id.unwrap_or_else(|| format!("auto-{}", state.next_id.fetch_add(1, Ordering::SeqCst)));
                if doc.get("__fail") == Some(&Value::Bool(true)) {
                    errors = true;
                    json!({"_index": index, "_id": id, "status": 400,
                        "error": {"type": "mapper_parsing_exception", "reason": "failed to parse"}})
                } else {
                    let result = store(&state, &index, &id, doc);
                    json!({"_index": index, "_id": id, "status": 201, "result": result})
                }
            }
            "update" => {
                let body: Value = lines
                    .next()
                    .and_then(|l| serde_json::from_str(l).ok())
                    .unwrap_or(Value::Null);
                let partial = body.get("doc").and_then(Value::as_object).cloned().unwrap_or_default();
                let id = id.unwrap_or_default();
                match apply_update(&state, &index, &id, partial) {
                    Ok(()) => json!({"_index": index, "_id": id, "status": 200, "result": "updated"}),
                    Err(reason) => {
                        errors = true;
                        json!({"_index": index, "_id": id, "status": 404,
                            "error": {"type": "document_missing_exception", "reason": reason}})
                    }
                }
            }
            "delete" => {
                let id = id.unwrap_or_default();
                let removed = state
                    .indices
                    .lock()
                    .get_mut(&index)
                    .and_then(|docs| docs.remove(&id));
                let (status, result) = if removed.is_some() { (200, "deleted") } else { (404, "not_found") };
                json!({"_index": index, "_id": id, "status": status, "result": result})
            }
            other => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "illegal_argument_exception",
                    &format!("unknown action [{}]", other),
                );
            }
        };

        let mut entry = Map::new();
        entry.insert(op, item);
        items.push(Value::Object(entry));
    }

    Json(json!({"took": 1, "errors": errors, "items": items})).into_response()
}

async fn delete_by_query(
    State(state): State<Arc<MockState>>,
    Path(index): Path<String>,
    Json(_body): Json<Value>,
) -> Response {
    let mut indices = state.indices.lock();
    let Some(docs) = indices.get_mut(&index) else {
        return index_missing(&index);
    };
    let deleted = docs.len();
    docs.clear();
    Json(json!({"took": 1, "deleted": deleted, "total": deleted, "failures": []})).into_response()
}

fn matches(query: Option<&Value>, doc: &Map<String, Value>) -> bool {
    let Some(query) = query else {
        return true;
    };
    if query.get("match_all").is_some() {
        return true;
    }
    if let Some(term) = query.get("term").and_then(Value::as_object) {
        return term.iter().all(|(field, params)| {
            let expected = params.get("value").unwrap_or(params);
            doc.get(field) == Some(expected)
        });
    }
    false
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        _ => CmpOrdering::Equal,
    }
}

/// Order hits by the request's `sort` clauses; ties fall back to id order.
fn sort_hits(hits: &mut [(String, f64, Map<String, Value>)], sort: Option<&Value>) {
    let clauses: Vec<(String, bool)> = sort
        .and_then(Value::as_array)
        .map(|clauses| {
            clauses
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|clause| clause.iter().next())
                .map(|(field, options)| {
                    let descending = options.get("order").and_then(Value::as_str) == Some("desc");
                    (field.clone(), descending)
                })
                .collect()
        })
        .unwrap_or_default();

    hits.sort_by(|(a_id, a_score, a_doc), (b_id, b_score, b_doc)| {
        for (field, descending) in &clauses {
            let ordering = if field == "_score" {
                a_score.partial_cmp(b_score).unwrap_or(CmpOrdering::Equal)
            } else {
                compare_values(a_doc.get(field), b_doc.get(field))
            };
            let ordering = if *descending { ordering.reverse() } else { ordering };
            if ordering != CmpOrdering::Equal {
                return ordering;
            }
        }
        a_id.cmp(b_id)
    });
}

async fn search(
    State(state): State<Arc<MockState>>,
    Path(index): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    *state.last_search.lock() = Some(body.clone());
    *state.last_search_params.lock() = params.clone();

    let hits: Vec<Value> = {
        let indices = state.indices.lock();
        let Some(docs) = indices.get(&index) else {
            return index_missing(&index);
        };
        let scores = state.scores.lock();

        let includes: Option<Vec<String>> = body
            .get("_source")
            .and_then(|s| s.get("includes"))
            .and_then(|i| serde_json::from_value(i.clone()).ok());

        // Unscored seeds score 1.0.
        let mut matched: Vec<(String, f64, Map<String, Value>)> = docs
            .iter()
            .filter(|(_, doc)| matches(body.get("query"), doc))
            .map(|(id, doc)| {
                let score = scores
                    .get(&(index.clone(), id.clone()))
                    .copied()
                    .unwrap_or(1.0);
                (id.clone(), score, doc.clone())
            })
            .collect();
        sort_hits(&mut matched, body.get("sort"));

        matched
            .iter()
            .map(|(id, score, doc)| {
                json!({
                    "_index": index,
                    "_id": id,
                    "_score": score,
                    "_source": project(doc, includes.as_deref()),
                })
            })
            .collect()
    };

    let total = hits.len();
    let from = body.get("from").and_then(Value::as_u64).unwrap_or(0) as usize;
    let size = body.get("size").and_then(Value::as_u64).unwrap_or(10) as usize;
    let page: Vec<Value> = hits.iter().skip(from).take(size).cloned().collect();
    let max_score = page
        .iter()
        .filter_map(|h| h["_score"].as_f64())
        .fold(None, |max: Option<f64>, s| Some(max.map_or(s, |m| m.max(s))));

    let mut response = json!({
        "took": 1,
        "timed_out": false,
        "_shards": {"total": 1, "successful": 1, "skipped": 0, "failed": 0},
        "hits": {
            "total": {"value": total, "relation": "eq"},
            "max_score": max_score,
            "hits": page,
        }
    });

    if params.contains_key("scroll") {
        let scroll_id = format!("scroll-{}", state.next_id.fetch_add(1, Ordering::SeqCst));
        let remaining = hits.into_iter().skip(from + size).collect();
        state
            .scrolls
            .lock()
            .insert(scroll_id.clone(), OpenScroll { remaining, size });
        response["_scroll_id"] = json!(scroll_id);
    }

    Json(response).into_response()
}

async fn scroll(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let scroll_id = body["scroll_id"].as_str().unwrap_or_default().to_string();
    let mut scrolls = state.scrolls.lock();
    let Some(open) = scrolls.get_mut(&scroll_id) else {
        return error_response(
            StatusCode::NOT_FOUND,
            "search_context_missing_exception",
            "No search context found",
        );
    };

    let take = open.size.min(open.remaining.len());
    let page: Vec<Value> = open.remaining.drain(..take).collect();
    Json(json!({
        "_scroll_id": scroll_id,
        "took": 1,
        "timed_out": false,
        "hits": {"total": {"value": page.len(), "relation": "eq"}, "max_score": 1.0, "hits": page}
    }))
    .into_response()
}

async fn clear_scroll(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let ids: Vec<String> = serde_json::from_value(body["scroll_id"].clone()).unwrap_or_default();
    let mut scrolls = state.scrolls.lock();
    let freed = ids.iter().filter(|id| scrolls.remove(*id).is_some()).count();
    if freed == 0 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"succeeded": true, "num_freed": 0})),
        )
            .into_response();
    }
    Json(json!({"succeeded": true, "num_freed": freed})).into_response()
}
