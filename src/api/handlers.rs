//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::{CacheTable, StoreOutcome};
use crate::error::{CacheError, Result};
use crate::models::{
    requests::validate_key, AdjustParams, CounterResponse, DeleteParams, DeleteResponse,
    FlushParams, FlushResponse, GetMultiRequest, GetMultiResponse, GetResponse, HealthResponse,
    StatsResponse, StoreRequest, StoreResponse,
};

/// Application state shared across all handlers.
///
/// The cache table owns a connection pool, so cloning the state is cheap and
/// no in-process lock is needed.
#[derive(Clone)]
pub struct AppState {
    /// Table-backed cache
    pub cache: CacheTable,
}

impl AppState {
    /// Creates a new AppState with the given cache table.
    pub fn new(cache: CacheTable) -> Self {
        Self { cache }
    }
}

fn check_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(()),
    }
}

fn check_store(req: &StoreRequest) -> Result<()> {
    match req.validate() {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(()),
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair, overwriting any existing row.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<StoreResponse>> {
    check_store(&req)?;
    state.cache.set(&req.key, &req.value, req.ttl).await?;
    Ok(Json(StoreResponse::stored(req.key)))
}

/// Handler for PUT /add
///
/// Stores a key-value pair only if the key is not live. Responds 409 otherwise.
pub async fn add_handler(
    State(state): State<AppState>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<StoreResponse>> {
    check_store(&req)?;
    match state.cache.add(&req.key, &req.value, req.ttl).await? {
        StoreOutcome::Stored => Ok(Json(StoreResponse::stored(req.key))),
        StoreOutcome::NotStored => Err(CacheError::NotStored(req.key)),
    }
}

/// Handler for PUT /replace
pub async fn replace_handler(
    State(state): State<AppState>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<StoreResponse>> {
    check_store(&req)?;
    let value = state.cache.replace(&req.key, &req.value, req.ttl).await?;
    Ok(Json(StoreResponse::replaced(req.key, value)))
}

/// Handler for GET /get/:key
///
/// Retrieves a live value by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    check_key(&key)?;
    match state.cache.get(&key).await? {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for POST /get
///
/// Retrieves several keys at once; misses are left out of the map.
pub async fn get_multi_handler(
    State(state): State<AppState>,
    Json(req): Json<GetMultiRequest>,
) -> Result<Json<GetMultiResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    let values = state.cache.get_multi(req.keys.as_slice()).await?;
    Ok(Json(GetMultiResponse { values }))
}

/// Handler for POST /incr/:key?amount=N
pub async fn incr_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<AdjustParams>,
) -> Result<Json<CounterResponse>> {
    check_key(&key)?;
    match state.cache.incr(&key, params.amount).await? {
        Some(value) => Ok(Json(CounterResponse { key, value })),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for POST /decr/:key?amount=N
pub async fn decr_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<AdjustParams>,
) -> Result<Json<CounterResponse>> {
    check_key(&key)?;
    match state.cache.decr(&key, params.amount).await? {
        Some(value) => Ok(Json(CounterResponse { key, value })),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key?ttl=N
///
/// Deleting a missing key is not an error.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<DeleteResponse>> {
    check_key(&key)?;
    state.cache.delete(&key, params.ttl).await?;
    Ok(Json(DeleteResponse::new(key, params.ttl)))
}

/// Handler for POST /flush_all?delay=N
pub async fn flush_handler(
    State(state): State<AppState>,
    Query(params): Query<FlushParams>,
) -> Result<Json<FlushResponse>> {
    state.cache.flush_all(params.delay).await?;
    Ok(Json(FlushResponse::new()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = state.cache.stats().await?;
    Ok(Json(stats.into()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn test_state() -> AppState {
        let cache = CacheTable::connect(&Config::in_memory()).await.unwrap();
        cache.ensure_schema().await.unwrap();
        AppState::new(cache)
    }

    fn store_request(key: &str, value: &str) -> StoreRequest {
        StoreRequest {
            key: key.to_string(),
            value: value.to_string(),
            ttl: 0,
        }
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state().await;

        let result = set_handler(
            State(state.clone()),
            Json(store_request("test_key", "test_value")),
        )
        .await;
        assert!(result.is_ok());

        let response = get_handler(State(state), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, "test_value");
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state().await;

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_handler_conflict() {
        let state = test_state().await;

        add_handler(State(state.clone()), Json(store_request("k", "v1")))
            .await
            .unwrap();
        let result = add_handler(State(state), Json(store_request("k", "v2"))).await;
        assert!(matches!(result, Err(CacheError::NotStored(_))));
    }

    #[tokio::test]
    async fn test_replace_handler_returns_value() {
        let state = test_state().await;

        set_handler(State(state.clone()), Json(store_request("k", "old")))
            .await
            .unwrap();
        let response = replace_handler(State(state), Json(store_request("k", "new")))
            .await
            .unwrap();
        assert_eq!(response.value.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_incr_handler() {
        let state = test_state().await;

        set_handler(State(state.clone()), Json(store_request("n", "10")))
            .await
            .unwrap();
        let response = incr_handler(
            State(state.clone()),
            Path("n".to_string()),
            Query(AdjustParams { amount: 5 }),
        )
        .await
        .unwrap();
        assert_eq!(response.value, 15);

        let result = decr_handler(
            State(state),
            Path("missing".to_string()),
            Query(AdjustParams { amount: 1 }),
        )
        .await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state().await;

        set_handler(State(state.clone()), Json(store_request("to_delete", "value")))
            .await
            .unwrap();

        let result = delete_handler(
            State(state.clone()),
            Path("to_delete".to_string()),
            Query(DeleteParams::default()),
        )
        .await;
        assert!(result.is_ok());

        let result = get_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state().await;

        let response = stats_handler(State(state)).await.unwrap();
        assert_eq!(response.live_entries, 0);
        assert_eq!(response.total_rows, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state().await;

        let result = set_handler(State(state), Json(store_request("", "value"))).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
