use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch},
};
use chrono::{SecondsFormat, Utc};
use launcher_common::{NewEntry, PositionUpdate, ValidationError, ValidationIssue};
use serde_json::{Value, json};

use crate::config::{AccessCheck, AccessPolicy};
use crate::store::SharedStore;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub store: SharedStore,
    pub access: AccessPolicy,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: SharedStore, access: AccessPolicy) -> SharedState {
        Arc::new(Self { store, access })
    }
}

/// Field carrying the create gate secret. Never reaches validation or storage.
pub const ACCESS_CODE_FIELD: &str = "accessCode";

pub const INVALID_APP_DATA: &str = "Invalid app data";
pub const INVALID_POSITION_DATA: &str = "Invalid position data";

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    BadRequest {
        message: &'static str,
        details: Vec<ValidationIssue>,
    },
    Forbidden(&'static str),
    NotFound(&'static str),
    Internal(&'static str),
}

impl ApiError {
    fn invalid(message: &'static str, err: ValidationError) -> Self {
        ApiError::BadRequest {
            message,
            details: err.issues,
        }
    }

    fn unreadable(message: &'static str, rejection: JsonRejection) -> Self {
        ApiError::BadRequest {
            message,
            details: vec![ValidationIssue::new("", rejection.body_text())],
        }
    }

    /// Log the underlying failure; the client only sees `message`.
    fn internal(message: &'static str, err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "{}", message);
        ApiError::Internal(message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest { message, details } => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": message, "details": details})),
            )
                .into_response(),
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, Json(json!({"error": msg}))).into_response()
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({"error": msg}))).into_response()
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": msg}))).into_response()
            }
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/apps", get(list_apps).post(create_app))
        .route("/api/apps/positions", patch(update_positions))
        .route("/api/apps/{id}", delete(delete_app))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

async fn list_apps(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .store
        .list()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch apps", e))?;
    Ok(Json(entries))
}

async fn create_app(
    State(state): State<SharedState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(mut body) = body.map_err(|r| ApiError::unreadable(INVALID_APP_DATA, r))?;
    let Some(fields) = body.as_object_mut() else {
        return Err(ApiError::BadRequest {
            message: INVALID_APP_DATA,
            details: vec![ValidationIssue::new("", "Expected object")],
        });
    };

    let presented = fields.remove(ACCESS_CODE_FIELD);
    match state.access.check(presented.as_ref().and_then(Value::as_str)) {
        AccessCheck::Allowed => {}
        AccessCheck::NotConfigured => {
            tracing::error!("Create rejected: ACCESS_CODE is not set");
            return Err(ApiError::Internal("Access code not configured on server"));
        }
        AccessCheck::Denied => {
            tracing::warn!("Create rejected: invalid access code");
            return Err(ApiError::Forbidden("Invalid access code"));
        }
    }

    let new = NewEntry::from_value(&body).map_err(|e| ApiError::invalid(INVALID_APP_DATA, e))?;
    let entry = state
        .store
        .create(new)
        .await
        .map_err(|e| ApiError::internal("Failed to create app", e))?;
    tracing::info!(entry_id = %entry.id, name = %entry.name, "Created app");
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_app(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .store
        .delete(&id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete app", e))?;
    if !deleted {
        return Err(ApiError::NotFound("App not found"));
    }
    tracing::info!(entry_id = %id, "Deleted app");
    Ok(Json(json!({"success": true})))
}

async fn update_positions(
    State(state): State<SharedState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|r| ApiError::unreadable(INVALID_POSITION_DATA, r))?;
    let updates = PositionUpdate::batch_from_value(&body)
        .map_err(|e| ApiError::invalid(INVALID_POSITION_DATA, e))?;
    state
        .store
        .update_positions(&updates)
        .await
        .map_err(|e| ApiError::internal("Failed to update positions", e))?;
    tracing::info!(count = updates.len(), "Updated positions");
    Ok(Json(json!({"success": true})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use launcher_common::Entry;
    use tower::ServiceExt;

    use crate::errors::StoreError;
    use crate::store::{EntryStore, MemoryStore};

    fn test_state(access: AccessPolicy) -> (SharedState, SharedStore) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        (AppState::new(store.clone(), access), store)
    }

    fn test_app() -> Router {
        let (state, _) = test_state(AccessPolicy::Open);
        api_router().with_state(state)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(body: Body) -> T {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn create(app: &Router, name: &str, url: &str) -> Entry {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/apps", json!({"name": name, "url": url})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response.into_body()).await
    }

    async fn list(app: &Router) -> Vec<Entry> {
        let response = app.clone().oneshot(empty_request("GET", "/api/apps")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response.into_body()).await
    }

    /// A store whose every operation fails.
    struct BrokenStore;

    #[async_trait]
    impl EntryStore for BrokenStore {
        fn backend(&self) -> &'static str {
            "broken"
        }
        async fn list(&self) -> Result<Vec<Entry>, StoreError> {
            Err(StoreError::LockPoisoned)
        }
        async fn create(&self, _new: NewEntry) -> Result<Entry, StoreError> {
            Err(StoreError::LockPoisoned)
        }
        async fn delete(&self, _id: &str) -> Result<bool, StoreError> {
            Err(StoreError::LockPoisoned)
        }
        async fn update_positions(&self, _updates: &[PositionUpdate]) -> Result<(), StoreError> {
            Err(StoreError::LockPoisoned)
        }
    }

    fn broken_app() -> Router {
        api_router().with_state(AppState::new(Arc::new(BrokenStore), AccessPolicy::Open))
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = test_app().oneshot(empty_request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = body_json(response.into_body()).await;
        assert_eq!(body["status"], "ok");
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert!(timestamp.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_health_does_not_touch_storage() {
        let response = broken_app().oneshot(empty_request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_apps_empty() {
        assert!(list(&test_app()).await.is_empty());
    }

    #[tokio::test]
    async fn test_create_app_assigns_unique_ids() {
        let app = test_app();
        let a = create(&app, "GitHub", "https://github.com").await;
        let b = create(&app, "GitHub", "https://github.com").await;
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
        assert_eq!(a.position, 0);
        assert_eq!(a.category, None);
        assert_eq!(list(&app).await.len(), 2);
    }

    #[tokio::test]
    async fn test_create_app_keeps_category() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/apps",
                json!({"name": "Docs", "url": "https://docs.rs", "category": "Work"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = body_json(response.into_body()).await;
        assert_eq!(body["category"], "Work");
        assert_eq!(body["name"], "Docs");
    }

    #[tokio::test]
    async fn test_create_app_rejects_bad_url_without_persisting() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/apps", json!({"name": "x", "url": "not-a-url"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = body_json(response.into_body()).await;
        assert_eq!(body["error"], "Invalid app data");
        assert_eq!(body["details"][0]["path"], "url");
        assert_eq!(body["details"][0]["message"], "Please enter a valid URL");
        assert!(list(&app).await.is_empty());
    }

    #[tokio::test]
    async fn test_create_app_rejects_empty_name_and_missing_fields() {
        let app = test_app();
        for payload in [
            json!({"name": "", "url": "https://a.com"}),
            json!({"url": "https://a.com"}),
            json!({"name": "a"}),
            json!(["not", "an", "object"]),
        ] {
            let response = app
                .clone()
                .oneshot(json_request("POST", "/api/apps", payload))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert!(list(&app).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/apps")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = body_json(response.into_body()).await;
        assert_eq!(body["error"], "Invalid app data");
    }

    #[tokio::test]
    async fn test_delete_app_then_404() {
        let app = test_app();
        let entry = create(&app, "GitHub", "https://github.com").await;
        let uri = format!("/api/apps/{}", entry.id);

        let response = app.clone().oneshot(empty_request("DELETE", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = body_json(response.into_body()).await;
        assert_eq!(body, json!({"success": true}));
        assert!(list(&app).await.iter().all(|e| e.id != entry.id));

        let response = app.clone().oneshot(empty_request("DELETE", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = body_json(response.into_body()).await;
        assert_eq!(body["error"], "App not found");
    }

    #[tokio::test]
    async fn test_reorder_to_c_a_b() {
        let app = test_app();
        let a = create(&app, "A", "https://a.com").await;
        let b = create(&app, "B", "https://b.com").await;
        let c = create(&app, "C", "https://c.com").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                "/api/apps/positions",
                json!([
                    {"id": c.id, "position": 0},
                    {"id": a.id, "position": 1},
                    {"id": b.id, "position": 2},
                ]),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = body_json(response.into_body()).await;
        assert_eq!(body, json!({"success": true}));

        let mut entries = list(&app).await;
        entries.sort_by_key(|e| e.position);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        let positions: Vec<i32> = entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_reorder_rejects_bad_shape() {
        let app = test_app();
        for payload in [
            json!({"id": "a", "position": 0}),
            json!([{"id": "a", "position": "first"}]),
            json!([{"id": "a", "position": 0.5}]),
            json!([{"position": 0}]),
        ] {
            let response = app
                .clone()
                .oneshot(json_request("PATCH", "/api/apps/positions", payload))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body: Value = body_json(response.into_body()).await;
            assert_eq!(body["error"], "Invalid position data");
            assert!(body["details"].as_array().is_some_and(|d| !d.is_empty()));
        }
    }

    #[tokio::test]
    async fn test_positions_route_is_not_a_delete_target() {
        let response = test_app()
            .oneshot(empty_request("DELETE", "/api/apps/positions"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_gated_create_rejects_wrong_or_missing_code() {
        let (state, store) = test_state(AccessPolicy::gated(Some("letmein".into())));
        let app = api_router().with_state(state);

        for payload in [
            json!({"name": "a", "url": "https://a.com"}),
            json!({"name": "a", "url": "https://a.com", "accessCode": "nope"}),
            json!({"name": "a", "url": "https://a.com", "accessCode": ""}),
        ] {
            let response = app
                .clone()
                .oneshot(json_request("POST", "/api/apps", payload))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            let body: Value = body_json(response.into_body()).await;
            assert_eq!(body["error"], "Invalid access code");
        }
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_gated_create_accepts_correct_code_and_strips_it() {
        let (state, store) = test_state(AccessPolicy::gated(Some("letmein".into())));
        let app = api_router().with_state(state);
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/apps",
                json!({"name": "a", "url": "https://a.com", "accessCode": "letmein"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = body_json(response.into_body()).await;
        assert!(body.get("accessCode").is_none());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gated_create_without_server_secret_is_500() {
        let (state, store) = test_state(AccessPolicy::gated(None));
        let app = api_router().with_state(state);
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/apps",
                json!({"name": "a", "url": "https://a.com", "accessCode": "anything"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = body_json(response.into_body()).await;
        assert_eq!(body["error"], "Access code not configured on server");
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failures_map_to_fixed_500_messages() {
        let app = broken_app();
        let cases = [
            (empty_request("GET", "/api/apps"), "Failed to fetch apps"),
            (
                json_request("POST", "/api/apps", json!({"name": "a", "url": "https://a.com"})),
                "Failed to create app",
            ),
            (empty_request("DELETE", "/api/apps/x"), "Failed to delete app"),
            (
                json_request("PATCH", "/api/apps/positions", json!([{"id": "x", "position": 0}])),
                "Failed to update positions",
            ),
        ];
        for (request, message) in cases {
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body: Value = body_json(response.into_body()).await;
            assert_eq!(body, json!({"error": message}));
        }
    }
}
