use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::auth::{AuthError, AuthProvider, Session};
use super::domain::{RecordDraft, RecordId};
use super::export::ExportFormat;
use super::filter::RecordFilter;
use super::service::{DirectoryService, DirectorySnapshot, ServiceError};
use super::store::{DocumentStore, StoreError};

const LOGIN_FAILED: &str = "Failed to log in. Please check your email and password.";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Export parameters: the active filters plus the desired format.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub format: ExportFormat,
}

impl ExportQuery {
    fn into_parts(self) -> (RecordFilter, ExportFormat) {
        let filter = RecordFilter {
            q: self.q,
            year: self.year,
            country: self.country,
            program: self.program,
        };
        (filter, self.format)
    }
}

/// Router builder exposing session, directory, report and export endpoints.
pub fn directory_router<S, A>(service: Arc<DirectoryService<S, A>>) -> Router
where
    S: DocumentStore + 'static,
    A: AuthProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/session",
            post(login_handler::<S, A>).delete(logout_handler::<S, A>),
        )
        .route(
            "/api/v1/alumni",
            get(list_handler::<S, A>).post(create_handler::<S, A>),
        )
        .route("/api/v1/alumni/facets", get(facets_handler::<S, A>))
        .route("/api/v1/alumni/export", get(export_handler::<S, A>))
        .route("/api/v1/alumni/:record_id", patch(update_handler::<S, A>))
        .route(
            "/api/v1/reports/attendance-by-year",
            get(attendance_by_year_handler::<S, A>),
        )
        .route(
            "/api/v1/reports/top-countries",
            get(top_countries_handler::<S, A>),
        )
        .with_state(service)
}

fn bearer_session<S, A>(
    service: &DirectoryService<S, A>,
    headers: &HeaderMap,
) -> Result<Session, ServiceError>
where
    S: DocumentStore + 'static,
    A: AuthProvider + 'static,
{
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ServiceError::Auth(AuthError::Unauthenticated))?;
    service.authorize(token)
}

pub(crate) fn error_response(err: ServiceError) -> Response {
    let (status, message) = match &err {
        ServiceError::Auth(AuthError::InvalidCredentials) => {
            (StatusCode::UNAUTHORIZED, LOGIN_FAILED.to_string())
        }
        ServiceError::Auth(AuthError::Unauthenticated) => {
            (StatusCode::UNAUTHORIZED, err.to_string())
        }
        ServiceError::Auth(AuthError::Unavailable) | ServiceError::Fetch(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        ServiceError::Save(StoreError::NotFound) => {
            (StatusCode::NOT_FOUND, "alumnus not found".to_string())
        }
        ServiceError::Save(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        ServiceError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        ServiceError::Export(_) if err.is_empty_export() => {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        ServiceError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    };

    (status, Json(json!({ "error": message }))).into_response()
}

pub(crate) async fn login_handler<S, A>(
    State(service): State<Arc<DirectoryService<S, A>>>,
    Json(request): Json<LoginRequest>,
) -> Response
where
    S: DocumentStore + 'static,
    A: AuthProvider + 'static,
{
    match service.login(&request.email, &request.password) {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn logout_handler<S, A>(
    State(service): State<Arc<DirectoryService<S, A>>>,
    headers: HeaderMap,
) -> Response
where
    S: DocumentStore + 'static,
    A: AuthProvider + 'static,
{
    match bearer_session(&service, &headers) {
        Ok(session) => {
            service.logout(&session);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<S, A>(
    State(service): State<Arc<DirectoryService<S, A>>>,
    headers: HeaderMap,
    Query(filter): Query<RecordFilter>,
) -> Response
where
    S: DocumentStore + 'static,
    A: AuthProvider + 'static,
{
    let result = bearer_session(&service, &headers)
        .and_then(|session| service.search(&session, &filter));
    match result {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_handler<S, A>(
    State(service): State<Arc<DirectoryService<S, A>>>,
    headers: HeaderMap,
    Json(draft): Json<RecordDraft>,
) -> Response
where
    S: DocumentStore + 'static,
    A: AuthProvider + 'static,
{
    let result =
        bearer_session(&service, &headers).and_then(|session| service.save(&session, None, draft));
    match result {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<S, A>(
    State(service): State<Arc<DirectoryService<S, A>>>,
    headers: HeaderMap,
    Path(record_id): Path<String>,
    Json(draft): Json<RecordDraft>,
) -> Response
where
    S: DocumentStore + 'static,
    A: AuthProvider + 'static,
{
    let id = RecordId(record_id);
    let result = bearer_session(&service, &headers)
        .and_then(|session| service.save(&session, Some(&id), draft));
    match result {
        Ok(id) => (StatusCode::OK, Json(json!({ "id": id }))).into_response(),
        Err(err) => error_response(err),
    }
}

/// Chart and facet payloads carry the load time of the snapshot they were built from.
fn snapshot_response<T: Serialize>(snapshot: &DirectorySnapshot, body: T) -> Response {
    let loaded_at = snapshot
        .loaded_at
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string();
    (
        StatusCode::OK,
        [(header::LAST_MODIFIED, loaded_at)],
        Json(body),
    )
        .into_response()
}

pub(crate) async fn facets_handler<S, A>(
    State(service): State<Arc<DirectoryService<S, A>>>,
    headers: HeaderMap,
) -> Response
where
    S: DocumentStore + 'static,
    A: AuthProvider + 'static,
{
    match bearer_session(&service, &headers).and_then(|session| service.snapshot(&session)) {
        Ok(snapshot) => snapshot_response(&snapshot, &snapshot.report.facets),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn attendance_by_year_handler<S, A>(
    State(service): State<Arc<DirectoryService<S, A>>>,
    headers: HeaderMap,
) -> Response
where
    S: DocumentStore + 'static,
    A: AuthProvider + 'static,
{
    match bearer_session(&service, &headers).and_then(|session| service.snapshot(&session)) {
        Ok(snapshot) => snapshot_response(&snapshot, &snapshot.report.attendance_by_year),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn top_countries_handler<S, A>(
    State(service): State<Arc<DirectoryService<S, A>>>,
    headers: HeaderMap,
) -> Response
where
    S: DocumentStore + 'static,
    A: AuthProvider + 'static,
{
    match bearer_session(&service, &headers).and_then(|session| service.snapshot(&session)) {
        Ok(snapshot) => snapshot_response(&snapshot, &snapshot.report.top_countries),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler<S, A>(
    State(service): State<Arc<DirectoryService<S, A>>>,
    headers: HeaderMap,
    Query(query): Query<ExportQuery>,
) -> Response
where
    S: DocumentStore + 'static,
    A: AuthProvider + 'static,
{
    let (filter, format) = query.into_parts();
    let result = bearer_session(&service, &headers)
        .and_then(|session| service.export(&session, &filter, format));
    match result {
        Ok(file) => {
            let disposition = format!("attachment; filename=\"{}\"", file.file_name);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, file.content_type.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                file.bytes,
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}
