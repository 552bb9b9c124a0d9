use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use jotter_core::{ApiResponse, DeleteAck, Error, HealthStatus, Note, NoteId, NoteInput};

use crate::state::AppState;

const COLLECTION_METHODS: &str = "GET, POST";
const ITEM_METHODS: &str = "GET, PUT, DELETE";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route(
            "/notes",
            get(list_notes)
                .post(create_note)
                .fallback(collection_not_allowed),
        )
        .route(
            "/notes/{id}",
            get(get_note)
                .put(update_note)
                .delete(delete_note)
                .fallback(item_not_allowed),
        )
        .with_state(state)
}

type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

async fn index() -> &'static str {
    "Jotter API"
}

async fn health(State(state): State<AppState>) -> ApiResult<HealthStatus> {
    state.service.ping().await.map_err(|err| {
        tracing::error!(error = %err, "Health check failed.");
        ApiError::new(status_for(&err), err.to_string())
    })?;

    Ok(ok(HealthStatus {
        message: "Database connected successfully".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn list_notes(State(state): State<AppState>) -> ApiResult<Vec<Note>> {
    connect(&state).await?;

    let notes = state
        .service
        .find_all()
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to fetch notes"))?;

    Ok((StatusCode::OK, Json(ApiResponse::list(notes))))
}

async fn create_note(
    State(state): State<AppState>,
    body: Result<Json<NoteInput>, JsonRejection>,
) -> ApiResult<Note> {
    connect(&state).await?;
    let input = parse_body(body)?;

    let note = state
        .service
        .create(input)
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to create note"))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(note))))
}

async fn get_note(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Note> {
    connect(&state).await?;
    check_id(&id)?;

    let note = state
        .service
        .find_by_id(&id)
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to fetch note"))?;

    Ok(ok(note))
}

async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<NoteInput>, JsonRejection>,
) -> ApiResult<Note> {
    connect(&state).await?;
    check_id(&id)?;
    let input = parse_body(body)?;

    let note = state
        .service
        .update(&id, input)
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to update note"))?;

    Ok(ok(note))
}

async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeleteAck> {
    connect(&state).await?;
    check_id(&id)?;

    state
        .service
        .delete_by_id(&id)
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to delete note"))?;

    Ok(ok(DeleteAck {
        message: "Note deleted successfully".to_string(),
    }))
}

async fn collection_not_allowed(method: Method) -> ApiError {
    ApiError::method_not_allowed(&method, COLLECTION_METHODS)
}

async fn item_not_allowed(
    State(state): State<AppState>,
    method: Method,
    Path(id): Path<String>,
) -> ApiError {
    if let Err(err) = connect(&state).await {
        return err;
    }
    if let Err(err) = check_id(&id) {
        return err;
    }
    ApiError::method_not_allowed(&method, ITEM_METHODS)
}

fn ok<T>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::OK, Json(ApiResponse::ok(data)))
}

/// Every request starts by making sure the store is reachable.
async fn connect(state: &AppState) -> Result<(), ApiError> {
    state.service.connect().await.map(|_| ()).map_err(|err| {
        tracing::error!(error = %err, "Database connection failed.");
        match err {
            Error::Timeout(_) => {
                ApiError::new(StatusCode::GATEWAY_TIMEOUT, "Database request timed out")
            }
            _ => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Database connection failed"),
        }
    })
}

/// Reject malformed ids before any store access.
fn check_id(id: &str) -> Result<(), ApiError> {
    if NoteId::is_valid(id) {
        Ok(())
    } else {
        Err(ApiError::new(StatusCode::BAD_REQUEST, "Invalid note ID"))
    }
}

fn parse_body(body: Result<Json<NoteInput>, JsonRejection>) -> Result<NoteInput, ApiError> {
    body.map(|Json(input)| input).map_err(|rejection| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Invalid JSON: {}", rejection.body_text()),
        )
    })
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation(_) | Error::InvalidId(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::Connection(_) | Error::Database(_) | Error::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// An error rendered as `{success: false, error}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    allow: Option<&'static str>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            allow: None,
        }
    }

    fn method_not_allowed(method: &Method, allow: &'static str) -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            message: format!("Method {} Not Allowed", method),
            allow: Some(allow),
        }
    }

    /// Map a data-access failure; `fallback` is shown for unclassified failures.
    fn from_service(err: Error, fallback: &str) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!(status = %status, error = %err, "Request failed.");
        }

        let message = match err {
            Error::Validation(message) => message,
            Error::InvalidId(_) => "Invalid note ID".to_string(),
            Error::NotFound(_) => "Note not found".to_string(),
            Error::Timeout(_) => "Database request timed out".to_string(),
            Error::Connection(_) => "Database connection failed".to_string(),
            Error::Database(_) | Error::Internal(_) => fallback.to_string(),
        };
        Self::new(status, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error(self.message);
        let mut response = (self.status, Json(body)).into_response();
        if let Some(allow) = self.allow {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(allow));
        }
        response
    }
}
