//! Fixed system endpoints under the reserved path prefix.
//!
//! These are registered outside the declarative table and are the only
//! routes allowed to live under `/_`:
//! - `ANY /_email/{id}`   — render a stored email for browser viewing
//! - `ANY /_delete/{id}`  — delete a stored file
//! - `GET /_download/{id}` — download a stored file with its content type

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{any, get};
use axum::Router;
use serde_json::json;

use crate::http::AppState;
use crate::store::{DocumentId, FindOptions, SENT_EMAILS_COLLECTION};

/// Route table paths must not start with this prefix; it is reserved for
/// the system endpoints below.
pub const RESERVED_PREFIX: &str = "/_";

/// Template marker replaced when an email is viewed in a browser.
const HIDE_MARKER: &str = "{{_hideOnBrowser}}";

/// CSS directive substituted for the marker.
const HIDE_DIRECTIVE: &str = "display:none";

/// Text served when the referenced email no longer exists.
const UNAVAILABLE_MESSAGE: &str = "This page is not available any more";

pub fn system_routes(state: AppState) -> Router {
    Router::new()
        .route("/_email/{id}", any(email_handler))
        .route("/_delete/{id}", any(delete_handler))
        .route("/_download/{id}", get(download_handler))
        .with_state(state)
}

/// Look up a sent email by id and return its HTML with every hide-marker
/// replaced. An unknown or invalid id coerces to a fresh one, matches
/// nothing, and yields the unavailability message.
async fn email_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = DocumentId::coerce(&id);
    let filter = json!({ "_id": id.to_string() });

    match state
        .store
        .find_one(SENT_EMAILS_COLLECTION, filter, FindOptions::default())
        .await
    {
        Ok(Some(doc)) => {
            let html = doc.get("html").and_then(|h| h.as_str()).unwrap_or("");
            Html(html.replace(HIDE_MARKER, HIDE_DIRECTIVE)).into_response()
        }
        Ok(None) => UNAVAILABLE_MESSAGE.into_response(),
        Err(error) => Json(json!({ "error": error.to_string() })).into_response(),
    }
}

async fn delete_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.files.delete_file(&id).await {
        Ok(()) => Json(json!({ "error": null })).into_response(),
        Err(error) => Json(json!({ "error": error.to_string() })).into_response(),
    }
}

async fn download_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.files.read_file(&id, false).await {
        Ok(file) => ([(header::CONTENT_TYPE, file.mimetype)], file.data).into_response(),
        Err(error) => Json(json!({ "error": error.to_string() })).into_response(),
    }
}
