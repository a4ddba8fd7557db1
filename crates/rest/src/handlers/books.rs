//! Book collection handlers.
//!
//! Every handler takes an optional `table` query parameter naming the
//! collection; it defaults to the configured collection. Successful
//! responses are wrapped as `{"data": ...}`.

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bookshelf_persistence::{Database, InsertInput, RecordField};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::state::AppState;

/// Query parameters accepted by the book routes. Each route reads only the
/// ones it needs.
#[derive(Debug, Default, Deserialize)]
pub struct BookQuery {
    pub table: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub field: Option<String>,
    pub value: Option<String>,
}

impl BookQuery {
    fn collection<'a, S>(&'a self, state: &'a AppState<S>) -> &'a str
    where
        S: Database,
    {
        self.table
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| state.default_collection())
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> RestResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RestError::missing_param(name))
}

fn parse_query(query: Result<Query<BookQuery>, QueryRejection>) -> RestResult<BookQuery> {
    query
        .map(|Query(q)| q)
        .map_err(|rejection| RestError::bad_request(rejection.body_text()))
}

fn data<T: Serialize>(status: StatusCode, value: T) -> Response {
    (status, Json(json!({ "data": value }))).into_response()
}

/// `GET [base]/books?table=<name>`
pub async fn list_handler<S>(
    State(state): State<AppState<S>>,
    query: Result<Query<BookQuery>, QueryRejection>,
) -> RestResult<Response>
where
    S: Database + 'static,
{
    let query = parse_query(query)?;
    let collection = query.collection(&state);
    debug!(collection = %collection, "Processing list request");

    let records = state.storage().all(&state.op_context(), collection).await?;
    Ok(data(StatusCode::OK, records))
}

/// `POST [base]/books` with a `{"title", "author"}` body.
///
/// Responds `201 Created` with the stored record, including its generated id.
pub async fn create_handler<S>(
    State(state): State<AppState<S>>,
    query: Result<Query<BookQuery>, QueryRejection>,
    body: Result<Json<InsertInput>, JsonRejection>,
) -> RestResult<Response>
where
    S: Database + 'static,
{
    let query = parse_query(query)?;
    let Json(input) = body.map_err(|rejection| RestError::bad_request(rejection.body_text()))?;
    let collection = query.collection(&state);
    debug!(collection = %collection, title = %input.title, "Processing create request");

    let record = state
        .storage()
        .insert(&state.op_context(), collection, input)
        .await?;
    Ok(data(StatusCode::CREATED, record))
}

/// `GET [base]/books/title?title=<v>`
pub async fn find_by_title_handler<S>(
    State(state): State<AppState<S>>,
    query: Result<Query<BookQuery>, QueryRejection>,
) -> RestResult<Response>
where
    S: Database + 'static,
{
    let query = parse_query(query)?;
    let title = required(&query.title, "title")?;
    find(&state, query.collection(&state), RecordField::Title.as_str(), title).await
}

/// `GET [base]/books/author?name=<v>`
pub async fn find_by_author_handler<S>(
    State(state): State<AppState<S>>,
    query: Result<Query<BookQuery>, QueryRejection>,
) -> RestResult<Response>
where
    S: Database + 'static,
{
    let query = parse_query(query)?;
    let name = required(&query.name, "name")?;
    find(&state, query.collection(&state), RecordField::Author.as_str(), name).await
}

/// `GET [base]/books/search?field=<f>&value=<v>`
///
/// Unsupported field names are rejected by storage with a 400.
pub async fn search_handler<S>(
    State(state): State<AppState<S>>,
    query: Result<Query<BookQuery>, QueryRejection>,
) -> RestResult<Response>
where
    S: Database + 'static,
{
    let query = parse_query(query)?;
    let field = required(&query.field, "field")?;
    let value = required(&query.value, "value")?;
    find(&state, query.collection(&state), field, value).await
}

async fn find<S>(state: &AppState<S>, collection: &str, field: &str, value: &str) -> RestResult<Response>
where
    S: Database + 'static,
{
    debug!(collection = %collection, field = %field, "Processing find request");

    let records = state
        .storage()
        .find_by_field(&state.op_context(), collection, field, value)
        .await?;
    Ok(data(StatusCode::OK, records))
}

/// `DELETE [base]/books?title=<v>`
///
/// Responds with `{"data": <removed count>}`; zero is not an error.
pub async fn delete_handler<S>(
    State(state): State<AppState<S>>,
    query: Result<Query<BookQuery>, QueryRejection>,
) -> RestResult<Response>
where
    S: Database + 'static,
{
    let query = parse_query(query)?;
    let title = required(&query.title, "title")?;
    let collection = query.collection(&state);
    debug!(collection = %collection, "Processing delete request");

    let deleted = state
        .storage()
        .delete(&state.op_context(), collection, RecordField::Title.as_str(), title)
        .await?;
    Ok(data(StatusCode::OK, deleted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_missing_and_empty() {
        assert!(required(&None, "title").is_err());
        assert!(required(&Some(String::new()), "title").is_err());
        assert_eq!(required(&Some("Fictions".to_string()), "title").unwrap(), "Fictions");
    }
}
