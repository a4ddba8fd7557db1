//! Versioned API routes.

use axum::{Router, routing::get};
use bookshelf_persistence::Database;

use crate::handlers;
use crate::state::AppState;

/// Every route is nested under this prefix.
pub const API_PREFIX: &str = "/api/v1";

/// Creates all API routes.
///
/// # Routes
///
/// - `GET /` - Root
/// - `GET /ping` - Storage status
/// - `GET /books` - List a collection
/// - `POST /books` - Insert a record
/// - `DELETE /books` - Delete by title
/// - `GET /books/title` - Find by title
/// - `GET /books/author` - Find by author
/// - `GET /books/search` - Find by any field
pub fn create_routes<S>(state: AppState<S>) -> Router
where
    S: Database + 'static,
{
    let api = Router::new()
        .route("/", get(handlers::root_handler))
        .route("/ping", get(handlers::ping_handler::<S>))
        .route(
            "/books",
            get(handlers::list_handler::<S>)
                .post(handlers::create_handler::<S>)
                .delete(handlers::delete_handler::<S>),
        )
        .route("/books/title", get(handlers::find_by_title_handler::<S>))
        .route("/books/author", get(handlers::find_by_author_handler::<S>))
        .route("/books/search", get(handlers::search_handler::<S>))
        .with_state(state);

    Router::new().nest(API_PREFIX, api)
}
