//! HTTP request handlers.
//!
//! Handlers translate query parameters and bodies into storage calls. Each
//! request gets its own operation context carrying the configured deadline.

pub mod books;
pub mod health;

pub use books::{
    create_handler, delete_handler, find_by_author_handler, find_by_title_handler, list_handler,
    search_handler,
};
pub use health::{ping_handler, root_handler};
