//! Opaque cursor and page envelope primitives.
//!
//! Paginated queries hand callers a [`Cursor`] token that encodes where the
//! previous page stopped together with the page size. Tokens are URL-safe
//! base64 over a small JSON payload so callers can treat them as opaque
//! strings and adapters can decode them without shared state.
//!
//! A [`Page`] carries the items of one page and, when more records may
//! follow, the token for the next request.

mod cursor;
mod page;

pub use cursor::{Cursor, CursorError};
pub use page::{Page, PageSize, PageSizeError};
