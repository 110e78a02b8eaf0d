//! Encoding and decoding of opaque resume tokens.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::page::PageSize;

/// Errors raised while encoding or decoding a cursor token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The token was empty or only whitespace.
    #[error("cursor token is empty")]
    Empty,
    /// The token is not valid URL-safe base64.
    #[error("cursor token is not valid base64: {message}")]
    InvalidEncoding {
        /// Decoder diagnostic.
        message: String,
    },
    /// The decoded payload is not a cursor.
    #[error("cursor payload is malformed: {message}")]
    InvalidPayload {
        /// Deserialiser diagnostic.
        message: String,
    },
    /// The cursor key could not be serialised.
    #[error("cursor key could not be serialised: {message}")]
    Serialize {
        /// Serialiser diagnostic.
        message: String,
    },
}

/// Resume position plus page size for keyset pagination.
///
/// `key` is `None` for the first page. Subsequent cursors carry the sort key
/// of the last record returned so the next query can resume strictly after
/// it.
///
/// # Examples
/// ```
/// use pagination::{Cursor, PageSize};
///
/// let cursor = Cursor::after(("2026-01-01".to_owned(), 7_u32), PageSize::default());
/// let token = cursor.encode()?;
/// let decoded: Cursor<(String, u32)> = Cursor::decode(&token)?;
/// assert_eq!(decoded, cursor);
/// # Ok::<(), pagination::CursorError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor<K> {
    #[serde(rename = "k")]
    key: Option<K>,
    #[serde(rename = "n")]
    page_size: PageSize,
}

impl<K> Cursor<K> {
    /// Cursor addressing the first page.
    #[must_use]
    pub const fn first(page_size: PageSize) -> Self {
        Self {
            key: None,
            page_size,
        }
    }

    /// Cursor resuming after `key`.
    #[must_use]
    pub const fn after(key: K, page_size: PageSize) -> Self {
        Self {
            key: Some(key),
            page_size,
        }
    }

    /// Sort key of the last record already delivered, if any.
    #[must_use]
    pub const fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Number of records requested per page.
    #[must_use]
    pub const fn page_size(&self) -> PageSize {
        self.page_size
    }
}

impl<K: Serialize> Cursor<K> {
    /// Encode the cursor as an opaque token.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Serialize`] when the key cannot be represented
    /// as JSON.
    pub fn encode(&self) -> Result<String, CursorError> {
        let payload = serde_json::to_vec(self).map_err(|err| CursorError::Serialize {
            message: err.to_string(),
        })?;
        Ok(URL_SAFE_NO_PAD.encode(payload))
    }
}

impl<K: DeserializeOwned> Cursor<K> {
    /// Decode a token previously produced by [`Cursor::encode`].
    ///
    /// Empty and garbage tokens are errors rather than "start from the
    /// beginning" requests.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Empty`], [`CursorError::InvalidEncoding`], or
    /// [`CursorError::InvalidPayload`].
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(CursorError::Empty);
        }
        let bytes =
            URL_SAFE_NO_PAD
                .decode(trimmed)
                .map_err(|err| CursorError::InvalidEncoding {
                    message: err.to_string(),
                })?;
        serde_json::from_slice(&bytes).map_err(|err| CursorError::InvalidPayload {
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;
    use rstest::rstest;

    type Key = (i64, String);

    #[rstest]
    fn first_page_cursor_survives_encoding() {
        let size = PageSize::try_new(5).expect("valid size");
        let cursor: Cursor<Key> = Cursor::first(size);

        let token = cursor.encode().expect("encode");
        let decoded: Cursor<Key> = Cursor::decode(&token).expect("decode");

        assert!(decoded.key().is_none());
        assert_eq!(decoded.page_size(), size);
    }

    #[rstest]
    fn token_is_url_safe() {
        let cursor = Cursor::after((42_i64, "a/b+c?".to_owned()), PageSize::default());
        let token = cursor.encode().expect("encode");
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn empty_tokens_are_rejected(#[case] token: &str) {
        let result: Result<Cursor<Key>, _> = Cursor::decode(token);
        assert_eq!(result, Err(CursorError::Empty));
    }

    #[rstest]
    fn non_base64_tokens_are_rejected() {
        let result: Result<Cursor<Key>, _> = Cursor::decode("***");
        assert!(matches!(result, Err(CursorError::InvalidEncoding { .. })));
    }

    #[rstest]
    fn foreign_payloads_are_rejected() {
        let token = URL_SAFE_NO_PAD.encode(b"{\"unrelated\":true}");
        let result: Result<Cursor<Key>, _> = Cursor::decode(&token);
        assert!(matches!(result, Err(CursorError::InvalidPayload { .. })));
    }

    #[rstest]
    fn zero_page_size_in_payload_is_rejected() {
        let token = URL_SAFE_NO_PAD.encode(b"{\"k\":null,\"n\":0}");
        let result: Result<Cursor<Key>, _> = Cursor::decode(&token);
        assert!(matches!(result, Err(CursorError::InvalidPayload { .. })));
    }
}
