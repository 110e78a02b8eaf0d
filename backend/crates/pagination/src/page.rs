//! Page size bounds and the page envelope.

use serde::{Deserialize, Serialize};

use crate::cursor::{Cursor, CursorError};

/// Errors raised when a requested page size is out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PageSizeError {
    /// Zero records were requested.
    #[error("page size must be at least 1")]
    Zero,
    /// More than [`PageSize::MAX`] records were requested.
    #[error("page size must be at most {max}, got {requested}")]
    TooLarge {
        /// Requested size.
        requested: u32,
        /// Upper bound.
        max: u32,
    },
}

/// Validated number of records per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageSize(u32);

impl PageSize {
    /// Page size used when the caller does not specify one.
    pub const DEFAULT: u32 = 20;
    /// Largest page a caller may request.
    pub const MAX: u32 = 100;

    /// Validate a requested page size.
    ///
    /// # Errors
    ///
    /// Returns [`PageSizeError`] when `size` is zero or exceeds
    /// [`PageSize::MAX`].
    pub const fn try_new(size: u32) -> Result<Self, PageSizeError> {
        if size == 0 {
            return Err(PageSizeError::Zero);
        }
        if size > Self::MAX {
            return Err(PageSizeError::TooLarge {
                requested: size,
                max: Self::MAX,
            });
        }
        Ok(Self(size))
    }

    /// Raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Raw value as a collection length.
    #[must_use]
    pub fn as_usize(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<u32> for PageSize {
    type Error = PageSizeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<PageSize> for u32 {
    fn from(value: PageSize) -> Self {
        value.0
    }
}

/// One page of results plus the token for the following page.
///
/// `next_cursor` is `None` once fewer than `page_size` records come back,
/// which marks the result set as exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Build a page from already-materialised parts.
    #[must_use]
    pub const fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    /// Build a page from the rows of one keyset query.
    ///
    /// When `items` fills the page, the next cursor resumes after the key of
    /// the last item; a short page has no next cursor.
    ///
    /// # Errors
    ///
    /// Propagates [`CursorError::Serialize`] from encoding the next cursor.
    ///
    /// # Examples
    /// ```
    /// use pagination::{Page, PageSize};
    ///
    /// let size = PageSize::try_new(2).expect("valid");
    /// let page = Page::assemble(vec![1_u32, 2], size, |n| *n)?;
    /// assert!(page.next_cursor().is_some());
    /// let last = Page::assemble(vec![3_u32], size, |n| *n)?;
    /// assert!(last.is_last());
    /// # Ok::<(), pagination::CursorError>(())
    /// ```
    pub fn assemble<K, F>(items: Vec<T>, page_size: PageSize, key_of: F) -> Result<Self, CursorError>
    where
        K: Serialize,
        F: FnOnce(&T) -> K,
    {
        let next_cursor = match items.last() {
            Some(last) if items.len() >= page_size.as_usize() => {
                Some(Cursor::after(key_of(last), page_size).encode()?)
            }
            _ => None,
        };
        Ok(Self { items, next_cursor })
    }

    /// Records on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Token for the next page, if more records may follow.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    /// True when no further page exists.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }

    /// Split the page into items and next token.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, Option<String>) {
        (self.items, self.next_cursor)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(20)]
    #[case(100)]
    fn accepts_sizes_within_bounds(#[case] size: u32) {
        assert_eq!(PageSize::try_new(size).map(PageSize::get), Ok(size));
    }

    #[rstest]
    fn rejects_zero() {
        assert_eq!(PageSize::try_new(0), Err(PageSizeError::Zero));
    }

    #[rstest]
    fn rejects_oversized_pages() {
        assert_eq!(
            PageSize::try_new(101),
            Err(PageSizeError::TooLarge {
                requested: 101,
                max: 100
            })
        );
    }

    #[rstest]
    fn full_page_points_at_last_key() {
        let size = PageSize::try_new(2).expect("valid size");
        let page = Page::assemble(vec!["a", "b"], size, |s| (*s).to_owned()).expect("page");

        let token = page.next_cursor().expect("next cursor");
        let cursor: Cursor<String> = Cursor::decode(token).expect("decode");
        assert_eq!(cursor.key().map(String::as_str), Some("b"));
        assert_eq!(cursor.page_size(), size);
    }

    #[rstest]
    fn empty_page_is_last() {
        let page = Page::<u8>::assemble(Vec::new(), PageSize::default(), |n| *n).expect("page");
        assert!(page.is_last());
        assert!(page.items().is_empty());
    }
}
