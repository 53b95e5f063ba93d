//! Page slicing for table views.

use crate::error::ViewError;

/// Rows-per-page choices offered by the tables.
pub const ALLOWED_PAGE_SIZES: [usize; 3] = [10, 25, 100];

/// A validated rows-per-page value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSize(usize);

impl PageSize {
    pub fn new(size: usize) -> Result<Self, ViewError> {
        if ALLOWED_PAGE_SIZES.contains(&size) {
            Ok(Self(size))
        } else {
            Err(ViewError::InvalidPageSize(size))
        }
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(ALLOWED_PAGE_SIZES[0])
    }
}

impl TryFrom<usize> for PageSize {
    type Error = ViewError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `rows[page_index * size .. page_index * size + size]`, clamped.
///
/// Pages past the end are empty rather than an error.
pub fn paginate<T>(rows: &[T], page_index: usize, page_size: PageSize) -> &[T] {
    let size = page_size.get();
    let start = page_index.saturating_mul(size);
    if start >= rows.len() {
        return &[];
    }
    let end = start.saturating_add(size).min(rows.len());
    &rows[start..end]
}

/// Number of pages needed for `total` rows. Zero rows means zero pages.
pub fn page_count(total: usize, page_size: PageSize) -> usize {
    total.div_ceil(page_size.get())
}
