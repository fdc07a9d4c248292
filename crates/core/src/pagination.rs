//! Page/limit handling for list endpoints.
//!
//! Query parameters arrive as untrusted text. [`PageRequest::from_query`]
//! never fails: anything unparsable or out of range falls back to a default
//! rather than producing a client error.

/// A clamped page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Page used when the parameter is missing, unparsable or below 1.
    pub const DEFAULT_PAGE: u32 = 1;
    /// Limit used when the parameter is missing, unparsable or out of range.
    pub const DEFAULT_LIMIT: u32 = 20;
    /// Largest accepted limit.
    pub const MAX_LIMIT: u32 = 100;

    /// Build a page request from raw `page` and `limit` query values.
    ///
    /// - `page` below 1 or unparsable becomes 1; there is no upper bound.
    /// - `limit` outside `1..=100` or unparsable becomes 20 (it is *not*
    ///   clamped to 100).
    #[must_use]
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(Self::DEFAULT_PAGE);

        let limit = limit
            .and_then(|l| l.parse::<i64>().ok())
            .filter(|l| (1..=i64::from(Self::MAX_LIMIT)).contains(l))
            .and_then(|l| u32::try_from(l).ok())
            .unwrap_or(Self::DEFAULT_LIMIT);

        Self { page, limit }
    }

    /// The 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of records on the page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records to skip: `(page - 1) * limit`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Number of pages needed to hold `total` records, `ceil(total / limit)`.
///
/// Zero records means zero pages. A zero limit is treated as one page per
/// record rather than dividing by zero.
#[must_use]
pub fn total_pages(total: i64, limit: u32) -> i64 {
    let limit = i64::from(limit.max(1));
    if total <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}
