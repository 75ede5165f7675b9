use std::ops::{Range, RangeInclusive};

use http::StatusCode;

/// Set of status codes an operation considers successful.
///
/// Supports individual codes plus inclusive and exclusive ranges, so operations
/// answering both `200` and `201` (or any `2xx`) can be described.
///
/// # Example
///
/// ```rust
/// use restwire_core::ExpectedStatusCodes;
///
/// let codes = ExpectedStatusCodes::from_single(200).add_single(201);
/// assert!(codes.contains(200));
/// assert!(codes.contains(201));
/// assert!(!codes.contains(204));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedStatusCodes {
    ranges: Vec<StatusCodeRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StatusCodeRange {
    Single(u16),
    Inclusive(RangeInclusive<u16>),
    Exclusive(Range<u16>),
}

fn assert_valid_status(kind: &str, status: u16, max: u16) {
    assert!(
        (100..=max).contains(&status),
        "HTTP status code {kind} must be between 100 and {max}, got {status}"
    );
}

impl ExpectedStatusCodes {
    /// Creates the set containing only `200 OK`.
    pub fn new() -> Self {
        Self::from_status_code(StatusCode::OK)
    }

    /// Creates the set from a single status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code is outside 100-599.
    pub fn from_single(status: u16) -> Self {
        Self { ranges: Vec::new() }.add_single(status)
    }

    /// Creates the set from an inclusive range, e.g. `200..=299`.
    ///
    /// # Panics
    ///
    /// Panics if a bound is outside 100-599 or the range is empty.
    pub fn from_inclusive_range(range: RangeInclusive<u16>) -> Self {
        Self { ranges: Vec::new() }.add_inclusive_range(range)
    }

    /// Creates the set from an exclusive range, e.g. `200..300`.
    ///
    /// # Panics
    ///
    /// Panics if the start is outside 100-599, the end outside 100-600, or the range is empty.
    pub fn from_exclusive_range(range: Range<u16>) -> Self {
        Self { ranges: Vec::new() }.add_exclusive_range(range)
    }

    /// Creates the set from a single `http::StatusCode`.
    ///
    /// No runtime validation is needed, `StatusCode` is always valid.
    pub fn from_status_code(status: StatusCode) -> Self {
        Self {
            ranges: vec![StatusCodeRange::Single(status.as_u16())],
        }
    }

    /// Creates the set of all `2xx` status codes.
    pub fn success() -> Self {
        Self::from_exclusive_range(200..300)
    }

    /// Adds a single status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code is outside 100-599.
    pub fn add_single(mut self, status: u16) -> Self {
        assert_valid_status("value", status, 599);
        self.ranges.push(StatusCodeRange::Single(status));
        self
    }

    /// Adds an inclusive range of status codes.
    ///
    /// # Panics
    ///
    /// Panics if a bound is outside 100-599 or the range is empty.
    pub fn add_inclusive_range(mut self, range: RangeInclusive<u16>) -> Self {
        assert_valid_status("range start", *range.start(), 599);
        assert_valid_status("range end", *range.end(), 599);
        assert!(
            range.start() <= range.end(),
            "HTTP status code range start ({}) must be less than or equal to end ({})",
            range.start(),
            range.end()
        );
        self.ranges.push(StatusCodeRange::Inclusive(range));
        self
    }

    /// Adds an exclusive range of status codes.
    ///
    /// # Panics
    ///
    /// Panics if the start is outside 100-599, the end outside 100-600, or the range is empty.
    pub fn add_exclusive_range(mut self, range: Range<u16>) -> Self {
        assert_valid_status("range start", range.start, 599);
        assert_valid_status("range end", range.end, 600);
        assert!(
            range.start < range.end,
            "HTTP status code range start ({}) must be less than end ({})",
            range.start,
            range.end
        );
        self.ranges.push(StatusCodeRange::Exclusive(range));
        self
    }

    /// Checks if a status code belongs to the set.
    pub fn contains(&self, status: u16) -> bool {
        self.ranges.iter().any(|range| match range {
            StatusCodeRange::Single(single) => *single == status,
            StatusCodeRange::Inclusive(range) => range.contains(&status),
            StatusCodeRange::Exclusive(range) => range.contains(&status),
        })
    }

    /// Checks if an `http::StatusCode` belongs to the set.
    pub fn contains_status_code(&self, status: StatusCode) -> bool {
        self.contains(status.as_u16())
    }
}

impl Default for ExpectedStatusCodes {
    fn default() -> Self {
        Self::new()
    }
}

impl From<StatusCode> for ExpectedStatusCodes {
    fn from(value: StatusCode) -> Self {
        Self::from_status_code(value)
    }
}
