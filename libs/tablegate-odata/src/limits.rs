//! Input caps for OData query options.
//!
//! Oversized `$top` values are clamped to the configured page size rather
//! than rejected; filter length and `$orderby` fan-out are hard limits.

use crate::Error;

#[derive(Debug, Clone)]
pub struct ODataLimits {
    /// Default and maximum page size; `$top` above this is clamped.
    pub max_page_size: u64,
    /// Maximum length of a `$filter` expression in bytes.
    pub max_filter_length: usize,
    /// Maximum number of `$orderby` keys.
    pub max_orderby_fields: usize,
}

impl Default for ODataLimits {
    fn default() -> Self {
        Self {
            max_page_size: 1000,
            max_filter_length: 2000,
            max_orderby_fields: 5,
        }
    }
}

impl ODataLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_page_size(mut self, max: u64) -> Self {
        self.max_page_size = max;
        self
    }

    #[must_use]
    pub fn with_max_filter_length(mut self, max: usize) -> Self {
        self.max_filter_length = max;
        self
    }

    #[must_use]
    pub fn with_max_orderby_fields(mut self, max: usize) -> Self {
        self.max_orderby_fields = max;
        self
    }

    /// Page size actually used for a request: `$top` clamped to the maximum,
    /// or the maximum itself when `$top` is absent.
    #[must_use]
    pub fn effective_limit(&self, top: Option<u64>) -> u64 {
        top.map_or(self.max_page_size, |t| t.min(self.max_page_size))
    }

    /// # Errors
    /// Returns [`Error::FilterSyntax`] when the expression exceeds the
    /// configured length.
    pub fn validate_filter(&self, filter: &str) -> Result<(), Error> {
        if filter.len() > self.max_filter_length {
            return Err(Error::FilterSyntax {
                position: self.max_filter_length,
                message: format!(
                    "filter expression exceeds maximum length of {} bytes",
                    self.max_filter_length
                ),
            });
        }
        Ok(())
    }

    /// # Errors
    /// Returns [`Error::InvalidOrderBy`] when more keys than allowed are
    /// requested.
    pub fn validate_orderby_count(&self, count: usize) -> Result<(), Error> {
        if count > self.max_orderby_fields {
            return Err(Error::InvalidOrderBy(format!(
                "too many orderby fields (max: {})",
                self.max_orderby_fields
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_limit_clamps() {
        let limits = ODataLimits::default();
        assert_eq!(limits.effective_limit(Some(10)), 10);
        assert_eq!(limits.effective_limit(Some(1000)), 1000);
        assert_eq!(limits.effective_limit(Some(5000)), 1000);
        assert_eq!(limits.effective_limit(None), 1000);
        assert_eq!(limits.effective_limit(Some(0)), 0);
    }

    #[test]
    fn filter_length_cap() {
        let limits = ODataLimits::default();
        assert!(limits.validate_filter("Media eq 'Naver'").is_ok());
        assert!(limits.validate_filter(&"x".repeat(2001)).is_err());
    }

    #[test]
    fn orderby_count_cap() {
        let limits = ODataLimits::default().with_max_orderby_fields(3);
        assert!(limits.validate_orderby_count(3).is_ok());
        assert!(limits.validate_orderby_count(4).is_err());
    }
}
