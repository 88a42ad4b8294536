//! Table sizing policy.

use crate::error::{Result, TableError};

/// Number of buckets a table starts with unless configured otherwise.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Load factor above which an insert grows the table.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.75;

/// Capacity multiplier applied on growth.
///
/// Not a power of two, so that successive capacities do not keep mapping the
/// same hash residues onto the same buckets.
pub const DEFAULT_GROWTH_FACTOR: f64 = 1.618;

/// Sizing policy of a table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableConfig {
    /// Bucket count at construction and after `clear`.
    pub initial_capacity: usize,
    /// Maximum `len / capacity` tolerated after an insert returns.
    pub max_load_factor: f64,
    /// New capacity is `growth_factor * (capacity + 1)`.
    pub growth_factor: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn with_max_load_factor(mut self, load_factor: f64) -> Self {
        self.max_load_factor = load_factor;
        self
    }

    pub fn with_growth_factor(mut self, growth_factor: f64) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    /// Rejects policies under which an insert could find no vacant bucket or
    /// growth could fail to make progress.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(invalid("initial capacity must be at least 1"));
        }
        if !(self.max_load_factor > 0.0 && self.max_load_factor < 1.0) {
            return Err(invalid(format!(
                "max load factor must lie in (0, 1), got {}",
                self.max_load_factor
            )));
        }
        if !(self.growth_factor > 1.0 && self.growth_factor.is_finite()) {
            return Err(invalid(format!(
                "growth factor must be finite and greater than 1, got {}",
                self.growth_factor
            )));
        }
        Ok(())
    }

    /// True when `len` entries in `capacity` buckets exceed the load factor.
    pub(crate) fn exceeds(&self, len: usize, capacity: usize) -> bool {
        len as f64 > self.max_load_factor * capacity as f64
    }

    /// Capacity to grow to so that `len` entries respect the load factor.
    pub(crate) fn grown_capacity(&self, mut capacity: usize, len: usize) -> usize {
        loop {
            let next = (self.growth_factor * capacity.saturating_add(1) as f64) as usize;
            capacity = next.max(capacity.saturating_add(1));
            if !self.exceeds(len, capacity) || capacity == usize::MAX {
                return capacity;
            }
        }
    }
}

fn invalid(reason: impl Into<String>) -> TableError {
    TableError::InvalidConfig {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(TableConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_capacity_and_bad_factors() {
        assert!(TableConfig::new().with_initial_capacity(0).validate().is_err());
        assert!(TableConfig::new().with_max_load_factor(1.0).validate().is_err());
        assert!(TableConfig::new().with_max_load_factor(f64::NAN).validate().is_err());
        assert!(TableConfig::new().with_growth_factor(1.0).validate().is_err());
        assert!(TableConfig::new()
            .with_growth_factor(f64::INFINITY)
            .validate()
            .is_err());
    }

    #[test]
    fn sixteen_grows_to_twenty_seven() {
        let c = TableConfig::default();
        assert!(!c.exceeds(12, 16));
        assert!(c.exceeds(13, 16));
        assert_eq!(c.grown_capacity(16, 13), 27);
    }

    #[test]
    fn growth_from_one_bucket_makes_room() {
        let c = TableConfig::default();
        assert!(c.exceeds(1, 1));
        let grown = c.grown_capacity(1, 1);
        assert_eq!(grown, 3);
        assert!(!c.exceeds(1, grown));
    }

    #[test]
    fn growth_repeats_until_load_holds() {
        let c = TableConfig::default().with_growth_factor(1.01);
        let grown = c.grown_capacity(4, 100);
        assert!(!c.exceeds(100, grown));
    }
}
