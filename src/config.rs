//! Capacity policy knobs for a map.

use crate::error::MapError;

/// Implementation ceiling on entries and buckets.
pub const MAX_SIZE: usize = isize::MAX as usize;

/// Growth and capacity limits.
///
/// `growth_threshold` is the number of entries allowed per bucket before the
/// table grows to `capacity * 2 + 1` buckets. `max_capacity` caps the bucket
/// count; once reached, inserting a new key at the load limit fails with
/// `MapError::Full`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MapConfig {
    growth_threshold: usize,
    max_capacity: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            growth_threshold: 1,
            max_capacity: MAX_SIZE,
        }
    }
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_growth_threshold(mut self, threshold: usize) -> Self {
        self.growth_threshold = threshold;
        self
    }

    pub fn with_max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn growth_threshold(&self) -> usize {
        self.growth_threshold
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn validate(&self) -> Result<(), MapError> {
        if self.growth_threshold == 0 {
            return Err(MapError::InvalidConfig("growth_threshold must be at least 1"));
        }
        if self.max_capacity == 0 {
            return Err(MapError::InvalidConfig("max_capacity must be at least 1"));
        }
        if self.max_capacity > MAX_SIZE {
            return Err(MapError::InvalidConfig("max_capacity exceeds MAX_SIZE"));
        }
        Ok(())
    }
}
