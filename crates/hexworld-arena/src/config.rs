//! Path pool configuration parameters.

/// Configuration for the path pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of paths that can be in flight before the oldest is recycled.
    ///
    /// Default: 10_000. Must be at least 1.
    pub capacity: u32,
}

impl PoolConfig {
    /// Default number of pooled path buffers.
    pub const DEFAULT_CAPACITY: u32 = 10_000;

    /// Config with an explicit capacity.
    pub fn new(capacity: u32) -> Self {
        Self { capacity }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity() {
        assert_eq!(PoolConfig::default().capacity, 10_000);
    }
}
