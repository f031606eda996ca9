//! Engine configuration, validation, and error types.
//!
//! [`EngineConfig`] is the constructor input for a
//! [`MapManager`](crate::MapManager). [`validate()`](EngineConfig::validate)
//! checks every structural invariant up front so the manager never has
//! to re-check settings per call.

use std::error::Error;
use std::fmt;

use hexworld_arena::{ArenaError, PoolConfig};
use hexworld_nav::{PathLimits, DEFAULT_MAX_EXPLORED, MAX_PATH_LEN};
use hexworld_space::GridLayout;

/// Largest supported critter footprint radius.
pub const MAX_MULTIHEX: u8 = 3;

// ── PathConfig ─────────────────────────────────────────────────────

/// Pathfinding and path pool settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathConfig {
    /// Paths kept in flight before the oldest is recycled. Default: 10_000.
    pub pool_capacity: u32,
    /// Longest path in steps. Default: 400.
    pub max_path_len: u32,
    /// Nodes a single search may settle. Default: 40_000.
    pub max_explored: usize,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            pool_capacity: PoolConfig::DEFAULT_CAPACITY,
            max_path_len: MAX_PATH_LEN,
            max_explored: DEFAULT_MAX_EXPLORED,
        }
    }
}

impl PathConfig {
    /// Search bounds for the path finder.
    pub fn limits(&self) -> PathLimits {
        PathLimits {
            max_path_len: self.max_path_len,
            max_explored: self.max_explored,
        }
    }

    /// Path pool configuration.
    pub fn pool(&self) -> PoolConfig {
        PoolConfig::new(self.pool_capacity)
    }
}

// ── GlobalMapConfig ────────────────────────────────────────────────

/// World-map settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalMapConfig {
    /// Side of one zone in world-map units. Default: 50.
    pub zone_length: u32,
}

impl Default for GlobalMapConfig {
    fn default() -> Self {
        Self { zone_length: 50 }
    }
}

// ── CritterConfig ──────────────────────────────────────────────────

/// Critter placement and perception settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CritterConfig {
    /// Sight radius for critters that do not set their own. Default: 20.
    pub default_look: u32,
    /// Largest footprint radius a placed critter may have. Default: 3.
    pub max_multihex: u8,
    /// Critters one map may hold. Default: 5_000.
    pub max_per_map: usize,
    /// How far from a preferred hex a displaced critter may be placed
    /// (dragged followers, spawns, players on a regenerated map). Default: 3.
    pub seek_radius: u32,
}

impl Default for CritterConfig {
    fn default() -> Self {
        Self {
            default_look: 20,
            max_multihex: MAX_MULTIHEX,
            max_per_map: 5_000,
            seek_radius: 3,
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`EngineConfig::validate()`].
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Path pool configuration is invalid.
    Arena(ArenaError),
    /// A path search bound is zero.
    InvalidPathLimit {
        /// Which bound.
        reason: String,
    },
    /// Zone length is zero.
    ZoneLengthZero,
    /// Footprint radius limit exceeds [`MAX_MULTIHEX`].
    MultihexTooLarge {
        /// The configured limit.
        configured: u8,
    },
    /// Per-map critter limit is zero.
    CritterLimitZero,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arena(e) => write!(f, "path pool: {e}"),
            Self::InvalidPathLimit { reason } => write!(f, "invalid path limit: {reason}"),
            Self::ZoneLengthZero => write!(f, "zone_length must be at least 1"),
            Self::MultihexTooLarge { configured } => {
                write!(f, "max_multihex {configured} exceeds {MAX_MULTIHEX}")
            }
            Self::CritterLimitZero => write!(f, "max_per_map must be at least 1"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

// ── EngineConfig ───────────────────────────────────────────────────

/// Complete configuration for constructing a [`MapManager`](crate::MapManager).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Grid topology shared by every map.
    pub layout: GridLayout,
    /// Pathfinding settings.
    pub path: PathConfig,
    /// World-map settings.
    pub global: GlobalMapConfig,
    /// Critter settings.
    pub critters: CritterConfig,
}

impl EngineConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.pool_capacity == 0 {
            return Err(ArenaError::ZeroCapacity.into());
        }
        if self.path.max_path_len == 0 {
            return Err(ConfigError::InvalidPathLimit {
                reason: "max_path_len must be at least 1".into(),
            });
        }
        if self.path.max_explored == 0 {
            return Err(ConfigError::InvalidPathLimit {
                reason: "max_explored must be at least 1".into(),
            });
        }
        if self.global.zone_length == 0 {
            return Err(ConfigError::ZoneLengthZero);
        }
        if self.critters.max_multihex > MAX_MULTIHEX {
            return Err(ConfigError::MultihexTooLarge {
                configured: self.critters.max_multihex,
            });
        }
        if self.critters.max_per_map == 0 {
            return Err(ConfigError::CritterLimitZero);
        }
        Ok(())
    }
}
