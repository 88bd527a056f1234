//! Error types for the combat simulation.
//!
//! All of these are recoverable conditions expressed as values; a failed
//! spawn or an invalid debug command never aborts the run. Run termination
//! is a normal [`crate::events::GameEvent::RunEnded`] event, not an error.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A fixed-capacity pool had no free slot. The caller skips the spawn.
    #[error("Pool '{pool}' exhausted (capacity {capacity})")]
    PoolExhausted {
        /// Name of the pool that ran out.
        pool: String,
        /// Configured capacity of the pool.
        capacity: usize,
    },

    /// Targeting found no eligible candidate; the weapon holds fire.
    #[error("No valid target in range")]
    NoValidTarget,

    /// A weapon upgrade was requested past the level cap.
    #[error("Invalid upgrade for weapon '{weapon}': level {level}")]
    InvalidUpgradeLevel {
        /// Weapon definition key.
        weapon: String,
        /// Rejected target level.
        level: u32,
    },

    /// A companion outlived the weapon that owns it.
    #[error("Companion has no owning weapon")]
    OrphanedCompanion,

    /// Lookup of an unknown weapon or enemy definition key.
    #[error("Definition not found: '{0}'")]
    DefinitionNotFound(String),

    /// Content table parsing error.
    #[error("Failed to parse definition table: {0}")]
    DataParse(String),

    /// An action was requested in a state that does not permit it.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
