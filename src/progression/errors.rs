use thiserror::Error;

/// Errors raised by the progression engine and its character store.
#[derive(Debug, Error)]
pub enum ProgressionError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, catalog files).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when a stored record carries an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Any other persistence failure reported by a store implementation.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Bad caller input (empty character name, unknown stat name, ...).
    #[error("validation error: {0}")]
    Validation(String),

    #[error("character not found: {0}")]
    CharacterNotFound(String),

    #[error("skill not found: {0}")]
    SkillNotFound(String),

    #[error("race not found: {0}")]
    RaceNotFound(String),

    #[error("skill already unlocked: {0}")]
    AlreadyUnlocked(String),

    #[error("skill not unlocked: {0}")]
    NotUnlocked(String),

    #[error("prerequisites not met for skill: {0}")]
    PrerequisitesNotMet(String),

    /// Not enough lumens for the purchase. Nothing was deducted.
    #[error("insufficient funds: need {needed} lumens, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    /// Race assignment is one-time.
    #[error("race already set: {0}")]
    RaceAlreadySet(String),

    #[error("monster characters cannot take a race")]
    MonsterCannotHaveRace,

    /// A character with an assigned race cannot become a monster.
    #[error("race {0} is permanent; character cannot become a monster")]
    RaceLocked(String),

    /// The prerequisite graph among unlocked skills loops back on itself.
    #[error("prerequisite cycle detected: {}", .0.join(" -> "))]
    PrerequisiteCycle(Vec<String>),

    /// Catalog data failed to parse or validate.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}

impl ProgressionError {
    /// True when the error came from the persistence layer rather than from a
    /// rule check. Callers should treat the attempted mutation as possibly lost.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            ProgressionError::Sled(_)
                | ProgressionError::Bincode(_)
                | ProgressionError::Io(_)
                | ProgressionError::SchemaMismatch { .. }
                | ProgressionError::Storage(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failures_are_classified() {
        assert!(ProgressionError::Storage("quota exceeded".into()).is_storage_failure());
        assert!(ProgressionError::SchemaMismatch {
            entity: "character",
            expected: 1,
            found: 0
        }
        .is_storage_failure());
        assert!(!ProgressionError::NotUnlocked("fire_bolt".into()).is_storage_failure());
        assert!(!ProgressionError::InsufficientFunds {
            needed: 10,
            available: 0
        }
        .is_storage_failure());
    }

    #[test]
    fn cycle_message_lists_path() {
        let err = ProgressionError::PrerequisiteCycle(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "prerequisite cycle detected: a -> b -> a");
    }
}
