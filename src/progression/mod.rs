//! Character progression: skill catalog, prerequisite evaluation, lumens
//! ledger and the engine that unlocks and refunds skills.
//! Characters persist through a `CharacterStore`; the sled-backed store is
//! the default and an in-memory store backs tests and tooling.

pub mod catalog;
pub mod elemental;
pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod ledger;
pub mod races;
pub mod storage;
pub mod types;

pub use catalog::{SkillCatalog, SkillCatalogBuilder};
pub use elemental::{ElementalAffinities, ElementalClassifier};
pub use engine::ProgressionEngine;
pub use errors::ProgressionError;
pub use evaluator::{evaluate, PrerequisiteEvaluator};
pub use ledger::{
    character_level, credit_lumens, current_investment_value, level, spend_lumens,
    stat_points, stat_upgrade_cost, tier_points,
};
pub use races::{RaceCatalog, RaceDefinition};
pub use storage::{
    CharacterStore, MemoryCharacterStore, SledCharacterStore, SledCharacterStoreBuilder,
};
pub use types::*;
