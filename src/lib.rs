//! # Lumenforge - character progression for skill-tree RPGs
//!
//! Lumenforge tracks characters, the skills they have unlocked and the
//! lumens (skill currency) they have spent. It enforces prerequisite rules
//! when a skill is unlocked and refunds whole dependency chains when a skill
//! is given back.
//!
//! ## Features
//!
//! - **Skill catalog**: read-only tree of skills (weapon, magic, profession,
//!   monster, fusion, ultimate, racial) loaded from JSON, with AND/OR and
//!   named special prerequisites.
//! - **Unlocks**: eligibility checks for monster/humanoid and racial gates,
//!   cross-cultural racial skills for humans, and a dev mode that skips them.
//! - **Cascading refunds**: a refunded skill takes every unlocked dependent
//!   with it, each returning 75% of its cost (rounded up).
//! - **Race and monster status**: one-time race assignment with stat
//!   modifiers, and monster/humanoid toggling with forced refunds.
//! - **Persistence**: sled-backed character store with bincode records.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumenforge::progression::{ProgressionEngine, SledCharacterStore};
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = SledCharacterStore::open("./data/characters")?;
//!     let engine = ProgressionEngine::with_standard_data(store)?;
//!
//!     let hero = engine.create_character("Aria")?;
//!     engine.unlock_skill(&hero.id, "sword_basics", false)?;
//!     let outcome = engine.refund_skill(&hero.id, "sword_basics")?;
//!     println!("refunded {} lumens", outcome.total_refund);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`progression`] - catalog, evaluator, ledger, engine and storage
//! - [`config`] - configuration loading and validation
//! - [`validation`] - character-name validation

pub mod config;
pub mod progression;
pub mod validation;
