//! Skill unlock/refund orchestration.
//!
//! `ProgressionEngine` is the only component that changes a character's
//! unlocked skills. Every public operation follows the same shape: load the
//! character from the store, run all checks, mutate the loaded copy, then
//! persist it. A failed check returns before anything is mutated, and a
//! failed save leaves the stored record as it was.

use log::{debug, info, warn};

use crate::progression::catalog::SkillCatalog;
use crate::progression::elemental::{ElementalAffinities, ElementalClassifier};
use crate::progression::errors::ProgressionError;
use crate::progression::evaluator::PrerequisiteEvaluator;
use crate::progression::ledger;
use crate::progression::races::RaceCatalog;
use crate::progression::storage::CharacterStore;
use crate::progression::types::{
    Character, CharacterSummary, RefundOutcome, SkillBucket, SkillCategory, StatKind,
};

pub struct ProgressionEngine<S: CharacterStore> {
    store: S,
    catalog: SkillCatalog,
    races: RaceCatalog,
    elemental: Box<dyn ElementalClassifier>,
}

impl<S: CharacterStore> ProgressionEngine<S> {
    pub fn new(
        store: S,
        catalog: SkillCatalog,
        races: RaceCatalog,
        elemental: Box<dyn ElementalClassifier>,
    ) -> Self {
        Self {
            store,
            catalog,
            races,
            elemental,
        }
    }

    /// Engine over the embedded skill and race seeds, classifying elemental
    /// affinity skills from the catalog's flags.
    pub fn with_standard_data(store: S) -> Result<Self, ProgressionError> {
        let catalog = SkillCatalog::standard()?;
        let races = RaceCatalog::standard()?;
        let elemental = ElementalAffinities::from_catalog(&catalog);
        Ok(Self::new(store, catalog, races, Box::new(elemental)))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &SkillCatalog {
        &self.catalog
    }

    pub fn races(&self) -> &RaceCatalog {
        &self.races
    }

    pub fn evaluator(&self) -> PrerequisiteEvaluator<'_> {
        PrerequisiteEvaluator::new(&self.catalog, &self.races, self.elemental.as_ref())
    }

    // ------------------------------------------------------------------
    // Character lifecycle
    // ------------------------------------------------------------------

    /// Create a character with default values and save it.
    pub fn create_character(&self, name: &str) -> Result<Character, ProgressionError> {
        let mut character = Character::create(name)?;
        self.persist(&mut character)?;
        info!("created character {} ({})", character.id, character.name);
        Ok(character)
    }

    pub fn load_character(&self, character_id: &str) -> Result<Character, ProgressionError> {
        self.store.load(character_id)
    }

    pub fn delete_character(&self, character_id: &str) -> Result<(), ProgressionError> {
        self.store.delete(character_id)?;
        info!("deleted character {}", character_id);
        Ok(())
    }

    pub fn list_characters(&self) -> Result<Vec<String>, ProgressionError> {
        self.store.list_ids()
    }

    // ------------------------------------------------------------------
    // Unlock
    // ------------------------------------------------------------------

    pub fn can_unlock(
        &self,
        character_id: &str,
        skill_id: &str,
        dev_mode: bool,
    ) -> Result<bool, ProgressionError> {
        let character = self.store.load(character_id)?;
        self.evaluator().can_unlock(&character, skill_id, dev_mode)
    }

    /// Unlock `skill_id` for the stored character and persist the result.
    pub fn unlock_skill(
        &self,
        character_id: &str,
        skill_id: &str,
        dev_mode: bool,
    ) -> Result<Character, ProgressionError> {
        let mut character = self.store.load(character_id)?;
        self.apply_unlock(&mut character, skill_id, dev_mode)?;
        self.persist(&mut character)?;
        Ok(character)
    }

    /// In-memory unlock. On error the character is left untouched.
    ///
    /// Order of checks: unknown id, already unlocked, eligibility (skipped
    /// in dev mode), funds.
    pub fn apply_unlock(
        &self,
        character: &mut Character,
        skill_id: &str,
        dev_mode: bool,
    ) -> Result<(), ProgressionError> {
        let skill = self.catalog.require(skill_id)?;

        if character.has_skill(skill_id) {
            return Err(ProgressionError::AlreadyUnlocked(skill_id.to_string()));
        }

        let evaluator = self.evaluator();
        if !dev_mode && !evaluator.can_unlock(character, skill_id, false)? {
            return Err(ProgressionError::PrerequisitesNotMet(skill_id.to_string()));
        }

        let bucket = evaluator.storage_bucket(character, skill_id)?;
        let cost = u64::from(skill.cost);
        let available = character.lumens;
        if !ledger::spend_lumens(character, cost) {
            return Err(ProgressionError::InsufficientFunds {
                needed: cost,
                available,
            });
        }

        character.unlocked.insert(bucket.clone(), skill_id);
        character.total_skills_unlocked += 1;
        info!(
            "{} unlocked {} into {} for {} lumens{}",
            character.id,
            skill_id,
            bucket,
            cost,
            if dev_mode { " (dev mode)" } else { "" }
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Refund
    // ------------------------------------------------------------------

    /// Refund `skill_id` and every unlocked skill that transitively depends
    /// on it, each at 75% of its cost (rounded up).
    pub fn refund_skill(
        &self,
        character_id: &str,
        skill_id: &str,
    ) -> Result<RefundOutcome, ProgressionError> {
        let mut character = self.store.load(character_id)?;
        let (refunded_skill_ids, total_refund) = self.apply_refund(&mut character, skill_id)?;
        self.persist(&mut character)?;
        Ok(RefundOutcome {
            character,
            refunded_skill_ids,
            total_refund,
        })
    }

    /// In-memory cascading refund. Returns the refunded ids (dependents
    /// first, `skill_id` last) and the lumens credited.
    pub fn apply_refund(
        &self,
        character: &mut Character,
        skill_id: &str,
    ) -> Result<(Vec<String>, u64), ProgressionError> {
        self.catalog.require(skill_id)?;
        if !character.has_skill(skill_id) {
            return Err(ProgressionError::NotUnlocked(skill_id.to_string()));
        }

        let dependents = self
            .catalog
            .walk_dependents(skill_id, |id| character.has_skill(id))
            .inspect_err(|e| warn!("{}: refund of {} aborted: {}", character.id, skill_id, e))?;

        let mut refunded = Vec::with_capacity(dependents.len() + 1);
        let mut total = 0u64;
        for id in dependents.iter().map(String::as_str).chain(Some(skill_id)) {
            let value = self
                .catalog
                .find_skill_by_id(id)
                .map(|skill| skill.refund_value())
                .unwrap_or(0);
            if character.unlocked.remove(id).is_some() {
                character.total_skills_unlocked = character.total_skills_unlocked.saturating_sub(1);
                total += value;
                refunded.push(id.to_string());
                debug!("{}: refunding {} for {} lumens", character.id, id, value);
            }
        }

        ledger::credit_lumens(character, total);
        info!(
            "{} refunded {} ({} skills, {} lumens)",
            character.id,
            skill_id,
            refunded.len(),
            total
        );
        Ok((refunded, total))
    }

    // ------------------------------------------------------------------
    // Monster status and race
    // ------------------------------------------------------------------

    /// Flip between monster and humanoid.
    pub fn toggle_monster(&self, character_id: &str) -> Result<Character, ProgressionError> {
        let mut character = self.store.load(character_id)?;
        let target = !character.is_monster;
        self.apply_monster_status(&mut character, target)?;
        self.persist(&mut character)?;
        Ok(character)
    }

    /// Set monster status explicitly. Asking for the current status changes
    /// nothing.
    pub fn set_monster(
        &self,
        character_id: &str,
        monster: bool,
    ) -> Result<Character, ProgressionError> {
        let mut character = self.store.load(character_id)?;
        if character.is_monster == monster {
            return Ok(character);
        }
        self.apply_monster_status(&mut character, monster)?;
        self.persist(&mut character)?;
        Ok(character)
    }

    /// In-memory monster transition. Forced refunds pay back each skill's
    /// full declared cost.
    ///
    /// Becoming a monster drops every profession skill. Reverting drops every
    /// monster skill and every elemental affinity skill.
    pub fn apply_monster_status(
        &self,
        character: &mut Character,
        monster: bool,
    ) -> Result<u64, ProgressionError> {
        if character.is_monster == monster {
            return Ok(0);
        }

        let refunded = if monster {
            if let Some(race) = &character.race {
                return Err(ProgressionError::RaceLocked(race.clone()));
            }
            let professions = character.unlocked.ids_in_category(SkillCategory::Profession);
            let total = self.forced_refund(character, &professions);
            character.unlocked.clear_category(SkillCategory::Profession);
            for (subcategory, _) in self.catalog.subcategories(SkillCategory::Monster) {
                character
                    .unlocked
                    .ensure_bucket(SkillBucket::Monster(subcategory.to_string()));
            }
            total
        } else {
            let mut dropped = character.unlocked.ids_in_category(SkillCategory::Monster);
            dropped.extend(
                character
                    .unlocked
                    .iter()
                    .filter(|(bucket, id)| {
                        bucket.category() != SkillCategory::Monster
                            && self.elemental.is_elemental_affinity_skill(id)
                    })
                    .map(|(_, id)| id.to_string()),
            );
            let total = self.forced_refund(character, &dropped);
            character.unlocked.clear_category(SkillCategory::Monster);
            total
        };

        character.is_monster = monster;
        info!(
            "{} is now {} ({} lumens refunded)",
            character.id,
            if monster { "a monster" } else { "humanoid" },
            refunded
        );
        Ok(refunded)
    }

    /// Remove `ids` and credit their declared cost.
    fn forced_refund(&self, character: &mut Character, ids: &[String]) -> u64 {
        let mut total = 0u64;
        for id in ids {
            if character.unlocked.remove(id).is_none() {
                continue;
            }
            character.total_skills_unlocked = character.total_skills_unlocked.saturating_sub(1);
            match self.catalog.find_skill_by_id(id) {
                Some(skill) => total += u64::from(skill.cost),
                None => warn!("{}: dropped unknown skill {} without refund", character.id, id),
            }
        }
        ledger::credit_lumens(character, total);
        total
    }

    /// One-time race assignment.
    pub fn set_character_race(
        &self,
        character_id: &str,
        race_id: &str,
    ) -> Result<Character, ProgressionError> {
        let mut character = self.store.load(character_id)?;
        self.apply_race(&mut character, race_id)?;
        self.persist(&mut character)?;
        Ok(character)
    }

    /// In-memory race assignment: stat modifiers (and the hp/stamina pools
    /// that follow them), a fresh racial bucket, ability flags and passive
    /// trait.
    pub fn apply_race(
        &self,
        character: &mut Character,
        race_id: &str,
    ) -> Result<(), ProgressionError> {
        if let Some(existing) = &character.race {
            return Err(ProgressionError::RaceAlreadySet(existing.clone()));
        }
        if character.is_monster {
            return Err(ProgressionError::MonsterCannotHaveRace);
        }
        let race = self.races.require(race_id)?;

        // Racial skills picked up before a race existed (dev mode only) do
        // not survive the reset.
        let stale = character.unlocked.ids_in_category(SkillCategory::Racial);
        if !stale.is_empty() {
            let refunded = self.forced_refund(character, &stale);
            debug!(
                "{}: cleared {} racial skills before race assignment ({} lumens)",
                character.id,
                stale.len(),
                refunded
            );
        }
        character.unlocked.reset_racial(&race.id);

        for (stat, delta) in &race.modifiers {
            *character.stats.get_mut(*stat) += delta;
            character.vitals.follow_stat(*stat, *delta);
        }
        character.abilities.extend(race.abilities.iter().cloned());
        character.passive_trait = race.passive_trait.clone();
        character.race = Some(race.id.clone());

        info!("{} is now {}", character.id, race.name);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stats and lumens
    // ------------------------------------------------------------------

    /// Buy one point of `stat`. The Nth upgrade of a stat costs N lumens.
    pub fn upgrade_stat(
        &self,
        character_id: &str,
        stat: StatKind,
    ) -> Result<Character, ProgressionError> {
        let mut character = self.store.load(character_id)?;
        self.apply_stat_upgrade(&mut character, stat)?;
        self.persist(&mut character)?;
        Ok(character)
    }

    pub fn apply_stat_upgrade(
        &self,
        character: &mut Character,
        stat: StatKind,
    ) -> Result<u64, ProgressionError> {
        let cost = ledger::stat_upgrade_cost(character, stat);
        let available = character.lumens;
        if !ledger::spend_lumens(character, cost) {
            return Err(ProgressionError::InsufficientFunds {
                needed: cost,
                available,
            });
        }
        *character.stats.get_mut(stat) += 1;
        *character.stat_upgrades.entry(stat).or_insert(0) += 1;
        character.vitals.follow_stat(stat, 1);
        info!(
            "{} upgraded {} to {} for {} lumens",
            character.id,
            stat,
            character.stats.get(stat),
            cost
        );
        Ok(cost)
    }

    /// Reward lumens. Does not count as a refund.
    pub fn grant_lumens(
        &self,
        character_id: &str,
        amount: u64,
    ) -> Result<Character, ProgressionError> {
        let mut character = self.store.load(character_id)?;
        character.lumens = character.lumens.saturating_add(amount);
        self.persist(&mut character)?;
        info!("{} granted {} lumens", character.id, amount);
        Ok(character)
    }

    // ------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------

    pub fn summary(&self, character_id: &str) -> Result<CharacterSummary, ProgressionError> {
        let character = self.store.load(character_id)?;
        Ok(self.summarize(&character))
    }

    pub fn summarize(&self, character: &Character) -> CharacterSummary {
        let tier_points = ledger::tier_points(character, &self.catalog);
        let stat_points = ledger::stat_points(character);
        CharacterSummary {
            id: character.id.clone(),
            name: character.name.clone(),
            kind: character.kind(),
            lumens: character.lumens,
            total_skills_unlocked: character.total_skills_unlocked,
            tier_points,
            stat_points,
            level: ledger::level(tier_points + stat_points),
            investment_value: ledger::current_investment_value(character, &self.catalog),
        }
    }

    fn persist(&self, character: &mut Character) -> Result<(), ProgressionError> {
        character.touch();
        self.store.save(character).inspect_err(|e| {
            warn!("save of character {} failed: {}", character.id, e);
        })
    }
}
