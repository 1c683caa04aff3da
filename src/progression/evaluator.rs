//! Unlock eligibility: character-type gates plus prerequisite expressions.

use std::collections::HashSet;

use log::debug;

use crate::progression::catalog::SkillCatalog;
use crate::progression::elemental::ElementalClassifier;
use crate::progression::errors::ProgressionError;
use crate::progression::races::RaceCatalog;
use crate::progression::types::{
    Character, Prerequisite, SkillBucket, SkillCategory, SkillDefinition, HUMAN_RACE,
};

/// Any one of these satisfies the weapon half of `OR_WEAPON_MASTERY_AND_DARKNESS`.
pub const WEAPON_MASTERY_SKILLS: [&str; 6] = [
    "sword_mastery",
    "axe_mastery",
    "bow_mastery",
    "dagger_mastery",
    "spear_mastery",
    "staff_mastery",
];

pub const DARKNESS_MASTERY: &str = "darkness_mastery";

/// All five are required by `ALL_LIGHT_MAGIC`.
pub const LIGHT_MAGIC_SKILLS: [&str; 5] = [
    "light_bolt",
    "healing_light",
    "radiant_shield",
    "purify",
    "holy_nova",
];

pub const TIER5_MAGIC_MASTERIES: [&str; 8] = [
    "fire_mastery",
    "water_mastery",
    "earth_mastery",
    "wind_mastery",
    "lightning_mastery",
    "ice_mastery",
    "light_mastery",
    "darkness_mastery",
];

/// How many of [`TIER5_MAGIC_MASTERIES`] `THREE_TIER5_MAGIC` needs.
pub const TIER5_MASTERIES_REQUIRED: usize = 3;

/// Evaluate a prerequisite expression against a flattened set of unlocked
/// skill ids. `Unknown` expressions are never satisfied.
pub fn evaluate(prerequisite: &Prerequisite, unlocked: &HashSet<&str>) -> bool {
    match prerequisite {
        Prerequisite::None => true,
        Prerequisite::And(ids) => ids.iter().all(|id| unlocked.contains(id.as_str())),
        Prerequisite::Or(ids) => ids.iter().any(|id| unlocked.contains(id.as_str())),
        Prerequisite::OrWeaponMasteryAndDarkness => {
            WEAPON_MASTERY_SKILLS.iter().any(|id| unlocked.contains(id))
                && unlocked.contains(DARKNESS_MASTERY)
        }
        Prerequisite::AllLightMagic => LIGHT_MAGIC_SKILLS.iter().all(|id| unlocked.contains(id)),
        Prerequisite::ThreeTier5Magic => {
            TIER5_MAGIC_MASTERIES
                .iter()
                .filter(|id| unlocked.contains(*id))
                .count()
                >= TIER5_MASTERIES_REQUIRED
        }
        Prerequisite::Unknown => false,
    }
}

/// Read-only view over the collaborators needed to judge an unlock.
pub struct PrerequisiteEvaluator<'a> {
    catalog: &'a SkillCatalog,
    races: &'a RaceCatalog,
    elemental: &'a dyn ElementalClassifier,
}

impl<'a> PrerequisiteEvaluator<'a> {
    pub fn new(
        catalog: &'a SkillCatalog,
        races: &'a RaceCatalog,
        elemental: &'a dyn ElementalClassifier,
    ) -> Self {
        Self {
            catalog,
            races,
            elemental,
        }
    }

    /// Whether `character` may unlock `skill_id` right now.
    ///
    /// `dev_mode` skips the character-type gates; the prerequisite expression
    /// is still evaluated. Fails only for unknown skill ids.
    pub fn can_unlock(
        &self,
        character: &Character,
        skill_id: &str,
        dev_mode: bool,
    ) -> Result<bool, ProgressionError> {
        let skill = self.catalog.require(skill_id)?;
        let bucket = self.definitional_bucket(skill_id)?;

        if !dev_mode && !self.passes_type_gates(character, skill, &bucket) {
            return Ok(false);
        }

        let unlocked = character.unlocked.all_ids();
        let satisfied = evaluate(&skill.prerequisite, &unlocked);
        if !satisfied {
            debug!(
                "{}: prerequisite {:?} not satisfied for {}",
                character.id, skill.prerequisite, skill_id
            );
        }
        Ok(satisfied)
    }

    /// Monster/humanoid and race gates.
    pub fn passes_type_gates(
        &self,
        character: &Character,
        skill: &SkillDefinition,
        bucket: &SkillBucket,
    ) -> bool {
        if character.is_monster && bucket.category() == SkillCategory::Profession {
            debug!("{}: monsters cannot learn profession skill {}", character.id, skill.id);
            return false;
        }

        if !character.is_monster && self.elemental.is_elemental_affinity_skill(&skill.id) {
            debug!(
                "{}: elemental affinity {} is monster-only",
                character.id, skill.id
            );
            return false;
        }

        if let SkillBucket::Racial(owner) = bucket {
            let allowed = match character.race.as_deref() {
                None => false,
                Some(race) if race == owner => true,
                Some(HUMAN_RACE) => self.qualifies_for_cross_cultural(character, skill, bucket),
                Some(_) => false,
            };
            if !allowed {
                debug!(
                    "{}: racial skill {} ({}) not available to race {:?}",
                    character.id, skill.id, owner, character.race
                );
            }
            return allowed;
        }

        true
    }

    /// A human who already holds the gating skill may learn allow-listed
    /// tier-1 skills from other races' subtrees.
    pub fn qualifies_for_cross_cultural(
        &self,
        character: &Character,
        skill: &SkillDefinition,
        bucket: &SkillBucket,
    ) -> bool {
        let foreign_racial = matches!(bucket, SkillBucket::Racial(owner) if owner != HUMAN_RACE);
        character.is_race(HUMAN_RACE)
            && foreign_racial
            && skill.tier == 1
            && self.races.is_cross_cultural(&skill.id)
            && character.has_skill(self.races.gating_skill())
    }

    /// Bucket an unlock of `skill_id` should be recorded in. Cross-cultural
    /// skills learned by humans go to the human racial bucket; everything
    /// else goes to the skill's own category/subcategory.
    pub fn storage_bucket(
        &self,
        character: &Character,
        skill_id: &str,
    ) -> Result<SkillBucket, ProgressionError> {
        let skill = self.catalog.require(skill_id)?;
        let bucket = self.definitional_bucket(skill_id)?;
        if self.qualifies_for_cross_cultural(character, skill, &bucket) {
            return Ok(SkillBucket::Racial(HUMAN_RACE.to_string()));
        }
        Ok(bucket)
    }

    fn definitional_bucket(&self, skill_id: &str) -> Result<SkillBucket, ProgressionError> {
        self.catalog
            .bucket_of(skill_id)
            .ok_or_else(|| ProgressionError::SkillNotFound(skill_id.to_string()))
    }
}
