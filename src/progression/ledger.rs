//! Lumens bookkeeping and point accounting over a character record.
//!
//! Everything here is a plain function over a `Character` (and the catalog
//! when skill data is needed). Nothing touches the store.

use log::warn;

use crate::progression::catalog::SkillCatalog;
use crate::progression::types::{Character, StatKind};

/// Upper bound (inclusive) of total points for levels 1 through 10.
const LEVEL_THRESHOLDS: [u32; 10] = [2, 5, 9, 14, 20, 27, 35, 44, 54, 65];

/// Points per level once past the table.
const POINTS_PER_HIGH_LEVEL: u32 = 12;

/// Deduct `amount` lumens if the character can afford it.
///
/// Returns false and leaves the character untouched when funds are short.
#[must_use]
pub fn spend_lumens(character: &mut Character, amount: u64) -> bool {
    if character.lumens < amount {
        return false;
    }
    character.lumens -= amount;
    character.total_lumens_spent = character.total_lumens_spent.saturating_add_unsigned(amount);
    true
}

/// Return lumens to the character and take them off the net spend.
pub fn credit_lumens(character: &mut Character, amount: u64) {
    character.lumens = character.lumens.saturating_add(amount);
    character.total_lumens_spent = character.total_lumens_spent.saturating_sub_unsigned(amount);
}

/// Sum of `tier` over every unlocked skill.
pub fn tier_points(character: &Character, catalog: &SkillCatalog) -> u32 {
    character
        .unlocked
        .iter()
        .filter_map(|(_, id)| match catalog.find_skill_by_id(id) {
            Some(skill) => Some(skill.tier),
            None => {
                warn!("character {} holds unknown skill {}", character.id, id);
                None
            }
        })
        .sum()
}

/// Points bought above baseline, summed over all stats. Stats below their
/// baseline contribute nothing.
pub fn stat_points(character: &Character) -> u32 {
    StatKind::ALL
        .into_iter()
        .map(|kind| character.stats.points_above_baseline(kind))
        .sum()
}

/// Character level for a point total (tier points + stat points).
///
/// Levels 1-10 follow a fixed table; from 66 points on every further 12
/// points add one level (66..=77 is level 11, 78..=89 level 12, ...).
pub fn level(total_points: u32) -> u32 {
    if let Some(index) = LEVEL_THRESHOLDS
        .iter()
        .position(|&ceiling| total_points <= ceiling)
    {
        return index as u32 + 1;
    }
    let past_table = total_points - (LEVEL_THRESHOLDS[LEVEL_THRESHOLDS.len() - 1] + 1);
    past_table / POINTS_PER_HIGH_LEVEL + LEVEL_THRESHOLDS.len() as u32 + 1
}

/// Level derived from the character's current tier and stat points.
pub fn character_level(character: &Character, catalog: &SkillCatalog) -> u32 {
    level(tier_points(character, catalog) + stat_points(character))
}

/// Lumens paid for `upgrades` upgrades of one stat: the Nth costs N.
pub fn triangular_cost(upgrades: u32) -> u64 {
    let k = u64::from(upgrades);
    k * (k + 1) / 2
}

/// Price of the next upgrade of `stat`. Counts purchases only, so race
/// modifiers do not move the price.
pub fn stat_upgrade_cost(character: &Character, stat: StatKind) -> u64 {
    u64::from(character.upgrades_bought(stat)) + 1
}

/// Lumens tied up in the character: every unlocked skill's cost plus the
/// triangular cost of each stat's upgrades.
pub fn current_investment_value(character: &Character, catalog: &SkillCatalog) -> u64 {
    let skills: u64 = character
        .unlocked
        .iter()
        .filter_map(|(_, id)| catalog.find_skill_by_id(id))
        .map(|skill| u64::from(skill.cost))
        .sum();
    let stats: u64 = StatKind::ALL
        .into_iter()
        .map(|kind| triangular_cost(character.upgrades_bought(kind)))
        .sum();
    skills + stats
}
