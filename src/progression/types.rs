use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::progression::errors::ProgressionError;
use crate::validation::validate_character_name;

pub const CHARACTER_SCHEMA_VERSION: u8 = 2;

pub const STARTING_LUMENS: u64 = 150;
pub const STARTING_GIL: u64 = 65;

/// Race id of the only race allowed to learn from other races' subtrees.
pub const HUMAN_RACE: &str = "human";

// ============================================================================
// Stats
// ============================================================================

/// The fixed set of named character stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKind {
    Hp,
    Stamina,
    Strength,
    MagicPower,
    Accuracy,
    Speed,
    PhysicalDefence,
    MagicalDefence,
}

impl StatKind {
    pub const ALL: [StatKind; 8] = [
        StatKind::Hp,
        StatKind::Stamina,
        StatKind::Strength,
        StatKind::MagicPower,
        StatKind::Accuracy,
        StatKind::Speed,
        StatKind::PhysicalDefence,
        StatKind::MagicalDefence,
    ];

    /// Starting value of the stat; stat points are counted upward from here.
    pub fn baseline(self) -> i32 {
        match self {
            StatKind::Hp => 10,
            StatKind::Stamina => 10,
            StatKind::Strength => -3,
            StatKind::MagicPower => -3,
            StatKind::Accuracy => -3,
            StatKind::Speed => 2,
            StatKind::PhysicalDefence => 8,
            StatKind::MagicalDefence => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatKind::Hp => "hp",
            StatKind::Stamina => "stamina",
            StatKind::Strength => "strength",
            StatKind::MagicPower => "magicPower",
            StatKind::Accuracy => "accuracy",
            StatKind::Speed => "speed",
            StatKind::PhysicalDefence => "physicalDefence",
            StatKind::MagicalDefence => "magicalDefence",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatKind {
    type Err = ProgressionError;

    /// Accepts the camelCase names as well as snake_case and any letter case
    /// ("magicPower", "magic_power", "MAGICPOWER").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        StatKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| ProgressionError::Validation(format!("unknown stat: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub hp: i32,
    pub stamina: i32,
    pub strength: i32,
    pub magic_power: i32,
    pub accuracy: i32,
    pub speed: i32,
    pub physical_defence: i32,
    pub magical_defence: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            hp: StatKind::Hp.baseline(),
            stamina: StatKind::Stamina.baseline(),
            strength: StatKind::Strength.baseline(),
            magic_power: StatKind::MagicPower.baseline(),
            accuracy: StatKind::Accuracy.baseline(),
            speed: StatKind::Speed.baseline(),
            physical_defence: StatKind::PhysicalDefence.baseline(),
            magical_defence: StatKind::MagicalDefence.baseline(),
        }
    }
}

impl Stats {
    pub fn get(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Hp => self.hp,
            StatKind::Stamina => self.stamina,
            StatKind::Strength => self.strength,
            StatKind::MagicPower => self.magic_power,
            StatKind::Accuracy => self.accuracy,
            StatKind::Speed => self.speed,
            StatKind::PhysicalDefence => self.physical_defence,
            StatKind::MagicalDefence => self.magical_defence,
        }
    }

    pub fn get_mut(&mut self, kind: StatKind) -> &mut i32 {
        match kind {
            StatKind::Hp => &mut self.hp,
            StatKind::Stamina => &mut self.stamina,
            StatKind::Strength => &mut self.strength,
            StatKind::MagicPower => &mut self.magic_power,
            StatKind::Accuracy => &mut self.accuracy,
            StatKind::Speed => &mut self.speed,
            StatKind::PhysicalDefence => &mut self.physical_defence,
            StatKind::MagicalDefence => &mut self.magical_defence,
        }
    }

    /// Upgrades bought above baseline for one stat. Never negative.
    pub fn points_above_baseline(&self, kind: StatKind) -> u32 {
        let above = self.get(kind) - kind.baseline();
        above.max(0) as u32
    }
}

/// Current and maximum pools that track the hp/stamina stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    pub current_hp: i32,
    pub max_hp: i32,
    pub current_stamina: i32,
    pub max_stamina: i32,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            current_hp: StatKind::Hp.baseline(),
            max_hp: StatKind::Hp.baseline(),
            current_stamina: StatKind::Stamina.baseline(),
            max_stamina: StatKind::Stamina.baseline(),
        }
    }
}

impl Vitals {
    /// Shift max and current pool by `delta` when the matching stat moves.
    /// Other stats have no pool and are ignored.
    pub fn follow_stat(&mut self, kind: StatKind, delta: i32) {
        match kind {
            StatKind::Hp => {
                self.max_hp += delta;
                self.current_hp = (self.current_hp + delta).max(0);
            }
            StatKind::Stamina => {
                self.max_stamina += delta;
                self.current_stamina = (self.current_stamina + delta).max(0);
            }
            _ => {}
        }
    }
}

// ============================================================================
// Skill categories and unlocked skill buckets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Weapon,
    Magic,
    Profession,
    Monster,
    Fusion,
    Ultimate,
    Racial,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 7] = [
        SkillCategory::Weapon,
        SkillCategory::Magic,
        SkillCategory::Profession,
        SkillCategory::Monster,
        SkillCategory::Fusion,
        SkillCategory::Ultimate,
        SkillCategory::Racial,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SkillCategory::Weapon => "weapon",
            SkillCategory::Magic => "magic",
            SkillCategory::Profession => "profession",
            SkillCategory::Monster => "monster",
            SkillCategory::Fusion => "fusion",
            SkillCategory::Ultimate => "ultimate",
            SkillCategory::Racial => "racial",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillCategory {
    type Err = ProgressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        SkillCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| ProgressionError::InvalidCatalog(format!("unknown category: {}", s)))
    }
}

/// Where an unlocked skill id lives. Racial buckets are keyed by race id,
/// every other category by its subcategory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillBucket {
    Weapon(String),
    Magic(String),
    Profession(String),
    Monster(String),
    Fusion(String),
    Ultimate(String),
    Racial(String),
}

impl SkillBucket {
    pub fn new(category: SkillCategory, key: impl Into<String>) -> Self {
        let key = key.into();
        match category {
            SkillCategory::Weapon => SkillBucket::Weapon(key),
            SkillCategory::Magic => SkillBucket::Magic(key),
            SkillCategory::Profession => SkillBucket::Profession(key),
            SkillCategory::Monster => SkillBucket::Monster(key),
            SkillCategory::Fusion => SkillBucket::Fusion(key),
            SkillCategory::Ultimate => SkillBucket::Ultimate(key),
            SkillCategory::Racial => SkillBucket::Racial(key),
        }
    }

    pub fn category(&self) -> SkillCategory {
        match self {
            SkillBucket::Weapon(_) => SkillCategory::Weapon,
            SkillBucket::Magic(_) => SkillCategory::Magic,
            SkillBucket::Profession(_) => SkillCategory::Profession,
            SkillBucket::Monster(_) => SkillCategory::Monster,
            SkillBucket::Fusion(_) => SkillCategory::Fusion,
            SkillBucket::Ultimate(_) => SkillCategory::Ultimate,
            SkillBucket::Racial(_) => SkillCategory::Racial,
        }
    }

    /// Subcategory name, or the race id for racial buckets.
    pub fn key(&self) -> &str {
        match self {
            SkillBucket::Weapon(k)
            | SkillBucket::Magic(k)
            | SkillBucket::Profession(k)
            | SkillBucket::Monster(k)
            | SkillBucket::Fusion(k)
            | SkillBucket::Ultimate(k)
            | SkillBucket::Racial(k) => k,
        }
    }
}

impl fmt::Display for SkillBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category(), self.key())
    }
}

/// The character's unlocked skill ids grouped by bucket. A skill id is held
/// in at most one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedSkills {
    buckets: BTreeMap<SkillBucket, BTreeSet<String>>,
}

impl UnlockedSkills {
    pub fn contains(&self, skill_id: &str) -> bool {
        self.bucket_of(skill_id).is_some()
    }

    pub fn bucket_of(&self, skill_id: &str) -> Option<&SkillBucket> {
        self.buckets
            .iter()
            .find(|(_, ids)| ids.contains(skill_id))
            .map(|(bucket, _)| bucket)
    }

    pub fn bucket(&self, bucket: &SkillBucket) -> Option<&BTreeSet<String>> {
        self.buckets.get(bucket)
    }

    /// Insert `skill_id` into `bucket`. Returns false (and changes nothing)
    /// when the id is already present anywhere.
    pub fn insert(&mut self, bucket: SkillBucket, skill_id: &str) -> bool {
        if self.contains(skill_id) {
            return false;
        }
        self.buckets
            .entry(bucket)
            .or_default()
            .insert(skill_id.to_string())
    }

    /// Remove `skill_id` from whichever bucket holds it. Empty buckets are kept.
    pub fn remove(&mut self, skill_id: &str) -> Option<SkillBucket> {
        let bucket = self.bucket_of(skill_id)?.clone();
        if let Some(ids) = self.buckets.get_mut(&bucket) {
            ids.remove(skill_id);
        }
        Some(bucket)
    }

    /// Make sure an (possibly empty) bucket exists.
    pub fn ensure_bucket(&mut self, bucket: SkillBucket) {
        self.buckets.entry(bucket).or_default();
    }

    /// Every unlocked id, flattened across all categories.
    pub fn all_ids(&self) -> HashSet<&str> {
        self.buckets
            .values()
            .flat_map(|ids| ids.iter().map(String::as_str))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SkillBucket, &str)> + '_ {
        self.buckets
            .iter()
            .flat_map(|(bucket, ids)| ids.iter().map(move |id| (bucket, id.as_str())))
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&SkillBucket, &BTreeSet<String>)> + '_ {
        self.buckets.iter()
    }

    /// Ids held in any bucket of `category`.
    pub fn ids_in_category(&self, category: SkillCategory) -> Vec<String> {
        self.iter()
            .filter(|(bucket, _)| bucket.category() == category)
            .map(|(_, id)| id.to_string())
            .collect()
    }

    /// Drop every bucket of `category`.
    pub fn clear_category(&mut self, category: SkillCategory) {
        self.buckets.retain(|bucket, _| bucket.category() != category);
    }

    /// Replace all racial buckets with a single empty bucket for `race`.
    pub fn reset_racial(&mut self, race: &str) {
        self.clear_category(SkillCategory::Racial);
        self.ensure_bucket(SkillBucket::Racial(race.to_string()));
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Character record
// ============================================================================

/// Character type/race axis. Derived from `race` and `is_monster`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacterKind {
    Unset,
    Humanoid(String),
    Monster,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    /// Set once, never changed afterwards. Always `None` for monsters.
    pub race: Option<String>,
    pub is_monster: bool,
    pub lumens: u64,
    pub gil: u64,
    pub stats: Stats,
    /// Upgrades bought per stat. Race modifiers are not purchases and never
    /// show up here.
    #[serde(default)]
    pub stat_upgrades: BTreeMap<StatKind, u32>,
    #[serde(default)]
    pub vitals: Vitals,
    pub unlocked: UnlockedSkills,
    /// Mirrors `unlocked.len()`.
    pub total_skills_unlocked: u32,
    /// Net lumens spent: purchases minus refunds.
    pub total_lumens_spent: i64,
    /// Ability flags granted by race.
    #[serde(default)]
    pub abilities: BTreeSet<String>,
    #[serde(default)]
    pub passive_trait: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl Character {
    /// Build a fresh character with the documented defaults. Fails when the
    /// name is empty or otherwise invalid. Nothing is persisted.
    pub fn create(name: &str) -> Result<Self, ProgressionError> {
        let name = validate_character_name(name)
            .map_err(|e| ProgressionError::Validation(e.to_string()))?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            race: None,
            is_monster: false,
            lumens: STARTING_LUMENS,
            gil: STARTING_GIL,
            stats: Stats::default(),
            stat_upgrades: BTreeMap::new(),
            vitals: Vitals::default(),
            unlocked: UnlockedSkills::default(),
            total_skills_unlocked: 0,
            total_lumens_spent: 0,
            abilities: BTreeSet::new(),
            passive_trait: None,
            created_at: now,
            updated_at: now,
            schema_version: CHARACTER_SCHEMA_VERSION,
        })
    }

    pub fn kind(&self) -> CharacterKind {
        if self.is_monster {
            return CharacterKind::Monster;
        }
        match &self.race {
            Some(race) => CharacterKind::Humanoid(race.clone()),
            None => CharacterKind::Unset,
        }
    }

    pub fn has_skill(&self, skill_id: &str) -> bool {
        self.unlocked.contains(skill_id)
    }

    pub fn is_race(&self, race: &str) -> bool {
        self.race.as_deref() == Some(race)
    }

    /// True when the skill counter agrees with the unlocked buckets.
    pub fn skill_count_consistent(&self) -> bool {
        self.total_skills_unlocked as usize == self.unlocked.len()
    }

    /// Number of upgrades bought for `stat`.
    pub fn upgrades_bought(&self, stat: StatKind) -> u32 {
        self.stat_upgrades.get(&stat).copied().unwrap_or(0)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ============================================================================
// Skill definitions
// ============================================================================

/// Prerequisite expression attached to a skill definition.
///
/// Serialized as `{"type": "AND", "skills": ["a", "b"]}`. Any `type` not
/// listed here deserializes to `Unknown`, which never evaluates true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "skills", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Prerequisite {
    #[default]
    None,
    And(Vec<String>),
    Or(Vec<String>),
    OrWeaponMasteryAndDarkness,
    AllLightMagic,
    ThreeTier5Magic,
    #[serde(other)]
    Unknown,
}

impl Prerequisite {
    /// Skill ids named explicitly by an AND/OR list. Composite predicates
    /// return an empty slice.
    pub fn listed_skills(&self) -> &[String] {
        match self {
            Prerequisite::And(ids) | Prerequisite::Or(ids) => ids,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: String,
    pub name: String,
    /// Price in lumens.
    pub cost: u32,
    /// Contributes to tier points. Always >= 1.
    pub tier: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prerequisite: Prerequisite,
    /// Monster-only elemental affinity skill.
    #[serde(default)]
    pub elemental_affinity: bool,
}

impl SkillDefinition {
    pub fn new(id: &str, name: &str, cost: u32, tier: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            cost,
            tier,
            description: String::new(),
            prerequisite: Prerequisite::None,
            elemental_affinity: false,
        }
    }

    pub fn with_prerequisite(mut self, prerequisite: Prerequisite) -> Self {
        self.prerequisite = prerequisite;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn as_elemental_affinity(mut self) -> Self {
        self.elemental_affinity = true;
        self
    }

    /// Lumens returned by a voluntary refund: 75% of cost, rounded up.
    pub fn refund_value(&self) -> u64 {
        (u64::from(self.cost) * 3).div_ceil(4)
    }
}

// ============================================================================
// Operation results
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RefundOutcome {
    pub character: Character,
    /// Dependents first (deepest first), the requested skill last.
    pub refunded_skill_ids: Vec<String>,
    pub total_refund: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterSummary {
    pub id: String,
    pub name: String,
    pub kind: CharacterKind,
    pub lumens: u64,
    pub total_skills_unlocked: u32,
    pub tier_points: u32,
    pub stat_points: u32,
    pub level: u32,
    pub investment_value: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_character_has_documented_defaults() {
        let c = Character::create("  Aria ").expect("create");
        assert_eq!(c.name, "Aria");
        assert_eq!(c.lumens, 150);
        assert_eq!(c.gil, 65);
        assert_eq!(c.stats.hp, 10);
        assert_eq!(c.stats.stamina, 10);
        assert_eq!(c.stats.strength, -3);
        assert_eq!(c.stats.magic_power, -3);
        assert_eq!(c.stats.accuracy, -3);
        assert_eq!(c.stats.speed, 2);
        assert_eq!(c.stats.physical_defence, 8);
        assert_eq!(c.stats.magical_defence, 8);
        assert!(!c.is_monster);
        assert_eq!(c.race, None);
        assert!(c.unlocked.is_empty());
        assert_eq!(c.total_skills_unlocked, 0);
        assert_eq!(c.total_lumens_spent, 0);
        assert_eq!(c.kind(), CharacterKind::Unset);
    }

    #[test]
    fn blank_names_are_rejected() {
        for name in ["", "   ", "\t\n"] {
            match Character::create(name) {
                Err(ProgressionError::Validation(_)) => {}
                other => panic!("expected validation error for {:?}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn unlocked_skills_never_hold_duplicates() {
        let mut unlocked = UnlockedSkills::default();
        assert!(unlocked.insert(SkillBucket::Weapon("sword".into()), "sword_basics"));
        assert!(!unlocked.insert(SkillBucket::Magic("fire".into()), "sword_basics"));
        assert_eq!(unlocked.len(), 1);
        assert_eq!(
            unlocked.bucket_of("sword_basics"),
            Some(&SkillBucket::Weapon("sword".into()))
        );
        assert_eq!(
            unlocked.remove("sword_basics"),
            Some(SkillBucket::Weapon("sword".into()))
        );
        assert!(unlocked.is_empty());
        assert!(unlocked
            .bucket(&SkillBucket::Weapon("sword".into()))
            .is_some());
    }

    #[test]
    fn reset_racial_keeps_other_categories() {
        let mut unlocked = UnlockedSkills::default();
        unlocked.insert(SkillBucket::Racial("elf".into()), "elven_grace");
        unlocked.insert(SkillBucket::Weapon("bow".into()), "bow_basics");
        unlocked.reset_racial("dwarf");
        assert!(!unlocked.contains("elven_grace"));
        assert!(unlocked.contains("bow_basics"));
        assert!(unlocked.bucket(&SkillBucket::Racial("dwarf".into())).is_some());
        assert!(unlocked.bucket(&SkillBucket::Racial("elf".into())).is_none());
    }

    #[test]
    fn stat_names_parse_loosely() {
        assert_eq!("magicPower".parse::<StatKind>().unwrap(), StatKind::MagicPower);
        assert_eq!("magic_power".parse::<StatKind>().unwrap(), StatKind::MagicPower);
        assert_eq!("HP".parse::<StatKind>().unwrap(), StatKind::Hp);
        assert!("luck".parse::<StatKind>().is_err());
    }

    #[test]
    fn refund_value_rounds_up() {
        assert_eq!(SkillDefinition::new("a", "A", 10, 1).refund_value(), 8);
        assert_eq!(SkillDefinition::new("b", "B", 15, 1).refund_value(), 12);
        assert_eq!(SkillDefinition::new("c", "C", 20, 1).refund_value(), 15);
        assert_eq!(SkillDefinition::new("d", "D", 1, 1).refund_value(), 1);
        assert_eq!(SkillDefinition::new("e", "E", 0, 1).refund_value(), 0);
    }

    #[test]
    fn prerequisite_json_shape() {
        let and: Prerequisite =
            serde_json::from_str(r#"{"type":"AND","skills":["a","b"]}"#).unwrap();
        assert_eq!(and, Prerequisite::And(vec!["a".into(), "b".into()]));
        let none: Prerequisite = serde_json::from_str(r#"{"type":"NONE"}"#).unwrap();
        assert_eq!(none, Prerequisite::None);
        let tier5: Prerequisite = serde_json::from_str(r#"{"type":"THREE_TIER5_MAGIC"}"#).unwrap();
        assert_eq!(tier5, Prerequisite::ThreeTier5Magic);
        let unknown: Prerequisite = serde_json::from_str(r#"{"type":"XOR"}"#).unwrap();
        assert_eq!(unknown, Prerequisite::Unknown);
    }
}
