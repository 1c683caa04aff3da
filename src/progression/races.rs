//! Race lookup table: stat modifiers, ability flags, passive traits, and the
//! cross-cultural learning rules for humans.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::progression::errors::ProgressionError;
use crate::progression::types::StatKind;

const STANDARD_RACES_JSON: &str = include_str!("../../data/seeds/races.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceDefinition {
    pub id: String,
    pub name: String,
    /// Additive changes applied once when the race is chosen.
    #[serde(default)]
    pub modifiers: BTreeMap<StatKind, i32>,
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub passive_trait: Option<String>,
}

impl RaceDefinition {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            modifiers: BTreeMap::new(),
            abilities: Vec::new(),
            passive_trait: None,
        }
    }

    pub fn with_modifier(mut self, stat: StatKind, delta: i32) -> Self {
        self.modifiers.insert(stat, delta);
        self
    }

    pub fn with_ability(mut self, ability: &str) -> Self {
        self.abilities.push(ability.to_string());
        self
    }

    pub fn with_passive_trait(mut self, text: &str) -> Self {
        self.passive_trait = Some(text.to_string());
        self
    }
}

#[derive(Debug, Deserialize)]
struct RaceSeed {
    gating_skill: String,
    #[serde(default)]
    cross_cultural_skills: Vec<String>,
    races: Vec<RaceDefinition>,
}

#[derive(Debug, Clone)]
pub struct RaceCatalog {
    races: BTreeMap<String, RaceDefinition>,
    cross_cultural: BTreeSet<String>,
    gating_skill: String,
}

impl RaceCatalog {
    /// Races shipped with the crate (`data/seeds/races.json`).
    pub fn standard() -> Result<Self, ProgressionError> {
        Self::from_json_str(STANDARD_RACES_JSON)
    }

    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<Self, ProgressionError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents).map_err(|e| match e {
            ProgressionError::InvalidCatalog(msg) => {
                ProgressionError::InvalidCatalog(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ProgressionError> {
        let seed: RaceSeed = serde_json::from_str(json)
            .map_err(|e| ProgressionError::InvalidCatalog(e.to_string()))?;
        let mut catalog = Self::new(&seed.gating_skill);
        for race in seed.races {
            if catalog.races.contains_key(&race.id) {
                return Err(ProgressionError::InvalidCatalog(format!(
                    "duplicate race id {}",
                    race.id
                )));
            }
            catalog = catalog.with_race(race);
        }
        for skill_id in seed.cross_cultural_skills {
            catalog = catalog.with_cross_cultural_skill(&skill_id);
        }
        Ok(catalog)
    }

    /// Empty table; `gating_skill` is the skill a human must hold before
    /// learning cross-cultural skills.
    pub fn new(gating_skill: &str) -> Self {
        Self {
            races: BTreeMap::new(),
            cross_cultural: BTreeSet::new(),
            gating_skill: gating_skill.to_string(),
        }
    }

    pub fn with_race(mut self, race: RaceDefinition) -> Self {
        self.races.insert(race.id.clone(), race);
        self
    }

    pub fn with_cross_cultural_skill(mut self, skill_id: &str) -> Self {
        self.cross_cultural.insert(skill_id.to_string());
        self
    }

    pub fn get(&self, race_id: &str) -> Option<&RaceDefinition> {
        self.races.get(race_id)
    }

    pub fn require(&self, race_id: &str) -> Result<&RaceDefinition, ProgressionError> {
        self.get(race_id)
            .ok_or_else(|| ProgressionError::RaceNotFound(race_id.to_string()))
    }

    pub fn races(&self) -> impl Iterator<Item = &RaceDefinition> + '_ {
        self.races.values()
    }

    /// True when `skill_id` is on the allow-list humans may learn from
    /// another race's subtree.
    pub fn is_cross_cultural(&self, skill_id: &str) -> bool {
        self.cross_cultural.contains(skill_id)
    }

    pub fn gating_skill(&self) -> &str {
        &self.gating_skill
    }
}
