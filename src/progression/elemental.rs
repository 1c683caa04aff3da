use std::collections::HashSet;

use crate::progression::catalog::SkillCatalog;

/// Decides whether a skill is a monster-only elemental affinity skill.
pub trait ElementalClassifier {
    fn is_elemental_affinity_skill(&self, skill_id: &str) -> bool;
}

/// Set-backed classifier. Usually built from the catalog's
/// `elemental_affinity` flags.
#[derive(Debug, Clone, Default)]
pub struct ElementalAffinities {
    ids: HashSet<String>,
}

impl ElementalAffinities {
    pub fn from_catalog(catalog: &SkillCatalog) -> Self {
        Self::from_ids(
            catalog
                .iter()
                .filter(|(_, _, skill)| skill.elemental_affinity)
                .map(|(_, _, skill)| skill.id.clone()),
        )
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl ElementalClassifier for ElementalAffinities {
    fn is_elemental_affinity_skill(&self, skill_id: &str) -> bool {
        self.ids.contains(skill_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_from_standard_catalog() {
        let catalog = SkillCatalog::standard().expect("catalog");
        let affinities = ElementalAffinities::from_catalog(&catalog);
        assert_eq!(affinities.len(), 3);
        assert!(affinities.is_elemental_affinity_skill("fire_affinity"));
        assert!(!affinities.is_elemental_affinity_skill("fire_bolt"));
    }

    #[test]
    fn explicit_ids() {
        let affinities = ElementalAffinities::from_ids(["venom_affinity"]);
        assert!(affinities.is_elemental_affinity_skill("venom_affinity"));
        assert!(!ElementalAffinities::default().is_elemental_affinity_skill("venom_affinity"));
    }
}
