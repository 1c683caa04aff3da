//! Read-only registry of skill definitions grouped by category and subcategory.
//!
//! The catalog is loaded once (from the embedded seed file, a JSON file on
//! disk, or the builder in tests) and never mutated afterwards. Besides id
//! lookups it keeps a reverse index from a skill to the skills whose AND/OR
//! lists name it, which drives cascading refunds.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::progression::errors::ProgressionError;
use crate::progression::types::{SkillBucket, SkillCategory, SkillDefinition};

const STANDARD_SKILLS_JSON: &str = include_str!("../../data/seeds/skills.json");

type Tree = BTreeMap<SkillCategory, BTreeMap<String, Vec<SkillDefinition>>>;

#[derive(Debug, Clone)]
struct Location {
    category: SkillCategory,
    subcategory: String,
    position: usize,
}

#[derive(Debug, Clone)]
pub struct SkillCatalog {
    tree: Tree,
    index: HashMap<String, Location>,
    /// skill id -> ids of skills listing it in an AND/OR prerequisite
    dependents: HashMap<String, Vec<String>>,
}

enum Mark {
    Active,
    Done,
}

impl SkillCatalog {
    /// Catalog shipped with the crate (`data/seeds/skills.json`).
    pub fn standard() -> Result<Self, ProgressionError> {
        Self::from_json_str(STANDARD_SKILLS_JSON)
    }

    /// Load a catalog from a JSON file shaped
    /// `{ "<category>": { "<subcategory>": [ <skill>, ... ] } }`.
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
        let raw: BTreeMap<String, BTreeMap<String, Vec<SkillDefinition>>> =
            serde_json::from_str(json)
                .map_err(|e| ProgressionError::InvalidCatalog(e.to_string()))?;

        let mut builder = SkillCatalogBuilder::new();
        for (category_name, subcategories) in raw {
            let category: SkillCategory = category_name.parse()?;
            for (subcategory, skills) in subcategories {
                builder = builder.subcategory(category, &subcategory);
                for skill in skills {
                    builder = builder.skill(category, &subcategory, skill);
                }
            }
        }
        builder.build()
    }

    fn from_tree(tree: Tree) -> Result<Self, ProgressionError> {
        let mut index = HashMap::new();
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();

        for (category, subcategories) in &tree {
            for (subcategory, skills) in subcategories {
                for (position, skill) in skills.iter().enumerate() {
                    if skill.tier == 0 {
                        return Err(ProgressionError::InvalidCatalog(format!(
                            "skill {} has tier 0",
                            skill.id
                        )));
                    }
                    let location = Location {
                        category: *category,
                        subcategory: subcategory.clone(),
                        position,
                    };
                    if index.insert(skill.id.clone(), location).is_some() {
                        return Err(ProgressionError::InvalidCatalog(format!(
                            "duplicate skill id {}",
                            skill.id
                        )));
                    }
                    for required in skill.prerequisite.listed_skills() {
                        let entry = dependents.entry(required.clone()).or_default();
                        if !entry.contains(&skill.id) {
                            entry.push(skill.id.clone());
                        }
                    }
                }
            }
        }

        Ok(Self {
            tree,
            index,
            dependents,
        })
    }

    pub fn find_skill_by_id(&self, skill_id: &str) -> Option<&SkillDefinition> {
        let location = self.index.get(skill_id)?;
        self.tree
            .get(&location.category)?
            .get(&location.subcategory)?
            .get(location.position)
    }

    /// Like [`find_skill_by_id`](Self::find_skill_by_id) but reports unknown ids.
    pub fn require(&self, skill_id: &str) -> Result<&SkillDefinition, ProgressionError> {
        self.find_skill_by_id(skill_id)
            .ok_or_else(|| ProgressionError::SkillNotFound(skill_id.to_string()))
    }

    pub fn category_of(&self, skill_id: &str) -> Option<SkillCategory> {
        self.index.get(skill_id).map(|l| l.category)
    }

    /// Subcategory name, or the owning race id for racial skills.
    pub fn subcategory_of(&self, skill_id: &str) -> Option<&str> {
        self.index.get(skill_id).map(|l| l.subcategory.as_str())
    }

    /// The bucket a skill belongs to by definition.
    pub fn bucket_of(&self, skill_id: &str) -> Option<SkillBucket> {
        self.index
            .get(skill_id)
            .map(|l| SkillBucket::new(l.category, l.subcategory.clone()))
    }

    pub fn contains(&self, skill_id: &str) -> bool {
        self.index.contains_key(skill_id)
    }

    /// Every definition with its category and subcategory, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (SkillCategory, &str, &SkillDefinition)> + '_ {
        self.tree.iter().flat_map(|(category, subcategories)| {
            subcategories.iter().flat_map(move |(subcategory, skills)| {
                skills
                    .iter()
                    .map(move |skill| (*category, subcategory.as_str(), skill))
            })
        })
    }

    pub fn subcategories(
        &self,
        category: SkillCategory,
    ) -> impl Iterator<Item = (&str, &[SkillDefinition])> + '_ {
        self.tree
            .get(&category)
            .into_iter()
            .flat_map(|subs| subs.iter().map(|(k, v)| (k.as_str(), v.as_slice())))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Skills whose AND/OR prerequisite list names `skill_id` directly.
    pub fn direct_dependents(&self, skill_id: &str) -> &[String] {
        self.dependents
            .get(skill_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Transitive dependents of `root`, restricted to skills for which
    /// `include` returns true. Traversal uses an explicit stack; the result
    /// is in post-order, so every skill appears before anything it depends
    /// on. `root` itself is not part of the result.
    ///
    /// Fails with [`ProgressionError::PrerequisiteCycle`] when the walk comes
    /// back to a skill that is still on the current path.
    pub fn walk_dependents<'a, F>(
        &'a self,
        root: &'a str,
        include: F,
    ) -> Result<Vec<String>, ProgressionError>
    where
        F: Fn(&str) -> bool,
    {
        let mut marks: HashMap<&'a str, Mark> = HashMap::new();
        let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];
        let mut order = Vec::new();
        marks.insert(root, Mark::Active);

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            let children = self.direct_dependents(node);
            if next < children.len() {
                frame.1 += 1;
                let child = children[next].as_str();
                if !include(child) {
                    continue;
                }
                match marks.get(child) {
                    Some(Mark::Done) => {}
                    Some(Mark::Active) => {
                        let start = stack
                            .iter()
                            .position(|(id, _)| *id == child)
                            .unwrap_or(0);
                        let mut path: Vec<String> =
                            stack[start..].iter().map(|(id, _)| id.to_string()).collect();
                        path.push(child.to_string());
                        return Err(ProgressionError::PrerequisiteCycle(path));
                    }
                    None => {
                        marks.insert(child, Mark::Active);
                        stack.push((child, 0));
                    }
                }
            } else {
                marks.insert(node, Mark::Done);
                stack.pop();
                if node != root {
                    order.push(node.to_string());
                }
            }
        }

        Ok(order)
    }

    /// Check that every AND/OR prerequisite names a known skill and that the
    /// prerequisite graph has no cycles.
    pub fn validate_references(&self) -> Result<(), ProgressionError> {
        for (_, _, skill) in self.iter() {
            for required in skill.prerequisite.listed_skills() {
                if !self.contains(required) {
                    return Err(ProgressionError::InvalidCatalog(format!(
                        "skill {} requires unknown skill {}",
                        skill.id, required
                    )));
                }
            }
        }
        for (_, _, skill) in self.iter() {
            self.walk_dependents(&skill.id, |_| true)?;
        }
        Ok(())
    }
}

/// Assemble a catalog in code (tests, tools, custom content packs).
#[derive(Debug, Default)]
pub struct SkillCatalogBuilder {
    tree: Tree,
}

impl SkillCatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a (possibly empty) subcategory.
    pub fn subcategory(mut self, category: SkillCategory, subcategory: &str) -> Self {
        self.tree
            .entry(category)
            .or_default()
            .entry(subcategory.to_string())
            .or_default();
        self
    }

    pub fn skill(
        mut self,
        category: SkillCategory,
        subcategory: &str,
        skill: SkillDefinition,
    ) -> Self {
        self.tree
            .entry(category)
            .or_default()
            .entry(subcategory.to_string())
            .or_default()
            .push(skill);
        self
    }

    pub fn build(self) -> Result<SkillCatalog, ProgressionError> {
        SkillCatalog::from_tree(self.tree)
    }
}
