use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sled::IVec;

use crate::progression::errors::ProgressionError;
use crate::progression::types::{Character, CHARACTER_SCHEMA_VERSION};

const DEFAULT_TREE: &str = "characters";
const KEY_PREFIX: &str = "characters:";

/// Single-key persistence for character records.
///
/// Each call is an independent read or write; the engine never needs a
/// multi-key transaction.
pub trait CharacterStore {
    /// Fetch a character, or `CharacterNotFound`.
    fn load(&self, character_id: &str) -> Result<Character, ProgressionError>;

    /// Insert or replace a character record.
    fn save(&self, character: &Character) -> Result<(), ProgressionError>;

    /// Remove a character, or `CharacterNotFound` when nothing was stored.
    fn delete(&self, character_id: &str) -> Result<(), ProgressionError>;

    /// Ids of every stored character.
    fn list_ids(&self) -> Result<Vec<String>, ProgressionError>;
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct SledCharacterStoreBuilder {
    path: PathBuf,
    tree: String,
}

impl SledCharacterStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tree: DEFAULT_TREE.to_string(),
        }
    }

    /// Keep characters in a differently named sled tree (several rosters in
    /// one database).
    pub fn tree(mut self, name: &str) -> Self {
        self.tree = name.to_string();
        self
    }

    pub fn open(self) -> Result<SledCharacterStore, ProgressionError> {
        SledCharacterStore::open_with_tree(self.path, &self.tree)
    }
}

/// Sled-backed character persistence. Records are bincode-encoded and every
/// write is flushed before returning.
pub struct SledCharacterStore {
    _db: sled::Db,
    characters: sled::Tree,
}

impl SledCharacterStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ProgressionError> {
        Self::open_with_tree(path, DEFAULT_TREE)
    }

    fn open_with_tree<P: AsRef<Path>>(path: P, tree: &str) -> Result<Self, ProgressionError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let characters = db.open_tree(tree)?;
        Ok(Self {
            _db: db,
            characters,
        })
    }

    fn character_key(character_id: &str) -> Vec<u8> {
        format!("{}{}", KEY_PREFIX, character_id).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, ProgressionError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, ProgressionError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }
}

impl CharacterStore for SledCharacterStore {
    fn load(&self, character_id: &str) -> Result<Character, ProgressionError> {
        let key = Self::character_key(character_id);
        let Some(bytes) = self.characters.get(&key)? else {
            return Err(ProgressionError::CharacterNotFound(character_id.to_string()));
        };
        let record: Character = Self::deserialize(bytes)?;
        if record.schema_version != CHARACTER_SCHEMA_VERSION {
            return Err(ProgressionError::SchemaMismatch {
                entity: "character",
                expected: CHARACTER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    fn save(&self, character: &Character) -> Result<(), ProgressionError> {
        let key = Self::character_key(&character.id);
        let bytes = Self::serialize(character)?;
        self.characters.insert(key, bytes)?;
        self.characters.flush()?;
        Ok(())
    }

    fn delete(&self, character_id: &str) -> Result<(), ProgressionError> {
        let key = Self::character_key(character_id);
        if self.characters.remove(key)?.is_none() {
            return Err(ProgressionError::CharacterNotFound(character_id.to_string()));
        }
        self.characters.flush()?;
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<String>, ProgressionError> {
        let mut ids = Vec::new();
        for entry in self.characters.scan_prefix(KEY_PREFIX.as_bytes()) {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(id) = text.strip_prefix(KEY_PREFIX) {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }
}

/// In-process store for tests and tooling. Nothing survives the process.
#[derive(Default)]
pub struct MemoryCharacterStore {
    records: Mutex<HashMap<String, Character>>,
}

impl MemoryCharacterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Character>>, ProgressionError> {
        self.records
            .lock()
            .map_err(|_| ProgressionError::Storage("memory store lock poisoned".to_string()))
    }
}

impl CharacterStore for MemoryCharacterStore {
    fn load(&self, character_id: &str) -> Result<Character, ProgressionError> {
        self.records()?
            .get(character_id)
            .cloned()
            .ok_or_else(|| ProgressionError::CharacterNotFound(character_id.to_string()))
    }

    fn save(&self, character: &Character) -> Result<(), ProgressionError> {
        self.records()?
            .insert(character.id.clone(), character.clone());
        Ok(())
    }

    fn delete(&self, character_id: &str) -> Result<(), ProgressionError> {
        self.records()?
            .remove(character_id)
            .map(|_| ())
            .ok_or_else(|| ProgressionError::CharacterNotFound(character_id.to_string()))
    }

    fn list_ids(&self) -> Result<Vec<String>, ProgressionError> {
        let mut ids: Vec<String> = self.records()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
