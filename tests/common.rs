//! Test utilities & fixtures.
//! Every engine here runs over the embedded catalogs and a throwaway sled store.

use lumenforge::progression::{
    Character, ProgressionEngine, SledCharacterStore, SledCharacterStoreBuilder,
};
use tempfile::TempDir;

/// Engine over a fresh sled store. Keep the `TempDir` alive for the test.
pub fn engine() -> (TempDir, ProgressionEngine<SledCharacterStore>) {
    let dir = TempDir::new().expect("tempdir");
    let store = SledCharacterStoreBuilder::new(dir.path().join("characters"))
        .open()
        .expect("store");
    let engine = ProgressionEngine::with_standard_data(store).expect("engine");
    (dir, engine)
}

/// Create a character and top up its lumens so long chains are affordable.
#[allow(dead_code)]
pub fn rich_character(
    engine: &ProgressionEngine<SledCharacterStore>,
    name: &str,
    extra_lumens: u64,
) -> Character {
    let character = engine.create_character(name).expect("create");
    engine
        .grant_lumens(&character.id, extra_lumens)
        .expect("grant")
}

/// Unlock each skill in order, panicking on the first failure.
#[allow(dead_code)]
pub fn unlock_all(
    engine: &ProgressionEngine<SledCharacterStore>,
    character_id: &str,
    skills: &[&str],
) -> Character {
    let mut last = engine.load_character(character_id).expect("load");
    for skill in skills {
        last = engine
            .unlock_skill(character_id, skill, false)
            .unwrap_or_else(|e| panic!("unlock {}: {}", skill, e));
    }
    last
}
