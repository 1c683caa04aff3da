//! Unlocking skills against the embedded catalog.
mod common;

use lumenforge::progression::{ProgressionError, SkillBucket};

#[test]
fn unlock_persists_spend_and_bucket() {
    let (_dir, engine) = common::engine();
    let hero = engine.create_character("Aria").expect("create");

    let updated = engine
        .unlock_skill(&hero.id, "sword_basics", false)
        .expect("unlock");
    assert_eq!(updated.lumens, 140);
    assert_eq!(updated.total_lumens_spent, 10);
    assert_eq!(updated.total_skills_unlocked, 1);

    let stored = engine.load_character(&hero.id).expect("load");
    assert_eq!(
        stored.unlocked.bucket_of("sword_basics"),
        Some(&SkillBucket::Weapon("sword".into()))
    );
    assert!(stored.skill_count_consistent());
}

#[test]
fn and_prerequisites_gate_the_chain() {
    let (_dir, engine) = common::engine();
    let hero = engine.create_character("Chain").expect("create");

    assert!(matches!(
        engine.unlock_skill(&hero.id, "riposte", false),
        Err(ProgressionError::PrerequisitesNotMet(id)) if id == "riposte"
    ));
    let hero = common::unlock_all(&engine, &hero.id, &["sword_basics", "riposte"]);
    assert_eq!(hero.lumens, 150 - 10 - 25);
    assert!(engine
        .can_unlock(&hero.id, "sword_mastery", false)
        .expect("can_unlock"));
}

#[test]
fn or_prerequisite_accepts_either_branch() {
    let (_dir, engine) = common::engine();
    let hero = common::rich_character(&engine, "Mage", 100);
    assert!(!engine
        .can_unlock(&hero.id, "staff_mastery", false)
        .expect("can_unlock"));
    engine
        .unlock_skill(&hero.id, "light_bolt", false)
        .expect("light_bolt");
    assert!(engine
        .can_unlock(&hero.id, "staff_mastery", false)
        .expect("can_unlock"));
    engine
        .unlock_skill(&hero.id, "staff_mastery", false)
        .expect("staff_mastery via light_bolt");
}

#[test]
fn failed_unlocks_leave_the_record_alone() {
    let (_dir, engine) = common::engine();
    let hero = engine.create_character("Unchanged").expect("create");
    let before = engine.load_character(&hero.id).expect("load");

    assert!(matches!(
        engine.unlock_skill(&hero.id, "no_such_skill", false),
        Err(ProgressionError::SkillNotFound(_))
    ));
    assert!(matches!(
        engine.unlock_skill(&hero.id, "light_mastery", false),
        Err(ProgressionError::PrerequisitesNotMet(_))
    ));
    assert!(matches!(
        engine.unlock_skill("missing-character", "sword_basics", false),
        Err(ProgressionError::CharacterNotFound(_))
    ));

    assert_eq!(engine.load_character(&hero.id).expect("load"), before);
}

#[test]
fn second_unlock_is_rejected() {
    let (_dir, engine) = common::engine();
    let hero = engine.create_character("Twice").expect("create");
    engine
        .unlock_skill(&hero.id, "fire_bolt", false)
        .expect("first");
    assert!(matches!(
        engine.unlock_skill(&hero.id, "fire_bolt", false),
        Err(ProgressionError::AlreadyUnlocked(id)) if id == "fire_bolt"
    ));
    assert_eq!(engine.load_character(&hero.id).expect("load").lumens, 135);
}

#[test]
fn insufficient_funds_reports_amounts() {
    let (_dir, engine) = common::engine();
    let hero = engine.create_character("Broke").expect("create");
    // 15 + 35 + 10 + 25 spent, 65 left for a 90-cost mastery
    let hero = common::unlock_all(
        &engine,
        &hero.id,
        &["fire_bolt", "fireball", "sword_basics", "riposte"],
    );
    assert_eq!(hero.lumens, 65);

    match engine.unlock_skill(&hero.id, "fire_mastery", false) {
        Err(ProgressionError::InsufficientFunds { needed, available }) => {
            assert_eq!(needed, 90);
            assert_eq!(available, 65);
        }
        other => panic!("expected insufficient funds, got {:?}", other),
    }
    let stored = engine.load_character(&hero.id).expect("load");
    assert_eq!(stored.lumens, 65);
    assert!(!stored.has_skill("fire_mastery"));
}

#[test]
fn dev_mode_skips_eligibility_only() {
    let (_dir, engine) = common::engine();
    let hero = engine.create_character("Tester").expect("create");

    let updated = engine
        .unlock_skill(&hero.id, "sword_mastery", true)
        .expect("dev unlock");
    assert!(updated.has_skill("sword_mastery"));
    assert_eq!(updated.lumens, 105);

    // Monster-only elemental skill, no monster status.
    engine
        .unlock_skill(&hero.id, "fire_affinity", true)
        .expect("dev unlock affinity");

    // Still costs lumens.
    assert!(matches!(
        engine.unlock_skill(&hero.id, "dawnbringer", true),
        Err(ProgressionError::InsufficientFunds { needed: 150, .. })
    ));
}

#[test]
fn special_prerequisites_use_named_rules() {
    let (_dir, engine) = common::engine();
    let hero = common::rich_character(&engine, "Shade", 2_000);

    assert!(!engine
        .can_unlock(&hero.id, "shadow_edge", false)
        .expect("can_unlock"));
    common::unlock_all(
        &engine,
        &hero.id,
        &["dagger_basics", "backstab", "dagger_mastery", "shadow_bolt"],
    );
    assert!(!engine
        .can_unlock(&hero.id, "shadow_edge", false)
        .expect("weapon mastery alone"));
    common::unlock_all(&engine, &hero.id, &["darkness_mastery"]);
    assert!(engine
        .can_unlock(&hero.id, "shadow_edge", false)
        .expect("weapon and darkness mastery"));

    assert!(!engine
        .can_unlock(&hero.id, "archmage", false)
        .expect("one tier-5 mastery"));
    common::unlock_all(
        &engine,
        &hero.id,
        &["fire_bolt", "fireball", "fire_mastery", "spark", "lightning_mastery"],
    );
    assert!(engine
        .can_unlock(&hero.id, "archmage", false)
        .expect("three tier-5 masteries"));
}

#[test]
fn all_light_magic_requires_the_full_school() {
    let (_dir, engine) = common::engine();
    let hero = common::rich_character(&engine, "Dawn", 1_000);
    common::unlock_all(
        &engine,
        &hero.id,
        &["light_bolt", "healing_light", "radiant_shield", "purify"],
    );
    assert!(!engine
        .can_unlock(&hero.id, "dawnbringer", false)
        .expect("four of five"));
    common::unlock_all(&engine, &hero.id, &["holy_nova"]);
    assert!(engine
        .can_unlock(&hero.id, "dawnbringer", false)
        .expect("all five"));
}
