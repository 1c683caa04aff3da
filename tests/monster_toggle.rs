//! Monster/humanoid transitions and their forced refunds.
mod common;

use lumenforge::progression::{
    CharacterKind, ProgressionError, SkillBucket, SkillCategory,
};

#[test]
fn becoming_a_monster_refunds_professions_at_full_cost() {
    let (_dir, engine) = common::engine();
    let hero = engine.create_character("Crafter").expect("create");
    let hero = common::unlock_all(
        &engine,
        &hero.id,
        &["smithing_basics", "alchemy_basics", "sword_basics"],
    );
    let lumens = hero.lumens;

    let monster = engine.set_monster(&hero.id, true).expect("monster");
    assert_eq!(monster.lumens, lumens + 25);
    assert_eq!(monster.kind(), CharacterKind::Monster);
    assert!(monster
        .unlocked
        .ids_in_category(SkillCategory::Profession)
        .is_empty());
    assert!(monster.has_skill("sword_basics"));
    assert_eq!(monster.total_skills_unlocked, 1);
    assert_eq!(monster.total_lumens_spent, 10);
    for sub in ["claws", "hide"] {
        assert!(monster
            .unlocked
            .bucket(&SkillBucket::Monster(sub.into()))
            .is_some());
    }
}

#[test]
fn reverting_refunds_monster_skills_at_full_cost() {
    let (_dir, engine) = common::engine();
    let beast = engine.create_character("Beast").expect("create");
    engine.toggle_monster(&beast.id).expect("monster");
    let beast = common::unlock_all(&engine, &beast.id, &["sharp_claws"]);
    let lumens = beast.lumens;

    let reverted = engine.toggle_monster(&beast.id).expect("revert");
    assert_eq!(reverted.lumens, lumens + 20);
    assert!(!reverted.is_monster);
    assert!(reverted
        .unlocked
        .ids_in_category(SkillCategory::Monster)
        .is_empty());
    assert_eq!(reverted.total_skills_unlocked, 0);
    assert_eq!(reverted.kind(), CharacterKind::Unset);
}

#[test]
fn reverting_also_drops_elemental_affinities() {
    let (_dir, engine) = common::engine();
    let beast = common::rich_character(&engine, "Salamander", 100);
    engine.set_monster(&beast.id, true).expect("monster");
    let beast = common::unlock_all(
        &engine,
        &beast.id,
        &["fire_affinity", "scaled_hide", "fire_bolt"],
    );
    let lumens = beast.lumens;

    let reverted = engine.set_monster(&beast.id, false).expect("revert");
    assert_eq!(reverted.lumens, lumens + 20 + 40);
    assert!(!reverted.has_skill("fire_affinity"));
    assert!(!reverted.has_skill("scaled_hide"));
    assert!(reverted.has_skill("fire_bolt"));
    assert!(reverted.skill_count_consistent());
}

#[test]
fn type_gates_follow_monster_status() {
    let (_dir, engine) = common::engine();
    let hero = engine.create_character("Gated").expect("create");

    assert!(matches!(
        engine.unlock_skill(&hero.id, "fire_affinity", false),
        Err(ProgressionError::PrerequisitesNotMet(_))
    ));
    engine.set_monster(&hero.id, true).expect("monster");
    assert!(matches!(
        engine.unlock_skill(&hero.id, "herbalism_basics", false),
        Err(ProgressionError::PrerequisitesNotMet(_))
    ));
    engine
        .unlock_skill(&hero.id, "fire_affinity", false)
        .expect("monsters may take affinities");
}

#[test]
fn setting_the_current_status_is_a_no_op() {
    let (_dir, engine) = common::engine();
    let hero = engine.create_character("Steady").expect("create");
    let hero = common::unlock_all(&engine, &hero.id, &["herbalism_basics"]);
    let same = engine.set_monster(&hero.id, false).expect("no-op");
    assert_eq!(same, hero);
}

#[test]
fn raced_characters_cannot_become_monsters() {
    let (_dir, engine) = common::engine();
    let hero = engine.create_character("Thorin").expect("create");
    engine.set_character_race(&hero.id, "dwarf").expect("race");
    let before = engine.load_character(&hero.id).expect("load");

    assert!(matches!(
        engine.toggle_monster(&hero.id),
        Err(ProgressionError::RaceLocked(race)) if race == "dwarf"
    ));
    assert_eq!(engine.load_character(&hero.id).expect("load"), before);
}

#[test]
fn monsters_cannot_take_a_race() {
    let (_dir, engine) = common::engine();
    let beast = engine.create_character("Grendel").expect("create");
    engine.set_monster(&beast.id, true).expect("monster");
    assert!(matches!(
        engine.set_character_race(&beast.id, "orc"),
        Err(ProgressionError::MonsterCannotHaveRace)
    ));
    let stored = engine.load_character(&beast.id).expect("load");
    assert_eq!(stored.race, None);
    assert!(stored.is_monster);
}
