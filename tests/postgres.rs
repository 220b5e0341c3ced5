//! `PgStore` against a real database. Each test gets a fresh database with
//! the migrations applied; `DATABASE_URL` must point at a Postgres server.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;
use sheetkeeper::{
    app,
    auth::SessionManager,
    storage::{
        CharacterInsert, CharacterPatch, ConditionInsert, PgStore, PowerInsert, RaceWrite, Store,
        StorageError, UserInsert,
    },
};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;

fn user(username: &str) -> UserInsert {
    UserInsert {
        username: username.to_string(),
        name: None,
        password: "$argon2id$v=19$m=4096,t=3,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNo".to_string(),
        is_admin: false,
    }
}

fn character(name: &str) -> CharacterInsert {
    CharacterInsert {
        name: name.to_string(),
        race: "Dwarf".to_string(),
        class: "Fighter".to_string(),
        level: 1,
        ability_scores: r#"{"str":16,"con":14,"dex":10,"int":10,"wis":12,"cha":8}"#.to_string(),
        defenses: r#"{"ac":17,"fort":15,"ref":11,"will":12}"#.to_string(),
        health: r#"{"hp":29,"maxHp":29,"surges":10,"maxSurges":10}"#.to_string(),
    }
}

fn power(name: &str) -> PowerInsert {
    PowerInsert {
        name: name.to_string(),
        kind: "At-Will".to_string(),
        action_type: "Standard".to_string(),
        range: Some("Melee weapon".to_string()),
        attack: None,
        hit: None,
        miss: None,
        effect: None,
    }
}

fn condition(name: &str) -> ConditionInsert {
    ConditionInsert {
        name: name.to_string(),
        duration: Some("save ends".to_string()),
        effect_description: None,
    }
}

fn race(name: &str) -> RaceWrite {
    RaceWrite {
        name: name.to_string(),
        description_short: None,
        description_long: None,
        average_height_min: None,
        average_height_max: None,
        average_weight_min: None,
        average_weight_max: None,
        ability_scores: Some("+2 Con, +2 Wis".to_string()),
        size: Some("Medium".to_string()),
        speed: Some(5),
        vision: Some("Low-light".to_string()),
        traits: "[]".to_string(),
    }
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "database/migrations")]
async fn duplicate_username_is_a_conflict(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = store.insert_user(user("alice")).await.unwrap();
    assert_eq!(alice.id, 1);

    assert!(matches!(
        store.insert_user(user("alice")).await,
        Err(StorageError::Conflict)
    ));
    let found = store.user_by_username("alice").await.unwrap().unwrap();
    assert_eq!(found.id, alice.id);
}

#[sqlx::test(migrations = "database/migrations")]
async fn characters_are_scoped_to_their_owner(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = store.insert_user(user("alice")).await.unwrap();
    let bob = store.insert_user(user("bob")).await.unwrap();
    let thorin = store
        .insert_character(alice.id, character("Thorin"))
        .await
        .unwrap();
    assert_eq!(thorin.id, 1);

    assert!(store.character(thorin.id, bob.id).await.unwrap().is_none());
    assert!(store.list_characters(bob.id).await.unwrap().is_empty());
    let patch = CharacterPatch {
        level: Some(5),
        ..CharacterPatch::default()
    };
    assert!(!store
        .update_character(thorin.id, bob.id, patch)
        .await
        .unwrap());
    assert!(!store.delete_character(thorin.id, bob.id).await.unwrap());

    let row = store.character(thorin.id, alice.id).await.unwrap().unwrap();
    assert_eq!(row.level, 1);
    assert_eq!(store.list_characters(alice.id).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "database/migrations")]
async fn partial_update_keeps_unset_columns(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = store.insert_user(user("alice")).await.unwrap();
    let thorin = store
        .insert_character(alice.id, character("Thorin"))
        .await
        .unwrap();

    let patch = CharacterPatch {
        level: Some(3),
        health: Some(r#"{"hp":12,"maxHp":35,"surges":9,"maxSurges":10}"#.to_string()),
        ..CharacterPatch::default()
    };
    assert!(store
        .update_character(thorin.id, alice.id, patch)
        .await
        .unwrap());

    let row = store.character(thorin.id, alice.id).await.unwrap().unwrap();
    assert_eq!(row.level, 3);
    assert!(row.health.contains("\"maxHp\":35"));
    assert_eq!(row.name, "Thorin");
    assert_eq!(row.race, "Dwarf");
    assert_eq!(row.defenses, thorin.defenses);

    // An empty patch still reports whether the row is there.
    assert!(store
        .update_character(thorin.id, alice.id, CharacterPatch::default())
        .await
        .unwrap());
}

#[sqlx::test(migrations = "database/migrations")]
async fn children_need_an_owned_parent(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = store.insert_user(user("alice")).await.unwrap();
    let bob = store.insert_user(user("bob")).await.unwrap();
    let thorin = store
        .insert_character(alice.id, character("Thorin"))
        .await
        .unwrap();

    assert!(store
        .insert_power(thorin.id, bob.id, power("Cleave"))
        .await
        .unwrap()
        .is_none());
    assert!(store
        .insert_condition(thorin.id, bob.id, condition("Dazed"))
        .await
        .unwrap()
        .is_none());
    assert!(store
        .insert_power(999, alice.id, power("Cleave"))
        .await
        .unwrap()
        .is_none());

    let cleave = store
        .insert_power(thorin.id, alice.id, power("Cleave"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleave.id, 1);
    assert_eq!(cleave.kind, "At-Will");
    assert!(store.list_powers(thorin.id, bob.id).await.unwrap().is_empty());
    assert_eq!(store.list_powers(thorin.id, alice.id).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "database/migrations")]
async fn child_delete_needs_the_matching_triple(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = store.insert_user(user("alice")).await.unwrap();
    let bob = store.insert_user(user("bob")).await.unwrap();
    let thorin = store
        .insert_character(alice.id, character("Thorin"))
        .await
        .unwrap();
    let gimli = store
        .insert_character(alice.id, character("Gimli"))
        .await
        .unwrap();
    let cleave = store
        .insert_power(thorin.id, alice.id, power("Cleave"))
        .await
        .unwrap()
        .unwrap();
    let dazed = store
        .insert_condition(thorin.id, alice.id, condition("Dazed"))
        .await
        .unwrap()
        .unwrap();

    assert!(!store
        .delete_power(cleave.id, gimli.id, alice.id)
        .await
        .unwrap());
    assert!(!store
        .delete_power(cleave.id, thorin.id, bob.id)
        .await
        .unwrap());
    assert!(!store
        .delete_condition(dazed.id, gimli.id, alice.id)
        .await
        .unwrap());
    assert!(!store
        .delete_condition(dazed.id, thorin.id, bob.id)
        .await
        .unwrap());
    assert_eq!(store.list_powers(thorin.id, alice.id).await.unwrap().len(), 1);
    assert_eq!(
        store.list_conditions(thorin.id, alice.id).await.unwrap().len(),
        1
    );

    assert!(store
        .delete_power(cleave.id, thorin.id, alice.id)
        .await
        .unwrap());
    assert!(store
        .delete_condition(dazed.id, thorin.id, alice.id)
        .await
        .unwrap());
    assert!(store.list_powers(thorin.id, alice.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "database/migrations")]
async fn deleting_a_character_cascades(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let alice = store.insert_user(user("alice")).await.unwrap();
    let thorin = store
        .insert_character(alice.id, character("Thorin"))
        .await
        .unwrap();
    let gimli = store
        .insert_character(alice.id, character("Gimli"))
        .await
        .unwrap();
    for target in [thorin.id, gimli.id] {
        store
            .insert_power(target, alice.id, power("Cleave"))
            .await
            .unwrap();
        store
            .insert_condition(target, alice.id, condition("Dazed"))
            .await
            .unwrap();
    }

    assert!(store.delete_character(thorin.id, alice.id).await.unwrap());
    assert_eq!(count(&pool, "powers").await, 1);
    assert_eq!(count(&pool, "conditions").await, 1);
    assert_eq!(store.list_powers(gimli.id, alice.id).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "database/migrations")]
async fn races_replace_and_delete(pool: PgPool) {
    let store = PgStore::new(pool);
    let dwarf = store.insert_race(race("Dwarf")).await.unwrap();
    store.insert_race(race("Elf")).await.unwrap();

    let names: Vec<String> = store
        .list_races()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, ["Dwarf", "Elf"]);

    let mut renamed = race("Mountain Dwarf");
    renamed.speed = None;
    let updated = store
        .update_race(dwarf.id, renamed)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Mountain Dwarf");
    assert_eq!(updated.speed, None);

    assert!(store.update_race(999, race("Ghost")).await.unwrap().is_none());
    assert!(store.delete_race(dwarf.id).await.unwrap());
    assert!(!store.delete_race(dwarf.id).await.unwrap());
    assert!(store.race(dwarf.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "database/migrations")]
async fn duplicate_registration_over_http_is_409(pool: PgPool) {
    let sessions = Arc::new(
        SessionManager::new(
            b"integration-test-secret-that-is-long-enough",
            time::Duration::hours(1),
            false,
        )
        .unwrap(),
    );
    let router = app(Arc::new(PgStore::new(pool)), sessions);

    let register = || {
        Request::builder()
            .method(Method::POST)
            .uri("/api/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "username": "alice", "password": "pw1" }).to_string(),
            ))
            .unwrap()
    };

    let response = router.clone().oneshot(register()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.oneshot(register()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Username already exists");
}
