//! End-to-end tests against a real PostgreSQL instance.
//!
//! Ignored by default; run with a database available:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`

use std::time::Duration;

use datastore::models::*;
use datastore::{AggregateSpec, Client, Config, Direction, Filter, ListQuery, StoreError};
use serde_json::json;
use uuid::Uuid;

async fn client() -> Client {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let config = Config::from_env().expect("DATABASE_URL must be set for live tests");
    let client = Client::connect(&config).await.expect("failed to connect");
    client.migrate().await.expect("failed to migrate");
    client
}

fn unique_email(tag: &str) -> String {
    format!("{tag}+{}@example.com", Uuid::new_v4())
}

async fn seed_user(client: &Client, tag: &str) -> User {
    client
        .users()
        .create(NewUser::with_email(unique_email(tag)))
        .await
        .expect("failed to seed user")
}

fn skill(user_id: Uuid, name: &str, level: i32) -> NewSkill {
    NewSkill {
        user_id,
        name: name.to_string(),
        category: Some("backend".to_string()),
        level,
        verified: false,
        years_of_exp: None,
    }
}

#[tokio::test]
#[ignore]
async fn test_create_then_find_unique_returns_equal_record() {
    let client = client().await;
    let created = client
        .users()
        .create(NewUser {
            email: unique_email("roundtrip"),
            name: Some("Ada".to_string()),
            avatar: None,
            phone: Some("+15550100".to_string()),
            location: Some("Zurich".to_string()),
            website: None,
            linkedin: None,
            github: Some("ada".to_string()),
            summary: Some("Compilers and correspondence.".to_string()),
        })
        .await
        .unwrap();

    let found = client
        .users()
        .find_unique(created.id)
        .await
        .unwrap()
        .expect("created user must be findable");

    assert_eq!(
        serde_json::to_value(&created).unwrap(),
        serde_json::to_value(&found).unwrap()
    );
}

#[tokio::test]
#[ignore]
async fn test_duplicate_email_is_unique_violation() {
    let client = client().await;
    let email = unique_email("dup");
    client
        .users()
        .create(NewUser::with_email(&email))
        .await
        .unwrap();

    let err = client
        .users()
        .create(NewUser::with_email(&email))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(), "got: {err}");
}

#[tokio::test]
#[ignore]
async fn test_duplicate_skill_name_per_user_is_unique_violation() {
    let client = client().await;
    let user = seed_user(&client, "skilldup").await;
    client.skills().create(skill(user.id, "rust", 3)).await.unwrap();

    let err = client
        .skills()
        .create(skill(user.id, "rust", 5))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(), "got: {err}");

    // Same skill name under a different user is fine.
    let other = seed_user(&client, "skilldup2").await;
    client.skills().create(skill(other.id, "rust", 2)).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_orphan_skill_is_foreign_key_violation() {
    let client = client().await;
    let err = client
        .skills()
        .create(skill(Uuid::new_v4(), "rust", 3))
        .await
        .unwrap_err();
    assert!(err.is_foreign_key_violation(), "got: {err}");
}

#[tokio::test]
#[ignore]
async fn test_update_changes_only_patched_fields_and_bumps_updated_at() {
    let client = client().await;
    let user = seed_user(&client, "patch").await;
    let created = client
        .skills()
        .create(NewSkill {
            years_of_exp: Some(2.5),
            ..skill(user.id, "postgres", 3)
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let updated = client
        .skills()
        .update(
            created.id,
            SkillPatch {
                level: Some(4),
                years_of_exp: Some(None), // explicit NULL
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.level, 4);
    assert_eq!(updated.years_of_exp, None);
    // Untouched fields survive.
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.category, created.category);
    assert_eq!(updated.verified, created.verified);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
}

#[tokio::test]
#[ignore]
async fn test_update_missing_row_is_not_found() {
    let client = client().await;
    let err = client
        .skills()
        .update(
            Uuid::new_v4(),
            SkillPatch {
                level: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got: {err}");
}

#[tokio::test]
#[ignore]
async fn test_empty_patch_is_validation_error() {
    let client = client().await;
    let err = client
        .skills()
        .update(Uuid::new_v4(), SkillPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)), "got: {err}");
}

#[tokio::test]
#[ignore]
async fn test_delete_then_find_unique_returns_none() {
    let client = client().await;
    let user = seed_user(&client, "delete").await;
    let deleted = client.users().delete(user.id).await.unwrap();
    assert_eq!(deleted.id, user.id);
    assert!(client.users().find_unique(user.id).await.unwrap().is_none());

    let err = client.users().delete(user.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore]
async fn test_delete_cascades_to_children() {
    let client = client().await;
    let user = seed_user(&client, "cascade").await;
    let s = client.skills().create(skill(user.id, "go", 2)).await.unwrap();

    client.users().delete(user.id).await.unwrap();
    assert!(client.skills().find_unique(s.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_delete_many_returns_prior_match_count() {
    let client = client().await;
    let user = seed_user(&client, "delmany").await;
    for (name, level) in [("a", 1), ("b", 2), ("c", 5)] {
        client.skills().create(skill(user.id, name, level)).await.unwrap();
    }

    let filter = Filter::and(vec![
        Filter::eq("user_id", user.id),
        Filter::lte("level", 2),
    ]);
    let before = client.skills().count(Some(&filter)).await.unwrap();
    assert_eq!(before, 2);

    let deleted = client.skills().delete_many(Some(&filter)).await.unwrap();
    assert_eq!(deleted as i64, before);
    assert_eq!(client.skills().count(Some(&filter)).await.unwrap(), 0);

    // The non-matching row remains.
    let remaining = client
        .skills()
        .count(Some(&Filter::eq("user_id", user.id)))
        .await
        .unwrap();
    assert_eq!(remaining, 1);
}

#[tokio::test]
#[ignore]
async fn test_upsert_creates_then_updates() {
    let client = client().await;
    let user = seed_user(&client, "upsert").await;

    let first = client
        .skills()
        .upsert(skill(user.id, "kafka", 2), SkillPatch::default())
        .await
        .unwrap();
    assert_eq!(first.level, 2);

    let second = client
        .skills()
        .upsert(
            skill(user.id, "kafka", 1),
            SkillPatch {
                level: Some(4),
                verified: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(second.id, first.id, "upsert must hit the existing row");
    assert_eq!(second.level, 4);
    assert!(second.verified);
}

#[tokio::test]
#[ignore]
async fn test_user_upsert_keys_on_email() {
    let client = client().await;
    let email = unique_email("userupsert");
    let first = client
        .users()
        .upsert(NewUser::with_email(&email), UserPatch::default())
        .await
        .unwrap();

    let second = client
        .users()
        .upsert(
            NewUser::with_email(&email),
            UserPatch {
                name: Some(Some("Grace".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.name.as_deref(), Some("Grace"));
}

#[tokio::test]
#[ignore]
async fn test_find_many_filter_sort_pagination() {
    let client = client().await;
    let user = seed_user(&client, "list").await;
    for (name, level) in [("rust", 5), ("go", 3), ("zig", 4), ("sql", 1)] {
        client.skills().create(skill(user.id, name, level)).await.unwrap();
    }

    let query = ListQuery::new()
        .filter(Filter::and(vec![
            Filter::eq("user_id", user.id),
            Filter::gte("level", 3),
        ]))
        .order_by("level", Direction::Desc)
        .limit(2);
    let skills = client.skills().find_many(&query).await.unwrap();
    let names: Vec<&str> = skills.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["rust", "zig"]);

    let offset_query = ListQuery::new()
        .filter(Filter::eq("user_id", user.id))
        .order_by("level", Direction::Asc)
        .limit(2)
        .offset(2);
    let page = client.skills().find_many(&offset_query).await.unwrap();
    let names: Vec<&str> = page.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["zig", "rust"]);
}

#[tokio::test]
#[ignore]
async fn test_unknown_filter_column_is_rejected_before_query() {
    let client = client().await;
    let query = ListQuery::new().filter(Filter::eq("no_such_column", 1));
    let err = client.skills().find_many(&query).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)), "got: {err}");
}

#[tokio::test]
#[ignore]
async fn test_aggregate_and_group_by() {
    let client = client().await;
    let user = seed_user(&client, "agg").await;
    for (name, category, level) in [
        ("rust", "backend", 5),
        ("go", "backend", 3),
        ("react", "frontend", 2),
    ] {
        client
            .skills()
            .create(NewSkill {
                category: Some(category.to_string()),
                ..skill(user.id, name, level)
            })
            .await
            .unwrap();
    }

    let filter = Filter::eq("user_id", user.id);
    let spec = AggregateSpec::new()
        .with_count()
        .with_avg("level")
        .with_max("level")
        .with_sum("level");
    let result = client.skills().aggregate(Some(&filter), &spec).await.unwrap();
    assert_eq!(result.count, Some(3));
    assert_eq!(result.value("max_level"), Some(5.0));
    assert_eq!(result.value("sum_level"), Some(10.0));
    let avg = result.value("avg_level").unwrap();
    assert!((avg - 10.0 / 3.0).abs() < 1e-9);

    let groups = client
        .skills()
        .group_by("category", Some(&filter), &spec)
        .await
        .unwrap();
    assert_eq!(groups.len(), 2);
    let backend = groups
        .iter()
        .find(|g| g.key.as_deref() == Some("backend"))
        .unwrap();
    assert_eq!(backend.count, Some(2));
    assert_eq!(backend.values.get("max_level"), Some(&Some(5.0)));
}

#[tokio::test]
#[ignore]
async fn test_aggregate_over_empty_set_is_null() {
    let client = client().await;
    let filter = Filter::eq("user_id", Uuid::new_v4());
    let spec = AggregateSpec::new().with_count().with_min("level");
    let result = client.skills().aggregate(Some(&filter), &spec).await.unwrap();
    assert_eq!(result.count, Some(0));
    assert_eq!(result.value("min_level"), None);
}

#[tokio::test]
#[ignore]
async fn test_json_path_filter_on_profiles() {
    let client = client().await;
    let user = seed_user(&client, "json").await;
    client
        .profiles()
        .create(NewPsychologicalProfile {
            user_id: user.id,
            personality_type: Some("INTJ".to_string()),
            big_five_scores: Some(json!({"openness": "high", "neuroticism": "low"})),
            work_preferences: None,
            motivation_factors: vec!["autonomy".to_string()],
            stress_factors: vec![],
            communication_style: None,
            learning_style: None,
            career_goals: vec!["staff engineer".to_string()],
            strengths_weaknesses: None,
            completed_at: None,
        })
        .await
        .unwrap();

    let query = ListQuery::new().filter(Filter::and(vec![
        Filter::eq("user_id", user.id),
        Filter::json_eq("big_five_scores", ["openness"], "high"),
        Filter::has("motivation_factors", "autonomy"),
    ]));
    let hits = client.profiles().find_many(&query).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].personality_type.as_deref(), Some("INTJ"));
}

#[tokio::test]
#[ignore]
async fn test_string_match_filters() {
    let client = client().await;
    let user = seed_user(&client, "strmatch").await;
    client
        .projects()
        .create(NewProject {
            user_id: user.id,
            name: "Orchestrator 9000".to_string(),
            description: None,
            url: None,
            github: None,
            technologies: vec!["rust".to_string(), "tokio".to_string()],
            status: "active".to_string(),
            start_date: None,
            end_date: None,
        })
        .await
        .unwrap();

    let query = ListQuery::new().filter(Filter::and(vec![
        Filter::eq("user_id", user.id),
        Filter::contains("name", "chestra"),
        Filter::starts_with("name", "orch"),
        Filter::has("technologies", "tokio"),
    ]));
    assert_eq!(client.projects().find_many(&query).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_api_usage_survives_user_delete() {
    let client = client().await;
    let user = seed_user(&client, "audit").await;
    let usage = client
        .api_usage()
        .create(NewApiUsage {
            service: "anthropic".to_string(),
            endpoint: "/v1/messages".to_string(),
            tokens_used: 1200,
            cost: 0.018,
            user_id: Some(user.id),
            success: true,
            error_message: None,
        })
        .await
        .unwrap();

    client.users().delete(user.id).await.unwrap();

    let still_there = client
        .api_usage()
        .find_unique(usage.id)
        .await
        .unwrap()
        .expect("audit rows must outlive users");
    assert_eq!(still_there.user_id, Some(user.id));
}

#[tokio::test]
#[ignore]
async fn test_health_check_and_transaction_passthrough() {
    let client = client().await;
    client.health_check().await.unwrap();

    let mut tx = client.begin().await.unwrap();
    sqlx::query("SELECT 1").execute(&mut *tx).await.unwrap();
    tx.rollback().await.unwrap();
}
