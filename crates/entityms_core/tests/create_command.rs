mod common;

use common::{details, Harness};
use entityms_core::{create_thing_command, EntityError, RepoError, ThingRequest};
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn create_without_attributes_assigns_random_guid() {
    let harness = Harness::new();
    let commands = harness.commands();

    let created = commands
        .create("item", &ThingRequest::new("lamp"))
        .await
        .unwrap();

    assert_eq!(created.name, "lamp");
    assert_eq!(created.entity_type, "item");
    assert!(created.details.is_empty());
    assert!(Uuid::parse_str(&created.guid).is_ok());
    assert_eq!(harness.things.save_count(), 1);
    assert_eq!(harness.lookups.save_count(), 0);
}

#[tokio::test]
async fn create_returns_values_in_request_order() {
    let harness = Harness::new();
    let request = ThingRequest::new("lamp")
        .with_tag("red")
        .with_tag("blue")
        .with_tag("green")
        .with_detail("COLOR", "white");

    let created = harness.commands().create("item", &request).await.unwrap();

    assert_eq!(created.tags(), ["red", "blue", "green"]);
    assert_eq!(created.details["COLOR"], vec!["white"]);
    assert_eq!(harness.lookups.save_count(), 4);
    let stored = harness.lookups.rows();
    assert!(stored.iter().all(|row| row.id.is_some()));
}

#[tokio::test]
async fn two_creates_never_share_a_guid() {
    let harness = Harness::new();
    let commands = harness.commands();

    let first = commands.create("item", &ThingRequest::new("a")).await.unwrap();
    let second = commands.create("item", &ThingRequest::new("a")).await.unwrap();

    assert_ne!(first.guid, second.guid);
}

#[tokio::test]
async fn undeclared_attribute_type_writes_nothing() {
    let harness = Harness::new();
    let request = ThingRequest::new("gear")
        .with_tag("steel")
        .with_detail("COLOR", "grey");

    let err = harness.commands().create("widget", &request).await.unwrap_err();

    match err {
        EntityError::UnknownAttributeType {
            entity_type,
            attribute_type,
        } => {
            assert_eq!(entity_type, "widget");
            assert_eq!(attribute_type, "COLOR");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(harness.things.save_count(), 0);
    assert_eq!(harness.lookups.save_count(), 0);
}

#[tokio::test]
async fn unknown_entity_type_is_rejected_before_storage() {
    let harness = Harness::new();

    let err = harness
        .commands()
        .create("gadget", &ThingRequest::new("x"))
        .await
        .unwrap_err();

    assert!(matches!(err, EntityError::UnknownEntityType(ref name) if name == "gadget"));
    assert_eq!(harness.things.save_count(), 0);
}

#[tokio::test]
async fn uniqueness_violation_maps_to_duplicate_entity() {
    let harness = Harness::new();
    harness
        .things
        .fail_saves_with("UNIQUE constraint failed: t_thing.th_guid");

    let err = harness
        .commands()
        .create("item", &ThingRequest::new("lamp").with_tag("red"))
        .await
        .unwrap_err();

    assert!(matches!(err, EntityError::DuplicateEntity { ref entity_type } if entity_type == "item"));
    assert_eq!(harness.lookups.save_count(), 0);
}

#[tokio::test]
async fn other_storage_failure_maps_to_command_failure() {
    let harness = Harness::new();
    harness.things.fail_saves_with("disk full");

    let err = harness
        .commands()
        .create("item", &ThingRequest::new("lamp"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "command_failed");
    assert_eq!(err.to_string(), "failed to create item: disk full");
}

#[tokio::test]
async fn lookup_failure_rolls_back_the_write_scope() {
    let harness = Harness::new();
    harness.lookups.fail_on_save(2);
    let scope = harness.write_scope();
    let command = create_thing_command(harness.things.clone(), harness.utils.clone())
        .with_write_scope(Arc::new(scope.clone()));
    let request = ThingRequest::new("lamp").with_tag("red").with_tag("blue");

    let err = command.execute("item", &request).await.unwrap_err();

    assert!(matches!(err, EntityError::CommandExecution { .. }));
    assert_eq!(scope.begins(), 1);
    assert_eq!(scope.rollbacks(), 1);
    assert_eq!(scope.commits(), 0);
}

#[tokio::test]
async fn successful_create_commits_the_write_scope() {
    let harness = Harness::new();
    let scope = harness.write_scope();
    let command = create_thing_command(harness.things.clone(), harness.utils.clone())
        .with_write_scope(Arc::new(scope.clone()));

    command
        .execute("item", &ThingRequest::new("lamp").with_tag("red"))
        .await
        .unwrap();

    assert_eq!(scope.commits(), 1);
    assert_eq!(scope.rollbacks(), 0);
}

#[tokio::test]
async fn validation_failure_opens_no_write_scope() {
    let harness = Harness::new();
    let scope = harness.write_scope();
    let command = create_thing_command(harness.things.clone(), harness.utils.clone())
        .with_write_scope(Arc::new(scope.clone()));

    let request = ThingRequest {
        name: "gear".to_string(),
        details: details(&[("SIZE", &["xl"])]),
    };
    command.execute("widget", &request).await.unwrap_err();

    assert_eq!(scope.begins(), 0);
}

#[tokio::test]
async fn custom_duplicate_detector_classifies_backend_message() {
    let harness = Harness::new();
    harness
        .things
        .fail_saves_with("Unique index or primary key violation");
    let command = create_thing_command(harness.things.clone(), harness.utils.clone())
        .with_duplicate_detector(|err| {
            matches!(err, RepoError::Backend(message) if message.starts_with("Unique index"))
        });

    let err = command
        .execute("item", &ThingRequest::new("lamp"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "duplicate_entity");
}
