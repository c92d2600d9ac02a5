mod helpers;

use chatstore::errors::StoreError;
use helpers::test_db::{create_test_message, setup_test_service, tag};

fn tag_ids(tags: &[chatstore::models::Tag]) -> Vec<String> {
    tags.iter().map(|t| t.id.clone()).collect()
}

#[tokio::test]
async fn test_update_tags_replaces_wholesale() {
    let service = setup_test_service().await;
    let message = create_test_message(
        &service,
        "conv-1",
        "sender-1",
        "Message to update",
        vec![tag("tag1"), tag("tag2")],
    )
    .await;
    assert_eq!(tag_ids(&message.tags), vec!["tag1", "tag2"]);

    let updated = service
        .update_tags(&message.id, vec![tag("tag1"), tag("tag2"), tag("tag3")])
        .await
        .expect("Failed to update tags");
    // A replace, not a merge: exactly the new list, no duplicated survivors
    assert_eq!(tag_ids(&updated.tags), vec!["tag1", "tag2", "tag3"]);

    let retrieved = service.get_message(&message.id).await.expect("Failed to get message");
    assert_eq!(tag_ids(&retrieved.tags), vec!["tag1", "tag2", "tag3"]);
}

#[tokio::test]
async fn test_update_tags_accepts_empty_list() {
    let service = setup_test_service().await;
    let message = create_test_message(
        &service,
        "conv-1",
        "sender-1",
        "Message to clear",
        vec![tag("tag1")],
    )
    .await;

    let cleared = service
        .update_tags(&message.id, vec![])
        .await
        .expect("Failed to clear tags");
    assert!(cleared.tags.is_empty());
}

#[tokio::test]
async fn test_update_tags_on_unknown_message_fails() {
    let service = setup_test_service().await;

    let result = service.update_tags("no-such-id", vec![tag("tag1")]).await;
    match result {
        Err(StoreError::NotFound(msg)) => {
            assert!(msg.contains("Could not update tags on message"));
        }
        other => panic!("expected NotFound, got {:?}", other.map(|m| m.id)),
    }
}

#[tokio::test]
async fn test_get_messages_by_tags_groups_by_matching_combination() {
    let service = setup_test_service().await;

    let first = create_test_message(
        &service,
        "conv-1",
        "sender-1",
        "Hello world",
        vec![tag("tag1"), tag("tag2")],
    )
    .await;
    let _second = create_test_message(
        &service,
        "conv-1",
        "sender-1",
        "Second Message",
        vec![tag("tag3")],
    )
    .await;

    let groups = service
        .get_messages_by_tags(&["conv-1".to_string()], &first.tags, 5)
        .await
        .expect("Failed to search by tags");

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.tag_combination, vec!["tag1", "tag2"]);
    assert_eq!(group.tag_id, group.tag_combination);
    assert_eq!(group.messages.len(), 1);
    assert_eq!(group.messages[0].message, "Hello world");
    assert_eq!(group.messages[0].sender_id, "sender-1");
    assert_eq!(tag_ids(&group.messages[0].tags), vec!["tag1", "tag2"]);
}

#[tokio::test]
async fn test_subset_and_superset_matches_form_distinct_groups() {
    let service = setup_test_service().await;

    // Exact pair, subset, and another exact pair
    let _m1 = create_test_message(
        &service,
        "conv-1",
        "sender-1",
        "pair one",
        vec![tag("tag1"), tag("tag2")],
    )
    .await;
    let _m2 = create_test_message(&service, "conv-1", "sender-2", "only one", vec![tag("tag1")]).await;
    let _m3 = create_test_message(
        &service,
        "conv-1",
        "sender-3",
        "pair two",
        vec![tag("tag2"), tag("tag1")],
    )
    .await;

    let groups = service
        .get_messages_by_tags(
            &["conv-1".to_string()],
            &[tag("tag1"), tag("tag2")],
            10,
        )
        .await
        .expect("Failed to search by tags");

    assert_eq!(groups.len(), 2);

    let pair_group = groups
        .iter()
        .find(|g| g.tag_combination == vec!["tag1", "tag2"])
        .expect("missing exact-pair group");
    assert_eq!(pair_group.messages.len(), 2);
    assert_eq!(pair_group.messages[0].message, "pair one");
    assert_eq!(pair_group.messages[1].message, "pair two");

    let single_group = groups
        .iter()
        .find(|g| g.tag_combination == vec!["tag1"])
        .expect("missing single-tag group");
    assert_eq!(single_group.messages.len(), 1);
    assert_eq!(single_group.messages[0].message, "only one");
}

#[tokio::test]
async fn test_tag_search_scopes_by_conversation_and_skips_deleted() {
    let service = setup_test_service().await;

    let kept = create_test_message(
        &service,
        "conv-1",
        "sender-1",
        "kept",
        vec![tag("course")],
    )
    .await;
    let deleted = create_test_message(
        &service,
        "conv-1",
        "sender-1",
        "deleted",
        vec![tag("course")],
    )
    .await;
    let _elsewhere = create_test_message(
        &service,
        "conv-2",
        "sender-1",
        "other conversation",
        vec![tag("course")],
    )
    .await;

    service.delete(&deleted.id).await.expect("Failed to delete");

    let groups = service
        .get_messages_by_tags(&["conv-1".to_string()], &[tag("course")], 10)
        .await
        .expect("Failed to search by tags");

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].tag_combination, vec!["course"]);
    assert_eq!(groups[0].messages.len(), 1);
    assert_eq!(groups[0].messages[0].message, kept.text);
}

#[tokio::test]
async fn test_tag_search_limit_and_empty_inputs() {
    let service = setup_test_service().await;

    for i in 0..5 {
        create_test_message(
            &service,
            "conv-1",
            "sender-1",
            &format!("message {}", i),
            vec![tag("course")],
        )
        .await;
    }

    // The limit caps matched messages fed into grouping
    let groups = service
        .get_messages_by_tags(&["conv-1".to_string()], &[tag("course")], 2)
        .await
        .expect("Failed to search by tags");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].messages.len(), 2);

    let invalid = service
        .get_messages_by_tags(&["conv-1".to_string()], &[tag("course")], 0)
        .await;
    assert!(matches!(invalid, Err(StoreError::Validation(_))));

    let no_tags = service
        .get_messages_by_tags(&["conv-1".to_string()], &[], 5)
        .await
        .expect("empty tag input should not fail");
    assert!(no_tags.is_empty());

    let no_match = service
        .get_messages_by_tags(&["conv-1".to_string()], &[tag("unused")], 5)
        .await
        .expect("no matches should not fail");
    assert!(no_match.is_empty());
}
