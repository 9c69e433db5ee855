//! End-to-end flows across the coordinator, store, and template parser
//!
//! These tests drive the public API the way the table and editor components
//! do: dataset refresh, selection events, confirmation dialog, execution,
//! then template load/save.

use hausverwaltung_core::config::CoordinatorConfig;
use hausverwaltung_core::models::DataRow;
use hausverwaltung_core::operations::{BulkOperation, RetryPolicy};
use hausverwaltung_core::services::{
    extract_template_variables, parse_template_content, serialize_template_content,
    BulkCoordinator, OperationPhase, PerformOutcome,
};
use hausverwaltung_core::store::{MemoryRowStore, RowStore, StoreError};
use serde_json::json;
use std::sync::Arc;

fn test_config() -> CoordinatorConfig {
    CoordinatorConfig {
        debounce_window_ms: 0,
        max_batch_size: 3,
        retry: RetryPolicy {
            max_retries: 2,
            base_delay_ms: 1,
        },
    }
}

fn seed_tenants(store: &MemoryRowStore, count: usize) -> Vec<DataRow> {
    let mut rows = Vec::new();
    for index in 1..=count {
        let row = DataRow::new_with_id(
            index.to_string(),
            "tenant".to_string(),
            json!({
                "name": format!("Mieter {index}"),
                "archived": false,
                "apartment_id": null,
            }),
        );
        store.insert_row(row.clone());
        rows.push(row);
    }
    rows
}

#[tokio::test]
async fn archive_flow_with_transient_outage() -> anyhow::Result<()> {
    let store = Arc::new(MemoryRowStore::new());
    let rows = seed_tenants(&store, 3);
    // Row 2 fails twice with a connection error, then recovers
    store.fail_times("2", StoreError::connection("connection reset"), 2);

    let mut coordinator = BulkCoordinator::new(store.clone(), test_config());
    coordinator.sync_dataset(rows);
    coordinator.select_all(vec!["1".to_string(), "2".to_string(), "3".to_string()]);
    coordinator.flush_pending();

    let outcome = coordinator
        .perform_bulk_operation(BulkOperation::archive(), json!({}))
        .await?;
    let result = match outcome {
        PerformOutcome::Completed(result) => result,
        other => panic!("archive needs no confirmation, got {other:?}"),
    };

    // The retry pass absorbed the outage entirely
    assert_eq!(result.updated_count, 3);
    assert_eq!(result.failed_count, 0);
    assert!(!result.can_retry);
    for id in ["1", "2", "3"] {
        assert!(store.row(id).is_some_and(|row| row.is_archived()));
    }
    Ok(())
}

#[tokio::test]
async fn delete_flow_reports_partial_failure_and_preserves_successes() -> anyhow::Result<()> {
    let store = Arc::new(MemoryRowStore::new());
    let rows = seed_tenants(&store, 2);
    store.fail_always("2", StoreError::timeout("DELETE /tenants/2"));

    let mut coordinator = BulkCoordinator::new(store.clone(), test_config());
    coordinator.sync_dataset(rows);
    coordinator.select_all(vec!["1".to_string(), "2".to_string()]);

    let outcome = coordinator
        .perform_bulk_operation(BulkOperation::delete(), json!({}))
        .await?;
    assert!(matches!(outcome, PerformOutcome::AwaitingConfirmation(_)));
    assert_eq!(coordinator.phase(), OperationPhase::Confirming);

    let result = coordinator.confirm(json!({})).await?;
    assert_eq!(result.updated_count, 1);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.skipped_count, 0);
    assert!(result.can_retry);
    assert_eq!(result.retryable_ids, vec!["2".to_string()]);

    // Partial success is not rolled back
    assert!(store.row("1").is_none());
    assert!(store.row("2").is_some());

    // The data layer refetches and hands the survivors back; the stale
    // selection entry for row 1 is pruned
    let remaining = store.list_rows("tenant").await?;
    coordinator.sync_dataset(remaining);
    assert_eq!(coordinator.selected_ids(), &["2".to_string()]);
    Ok(())
}

#[tokio::test]
async fn forced_flush_at_max_batch_size_keeps_selection_consistent() -> anyhow::Result<()> {
    let store = Arc::new(MemoryRowStore::new());
    let rows = seed_tenants(&store, 5);

    let mut coordinator = BulkCoordinator::new(store, test_config());
    coordinator.sync_dataset(rows);

    // max_batch_size is 3: the third event forces a flush mid-burst
    for id in ["1", "2", "3", "4", "5"] {
        coordinator.toggle_row(id);
    }
    coordinator.toggle_row("5");
    coordinator.flush_pending();

    assert_eq!(
        coordinator.selected_ids(),
        &["1".to_string(), "2".to_string(), "3".to_string(), "4".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn reassign_flow_moves_tenants_to_new_apartment() -> anyhow::Result<()> {
    let store = Arc::new(MemoryRowStore::new());
    let rows = seed_tenants(&store, 2);

    let mut coordinator = BulkCoordinator::new(store.clone(), test_config());
    coordinator.sync_dataset(rows);
    coordinator.select_all(vec!["1".to_string(), "2".to_string()]);

    coordinator
        .perform_bulk_operation(BulkOperation::reassign("apartment_id"), json!({}))
        .await?;
    let result = coordinator.confirm(json!({"target_id": "apt-42"})).await?;

    assert_eq!(result.updated_count, 2);
    for id in ["1", "2"] {
        assert_eq!(
            store.row(id).unwrap().property("apartment_id"),
            Some(&json!("apt-42"))
        );
    }
    Ok(())
}

#[tokio::test]
async fn template_load_edit_save_round_trip() -> anyhow::Result<()> {
    // A template as the storage layer hands it over: serialized string
    let stored = r#"{"type":"doc","content":[{"type":"paragraph","content":[
        {"type":"text","text":"Sehr geehrte/r "},
        {"type":"mention","attrs":{"id":"tenant_name"}},
        {"type":"text","text":", Ihre Wohnung in "},
        {"type":"mention","attrs":{"id":"property_address"}},
        {"type":"text","text":" betreffend."}
    ]}]}"#;

    let parsed = parse_template_content(Some(&json!(stored)));
    assert!(parsed.success);
    assert!(!parsed.was_recovered);

    let extraction = extract_template_variables(&parsed.content);
    assert_eq!(
        extraction.variables,
        vec!["tenant_name".to_string(), "property_address".to_string()]
    );

    // Save and reload: structurally identical
    let saved = serialize_template_content(&parsed.content)?;
    let reloaded = parse_template_content(Some(&json!(saved)));
    assert!(!reloaded.was_recovered);
    assert_eq!(parsed.content, reloaded.content);
    Ok(())
}

#[tokio::test]
async fn corrupted_template_still_yields_usable_editor_state() -> anyhow::Result<()> {
    // Truncated mid-save: repairable
    let truncated = r#"{"type": "doc", "content": [{"type": "paragraph", "content": [
        {"type": "mention", "attrs": {"id": "tenant_name"#;
    let repaired = parse_template_content(Some(&json!(truncated)));
    assert!(repaired.success);
    assert!(repaired.was_recovered);

    // Beyond repair: the editor still gets an empty document, never null
    let garbage = parse_template_content(Some(&json!("not json at all")));
    assert!(!garbage.success);
    assert!(garbage.was_recovered);
    assert_eq!(garbage.content.content.len(), 1);
    Ok(())
}
