//! End-to-end tests for the fully wired engine stack.
//!
//! Each test assembles the real components (management surface, automation
//! store, matcher, executor) over the in-memory adapters and pushes change
//! events through `process_event`, then inspects the collaborators.

use std::sync::Arc;

use serde_json::Value;

use rulehub_adapter_memory::{MemoryKeyValueStore, MemoryRecordStore, MemoryTaskInbox};
use rulehub_app::engine::AutomationEngine;
use rulehub_app::executor::ActionExecutor;
use rulehub_app::management::{ManagementApi, ManagementRequest};
use rulehub_app::store::AutomationStore;
use rulehub_domain::event::{ChangeEvent, Operation, Record};

const WORKSPACE: &str = "ws1";
const PERSONA: &str = "sales-assistant";

struct Stack {
    management: ManagementApi<Arc<MemoryKeyValueStore>>,
    engine: AutomationEngine<
        AutomationStore<Arc<MemoryKeyValueStore>>,
        Arc<MemoryRecordStore>,
        Arc<MemoryTaskInbox>,
    >,
    records: Arc<MemoryRecordStore>,
    tasks: Arc<MemoryTaskInbox>,
}

fn stack(records: MemoryRecordStore) -> Stack {
    let kv = Arc::new(MemoryKeyValueStore::default());
    let records = Arc::new(records);
    let tasks = Arc::new(MemoryTaskInbox::default());

    let management = ManagementApi::new(AutomationStore::new(Arc::clone(&kv)), None);
    let executor = ActionExecutor::new(Arc::clone(&records), Arc::clone(&tasks), WORKSPACE, PERSONA);
    let engine = AutomationEngine::new(AutomationStore::new(kv), executor, WORKSPACE);

    Stack {
        management,
        engine,
        records,
        tasks,
    }
}

async fn create_automation(stack: &Stack, name: &str, config: Value) {
    let response = stack
        .management
        .handle(
            WORKSPACE,
            &ManagementRequest::new("create")
                .with_name(name)
                .with_config(config),
        )
        .await;
    assert!(response.starts_with("Created"), "got {response:?}");
}

fn record(json: Value) -> Record {
    match json {
        Value::Object(map) => map,
        other => panic!("expected object, got {other:?}"),
    }
}

fn welcome_config() -> Value {
    serde_json::json!({
        "triggers": [{
            "type": "table_change",
            "table": "crm_contact",
            "operations": ["insert", "update"],
            "filters": ["contact_tags:not_contains:welcome_email_sent"],
        }],
        "actions": [
            {
                "type": "post_task",
                "title": "Send welcome to {{trigger.new_record.contact_email}}",
            },
            {
                "type": "update_record",
                "table": "crm_contact",
                "record_id": "{{trigger.new_record.contact_id}}",
                "fields": {
                    "contact_tags": {"op": "append", "values": ["welcome_email_sent"]},
                },
            },
        ],
    })
}

fn contact_insert(tags: Value) -> ChangeEvent {
    ChangeEvent::new(
        "crm_contact",
        Operation::Insert,
        None,
        Some(record(serde_json::json!({
            "contact_id": "c1",
            "contact_email": "a@b.com",
            "contact_tags": tags,
        }))),
    )
}

#[tokio::test]
async fn should_send_welcome_email_end_to_end() {
    let stack = stack(MemoryRecordStore::with(
        WORKSPACE,
        "crm_contact",
        vec![record(serde_json::json!({
            "record_id": "c1",
            "contact_email": "a@b.com",
            "contact_tags": [],
        }))],
    ));
    create_automation(&stack, "welcome-email", welcome_config()).await;

    let executed = stack
        .engine
        .process_event(&contact_insert(serde_json::json!([])))
        .await
        .unwrap();
    assert_eq!(executed, vec!["welcome-email".to_string()]);

    // Task posted once, with the resolved title.
    let posted = stack.tasks.posted().unwrap();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].task.title, "Send welcome to a@b.com");
    assert_eq!(posted[0].persona, PERSONA);

    // Tag atomically appended to the contact record.
    let rows = stack.records.snapshot(WORKSPACE, "crm_contact").unwrap();
    assert_eq!(
        rows[0].get("contact_tags"),
        Some(&serde_json::json!(["welcome_email_sent"]))
    );
}

#[tokio::test]
async fn should_execute_automations_in_creation_order() {
    let stack = stack(MemoryRecordStore::with(
        WORKSPACE,
        "crm_contact",
        vec![record(serde_json::json!({
            "record_id": "c1",
            "contact_email": "a@b.com",
            "contact_tags": [],
        }))],
    ));
    // Names chosen so lexicographic order would flip them.
    create_automation(&stack, "zeta-first", welcome_config()).await;
    create_automation(&stack, "alpha-second", welcome_config()).await;

    let executed = stack
        .engine
        .process_event(&contact_insert(serde_json::json!([])))
        .await
        .unwrap();
    assert_eq!(
        executed,
        vec!["zeta-first".to_string(), "alpha-second".to_string()]
    );
}

#[tokio::test]
async fn should_not_rerun_once_tag_is_present() {
    let stack = stack(MemoryRecordStore::with(
        WORKSPACE,
        "crm_contact",
        vec![record(serde_json::json!({
            "record_id": "c1",
            "contact_tags": ["welcome_email_sent"],
        }))],
    ));
    create_automation(&stack, "welcome-email", welcome_config()).await;

    // The update event carries the tag written by the first run.
    let event = ChangeEvent::new(
        "crm_contact",
        Operation::Update,
        Some(record(serde_json::json!({"contact_id": "c1"}))),
        Some(record(serde_json::json!({
            "contact_id": "c1",
            "contact_email": "a@b.com",
            "contact_tags": ["welcome_email_sent"],
        }))),
    );
    let executed = stack.engine.process_event(&event).await.unwrap();
    assert!(executed.is_empty());
    assert!(stack.tasks.posted().unwrap().is_empty());
}

#[tokio::test]
async fn should_evaluate_delete_filters_against_before_snapshot() {
    let stack = stack(MemoryRecordStore::default());
    create_automation(
        &stack,
        "churn-alert",
        serde_json::json!({
            "triggers": [{
                "type": "table_change",
                "table": "crm_contact",
                "operations": ["delete"],
                "filters": ["contact_status:=:active"],
            }],
            "actions": [{
                "type": "post_task",
                "title": "Active contact {{trigger.old_record.contact_email}} was deleted",
            }],
        }),
    )
    .await;

    let event = ChangeEvent::new(
        "crm_contact",
        Operation::Delete,
        Some(record(serde_json::json!({
            "contact_email": "gone@b.com",
            "contact_status": "active",
        }))),
        None,
    );
    let executed = stack.engine.process_event(&event).await.unwrap();
    assert_eq!(executed, vec!["churn-alert".to_string()]);

    let posted = stack.tasks.posted().unwrap();
    assert_eq!(
        posted[0].task.title,
        "Active contact gone@b.com was deleted"
    );
}

#[tokio::test]
async fn should_observe_management_edits_on_the_next_event() {
    let stack = stack(MemoryRecordStore::default());
    create_automation(&stack, "welcome-email", welcome_config()).await;

    // First event runs the automation.
    let first = stack
        .engine
        .process_event(&contact_insert(serde_json::json!([])))
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    // Delete it through the management surface; no restart, no cache.
    let response = stack
        .management
        .handle(
            WORKSPACE,
            &ManagementRequest::new("delete").with_name("welcome-email"),
        )
        .await;
    assert!(response.starts_with("Deleted"), "got {response:?}");

    let second = stack
        .engine
        .process_event(&contact_insert(serde_json::json!([])))
        .await
        .unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn should_move_pipeline_stage_when_deal_is_won() {
    let stack = stack(MemoryRecordStore::with(
        WORKSPACE,
        "crm_contact_pipeline",
        vec![record(serde_json::json!({
            "record_id": "m1",
            "contact_id": "c1",
            "pipeline_id": "p1",
            "stage_id": "negotiation",
        }))],
    ));
    create_automation(
        &stack,
        "advance-winner",
        serde_json::json!({
            "triggers": [{
                "type": "table_change",
                "table": "crm_deal",
                "operations": ["update"],
                "filters": ["deal_status:=:won"],
            }],
            "actions": [{
                "type": "move_pipeline_stage",
                "contact_id": "{{trigger.new_record.contact_id}}",
                "pipeline_id": "p1",
                "from_stages": ["negotiation"],
                "to_stage_id": "closed-won",
            }],
        }),
    )
    .await;

    let event = ChangeEvent::new(
        "crm_deal",
        Operation::Update,
        Some(record(serde_json::json!({"deal_status": "open"}))),
        Some(record(serde_json::json!({
            "contact_id": "c1",
            "deal_status": "won",
        }))),
    );
    stack.engine.process_event(&event).await.unwrap();

    let rows = stack
        .records
        .snapshot(WORKSPACE, "crm_contact_pipeline")
        .unwrap();
    assert_eq!(
        rows[0].get("stage_id"),
        Some(&serde_json::json!("closed-won"))
    );
}

#[tokio::test]
async fn should_create_follow_up_record_with_workspace_id() {
    let stack = stack(MemoryRecordStore::default());
    create_automation(
        &stack,
        "log-signup",
        serde_json::json!({
            "triggers": [{
                "type": "table_change",
                "table": "crm_contact",
                "operations": ["insert"],
            }],
            "actions": [{
                "type": "create_record",
                "table": "crm_note",
                "fields": {
                    "body": "signup from {{trigger.new_record.contact_email}}",
                    "follow_up_ts": "{{now() + 3600}}",
                },
            }],
        }),
    )
    .await;

    stack
        .engine
        .process_event(&contact_insert(serde_json::json!([])))
        .await
        .unwrap();

    let rows = stack.records.snapshot(WORKSPACE, "crm_note").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("body"),
        Some(&serde_json::json!("signup from a@b.com"))
    );
    assert_eq!(
        rows[0].get("workspace_id"),
        Some(&serde_json::json!(WORKSPACE))
    );
    // The `_ts` suffix coerces the resolved arithmetic to a number.
    assert!(rows[0].get("follow_up_ts").is_some_and(Value::is_number));
}
