//! Integration tests for notification routing.
//!
//! Every transition re-resolves the current stage and notifies its actor
//! set through the in-app channel; terminal transitions notify the
//! initiator, and stages that resolve to nobody alert administrators.

mod common;

use common::TestContext;
use signoff::domain::models::{
    ActorRule, NotificationKind, StageAction, StageDefinition, WorkflowStatus, WorkflowTemplate,
};
use signoff::domain::ports::TemplateRepository;
use signoff::services::ActionRequest;
use signoff::EngineError;
use uuid::Uuid;

async fn unread(ctx: &TestContext, user: Uuid) -> Vec<signoff::Notification> {
    ctx.inbox.inbox(user, false).await.expect("read inbox")
}

// ============================================================================
// Stage gate notifications
// ============================================================================

#[tokio::test]
async fn test_submit_notifies_first_stage_actors() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-3100").await;

    let inbox = unread(&ctx, ctx.hod).await;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::ActionRequired);
    assert_eq!(inbox[0].instance_id, instance.id);
    assert!(inbox[0].message.contains("PR-3100"));
    assert!(inbox[0].message.contains("HOD"));

    assert!(
        unread(&ctx, ctx.finance_a).await.is_empty(),
        "Later stages are not notified yet"
    );
}

#[tokio::test]
async fn test_advance_notifies_every_holder_of_the_next_gate() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-3101").await;
    ctx.approve(instance.id, ctx.hod).await;

    for finance_user in [ctx.finance_a, ctx.finance_b] {
        let inbox = unread(&ctx, finance_user).await;
        assert_eq!(inbox.len(), 1, "Each role holder gets their own copy");
        assert_eq!(inbox[0].kind, NotificationKind::ActionRequired);
        assert!(inbox[0].message.contains("Finance"));
    }
}

#[tokio::test]
async fn test_attach_renotifies_the_same_gate() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-3102").await;

    ctx.engine
        .act(
            ActionRequest::new(instance.id, ctx.hod, StageAction::Attach, 1)
                .with_attachment("blob://invoice-scan"),
        )
        .await
        .unwrap();

    let inbox = unread(&ctx, ctx.hod).await;
    assert_eq!(
        inbox.len(),
        2,
        "Submit and attach each notify the stage-0 gate"
    );
}

// ============================================================================
// Terminal notifications
// ============================================================================

#[tokio::test]
async fn test_decline_notifies_initiator() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-3103").await;
    ctx.decline(instance.id, ctx.hod, "no longer required").await;

    let inbox = unread(&ctx, ctx.initiator).await;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::TerminalResolution);
    assert!(inbox[0].message.contains("declined"));
}

#[tokio::test]
async fn test_final_approval_notifies_initiator() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-3104").await;
    ctx.approve(instance.id, ctx.hod).await;
    ctx.approve(instance.id, ctx.finance_a).await;
    ctx.approve(instance.id, ctx.finance_manager).await;

    let inbox = unread(&ctx, ctx.initiator).await;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::TerminalResolution);
    assert!(inbox[0].message.contains("approved"));
}

// ============================================================================
// Relation-based routing
// ============================================================================

#[tokio::test]
async fn test_relation_rule_routes_to_the_bound_user() {
    let ctx = TestContext::new().await;

    let template = WorkflowTemplate::new(
        "expense-claim",
        vec![StageDefinition::new(
            "Department Head",
            ActorRule::ByRelation {
                relation: "department_head_of_requester".into(),
            },
        )],
    );
    ctx.templates.insert(&template).await.unwrap();

    // The directory binds (PR-3001, department_head_of_requester) to hod
    ctx.engine
        .submit("expense-claim", "PR-3001", ctx.initiator, None)
        .await
        .unwrap();

    let inbox = unread(&ctx, ctx.hod).await;
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].message.contains("Department Head"));
}

// ============================================================================
// Stalled stages
// ============================================================================

fn board_review_template() -> WorkflowTemplate {
    WorkflowTemplate::new(
        "board-review",
        vec![
            StageDefinition::new("HOD", ActorRule::ByRole { role: "hod".into() }),
            StageDefinition::new(
                "Board",
                ActorRule::ByRole {
                    // Nobody holds this role in the test directory
                    role: "procurement-board".into(),
                },
            ),
        ],
    )
}

#[tokio::test]
async fn test_advancing_into_an_empty_stage_alerts_administrators() {
    let ctx = TestContext::new().await;
    ctx.templates.insert(&board_review_template()).await.unwrap();

    let instance = ctx
        .engine
        .submit("board-review", "PR-3105", ctx.initiator, None)
        .await
        .unwrap();
    let advanced = ctx.approve(instance.id, ctx.hod).await;

    assert_eq!(
        advanced.status,
        WorkflowStatus::Active,
        "The transition itself commits; only the follow-up gate is stalled"
    );
    assert_eq!(advanced.current_stage_index, 1);

    let admin_inbox = unread(&ctx, ctx.admin).await;
    assert_eq!(admin_inbox.len(), 1);
    assert_eq!(admin_inbox[0].kind, NotificationKind::StalledStage);
    assert!(admin_inbox[0].message.contains("procurement-board"));

    // A stalled instance sits in nobody's pending queue
    for user in [ctx.hod, ctx.finance_a, ctx.admin] {
        assert!(ctx
            .engine
            .pending_for(user)
            .await
            .unwrap()
            .iter()
            .all(|i| i.id != instance.id));
    }
}

#[tokio::test]
async fn test_acting_on_a_stalled_stage_fails_and_alerts_again() {
    let ctx = TestContext::new().await;
    ctx.templates.insert(&board_review_template()).await.unwrap();

    let instance = ctx
        .engine
        .submit("board-review", "PR-3106", ctx.initiator, None)
        .await
        .unwrap();
    ctx.approve(instance.id, ctx.hod).await;

    let err = ctx
        .engine
        .act(ActionRequest::new(
            instance.id,
            ctx.admin,
            StageAction::Approve,
            2,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ActorResolution { .. }));

    let admin_inbox = unread(&ctx, ctx.admin).await;
    assert_eq!(
        admin_inbox.len(),
        2,
        "The advance and the failed act each raise a stalled-stage alert"
    );
}

#[tokio::test]
async fn test_stalled_first_stage_does_not_fail_submission() {
    let ctx = TestContext::new().await;

    let template = WorkflowTemplate::new(
        "orphaned",
        vec![StageDefinition::new(
            "Ghost",
            ActorRule::ByRole {
                role: "nobody".into(),
            },
        )],
    );
    ctx.templates.insert(&template).await.unwrap();

    let instance = ctx
        .engine
        .submit("orphaned", "PR-3107", ctx.initiator, None)
        .await
        .unwrap();
    assert_eq!(instance.status, WorkflowStatus::Active);

    let admin_inbox = unread(&ctx, ctx.admin).await;
    assert_eq!(admin_inbox.len(), 1);
    assert_eq!(admin_inbox[0].kind, NotificationKind::StalledStage);
}

// ============================================================================
// Inbox management
// ============================================================================

#[tokio::test]
async fn test_mark_read_clears_the_unread_view() {
    let ctx = TestContext::new().await;
    ctx.submit("PR-3108").await;

    let inbox = unread(&ctx, ctx.hod).await;
    assert_eq!(inbox.len(), 1);

    ctx.inbox.mark_read(inbox[0].id).await.unwrap();
    assert!(unread(&ctx, ctx.hod).await.is_empty());

    let with_read = ctx.inbox.inbox(ctx.hod, true).await.unwrap();
    assert_eq!(with_read.len(), 1);
    assert!(with_read[0].read);
}
