//! Integration tests for the workflow engine lifecycle.
//!
//! These tests drive complete approval chains through a real SQLite store:
//! submit, stage-by-stage approval, decline, attach self-loops, cancel
//! authorization, optimistic-lock conflicts, and pending queues.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use common::TestContext;
use signoff::domain::models::{
    ActorRule, AuditAction, StageAction, StageDefinition, WorkflowInstance, WorkflowStatus,
    WorkflowTemplate,
};
use signoff::domain::ports::{SideEffectHook, TemplateRepository};
use signoff::services::{ActionRequest, HookRegistry};
use signoff::EngineError;

// ============================================================================
// Full chains
// ============================================================================

#[tokio::test]
async fn test_full_chain_settles_approved() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-1001").await;

    assert_eq!(instance.status, WorkflowStatus::Active);
    assert_eq!(instance.current_stage_index, 0);
    assert_eq!(instance.version, 1);

    ctx.approve(instance.id, ctx.hod).await;
    ctx.approve(instance.id, ctx.finance_a).await;
    let settled = ctx.approve(instance.id, ctx.finance_manager).await;

    assert_eq!(settled.status, WorkflowStatus::Approved);
    assert_eq!(settled.version, 4);
    assert_eq!(
        settled.current_stage_index, 2,
        "Cursor freezes at the last stage instead of advancing past it"
    );
    assert!(settled.closed_at.is_some());

    let trail = ctx.engine.audit_trail(instance.id).await.unwrap();
    assert_eq!(trail.len(), 4);
    assert_eq!(
        trail.iter().map(|e| e.sequence_number).collect::<Vec<_>>(),
        vec![1, 2, 3, 4],
        "Sequence numbers are gap-free from one"
    );
    assert_eq!(trail[0].action, AuditAction::Submit);
    assert_eq!(trail[3].action, AuditAction::Approve);
    assert_eq!(
        trail.iter().map(|e| e.stage_name.as_str()).collect::<Vec<_>>(),
        vec!["HOD", "HOD", "Finance", "Finance Manager"],
        "Each entry records the stage the action was taken at"
    );
}

#[tokio::test]
async fn test_decline_terminates_mid_chain() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-1002").await;

    ctx.approve(instance.id, ctx.hod).await;
    let declined = ctx
        .decline(instance.id, ctx.finance_b, "insufficient budget")
        .await;

    assert_eq!(declined.status, WorkflowStatus::Declined);
    assert_eq!(
        declined.current_stage_index, 1,
        "Declined instances keep the stage they stopped at"
    );
    assert!(declined.closed_at.is_some());

    let trail = ctx.engine.audit_trail(instance.id).await.unwrap();
    assert_eq!(trail.len(), 3);
    assert_eq!(trail[2].action, AuditAction::Decline);
    assert_eq!(trail[2].stage_name, "Finance");
    assert_eq!(trail[2].comment.as_deref(), Some("insufficient budget"));
}

#[tokio::test]
async fn test_terminal_instance_refuses_actions() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-1003").await;
    ctx.decline(instance.id, ctx.hod, "not needed").await;

    let err = ctx
        .engine
        .act(ActionRequest::new(
            instance.id,
            ctx.hod,
            StageAction::Approve,
            2,
        ))
        .await
        .unwrap_err();
    assert!(
        matches!(err, EngineError::TerminalState { .. }),
        "Approve on a settled instance must fail, got {err:?}"
    );

    let err = ctx
        .engine
        .cancel(instance.id, ctx.initiator, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TerminalState { .. }));
}

// ============================================================================
// Attach self-loop
// ============================================================================

#[tokio::test]
async fn test_attach_preserves_stage_and_bumps_version() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-1004").await;

    let attached = ctx
        .engine
        .act(
            ActionRequest::new(instance.id, ctx.hod, StageAction::Attach, 1)
                .with_attachment("blob://quote-7841")
                .with_comment("vendor quote"),
        )
        .await
        .unwrap();

    assert_eq!(attached.status, WorkflowStatus::Active);
    assert_eq!(attached.current_stage_index, 0, "Attach never advances");
    assert_eq!(attached.version, 2, "Attach still bumps the version");

    // The stage gate is unchanged, so the same approver continues
    let advanced = ctx.approve(instance.id, ctx.hod).await;
    assert_eq!(advanced.current_stage_index, 1);

    let trail = ctx.engine.audit_trail(instance.id).await.unwrap();
    assert_eq!(trail[1].action, AuditAction::Attach);
    assert_eq!(trail[1].attachment_ref.as_deref(), Some("blob://quote-7841"));
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn test_unauthorized_actor_rejected() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-1005").await;

    // finance_a gates stage 1, not stage 0
    let err = ctx
        .engine
        .act(ActionRequest::new(
            instance.id,
            ctx.finance_a,
            StageAction::Approve,
            1,
        ))
        .await
        .unwrap_err();

    assert!(
        matches!(err, EngineError::UnauthorizedActor { .. }),
        "Only the resolved actor set may act, got {err:?}"
    );

    let unchanged = ctx.engine.get(instance.id).await.unwrap();
    assert_eq!(unchanged.version, 1, "Rejected actions leave no trace");
}

#[tokio::test]
async fn test_cancel_restricted_to_initiator_or_admin() {
    let ctx = TestContext::new().await;

    let first = ctx.submit("PR-1006").await;
    let err = ctx
        .engine
        .cancel(first.id, ctx.outsider, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnauthorizedActor { .. }));

    let cancelled = ctx
        .engine
        .cancel(first.id, ctx.admin, Some("duplicate request".into()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, WorkflowStatus::Cancelled);

    let second = ctx.submit("PR-1007").await;
    let cancelled = ctx.engine.cancel(second.id, ctx.initiator, None).await.unwrap();
    assert_eq!(cancelled.status, WorkflowStatus::Cancelled);

    let trail = ctx.engine.audit_trail(first.id).await.unwrap();
    assert_eq!(trail[1].action, AuditAction::Cancel);
    assert_eq!(trail[1].comment.as_deref(), Some("duplicate request"));
}

// ============================================================================
// Optimistic concurrency
// ============================================================================

#[tokio::test]
async fn test_stale_version_rejected() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-1008").await;
    ctx.approve(instance.id, ctx.hod).await;

    // A decision made against version 1 arrives after the advance to 2
    let err = ctx
        .engine
        .act(ActionRequest::new(
            instance.id,
            ctx.finance_a,
            StageAction::Approve,
            1,
        ))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::ConcurrentModification {
            expected_version: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn test_concurrent_acts_have_single_winner() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-1009").await;

    let first = ctx.engine.act(ActionRequest::new(
        instance.id,
        ctx.hod,
        StageAction::Approve,
        1,
    ));
    let second = ctx.engine.act(ActionRequest::new(
        instance.id,
        ctx.hod,
        StageAction::Approve,
        1,
    ));

    let (r1, r2) = tokio::join!(first, second);
    let outcomes = [r1, r2];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "Exactly one of two same-version acts may commit");

    let loss = outcomes
        .iter()
        .find(|r| r.is_err())
        .and_then(|r| r.as_ref().err())
        .unwrap();
    assert!(matches!(loss, EngineError::ConcurrentModification { .. }));

    let reloaded = ctx.engine.get(instance.id).await.unwrap();
    assert_eq!(reloaded.version, 2, "No double advance");
    assert_eq!(reloaded.current_stage_index, 1);

    let trail = ctx.engine.audit_trail(instance.id).await.unwrap();
    assert_eq!(trail.len(), 2, "The losing act appends nothing");
}

// ============================================================================
// Pending queues
// ============================================================================

#[tokio::test]
async fn test_pending_queue_follows_cursor() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-1010").await;

    let hod_queue = ctx.engine.pending_for(ctx.hod).await.unwrap();
    assert!(hod_queue.iter().any(|i| i.id == instance.id));
    assert!(ctx.engine.pending_for(ctx.finance_a).await.unwrap().is_empty());

    ctx.approve(instance.id, ctx.hod).await;

    assert!(ctx.engine.pending_for(ctx.hod).await.unwrap().is_empty());
    for finance_user in [ctx.finance_a, ctx.finance_b] {
        let queue = ctx.engine.pending_for(finance_user).await.unwrap();
        assert!(
            queue.iter().any(|i| i.id == instance.id),
            "Every holder of the gating role sees the instance"
        );
    }

    ctx.approve(instance.id, ctx.finance_b).await;
    ctx.approve(instance.id, ctx.finance_manager).await;

    assert!(ctx.engine.pending_for(ctx.finance_manager).await.unwrap().is_empty());
}

// ============================================================================
// Side-effect hooks
// ============================================================================

#[derive(Default)]
struct RecordingHook {
    approved: AtomicUsize,
    declined: AtomicUsize,
}

#[async_trait]
impl SideEffectHook for RecordingHook {
    async fn on_approved(&self, _instance: &WorkflowInstance) -> anyhow::Result<()> {
        self.approved.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn on_declined(&self, _instance: &WorkflowInstance) -> anyhow::Result<()> {
        self.declined.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_settlement_fires_only_the_matching_templates_hooks() {
    let procurement = Arc::new(RecordingHook::default());
    let customer = Arc::new(RecordingHook::default());
    let mut hooks = HookRegistry::new();
    hooks.register("procurement-request", procurement.clone());
    hooks.register("customer-approval", customer.clone());
    let ctx = TestContext::with_hooks(hooks).await;

    let instance = ctx.submit("PR-2001").await;
    ctx.approve(instance.id, ctx.hod).await;
    ctx.approve(instance.id, ctx.finance_a).await;
    assert_eq!(
        procurement.approved.load(Ordering::SeqCst),
        0,
        "Hooks wait for settlement, not intermediate advances"
    );
    ctx.approve(instance.id, ctx.finance_manager).await;

    assert_eq!(procurement.approved.load(Ordering::SeqCst), 1);
    assert_eq!(procurement.declined.load(Ordering::SeqCst), 0);
    assert_eq!(
        customer.approved.load(Ordering::SeqCst),
        0,
        "Settling a procurement instance must not touch another domain's hook"
    );

    let second = ctx.submit("PR-2002").await;
    ctx.decline(second.id, ctx.hod, "budget freeze").await;

    assert_eq!(procurement.declined.load(Ordering::SeqCst), 1);
    assert_eq!(customer.declined.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Stage action restriction and template snapshots
// ============================================================================

#[tokio::test]
async fn test_restricted_stage_rejects_unlisted_action() {
    let ctx = TestContext::new().await;

    let mut stage = StageDefinition::new("HOD", ActorRule::ByRole { role: "hod".into() });
    stage.allowed_actions = vec![StageAction::Approve];
    let template = WorkflowTemplate::new("approve-only", vec![stage]);
    ctx.templates.insert(&template).await.unwrap();

    let instance = ctx
        .engine
        .submit("approve-only", "PR-1011", ctx.initiator, None)
        .await
        .unwrap();

    let err = ctx
        .engine
        .act(
            ActionRequest::new(instance.id, ctx.hod, StageAction::Decline, 1)
                .with_comment("should not be possible"),
        )
        .await
        .unwrap_err();

    assert!(
        matches!(err, EngineError::InvalidAction { .. }),
        "Decline is not in this stage's allowed actions, got {err:?}"
    );
}

#[tokio::test]
async fn test_template_edit_does_not_affect_inflight_instances() {
    let ctx = TestContext::new().await;
    let instance = ctx.submit("PR-1012").await;

    // Administrator reworks the chain while the instance is active
    let mut edited = ctx
        .templates
        .get_by_name("procurement-request")
        .await
        .unwrap()
        .unwrap();
    edited
        .replace_stages(vec![
            StageDefinition::new("Compliance", ActorRule::ByRole { role: "compliance".into() }),
        ])
        .unwrap();
    ctx.templates.update(&edited).await.unwrap();

    // The in-flight instance still follows its captured three-stage chain
    ctx.approve(instance.id, ctx.hod).await;
    ctx.approve(instance.id, ctx.finance_a).await;
    let settled = ctx.approve(instance.id, ctx.finance_manager).await;

    assert_eq!(settled.status, WorkflowStatus::Approved);
    assert_eq!(settled.template_snapshot.len(), 3);
    assert_eq!(settled.template_snapshot[0].name, "HOD");

    // New submissions pick up the edited chain
    let fresh = ctx.submit("PR-1013").await;
    assert_eq!(fresh.template_snapshot.len(), 1);
    assert_eq!(fresh.template_snapshot[0].name, "Compliance");
}

#[tokio::test]
async fn test_get_unknown_instance() {
    let ctx = TestContext::new().await;
    let err = ctx.engine.get(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, EngineError::InstanceNotFound(_)));
}

#[tokio::test]
async fn test_submit_unknown_template() {
    let ctx = TestContext::new().await;
    let err = ctx
        .engine
        .submit("no-such-template", "PR-1014", ctx.initiator, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TemplateNotFound(_)));
}
