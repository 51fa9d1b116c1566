use crate::domain::models::WorkflowInstance;
use async_trait::async_trait;

/// Per-domain callback fired after an instance settles.
///
/// Implementations live with the call site: create the customer record on
/// final approval, release the held stock on decline. Hooks run after the
/// transition has committed; a hook failure is logged and never rolls the
/// instance back.
#[async_trait]
pub trait SideEffectHook: Send + Sync {
    /// Fired when an instance settles as Approved
    async fn on_approved(&self, instance: &WorkflowInstance) -> anyhow::Result<()>;

    /// Fired when an instance settles as Declined
    async fn on_declined(&self, instance: &WorkflowInstance) -> anyhow::Result<()>;
}
