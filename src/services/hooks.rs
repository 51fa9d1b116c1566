//! Side-effect hook registry.
//!
//! Embedding applications register hooks under the template name they
//! serve; when an instance settles, the engine fires only the hooks
//! registered for that instance's template. Hook failures are logged and
//! swallowed, so the instance's settled state is never at the mercy of a
//! downstream integration.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::models::WorkflowInstance;
use crate::domain::ports::hooks::SideEffectHook;

/// Registry of post-settlement side-effect hooks, keyed by template name
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<String, Vec<Arc<dyn SideEffectHook>>>,
}

impl HookRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook for instances of the named template. A template
    /// may carry several hooks; they fire in registration order.
    pub fn register(&mut self, template_name: impl Into<String>, hook: Arc<dyn SideEffectHook>) {
        let template_name = template_name.into();
        info!(template = %template_name, "Registering side-effect hook");
        self.hooks.entry(template_name).or_default().push(hook);
    }

    /// Number of registered hooks across all templates
    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Fire the settling template's `on_approved` callbacks.
    pub async fn fire_approved(&self, instance: &WorkflowInstance) {
        let Some(hooks) = self.hooks.get(&instance.template_name) else {
            debug!(
                instance_id = %instance.id,
                template = %instance.template_name,
                "No hooks registered for template, skipping"
            );
            return;
        };

        for hook in hooks {
            if let Err(e) = hook.on_approved(instance).await {
                warn!(
                    template = %instance.template_name,
                    instance_id = %instance.id,
                    error = %e,
                    "on_approved hook failed; instance remains approved"
                );
            }
        }
    }

    /// Fire the settling template's `on_declined` callbacks.
    pub async fn fire_declined(&self, instance: &WorkflowInstance) {
        let Some(hooks) = self.hooks.get(&instance.template_name) else {
            debug!(
                instance_id = %instance.id,
                template = %instance.template_name,
                "No hooks registered for template, skipping"
            );
            return;
        };

        for hook in hooks {
            if let Err(e) = hook.on_declined(instance).await {
                warn!(
                    template = %instance.template_name,
                    instance_id = %instance.id,
                    error = %e,
                    "on_declined hook failed; instance remains declined"
                );
            }
        }
    }
}
