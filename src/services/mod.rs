pub mod dispatcher;
pub mod engine;
pub mod export;
pub mod hooks;
pub mod resolver;
pub mod templates;

pub use dispatcher::{DispatchMode, NotificationDispatcher};
pub use engine::{ActionRequest, WorkflowEngine};
pub use export::{ExportError, ExportFormat};
pub use hooks::HookRegistry;
pub use resolver::ActorResolver;
pub use templates::TemplateService;
