//! Common test utilities for integration tests
//!
//! Wires a complete engine over an in-memory database with a seeded
//! procurement template and a directory of test users.

use std::sync::Arc;

use uuid::Uuid;

use signoff::domain::models::{
    ActorRule, StageAction, StageDefinition, WorkflowInstance, WorkflowTemplate,
};
use signoff::domain::ports::{NotificationChannel, TemplateRepository};
use signoff::infrastructure::database::{
    Database, SqliteAuditStore, SqliteInstanceRepository, SqliteTemplateRepository,
};
use signoff::infrastructure::directory::StaticDirectory;
use signoff::infrastructure::notify::InAppChannel;
use signoff::services::{
    ActionRequest, DispatchMode, HookRegistry, NotificationDispatcher, WorkflowEngine,
};

pub type TestEngine = WorkflowEngine<
    SqliteTemplateRepository,
    SqliteInstanceRepository,
    SqliteAuditStore,
    StaticDirectory,
>;

/// A wired engine plus the test users the seeded directory knows about.
#[allow(dead_code)]
pub struct TestContext {
    pub engine: TestEngine,
    pub templates: Arc<SqliteTemplateRepository>,
    pub inbox: InAppChannel,
    pub initiator: Uuid,
    pub hod: Uuid,
    pub finance_a: Uuid,
    pub finance_b: Uuid,
    pub finance_manager: Uuid,
    pub admin: Uuid,
    pub outsider: Uuid,
    _db: Database,
}

/// The three-stage chain most tests submit against.
#[allow(dead_code)]
pub fn procurement_template() -> WorkflowTemplate {
    WorkflowTemplate::new(
        "procurement-request",
        vec![
            StageDefinition::new("HOD", ActorRule::ByRole { role: "hod".into() }),
            StageDefinition::new(
                "Finance",
                ActorRule::ByRole {
                    role: "finance".into(),
                },
            ),
            StageDefinition::new(
                "Finance Manager",
                ActorRule::ByRole {
                    role: "finance_manager".into(),
                },
            ),
        ],
    )
    .with_description("Purchase requisition approval chain")
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_hooks(HookRegistry::new()).await
    }

    /// Same wiring, with side-effect hooks registered on the engine.
    pub async fn with_hooks(hooks: HookRegistry) -> Self {
        let db = Database::connect_in_memory()
            .await
            .expect("in-memory database");

        let initiator = Uuid::new_v4();
        let hod = Uuid::new_v4();
        let finance_a = Uuid::new_v4();
        let finance_b = Uuid::new_v4();
        let finance_manager = Uuid::new_v4();
        let admin = Uuid::new_v4();
        let outsider = Uuid::new_v4();

        let directory = Arc::new(
            StaticDirectory::empty()
                .with_role("hod", [hod])
                .with_role("finance", [finance_a, finance_b])
                .with_role("finance_manager", [finance_manager])
                .with_relation("PR-3001", "department_head_of_requester", hod)
                .with_administrator(admin),
        );

        let template_repo = Arc::new(SqliteTemplateRepository::new(db.pool().clone()));
        let instance_repo = Arc::new(SqliteInstanceRepository::new(db.pool().clone()));
        let audit_store = Arc::new(SqliteAuditStore::new(db.pool().clone()));

        let channels: Vec<Arc<dyn NotificationChannel>> =
            vec![Arc::new(InAppChannel::new(db.pool().clone()))];
        let dispatcher =
            Arc::new(NotificationDispatcher::new(channels).with_mode(DispatchMode::Inline));

        let engine = WorkflowEngine::new(
            template_repo.clone(),
            instance_repo,
            audit_store,
            directory,
            dispatcher,
        )
        .with_hooks(Arc::new(hooks));

        template_repo
            .insert(&procurement_template())
            .await
            .expect("seed template");

        Self {
            engine,
            templates: template_repo,
            inbox: InAppChannel::new(db.pool().clone()),
            initiator,
            hod,
            finance_a,
            finance_b,
            finance_manager,
            admin,
            outsider,
            _db: db,
        }
    }

    /// Raw pool handle for direct SQL assertions.
    #[allow(dead_code)]
    pub fn pool(&self) -> &sqlx::SqlitePool {
        self._db.pool()
    }

    /// Submit a procurement instance for `subject`.
    pub async fn submit(&self, subject: &str) -> WorkflowInstance {
        self.engine
            .submit("procurement-request", subject, self.initiator, None)
            .await
            .expect("submit instance")
    }

    /// Approve at the instance's current version.
    #[allow(dead_code)]
    pub async fn approve(&self, instance_id: Uuid, actor: Uuid) -> WorkflowInstance {
        let current = self.engine.get(instance_id).await.expect("get instance");
        self.engine
            .act(ActionRequest::new(
                instance_id,
                actor,
                StageAction::Approve,
                current.version,
            ))
            .await
            .expect("approve")
    }

    /// Decline at the instance's current version.
    #[allow(dead_code)]
    pub async fn decline(
        &self,
        instance_id: Uuid,
        actor: Uuid,
        comment: &str,
    ) -> WorkflowInstance {
        let current = self.engine.get(instance_id).await.expect("get instance");
        self.engine
            .act(
                ActionRequest::new(instance_id, actor, StageAction::Decline, current.version)
                    .with_comment(comment),
            )
            .await
            .expect("decline")
    }
}
