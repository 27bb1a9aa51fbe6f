//! Transactional entry point for evaluation workflows.
//!
//! [`EvaluationManager`] opens a unit of work per command, runs one workflow
//! in it, and commits or rolls back. Events buffered by the workflow are
//! handed to the publisher only after a successful commit.

use tracing::{debug, error, instrument};
use uuid::Uuid;

use judgekit_events::EventPublisher;

use crate::commands::{
    ConnectEvaluations, CreateAdvancedEvaluation, CreateEvaluation, CreateEvaluationRequest,
    ImportTemplate, NewProviderApiKey, NewTemplate, NewUser, NewWorkspace,
};
use crate::error::Result;
use crate::evaluation::{Evaluation, EvaluationDto};
use crate::events::StoredEvalEvent;
use crate::service;
use crate::storage::documents::{self, ConnectedEvaluation};
use crate::storage::{Database, UnitOfWork, evaluations, providers, templates, users, workspaces};
use crate::template::EvaluationTemplate;
use crate::types::WorkspaceId;
use crate::workspace::{ProviderApiKey, SessionData, User, Workspace, WorkspaceRef};

/// Runs evaluation workflows against a database and publishes their events.
pub struct EvaluationManager {
    db: Database,
    publisher: EventPublisher<StoredEvalEvent>,
}

impl EvaluationManager {
    /// Create a new evaluation manager.
    pub fn new(db: Database, publisher: EventPublisher<StoredEvalEvent>) -> Self {
        Self { db, publisher }
    }

    /// The underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Commit on success, roll back on failure, then release events.
    async fn finish<T>(&self, operation: &'static str, uow: UnitOfWork, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                let events = uow.commit().await.inspect_err(|e| {
                    error!(operation, error = %e, "failed to commit unit of work");
                })?;
                debug!(operation, events = events.len(), "unit of work committed");
                self.publisher.publish_all(events);
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    error!(operation, error = %rollback_err, "failed to roll back unit of work");
                }
                if err.is_expected() {
                    debug!(operation, kind = err.kind(), error = %err, "operation rejected");
                } else {
                    error!(operation, kind = err.kind(), error = %err, "operation failed");
                }
                Err(err)
            }
        }
    }

    // === Commands ===

    /// Create a workspace.
    pub async fn create_workspace(&self, cmd: NewWorkspace) -> Result<Workspace> {
        let uow = self.db.begin().await?;
        let result = workspaces::create_workspace(uow.conn(), cmd).await;
        self.finish("create_workspace", uow, result).await
    }

    /// Register a user.
    pub async fn create_user(&self, cmd: NewUser) -> Result<User> {
        let uow = self.db.begin().await?;
        let result = users::create_user(uow.conn(), cmd).await;
        self.finish("create_user", uow, result).await
    }

    /// Store a provider API key.
    pub async fn create_provider_api_key(&self, cmd: NewProviderApiKey) -> Result<ProviderApiKey> {
        let uow = self.db.begin().await?;
        let result = providers::create_provider_api_key(uow.conn(), cmd).await;
        self.finish("create_provider_api_key", uow, result).await
    }

    /// Store an evaluation template.
    pub async fn create_template(&self, cmd: NewTemplate) -> Result<EvaluationTemplate> {
        let uow = self.db.begin().await?;
        let result = templates::create_template(uow.conn(), cmd).await;
        self.finish("create_template", uow, result).await
    }

    /// Create an evaluation.
    #[instrument(skip_all, fields(workspace_id = cmd.workspace.id, name = %cmd.name))]
    pub async fn create_evaluation(&self, cmd: CreateEvaluation) -> Result<EvaluationDto> {
        let mut uow = self.db.begin().await?;
        let result = service::create_evaluation(&mut uow, cmd).await;
        self.finish("create_evaluation", uow, result).await
    }

    /// Create an evaluation from an untyped request.
    ///
    /// Unknown discriminators and malformed payloads are rejected before a
    /// unit of work is opened.
    pub async fn create_evaluation_from_request(
        &self,
        request: CreateEvaluationRequest,
        workspace: Workspace,
        user: User,
    ) -> Result<EvaluationDto> {
        let cmd = request.into_command(workspace, user)?;
        self.create_evaluation(cmd).await
    }

    /// Create an advanced evaluation from a prompt.
    #[instrument(skip_all, fields(workspace_id = cmd.workspace.id, name = %cmd.name))]
    pub async fn create_advanced_evaluation(
        &self,
        cmd: CreateAdvancedEvaluation,
    ) -> Result<EvaluationDto> {
        let mut uow = self.db.begin().await?;
        let result = service::create_advanced_evaluation(&mut uow, cmd).await;
        self.finish("create_advanced_evaluation", uow, result).await
    }

    /// Create an evaluation from a stored template.
    #[instrument(skip_all, fields(workspace_id = cmd.workspace.id, template_id = cmd.template_id))]
    pub async fn import_template(&self, cmd: ImportTemplate) -> Result<EvaluationDto> {
        let mut uow = self.db.begin().await?;
        let result = service::import_llm_as_judge_evaluation(&mut uow, cmd).await;
        self.finish("import_template", uow, result).await
    }

    /// Link evaluations to a document.
    #[instrument(skip_all, fields(workspace_id = cmd.workspace.id, document_uuid = %cmd.document_uuid))]
    pub async fn connect_evaluations(
        &self,
        cmd: ConnectEvaluations,
    ) -> Result<Vec<ConnectedEvaluation>> {
        let mut uow = self.db.begin().await?;
        let result = documents::connect_evaluations(
            &mut uow,
            &cmd.workspace,
            &cmd.document_uuid,
            &cmd.evaluation_uuids,
            &cmd.user,
        )
        .await;
        self.finish("connect_evaluations", uow, result).await
    }

    // === Queries ===

    /// Get a workspace by id.
    pub async fn find_workspace(&self, id: WorkspaceId) -> Result<Workspace> {
        workspaces::find_workspace(self.db.connection(), id).await
    }

    /// Get a user by id. A missing id matches nothing.
    pub async fn get_user(&self, id: Option<&str>) -> Result<Option<User>> {
        users::get_user(self.db.connection(), id).await
    }

    /// Get a user by id, failing when absent.
    pub async fn find_user(&self, id: &str) -> Result<User> {
        users::find_user(self.db.connection(), id).await
    }

    /// Resolve the identity context of a user acting in a workspace.
    pub async fn session_data(&self, user_id: &str, workspace_id: WorkspaceId) -> Result<SessionData> {
        let user = self.find_user(user_id).await?;
        let workspace = self.find_workspace(workspace_id).await?;
        Ok(SessionData {
            user,
            workspace: WorkspaceRef::from(&workspace),
        })
    }

    /// List the evaluations of a workspace, newest first.
    pub async fn list_evaluations(&self, workspace_id: WorkspaceId) -> Result<Vec<Evaluation>> {
        evaluations::list_evaluations(self.db.connection(), workspace_id).await
    }

    /// Get an evaluation with its nested variants.
    pub async fn find_evaluation(&self, workspace_id: WorkspaceId, uuid: Uuid) -> Result<EvaluationDto> {
        evaluations::find_evaluation_dto(self.db.connection(), workspace_id, uuid).await
    }

    /// List all templates.
    pub async fn list_templates(&self) -> Result<Vec<EvaluationTemplate>> {
        templates::list_templates(self.db.connection()).await
    }

    /// List the links of a document.
    pub async fn list_connected_evaluations(&self, document_uuid: &str) -> Result<Vec<ConnectedEvaluation>> {
        documents::list_connected_evaluations(self.db.connection(), document_uuid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use judgekit_events::{InMemoryEventLog, channel};

    use crate::configuration::{BooleanConfigurationInput, ResultConfigurationInput};
    use crate::error::Error;
    use crate::events::EvalEvent;
    use crate::metadata::{MetadataInput, SimpleMetadataInput};

    async fn create_test_manager() -> (
        EvaluationManager,
        Arc<InMemoryEventLog<StoredEvalEvent>>,
        judgekit_events::EventDispatcher<StoredEvalEvent>,
    ) {
        let log = Arc::new(InMemoryEventLog::<StoredEvalEvent>::new());
        let (publisher, dispatcher) = channel::<StoredEvalEvent>(log.clone());
        let db = Database::new_memory().await.unwrap();
        (EvaluationManager::new(db, publisher), log, dispatcher)
    }

    async fn workspace_and_user(manager: &EvaluationManager) -> (Workspace, User) {
        let workspace = manager
            .create_workspace(NewWorkspace { name: "acme".into() })
            .await
            .unwrap();
        let user = manager
            .create_user(NewUser {
                id: "user-1".into(),
                email: "ada@example.com".into(),
                name: None,
            })
            .await
            .unwrap();
        (workspace, user)
    }

    fn tone_check(workspace: Workspace, user: User) -> CreateEvaluation {
        CreateEvaluation {
            workspace,
            user,
            name: "Tone Check".into(),
            description: String::new(),
            metadata: MetadataInput::LlmAsJudgeSimple(SimpleMetadataInput {
                provider_api_key_id: None,
                model: None,
                objective: "Is the reply polite?".into(),
                additional_instructions: None,
            }),
            result_configuration: ResultConfigurationInput::Boolean(
                BooleanConfigurationInput::default(),
            ),
            project_id: None,
            document_uuid: None,
        }
    }

    #[tokio::test]
    async fn create_evaluation_publishes_event_after_commit() {
        let (manager, log, dispatcher) = create_test_manager().await;
        let (workspace, user) = workspace_and_user(&manager).await;

        let dto = manager
            .create_evaluation(tone_check(workspace.clone(), user))
            .await
            .unwrap();
        drop(manager);
        let delivered = dispatcher.run().await;

        assert_eq!(delivered, 1);
        let events = log.events().await;
        match &events[0].event {
            EvalEvent::EvaluationCreated {
                evaluation,
                workspace_id,
                user_email,
                ..
            } => {
                assert_eq!(evaluation, &dto.evaluation);
                assert_eq!(*workspace_id, workspace.id);
                assert_eq!(user_email, "ada@example.com");
            }
            other => panic!("expected EvaluationCreated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_workflow_publishes_nothing() {
        let (manager, log, dispatcher) = create_test_manager().await;
        let (workspace, user) = workspace_and_user(&manager).await;

        let mut cmd = tone_check(workspace.clone(), user);
        cmd.metadata = MetadataInput::LlmAsJudgeSimple(SimpleMetadataInput {
            provider_api_key_id: Some(999),
            model: None,
            objective: "Is the reply polite?".into(),
            additional_instructions: None,
        });
        let err = manager.create_evaluation(cmd).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(manager.list_evaluations(workspace.id).await.unwrap().is_empty());

        drop(manager);
        assert_eq!(dispatcher.run().await, 0);
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn session_data_resolves_user_and_workspace() {
        let (manager, _log, _dispatcher) = create_test_manager().await;
        let (workspace, user) = workspace_and_user(&manager).await;

        let session = manager.session_data(&user.id, workspace.id).await.unwrap();
        assert_eq!(session.user, user);
        assert_eq!(session.workspace.name, "acme");

        let err = manager.session_data("nobody", workspace.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn get_user_without_id_is_none() {
        let (manager, _log, _dispatcher) = create_test_manager().await;
        workspace_and_user(&manager).await;

        assert!(manager.get_user(None).await.unwrap().is_none());
        assert!(manager.get_user(Some("user-1")).await.unwrap().is_some());
    }
}
