//! Evaluation definitions and their transactional creation.
//!
//! An evaluation pairs a metadata variant (how a score is computed) with a
//! result configuration variant (what shape the score has). Both live in
//! their own tables and are written together with the evaluation row in a
//! single transaction.
//!
//! # Architecture
//!
//! - **Storage** ([`Database`], [`UnitOfWork`]) owns the libSQL connection;
//!   every write runs inside a unit of work.
//! - **Workflows** ([`service`]) take an explicit `&mut UnitOfWork` and buffer
//!   their events on it.
//! - **Manager** ([`EvaluationManager`]) commits or rolls back each unit of
//!   work and hands committed events to a [`judgekit_events::EventPublisher`].

mod commands;
mod configuration;
mod error;
mod evaluation;
mod events;
mod manager;
mod metadata;
pub mod service;
pub mod storage;
mod template;
mod types;
mod workspace;

// Command types
pub use commands::{
    ConnectEvaluations, CreateAdvancedEvaluation, CreateEvaluation, CreateEvaluationRequest,
    ImportTemplate, NewProviderApiKey, NewTemplate, NewUser, NewWorkspace,
};

// Result configuration
pub use configuration::{
    BooleanConfiguration, BooleanConfigurationInput, NumericalConfiguration,
    NumericalConfigurationInput, ResultConfiguration, ResultConfigurationInput, TextConfiguration,
    TextConfigurationInput, validate_result_configuration,
};

// Errors
pub use error::{Error, Result};

// Evaluation types
pub use evaluation::{Evaluation, EvaluationDto, MetadataType, ResultType};

// Event types
pub use events::{EvalEvent, StoredEvalEvent};

// Manager
pub use manager::EvaluationManager;

// Metadata
pub use metadata::{
    AdvancedMetadataInput, EvaluationMetadata, LlmAsJudgeAdvancedMetadata,
    LlmAsJudgeSimpleMetadata, MetadataInput, SimpleMetadataInput,
};

// Storage
pub use storage::documents::ConnectedEvaluation;
pub use storage::{Database, UnitOfWork};

// Templates
pub use template::{EvaluationTemplate, TemplateConfiguration, TemplateDetail, TemplateRange};

// ID types
pub use types::{EvaluationId, ProjectId, ProviderApiKeyId, TemplateId, UserId, WorkspaceId};

// Tenancy
pub use workspace::{Provider, ProviderApiKey, SafeUser, SessionData, User, Workspace, WorkspaceRef};
