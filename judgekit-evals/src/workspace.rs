//! Tenancy and identity context: workspaces, users and provider keys.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{ProviderApiKeyId, UserId, WorkspaceId};

/// Top-level tenant. Owns evaluations and provider keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub default_provider_id: Option<ProviderApiKeyId>,
    pub created_at: DateTime<Utc>,
}

/// An authenticated user. Only attribution data is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// User data that is safe to hand to clients. No secrets are stored on
/// users, so this is the full row.
pub type SafeUser = User;

/// Minimal workspace reference carried in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceRef {
    pub id: WorkspaceId,
    pub name: String,
}

impl From<&Workspace> for WorkspaceRef {
    fn from(workspace: &Workspace) -> Self {
        Self {
            id: workspace.id,
            name: workspace.name.clone(),
        }
    }
}

/// Identity context resolved for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user: SafeUser,
    pub workspace: WorkspaceRef,
}

/// LLM vendor behind a provider API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Anthropic,
    Groq,
    Mistral,
    Azure,
    Google,
    Custom,
}

impl Provider {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Groq => "groq",
            Self::Mistral => "mistral",
            Self::Azure => "azure",
            Self::Google => "google",
            Self::Custom => "custom",
        }
    }

    /// Models offered by default for this provider, preferred first.
    ///
    /// Azure and custom endpoints serve user-named deployments, so they have none.
    #[must_use]
    pub fn default_models(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAI => &["gpt-4o-mini", "gpt-4o", "gpt-4-turbo", "gpt-3.5-turbo"],
            Self::Anthropic => &[
                "claude-3-5-sonnet-20240620",
                "claude-3-opus-20240229",
                "claude-3-haiku-20240307",
            ],
            Self::Groq => &["llama3-70b-8192", "llama3-8b-8192", "mixtral-8x7b-32768"],
            Self::Mistral => &["mistral-large-latest", "mistral-small-latest"],
            Self::Google => &["gemini-1.5-pro", "gemini-1.5-flash"],
            Self::Azure | Self::Custom => &[],
        }
    }

    /// First default model for this provider, if any.
    #[must_use]
    pub fn first_model(&self) -> Option<&'static str> {
        self.default_models().first().copied()
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "groq" => Ok(Self::Groq),
            "mistral" => Ok(Self::Mistral),
            "azure" => Ok(Self::Azure),
            "google" => Ok(Self::Google),
            "custom" => Ok(Self::Custom),
            other => Err(Error::BadRequest(format!("Invalid provider {other}"))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured LLM provider credential in a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderApiKey {
    pub id: ProviderApiKeyId,
    pub workspace_id: WorkspaceId,
    /// Workspace-unique display name, referenced from prompt front matter.
    pub name: String,
    pub provider: Provider,
    #[serde(skip_serializing)]
    pub token: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_model_is_head_of_default_list() {
        assert_eq!(Provider::OpenAI.first_model(), Some("gpt-4o-mini"));
        assert_eq!(
            Provider::Anthropic.first_model(),
            Some("claude-3-5-sonnet-20240620")
        );
        assert_eq!(Provider::Custom.first_model(), None);
    }

    #[test]
    fn provider_round_trips_through_str() {
        for provider in [
            Provider::OpenAI,
            Provider::Anthropic,
            Provider::Groq,
            Provider::Mistral,
            Provider::Azure,
            Provider::Google,
            Provider::Custom,
        ] {
            assert_eq!(provider.as_str().parse::<Provider>().unwrap(), provider);
        }
    }

    #[test]
    fn provider_key_token_is_not_serialized() {
        let key = ProviderApiKey {
            id: 1,
            workspace_id: 1,
            name: "openai".into(),
            provider: Provider::OpenAI,
            token: "sk-secret".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&key).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
