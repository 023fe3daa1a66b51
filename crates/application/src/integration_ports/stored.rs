use std::collections::BTreeMap;

use lattice_core::{AppError, AppResult, IntegrationId, IntegrationModelId, ProjectId};
use lattice_domain::{IntegrationCapabilities, IntegrationConfig, IntegrationConfigType};
use serde::{Deserialize, Serialize};

/// One configuration field as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfigValue {
    /// Field value type.
    #[serde(rename = "type")]
    pub kind: IntegrationConfigType,
    /// Plain value, or sealed ciphertext when `sealed` is set.
    pub value: String,
    /// Optional operator-facing description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether `value` holds ciphertext produced by a [`crate::FieldCipher`].
    #[serde(default)]
    pub sealed: bool,
}

/// Persisted configuration keyed by field name.
pub type StoredIntegrationConfig = BTreeMap<String, StoredConfigValue>;

/// Integration row before the store assigns an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStoredIntegration {
    /// Owning project.
    pub project_id: ProjectId,
    /// Name unique within the project.
    pub name: String,
    /// Referenced model.
    pub integration_model_id: IntegrationModelId,
    /// Persisted configuration.
    pub config: StoredIntegrationConfig,
}

impl NewStoredIntegration {
    /// Attaches an identity and a signature to the row.
    #[must_use]
    pub fn into_stored(self, id: IntegrationId, signature: impl Into<String>) -> StoredIntegration {
        StoredIntegration {
            id,
            project_id: self.project_id,
            name: self.name,
            integration_model_id: self.integration_model_id,
            config: self.config,
            signature: signature.into(),
        }
    }
}

/// Integration row as persisted, including its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredIntegration {
    /// Storage-assigned identity.
    pub id: IntegrationId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Name unique within the project.
    pub name: String,
    /// Referenced model.
    pub integration_model_id: IntegrationModelId,
    /// Persisted configuration, sensitive values sealed.
    pub config: StoredIntegrationConfig,
    /// Signature over [`StoredIntegration::canonical_bytes`].
    pub signature: String,
}

/// Row as read back from storage, before its signature is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedIntegration {
    /// Persisted columns decoded into the stored form.
    Decoded(StoredIntegration),
    /// Persisted columns no longer decode, so the row cannot match its
    /// signature and is treated as corrupted.
    Undecodable {
        /// Raw storage identity of the row.
        id: i64,
        /// Decode failure.
        reason: String,
    },
}

impl From<StoredIntegration> for FetchedIntegration {
    fn from(value: StoredIntegration) -> Self {
        Self::Decoded(value)
    }
}

#[derive(Serialize)]
struct CanonicalIntegration<'a> {
    id: i64,
    project_id: i64,
    name: &'a str,
    integration_model_id: i64,
    config: &'a StoredIntegrationConfig,
}

impl StoredIntegration {
    /// Returns the deterministic byte representation covered by the signature.
    ///
    /// Every persisted column except the signature itself takes part, sealed
    /// values in their ciphertext form.
    pub fn canonical_bytes(&self) -> AppResult<Vec<u8>> {
        serde_json::to_vec(&CanonicalIntegration {
            id: self.id.as_i64(),
            project_id: self.project_id.as_i64(),
            name: self.name.as_str(),
            integration_model_id: self.integration_model_id.as_i64(),
            config: &self.config,
        })
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to build canonical form of integration '{}': {error}",
                self.id
            ))
        })
    }
}

/// Integration model row before the store assigns an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStoredIntegrationModel {
    /// Unique model name.
    pub name: String,
    /// Model author.
    pub author: String,
    /// Optional description.
    pub description: Option<String>,
    /// Field shape with default values.
    pub default_config: IntegrationConfig,
    /// Preset configurations, sensitive values sealed.
    pub public_configurations: BTreeMap<String, StoredIntegrationConfig>,
    /// Whether the model is offered to every project.
    pub public: bool,
    /// Provided capabilities.
    pub capabilities: IntegrationCapabilities,
}

impl NewStoredIntegrationModel {
    /// Attaches an identity to the row.
    #[must_use]
    pub fn into_stored(self, id: IntegrationModelId) -> StoredIntegrationModel {
        StoredIntegrationModel {
            id,
            name: self.name,
            author: self.author,
            description: self.description,
            default_config: self.default_config,
            public_configurations: self.public_configurations,
            public: self.public,
            capabilities: self.capabilities,
        }
    }
}

/// Integration model row as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredIntegrationModel {
    /// Storage-assigned identity.
    pub id: IntegrationModelId,
    /// Unique model name.
    pub name: String,
    /// Model author.
    pub author: String,
    /// Optional description.
    pub description: Option<String>,
    /// Field shape with default values.
    pub default_config: IntegrationConfig,
    /// Preset configurations, sensitive values sealed.
    pub public_configurations: BTreeMap<String, StoredIntegrationConfig>,
    /// Whether the model is offered to every project.
    pub public: bool,
    /// Provided capabilities.
    pub capabilities: IntegrationCapabilities,
}
