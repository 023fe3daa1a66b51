use std::collections::{BTreeMap, BTreeSet};

use lattice_core::{
    AppError, AppResult, IntegrationId, IntegrationModelId, NonEmptyString, ProjectId,
};
use serde::{Deserialize, Serialize};

/// Value type of one integration configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationConfigType {
    /// Single-line text value.
    String,
    /// Multi-line text value.
    Text,
    /// Secret value, always sealed at rest.
    Password,
    /// Boolean flag stored as `"true"` or `"false"`.
    Boolean,
}

impl IntegrationConfigType {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Password => "password",
            Self::Boolean => "boolean",
        }
    }

    /// Parses stable storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "string" => Ok(Self::String),
            "text" => Ok(Self::Text),
            "password" => Ok(Self::Password),
            "boolean" => Ok(Self::Boolean),
            _ => Err(AppError::Validation(format!(
                "unknown integration config type '{value}'"
            ))),
        }
    }
}

/// One configuration field of an integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConfigValue {
    /// Field value.
    pub value: String,
    /// Field value type.
    #[serde(rename = "type")]
    pub kind: IntegrationConfigType,
    /// Optional operator-facing description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl IntegrationConfigValue {
    /// Creates a configuration value without description.
    #[must_use]
    pub fn new(kind: IntegrationConfigType, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind,
            description: None,
        }
    }

    /// Returns whether the field type is a secret.
    #[must_use]
    pub fn is_password(&self) -> bool {
        self.kind == IntegrationConfigType::Password
    }
}

/// Ordered set of named configuration fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegrationConfig(BTreeMap<String, IntegrationConfigValue>);

impl IntegrationConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts or replaces one field.
    pub fn insert(&mut self, name: impl Into<String>, value: IntegrationConfigValue) {
        self.0.insert(name.into(), value);
    }

    /// Returns one field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&IntegrationConfigValue> {
        self.0.get(name)
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &IntegrationConfigValue)> {
        self.0.iter()
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the configuration has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the names of fields typed as passwords.
    #[must_use]
    pub fn password_fields(&self) -> BTreeSet<String> {
        self.0
            .iter()
            .filter(|(_, value)| value.is_password())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Blanks the values of the named fields and returns how many were present.
    pub fn blank_fields(&mut self, names: &BTreeSet<String>) -> usize {
        let mut blanked = 0;
        for (name, value) in &mut self.0 {
            if names.contains(name) {
                value.value.clear();
                blanked += 1;
            }
        }

        blanked
    }
}

impl FromIterator<(String, IntegrationConfigValue)> for IntegrationConfig {
    fn from_iter<T: IntoIterator<Item = (String, IntegrationConfigValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for IntegrationConfig {
    type Item = (String, IntegrationConfigValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, IntegrationConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Features an integration type provides to workflows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationCapabilities {
    /// Artifact storage.
    pub storage: bool,
    /// Deployment target.
    pub deployment: bool,
    /// Repository hook source.
    pub hook: bool,
    /// Compute provider for workers.
    pub compute: bool,
    /// Event sink.
    pub event: bool,
}

/// Shape of an integration type, including which fields are sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationModel {
    id: IntegrationModelId,
    name: NonEmptyString,
    author: String,
    description: Option<String>,
    default_config: IntegrationConfig,
    public_configurations: BTreeMap<String, IntegrationConfig>,
    public: bool,
    capabilities: IntegrationCapabilities,
}

/// Input payload used to construct a validated integration model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationModelInput {
    /// Unique model name.
    pub name: String,
    /// Model author.
    pub author: String,
    /// Optional description.
    pub description: Option<String>,
    /// Field shape with default values.
    pub default_config: IntegrationConfig,
    /// Preset configurations shared by every project, keyed by name.
    pub public_configurations: BTreeMap<String, IntegrationConfig>,
    /// Whether the model is offered to every project.
    pub public: bool,
    /// Provided capabilities.
    pub capabilities: IntegrationCapabilities,
}

impl IntegrationModelInput {
    /// Validates the input without an identity.
    pub fn validate(&self) -> AppResult<()> {
        NonEmptyString::new(self.name.as_str())?;
        if self
            .public_configurations
            .keys()
            .any(|configuration_name| configuration_name.trim().is_empty())
        {
            return Err(AppError::Validation(
                "public configuration names must not be empty".to_owned(),
            ));
        }

        Ok(())
    }
}

impl IntegrationModel {
    /// Creates a validated integration model.
    pub fn new(id: IntegrationModelId, input: IntegrationModelInput) -> AppResult<Self> {
        input.validate()?;
        let IntegrationModelInput {
            name,
            author,
            description,
            default_config,
            public_configurations,
            public,
            capabilities,
        } = input;

        let description = description.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            author,
            description,
            default_config,
            public_configurations,
            public,
            capabilities,
        })
    }

    /// Returns model identifier.
    #[must_use]
    pub fn id(&self) -> IntegrationModelId {
        self.id
    }

    /// Returns model name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns model author.
    #[must_use]
    pub fn author(&self) -> &str {
        self.author.as_str()
    }

    /// Returns optional model description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the field shape with default values.
    #[must_use]
    pub fn default_config(&self) -> &IntegrationConfig {
        &self.default_config
    }

    /// Returns preset configurations keyed by name.
    #[must_use]
    pub fn public_configurations(&self) -> &BTreeMap<String, IntegrationConfig> {
        &self.public_configurations
    }

    /// Returns whether the model is offered to every project.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Returns provided capabilities.
    #[must_use]
    pub fn capabilities(&self) -> IntegrationCapabilities {
        self.capabilities
    }

    /// Returns the names of fields this model declares sensitive.
    #[must_use]
    pub fn sensitive_fields(&self) -> BTreeSet<String> {
        self.default_config.password_fields()
    }

    /// Blanks sensitive values held by public configurations.
    pub fn redact_public_configurations(&mut self) {
        let sensitive_fields = self.sensitive_fields();
        for configuration in self.public_configurations.values_mut() {
            let mut names = configuration.password_fields();
            names.extend(sensitive_fields.iter().cloned());
            configuration.blank_fields(&names);
        }
    }
}

/// Project-scoped integration configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectIntegration {
    id: IntegrationId,
    project_id: ProjectId,
    name: NonEmptyString,
    integration_model_id: IntegrationModelId,
    config: IntegrationConfig,
    model: Option<IntegrationModel>,
    signature: String,
}

/// Input payload used to create or replace an integration record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIntegrationInput {
    /// Owning project.
    pub project_id: ProjectId,
    /// Name unique within the project.
    pub name: String,
    /// Model describing the record shape.
    pub integration_model_id: IntegrationModelId,
    /// Configuration values.
    pub config: IntegrationConfig,
}

impl ProjectIntegrationInput {
    /// Validates the input without an identity.
    pub fn validate(&self) -> AppResult<()> {
        NonEmptyString::new(self.name.as_str()).map(|_| ())
    }
}

impl ProjectIntegration {
    /// Creates a persisted integration record from its stored parts.
    pub fn new(
        id: IntegrationId,
        input: ProjectIntegrationInput,
        signature: impl Into<String>,
    ) -> AppResult<Self> {
        let ProjectIntegrationInput {
            project_id,
            name,
            integration_model_id,
            config,
        } = input;

        Ok(Self {
            id,
            project_id,
            name: NonEmptyString::new(name)?,
            integration_model_id,
            config,
            model: None,
            signature: signature.into(),
        })
    }

    /// Returns record identifier.
    #[must_use]
    pub fn id(&self) -> IntegrationId {
        self.id
    }

    /// Returns owning project identifier.
    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns record name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns referenced model identifier.
    #[must_use]
    pub fn integration_model_id(&self) -> IntegrationModelId {
        self.integration_model_id
    }

    /// Returns configuration values.
    #[must_use]
    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    /// Returns the attached model, once resolved.
    #[must_use]
    pub fn model(&self) -> Option<&IntegrationModel> {
        self.model.as_ref()
    }

    /// Returns the signature computed at the last write.
    #[must_use]
    pub fn signature(&self) -> &str {
        self.signature.as_str()
    }

    /// Attaches the resolved model.
    pub fn attach_model(&mut self, model: IntegrationModel) {
        self.model = Some(model);
    }

    /// Replaces the configuration wholesale.
    pub fn replace_config(&mut self, config: IntegrationConfig) {
        self.config = config;
    }

    /// Renames the record.
    pub fn rename(&mut self, name: impl Into<String>) -> AppResult<()> {
        self.name = NonEmptyString::new(name)?;
        Ok(())
    }

    /// Irreversibly blanks every field the model declares sensitive.
    ///
    /// Returns the number of blanked fields.
    pub fn redact(&mut self, model: &IntegrationModel) -> usize {
        self.config.blank_fields(&model.sensitive_fields())
    }

    /// Returns the input that would recreate this record's stored fields.
    #[must_use]
    pub fn to_input(&self) -> ProjectIntegrationInput {
        ProjectIntegrationInput {
            project_id: self.project_id,
            name: self.name.as_str().to_owned(),
            integration_model_id: self.integration_model_id,
            config: self.config.clone(),
        }
    }
}
