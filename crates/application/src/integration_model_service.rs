//! Integration model resolution.
//!
//! Every integration load consults the model: which fields are sensitive is
//! a property of the model, not of the record.

use std::collections::BTreeMap;
use std::sync::Arc;

use lattice_core::{AppError, AppResult, IntegrationModelId};
use lattice_domain::{IntegrationModel, IntegrationModelInput};
use tracing::{debug, info};

use crate::config_sealing::{open_config, seal_config};
use crate::{FieldCipher, IntegrationModelRepository, NewStoredIntegrationModel};

/// Application service owning integration models.
#[derive(Clone)]
pub struct IntegrationModelService {
    repository: Arc<dyn IntegrationModelRepository>,
    cipher: Arc<dyn FieldCipher>,
}

impl IntegrationModelService {
    /// Creates a new model service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn IntegrationModelRepository>,
        cipher: Arc<dyn FieldCipher>,
    ) -> Self {
        Self { repository, cipher }
    }

    /// Loads one model by identifier.
    ///
    /// Sealed values of public configurations are opened when
    /// `clear_password` is set and blanked otherwise. A missing model is
    /// always an error.
    pub async fn resolve(
        &self,
        model_id: IntegrationModelId,
        clear_password: bool,
    ) -> AppResult<IntegrationModel> {
        let stored = self
            .repository
            .find_model(model_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("integration model '{model_id}' not found"))
            })?;

        let public_configurations = stored
            .public_configurations
            .into_iter()
            .map(|(name, config)| {
                open_config(self.cipher.as_ref(), config, clear_password)
                    .map(|config| (name, config))
            })
            .collect::<AppResult<BTreeMap<_, _>>>()?;

        let mut model = IntegrationModel::new(
            stored.id,
            IntegrationModelInput {
                name: stored.name,
                author: stored.author,
                description: stored.description,
                default_config: stored.default_config,
                public_configurations,
                public: stored.public,
                capabilities: stored.capabilities,
            },
        )?;

        if !clear_password {
            model.redact_public_configurations();
        }

        debug!(model_id = %model_id, clear_password, "integration model resolved");
        Ok(model)
    }

    /// Registers a new model, sealing sensitive public configuration values.
    pub async fn register_model(&self, input: IntegrationModelInput) -> AppResult<IntegrationModel> {
        input.validate()?;

        let model_sensitive_fields = input.default_config.password_fields();
        let public_configurations = input
            .public_configurations
            .iter()
            .map(|(name, config)| {
                let mut sensitive_fields = config.password_fields();
                sensitive_fields.extend(model_sensitive_fields.iter().cloned());
                seal_config(self.cipher.as_ref(), config, &sensitive_fields)
                    .map(|sealed| (name.clone(), sealed))
            })
            .collect::<AppResult<BTreeMap<_, _>>>()?;

        let stored = self
            .repository
            .insert_model(NewStoredIntegrationModel {
                name: input.name.clone(),
                author: input.author.clone(),
                description: input.description.clone(),
                default_config: input.default_config.clone(),
                public_configurations,
                public: input.public,
                capabilities: input.capabilities,
            })
            .await?;

        info!(model_id = %stored.id, name = %stored.name, "integration model registered");
        IntegrationModel::new(stored.id, input)
    }
}

#[cfg(test)]
mod tests;
