use super::*;

impl IntegrationService {
    /// Persists a new integration and returns the signed record.
    ///
    /// Fields the model declares sensitive, and fields typed as passwords,
    /// are sealed before they reach storage. The returned record carries the
    /// storage-assigned identity and signature with values in clear form.
    pub async fn insert_integration(
        &self,
        input: ProjectIntegrationInput,
    ) -> AppResult<ProjectIntegration> {
        input.validate()?;
        let model = self
            .model_service
            .resolve(input.integration_model_id, false)
            .await?;
        let row = self.seal(&input, &model)?;

        let stored = self
            .repository
            .insert_and_sign(row, self.signer.as_ref())
            .await?;

        info!(
            integration_id = %stored.id,
            project_id = %stored.project_id,
            name = %stored.name,
            "integration inserted"
        );

        let mut integration = ProjectIntegration::new(stored.id, input, stored.signature)?;
        integration.attach_model(model);
        Ok(integration)
    }

    /// Replaces every stored field of an integration and re-signs it.
    ///
    /// The signature always changes, even when no value did.
    pub async fn update_integration(
        &self,
        integration: ProjectIntegration,
    ) -> AppResult<ProjectIntegration> {
        let id = integration.id();
        let input = integration.to_input();
        input.validate()?;
        let model = self
            .model_service
            .resolve(input.integration_model_id, false)
            .await?;
        let row = self.seal(&input, &model)?;

        let stored = self
            .repository
            .update_and_sign(id, row, self.signer.as_ref())
            .await?;

        info!(
            integration_id = %stored.id,
            project_id = %stored.project_id,
            name = %stored.name,
            "integration updated"
        );

        let mut updated = ProjectIntegration::new(stored.id, input, stored.signature)?;
        updated.attach_model(model);
        Ok(updated)
    }

    /// Deletes one integration. Workflow associations are left untouched.
    pub async fn delete_integration(&self, id: IntegrationId) -> AppResult<()> {
        self.repository.delete_integration(id).await?;
        info!(integration_id = %id, "integration deleted");
        Ok(())
    }

    fn seal(
        &self,
        input: &ProjectIntegrationInput,
        model: &IntegrationModel,
    ) -> AppResult<NewStoredIntegration> {
        let mut sensitive_fields = model.sensitive_fields();
        sensitive_fields.extend(input.config.password_fields());

        Ok(NewStoredIntegration {
            project_id: input.project_id,
            name: input.name.clone(),
            integration_model_id: input.integration_model_id,
            config: seal_config(self.cipher.as_ref(), &input.config, &sensitive_fields)?,
        })
    }
}
