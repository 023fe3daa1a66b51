use super::*;

/// Result of a multi-record load.
///
/// Rows that fail signature verification, or no longer decode at all, are
/// dropped rather than failing the whole batch; `skipped_corrupted` reports
/// how many.
#[derive(Debug, Clone, Default)]
pub struct IntegrationBatch {
    /// Valid integrations, in storage order.
    pub integrations: Vec<ProjectIntegration>,
    /// Number of rows dropped as corrupted.
    pub skipped_corrupted: usize,
}

enum Verified {
    Valid(StoredIntegration),
    Corrupted { id: i64, reason: String },
}

impl IntegrationService {
    /// Loads the single record matching `query`.
    ///
    /// A record whose signature does not verify is reported as not found;
    /// callers cannot distinguish tampering from absence.
    pub async fn load_one(
        &self,
        query: IntegrationQuery,
        clear_password: bool,
    ) -> AppResult<ProjectIntegration> {
        let stored = self
            .repository
            .fetch_integration(&query)
            .await?
            .ok_or_else(|| not_found(&query))?;

        let stored = match self.verify(stored)? {
            Verified::Valid(stored) => stored,
            Verified::Corrupted { id, reason } => {
                error!(
                    integration_id = id,
                    query = %query,
                    %reason,
                    "integration data corrupted"
                );
                return Err(not_found(&query));
            }
        };

        let model = self
            .model_service
            .resolve(stored.integration_model_id, clear_password)
            .await?;
        self.materialize(stored, model, clear_password)
    }

    /// Loads every record matching `query`.
    ///
    /// Corrupted rows are skipped and counted. Signing subsystem failures and
    /// unresolvable models fail the whole batch.
    pub async fn load_all(
        &self,
        query: IntegrationQuery,
        clear_password: bool,
    ) -> AppResult<IntegrationBatch> {
        let rows = self.repository.fetch_integrations(&query).await?;
        let total = rows.len();

        let mut valid_rows = Vec::with_capacity(total);
        for row in rows {
            match self.verify(row)? {
                Verified::Valid(row) => valid_rows.push(row),
                Verified::Corrupted { id, reason } => {
                    error!(
                        integration_id = id,
                        query = %query,
                        %reason,
                        "integration data corrupted"
                    );
                }
            }
        }

        let skipped_corrupted = total - valid_rows.len();
        if skipped_corrupted > 0 {
            warn!(
                query = %query,
                skipped_corrupted,
                returned = valid_rows.len(),
                "skipped corrupted integrations in batch load"
            );
        }

        let mut models: HashMap<IntegrationModelId, IntegrationModel> = HashMap::new();
        let mut integrations = Vec::with_capacity(valid_rows.len());
        for row in valid_rows {
            let model = match models.get(&row.integration_model_id) {
                Some(model) => model.clone(),
                None => {
                    let model = self
                        .model_service
                        .resolve(row.integration_model_id, clear_password)
                        .await?;
                    models.insert(row.integration_model_id, model.clone());
                    model
                }
            };

            integrations.push(self.materialize(row, model, clear_password)?);
        }

        Ok(IntegrationBatch {
            integrations,
            skipped_corrupted,
        })
    }

    fn verify(&self, fetched: FetchedIntegration) -> AppResult<Verified> {
        let stored = match fetched {
            FetchedIntegration::Decoded(stored) => stored,
            FetchedIntegration::Undecodable { id, reason } => {
                return Ok(Verified::Corrupted { id, reason });
            }
        };

        let canonical = stored.canonical_bytes()?;
        let is_valid = self
            .signer
            .verify(canonical.as_slice(), stored.signature.as_str())
            .map_err(|error| {
                AppError::Verification(format!(
                    "failed to verify signature of integration '{}': {error}",
                    stored.id
                ))
            })?;

        if is_valid {
            Ok(Verified::Valid(stored))
        } else {
            Ok(Verified::Corrupted {
                id: stored.id.as_i64(),
                reason: "signature mismatch".to_owned(),
            })
        }
    }

    fn materialize(
        &self,
        stored: StoredIntegration,
        model: IntegrationModel,
        clear_password: bool,
    ) -> AppResult<ProjectIntegration> {
        let StoredIntegration {
            id,
            project_id,
            name,
            integration_model_id,
            config,
            signature,
        } = stored;

        let config = open_config(self.cipher.as_ref(), config, clear_password)?;
        let mut integration = ProjectIntegration::new(
            id,
            ProjectIntegrationInput {
                project_id,
                name,
                integration_model_id,
                config,
            },
            signature,
        )?;

        if !clear_password {
            integration.redact(&model);
        }
        integration.attach_model(model);

        Ok(integration)
    }
}

fn not_found(query: &IntegrationQuery) -> AppError {
    AppError::NotFound(format!("{query} not found"))
}
