use std::path::Path;
use std::sync::Arc;

use lattice_core::{AppError, AppResult};
use lattice_domain::JobSecretSet;
use tracing::{debug, error};

use super::ports::{InstalledKey, KeyInstaller};

/// Parsed key installation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInstallRequest {
    /// Short key name, without namespace or suffix.
    pub key_name: String,
    /// Optional absolute destination file path.
    pub destination: Option<String>,
}

/// Application service installing job keys through the worker runtime.
#[derive(Clone)]
pub struct KeyInstallService {
    installer: Arc<dyn KeyInstaller>,
}

impl KeyInstallService {
    /// Creates a new key install service.
    #[must_use]
    pub fn new(installer: Arc<dyn KeyInstaller>) -> Self {
        Self { installer }
    }

    /// Installs the requested private key from the job's secret set.
    ///
    /// `secrets` is `None` when no secret set was loaded for the job, which is
    /// reported differently from a set that lacks the requested key.
    pub async fn install(
        &self,
        secrets: Option<&JobSecretSet>,
        request: KeyInstallRequest,
    ) -> AppResult<InstalledKey> {
        let Some(secrets) = secrets else {
            let error = AppError::Validation("no keys available for this job".to_owned());
            error!(key = %request.key_name, %error, "key installation rejected");
            return Err(error);
        };

        let Some(secret) = secrets.find_private_key(request.key_name.as_str()) else {
            let error = AppError::NotFound(format!("key '{}' not found", request.key_name));
            error!(key = %request.key_name, %error, "key installation rejected");
            return Err(error);
        };

        let destination = request
            .destination
            .as_deref()
            .filter(|destination| !destination.is_empty());

        let installed = match destination {
            None => self.installer.install_key(secret).await,
            Some(destination) => {
                let path = Path::new(destination);
                if !path.is_absolute() {
                    let error = AppError::UnsupportedPath(format!(
                        "destination '{destination}' must be an absolute path"
                    ));
                    error!(key = %secret.name(), %error, "key installation rejected");
                    return Err(error);
                }

                debug!(key = %secret.name(), destination, "installing key to explicit destination");
                self.installer.install_key_to(secret, path).await
            }
        };

        match installed {
            Ok(installed) => {
                debug!(
                    key = %secret.name(),
                    path = %installed.path.display(),
                    "key installed"
                );
                Ok(installed)
            }
            Err(error) => {
                error!(key = %secret.name(), %error, "unable to install key");
                Err(error)
            }
        }
    }
}
