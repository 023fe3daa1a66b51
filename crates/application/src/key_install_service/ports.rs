use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lattice_core::AppResult;
use lattice_domain::{JobSecret, JobSecretKind};

/// Metadata about key material written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledKey {
    /// Path of the installed private key file.
    pub path: PathBuf,
    /// Installed key kind.
    pub kind: JobSecretKind,
}

/// Worker runtime capability writing key material to the filesystem.
#[async_trait]
pub trait KeyInstaller: Send + Sync {
    /// Installs the key to the runtime's default location.
    async fn install_key(&self, secret: &JobSecret) -> AppResult<InstalledKey>;

    /// Installs the key to an absolute destination path.
    async fn install_key_to(
        &self,
        secret: &JobSecret,
        destination: &Path,
    ) -> AppResult<InstalledKey>;
}
