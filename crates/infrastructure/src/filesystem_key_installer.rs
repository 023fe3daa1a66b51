//! Writes job key material to the local filesystem.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use lattice_application::{InstalledKey, KeyInstaller};
use lattice_core::{AppError, AppResult};
use lattice_domain::{JobSecret, JobSecretKind};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Key installer writing private keys below a keys directory.
///
/// Files are written to a temporary sibling and renamed into place, so a
/// reader never observes a partially written key. Concurrent installs to the
/// same path resolve to whichever rename lands last.
#[derive(Debug, Clone)]
pub struct FilesystemKeyInstaller {
    keys_dir: PathBuf,
}

impl FilesystemKeyInstaller {
    /// Creates an installer using `keys_dir` as the default location.
    #[must_use]
    pub fn new(keys_dir: impl Into<PathBuf>) -> Self {
        Self {
            keys_dir: keys_dir.into(),
        }
    }

    fn default_path(&self, secret: &JobSecret) -> AppResult<PathBuf> {
        let short_name = secret.key_short_name().ok_or_else(|| {
            AppError::Validation(format!(
                "secret '{}' is not a private key secret",
                secret.name()
            ))
        })?;

        let mut components = Path::new(short_name).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(AppError::UnsupportedPath(format!(
                "key name '{short_name}' is not a plain file name"
            )));
        }

        let file_name = match secret.kind() {
            JobSecretKind::Ssh => short_name.to_owned(),
            JobSecretKind::Pgp => format!("{short_name}.asc"),
        };

        Ok(self.keys_dir.join(file_name))
    }

    async fn write_key(&self, secret: &JobSecret, path: &Path) -> AppResult<InstalledKey> {
        let (Some(parent), Some(file_name)) = (path.parent(), path.file_name()) else {
            return Err(AppError::UnsupportedPath(format!(
                "destination '{}' does not name a file",
                path.display()
            )));
        };

        fs::create_dir_all(parent).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to create key directory '{}': {error}",
                parent.display()
            ))
        })?;

        let temp_path = parent.join(format!(
            ".{}.{}-{}.tmp",
            file_name.to_string_lossy(),
            std::process::id(),
            TEMP_FILE_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(error) = write_private_file(temp_path.as_path(), secret.value()).await {
            remove_temp_file(temp_path.as_path()).await;
            return Err(error);
        }

        if let Err(error) = fs::rename(&temp_path, path).await {
            remove_temp_file(temp_path.as_path()).await;
            return Err(AppError::Internal(format!(
                "failed to move key into '{}': {error}",
                path.display()
            )));
        }

        debug!(key = %secret.name(), path = %path.display(), "key material written");
        Ok(InstalledKey {
            path: path.to_path_buf(),
            kind: secret.kind(),
        })
    }
}

async fn write_private_file(path: &Path, material: &str) -> AppResult<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await.map_err(|error| {
        AppError::Internal(format!(
            "failed to create key file '{}': {error}",
            path.display()
        ))
    })?;

    let mut contents = material.to_owned();
    if !contents.ends_with('\n') {
        contents.push('\n');
    }

    file.write_all(contents.as_bytes())
        .await
        .map_err(|error| AppError::Internal(format!("failed to write key file: {error}")))?;
    file.sync_all()
        .await
        .map_err(|error| AppError::Internal(format!("failed to flush key file: {error}")))?;

    Ok(())
}

async fn remove_temp_file(path: &Path) {
    if let Err(error) = fs::remove_file(path).await
        && error.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), %error, "failed to remove temporary key file");
    }
}

#[async_trait]
impl KeyInstaller for FilesystemKeyInstaller {
    async fn install_key(&self, secret: &JobSecret) -> AppResult<InstalledKey> {
        let path = self.default_path(secret)?;
        self.write_key(secret, path.as_path()).await
    }

    async fn install_key_to(
        &self,
        secret: &JobSecret,
        destination: &Path,
    ) -> AppResult<InstalledKey> {
        if !destination.is_absolute() {
            return Err(AppError::UnsupportedPath(format!(
                "destination '{}' must be an absolute path",
                destination.display()
            )));
        }

        self.write_key(secret, destination).await
    }
}
