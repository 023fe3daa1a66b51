use std::fmt::{Debug, Formatter};

use lattice_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Namespace prefix of job secrets holding key material.
pub const KEY_SECRET_PREFIX: &str = "lattice.key.";

/// Suffix of job secrets holding private key material.
pub const PRIVATE_KEY_SECRET_SUFFIX: &str = ".priv";

/// Returns the job secret name holding the private key with the given short name.
#[must_use]
pub fn private_key_secret_name(short_name: &str) -> String {
    format!("{KEY_SECRET_PREFIX}{short_name}{PRIVATE_KEY_SECRET_SUFFIX}")
}

/// Kind of key material carried by a job secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSecretKind {
    /// OpenSSH private key.
    Ssh,
    /// ASCII-armored PGP private key.
    Pgp,
}

impl JobSecretKind {
    /// Returns stable type value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::Pgp => "pgp",
        }
    }
}

/// Named secret scoped to one job execution.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "JobSecretInput")]
pub struct JobSecret {
    name: String,
    value: String,
    kind: JobSecretKind,
}

#[derive(Deserialize)]
struct JobSecretInput {
    name: String,
    value: String,
    #[serde(rename = "type")]
    kind: JobSecretKind,
}

impl TryFrom<JobSecretInput> for JobSecret {
    type Error = AppError;

    fn try_from(input: JobSecretInput) -> Result<Self, Self::Error> {
        Self::new(input.name, input.value, input.kind)
    }
}

impl JobSecret {
    /// Creates a job secret with a non-empty name.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        kind: JobSecretKind,
    ) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "job secret name must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            name,
            value: value.into(),
            kind,
        })
    }

    /// Returns the full secret name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the secret value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Returns the key material kind.
    #[must_use]
    pub fn kind(&self) -> JobSecretKind {
        self.kind
    }

    /// Returns the short key name when the secret follows the private key naming.
    #[must_use]
    pub fn key_short_name(&self) -> Option<&str> {
        self.name
            .strip_prefix(KEY_SECRET_PREFIX)
            .and_then(|rest| rest.strip_suffix(PRIVATE_KEY_SECRET_SUFFIX))
            .filter(|short_name| !short_name.is_empty())
    }
}

impl Debug for JobSecret {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("JobSecret")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("kind", &self.kind)
            .finish()
    }
}

/// Secrets loaded for the executing job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct JobSecretSet {
    secrets: Vec<JobSecret>,
}

impl JobSecretSet {
    /// Creates a secret set.
    #[must_use]
    pub fn new(secrets: Vec<JobSecret>) -> Self {
        Self { secrets }
    }

    /// Finds a secret by exact name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&JobSecret> {
        self.secrets.iter().find(|secret| secret.name == name)
    }

    /// Finds the private key secret with the given short name.
    #[must_use]
    pub fn find_private_key(&self, short_name: &str) -> Option<&JobSecret> {
        self.find(private_key_secret_name(short_name).as_str())
    }

    /// Returns the number of secrets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Returns whether the set holds no secrets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}
