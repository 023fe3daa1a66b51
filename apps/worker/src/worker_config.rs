use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use lattice_core::{AppError, AppResult};
use lattice_domain::JobSecretSet;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub http_host: String,
    pub http_port: u16,
    pub keys_dir: PathBuf,
    pub job_secrets_file: Option<PathBuf>,
}

impl WorkerConfig {
    pub fn load() -> AppResult<Self> {
        let http_host = env::var("WORKER_HTTP_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let http_port = parse_env_u16("WORKER_HTTP_PORT", 8090)?;
        if http_port == 0 {
            return Err(AppError::Validation(
                "WORKER_HTTP_PORT must be greater than zero".to_owned(),
            ));
        }

        let keys_dir = match optional_env("WORKER_KEYS_DIR") {
            Some(keys_dir) => PathBuf::from(keys_dir),
            None => env::current_dir()
                .map_err(|error| {
                    AppError::Internal(format!("failed to resolve working directory: {error}"))
                })?
                .join(".keys"),
        };
        let job_secrets_file = optional_env("WORKER_JOB_SECRETS_FILE").map(PathBuf::from);

        Ok(Self {
            http_host,
            http_port,
            keys_dir,
            job_secrets_file,
        })
    }

    pub fn socket_address(&self) -> AppResult<SocketAddr> {
        let host = IpAddr::from_str(&self.http_host).map_err(|error| {
            AppError::Internal(format!(
                "invalid WORKER_HTTP_HOST '{}': {error}",
                self.http_host
            ))
        })?;
        Ok(SocketAddr::from((host, self.http_port)))
    }

    /// Loads the job's secret set; `None` when no secrets file is configured.
    pub async fn load_job_secrets(&self) -> AppResult<Option<JobSecretSet>> {
        let Some(path) = self.job_secrets_file.as_ref() else {
            return Ok(None);
        };

        let contents = tokio::fs::read_to_string(path).await.map_err(|error| {
            AppError::Validation(format!(
                "failed to read WORKER_JOB_SECRETS_FILE '{}': {error}",
                path.display()
            ))
        })?;

        parse_job_secrets(contents.as_str()).map(Some)
    }
}

pub fn parse_job_secrets(contents: &str) -> AppResult<JobSecretSet> {
    serde_json::from_str::<JobSecretSet>(contents)
        .map_err(|error| AppError::Validation(format!("invalid job secrets: {error}")))
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_env_u16(name: &str, default: u16) -> AppResult<u16> {
    match env::var(name) {
        Ok(value) => value.parse::<u16>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
