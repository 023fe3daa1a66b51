use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use lattice_core::AppError;
use tracing_subscriber::EnvFilter;

const MIN_ADMIN_TOKEN_LEN: usize = 32;

#[derive(Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub database_max_connections: u32,
    pub api_host: String,
    pub api_port: u16,
    pub admin_token: String,
    pub integration_encryption_key: String,
    pub integration_signing_key: String,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let database_max_connections = parse_env_u32("DATABASE_MAX_CONNECTIONS", 10)?;
        if database_max_connections == 0 {
            return Err(AppError::Validation(
                "DATABASE_MAX_CONNECTIONS must be greater than zero".to_owned(),
            ));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        // Migration runs never serve requests, so the secrets are optional there.
        let (admin_token, integration_encryption_key, integration_signing_key) = if migrate_only {
            (String::new(), String::new(), String::new())
        } else {
            let admin_token = required_non_empty_env("API_ADMIN_TOKEN")?;
            if admin_token.len() < MIN_ADMIN_TOKEN_LEN {
                return Err(AppError::Validation(format!(
                    "API_ADMIN_TOKEN must be at least {MIN_ADMIN_TOKEN_LEN} characters"
                )));
            }

            (
                admin_token,
                required_non_empty_env("INTEGRATION_ENCRYPTION_KEY")?,
                required_non_empty_env("INTEGRATION_SIGNING_KEY")?,
            )
        };

        Ok(Self {
            migrate_only,
            database_url,
            database_max_connections,
            api_host,
            api_port,
            admin_token,
            integration_encryption_key,
            integration_signing_key,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, AppError> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
