//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod aes_hmac_integration_crypto;
mod filesystem_key_installer;
mod in_memory_integration_model_repository;
mod in_memory_integration_repository;
mod postgres_integration_model_repository;
mod postgres_integration_repository;

pub use aes_hmac_integration_crypto::AesHmacIntegrationCrypto;
pub use filesystem_key_installer::FilesystemKeyInstaller;
pub use in_memory_integration_model_repository::InMemoryIntegrationModelRepository;
pub use in_memory_integration_repository::InMemoryIntegrationRepository;
pub use postgres_integration_model_repository::PostgresIntegrationModelRepository;
pub use postgres_integration_repository::PostgresIntegrationRepository;
