//! Conversion between in-memory configuration and its sealed storage form.

use std::collections::BTreeSet;

use lattice_core::AppResult;
use lattice_domain::{IntegrationConfig, IntegrationConfigValue};

use crate::{FieldCipher, StoredConfigValue, StoredIntegrationConfig};

/// Seals every field named in `sensitive`; other fields are stored as is.
pub(crate) fn seal_config(
    cipher: &dyn FieldCipher,
    config: &IntegrationConfig,
    sensitive: &BTreeSet<String>,
) -> AppResult<StoredIntegrationConfig> {
    config
        .iter()
        .map(|(name, value)| {
            let sealed = sensitive.contains(name);
            let stored_value = if sealed {
                cipher.seal(value.value.as_str())?
            } else {
                value.value.clone()
            };

            Ok((
                name.clone(),
                StoredConfigValue {
                    kind: value.kind,
                    value: stored_value,
                    description: value.description.clone(),
                    sealed,
                },
            ))
        })
        .collect()
}

/// Rebuilds the in-memory configuration.
///
/// Sealed values are opened only when `clear_password` is set. Otherwise
/// they are blanked, so ciphertext never leaves the storage layer.
pub(crate) fn open_config(
    cipher: &dyn FieldCipher,
    config: StoredIntegrationConfig,
    clear_password: bool,
) -> AppResult<IntegrationConfig> {
    config
        .into_iter()
        .map(|(name, stored)| {
            let value = match (stored.sealed, clear_password) {
                (false, _) => stored.value,
                (true, true) => cipher.open(stored.value.as_str())?,
                (true, false) => String::new(),
            };

            Ok((
                name,
                IntegrationConfigValue {
                    value,
                    kind: stored.kind,
                    description: stored.description,
                },
            ))
        })
        .collect()
}
