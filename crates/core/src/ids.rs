use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from a storage-assigned value.
            ///
            /// Identifiers are assigned by the database sequence and are
            /// always strictly positive.
            pub fn new(value: i64) -> AppResult<Self> {
                if value <= 0 {
                    return Err(AppError::Validation(format!(
                        concat!($label, " must be positive, got {}"),
                        value
                    )));
                }

                Ok(Self(value))
            }

            /// Returns the underlying numeric value.
            #[must_use]
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = AppError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Project identifier owning integration records.
    ProjectId,
    "project id"
);

numeric_id!(
    /// Integration record identifier.
    IntegrationId,
    "integration id"
);

numeric_id!(
    /// Integration model identifier.
    IntegrationModelId,
    "integration model id"
);

numeric_id!(
    /// Workflow identifier used by integration associations.
    WorkflowId,
    "workflow id"
);
