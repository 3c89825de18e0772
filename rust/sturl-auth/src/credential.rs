//! The persisted credential value type.

use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentName;

/// A root/discharge token pair acquired for one environment.
///
/// Both tokens are opaque serialized macaroons. The discharge is stored
/// unbound; binding couples it to a single outgoing request and is
/// recomputed per use by [`crate::bind::authorization_header`].
///
/// On disk the environment field is named `store`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub root: String,
    pub discharge: String,
    #[serde(rename = "store")]
    pub environment: EnvironmentName,
}

impl Credential {
    /// Creates a credential from a freshly acquired token pair.
    pub fn new(
        root: impl Into<String>,
        discharge: impl Into<String>,
        environment: EnvironmentName,
    ) -> Self {
        Credential {
            root: root.into(),
            discharge: discharge.into(),
            environment,
        }
    }

    /// Returns a copy of this credential carrying a replacement discharge.
    ///
    /// Root and environment are unchanged; this is the shape of a
    /// discharge refresh.
    pub fn with_discharge(&self, discharge: impl Into<String>) -> Self {
        Credential {
            root: self.root.clone(),
            discharge: discharge.into(),
            environment: self.environment,
        }
    }
}
