//! The capability vocabulary and the root-token issuance request.
//!
//! Root tokens are minted with a restriction set: which store permissions
//! the bearer may exercise, optionally which channels it is confined to,
//! and an expiry date. The permission and channel names form a closed
//! vocabulary understood by the SCA; anything else is rejected here,
//! before a request is made.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::error::AuthorizationError;

/// Issued root tokens expire this many days after issuance.
pub const ACL_EXPIRY_DAYS: i64 = 180;

/// A store permission that can be attached to a root token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    PackageAccess,
    PackageManage,
    PackageMetrics,
    PackagePush,
    PackageRegister,
    PackageRelease,
    PackageUpdate,
    PackageUpload,
}

impl Permission {
    /// All recognized permission names.
    pub const ALL: [Permission; 8] = [
        Permission::PackageAccess,
        Permission::PackageManage,
        Permission::PackageMetrics,
        Permission::PackagePush,
        Permission::PackageRegister,
        Permission::PackageRelease,
        Permission::PackageUpdate,
        Permission::PackageUpload,
    ];

    fn name(&self) -> &'static str {
        match self {
            Permission::PackageAccess => "package_access",
            Permission::PackageManage => "package_manage",
            Permission::PackageMetrics => "package_metrics",
            Permission::PackagePush => "package_push",
            Permission::PackageRegister => "package_register",
            Permission::PackageRelease => "package_release",
            Permission::PackageUpdate => "package_update",
            Permission::PackageUpload => "package_upload",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Permission {
    type Err = AuthorizationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|permission| permission.name() == value)
            .ok_or_else(|| {
                AuthorizationError::Input(format!("unknown permission {value:?}"))
            })
    }
}

/// A distribution channel a root token can be confined to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Stable,
    Candidate,
    Beta,
    Edge,
}

impl Channel {
    /// All recognized channel names.
    pub const ALL: [Channel; 4] = [
        Channel::Stable,
        Channel::Candidate,
        Channel::Beta,
        Channel::Edge,
    ];

    fn name(&self) -> &'static str {
        match self {
            Channel::Stable => "stable",
            Channel::Candidate => "candidate",
            Channel::Beta => "beta",
            Channel::Edge => "edge",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Channel {
    type Err = AuthorizationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|channel| channel.name() == value)
            .ok_or_else(|| AuthorizationError::Input(format!("unknown channel {value:?}")))
    }
}

/// The restriction set requested when minting a root token.
///
/// Serializes to the body of the SCA issuance request: `permissions` and
/// `expires` always, `channels` only when at least one was requested.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityRequest {
    pub permissions: Vec<Permission>,
    pub expires: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<Channel>>,
}

impl CapabilityRequest {
    /// Builds a request for the given restriction set.
    ///
    /// An empty permission list falls back to `package_access`; the expiry
    /// is set [`ACL_EXPIRY_DAYS`] from now.
    pub fn new(permissions: Vec<Permission>, channels: Vec<Channel>) -> Self {
        let permissions = if permissions.is_empty() {
            vec![Permission::PackageAccess]
        } else {
            permissions
        };
        let expires = (Utc::now() + Duration::days(ACL_EXPIRY_DAYS))
            .format("%Y-%m-%d")
            .to_string();
        CapabilityRequest {
            permissions,
            expires,
            channels: if channels.is_empty() {
                None
            } else {
                Some(channels)
            },
        }
    }
}
