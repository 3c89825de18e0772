//! Store authorization built on two-party macaroon delegation.
//!
//! The store API accepts bearer credentials made of two macaroons: a root
//! token minted by the SCA with a capability restriction set, and a
//! discharge minted by the SSO for the third-party caveat the SCA embeds
//! in the root. This crate drives the whole lifecycle of such a pair:
//!
//! 1. [`Acquirer`] performs the two-leg exchange (root issuance, caveat
//!    selection, discharge with an optional second factor).
//! 2. [`CredentialStore`] persists the resulting [`Credential`] keyed by a
//!    caller-chosen identifier.
//! 3. [`authorization_header`] binds the discharge to the root per use and
//!    formats the `Authorization` value.
//! 4. [`RefreshCoordinator`] replaces the discharge when the store signals
//!    it has gone stale, leaving the root untouched.
//!
//! Macaroon cryptography itself comes from the `macaroon` crate; this
//! crate only relies on deserialization, third-party caveat enumeration,
//! binding and reserialization, and treats tokens as opaque text blobs
//! everywhere else.
//!
//! The whole lifecycle is sequential: every network call and prompt blocks
//! its invocation, and the only retries anywhere are the single 2FA
//! resubmission and the single post-refresh retry the protocol calls for.

pub mod acquire;
pub mod bind;
pub mod capability;
pub mod credential;
pub mod environment;
pub mod error;
pub mod prompt;
pub mod refresh;
pub mod store;

mod token;

pub use acquire::Acquirer;
pub use bind::authorization_header;
pub use capability::{ACL_EXPIRY_DAYS, CapabilityRequest, Channel, Permission};
pub use credential::Credential;
pub use environment::{Endpoints, EnvironmentName, EnvironmentRegistry};
pub use error::AuthorizationError;
pub use prompt::{Prompter, TerminalPrompter};
pub use refresh::{NEEDS_REFRESH_CHALLENGE, RefreshCoordinator, needs_refresh};
pub use store::{CREDENTIAL_SUFFIX, CredentialStore};
