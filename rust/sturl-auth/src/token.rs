//! Thin wrapper over the `macaroon` crate.
//!
//! The authorization lifecycle treats tokens as opaque: everything it needs
//! from the underlying library is deserialization, third-party caveat
//! enumeration, binding a discharge for a request, and reserialization.
//! Fixing that surface here keeps the rest of the crate independent of the
//! library's types.
//!
//! Tokens travel as base64 text blobs; the store API serializes macaroons
//! in the V1 format, so bound discharges are reserialized the same way.

use std::sync::Once;

use macaroon::{Caveat, Format, Macaroon};

use crate::error::AuthorizationError;

static INIT: Once = Once::new();

/// One-time initialization of the macaroon library's crypto primitives.
fn ensure_initialized() {
    INIT.call_once(|| {
        macaroon::initialize().expect("macaroon library initialization");
    });
}

/// A third-party caveat extracted from a root token.
///
/// `location` names the authority expected to discharge the caveat;
/// `caveat_id` is the opaque payload the authority needs to do so.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ThirdPartyCaveat {
    pub location: String,
    pub caveat_id: String,
}

pub(crate) fn deserialize(raw: &str) -> Result<Macaroon, AuthorizationError> {
    ensure_initialized();
    Macaroon::deserialize(raw)
        .map_err(|e| AuthorizationError::Token(format!("failed to deserialize macaroon: {e}")))
}

pub(crate) fn serialize(token: &Macaroon) -> Result<String, AuthorizationError> {
    token
        .serialize(Format::V1)
        .map_err(|e| AuthorizationError::Token(format!("failed to serialize macaroon: {e}")))
}

/// Enumerates the third-party caveats of a token.
pub(crate) fn third_party_caveats(token: &Macaroon) -> Vec<ThirdPartyCaveat> {
    token
        .third_party_caveats()
        .into_iter()
        .filter_map(|caveat| match caveat {
            Caveat::ThirdParty(caveat) => Some(ThirdPartyCaveat {
                location: caveat.location(),
                caveat_id: String::from_utf8_lossy(&caveat.id().0).into_owned(),
            }),
            _ => None,
        })
        .collect()
}

/// Binds a discharge to its root token.
///
/// The binding ties the discharge's signature to the root's signature, so
/// the discharge cannot be replayed against a different root. The inputs
/// are not modified; a new, bound discharge is returned.
pub(crate) fn bind_for_request(
    root: &Macaroon,
    discharge: &Macaroon,
) -> Result<Macaroon, AuthorizationError> {
    let mut bound = discharge.clone();
    root.bind(&mut bound);
    Ok(bound)
}
