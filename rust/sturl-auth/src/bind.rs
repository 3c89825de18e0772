//! Binding a discharge to its root for one outgoing request.

use crate::error::AuthorizationError;
use crate::token;

/// Builds the authorization header value for a token pair.
///
/// The discharge is bound to the root so it cannot be replayed against a
/// different root, then both are formatted as
/// `Macaroon root=<root>, discharge=<bound-discharge>`.
///
/// Pure function: no I/O, inputs unmodified, and deterministic for
/// identical inputs.
pub fn authorization_header(root: &str, discharge: &str) -> Result<String, AuthorizationError> {
    let root_token = token::deserialize(root)?;
    let discharge_token = token::deserialize(discharge)?;
    let bound = token::bind_for_request(&root_token, &discharge_token)?;
    Ok(format!(
        "Macaroon root={root}, discharge={}",
        token::serialize(&bound)?
    ))
}
