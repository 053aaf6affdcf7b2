use hmac::{Hmac, Mac, NewMac};
use rocket::http::Status;
use sha1::Sha1;
use thiserror::Error;
use tracing::trace;

type HmacSha1 = Hmac<Sha1>;

/// Reasons a webhook request fails authentication. Terminal for the request, never
/// retried; formatted into the response envelope at the route boundary.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("github secret not configured")]
    MissingSecret,
    #[error("Signature not found")]
    MissingSignature,
    #[error("signature algorithm {0} not implemented")]
    UnsupportedAlgorithm(String),
    #[error("Digest did not match")]
    DigestMismatch,
}

impl AuthError {
    pub fn status(&self) -> Status {
        match self {
            AuthError::UnsupportedAlgorithm(_) => Status::NotImplemented,
            _ => Status::Forbidden,
        }
    }
}

/// Checks the `X-Hub-Signature` header against the HMAC-SHA1 of the raw request body.
///
/// The digest comparison goes through [`Mac::verify`], which is constant-time. A digest
/// that isn't valid hex counts as a mismatch, not a parse error.
pub fn verify(
    secret: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
) -> Result<(), AuthError> {
    let secret = secret.ok_or(AuthError::MissingSecret)?;
    let signature = signature.ok_or(AuthError::MissingSignature)?;

    // GitHub sends `sha1=<hex>`; anything but sha1 is rejected before any digest work
    let (algorithm, digest) = signature.split_once('=').unwrap_or((signature, ""));
    if algorithm != "sha1" {
        return Err(AuthError::UnsupportedAlgorithm(algorithm.to_owned()));
    }

    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).expect("this should never fail");
    mac.update(body);

    let digest = hex::decode(digest).map_err(|_| {
        trace!("couldn't decode hex-encoded signature {}", digest);
        AuthError::DigestMismatch
    })?;

    mac.verify(&digest).map_err(|_| AuthError::DigestMismatch)
}
