use super::{AuthError, Identity, SecurityRequest, SecurityVerifier, BASIC_AUTH};
use base64::Engine;
use std::sync::Arc;
use tracing::debug;

type CredentialCheck = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// HTTP Basic authentication
///
/// Decodes `Authorization: Basic base64(user:password)` and asks the supplied
/// predicate whether the pair is valid. On rejection the pipeline answers with
/// a `WWW-Authenticate: Basic realm="..."` challenge.
#[derive(Clone)]
pub struct BasicAuthVerifier {
    realm: String,
    check: CredentialCheck,
}

impl BasicAuthVerifier {
    pub fn new<F>(realm: &str, check: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            realm: realm.to_string(),
            check: Arc::new(check),
        }
    }

    fn decode(header: &str) -> Result<(String, String), AuthError> {
        let encoded = header
            .strip_prefix("Basic ")
            .or_else(|| header.strip_prefix("basic "))
            .ok_or_else(|| AuthError::invalid(BASIC_AUTH, "not a Basic authorization"))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| AuthError::invalid(BASIC_AUTH, format!("bad base64: {e}")))?;
        let decoded = String::from_utf8(bytes)
            .map_err(|_| AuthError::invalid(BASIC_AUTH, "credentials are not UTF-8"))?;
        let (user, pass) = decoded
            .split_once(':')
            .ok_or_else(|| AuthError::invalid(BASIC_AUTH, "missing ':' separator"))?;
        Ok((user.to_string(), pass.to_string()))
    }
}

impl SecurityVerifier for BasicAuthVerifier {
    fn verify(&self, req: &SecurityRequest<'_>) -> Result<Identity, AuthError> {
        let header = req
            .get_header("authorization")
            .ok_or_else(|| AuthError::missing(BASIC_AUTH))?;
        let (user, pass) = Self::decode(header)?;
        if (self.check)(&user, &pass) {
            debug!(username = %user, "Basic credentials accepted");
            Ok(Identity::new(user))
        } else {
            Err(AuthError::invalid(BASIC_AUTH, "username or password rejected"))
        }
    }

    fn challenge(&self) -> Option<String> {
        Some(format!("Basic realm=\"{}\"", self.realm))
    }
}
