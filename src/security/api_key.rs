use super::{AuthError, Identity, SecurityRequest, SecurityVerifier, API_KEY_AUTH};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where an API key is carried on the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

type KeyLookup = Arc<dyn Fn(&str) -> Option<Identity> + Send + Sync>;

/// API key authentication
///
/// Reads the key named `key_name` from the configured location and resolves it
/// to an [`Identity`] through the supplied lookup. Unknown keys are rejected.
#[derive(Clone)]
pub struct ApiKeyVerifier {
    key_name: String,
    location: ApiKeyLocation,
    lookup: KeyLookup,
}

impl ApiKeyVerifier {
    pub fn new<F>(key_name: &str, location: ApiKeyLocation, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<Identity> + Send + Sync + 'static,
    {
        Self {
            key_name: key_name.to_string(),
            location,
            lookup: Arc::new(lookup),
        }
    }

    /// Header-carried key, e.g. `X-API-Key`
    pub fn header<F>(key_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<Identity> + Send + Sync + 'static,
    {
        Self::new(key_name, ApiKeyLocation::Header, lookup)
    }

    /// Query-carried key, e.g. `?api_key=...`
    pub fn query<F>(key_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<Identity> + Send + Sync + 'static,
    {
        Self::new(key_name, ApiKeyLocation::Query, lookup)
    }

    #[must_use]
    pub fn location(&self) -> ApiKeyLocation {
        self.location
    }
}

impl SecurityVerifier for ApiKeyVerifier {
    fn verify(&self, req: &SecurityRequest<'_>) -> Result<Identity, AuthError> {
        let value = match self.location {
            ApiKeyLocation::Header => req.get_header(&self.key_name),
            ApiKeyLocation::Query => req.get_query(&self.key_name),
            ApiKeyLocation::Cookie => req.get_cookie(&self.key_name),
        }
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::missing(API_KEY_AUTH))?;

        (self.lookup)(value).ok_or_else(|| AuthError::invalid(API_KEY_AUTH, "unknown key"))
    }
}
