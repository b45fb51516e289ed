//! Request signing for flush requests.
//!
//! The configured [`AuthCredential`] is resolved once into a
//! [`RequestSigner`]; the dispatcher runs every request through it.

use crate::core::config::{AuthCredential, Secret, TokenPair};
use crate::core::{FlushdError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Url};
use ring::hmac;
use std::time::{SystemTime, UNIX_EPOCH};

/// Applies credentials to an outgoing request.
pub trait RequestSigner: Send + Sync {
    /// Name of the scheme, for logging
    fn scheme(&self) -> &'static str;

    /// Add authentication to `request`, which targets `method url`
    fn sign(&self, request: RequestBuilder, method: &Method, url: &Url) -> Result<RequestBuilder>;
}

impl AuthCredential {
    /// Resolve this credential into a signer
    pub fn signer(&self) -> Box<dyn RequestSigner> {
        match self {
            AuthCredential::None => Box::new(NoAuth),
            AuthCredential::TokenPair(pair) => Box::new(OAuth1Signer::new(pair.clone())),
            AuthCredential::Basic { username, password } => Box::new(BasicAuthSigner {
                username: username.clone(),
                password: password.clone(),
            }),
        }
    }
}

/// Sends requests unauthenticated.
#[derive(Debug, Clone, Copy)]
pub struct NoAuth;

impl RequestSigner for NoAuth {
    fn scheme(&self) -> &'static str {
        "none"
    }

    fn sign(&self, request: RequestBuilder, _method: &Method, _url: &Url) -> Result<RequestBuilder> {
        Ok(request)
    }
}

/// HTTP Basic authentication.
#[derive(Debug, Clone)]
pub struct BasicAuthSigner {
    username: String,
    password: Secret,
}

impl RequestSigner for BasicAuthSigner {
    fn scheme(&self) -> &'static str {
        "basic"
    }

    fn sign(&self, request: RequestBuilder, _method: &Method, _url: &Url) -> Result<RequestBuilder> {
        Ok(request.basic_auth(&self.username, Some(self.password.expose())))
    }
}

const OAUTH_VERSION: &str = "1.0";
const OAUTH_SIGNATURE_METHOD: &str = "HMAC-SHA1";
const NONCE_LEN: usize = 32;

/// OAuth 1.0a signing (RFC 5849) with HMAC-SHA1, carried in the
/// `Authorization` header.
///
/// JSON bodies are not form-encoded, so only the query string and the
/// protocol parameters take part in the signature.
#[derive(Debug, Clone)]
pub struct OAuth1Signer {
    credentials: TokenPair,
}

impl OAuth1Signer {
    /// Create a signer for a consumer/token pair
    pub fn new(credentials: TokenPair) -> Self {
        Self { credentials }
    }

    /// Protocol parameters, without the signature
    fn protocol_params(&self, nonce: &str, timestamp: u64) -> Vec<(String, String)> {
        vec![
            ("oauth_consumer_key".to_string(), self.credentials.app_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), OAUTH_SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_token".to_string(), self.credentials.access_token.clone()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ]
    }

    /// Compute the `oauth_signature` value.
    ///
    /// `extra` holds request parameters that are neither in the query
    /// string nor protocol parameters (form bodies).
    pub fn signature(
        &self,
        method: &Method,
        url: &Url,
        extra: &[(&str, &str)],
        nonce: &str,
        timestamp: u64,
    ) -> String {
        let mut params = self.protocol_params(nonce, timestamp);
        params.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let base = signature_base_string(method, url, &params);
        let key = format!(
            "{}&{}",
            percent_encode(self.credentials.app_secret.expose()),
            percent_encode(self.credentials.access_token_secret.expose())
        );

        let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key.as_bytes());
        STANDARD.encode(hmac::sign(&key, base.as_bytes()).as_ref())
    }

    /// Build the full `Authorization` header value
    pub fn authorization_header(
        &self,
        method: &Method,
        url: &Url,
        nonce: &str,
        timestamp: u64,
    ) -> String {
        let signature = self.signature(method, url, &[], nonce, timestamp);

        let mut params = self.protocol_params(nonce, timestamp);
        params.push(("oauth_signature".to_string(), signature));
        params.sort();

        let fields: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect();
        format!("OAuth {}", fields.join(", "))
    }
}

impl RequestSigner for OAuth1Signer {
    fn scheme(&self) -> &'static str {
        "oauth"
    }

    fn sign(&self, request: RequestBuilder, method: &Method, url: &Url) -> Result<RequestBuilder> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let header = self.authorization_header(method, url, &nonce, timestamp);
        let header = HeaderValue::from_str(&header)
            .map_err(|e| FlushdError::Auth(format!("Invalid Authorization header: {}", e)))?;
        Ok(request.header(AUTHORIZATION, header))
    }
}

/// RFC 3986 percent-encoding: everything but `ALPHA / DIGIT / - . _ ~`.
fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// `scheme://host[:port]/path`, lowercased scheme and host, default port omitted.
fn base_string_uri(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

/// RFC 5849 section 3.4.1 signature base string.
fn signature_base_string(method: &Method, url: &Url, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
        .chain(params.iter().map(|(k, v)| (percent_encode(k), percent_encode(v))))
        .collect();
    encoded.sort();

    let normalized: Vec<String> = encoded.iter().map(|(k, v)| format!("{}={}", k, v)).collect();

    format!(
        "{}&{}&{}",
        method.as_str().to_ascii_uppercase(),
        percent_encode(&base_string_uri(url)),
        percent_encode(&normalized.join("&"))
    )
}
