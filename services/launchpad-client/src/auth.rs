//! OAuth 1.0 PLAINTEXT signing
//!
//! Launchpad accepts pre-issued access tokens signed with the PLAINTEXT
//! method. Consumers have no secret, so the signature is `&<token secret>`.

use chrono::Utc;

/// Pre-issued OAuth access token
#[derive(Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub token_key: String,
    pub token_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("token_key", &self.token_key)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(
        consumer_key: impl Into<String>,
        token_key: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            token_key: token_key.into(),
            token_secret: token_secret.into(),
        }
    }

    /// PLAINTEXT signature: `<consumer secret>&<token secret>`, consumer secret empty
    pub fn signature(&self) -> String {
        format!("&{}", urlencoding::encode(&self.token_secret))
    }

    /// `Authorization` header value with a fresh timestamp and nonce
    pub fn authorization_header(&self, realm: &str) -> String {
        let timestamp = Utc::now().timestamp();
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        self.authorization_header_at(realm, timestamp, &nonce)
    }

    pub fn authorization_header_at(&self, realm: &str, timestamp: i64, nonce: &str) -> String {
        let params = [
            ("oauth_consumer_key", self.consumer_key.clone()),
            ("oauth_token", self.token_key.clone()),
            ("oauth_signature_method", "PLAINTEXT".to_string()),
            ("oauth_signature", self.signature()),
            ("oauth_timestamp", timestamp.to_string()),
            ("oauth_nonce", nonce.to_string()),
            ("oauth_version", "1.0".to_string()),
        ];

        let mut header = format!("OAuth realm=\"{}\"", realm);
        for (name, value) in params {
            header.push_str(&format!(", {}=\"{}\"", name, urlencoding::encode(&value)));
        }
        header
    }
}
