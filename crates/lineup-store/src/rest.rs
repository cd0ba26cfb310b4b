//! REST writes and credential exchange.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::StoreConfig;
use crate::error::{CredentialError, StoreError, StoreResult};
use crate::traits::Credential;

/// HTTP client for the store's REST surface.
///
/// Document writes go through the PostgREST-style collection endpoint;
/// credential exchange goes through the auth endpoints. Every call sends
/// the publishable API key; authenticated calls add the user's bearer
/// token.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    config: StoreConfig,
}

impl RestClient {
    /// Creates a client after validating the config.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            http: Client::new(),
            config,
        })
    }

    fn bearer<'a>(&'a self, access_token: Option<&'a str>) -> &'a str {
        // Unauthenticated calls fall back to the publishable key, which the
        // backend accepts for anonymous-readable collections.
        access_token.unwrap_or(&self.config.anon_key)
    }

    /// Creates a document and returns the store-assigned id.
    pub async fn create_document(
        &self,
        fields: &Value,
        access_token: Option<&str>,
    ) -> StoreResult<String> {
        let url = self.config.rest_url();
        debug!(url = %url, "Creating document");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.bearer(access_token)),
            )
            .header("Prefer", "return=representation")
            .json(fields)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(status = %status, message = %message, "Create rejected by store");
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // The store returns the inserted rows as an array.
        let rows: Vec<Value> = response.json().await?;
        let id = rows
            .first()
            .and_then(|row| row.get("id"))
            .map(value_to_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::Api {
                status: status.as_u16(),
                message: "create response carried no id".to_string(),
            })?;
        debug!(id = %id, "Document created");
        Ok(id)
    }

    /// Deletes a document by id.
    pub async fn delete_document(&self, id: &str, access_token: Option<&str>) -> StoreResult<()> {
        let url = format!("{}?id=eq.{}", self.config.rest_url(), id);
        debug!(id = %id, "Deleting document");

        let response = self
            .http
            .delete(&url)
            .header("apikey", &self.config.anon_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.bearer(access_token)),
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(status = %status, id = %id, "Delete rejected by store");
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        debug!(id = %id, "Document deleted");
        Ok(())
    }

    /// Exchanges an email/secret pair for a credential.
    pub async fn password_sign_in(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Credential, CredentialError> {
        let url = format!("{}?grant_type=password", self.config.auth_url("token"));
        debug!(identifier = %identifier, "Requesting credential");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": identifier, "password": secret }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (code, message) = parse_error_body(body);
            error!(status = %status, message = %message, "Sign-in refused");
            return Err(CredentialError { code, message });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::message_only(format!("malformed token response: {e}")))?;
        let email = if token.user.email.is_empty() {
            identifier.to_string()
        } else {
            token.user.email
        };
        debug!(user_id = %token.user.id, "Credential issued");
        Ok(Credential {
            user_id: token.user.id,
            email,
            access_token: token.access_token,
        })
    }

    /// Invalidates a bearer token at the provider.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), CredentialError> {
        let url = self.config.auth_url("logout");
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (code, message) = parse_error_body(body);
            return Err(CredentialError {
                code,
                message: format!("logout returned {}: {}", status.as_u16(), message),
            });
        }
        debug!("Credential invalidated");
        Ok(())
    }
}

fn value_to_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pulls the machine-readable code and the human-readable text out of an
/// auth error body. Non-JSON bodies come back verbatim as the message.
fn parse_error_body(body: String) -> (Option<String>, String) {
    let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let ErrorBody {
        error_code,
        msg,
        error_description,
    } = parsed;
    let message = msg.or(error_description).unwrap_or(body);
    (error_code, message)
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: String,
}
