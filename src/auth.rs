use async_trait::async_trait;
use thiserror::Error;

use crate::models::Credential;

const MIN_CODE_LENGTH: usize = 8;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Authorization code is empty")]
    EmptyCode,

    #[error("Authorization code was rejected")]
    Rejected,
}

/// Turns the code a user copies from the authorization page into a credential.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    fn authorization_url(&self) -> String;

    async fn exchange_auth_code(&self, code: &str) -> Result<Credential, CredentialError>;
}

pub struct LocalCredentialExchange {
    authorization_url: String,
}

impl LocalCredentialExchange {
    pub fn new(authorization_url: impl Into<String>) -> Self {
        Self {
            authorization_url: authorization_url.into(),
        }
    }
}

#[async_trait]
impl CredentialExchange for LocalCredentialExchange {
    fn authorization_url(&self) -> String {
        self.authorization_url.clone()
    }

    async fn exchange_auth_code(&self, code: &str) -> Result<Credential, CredentialError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CredentialError::EmptyCode);
        }

        let url_safe = code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '/'));
        if code.len() < MIN_CODE_LENGTH || !url_safe {
            return Err(CredentialError::Rejected);
        }

        Ok(Credential::new(code))
    }
}
