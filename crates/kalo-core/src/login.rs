use crate::client::parse_site_url;
use crate::envelope::Envelope;
use crate::observe::{EnvelopeCell, EnvelopeReceiver};
use crate::provider::LoginProvider;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How long the "logging in" dialog stays up at most.
pub const LOGIN_PROGRESS_TIMEOUT: Duration = Duration::from_secs(5);

/// Signed-in account, as returned by the console API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    metadata: UserMetadata,
    #[serde(default)]
    spec: UserSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct UserMetadata {
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserSpec {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    email: String,
}

impl User {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn display_name(&self) -> &str {
        if self.spec.display_name.is_empty() {
            &self.metadata.name
        } else {
            &self.spec.display_name
        }
    }

    pub fn email(&self) -> &str {
        &self.spec.email
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("There is blank information")]
    BlankInformation,
    #[error("The Halo site address is incorrect")]
    IncorrectAddress,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), LoginError> {
        if self.url.trim().is_empty() || self.username.is_empty() || self.password.is_empty() {
            return Err(LoginError::BlankInformation);
        }
        if parse_site_url(&self.url).is_none() {
            return Err(LoginError::IncorrectAddress);
        }
        Ok(())
    }
}

/// Runs the credentials check and publishes its outcome.
#[derive(Default)]
pub struct LoginController {
    status: EnvelopeCell<User>,
}

impl LoginController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> EnvelopeReceiver<User> {
        self.status.subscribe()
    }

    pub fn login(&self, provider: Arc<dyn LoginProvider>) -> JoinHandle<()> {
        self.status.spawn(async move {
            let result = provider.current_user().await;
            match &result {
                Ok(user) => info!(user = user.name(), "logged in"),
                Err(err) => warn!(error = %err, "login failed"),
            }
            Envelope::from(result)
        })
    }

    /// Reports a form error through the same channel as request outcomes.
    pub fn reject(&self, error: LoginError) {
        let generation = self.status.reset();
        self.status.publish(generation, Envelope::failure(error.to_string()));
    }

    pub fn reset(&self) {
        self.status.reset();
    }
}
