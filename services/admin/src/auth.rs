//! Login, registration and session flows

use common::{Identity, SessionGuard, decode_identity};
use serde::de::IgnoredAny;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::{AuthError, ClientError};
use crate::memberships::{Profile, load_profile};
use crate::models::{LoginRequest, LoginResponse, Registration};
use crate::validation::{ValidationErrors, validate_required};

/// Authentication flows against `/auth`
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
    guard: SessionGuard,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        let guard = SessionGuard::new(client.store().clone());
        Self { client, guard }
    }

    /// Guard over the client's token store
    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    /// Log in and store the returned token
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let mut errors = ValidationErrors::new();
        errors
            .check("email", validate_required("Email", email))
            .check("password", validate_required("Password", password));
        errors.into_result()?;

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.client.post("/auth/login", &request).await?;

        let token = response
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or(ClientError::UnexpectedResponse)?;
        let identity = decode_identity(&token)?;

        self.client.store().set(&token)?;
        info!("Logged in as {}", identity.user_id);
        Ok(identity)
    }

    /// Register a new account
    pub async fn register(&self, registration: &Registration) -> Result<(), AuthError> {
        registration.validate()?;
        let _: IgnoredAny = self.client.post("/auth/register", registration).await?;
        info!("Registered {}", registration.email.trim());
        Ok(())
    }

    /// Forget the stored session
    pub fn logout(&self) -> Result<(), AuthError> {
        self.client.store().remove()?;
        info!("Logged out");
        Ok(())
    }

    /// Identity of the stored session, without validating it
    pub fn whoami(&self) -> Option<Identity> {
        self.guard.current_identity()
    }

    /// Own user record and memberships
    pub async fn profile(&self) -> Result<Profile, AuthError> {
        let identity = self.guard.check().inspect_err(|e| {
            warn!("Cannot load profile: {}", e);
        })?;
        Ok(load_profile(&self.client, &identity.user_id).await?)
    }
}
