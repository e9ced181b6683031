//! Auth endpoints

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tracker_auth::{AuthUser, TokenVerifier, VerifyError, VerifyOutcome};

use crate::client::ApiClient;
use crate::Result;

#[derive(Debug, Clone, Serialize)]
pub struct SignInPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordPayload {
    pub email: String,
}

/// `{token, user}` pair from a successful sign-in or sign-up exchange,
/// fed straight into `SessionManager::establish`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSuccess {
    pub token: String,
    pub user: AuthUser,
}

/// Plain acknowledgement body used by several endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

#[derive(Serialize)]
struct VerifyTokenPayload<'a> {
    token: &'a str,
}

impl ApiClient {
    pub async fn sign_in(&self, payload: &SignInPayload) -> Result<AuthSuccess> {
        self.post("/auth/sign-in", payload).await
    }

    pub async fn sign_up(&self, payload: &SignUpPayload) -> Result<AuthSuccess> {
        self.post("/auth/sign-up", payload).await
    }

    pub async fn forgot_password(&self, payload: &ForgotPasswordPayload) -> Result<ApiMessage> {
        self.post("/auth/forgot-password", payload).await
    }

    pub async fn verify_auth_token(&self, token: &str) -> Result<VerifyOutcome> {
        self.post("/auth/verify-token", &VerifyTokenPayload { token })
            .await
    }
}

#[async_trait]
impl TokenVerifier for ApiClient {
    async fn verify_token(&self, token: &str) -> std::result::Result<VerifyOutcome, VerifyError> {
        self.verify_auth_token(token).await.map_err(Into::into)
    }
}
