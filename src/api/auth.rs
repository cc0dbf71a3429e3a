use reqwest::Method;
use tracing::{info, instrument};

use super::dto::{
    ForgotPasswordPayload, LoginPayload, MessageResponse, RegisterPayload, ResetPasswordPayload,
};
use super::ApiClient;
use crate::error::ApiError;
use crate::models::{AuthResponse, User};

impl ApiClient {
    /// Signs in and stores the returned token.
    #[instrument(skip(self, payload), fields(email = %payload.email))]
    pub async fn login(&self, payload: &LoginPayload) -> Result<AuthResponse, ApiError> {
        let res: AuthResponse = self
            .execute(self.request(Method::POST, "/auth/login").json(payload))
            .await?;
        self.session.set_token(&res.token)?;
        info!(user_id = %res.user.id, "user logged in");
        Ok(res)
    }

    /// Creates an account and stores the returned token.
    #[instrument(skip(self, payload), fields(email = %payload.email))]
    pub async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, ApiError> {
        let res: AuthResponse = self
            .execute(self.request(Method::POST, "/auth/register").json(payload))
            .await?;
        self.session.set_token(&res.token)?;
        info!(user_id = %res.user.id, "user registered");
        Ok(res)
    }

    /// Local only: the API keeps no server-side session to end.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session.remove_token()?;
        info!("user logged out");
        Ok(())
    }

    pub async fn forgot_password(&self, payload: &ForgotPasswordPayload) -> Result<MessageResponse, ApiError> {
        self.execute(self.request(Method::POST, "/auth/forgot-password").json(payload))
            .await
    }

    pub async fn reset_password(&self, payload: &ResetPasswordPayload) -> Result<MessageResponse, ApiError> {
        self.execute(self.request(Method::POST, "/auth/reset-password").json(payload))
            .await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.execute(self.request(Method::GET, "/auth/me")).await
    }
}
