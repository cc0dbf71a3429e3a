use serde::Deserialize;

use super::{is_valid_email, ValidationErrors, MIN_PASSWORD_LEN};
use crate::api::dto::{ForgotPasswordPayload, LoginPayload, RegisterPayload, ResetPasswordPayload};

fn email(errors: &mut ValidationErrors, raw: &str) -> String {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if !is_valid_email(&email) {
        errors.add("email", "Invalid email");
    }
    email
}

fn new_password(errors: &mut ValidationErrors, password: &str, confirm: &str) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password", format!("Password must be at least {MIN_PASSWORD_LEN} characters"));
    }
    if password != confirm {
        errors.add("confirmPassword", "Passwords do not match");
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Page to return to after signing in.
    #[serde(default)]
    pub redirect: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.finish(Some(LoginPayload {
            email,
            password: self.password.clone(),
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<RegisterPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.add("name", "Name is required");
        }
        let email = email(&mut errors, &self.email);
        new_password(&mut errors, &self.password, &self.confirm_password);
        errors.finish(Some(RegisterPayload {
            name,
            email,
            password: self.password.clone(),
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
}

impl ForgotPasswordForm {
    pub fn validate(&self) -> Result<ForgotPasswordPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = email(&mut errors, &self.email);
        errors.finish(Some(ForgotPasswordPayload { email }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl ResetPasswordForm {
    pub fn validate(&self) -> Result<ResetPasswordPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let token = self.token.trim().to_string();
        if token.is_empty() {
            errors.add("token", "Reset link is invalid or incomplete");
        }
        new_password(&mut errors, &self.password, &self.confirm_password);
        errors.finish(Some(ResetPasswordPayload {
            token,
            password: self.password.clone(),
        }))
    }
}
