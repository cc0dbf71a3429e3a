use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tracing::{info, instrument, warn};

use super::pages::{render, Page, PageQuery};
use super::AppState;
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::forms::{ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm, ValidationErrors};
use crate::guard::{safe_redirect_target, LOGIN_PATH};
use crate::models::AuthResponse;
use crate::session::{cookie, SessionManager};

pub async fn page(page: Page, Query(q): Query<PageQuery>) -> Html<String> {
    render(page, &q, None)
}

pub async fn edit_goal(Path(id): Path<String>, Query(q): Query<PageQuery>) -> Html<String> {
    render(Page::EditGoal, &q, Some(&id))
}

/// Only reached when the guard is not layered in front.
pub async fn root() -> Redirect {
    Redirect::to(LOGIN_PATH)
}

/// Each form post talks to the API with its own in-memory session: the
/// browser's cookie is the only place the token lives.
fn api(state: &AppState) -> Result<ApiClient, ApiError> {
    ApiClient::with_http(
        state.http.clone(),
        &state.config.api_base_url,
        SessionManager::in_memory(),
    )
}

fn back_to(path: &str, error: &str, redirect: Option<&str>) -> Redirect {
    let mut to = format!("{path}?error={}", urlencoding::encode(error));
    if let Some(r) = redirect.filter(|r| !r.is_empty()) {
        to.push_str("&redirect=");
        to.push_str(&urlencoding::encode(r));
    }
    Redirect::to(&to)
}

fn notice(message: &str) -> Redirect {
    Redirect::to(&format!("{LOGIN_PATH}?notice={}", urlencoding::encode(message)))
}

fn invalid(errors: &ValidationErrors) -> &str {
    errors.first_message().unwrap_or("Please check the form")
}

fn signed_in(state: &AppState, res: &AuthResponse, redirect: Option<&str>) -> Response {
    let target = safe_redirect_target(redirect);
    let set = cookie::set_cookie(&state.config.cookie, &res.token);
    match set.as_deref().and_then(cookie::header_value) {
        Some(value) => {
            let mut response = Redirect::to(&target).into_response();
            response.headers_mut().insert(header::SET_COOKIE, value);
            response
        }
        None => {
            warn!("API returned a token that cannot be stored in a cookie");
            back_to(LOGIN_PATH, "Sign in failed. Please try again.", redirect).into_response()
        }
    }
}

#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let redirect = form.redirect.as_deref();
    let payload = match form.validate() {
        Ok(p) => p,
        Err(errors) => {
            warn!(%errors, "login form rejected");
            return back_to("/login", invalid(&errors), redirect).into_response();
        }
    };
    let result = match api(&state) {
        Ok(api) => api.login(&payload).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(res) => {
            info!(user_id = %res.user.id, "signed in");
            signed_in(&state, &res, redirect)
        }
        Err(e) => {
            warn!(error = %e, "login failed");
            back_to("/login", &e.user_message(), redirect).into_response()
        }
    }
}

#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    let redirect = form.redirect.as_deref();
    let payload = match form.validate() {
        Ok(p) => p,
        Err(errors) => {
            warn!(%errors, "registration form rejected");
            return back_to("/register", invalid(&errors), redirect).into_response();
        }
    };
    let result = match api(&state) {
        Ok(api) => api.register(&payload).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(res) => {
            info!(user_id = %res.user.id, "registered");
            signed_in(&state, &res, redirect)
        }
        Err(e) => {
            warn!(error = %e, "registration failed");
            back_to("/register", &e.user_message(), redirect).into_response()
        }
    }
}

pub async fn logout(State(state): State<AppState>) -> Response {
    let mut response = Redirect::to(LOGIN_PATH).into_response();
    if let Some(value) = cookie::header_value(&cookie::clear_cookie(&state.config.cookie)) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    info!("signed out");
    response
}

#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Redirect {
    let payload = match form.validate() {
        Ok(p) => p,
        Err(errors) => return back_to("/forgot-password", invalid(&errors), None),
    };
    let result = match api(&state) {
        Ok(api) => api.forgot_password(&payload).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => notice("If that email is registered, a reset link is on its way."),
        Err(e) => {
            warn!(error = %e, "forgot-password request failed");
            back_to("/forgot-password", &e.user_message(), None)
        }
    }
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> Redirect {
    let payload = match form.validate() {
        Ok(p) => p,
        Err(errors) => return reset_failed(&form.token, invalid(&errors)),
    };
    let result = match api(&state) {
        Ok(api) => api.reset_password(&payload).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => notice("Password updated. Please sign in."),
        Err(e) => {
            warn!(error = %e, "password reset failed");
            reset_failed(&form.token, &e.user_message())
        }
    }
}

fn reset_failed(token: &str, error: &str) -> Redirect {
    let mut to = format!("/reset-password?error={}", urlencoding::encode(error));
    if !token.trim().is_empty() {
        to.push_str("&token=");
        to.push_str(&urlencoding::encode(token.trim()));
    }
    Redirect::to(&to)
}
