//! Route guard: decides from the request path and token presence alone
//! whether a page renders or redirects.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::session::cookie::token_from_headers;
use crate::shell::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/dashboard";

const PROTECTED: &[&str] = &[
    "/dashboard",
    "/transactions",
    "/bills",
    "/goals",
    "/planning",
    "/statistics",
    "/categories",
    "/settings",
];

const AUTH_ONLY: &[&str] = &["/login", "/register", "/forgot-password", "/reset-password"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

fn matches(path: &str, base: &str) -> bool {
    path == base
        || path
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn is_protected(path: &str) -> bool {
    PROTECTED.iter().any(|p| matches(path, p))
}

pub fn is_auth_page(path: &str) -> bool {
    AUTH_ONLY.iter().any(|p| matches(path, p))
}

pub fn login_redirect(path: &str) -> String {
    format!("{LOGIN_PATH}?redirect={}", urlencoding::encode(path))
}

pub fn decide(path: &str, has_token: bool) -> RouteDecision {
    if path == "/" {
        let to = if has_token { HOME_PATH } else { LOGIN_PATH };
        return RouteDecision::Redirect(to.to_string());
    }
    if !has_token && is_protected(path) {
        return RouteDecision::Redirect(login_redirect(path));
    }
    if has_token && is_auth_page(path) {
        return RouteDecision::Redirect(HOME_PATH.to_string());
    }
    RouteDecision::Allow
}

fn is_local_path(t: &str) -> bool {
    t.starts_with('/')
        && !t.starts_with("//")
        && !t.contains('\\')
        && !t.chars().any(|c| c.is_control() || c.is_whitespace())
}

/// Accepts a post-login return target only when it stays on this site.
/// Browsers drop tabs and newlines while parsing, so `/\t/host` counts as
/// off-site.
pub fn safe_redirect_target(target: Option<&str>) -> String {
    match target.map(str::trim) {
        Some(t) if is_local_path(t) => t.to_string(),
        _ => HOME_PATH.to_string(),
    }
}

pub async fn route_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let has_token = token_from_headers(req.headers(), &state.config.cookie.name).is_some();
    let path = req.uri().path().to_string();
    match decide(&path, has_token) {
        RouteDecision::Allow => next.run(req).await,
        RouteDecision::Redirect(to) => {
            debug!(%path, %to, has_token, "route guard redirect");
            Redirect::to(&to).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_page_without_token_goes_to_login() {
        assert_eq!(
            decide("/bills", false),
            RouteDecision::Redirect("/login?redirect=%2Fbills".into())
        );
        assert_eq!(
            decide("/goals/42/edit", false),
            RouteDecision::Redirect("/login?redirect=%2Fgoals%2F42%2Fedit".into())
        );
        assert_eq!(decide("/bills", true), RouteDecision::Allow);
    }

    #[test]
    fn auth_pages_bounce_signed_in_users() {
        assert_eq!(decide("/login", true), RouteDecision::Redirect("/dashboard".into()));
        assert_eq!(decide("/register", true), RouteDecision::Redirect("/dashboard".into()));
        assert_eq!(decide("/login", false), RouteDecision::Allow);
        assert_eq!(decide("/reset-password", false), RouteDecision::Allow);
    }

    #[test]
    fn root_redirects_on_token_presence() {
        assert_eq!(decide("/", true), RouteDecision::Redirect("/dashboard".into()));
        assert_eq!(decide("/", false), RouteDecision::Redirect("/login".into()));
    }

    #[test]
    fn lookalike_paths_are_not_protected() {
        assert_eq!(decide("/billsfoo", false), RouteDecision::Allow);
        assert_eq!(decide("/health", false), RouteDecision::Allow);
        assert_eq!(decide("/loginx", true), RouteDecision::Allow);
    }

    #[test]
    fn only_local_redirect_targets_are_kept() {
        assert_eq!(safe_redirect_target(Some("/bills")), "/bills");
        assert_eq!(safe_redirect_target(Some("//evil.example")), "/dashboard");
        assert_eq!(safe_redirect_target(Some("https://evil.example")), "/dashboard");
        assert_eq!(safe_redirect_target(Some("/\t/evil.example")), "/dashboard");
        assert_eq!(safe_redirect_target(Some("/bills\nx")), "/dashboard");
        assert_eq!(safe_redirect_target(None), "/dashboard");
    }

    #[test]
    fn redirect_targets_with_control_chars_are_dropped() {
        assert_eq!(safe_redirect_target(Some("/\t/evil.example")), "/dashboard");
        assert_eq!(safe_redirect_target(Some("/bills\nx")), "/dashboard");
        assert_eq!(safe_redirect_target(Some("/bills\r\nSet-Cookie: a=b")), "/dashboard");
        assert_eq!(safe_redirect_target(Some("/goals/a b")), "/dashboard");
        assert_eq!(safe_redirect_target(Some("/\u{7f}")), "/dashboard");
    }
}
