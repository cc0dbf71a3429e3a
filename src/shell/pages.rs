//! HTML page shells. Each page is a document with a title and a mount point
//! the front end renders into; auth pages also carry their form.

use std::fmt::Write;

use axum::response::Html;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Transactions,
    Bills,
    Goals,
    GoalHistory,
    AddGoal,
    EditGoal,
    Planning,
    Statistics,
    Categories,
    Settings,
    Login,
    Register,
    ForgotPassword,
    ResetPassword,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Transactions => "Transactions",
            Page::Bills => "Bills",
            Page::Goals => "Savings Goals",
            Page::GoalHistory => "Goal History",
            Page::AddGoal => "Add Goal",
            Page::EditGoal => "Edit Goal",
            Page::Planning => "Budget Planning",
            Page::Statistics => "Statistics",
            Page::Categories => "Categories",
            Page::Settings => "Settings",
            Page::Login => "Sign In",
            Page::Register => "Create Account",
            Page::ForgotPassword => "Forgot Password",
            Page::ResetPassword => "Reset Password",
        }
    }

    /// Value of the mount point's `data-page` attribute.
    pub fn slug(&self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Transactions => "transactions",
            Page::Bills => "bills",
            Page::Goals => "goals",
            Page::GoalHistory => "goal-history",
            Page::AddGoal => "goal-add",
            Page::EditGoal => "goal-edit",
            Page::Planning => "planning",
            Page::Statistics => "statistics",
            Page::Categories => "categories",
            Page::Settings => "settings",
            Page::Login => "login",
            Page::Register => "register",
            Page::ForgotPassword => "forgot-password",
            Page::ResetPassword => "reset-password",
        }
    }
}

/// Query parameters the auth pages understand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub redirect: Option<String>,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub token: Option<String>,
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn input(body: &mut String, kind: &str, name: &str, label: &str) {
    let _ = write!(
        body,
        r#"<label>{label}<input type="{kind}" name="{name}" required></label>"#
    );
}

fn hidden(body: &mut String, name: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        let _ = write!(body, r#"<input type="hidden" name="{name}" value="{}">"#, escape(v));
    }
}

fn form(page: Page, q: &PageQuery) -> String {
    let mut body = String::new();
    let action = match page {
        Page::Login => "/login",
        Page::Register => "/register",
        Page::ForgotPassword => "/forgot-password",
        Page::ResetPassword => "/reset-password",
        _ => return body,
    };
    let _ = write!(body, r#"<form method="post" action="{action}">"#);
    match page {
        Page::Login => {
            input(&mut body, "email", "email", "Email");
            input(&mut body, "password", "password", "Password");
            hidden(&mut body, "redirect", q.redirect.as_deref());
        }
        Page::Register => {
            input(&mut body, "text", "name", "Name");
            input(&mut body, "email", "email", "Email");
            input(&mut body, "password", "password", "Password");
            input(&mut body, "password", "confirmPassword", "Confirm password");
            hidden(&mut body, "redirect", q.redirect.as_deref());
        }
        Page::ForgotPassword => input(&mut body, "email", "email", "Email"),
        _ => {
            hidden(&mut body, "token", q.token.as_deref());
            input(&mut body, "password", "password", "New password");
            input(&mut body, "password", "confirmPassword", "Confirm password");
        }
    }
    let _ = write!(body, r#"<button type="submit">{}</button></form>"#, page.title());
    body
}

/// `id` is the record the page edits, when it edits one.
pub fn render(page: Page, q: &PageQuery, id: Option<&str>) -> Html<String> {
    let mut body = String::new();
    if let Some(err) = q.error.as_deref() {
        let _ = write!(body, r#"<p class="error" role="alert">{}</p>"#, escape(err));
    }
    if let Some(notice) = q.notice.as_deref() {
        let _ = write!(body, r#"<p class="notice" role="status">{}</p>"#, escape(notice));
    }
    body.push_str(&form(page, q));

    let id_attr = id
        .map(|id| format!(r#" data-id="{}""#, escape(id)))
        .unwrap_or_default();

    Html(format!(
        concat!(
            "<!doctype html>\n",
            r#"<html lang="en"><head><meta charset="utf-8">"#,
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
            "<title>{title} | FinTrack</title></head>",
            r#"<body><main id="app" data-page="{slug}"{id_attr}><h1>{title}</h1>{body}</main></body></html>"#,
        ),
        title = page.title(),
        slug = page.slug(),
        id_attr = id_attr,
        body = body,
    ))
}
