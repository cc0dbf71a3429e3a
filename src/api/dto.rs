use serde::{Deserialize, Serialize};
use time::Date;

use crate::models::{iso_date, BillFrequency, EntryType};

/// Request body for login.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// Request body for user registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForgotPasswordPayload {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetPasswordPayload {
    pub token: String,
    pub password: String,
}

/// Plain acknowledgement some endpoints answer with.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: EntryType,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Query parameters of the transaction list. Also part of its query key, so
/// unset fields are left out entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none", with = "iso_date::option")]
    pub end_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPayload {
    pub name: String,
    pub amount: f64,
    #[serde(with = "iso_date")]
    pub due_date: Date,
    pub frequency: BillFrequency,
    pub category_id: String,
    pub autopay: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPayload {
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none", with = "iso_date::option")]
    pub deadline: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionPayload {
    pub amount: f64,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItemPayload {
    pub category_id: String,
    pub month: String,
    pub planned_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
