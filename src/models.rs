//! Records mirrored from the finance API.
//!
//! The client holds no invariants beyond shape; server-computed fields are
//! optional and shown as received.

use serde::{Deserialize, Serialize};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parses `YYYY-MM-DD`. A longer ISO timestamp is cut to its date part.
pub fn parse_date(s: &str) -> Option<Date> {
    let s = s.trim();
    let day = s.get(..10).unwrap_or(s);
    Date::parse(day, DATE_FORMAT).ok()
}

pub fn format_date(d: &Date) -> String {
    d.format(DATE_FORMAT)
        .unwrap_or_else(|_| format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day()))
}

/// serde adapter for `YYYY-MM-DD` dates.
pub mod iso_date {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(d: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_date(d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date `{raw}`")))
    }

    pub mod option {
        use serde::{de, Deserialize, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S: Serializer>(d: &Option<Date>, s: S) -> Result<S::Ok, S::Error> {
            match d {
                Some(d) => s.serialize_str(&super::super::format_date(d)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
            match Option::<String>::deserialize(d)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::super::parse_date(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid date `{raw}`"))),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    Income,
    Expense,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOME" => Some(Self::Income),
            "EXPENSE" => Some(Self::Expense),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BillFrequency {
    Once,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl BillFrequency {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ONCE" => Some(Self::Once),
            "WEEKLY" => Some(Self::Weekly),
            "MONTHLY" => Some(Self::Monthly),
            "QUARTERLY" => Some(Self::Quarterly),
            "YEARLY" => Some(Self::Yearly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Returned by login and registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: EntryType,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: String,
    pub name: String,
    pub amount: f64,
    #[serde(with = "iso_date")]
    pub due_date: Date,
    pub frequency: BillFrequency,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub autopay: bool,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub days_until_due: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    pub id: String,
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default, with = "iso_date::option")]
    pub deadline: Option<Date>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub progress_percentage: Option<f64>,
}

/// One entry of a goal's contribution history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalContribution {
    pub id: String,
    pub goal_id: String,
    #[serde(default)]
    pub goal_name: Option<String>,
    pub amount: f64,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItem {
    pub id: String,
    pub category_id: String,
    #[serde(default)]
    pub category: Option<Category>,
    /// `YYYY-MM`
    pub month: String,
    pub planned_amount: f64,
    #[serde(default)]
    pub actual_amount: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    pub month: String,
    pub income: f64,
    pub expenses: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    #[serde(default)]
    pub total_income: f64,
    #[serde(default)]
    pub total_expenses: f64,
    #[serde(default)]
    pub net: f64,
    #[serde(default)]
    pub by_category: Vec<CategoryTotal>,
    #[serde(default)]
    pub monthly: Vec<MonthlyTotal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub monthly_income: f64,
    #[serde(default)]
    pub monthly_expenses: f64,
    #[serde(default)]
    pub upcoming_bills: Vec<Bill>,
    #[serde(default)]
    pub recent_transactions: Vec<Transaction>,
    #[serde(default)]
    pub goals: Vec<SavingsGoal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Week,
    Month,
    Year,
}

impl StatsPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn bill_deserializes_from_camel_case() {
        let json = r#"{
            "id": "b1", "name": "Rent", "amount": 1200, "dueDate": "2024-01-01",
            "frequency": "MONTHLY", "categoryId": "housing", "daysUntilDue": 3
        }"#;
        let bill: Bill = serde_json::from_str(json).unwrap();
        assert_eq!(bill.due_date, date!(2024 - 01 - 01));
        assert_eq!(bill.frequency, BillFrequency::Monthly);
        assert!(!bill.autopay);
        assert!(!bill.is_paid);
        assert_eq!(bill.days_until_due, Some(3));
    }

    #[test]
    fn goal_without_deadline_is_accepted() {
        let json = r#"{"id":"g1","name":"Trip","targetAmount":2000}"#;
        let goal: SavingsGoal = serde_json::from_str(json).unwrap();
        assert_eq!(goal.deadline, None);
        assert_eq!(goal.current_amount, 0.0);
    }

    #[test]
    fn dashboard_tolerates_missing_sections() {
        let summary: DashboardSummary = serde_json::from_str(r#"{"balance": 10.5}"#).unwrap();
        assert_eq!(summary.balance, 10.5);
        assert!(summary.upcoming_bills.is_empty());
    }

    #[test]
    fn dates_accept_full_timestamps() {
        assert_eq!(parse_date("2024-03-05T00:00:00.000Z"), Some(date!(2024 - 03 - 05)));
        assert_eq!(parse_date("2024-3-5"), None);
        assert_eq!(format_date(&date!(2024 - 03 - 05)), "2024-03-05");
    }

    #[test]
    fn entry_type_parse_is_case_insensitive() {
        assert_eq!(EntryType::parse("income"), Some(EntryType::Income));
        assert_eq!(EntryType::parse(" Expense "), Some(EntryType::Expense));
        assert_eq!(EntryType::parse("transfer"), None);
        assert_eq!(BillFrequency::parse("yearly"), Some(BillFrequency::Yearly));
    }
}
