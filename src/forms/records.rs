use serde::Deserialize;
use time::Date;

use super::{amount, date, is_valid_month, optional, required, ValidationErrors};
use crate::api::dto::{
    BillPayload, CategoryPayload, ContributionPayload, GoalPayload, PlanItemPayload,
    TransactionPayload,
};
use crate::models::{BillFrequency, EntryType};

pub const MAX_DESCRIPTION_LEN: usize = 255;
pub const MAX_CATEGORY_NAME_LEN: usize = 50;

fn today() -> Date {
    time::OffsetDateTime::now_utc().date()
}

/// HTML checkboxes submit `on` when ticked and nothing otherwise.
fn checkbox(raw: &Option<String>) -> bool {
    matches!(
        raw.as_deref().map(str::trim),
        Some("on" | "true" | "1" | "yes")
    )
}

fn entry_type(errors: &mut ValidationErrors, raw: &str) -> Option<EntryType> {
    if raw.trim().is_empty() {
        errors.add("type", "Type is required");
        return None;
    }
    let kind = EntryType::parse(raw);
    if kind.is_none() {
        errors.add("type", "Type must be INCOME or EXPENSE");
    }
    kind
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub autopay: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BillForm {
    pub fn validate(&self) -> Result<BillPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required(&mut errors, "name", &self.name, "Name");
        let amount = amount(&mut errors, "amount", &self.amount, false);
        let due_date = date(&mut errors, "dueDate", &self.due_date);
        let frequency = if self.frequency.trim().is_empty() {
            errors.add("frequency", "Frequency is required");
            None
        } else {
            let f = BillFrequency::parse(&self.frequency);
            if f.is_none() {
                errors.add("frequency", "Unknown frequency");
            }
            f
        };
        let category_id = required(&mut errors, "categoryId", &self.category_id, "Category");

        let payload = match (name, amount, due_date, frequency, category_id) {
            (Some(name), Some(amount), Some(due_date), Some(frequency), Some(category_id)) => {
                Some(BillPayload {
                    name,
                    amount,
                    due_date,
                    frequency,
                    category_id,
                    autopay: checkbox(&self.autopay),
                    notes: optional(&self.notes),
                })
            }
            _ => None,
        };
        errors.finish(payload)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    #[serde(default)]
    pub amount: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TransactionForm {
    pub fn validate(&self) -> Result<TransactionPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let amount = amount(&mut errors, "amount", &self.amount, false);
        let kind = entry_type(&mut errors, &self.kind);
        let date = date(&mut errors, "date", &self.date);
        let description = optional(&self.description);
        if description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
        {
            errors.add(
                "description",
                format!("Description must be at most {MAX_DESCRIPTION_LEN} characters"),
            );
        }

        let payload = match (amount, kind, date) {
            (Some(amount), Some(kind), Some(date)) => Some(TransactionPayload {
                amount,
                kind,
                date,
                category_id: optional(&self.category_id),
                description,
                notes: optional(&self.notes),
            }),
            _ => None,
        };
        errors.finish(payload)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub target_amount: String,
    #[serde(default)]
    pub current_amount: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl GoalForm {
    pub fn validate(&self) -> Result<GoalPayload, ValidationErrors> {
        self.validate_on(today())
    }

    /// Validation with an explicit "today" for the deadline rule.
    pub fn validate_on(&self, today: Date) -> Result<GoalPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required(&mut errors, "name", &self.name, "Name");
        let target = amount(&mut errors, "targetAmount", &self.target_amount, false);
        let current = match optional(&self.current_amount) {
            None => Some(0.0),
            Some(raw) => amount(&mut errors, "currentAmount", &raw, true),
        };
        let deadline = match optional(&self.deadline) {
            None => None,
            Some(raw) => {
                let d = date(&mut errors, "deadline", &raw);
                if d.is_some_and(|d| d < today) {
                    errors.add("deadline", "Deadline cannot be in the past");
                }
                d
            }
        };

        let payload = match (name, target, current) {
            (Some(name), Some(target_amount), Some(current_amount)) => Some(GoalPayload {
                name,
                target_amount,
                current_amount,
                deadline,
                category_id: optional(&self.category_id),
                notes: optional(&self.notes),
            }),
            _ => None,
        };
        errors.finish(payload)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContributionForm {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ContributionForm {
    pub fn validate(&self) -> Result<ContributionPayload, ValidationErrors> {
        self.validate_on(today())
    }

    /// A missing date means `today`.
    pub fn validate_on(&self, today: Date) -> Result<ContributionPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let amount = amount(&mut errors, "amount", &self.amount, false);
        let date = match optional(&self.date) {
            None => Some(today),
            Some(raw) => date(&mut errors, "date", &raw),
        };

        let payload = match (amount, date) {
            (Some(amount), Some(date)) => Some(ContributionPayload {
                amount,
                date,
                notes: optional(&self.notes),
            }),
            _ => None,
        };
        errors.finish(payload)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl CategoryForm {
    pub fn validate(&self) -> Result<CategoryPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required(&mut errors, "name", &self.name, "Name");
        if name
            .as_ref()
            .is_some_and(|n| n.chars().count() > MAX_CATEGORY_NAME_LEN)
        {
            errors.add(
                "name",
                format!("Name must be at most {MAX_CATEGORY_NAME_LEN} characters"),
            );
        }
        let kind = entry_type(&mut errors, &self.kind);

        let payload = match (name, kind) {
            (Some(name), Some(kind)) => Some(CategoryPayload {
                name,
                kind,
                icon: optional(&self.icon),
                color: optional(&self.color),
            }),
            _ => None,
        };
        errors.finish(payload)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItemForm {
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub planned_amount: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PlanItemForm {
    pub fn validate(&self) -> Result<PlanItemPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let category_id = required(&mut errors, "categoryId", &self.category_id, "Category");
        let month = self.month.trim().to_string();
        if month.is_empty() {
            errors.add("month", "Month is required");
        } else if !is_valid_month(&month) {
            errors.add("month", "Use the format YYYY-MM");
        }
        let planned = amount(&mut errors, "plannedAmount", &self.planned_amount, true);

        let payload = match (category_id, planned) {
            (Some(category_id), Some(planned_amount)) => Some(PlanItemPayload {
                category_id,
                month,
                planned_amount,
                notes: optional(&self.notes),
            }),
            _ => None,
        };
        errors.finish(payload)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use super::*;

    fn rent() -> BillForm {
        BillForm {
            name: "Rent".into(),
            amount: "1200".into(),
            due_date: "2024-01-01".into(),
            frequency: "MONTHLY".into(),
            category_id: "housing".into(),
            autopay: None,
            notes: None,
        }
    }

    #[test]
    fn rent_bill_becomes_create_payload() {
        let payload = rent().validate().unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "name": "Rent",
                "amount": 1200.0,
                "dueDate": "2024-01-01",
                "frequency": "MONTHLY",
                "categoryId": "housing",
                "autopay": false
            })
        );
    }

    #[test]
    fn bill_form_reports_every_bad_field() {
        let form = BillForm {
            name: "  ".into(),
            amount: "-5".into(),
            due_date: "01/01/2024".into(),
            frequency: String::new(),
            category_id: String::new(),
            autopay: Some("on".into()),
            notes: None,
        };
        let errors = form.validate().unwrap_err();
        for field in ["name", "amount", "dueDate", "frequency", "categoryId"] {
            assert!(errors.get(field).is_some(), "missing error for {field}");
        }
    }

    #[test]
    fn bill_form_decodes_from_urlencoded_fields() {
        let form: BillForm = serde_json::from_value(json!({
            "name": "Gym", "amount": "30", "dueDate": "2024-02-10",
            "frequency": "monthly", "categoryId": "health", "autopay": "on", "notes": " "
        }))
        .unwrap();
        let payload = form.validate().unwrap();
        assert!(payload.autopay);
        assert_eq!(payload.notes, None);
        assert_eq!(payload.frequency, BillFrequency::Monthly);
    }

    #[test]
    fn transaction_description_limit() {
        let mut form = TransactionForm {
            amount: "12.5".into(),
            kind: "expense".into(),
            date: "2024-03-01".into(),
            ..Default::default()
        };
        assert_eq!(form.validate().unwrap().kind, EntryType::Expense);

        form.description = Some("x".repeat(256));
        let errors = form.validate().unwrap_err();
        assert!(errors.get("description").is_some());
    }

    #[test]
    fn goal_deadline_not_in_past() {
        let today = date!(2024 - 06 - 15);
        let mut form = GoalForm {
            name: "Trip".into(),
            target_amount: "2000".into(),
            deadline: Some("2024-06-14".into()),
            ..Default::default()
        };
        assert!(form.validate_on(today).unwrap_err().get("deadline").is_some());

        form.deadline = Some("2024-06-15".into());
        let payload = form.validate_on(today).unwrap();
        assert_eq!(payload.current_amount, 0.0);
        assert_eq!(payload.deadline, Some(today));

        form.current_amount = Some("-1".into());
        assert!(form.validate_on(today).unwrap_err().get("currentAmount").is_some());
    }

    #[test]
    fn contribution_defaults_to_today() {
        let today = date!(2024 - 06 - 15);
        let form = ContributionForm {
            amount: "50".into(),
            ..Default::default()
        };
        assert_eq!(form.validate_on(today).unwrap().date, today);
        assert!(ContributionForm::default().validate_on(today).is_err());
    }

    #[test]
    fn category_name_limit_and_type() {
        let form = CategoryForm {
            name: "n".repeat(51),
            kind: "transfer".into(),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.get("name").is_some());
        assert_eq!(errors.get("type"), Some("Type must be INCOME or EXPENSE"));
    }

    #[test]
    fn plan_item_month_and_amount() {
        let form = PlanItemForm {
            category_id: "food".into(),
            month: "2024-05".into(),
            planned_amount: "0".into(),
            notes: None,
        };
        assert_eq!(form.validate().unwrap().planned_amount, 0.0);

        let bad = PlanItemForm {
            month: "May".into(),
            ..form
        };
        assert_eq!(bad.validate().unwrap_err().get("month"), Some("Use the format YYYY-MM"));
    }
}
