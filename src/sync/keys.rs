//! Query keys for every read the finance client makes. Mutations invalidate
//! by the resource-level keys, which prefix-match every filtered variant.

use crate::api::dto::TransactionFilter;
use crate::models::{EntryType, StatsPeriod};
use crate::query::QueryKey;

pub const BILLS: &str = "bills";
pub const TRANSACTIONS: &str = "transactions";
pub const GOALS: &str = "goals";
pub const GOAL_HISTORY: &str = "goal-history";
pub const CATEGORIES: &str = "categories";
pub const PLANNING: &str = "planning";
pub const STATISTICS: &str = "statistics";
pub const DASHBOARD: &str = "dashboard";
pub const ME: &str = "me";

pub fn bills() -> QueryKey {
    QueryKey::new(BILLS)
}

pub fn bill(id: &str) -> QueryKey {
    bills().with(id)
}

pub fn transactions() -> QueryKey {
    QueryKey::new(TRANSACTIONS)
}

pub fn transaction_list(filter: &TransactionFilter) -> QueryKey {
    transactions().with("list").with(filter)
}

pub fn transaction(id: &str) -> QueryKey {
    transactions().with("detail").with(id)
}

pub fn goals() -> QueryKey {
    QueryKey::new(GOALS)
}

pub fn goal(id: &str) -> QueryKey {
    goals().with(id)
}

pub fn goal_history() -> QueryKey {
    QueryKey::new(GOAL_HISTORY)
}

pub fn categories() -> QueryKey {
    QueryKey::new(CATEGORIES)
}

pub fn category_list(kind: Option<EntryType>) -> QueryKey {
    categories().with(kind)
}

pub fn planning() -> QueryKey {
    QueryKey::new(PLANNING)
}

pub fn plan_month(month: &str) -> QueryKey {
    planning().with(month)
}

pub fn statistics() -> QueryKey {
    QueryKey::new(STATISTICS)
}

pub fn statistics_for(period: StatsPeriod) -> QueryKey {
    statistics().with(period)
}

pub fn dashboard() -> QueryKey {
    QueryKey::new(DASHBOARD)
}

pub fn me() -> QueryKey {
    QueryKey::new(ME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filtered_keys_sit_under_their_resource() {
        let filter = TransactionFilter {
            kind: Some(EntryType::Income),
            ..Default::default()
        };
        assert!(transaction_list(&filter).starts_with(&transactions()));
        assert!(transaction("t1").starts_with(&transactions()));
        assert!(category_list(None).starts_with(&categories()));
        assert!(plan_month("2024-05").starts_with(&planning()));
        assert!(statistics_for(StatsPeriod::Week).starts_with(&statistics()));
        assert!(!goal_history().starts_with(&goals()));
    }

    #[test]
    fn equal_filters_give_equal_keys() {
        let a = TransactionFilter {
            search: Some("coffee".into()),
            page: Some(1),
            ..Default::default()
        };
        assert_eq!(transaction_list(&a), transaction_list(&a.clone()));
        assert_ne!(transaction_list(&a), transaction_list(&TransactionFilter::default()));
    }
}
