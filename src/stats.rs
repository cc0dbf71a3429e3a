//! Arithmetic over the records the API returns. No I/O.

use std::collections::BTreeMap;

use time::{Date, Duration};

use crate::models::{Bill, GoalContribution, PlanItem, SavingsGoal, StatisticsSummary};

/// Share of the target reached, clamped to `0..=100`. A zero target is 0%.
pub fn goal_progress(goal: &SavingsGoal) -> f64 {
    if goal.target_amount <= 0.0 {
        return 0.0;
    }
    (goal.current_amount / goal.target_amount * 100.0).clamp(0.0, 100.0)
}

pub fn goal_remaining(goal: &SavingsGoal) -> f64 {
    (goal.target_amount - goal.current_amount).max(0.0)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalHistorySummary {
    pub total: f64,
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub average: f64,
    /// Contributed amount per goal id.
    pub by_goal: BTreeMap<String, f64>,
}

pub fn goal_history_summary(history: &[GoalContribution]) -> GoalHistorySummary {
    let mut summary = GoalHistorySummary::default();
    for c in history {
        summary.total += c.amount;
        summary.count += 1;
        summary.min = Some(summary.min.map_or(c.amount, |m| m.min(c.amount)));
        summary.max = Some(summary.max.map_or(c.amount, |m| m.max(c.amount)));
        *summary.by_goal.entry(c.goal_id.clone()).or_insert(0.0) += c.amount;
    }
    if summary.count > 0 {
        summary.average = summary.total / summary.count as f64;
    }
    summary
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillTotals {
    pub total_due: f64,
    pub unpaid_total: f64,
    pub overdue: usize,
    pub due_soon: usize,
}

/// Widest due-soon window, about a century.
pub const MAX_SOON_DAYS: i64 = 36_500;

/// `due_soon` counts unpaid bills due between `today` and `today + soon_days`.
/// `soon_days` is clamped to `0..=MAX_SOON_DAYS`.
pub fn bill_totals(bills: &[Bill], today: Date, soon_days: i64) -> BillTotals {
    let horizon = today.saturating_add(Duration::days(soon_days.clamp(0, MAX_SOON_DAYS)));
    let mut totals = BillTotals::default();
    for bill in bills {
        totals.total_due += bill.amount;
        if bill.is_paid {
            continue;
        }
        totals.unpaid_total += bill.amount;
        if bill.due_date < today {
            totals.overdue += 1;
        } else if bill.due_date <= horizon {
            totals.due_soon += 1;
        }
    }
    totals
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanSummary {
    pub planned: f64,
    pub actual: f64,
    pub remaining: f64,
    /// Actual over planned in percent; 0 when nothing is planned.
    pub percent_used: f64,
    /// Ids of items whose actual spend exceeds the plan.
    pub over_budget: Vec<String>,
}

pub fn plan_summary(items: &[PlanItem]) -> PlanSummary {
    let mut summary = PlanSummary::default();
    for item in items {
        summary.planned += item.planned_amount;
        summary.actual += item.actual_amount;
        if item.actual_amount > item.planned_amount {
            summary.over_budget.push(item.id.clone());
        }
    }
    summary.remaining = summary.planned - summary.actual;
    if summary.planned > 0.0 {
        summary.percent_used = summary.actual / summary.planned * 100.0;
    }
    summary
}

/// Each category's percentage of the summed category amounts, in input order.
pub fn category_shares(summary: &StatisticsSummary) -> Vec<(String, f64)> {
    let total: f64 = summary.by_category.iter().map(|c| c.amount).sum();
    summary
        .by_category
        .iter()
        .map(|c| {
            let label = c.name.clone().unwrap_or_else(|| c.category_id.clone());
            let share = if total > 0.0 { c.amount / total * 100.0 } else { 0.0 };
            (label, share)
        })
        .collect()
}

/// Percent of income not spent; 0 without income.
pub fn savings_rate(income: f64, expenses: f64) -> f64 {
    if income <= 0.0 {
        return 0.0;
    }
    (income - expenses) / income * 100.0
}
