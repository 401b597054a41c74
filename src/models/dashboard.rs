//! The aggregate shown on the dashboard: totals plus a monthly series.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::models::{Transaction, TransactionType};

/// Income and expenses for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardBucket {
    /// The first day of the month.
    pub month: Date,
    /// The sum of credits in the month.
    pub income: f64,
    /// The sum of debits in the month, as a positive number.
    pub expenses: f64,
}

/// Totals over a range of transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    /// Income minus expenses.
    pub amount: f64,
    /// The sum of all credits.
    pub income: f64,
    /// The sum of all debits, as a positive number.
    pub expenses: f64,
    /// Per-month totals in chronological order. Months without transactions are omitted.
    pub series: Vec<DashboardBucket>,
}

impl DashboardData {
    /// Aggregate `transactions` into totals and a monthly series.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut months: BTreeMap<Date, DashboardBucket> = BTreeMap::new();

        for transaction in transactions {
            let month = first_day_of_month(transaction.date);
            let bucket = months.entry(month).or_insert(DashboardBucket {
                month,
                income: 0.0,
                expenses: 0.0,
            });

            match transaction.kind {
                TransactionType::Credit => bucket.income += transaction.value,
                TransactionType::Debit => bucket.expenses += transaction.value,
            }
        }

        let series: Vec<DashboardBucket> = months.into_values().collect();
        let income = series.iter().map(|bucket| bucket.income).sum();
        let expenses = series.iter().map(|bucket| bucket.expenses).sum();

        Self {
            amount: income - expenses,
            income,
            expenses,
            series,
        }
    }
}

fn first_day_of_month(date: Date) -> Date {
    // Day 1 exists in every month.
    date.replace_day(1).unwrap_or(date)
}
