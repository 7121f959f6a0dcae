//! Aggregates over a project's transactions: totals by type and expenses grouped by category.

use crate::model::{category_label, Category, Transaction, TransactionType};
use rust_decimal::Decimal;
use serde::Serialize;

/// Income, expense and balance totals for a set of transactions.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub transaction_count: usize,
    /// Expense totals per category, in the order each category was first seen.
    pub expense_by_category: Vec<CategoryTotal>,
}

/// One slice of the expense breakdown.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: String,
    /// The category name, or the raw id when the category no longer exists.
    pub label: String,
    pub total: Decimal,
}

impl ProjectSummary {
    /// Returns `None` when a total does not fit in a `Decimal`.
    pub fn new(transactions: &[Transaction], categories: &[Category]) -> Option<Self> {
        let mut summary = ProjectSummary {
            transaction_count: transactions.len(),
            ..Default::default()
        };
        for t in transactions {
            let amount = t.amount.value();
            match t.transaction_type {
                TransactionType::Income => {
                    summary.total_income = summary.total_income.checked_add(amount)?
                }
                TransactionType::Expense => {
                    summary.total_expense = summary.total_expense.checked_add(amount)?;
                    match summary
                        .expense_by_category
                        .iter_mut()
                        .find(|slice| slice.category_id == t.category)
                    {
                        Some(slice) => slice.total = slice.total.checked_add(amount)?,
                        None => summary.expense_by_category.push(CategoryTotal {
                            category_id: t.category.clone(),
                            label: category_label(categories, &t.category).to_string(),
                            total: amount,
                        }),
                    }
                }
            }
        }
        summary.balance = summary.total_income.checked_sub(summary.total_expense)?;
        Some(summary)
    }

    /// The share of total expenses that `slice` represents, as a percentage.
    pub fn share(&self, slice: &CategoryTotal) -> Decimal {
        if self.total_expense.is_zero() {
            return Decimal::ZERO;
        }
        (slice.total / self.total_expense * Decimal::ONE_HUNDRED).round_dp(1)
    }
}
