use crate::model::Amount;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a transaction adds to or subtracts from a project's balance.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

impl TransactionType {
    /// `+` for income and `-` for expenses.
    pub fn sign(&self) -> char {
        match self {
            TransactionType::Income => '+',
            TransactionType::Expense => '-',
        }
    }
}

/// A single income or expense entry within a project.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[schemars(with = "f64")]
    pub amount: Amount,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[schemars(with = "String")]
    pub date: NaiveDate,
    /// The id of a category. This may dangle if the category was deleted.
    pub category: String,
}

impl Transaction {
    /// The amount with its sign, e.g. `-12.50`.
    pub fn signed_amount(&self) -> String {
        format!("{}{}", self.transaction_type.sign(), self.amount)
    }
}
