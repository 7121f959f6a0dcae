//! Generated insights and category suggestions. The advisor never fails: when the text generator
//! is missing or errors, callers get a fixed fallback message or the catch-all category.

mod gemini;

use crate::error::Res;
use crate::model::{Category, Project, Transaction, OTHER_CATEGORY_ID};
use async_trait::async_trait;
use tracing::{debug, warn};

pub(crate) use gemini::Gemini;

pub(crate) const UNAVAILABLE: &str =
    "AI services are currently unavailable. Please check your API configuration.";
pub(crate) const NOT_ENOUGH_DATA: &str =
    "Not enough data to analyze yet. Add some transactions to get AI insights!";
pub(crate) const NO_INSIGHTS: &str = "Could not generate insights at this time.";
pub(crate) const FAILED: &str =
    "An error occurred while generating AI insights. Please try again later.";

/// A backend that turns a prompt into text.
#[async_trait]
pub(crate) trait TextGenerator {
    /// Returns the generated text. `thinking` allows the model to spend tokens reasoning before it
    /// answers.
    async fn generate(&self, prompt: &str, thinking: bool) -> Res<String>;
}

pub(crate) type Generator = Box<dyn TextGenerator + Send + Sync>;

#[derive(Default)]
pub(crate) struct Advisor {
    generator: Option<Generator>,
}

impl Advisor {
    pub(crate) fn new(generator: Option<Generator>) -> Self {
        Self { generator }
    }

    pub(crate) fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// A short Markdown analysis of the project's transactions.
    pub(crate) async fn analyze(&self, project: &Project, transactions: &[Transaction]) -> String {
        let Some(generator) = &self.generator else {
            return UNAVAILABLE.to_string();
        };
        if transactions.is_empty() {
            return NOT_ENOUGH_DATA.to_string();
        }
        match generator.generate(&analysis_prompt(project, transactions), false).await {
            Ok(text) if text.trim().is_empty() => NO_INSIGHTS.to_string(),
            Ok(text) => text,
            Err(e) => {
                warn!("Unable to generate insights: {e:#}");
                FAILED.to_string()
            }
        }
    }

    /// The id of the category that best fits the transaction, or `other`.
    pub(crate) async fn suggest_category(
        &self,
        title: &str,
        description: &str,
        categories: &[Category],
    ) -> String {
        let Some(generator) = &self.generator else {
            return OTHER_CATEGORY_ID.to_string();
        };
        let answer = match generator
            .generate(&category_prompt(title, description, categories), true)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Unable to suggest a category: {e:#}");
                return OTHER_CATEGORY_ID.to_string();
            }
        };
        let id = answer
            .trim()
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .trim()
            .to_lowercase();
        if categories.iter().any(|c| c.id == id) {
            id
        } else {
            debug!("Suggested category '{id}' is not a known id");
            OTHER_CATEGORY_ID.to_string()
        }
    }
}

fn analysis_prompt(project: &Project, transactions: &[Transaction]) -> String {
    let summary = transactions
        .iter()
        .map(|t| {
            format!(
                "- {}: {} ({}) - {}{}",
                t.date,
                t.title,
                t.category,
                t.transaction_type.sign(),
                t.amount.plain()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Analyze the financial health of the project \"{name}\".\n\
        Here are the recent transactions:\n\
        {summary}\n\
        \n\
        Please provide:\n\
        1. A brief summary of spending vs income.\n\
        2. Identify any concerning trends or high expense categories.\n\
        3. One actionable tip to improve the project's budget.\n\
        \n\
        Keep the response concise, encouraging, and formatted in Markdown.\n\
        Do not use complex jargon.\n",
        name = project.name
    )
}

fn category_prompt(title: &str, description: &str, categories: &[Category]) -> String {
    let list = categories
        .iter()
        .map(|c| format!("{} ({})", c.id, c.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Given a transaction with title \"{title}\" and description \"{description}\",\n\
        categorize it into one of the following exact IDs:\n\
        [{list}].\n\
        \n\
        Return ONLY the ID string (e.g., 'food' or 'custom_123').\n"
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{default_categories, Amount, TransactionType};
    use anyhow::bail;
    use chrono::NaiveDate;
    use std::str::FromStr;
    use std::sync::{Arc, Mutex};

    /// A `TextGenerator` that returns a canned answer and records the prompts it was given.
    #[derive(Clone, Default)]
    pub(crate) struct Scripted {
        answer: Option<String>,
        pub(crate) prompts: Arc<Mutex<Vec<(String, bool)>>>,
    }

    impl Scripted {
        pub(crate) fn answering(answer: &str) -> Self {
            Self {
                answer: Some(answer.to_string()),
                ..Default::default()
            }
        }

        pub(crate) fn failing() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str, thinking: bool) -> Res<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), thinking));
            match &self.answer {
                Some(answer) => Ok(answer.clone()),
                None => bail!("backend unavailable"),
            }
        }
    }

    fn advisor(generator: Scripted) -> Advisor {
        Advisor::new(Some(Box::new(generator)))
    }

    fn transactions() -> Vec<Transaction> {
        vec![Transaction {
            id: "t1".to_string(),
            project_id: "p1".to_string(),
            title: "Rent".to_string(),
            description: String::new(),
            amount: Amount::from_str("1200.5").unwrap(),
            transaction_type: TransactionType::Expense,
            date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            category: "housing".to_string(),
        }]
    }

    #[tokio::test]
    async fn test_analyze_unconfigured() {
        let project = Project::new("Home", "", None);
        let text = Advisor::default().analyze(&project, &transactions()).await;
        assert_eq!(text, UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_analyze_without_transactions() {
        let generator = Scripted::answering("unused");
        let prompts = generator.prompts.clone();
        let project = Project::new("Home", "", None);
        assert_eq!(advisor(generator).analyze(&project, &[]).await, NOT_ENOUGH_DATA);
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_prompt_and_answer() {
        let generator = Scripted::answering("## Looking good");
        let prompts = generator.prompts.clone();
        let project = Project::new("Home", "", None);
        let text = advisor(generator).analyze(&project, &transactions()).await;
        assert_eq!(text, "## Looking good");

        let prompts = prompts.lock().unwrap();
        let (prompt, thinking) = &prompts[0];
        assert!(!thinking);
        assert!(prompt.contains("project \"Home\""));
        assert!(prompt.contains("- 2025-04-01: Rent (housing) - -1200.5"));
    }

    #[tokio::test]
    async fn test_analyze_empty_and_failed_answers() {
        let project = Project::new("Home", "", None);
        let text = advisor(Scripted::answering("  "))
            .analyze(&project, &transactions())
            .await;
        assert_eq!(text, NO_INSIGHTS);
        let text = advisor(Scripted::failing())
            .analyze(&project, &transactions())
            .await;
        assert_eq!(text, FAILED);
    }

    #[tokio::test]
    async fn test_suggest_category_normalizes_answer() {
        let categories = default_categories();
        let id = advisor(Scripted::answering(" 'Entertainment'\n"))
            .suggest_category("Netflix", "", &categories)
            .await;
        assert_eq!(id, "entertainment");
    }

    #[tokio::test]
    async fn test_suggest_category_unknown_id_is_other() {
        let generator = Scripted::answering("streaming");
        let prompts = generator.prompts.clone();
        let categories = default_categories();
        let id = advisor(generator)
            .suggest_category("Netflix", "", &categories)
            .await;
        assert_eq!(id, "other");
        assert!(prompts.lock().unwrap()[0].0.contains("food (Food & Dining)"));
    }

    #[tokio::test]
    async fn test_suggest_category_fallbacks() {
        let categories = default_categories();
        let id = Advisor::default()
            .suggest_category("Netflix", "", &categories)
            .await;
        assert_eq!(id, "other");
        let id = advisor(Scripted::failing())
            .suggest_category("Netflix", "", &categories)
            .await;
        assert_eq!(id, "other");
    }
}
