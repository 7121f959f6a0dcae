//! Summary and advisory command handlers.

use crate::args::{ProjectIdArgs, SuggestArgs};
use crate::commands::Out;
use crate::model::ProjectSummary;
use crate::{App, Result};

pub async fn summary(app: &App, args: &ProjectIdArgs) -> Result<Out<ProjectSummary>> {
    let summary = app.summary(args.project()).await?;
    let mut message = format!(
        "Income {:.2}, expenses {:.2}, balance {:.2} across {} transaction(s)",
        summary.total_income, summary.total_expense, summary.balance, summary.transaction_count
    );
    for slice in &summary.expense_by_category {
        message.push_str(&format!(
            "\n  {:<20} {:>12.2} {:>5.1}%",
            slice.label,
            slice.total,
            summary.share(slice)
        ));
    }
    Ok(Out::new(message, summary))
}

/// Advisory failures come back as the message text, never as an error.
pub async fn analyze(app: &App, args: &ProjectIdArgs) -> Result<Out<()>> {
    Ok(app.analyze(args.project()).await?.into())
}

pub async fn suggest(app: &App, args: &SuggestArgs) -> Result<Out<String>> {
    let id = app.suggest_category(args.title(), args.description()).await;
    Ok(Out::new(format!("Suggested category: {id}"), id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::{Advisor, UNAVAILABLE};
    use crate::model::TransactionType;
    use crate::test::TestEnv;
    use crate::NewTransaction;

    #[tokio::test]
    async fn test_summary_and_unconfigured_advice() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        app.set_advisor(Advisor::default());
        let project = app.create_project("Home", "", None).await.unwrap();
        for (title, amount, t, category) in [
            ("Salary", "1000", TransactionType::Income, "salary"),
            ("Rent", "600", TransactionType::Expense, "housing"),
            ("Pizza", "150", TransactionType::Expense, "food"),
        ] {
            let input = NewTransaction {
                title: title.to_string(),
                amount: amount.to_string(),
                transaction_type: t,
                category: Some(category.to_string()),
                ..Default::default()
            };
            app.add_transaction(&project.id, input).await.unwrap();
        }

        let args = ProjectIdArgs::new(&project.id);
        let out = summary(&app, &args).await.unwrap();
        assert!(out.message().starts_with("Income 1000.00, expenses 750.00, balance 250.00"));
        assert!(out.message().contains("80.0%"));
        assert_eq!(out.structure().unwrap().expense_by_category.len(), 2);

        let out = analyze(&app, &args).await.unwrap();
        assert_eq!(out.message(), UNAVAILABLE);

        let out = suggest(&app, &SuggestArgs::new("Netflix", "")).await.unwrap();
        assert_eq!(out.structure().map(String::as_str), Some("other"));
    }
}
