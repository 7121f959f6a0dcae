use crate::args::{AddTransactionArgs, IdArgs, ProjectIdArgs};
use crate::commands::Out;
use crate::model::{category_label, Transaction};
use crate::{App, Result};

pub async fn add_transaction(app: &mut App, args: &AddTransactionArgs) -> Result<Out<Transaction>> {
    let transaction = app
        .add_transaction(args.project(), args.new_transaction())
        .await?;
    let label = category_label(app.categories(), &transaction.category).to_string();
    Ok(Out::new(
        format!(
            "Added '{}' {} on {} in {label}",
            transaction.title,
            transaction.signed_amount(),
            transaction.date
        ),
        transaction,
    ))
}

/// Lists a project's transactions, newest first. Categories that no longer exist are shown by id.
pub async fn list_transactions(
    app: &mut App,
    args: &ProjectIdArgs,
) -> Result<Out<Vec<Transaction>>> {
    let view = app.select_project(args.project()).await?;
    let name = view.project.name.clone();
    let transactions = view.transactions.clone();
    if transactions.is_empty() {
        return Ok(Out::new(
            format!("'{name}' has no transactions yet"),
            transactions,
        ));
    }
    let lines = transactions
        .iter()
        .map(|t| {
            format!(
                "{}  {}  {:>12}  {} [{}]",
                t.date,
                t.id,
                t.signed_amount(),
                t.title,
                category_label(app.categories(), &t.category)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Out::new(
        format!("{} transaction(s) in '{name}':\n{lines}", transactions.len()),
        transactions,
    ))
}

pub async fn delete_transaction(app: &mut App, args: &IdArgs) -> Result<Out<Transaction>> {
    let removed = app.delete_transaction(args.id()).await?;
    Ok(Out::new(
        format!("Deleted '{}' ({})", removed.title, removed.signed_amount()),
        removed,
    ))
}
