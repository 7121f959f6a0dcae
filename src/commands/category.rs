use crate::args::{AddCategoryArgs, IdArgs, ReplaceCategoriesArgs, ReplaceCategoriesFileArgs};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::Category;
use crate::{utils, App, Result};
use anyhow::Context;

pub async fn list_categories(app: &App) -> Result<Out<Vec<Category>>> {
    let categories = app.categories().to_vec();
    let lines = categories
        .iter()
        .map(|c| {
            let custom = if c.is_default { "" } else { " (custom)" };
            format!("{} {:<16} {}{custom}", c.icon_name.glyph(), c.id, c.name)
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Out::new(
        format!("{} categories:\n{lines}", categories.len()),
        categories,
    ))
}

pub async fn add_category(app: &mut App, args: &AddCategoryArgs) -> Result<Out<Category>> {
    let category = app
        .add_category(args.name(), args.color(), args.icon())
        .await?;
    Ok(Out::new(
        format!("Added category '{}' with id {}", category.name, category.id),
        category,
    ))
}

/// Built-in categories are refused. Transactions keep the deleted id as their category.
pub async fn delete_category(app: &mut App, args: &IdArgs) -> Result<Out<Category>> {
    let category = app.delete_category(args.id()).await?;
    Ok(Out::new(
        format!("Deleted category '{}'", category.name),
        category,
    ))
}

pub async fn replace_categories(
    app: &mut App,
    args: &ReplaceCategoriesArgs,
) -> Result<Out<Vec<Category>>> {
    app.replace_categories(args.categories().to_vec()).await?;
    let categories = app.categories().to_vec();
    Ok(Out::new(
        format!("Replaced the category set with {} categories", categories.len()),
        categories,
    ))
}

pub async fn replace_categories_from_file(
    app: &mut App,
    args: &ReplaceCategoriesFileArgs,
) -> Result<Out<Vec<Category>>> {
    let categories: Vec<Category> = utils::deserialize(args.file())
        .await
        .with_context(|| format!("Unable to read categories from {}", args.file().display()))
        .pub_result(ErrorType::Request)?;
    replace_categories(app, &ReplaceCategoriesArgs::new(categories)).await
}
