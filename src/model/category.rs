use crate::model::{Color, Hue, Icon};
use serde::{Deserialize, Serialize};

/// The id of the catch-all category. Suggestions fall back to it.
pub const OTHER_CATEGORY_ID: &str = "other";

/// A user-defined or built-in category that transactions reference by `id`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: Color,
    pub icon_name: Icon,
    /// Built-in categories cannot be deleted.
    #[serde(default)]
    pub is_default: bool,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: Color, icon: Icon) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color,
            icon_name: icon,
            is_default: false,
        }
    }

    fn seed(id: &str, name: &str, icon: Icon, color: Color) -> Self {
        Self {
            is_default: true,
            ..Self::new(id, name, color, icon)
        }
    }
}

/// The built-in categories present in a store that has never saved its own set.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::seed("salary", "Salary/Wages", Icon::Briefcase, Color::new(Hue::Green)),
        Category::seed("freelance", "Freelance", Icon::Zap, Color::new(Hue::Blue)),
        Category::seed("housing", "Housing", Icon::Home, Color::new(Hue::Orange)),
        Category::seed("transport", "Transport", Icon::Car, Color::new(Hue::Indigo)),
        Category::seed(
            "food",
            "Food & Dining",
            Icon::Coffee,
            Color::with_shade(Hue::Amber, 700),
        ),
        Category::seed("shopping", "Shopping", Icon::Shopping, Color::new(Hue::Pink)),
        Category::seed(
            "entertainment",
            "Entertainment",
            Icon::Film,
            Color::new(Hue::Purple),
        ),
        Category::seed("health", "Health", Icon::Heart, Color::new(Hue::Red)),
        Category::seed(OTHER_CATEGORY_ID, "Other", Icon::More, Color::new(Hue::Gray)),
    ]
}

/// Builds the id for a user-created category: the name lowercased with every character outside
/// `[a-z0-9]` replaced by `_`, then `_` and a four digit suffix. The suffix starts from `seed`
/// (normally the tail of the millisecond clock) and is advanced until the id is not in `taken`.
pub fn category_id<'a>(
    name: &str,
    seed: u64,
    taken: impl IntoIterator<Item = &'a str> + Clone,
) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mut suffix = seed % 10_000;
    loop {
        let id = format!("{slug}_{suffix:04}");
        if !taken.clone().into_iter().any(|t| t == id) {
            return id;
        }
        suffix = (suffix + 1) % 10_000;
    }
}

/// The label to show for a category id: the category name, or the raw id when the category no
/// longer exists.
pub fn category_label<'a>(categories: &'a [Category], id: &'a str) -> &'a str {
    categories
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.as_str())
        .unwrap_or(id)
}
