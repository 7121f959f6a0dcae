//! Types that represent the core data model, such as `Project`, `Transaction` and `Category`.
mod amount;
mod category;
mod project;
mod snapshot;
mod summary;
mod token;
mod transaction;

pub use amount::{Amount, AmountError};
pub use category::{category_id, category_label, default_categories, Category, OTHER_CATEGORY_ID};
pub use project::{Project, DEFAULT_CURRENCY};
pub use snapshot::{AppData, AppDataPatch};
pub use summary::{CategoryTotal, ProjectSummary};
pub use token::{Color, Hue, Icon};
pub use transaction::{Transaction, TransactionType};
