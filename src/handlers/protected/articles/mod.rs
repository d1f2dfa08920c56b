pub mod collection;
pub mod record;

pub use collection::{article_create, article_list};
pub use record::{article_delete, article_get, article_patch, article_put};
