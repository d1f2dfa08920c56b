pub mod auth;
pub mod extract;
pub mod response;

pub use auth::require_auth;
pub use extract::{ArticleId, JsonBody};
pub use response::{ApiResult, Message, TokenResponse};
