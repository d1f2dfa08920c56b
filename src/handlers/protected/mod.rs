// handlers/protected/mod.rs - Handlers behind `middleware::require_auth`
//
// Every handler takes the `Caller` extractor and scopes its work to that
// user's articles.

pub mod articles;

pub use articles::*;
