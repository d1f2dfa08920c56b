// handlers/mod.rs - Two-tier handler layout
//
// public:    no authentication (/, /health, /register, /login)
// protected: bearer token required; every handler receives the `Caller`
//            injected by `middleware::require_auth`
pub mod protected;
pub mod public;
