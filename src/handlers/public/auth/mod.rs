// handlers/public/auth/mod.rs - Token acquisition
//
// register: POST /register {username, password} -> {message}
// login:    POST /login    {username, password} -> {token}

pub mod login;
pub mod register;

pub use login::login;
pub use register::register;
