pub mod auth;
pub mod send;
