pub mod client;
pub mod messages;
pub mod models;

pub use client::{GOTO_API_BASE_URL, SmsClient};
pub use models::{SendResult, SmsRequest};
