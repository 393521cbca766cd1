pub mod bot_api;
pub mod handlers;
pub mod messages;
pub mod polling;
