pub mod axum_http;
pub mod payments;
pub mod sqlite;
pub mod telegram;
