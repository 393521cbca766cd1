use url::Url;

use crate::domain::value_objects::purchases::TicketPrice;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub telegram: Telegram,
    pub payment_api: PaymentApi,
    pub ticket: Ticket,
    pub database: Database,
    pub health_server: HealthServer,
}

#[derive(Debug, Clone)]
pub struct Telegram {
    pub bot_token: String,
    pub api_base_url: Url,
    pub poll_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct PaymentApi {
    pub base_url: Url,
    pub api_key: String,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Ticket {
    pub price: i64,
    pub currency: String,
}

impl Ticket {
    pub fn ticket_price(&self) -> TicketPrice {
        TicketPrice {
            amount: self.price,
            currency: self.currency.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pub sqlite_path: String,
}

#[derive(Debug, Clone)]
pub struct HealthServer {
    pub port: u16,
    pub timeout: u64,
}
