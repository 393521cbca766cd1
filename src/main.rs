use anyhow::Result;
use lottery_bot::{
    application::usecases::purchases::PurchaseUseCase,
    config::config_loader,
    infrastructure::{
        axum_http::http_serve,
        payments::payment_api_client::PaymentApiClient,
        sqlite::{repositories::purchases::PurchaseSqlite, sqlite_connection},
        telegram::{bot_api::TelegramClient, handlers::BotHandler, polling},
    },
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Lottery bot exited with error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    lottery_bot::observability::init_observability("lottery-bot")?;

    let dotenvy_env = Arc::new(config_loader::load()?);
    info!("ENV has been loaded");

    let sqlite_pool = sqlite_connection::establish_connection(&dotenvy_env.database.sqlite_path)?;
    info!(path = %dotenvy_env.database.sqlite_path, "SQLite store is ready");

    let purchase_repository = Arc::new(PurchaseSqlite::new(Arc::new(sqlite_pool)));

    let payment_api = &dotenvy_env.payment_api;
    let payment_gateway = Arc::new(PaymentApiClient::new(
        payment_api.base_url.clone(),
        payment_api.api_key.clone(),
        Duration::from_secs(payment_api.timeout),
    )?);

    let purchase_usecase = Arc::new(PurchaseUseCase::new(
        purchase_repository,
        payment_gateway,
        dotenvy_env.ticket.ticket_price(),
    ));
    info!(
        price = dotenvy_env.ticket.price,
        currency = %dotenvy_env.ticket.currency,
        "Ticket price configured"
    );

    let telegram_config = &dotenvy_env.telegram;
    let telegram = Arc::new(TelegramClient::new(
        &telegram_config.api_base_url,
        &telegram_config.bot_token,
        Duration::from_secs(telegram_config.poll_timeout),
    )?);
    let bot_handler = Arc::new(BotHandler::new(purchase_usecase, Arc::clone(&telegram)));

    let polling_loop = tokio::spawn(polling::run_polling(
        telegram,
        bot_handler,
        telegram_config.poll_timeout,
    ));
    let health_server = tokio::spawn(http_serve::start(Arc::clone(&dotenvy_env)));

    tokio::select! {
        result = polling_loop => result??,
        result = health_server => result??,
    };
    Ok(())
}
