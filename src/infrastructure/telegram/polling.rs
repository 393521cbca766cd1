use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tracing::{error, info};

use crate::{
    domain::repositories::{payment_gateway::PaymentGateway, purchases::PurchaseRepository},
    infrastructure::telegram::{
        bot_api::{TelegramClient, Update},
        handlers::BotHandler,
    },
};

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-polls Telegram for updates and hands each one to its own task, so one buyer's
/// slow payment call never holds up another buyer.
pub async fn run_polling<R, G>(
    telegram: Arc<TelegramClient>,
    handler: Arc<BotHandler<R, G>>,
    poll_timeout_secs: u64,
) -> Result<()>
where
    R: PurchaseRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    info!("Telegram polling started");
    let mut offset: Option<i64> = None;

    loop {
        let updates = match telegram.get_updates(offset, poll_timeout_secs).await {
            Ok(updates) => updates,
            Err(e) => {
                error!("Error while polling Telegram updates: {}", e);
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        offset = next_offset(offset, &updates);

        for update in updates {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let update_id = update.update_id;
                if let Err(e) = handler.handle_update(update).await {
                    error!(update_id, "Failed to handle Telegram update: {}", e);
                }
            });
        }
    }
}

/// Telegram expects the id after the last seen update to acknowledge everything before it.
fn next_offset(current: Option<i64>, updates: &[Update]) -> Option<i64> {
    updates
        .iter()
        .map(|update| update.update_id + 1)
        .max()
        .max(current)
}
