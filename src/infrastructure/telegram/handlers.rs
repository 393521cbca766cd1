use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    application::usecases::purchases::{PurchaseError, PurchaseUseCase},
    domain::repositories::{payment_gateway::PaymentGateway, purchases::PurchaseRepository},
    infrastructure::telegram::{
        bot_api::{CallbackQuery, Message, TelegramClient, TelegramError, Update},
        messages::{self, BUY_TICKET, CHECK_PAYMENT},
    },
};

/// Where the answer to a callback goes: the menu message itself when Telegram still
/// shows it, otherwise a fresh message in the buyer's chat.
enum ReplyTarget {
    Edit { chat_id: i64, message_id: i64 },
    Send { chat_id: i64 },
}

/// Maps chat actions onto the purchase workflow and renders the results.
pub struct BotHandler<R, G>
where
    R: PurchaseRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    purchase_usecase: Arc<PurchaseUseCase<R, G>>,
    telegram: Arc<TelegramClient>,
}

impl<R, G> BotHandler<R, G>
where
    R: PurchaseRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(
        purchase_usecase: Arc<PurchaseUseCase<R, G>>,
        telegram: Arc<TelegramClient>,
    ) -> Self {
        Self {
            purchase_usecase,
            telegram,
        }
    }

    pub async fn handle_update(&self, update: Update) -> Result<(), TelegramError> {
        if let Some(query) = update.callback_query {
            return self.handle_callback(query).await;
        }
        if let Some(message) = update.message {
            return self.handle_message(message).await;
        }
        Ok(())
    }

    async fn handle_message(&self, message: Message) -> Result<(), TelegramError> {
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };

        // "/start", "/start@SomeBot" and "/start <payload>" all open the menu.
        let command = text.split_whitespace().next().unwrap_or_default();
        let command = command.split('@').next().unwrap_or_default();
        if command != "/start" {
            return Ok(());
        }

        info!(chat_id = message.chat.id, "telegram: start requested");
        let menu = messages::main_menu();
        self.telegram
            .send_message(message.chat.id, messages::START_TEXT, Some(&menu))
            .await
    }

    async fn handle_callback(&self, query: CallbackQuery) -> Result<(), TelegramError> {
        self.telegram.answer_callback_query(&query.id).await?;

        let buyer_id = query.from.id;
        let target = match &query.message {
            Some(message) => ReplyTarget::Edit {
                chat_id: message.chat.id,
                message_id: message.message_id,
            },
            None => ReplyTarget::Send { chat_id: buyer_id },
        };

        let text = match query.data.as_deref() {
            Some(BUY_TICKET) => {
                info!(buyer_id, "telegram: buy ticket pressed");
                self.purchase_usecase
                    .initiate_purchase(buyer_id, query.from.username.clone())
                    .await
                    .map(|outcome| messages::render_initiate_outcome(&outcome))
            }
            Some(CHECK_PAYMENT) => {
                info!(buyer_id, "telegram: check payment pressed");
                self.purchase_usecase
                    .check_and_confirm_purchase(buyer_id)
                    .await
                    .map(|outcome| messages::render_check_outcome(&outcome))
            }
            other => {
                warn!(buyer_id, data = ?other, "telegram: unknown callback ignored");
                return Ok(());
            }
        };

        let text = text.unwrap_or_else(|err| {
            match &err {
                PurchaseError::DuplicatePaymentReference(reference) => error!(
                    buyer_id,
                    payment_reference = %reference,
                    "telegram: provider reused a payment reference"
                ),
                PurchaseError::Storage(storage_error) => error!(
                    buyer_id,
                    db_error = ?storage_error,
                    "telegram: purchase store failed"
                ),
            }
            messages::render_purchase_error(&err)
        });

        self.reply(target, &text).await
    }

    async fn reply(&self, target: ReplyTarget, text: &str) -> Result<(), TelegramError> {
        let menu = messages::main_menu();
        match target {
            ReplyTarget::Edit {
                chat_id,
                message_id,
            } => {
                self.telegram
                    .edit_message_text(chat_id, message_id, text, Some(&menu))
                    .await
            }
            ReplyTarget::Send { chat_id } => {
                self.telegram
                    .send_message(chat_id, text, Some(&menu))
                    .await
            }
        }
    }
}
