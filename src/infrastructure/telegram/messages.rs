use crate::{
    application::usecases::purchases::PurchaseError,
    domain::value_objects::purchases::{CheckPurchaseOutcome, InitiatePurchaseOutcome},
    infrastructure::telegram::bot_api::{InlineKeyboardButton, InlineKeyboardMarkup},
};

pub const BUY_TICKET: &str = "buy_ticket";
pub const CHECK_PAYMENT: &str = "check_payment";

pub const START_TEXT: &str = "Hi! I sell tickets for the lottery draw.\n\n\
1) Press \"Buy ticket\".\n\
2) Pay using the details I send you.\n\
3) Press \"Check payment\".\n\
Once the payment is confirmed you will get your number for the draw.";

const CREATION_FAILED_TEXT: &str = "Could not create the payment. Please try again later.";
const CHECK_FAILED_TEXT: &str = "Could not check the payment. Please try again later.";
const NO_PURCHASE_TEXT: &str = "You have no payments yet. Press \"Buy ticket\".";
const SERVICE_ERROR_TEXT: &str = "Something went wrong on our side. Please try again later.";

pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![InlineKeyboardButton {
                text: "🎟 Buy ticket".to_string(),
                callback_data: BUY_TICKET.to_string(),
            }],
            vec![InlineKeyboardButton {
                text: "✅ Check payment".to_string(),
                callback_data: CHECK_PAYMENT.to_string(),
            }],
        ],
    }
}

pub fn render_initiate_outcome(outcome: &InitiatePurchaseOutcome) -> String {
    let payment = match outcome {
        InitiatePurchaseOutcome::Created(payment) => payment,
        InitiatePurchaseOutcome::CreationFailed => return CREATION_FAILED_TEXT.to_string(),
    };

    let mut lines = vec![
        "Payment created.".to_string(),
        format!("Amount: {} {}", payment.amount, payment.currency),
        format!("Payment ID: {}", payment.payment_reference),
    ];
    if let Some(instructions) = &payment.instructions {
        lines.push(format!("Payment details: {instructions}"));
    }
    if let Some(payment_url) = &payment.payment_url {
        lines.push(format!("Payment link: {payment_url}"));
    }
    lines.push("\nAfter paying, press \"Check payment\".".to_string());

    lines.join("\n")
}

pub fn render_check_outcome(outcome: &CheckPurchaseOutcome) -> String {
    match outcome {
        CheckPurchaseOutcome::NoPurchaseYet => NO_PURCHASE_TEXT.to_string(),
        CheckPurchaseOutcome::NotYetPaid { status } => {
            format!("The payment is not confirmed yet (status: {status}).")
        }
        CheckPurchaseOutcome::CheckFailed => CHECK_FAILED_TEXT.to_string(),
        CheckPurchaseOutcome::Confirmed { ticket_number } => format!(
            "✅ Payment confirmed!\nYour number for the draw: #{ticket_number}\n\
             Keep this number until the results are announced."
        ),
    }
}

/// Store failures never reach the buyer verbatim.
pub fn render_purchase_error(_err: &PurchaseError) -> String {
    SERVICE_ERROR_TEXT.to_string()
}
