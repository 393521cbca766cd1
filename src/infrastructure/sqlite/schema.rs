diesel::table! {
    purchases (id) {
        id -> Integer,
        buyer_id -> BigInt,
        buyer_name -> Text,
        payment_reference -> Text,
        amount -> BigInt,
        status -> Text,
        ticket_number -> Nullable<BigInt>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}
