pub mod payment_api_client;
