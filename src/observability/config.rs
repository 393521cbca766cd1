use std::env;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

#[derive(Clone, Debug)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Clone, Debug)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) log_filter: String,
    /// Warnings captured during config parsing so they can be logged after tracing is initialized.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(component: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let component = component.trim().to_string();

        let service_name = var("SERVICE_NAME").unwrap_or_else(|| component.clone());
        let environment = var("STAGE").unwrap_or_else(|| "unknown".to_string());

        let mut warnings = Vec::new();
        let log_filter = match var("RUST_LOG") {
            Some(raw) if EnvFilter::try_new(&raw).is_ok() => raw,
            Some(raw) => {
                warnings.push(format!(
                    "RUST_LOG is invalid (value: {raw}); defaulting to {DEFAULT_FILTER}"
                ));
                DEFAULT_FILTER.to_string()
            }
            None => DEFAULT_FILTER.to_string(),
        };

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
            log_filter,
            warnings,
        }
    }
}
