//! Command line and environment configuration

use std::{path::PathBuf, time::Duration};

use clap::{Args, ValueEnum};
use mealcart::{
    guard::GuardScope,
    pricing::{PricingError, parse_currency},
};
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::auth::BearerToken;

/// Configuration errors not caught by argument parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured currency is not supported.
    #[error(transparent)]
    Currency(#[from] PricingError),
}

/// Cart service connection settings.
#[derive(Debug, Args)]
pub struct ServiceConfig {
    /// Cart service base URL
    #[arg(long, env = "MEALCART_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Bearer token; cart edits are disabled without one
    #[arg(long, env = "MEALCART_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "MEALCART_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub timeout_seconds: u64,
}

impl ServiceConfig {
    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Bearer token, if a non-blank one is configured
    pub fn bearer_token(&self) -> Option<BearerToken> {
        self.token.as_deref().and_then(BearerToken::new)
    }
}

/// When mealkit edits ask for confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfirmationScope {
    /// Once per mealkit line
    Bundle,

    /// Once per session
    Session,
}

impl From<ConfirmationScope> for GuardScope {
    fn from(scope: ConfirmationScope) -> Self {
        match scope {
            ConfirmationScope::Bundle => Self::Bundle,
            ConfirmationScope::Session => Self::Session,
        }
    }
}

/// Cart settings.
#[derive(Debug, Args)]
pub struct CartConfig {
    /// ISO 4217 currency prices are expressed in
    #[arg(long, env = "MEALCART_CURRENCY", default_value = "USD")]
    pub currency: String,

    /// Confirmation scope for mealkit edits
    #[arg(
        long,
        env = "MEALCART_GUARD_SCOPE",
        value_enum,
        default_value_t = ConfirmationScope::Bundle
    )]
    pub guard_scope: ConfirmationScope,

    /// YAML catalog file
    #[arg(
        long,
        env = "MEALCART_CATALOG",
        default_value = "crates/core/fixtures/catalog/weeknight.yml"
    )]
    pub catalog: PathBuf,
}

impl CartConfig {
    /// Parsed currency
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Currency`] for unsupported currency codes.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        Ok(parse_currency(&self.currency)?)
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rusty_money::iso::EUR;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestConfig {
        #[command(flatten)]
        service: ServiceConfig,

        #[command(flatten)]
        cart: CartConfig,

        #[command(flatten)]
        logging: LoggingConfig,
    }

    #[test]
    fn flags_override_defaults() -> TestResult {
        let config = TestConfig::try_parse_from([
            "mealcart",
            "--api-url",
            "https://shop.test/api",
            "--token",
            "abc",
            "--timeout-seconds",
            "3",
            "--currency",
            "eur",
            "--guard-scope",
            "session",
            "--log-format",
            "json",
        ])?;

        assert_eq!(config.service.api_url, "https://shop.test/api");
        assert_eq!(config.service.timeout(), Duration::from_secs(3));
        assert_eq!(
            config.service.bearer_token().as_ref().map(BearerToken::expose),
            Some("abc")
        );
        assert_eq!(config.cart.currency()?, EUR);
        assert_eq!(GuardScope::from(config.cart.guard_scope), GuardScope::Session);
        assert_eq!(config.logging.log_format, LogFormat::Json);

        Ok(())
    }

    #[test]
    fn blank_token_disables_edits() -> TestResult {
        let config = TestConfig::try_parse_from(["mealcart", "--token", " "])?;

        assert!(config.service.bearer_token().is_none());

        Ok(())
    }

    #[test]
    fn unknown_currency_is_rejected() -> TestResult {
        let config = TestConfig::try_parse_from(["mealcart", "--currency", "XYZ"])?;

        assert!(matches!(
            config.cart.currency(),
            Err(ConfigError::Currency(PricingError::UnknownCurrency(_)))
        ));

        Ok(())
    }

    #[test]
    fn unknown_guard_scope_fails_to_parse() {
        assert!(TestConfig::try_parse_from(["mealcart", "--guard-scope", "never"]).is_err());
    }
}
