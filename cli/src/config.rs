//! Combined engine configuration.

use landed_fx::FxEngineConfig;
use landed_idempotency::IdempotencyConfig;
use landed_quote::QuoteConfig;

/// Configuration for every engine component the binary wires up.
#[derive(Debug, Clone, Default)]
pub struct LandedConfig {
    pub fx: FxEngineConfig,
    pub quote: QuoteConfig,
    pub idempotency: IdempotencyConfig,
}

impl LandedConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            fx: FxEngineConfig::from_env(),
            quote: QuoteConfig::from_env(),
            idempotency: IdempotencyConfig::from_env(),
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.fx.validate().map_err(|e| format!("fx: {}", e))?;
        self.quote.validate().map_err(|e| format!("quote: {}", e))?;
        self.idempotency
            .validate()
            .map_err(|e| format!("idempotency: {}", e))?;
        Ok(())
    }
}
