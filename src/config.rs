//! Configuration management for the frontrunner bot
//!
//! Loads configuration from a TOML file with environment variable substitution.

use anyhow::{Context, Result};
use ethers::abi::Abi;
use ethers::signers::LocalWallet;
use ethers::types::Address;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_settings: ApiSettings,
    pub eoa: EoaConfig,
    pub game_settings: GameSettings,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub rpc_url: String,
    #[serde(default)]
    pub fallback_rpc_urls: Vec<String>,
    pub chain_id: Option<u64>,
}

#[derive(Clone, Deserialize)]
pub struct EoaConfig {
    pub private_key: String,
}

impl std::fmt::Debug for EoaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EoaConfig")
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameSettings {
    pub frontrunner_contract_address: String,
    pub abi_string: String,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "default_automatic_attempts")]
    pub automatic_attempts: u64,
    #[serde(default = "default_interval_secs")]
    pub default_interval_secs: f64,
    #[serde(default = "default_balance_threshold")]
    pub balance_threshold: f64,
    #[serde(default = "default_confirmations")]
    pub confirmations: usize,
    pub confirmation_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9100,
        }
    }
}

/// Largest threshold (in ether) that converts to wei without overflow
const MAX_BALANCE_THRESHOLD: f64 = 1e18;

fn default_gas_limit() -> u64 {
    200_000
}

fn default_automatic_attempts() -> u64 {
    10_000_000
}

fn default_interval_secs() -> f64 {
    1.0
}

fn default_balance_threshold() -> f64 {
    0.001
}

fn default_confirmations() -> usize {
    1
}

impl Settings {
    /// Load settings from the configured file
    pub fn load() -> Result<Self> {
        let config_path = env::var("FRONTRUNNER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("settings.toml"));

        Self::load_from(&config_path)
    }

    /// Load settings from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml(&config_str)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_settings.rpc_url.trim().is_empty() {
            anyhow::bail!("api_settings.rpc_url must not be empty");
        }

        self.wallet()?;
        self.contract_address()?;

        let abi = self.contract_abi()?;
        for name in ["frontrun", "getScore"] {
            if abi.function(name).is_err() {
                anyhow::bail!("Contract ABI has no `{}` function", name);
            }
        }

        let game = &self.game_settings;
        if game.gas_limit == 0 {
            anyhow::bail!("game_settings.gas_limit must be positive");
        }
        if game.automatic_attempts == 0 {
            anyhow::bail!("game_settings.automatic_attempts must be positive");
        }
        crate::sequencer::interval_from_secs(game.default_interval_secs)
            .with_context(|| "Invalid game_settings.default_interval_secs")?;
        if game.confirmations == 0 {
            anyhow::bail!("game_settings.confirmations must be at least 1");
        }
        if !(0.0..=MAX_BALANCE_THRESHOLD).contains(&game.balance_threshold) {
            anyhow::bail!(
                "game_settings.balance_threshold must be between 0 and {}",
                MAX_BALANCE_THRESHOLD
            );
        }
        ethers::utils::parse_ether(game.balance_threshold).with_context(|| {
            format!(
                "game_settings.balance_threshold {} is not a valid ether amount",
                game.balance_threshold
            )
        })?;

        Ok(())
    }

    /// All RPC URLs in failover order
    pub fn rpc_urls(&self) -> Vec<String> {
        std::iter::once(self.api_settings.rpc_url.clone())
            .chain(self.api_settings.fallback_rpc_urls.iter().cloned())
            .filter(|url| !url.trim().is_empty())
            .collect()
    }

    /// Signing wallet from the configured private key
    pub fn wallet(&self) -> Result<LocalWallet> {
        self.eoa
            .private_key
            .trim()
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map_err(|e| anyhow::anyhow!("Invalid private key: {}", e))
    }

    /// Frontrunner contract address
    pub fn contract_address(&self) -> Result<Address> {
        self.game_settings
            .frontrunner_contract_address
            .trim()
            .parse::<Address>()
            .with_context(|| {
                format!(
                    "Invalid contract address: {}",
                    self.game_settings.frontrunner_contract_address
                )
            })
    }

    /// Contract ABI parsed from the JSON string
    pub fn contract_abi(&self) -> Result<Abi> {
        serde_json::from_str(&self.game_settings.abi_string)
            .with_context(|| "Failed to parse game_settings.abi_string")
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    lazy_static::lazy_static! {
        static ref ENV_VAR: regex::Regex =
            regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern");
    }

    let mut result = input.to_string();
    for cap in ENV_VAR.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const TEST_ABI: &str = r#"[{"inputs":[],"name":"frontrun","outputs":[],"stateMutability":"nonpayable","type":"function"},{"inputs":[{"internalType":"address","name":"player","type":"address"}],"name":"getScore","outputs":[{"internalType":"uint256","name":"","type":"uint256"},{"internalType":"uint256","name":"","type":"uint256"},{"internalType":"uint256","name":"","type":"uint256"}],"stateMutability":"view","type":"function"}]"#;

    // Well-known anvil development key
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    pub(crate) fn sample_toml(extra_game: &str) -> String {
        format!(
            r#"
[api_settings]
rpc_url = "https://testnet-rpc.monad.xyz"

[eoa]
private_key = "{key}"

[game_settings]
frontrunner_contract_address = "0x9EaBA701a49adE7525dFfE338f0C7E06Eca7Cf07"
abi_string = '{abi}'
{extra_game}
"#,
            key = TEST_KEY,
            abi = TEST_ABI,
            extra_game = extra_game,
        )
    }

    #[test]
    fn test_env_var_substitution() {
        env::set_var("FRONTRUNNER_TEST_VAR", "test_value");
        let input = "url = \"https://rpc.example.com/${FRONTRUNNER_TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://rpc.example.com/test_value/endpoint\"");
    }

    #[test]
    fn test_defaults_applied() {
        let settings = Settings::from_toml(&sample_toml("")).unwrap();
        assert_eq!(settings.game_settings.gas_limit, 200_000);
        assert_eq!(settings.game_settings.automatic_attempts, 10_000_000);
        assert_eq!(settings.game_settings.default_interval_secs, 1.0);
        assert_eq!(settings.game_settings.confirmations, 1);
        assert!(settings.game_settings.confirmation_timeout_secs.is_none());
        assert!(!settings.metrics.enabled);
        assert_eq!(settings.rpc_urls(), vec!["https://testnet-rpc.monad.xyz"]);
    }

    #[test]
    fn test_private_key_from_env() {
        env::set_var("FRONTRUNNER_TEST_KEY", TEST_KEY);
        let toml_str =
            sample_toml("").replace(TEST_KEY, "${FRONTRUNNER_TEST_KEY}");
        let settings = Settings::from_toml(&toml_str).unwrap();
        assert!(settings.wallet().is_ok());
        assert!(!format!("{:?}", settings.eoa).contains("ac0974"));
    }

    #[test]
    fn test_rejects_zero_gas_limit() {
        let err = Settings::from_toml(&sample_toml("gas_limit = 0")).unwrap_err();
        assert!(err.to_string().contains("gas_limit"));
    }

    #[test]
    fn test_rejects_non_positive_interval() {
        assert!(Settings::from_toml(&sample_toml("default_interval_secs = 0.0")).is_err());
        assert!(Settings::from_toml(&sample_toml("default_interval_secs = -1.5")).is_err());
    }

    #[test]
    fn test_rejects_interval_beyond_timer_range() {
        let err = Settings::from_toml(&sample_toml("default_interval_secs = 1e20")).unwrap_err();
        assert!(err.to_string().contains("default_interval_secs"));
    }

    #[test]
    fn test_rejects_out_of_range_balance_threshold() {
        for bad in ["balance_threshold = 1e100", "balance_threshold = -0.1", "balance_threshold = nan"] {
            let err = Settings::from_toml(&sample_toml(bad)).unwrap_err();
            assert!(err.to_string().contains("balance_threshold"));
        }
        // Extra decimals are truncated to whole wei
        assert!(Settings::from_toml(&sample_toml("balance_threshold = 1e-30")).is_ok());
        assert!(Settings::from_toml(&sample_toml("balance_threshold = 0.5")).is_ok());
    }

    #[test]
    fn test_rejects_abi_without_frontrun() {
        let toml_str = sample_toml("").replace("\"name\":\"frontrun\"", "\"name\":\"play\"");
        let err = Settings::from_toml(&toml_str).unwrap_err();
        assert!(err.to_string().contains("frontrun"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_toml("automatic_attempts = 50").as_bytes())
            .unwrap();

        let settings = tokio_test::assert_ok!(Settings::load_from(file.path()));
        assert_eq!(settings.game_settings.automatic_attempts, 50);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Settings::load_from(&dir.path().join("missing.toml"));
        tokio_test::assert_err!(result);
    }
}
