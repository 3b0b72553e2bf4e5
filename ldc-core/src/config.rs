// config.rs - Configuration for ldc-core
use ldc_common::prelude::*;
use ldc_transaction::BlockContext;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Chain id every transaction must carry
    pub chain_id: u64,

    /// Base gas price in nano LDC per gas unit
    pub gas_price: u64,

    /// Stake symbol of the block producer receiving gas tips, e.g. "#MINER"
    pub miner: Option<String>,

    /// Receiver of base gas fees
    pub treasury: Address,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Pledge parameters
    pub fee: FeeConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            chain_id: 2357,
            gas_price: 1_000,
            miner: None,
            treasury: Address::ZERO,
            log_level: "info".to_string(),
            fee: FeeConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Loads a config file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let cfg: Self = match ext.as_deref() {
            Some("toml") => toml::from_str(&raw).map_err(|e| LedgerError::config(e.to_string()))?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&raw).map_err(|e| LedgerError::config(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&raw)?,
            _ => {
                return Err(LedgerError::config(format!(
                    "unsupported config format: {}",
                    path.display()
                )))
            }
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration
    pub fn validate(&self) -> LedgerResult<()> {
        if self.chain_id == 0 {
            return Err(LedgerError::config("chain_id must be greater than 0"));
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(LedgerError::config(format!(
                "invalid log_level {:?}, expected one of {:?}",
                self.log_level, LOG_LEVELS
            )));
        }
        self.miner_symbol()?;
        self.fee.validate()
    }

    pub fn miner_symbol(&self) -> LedgerResult<Option<StakeSymbol>> {
        self.miner
            .as_deref()
            .map(StakeSymbol::from_str)
            .transpose()
            .map_err(|e| LedgerError::config(format!("invalid miner: {}", e)))
    }

    /// Block context for applying transactions under this config.
    pub fn block_context(&self) -> LedgerResult<BlockContext> {
        let mut ctx = BlockContext::new(self.chain_id, self.gas_price).with_fee_config(self.fee.clone());
        ctx.treasury = self.treasury;
        if let Some(miner) = self.miner_symbol()? {
            ctx = ctx.with_miner(miner);
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_config(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            ".toml",
            r##"
chain_id = 7
gas_price = 500
miner = "#MINER"
log_level = "debug"

[fee]
min_stake_pledge = 1000
"##,
        );
        let cfg = LedgerConfig::load(file.path()).unwrap();
        assert_eq!(cfg.chain_id, 7);
        assert_eq!(cfg.gas_price, 500);
        assert_eq!(cfg.fee.min_stake_pledge, 1000);
        assert_eq!(cfg.fee.min_token_pledge, FeeConfig::default().min_token_pledge);

        let ctx = cfg.block_context().unwrap();
        assert_eq!(ctx.miner, Some(StakeSymbol::from_str("#MINER").unwrap()));
    }

    #[test]
    fn test_load_yaml_and_json() {
        let yaml = write_config(".yaml", "chain_id: 9\ntreasury: \"0x0101010101010101010101010101010101010101\"\n");
        let cfg = LedgerConfig::load(yaml.path()).unwrap();
        assert_eq!(cfg.chain_id, 9);
        assert_eq!(cfg.treasury, Address::new([1; 20]));

        let json = write_config(".json", r#"{"chain_id": 3, "log_level": "warn"}"#);
        let cfg = LedgerConfig::load(json.path()).unwrap();
        assert_eq!(cfg.chain_id, 3);
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn test_validation() {
        assert!(LedgerConfig::default().validate().is_ok());

        let cfg = LedgerConfig {
            chain_id: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = LedgerConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = LedgerConfig {
            miner: Some("MINER".to_string()),
            ..Default::default()
        };
        assert_eq!(cfg.validate().unwrap_err().kind(), ErrorKind::Invalid);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = write_config(".ini", "chain_id = 1");
        assert!(LedgerConfig::load(file.path()).is_err());
    }
}
