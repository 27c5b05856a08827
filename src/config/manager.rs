use std::path::Path;

use ::config::{Config, Environment, File};
use tracing::{debug, info};

use super::runtime::SimulatorConfig;
use crate::error::ConfigError;

/// Layers built-in defaults, an optional TOML file and `BACCARAT__*`
/// environment variables into a validated `SimulatorConfig`.
pub struct ConfigLoader;

impl ConfigLoader {
    pub const ENV_PREFIX: &'static str = "BACCARAT";

    pub fn load(path: Option<&Path>) -> Result<SimulatorConfig, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder().add_source(Config::try_from(&SimulatorConfig::default())?);
        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(Self::ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: SimulatorConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(ConfigError::Invalid)?;
        debug!(
            decks = config.table.num_decks,
            arbiter = ?config.session.arbiter,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn render(config: &SimulatorConfig) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(config)?)
    }

    pub fn write_default(path: &Path) -> anyhow::Result<()> {
        let rendered = Self::render(&SimulatorConfig::default())?;
        std::fs::write(path, rendered)?;
        info!("Default configuration written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Arbiter, LadderProfile};
    use rust_decimal_macros::dec;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{}-{}.toml", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(config.table.num_decks, 8);
        assert_eq!(config.staking.initial_bankroll, dec!(5000));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = temp_path("baccarat-config");
        std::fs::write(
            &path,
            "[table]\nnum_decks = 6\n\n[staking]\nprofile = \"Short\"\n\n[session]\narbiter = \"consensus\"\n",
        )
        .unwrap();

        let config = ConfigLoader::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.table.num_decks, 6);
        assert_eq!(config.table.cut_card_depth, 14);
        assert_eq!(config.staking.profile, LadderProfile::Short);
        assert_eq!(config.session.arbiter, Arbiter::Consensus);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let path = temp_path("baccarat-invalid");
        std::fs::write(&path, "[tracker]\nwindow = 0\n").unwrap();
        let result = ConfigLoader::load(Some(&path));
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Invalid(errors)) if errors.len() == 1));
    }

    #[test]
    fn test_rendered_defaults_load_back() {
        let path = temp_path("baccarat-roundtrip");
        ConfigLoader::write_default(&path).unwrap();
        let config = ConfigLoader::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.staking.ladder().len(), 9);
        assert_eq!(config.guardian.weights.deviation, 50.0);
    }
}
