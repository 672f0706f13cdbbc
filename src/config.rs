use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl Config {
    /// Loads configuration from the YAML file named by `HERMOD_CONFIG`, or
    /// from the `HERMOD_LISTEN` address override, or falls back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var("HERMOD_CONFIG") {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("could not read config file {path}"))?;
            let cfg = serde_yaml::from_str(&raw)
                .with_context(|| format!("could not parse config file {path}"))?;
            return Ok(cfg);
        }

        if let Ok(listen_addr) = std::env::var("HERMOD_LISTEN") {
            return Ok(Self { listen_addr });
        }

        Ok(Self::default())
    }
}
