//! Server Configuration

use anyhow::Context;
use consolidation_advisor::ChartFormat;

/// Settings read from the environment (and `.env`)
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,

    /// Encoding of returned charts
    pub chart_format: ChartFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            chart_format: ChartFormat::Png,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = lookup("BIND_ADDR").unwrap_or(defaults.bind_addr);
        let chart_format = match lookup("CHART_FORMAT") {
            Some(value) => value
                .parse()
                .with_context(|| format!("CHART_FORMAT={value} is not usable"))?,
            None => defaults.chart_format,
        };

        Ok(Self {
            bind_addr,
            chart_format,
        })
    }
}
