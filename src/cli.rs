//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::ConfigSources;

#[derive(Debug, Parser, Default)]
#[command(name = "address-ws")]
#[command(version, about = "Address web service", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML). Defaults to $ADDRESS_WS_CONFIG, then ./address-ws.toml
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Listen address, overrides server.bind_address
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Log level, overrides observability.log_level
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Override any setting, e.g. --set server.request_timeout_secs=5
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,
}

impl Cli {
    /// Collect configuration sources from these arguments and `env`.
    ///
    /// `--bind` and `--log-level` are applied after `--set`.
    pub fn config_sources<I>(&self, env: I) -> ConfigSources
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut overrides = self.properties.clone();
        if let Some(bind) = &self.bind {
            overrides.push(("server.bind_address".to_string(), bind.clone()));
        }
        if let Some(level) = &self.log_level {
            overrides.push(("observability.log_level".to_string(), level.clone()));
        }

        ConfigSources::discover(self.config.clone(), env).with_overrides(overrides)
    }
}

/// Process environment, skipping entries that are not valid UTF-8.
pub fn process_env() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os().filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}

fn parse_property(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments() {
        let cli = Cli::try_parse_from(["address-ws"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.properties.is_empty());
    }

    #[test]
    fn parses_repeated_set() {
        let cli = Cli::try_parse_from([
            "address-ws",
            "--set",
            "application.environment=prod",
            "--set",
            "server.max_body_bytes=10",
        ])
        .unwrap();
        assert_eq!(
            cli.properties,
            vec![
                ("application.environment".to_string(), "prod".to_string()),
                ("server.max_body_bytes".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_set_without_equals() {
        assert!(Cli::try_parse_from(["address-ws", "--set", "server.bind_address"]).is_err());
        assert!(Cli::try_parse_from(["address-ws", "--set", "=x"]).is_err());
    }

    #[test]
    fn dedicated_flags_win_over_set() {
        let cli = Cli::try_parse_from([
            "address-ws",
            "--set",
            "server.bind_address=127.0.0.1:1",
            "--bind",
            "127.0.0.1:2",
        ])
        .unwrap();
        let sources = cli.config_sources(Vec::new());
        assert_eq!(
            sources.overrides.last(),
            Some(&("server.bind_address".to_string(), "127.0.0.1:2".to_string()))
        );
    }

    #[test]
    fn explicit_config_is_required() {
        let cli = Cli::try_parse_from(["address-ws", "-c", "/etc/address-ws.toml"]).unwrap();
        let file = cli.config_sources(Vec::new()).file.unwrap();
        assert!(file.required);
        assert_eq!(file.path, PathBuf::from("/etc/address-ws.toml"));
    }
}
