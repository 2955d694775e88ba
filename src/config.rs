//! Immutable run configuration.
//!
//! Built once from the command line and environment, then passed to every
//! stage of verification.

use std::time::Duration;

use anyhow::{Result, bail};

use crate::cli::args::Cli;
use crate::release::channel::Channel;
use crate::release::plan::CdnLayout;

pub const DEFAULT_BASE_URL: &str = "https://brave-download.global.ssl.fastly.net/multi-channel/releases";
pub const DEFAULT_BASE_LEGACY_URL: &str = "https://brave-download.global.ssl.fastly.net/releases";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyConfig {
    pub channel: Channel,
    /// Release API authority, `host` or `host:port`.
    pub host: String,
    pub protocol: String,
    pub warn: bool,
    pub auth_token: String,
    pub base_url: String,
    pub base_legacy_url: String,
    pub timeout: Duration,
}

impl VerifyConfig {
    pub fn from_cli(cli: &Cli, auth_token: String) -> Result<Self> {
        let host = cli.host.trim();
        if host.is_empty() {
            bail!("--host must not be empty");
        }
        let host = match cli.port {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            channel: cli.channel,
            host,
            protocol: cli.protocol.as_str().to_string(),
            warn: cli.warn,
            auth_token,
            base_url: trim_base(&cli.base_url),
            base_legacy_url: trim_base(&cli.base_legacy_url),
            timeout: Duration::from_secs(cli.timeout),
        })
    }

    pub fn cdn(&self) -> CdnLayout {
        CdnLayout {
            base_url: self.base_url.clone(),
            base_legacy_url: self.base_legacy_url.clone(),
            channel: self.channel,
        }
    }
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("release-verify").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_port_is_appended_to_host() {
        let cli = parse(&["--channel", "dev", "--host", "updates.example.com", "--port", "8443"]);
        let cfg = VerifyConfig::from_cli(&cli, String::new()).unwrap();
        assert_eq!(cfg.host, "updates.example.com:8443");
        assert_eq!(cfg.protocol, "https");
        assert!(!cfg.warn);
    }

    #[test]
    fn test_base_urls_lose_trailing_slash() {
        let cli = parse(&[
            "--channel",
            "beta",
            "--host",
            "h",
            "--base-url",
            "http://127.0.0.1:9000/multi/",
            "--base-legacy-url",
            "http://127.0.0.1:9000/legacy//",
        ]);
        let cdn = VerifyConfig::from_cli(&cli, String::new()).unwrap().cdn();
        assert_eq!(cdn.base_url, "http://127.0.0.1:9000/multi");
        assert_eq!(cdn.base_legacy_url, "http://127.0.0.1:9000/legacy");
        assert_eq!(cdn.channel, Channel::Beta);
    }

    #[test]
    fn test_blank_host_is_rejected() {
        let cli = parse(&["--channel", "dev", "--host", "  "]);
        assert!(VerifyConfig::from_cli(&cli, String::new()).is_err());
    }

    #[test]
    fn test_timeout_and_token_carried_through() {
        let cli = parse(&["--channel", "dev", "--host", "h", "--timeout", "5", "--warn"]);
        let cfg = VerifyConfig::from_cli(&cli, "tok".to_string()).unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.auth_token, "tok");
        assert!(cfg.warn);
    }
}
