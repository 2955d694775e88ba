use clap::{Parser, ValueEnum};

use crate::config::{DEFAULT_BASE_LEGACY_URL, DEFAULT_BASE_URL};
use crate::release::channel::Channel;
use crate::release::http::DEFAULT_TIMEOUT_SECS;

fn parse_channel(s: &str) -> Result<Channel, String> {
    s.parse::<Channel>().map_err(|e| e.to_string())
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "release-verify",
    version = env!("RELEASE_VERIFY_VERSION"),
    about = "Verify that a published browser release is consistent and reachable on the CDN"
)]
pub struct Cli {
    /// Channel identifier {dev,beta,release,stable,nightly}
    #[arg(long, value_parser = parse_channel)]
    pub channel: Channel,

    /// Release API host
    #[arg(long)]
    pub host: String,

    /// Release API port (appended to the host)
    #[arg(long)]
    pub port: Option<u16>,

    /// Protocol used to reach the release API
    #[arg(long, value_enum, default_value = "https")]
    pub protocol: Protocol,

    /// Issue a warning (instead of failing) when a file does not exist
    #[arg(long)]
    pub warn: bool,

    /// Root of the multi-channel CDN release tree
    #[arg(long, env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Root of the legacy CDN release tree
    #[arg(long, env = "BASE_LEGACY_URL", default_value = DEFAULT_BASE_LEGACY_URL)]
    pub base_legacy_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output for debugging requests
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
