use std::fmt;
use std::str::FromStr;

use super::VerifyError;

/// A release track with its own independent "latest" version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Dev,
    Beta,
    Release,
    Stable,
    Nightly,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Dev,
        Channel::Beta,
        Channel::Release,
        Channel::Stable,
        Channel::Nightly,
    ];

    /// Identifier used in API and CDN paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Dev => "dev",
            Channel::Beta => "beta",
            Channel::Release => "release",
            Channel::Stable => "stable",
            Channel::Nightly => "nightly",
        }
    }

    fn known() -> String {
        Self::ALL
            .iter()
            .map(Channel::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| VerifyError::UnknownChannel {
                name: s.to_string(),
                expected: Self::known(),
            })
    }
}
