//! The channel's "latest" manifest and its version-agreement invariant.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;

use super::channel::Channel;
use super::http::HttpProbe;
use super::{VerifyError, VerifyResult};

const MAX_ERROR_BODY_LEN: usize = 500;

/// Latest release info for one platform.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestEntry {
    #[serde(default)]
    pub version: Option<String>,
    /// Absolute download URL of the platform's primary artifact.
    #[serde(default)]
    pub url: Option<String>,
}

/// Platform key → entry, in the order the release service returned them.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Manifest {
    entries: IndexMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn from_json(body: &str) -> VerifyResult<Self> {
        serde_json::from_str(body)
            .map_err(|e| VerifyError::Transport(format!("Failed to parse manifest: {}", e)))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ManifestEntry)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, ManifestEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// URL of the release API's latest-manifest endpoint.
///
/// `host` may carry a `:port` suffix.
pub fn manifest_url(protocol: &str, host: &str, channel: Channel) -> String {
    format!("{}://{}/api/1/releases/{}/latest", protocol, host, channel)
}

/// Fetch the latest manifest for `channel`.
///
/// Any transport failure or non-200 status is an error; nothing downstream
/// runs without a trustworthy manifest.
pub fn fetch_latest_manifest<H: HttpProbe + ?Sized>(
    http: &H,
    host: &str,
    channel: Channel,
    protocol: &str,
    auth_token: &str,
) -> VerifyResult<Manifest> {
    let url = manifest_url(protocol, host, channel);
    debug!("fetching manifest from {}", url);

    let response = http.get(&url, Some(auth_token))?;
    if response.status != 200 {
        return Err(VerifyError::ManifestStatus {
            url,
            status: response.status,
            body: truncate(&response.body, MAX_ERROR_BODY_LEN),
        });
    }

    let manifest = Manifest::from_json(&response.body)?;
    debug!("manifest has {} entries", manifest.len());
    Ok(manifest)
}

/// Return the single version every entry agrees on.
///
/// Entries without a version take no part in the vote. Distinct versions are
/// reported sorted, each exactly once.
pub fn check_version_agreement(manifest: &Manifest) -> VerifyResult<String> {
    if manifest.is_empty() {
        return Err(VerifyError::EmptyManifest);
    }

    let mut versions = BTreeSet::new();
    for (platform, entry) in manifest.entries() {
        match entry.version.as_deref() {
            Some(version) => {
                versions.insert(version);
            }
            None => warn!("manifest entry {} has no version", platform),
        }
    }

    let mut versions = versions.into_iter();
    match (versions.next(), versions.next()) {
        (None, _) => Err(VerifyError::EmptyManifest),
        (Some(only), None) => Ok(only.to_string()),
        (Some(first), Some(second)) => {
            let versions = [first, second]
                .into_iter()
                .chain(versions)
                .map(str::to_string)
                .collect();
            Err(VerifyError::VersionMismatch { versions })
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..s.floor_char_boundary(max_len)])
    }
}
