//! Expansion of an agreed release version into the ordered list of CDN checks.

use url::Url;

use super::channel::Channel;
use super::manifest::Manifest;
use super::releases_index::RELEASES_FILE;
use super::{VerifyError, VerifyResult};

/// Path segment that marks a macOS download URL.
const MACOS_MARKER: &str = "osx";

/// Windows platforms and the architecture suffix of their full installer.
const WINDOWS_PLATFORMS: [(&str, &str); 2] = [("winx64", "x64"), ("winia32", "ia32")];

/// CDN roots for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnLayout {
    /// Multi-channel releases root, without trailing slash.
    pub base_url: String,
    /// Legacy single-channel releases root, without trailing slash.
    pub base_legacy_url: String,
    pub channel: Channel,
}

impl CdnLayout {
    fn channel_dir(&self, platform: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.channel, platform)
    }

    fn version_dir(&self, version: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.channel, version)
    }
}

/// A single check derived from the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationTarget {
    /// HEAD `url`; `message` describes the failure.
    Exists { url: String, message: String },
    /// GET `{base_url}/RELEASES`, then HEAD the package it names.
    ///
    /// A missing or malformed index fails the run even in warn mode.
    WindowsIndex { base_url: String },
}

impl VerificationTarget {
    fn exists(url: String, message: impl Into<String>) -> Self {
        VerificationTarget::Exists {
            url,
            message: message.into(),
        }
    }

    /// URL this target requests first.
    pub fn url(&self) -> String {
        match self {
            VerificationTarget::Exists { url, .. } => url.clone(),
            VerificationTarget::WindowsIndex { base_url } => index_url(base_url),
        }
    }
}

pub fn index_url(base_url: &str) -> String {
    format!("{}/{}", base_url, RELEASES_FILE)
}

/// Check for the update package named by a `RELEASES` index at `base_url`.
pub fn update_package_target(base_url: &str, filename: &str) -> VerificationTarget {
    let url = format!("{}/{}", base_url, filename);
    let message = format!("Windows update file {} is not available at {}", filename, url);
    VerificationTarget::exists(url, message)
}

/// True if any path segment of `url` is the macOS marker.
pub fn is_macos_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .map(|mut segments| segments.any(|s| s == MACOS_MARKER))
        })
        .unwrap_or(false)
}

/// Sibling disk image of a macOS artifact: same directory, `Brave-{version}.dmg`.
pub fn disk_image_url(entry_url: &str, version: &str) -> VerifyResult<String> {
    let mut url = Url::parse(entry_url).map_err(|e| VerifyError::InvalidUrl {
        url: entry_url.to_string(),
        reason: e.to_string(),
    })?;
    url.set_query(None);
    url.set_fragment(None);

    url.path_segments_mut()
        .map_err(|_| VerifyError::InvalidUrl {
            url: entry_url.to_string(),
            reason: "URL has no path".to_string(),
        })?
        .pop()
        .push(&format!("Brave-{}.dmg", version));

    Ok(url.into())
}

/// Build the fixed, ordered checklist for `version`.
pub fn build_verification_plan(
    manifest: &Manifest,
    version: &str,
    cdn: &CdnLayout,
) -> VerifyResult<Vec<VerificationTarget>> {
    let mut plan = Vec::new();

    // Manifest URLs, plus the dmg next to the macOS artifact.
    for (_, entry) in manifest.entries() {
        let (Some(url), Some(entry_version)) = (&entry.url, &entry.version) else {
            continue;
        };
        plan.push(VerificationTarget::exists(
            url.clone(),
            format!("{} could not be found", url),
        ));
        if is_macos_url(url) {
            plan.push(VerificationTarget::exists(
                disk_image_url(url, entry_version)?,
                "Brave dmg not found",
            ));
        }
    }

    for (platform, _) in WINDOWS_PLATFORMS {
        plan.push(VerificationTarget::WindowsIndex {
            base_url: cdn.channel_dir(platform),
        });
    }

    for (platform, arch) in WINDOWS_PLATFORMS {
        let installer = format!("BraveSetup-{}.exe", arch);
        plan.push(VerificationTarget::exists(
            format!("{}/{}", cdn.channel_dir(platform), installer),
            format!("{} not found", installer),
        ));
    }

    plan.push(VerificationTarget::WindowsIndex {
        base_url: format!("{}/winx64", cdn.base_legacy_url),
    });

    for (platform, arch) in WINDOWS_PLATFORMS {
        let installer = format!("BraveSetup-{}.exe", arch);
        plan.push(VerificationTarget::exists(
            format!("{}/{}/{}", cdn.version_dir(version), platform, installer),
            format!(
                "Versioned {} not found for {} version {}",
                installer, platform, version
            ),
        ));
    }

    let version_dir = cdn.version_dir(version);
    plan.push(VerificationTarget::exists(
        format!("{}/debian64/brave_{}_amd64.deb", version_dir, version),
        format!("debian file not found for version {}", version),
    ));
    plan.push(VerificationTarget::exists(
        format!("{}/fedora64/brave-{}.x86_64.rpm", version_dir, version),
        format!("fedora file not found for version {}", version),
    ));

    Ok(plan)
}
