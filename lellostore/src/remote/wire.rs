//! JSON wire format of the LelloStore server API.
//!
//! Field names follow the server's `snake_case` responses. These types stay
//! private to the remote module; callers only see the domain types from
//! [`crate::package`].

use serde::Deserialize;

use crate::package::{ArtifactDetail, ArtifactVersion, CatalogEntry, VersionSummary};

/// `GET /api/apps`
#[derive(Debug, Deserialize)]
pub(crate) struct AppsListResponse {
    pub apps: Vec<AppListItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppListItem {
    pub package_name: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub latest_version: Option<LatestVersionInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LatestVersionInfo {
    pub version_code: u64,
    pub version_name: String,
    #[serde(default)]
    pub size: u64,
}

/// `GET /api/apps/{package}`
#[derive(Debug, Deserialize)]
pub(crate) struct AppDetailResponse {
    pub package_name: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub versions: Vec<AppVersionInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppVersionInfo {
    pub version_code: u64,
    pub version_name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub min_sdk: u32,
    #[serde(default)]
    pub uploaded_at: String,
}

impl From<AppListItem> for CatalogEntry {
    fn from(item: AppListItem) -> Self {
        Self {
            package_name: item.package_name,
            name: item.name,
            description: item.description,
            latest_version: item.latest_version.map(|v| VersionSummary {
                version_code: v.version_code,
                version_name: v.version_name,
                size_bytes: v.size,
            }),
        }
    }
}

impl From<AppVersionInfo> for ArtifactVersion {
    fn from(info: AppVersionInfo) -> Self {
        Self {
            version_code: info.version_code,
            version_name: info.version_name,
            size_bytes: info.size,
            // An empty digest is the same as no digest.
            sha256: info.sha256.filter(|s| !s.is_empty()),
            min_platform_version: info.min_sdk,
            uploaded_at: info.uploaded_at,
        }
    }
}

impl From<AppDetailResponse> for ArtifactDetail {
    fn from(detail: AppDetailResponse) -> Self {
        Self {
            package_name: detail.package_name,
            name: detail.name,
            description: detail.description,
            versions: detail.versions.into_iter().map(Into::into).collect(),
        }
    }
}
