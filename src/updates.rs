//! Detecting new versions of the regulator's yearly publication.
//!
//! The public API lists one downloadable file per reporting period. The last
//! seen versions are kept in a JSON state file keyed by year:
//! ```json
//! { "2024": { "version": 173, "generationDate": "2026-02-07", "fileName": "2024-v173-..." } }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::Result;
use crate::output::write_atomic;

pub const LISTING_URL: &str =
    "https://mrv.emsa.europa.eu/api/public-emission-report/downloadable-files";

/// Publication version; the API has served it both as a number and a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Version {
    Number(u64),
    Text(String),
}

impl Version {
    /// `173` and `"173"` name the same version.
    pub fn same_as(&self, other: &Version) -> bool {
        self.to_string() == other.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Number(n) => write!(f, "{n}"),
            Version::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadableFile {
    pub reporting_period: u16,
    pub version: Version,
    pub generation_date: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub results: Vec<DownloadableFile>,
}

impl Listing {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileVersion {
    pub version: Version,
    pub generation_date: String,
    pub file_name: String,
}

/// Year → last known version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionState(pub BTreeMap<String, FileVersion>);

impl VersionState {
    /// Versions currently listed for the tracked years.
    pub fn from_listing(listing: &Listing, tracked_years: &[u16]) -> Self {
        let entries = listing
            .results
            .iter()
            .filter(|f| tracked_years.contains(&f.reporting_period))
            .map(|f| {
                (
                    f.reporting_period.to_string(),
                    FileVersion {
                        version: f.version.clone(),
                        generation_date: f.generation_date.clone(),
                        file_name: f.file_name.clone(),
                    },
                )
            })
            .collect();
        Self(entries)
    }

    /// Reads the state file. A missing or unreadable file counts as empty,
    /// so every tracked year is reported as new.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read(path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No version state yet");
                return Self::default();
            }
        };
        serde_json::from_slice(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Version state unreadable, starting fresh");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("mrv_versions.json");
        write_atomic(dir, file_name, &serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Years that are new in `current` or whose version changed.
    pub fn updates_since(&self, current: &VersionState) -> Vec<Update> {
        current
            .0
            .iter()
            .filter_map(|(year, info)| {
                let old = self.0.get(year);
                if old.is_some_and(|o| o.version.same_as(&info.version)) {
                    return None;
                }
                Some(Update {
                    year: year.clone(),
                    old_version: old.map(|o| o.version.clone()),
                    new_version: info.version.clone(),
                    date: info.generation_date.clone(),
                    file_name: info.file_name.clone(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Update {
    pub year: String,
    pub old_version: Option<Version>,
    pub new_version: Version,
    pub date: String,
    pub file_name: String,
}

impl Update {
    pub fn download_url(&self) -> String {
        format!(
            "https://mrv.emsa.europa.eu/api/public-emission-report/reporting-period-document/binary/{}/{}",
            self.year, self.new_version
        )
    }

    /// Local file name for the download. Any directory part of the listed
    /// name is dropped so the file stays in the download directory.
    pub fn download_file_name(&self) -> String {
        let stem = Path::new(&self.file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-v{}", self.year, self.new_version));
        format!("{stem}.xlsx")
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.old_version {
            Some(old) => write!(
                f,
                "{}: v{} -> v{} ({})",
                self.year, old, self.new_version, self.date
            ),
            None => write!(f, "{}: NEW v{} ({})", self.year, self.new_version, self.date),
        }
    }
}

/// Result of one check, printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct CheckSummary {
    pub checked_at: DateTime<Utc>,
    pub updates: Vec<Update>,
    pub downloaded: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "results": [
            {"reportingPeriod": 2024, "version": 173, "generationDate": "2026-02-07", "fileName": "2024-v173"},
            {"reportingPeriod": 2023, "version": "210", "generationDate": "2025-11-01", "fileName": "2023-v210"},
            {"reportingPeriod": 2018, "version": 99, "generationDate": "2020-01-01", "fileName": "2018-v99"}
        ]
    }"#;

    #[test]
    fn test_parse_listing_accepts_number_and_text_versions() {
        let listing = Listing::parse(LISTING.as_bytes()).unwrap();
        assert_eq!(listing.results.len(), 3);
        assert_eq!(listing.results[0].version, Version::Number(173));
        assert_eq!(listing.results[1].version, Version::Text("210".into()));
    }

    #[test]
    fn test_untracked_years_ignored() {
        let listing = Listing::parse(LISTING.as_bytes()).unwrap();
        let current = VersionState::from_listing(&listing, &[2023, 2024]);
        assert_eq!(current.0.len(), 2);
        assert!(!current.0.contains_key("2018"));
    }

    #[test]
    fn test_updates_new_and_changed() {
        let listing = Listing::parse(LISTING.as_bytes()).unwrap();
        let current = VersionState::from_listing(&listing, &[2023, 2024]);

        let mut saved = VersionState::default();
        saved.0.insert(
            "2024".into(),
            FileVersion {
                version: Version::Number(170),
                generation_date: "2025-12-01".into(),
                file_name: "2024-v170".into(),
            },
        );

        let updates = saved.updates_since(&current);
        assert_eq!(updates.len(), 2);
        let y2023 = updates.iter().find(|u| u.year == "2023").unwrap();
        assert_eq!(y2023.old_version, None);
        assert_eq!(y2023.to_string(), "2023: NEW v210 (2025-11-01)");
        let y2024 = updates.iter().find(|u| u.year == "2024").unwrap();
        assert_eq!(y2024.to_string(), "2024: v170 -> v173 (2026-02-07)");
        assert!(y2024.download_url().ends_with("/binary/2024/173"));
        assert_eq!(y2024.download_file_name(), "2024-v173.xlsx");
    }

    #[test]
    fn test_no_updates_when_versions_match() {
        let listing = Listing::parse(LISTING.as_bytes()).unwrap();
        let current = VersionState::from_listing(&listing, &[2024]);
        assert!(current.clone().updates_since(&current).is_empty());
    }

    #[test]
    fn test_number_and_text_versions_match() {
        let listing = Listing::parse(LISTING.as_bytes()).unwrap();
        let current = VersionState::from_listing(&listing, &[2023, 2024]);

        let mut saved = current.clone();
        for info in saved.0.values_mut() {
            info.version = match &info.version {
                Version::Number(n) => Version::Text(n.to_string()),
                Version::Text(s) => Version::Number(s.parse().unwrap()),
            };
        }
        assert!(saved.updates_since(&current).is_empty());
    }

    #[test]
    fn test_download_file_name_stays_in_directory() {
        let update = |file_name: &str| Update {
            year: "2024".into(),
            old_version: None,
            new_version: Version::Number(173),
            date: "2026-02-07".into(),
            file_name: file_name.into(),
        };

        assert_eq!(update("../../etc/cron.d/x").download_file_name(), "x.xlsx");
        assert_eq!(update("/tmp/2024-v173").download_file_name(), "2024-v173.xlsx");
        assert_eq!(update("..").download_file_name(), "2024-v173.xlsx");
        assert_eq!(update("").download_file_name(), "2024-v173.xlsx");
    }

    #[test]
    fn test_state_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("json").join("mrv_versions.json");
        assert_eq!(VersionState::load(&path), VersionState::default());

        let listing = Listing::parse(LISTING.as_bytes()).unwrap();
        let state = VersionState::from_listing(&listing, &[2024]);
        state.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"generationDate\""));
        assert_eq!(VersionState::load(&path), state);
    }

    #[test]
    fn test_corrupt_state_counts_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mrv_versions.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(VersionState::load(&path), VersionState::default());
    }
}
