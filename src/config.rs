//! Run configuration: registry→country mapping, company groups, tracked years.
//!
//! Stored as a plain JSON object on disk, every key optional:
//! ```json
//! {
//!   "registry_countries": "data/registry_country_mapping.json",
//!   "company_groups": { "Maersk": ["5808451", "1135952"] },
//!   "tracked_years": [2022, 2023, 2024]
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Parent groups whose subsidiaries report under separate company IMOs.
const DEFAULT_COMPANY_GROUPS: &[(&str, &[&str])] = &[
    ("MSC Group", &["1535947", "0750415", "5908969"]),
    ("Maersk", &["5808451", "1135952"]),
    (
        "CMA CGM Group",
        &["5427869", "5463827", "0194433", "6376154", "1826240"],
    ),
    (
        "Carnival Corporation",
        &["0196718", "5375992", "1996500", "2057932", "1890038"],
    ),
    ("Evergreen Marine", &["0344771", "4201057"]),
];

pub const DEFAULT_TRACKED_YEARS: &[u16] = &[2020, 2021, 2022, 2023, 2024];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry_countries: Option<PathBuf>,
    pub company_groups: Option<BTreeMap<String, Vec<String>>>,
    pub tracked_years: Option<Vec<u16>>,
}

impl Config {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn company_groups(&self) -> CompanyGroups {
        match &self.company_groups {
            Some(groups) => CompanyGroups::from_groups(groups),
            None => CompanyGroups::default(),
        }
    }

    pub fn tracked_years(&self) -> Vec<u16> {
        self.tracked_years
            .clone()
            .unwrap_or_else(|| DEFAULT_TRACKED_YEARS.to_vec())
    }

    /// Registry mapping from `override_path`, else from the config, else empty.
    pub fn registries(&self, override_path: Option<&Path>) -> Result<RegistryMap> {
        match override_path.or(self.registry_countries.as_deref()) {
            Some(path) => RegistryMap::load(path),
            None => Ok(RegistryMap::default()),
        }
    }
}

/// Maps port-of-registry names to flag-state countries.
#[derive(Debug, Clone, Default)]
pub struct RegistryMap {
    entries: HashMap<String, String>,
}

impl RegistryMap {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading registry mapping {}", path.display()))?;
        let entries: HashMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("parsing registry mapping {}", path.display()))?;
        Ok(Self { entries })
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Unmapped registries stand for themselves.
    pub fn country_for(&self, registry: &str) -> String {
        self.entries
            .get(registry)
            .cloned()
            .unwrap_or_else(|| registry.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Company IMO → group label lookup.
#[derive(Debug, Clone)]
pub struct CompanyGroups {
    by_imo: HashMap<String, String>,
}

impl CompanyGroups {
    pub fn from_groups(groups: &BTreeMap<String, Vec<String>>) -> Self {
        let by_imo = groups
            .iter()
            .flat_map(|(label, imos)| imos.iter().map(move |imo| (imo.clone(), label.clone())))
            .collect();
        Self { by_imo }
    }

    pub fn group_of(&self, company_imo: &str) -> Option<&str> {
        self.by_imo.get(company_imo).map(String::as_str)
    }
}

impl Default for CompanyGroups {
    fn default() -> Self {
        let by_imo = DEFAULT_COMPANY_GROUPS
            .iter()
            .flat_map(|(label, imos)| imos.iter().map(move |imo| (imo.to_string(), label.to_string())))
            .collect();
        Self { by_imo }
    }
}
