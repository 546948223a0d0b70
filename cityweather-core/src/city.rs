use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};
use thiserror::Error;

use crate::collate;

const EMBEDDED_CITIES: &str = include_str!("../data/cities.json");

/// A known city. Field names follow the OpenWeather city list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub city_id: u64,
    pub city_name: String,
    #[serde(default)]
    pub state_code: String,
    #[serde(default)]
    pub country_code: String,
    pub lat: f64,
    pub lon: f64,
}

impl CityRecord {
    /// "Name, State, Country" with empty parts left out.
    pub fn display_name(&self) -> String {
        [self.city_name.as_str(), self.state_code.as_str(), self.country_code.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DirectoryError {
    #[error("duplicate city id {0} in city directory")]
    DuplicateId(u64),

    #[error("city {0} has an empty name")]
    EmptyName(u64),
}

/// Read-only table of cities, built once at startup.
#[derive(Debug, Clone)]
pub struct CityDirectory {
    cities: Vec<CityRecord>,
    by_id: HashMap<u64, usize>,
}

impl CityDirectory {
    pub fn from_records(cities: Vec<CityRecord>) -> Result<Self, DirectoryError> {
        let mut by_id = HashMap::with_capacity(cities.len());

        for (idx, city) in cities.iter().enumerate() {
            if city.city_name.trim().is_empty() {
                return Err(DirectoryError::EmptyName(city.city_id));
            }
            if by_id.insert(city.city_id, idx).is_some() {
                return Err(DirectoryError::DuplicateId(city.city_id));
            }
        }

        Ok(Self { cities, by_id })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<CityRecord> =
            serde_json::from_str(json).context("Failed to parse city directory JSON")?;

        Ok(Self::from_records(records)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read city directory: {}", path.display()))?;

        Self::from_json(&contents)
            .with_context(|| format!("Invalid city directory: {}", path.display()))
    }

    /// The table compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_CITIES).context("Embedded city directory is invalid")
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CityRecord> {
        self.cities.iter()
    }

    pub fn lookup(&self, city_id: u64) -> Option<&CityRecord> {
        self.by_id.get(&city_id).map(|&idx| &self.cities[idx])
    }

    /// Resolve `ids` in the given order, skipping ids that are not in the directory.
    pub fn featured(&self, ids: &[u64]) -> Vec<&CityRecord> {
        ids.iter().filter_map(|&id| self.lookup(id)).collect()
    }

    /// Cities whose name contains `filter`, ignoring case, sorted by name.
    ///
    /// Returns `None` when the filter is blank, so callers can tell "nothing
    /// typed yet" apart from "no matches".
    pub fn search(&self, filter: &str) -> Option<Vec<&CityRecord>> {
        let needle = filter.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        let mut matches: Vec<&CityRecord> = self
            .cities
            .iter()
            .filter(|city| city.city_name.to_lowercase().contains(&needle))
            .collect();

        matches.sort_by_cached_key(|city| collate::sort_key(&city.city_name));

        Some(matches)
    }
}
