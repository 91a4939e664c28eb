//! Cloud regions and their grouping by location.

use super::ServerDomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Provider region slug, e.g. `nyc3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    /// Creates a region identifier. The input is trimmed and lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError::EmptyRegion`] when the value is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ServerDomainError> {
        let normalized = value.into().trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(ServerDomainError::EmptyRegion);
        }
        Ok(Self(normalized))
    }

    /// Returns the location the region belongs to: the slug without its
    /// trailing data-centre number (`nyc3` → `nyc`).
    #[must_use]
    pub fn location_code(&self) -> &str {
        let code = self.0.trim_end_matches(|character: char| character.is_ascii_digit());
        if code.is_empty() { &self.0 } else { code }
    }

    /// Returns the slug.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Regions grouped by location, for presenting choices to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionMap {
    locations: BTreeMap<String, Vec<RegionId>>,
}

impl RegionMap {
    /// Groups `regions` by location code. Regions within a location are
    /// sorted and deduplicated.
    #[must_use]
    pub fn from_regions(regions: impl IntoIterator<Item = RegionId>) -> Self {
        let mut locations: BTreeMap<String, Vec<RegionId>> = BTreeMap::new();
        for region in regions {
            locations
                .entry(region.location_code().to_owned())
                .or_default()
                .push(region);
        }
        for ids in locations.values_mut() {
            ids.sort();
            ids.dedup();
        }
        Self { locations }
    }

    /// Returns location codes in order.
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(String::as_str)
    }

    /// Returns the regions of a location.
    #[must_use]
    pub fn regions_in(&self, location_code: &str) -> &[RegionId] {
        self.locations
            .get(location_code)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns whether `region` is offered.
    #[must_use]
    pub fn contains(&self, region: &RegionId) -> bool {
        self.regions_in(region.location_code()).contains(region)
    }

    /// Returns whether no region is offered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
