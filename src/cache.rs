//! The per-season map cache.
//!
//! A long-lived caller populates it once at initialization over every
//! offerable season present in the dataset and queries by key after that;
//! one-shot callers start empty and render on first access instead. The
//! dataset is immutable for the process lifetime, so the cache never
//! invalidates either way.

use anyhow::Result;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::analysis::season::{SeasonKey, season_cells};
use crate::dataset::Dataset;
use crate::render::map::render_season_map;

pub struct SeasonMapCache {
    maps: BTreeMap<SeasonKey, Vec<u8>>,
}

impl SeasonMapCache {
    /// Renders one PNG per offerable season in the dataset, exactly once.
    #[tracing::instrument(skip(data), fields(rows = data.len()))]
    pub fn build(data: &Dataset) -> Result<Self> {
        let mut maps = BTreeMap::new();

        for season in SeasonKey::offered_in(data) {
            let cells = season_cells(data, season);
            debug!(season = %season, cells = cells.len(), "Rendering season map");
            let png = render_season_map(&cells, season)?;
            maps.insert(season, png);
        }

        info!(seasons = maps.len(), "Season map cache built");
        Ok(SeasonMapCache { maps })
    }

    /// An empty cache for callers that render on demand.
    pub fn empty() -> Self {
        SeasonMapCache {
            maps: BTreeMap::new(),
        }
    }

    /// Returns the PNG for a season, rendering and memoizing it on first
    /// access. Yields `None` without rendering for seasons outside the
    /// offered range or absent from the dataset.
    pub fn get_or_render(&mut self, data: &Dataset, season: SeasonKey) -> Result<Option<&[u8]>> {
        if !season.is_offered() || !data.years().contains(&season.year()) {
            return Ok(None);
        }
        if !self.maps.contains_key(&season) {
            let cells = season_cells(data, season);
            debug!(season = %season, cells = cells.len(), "Rendering season map");
            let png = render_season_map(&cells, season)?;
            self.maps.insert(season, png);
        }
        Ok(self.maps.get(&season).map(Vec::as_slice))
    }

    /// Looks up the pre-rendered PNG for a season. Seasons outside the
    /// offered range are never present.
    pub fn get(&self, season: SeasonKey) -> Option<&[u8]> {
        self.maps.get(&season).map(Vec::as_slice)
    }

    /// The cached seasons, ascending.
    pub fn seasons(&self) -> Vec<SeasonKey> {
        self.maps.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
