//! Ordered collection of fault sources sharing one forecast duration.

use rand::Rng;
use tracing::{debug, info};

use super::config::validate_duration;
use super::{FaultSource, Rupture};
use crate::error::{QuakeError, Result};
use crate::geometry::Region;

/// Multi-source forecast exposing the hazard-calculator iteration contract.
pub struct Forecast {
    sources: Vec<FaultSource>,
    duration: f64,
}

impl Default for Forecast {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Forecast {
    /// Creates an empty forecast with the given duration in years.
    pub fn new(duration: f64) -> Self {
        Self {
            sources: Vec::new(),
            duration,
        }
    }

    /// Adds a source, aligning its duration with the forecast's.
    ///
    /// Returns the index of the new source.
    pub fn add_source(&mut self, mut source: FaultSource) -> Result<usize> {
        source.set_duration(self.duration)?;
        self.sources.push(source);
        Ok(self.sources.len() - 1)
    }

    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn source(&self, index: usize) -> Result<&FaultSource> {
        self.sources.get(index).ok_or(QuakeError::IndexOutOfRange {
            kind: "source",
            index,
            len: self.sources.len(),
        })
    }

    /// Mutable access for buffering configuration changes.
    pub fn source_mut(&mut self, index: usize) -> Result<&mut FaultSource> {
        let len = self.sources.len();
        self.sources
            .get_mut(index)
            .ok_or(QuakeError::IndexOutOfRange { kind: "source", index, len })
    }

    pub fn sources(&self) -> impl Iterator<Item = &FaultSource> {
        self.sources.iter()
    }

    pub fn num_ruptures(&self, source: usize) -> Result<usize> {
        self.source(source).map(FaultSource::num_ruptures)
    }

    /// Borrow of rupture `rupture` of source `source`.
    pub fn rupture(&self, source: usize, rupture: usize) -> Result<&Rupture> {
        self.source(source)?.rupture(rupture)
    }

    /// Independent copy of rupture `rupture` of source `source`.
    pub fn rupture_clone(&self, source: usize, rupture: usize) -> Result<Rupture> {
        self.source(source)?.rupture_clone(rupture)
    }

    /// Sets the duration of every source and rescales probabilities in place.
    pub fn set_duration(&mut self, duration: f64) -> Result<()> {
        validate_duration(duration)?;
        for source in &mut self.sources {
            source.set_duration(duration)?;
        }
        self.duration = duration;
        Ok(())
    }

    /// Rebuilds every stale source.
    ///
    /// Returns the number of sources rebuilt.
    pub fn update_forecast(&mut self) -> Result<usize> {
        self.update_forecast_with_callbacks(|_, _, _| {}, |_, _, _| {})
    }

    /// Rebuilds every stale source, reporting progress.
    ///
    /// # Arguments
    /// * `on_source_start` - Called with (name, index, total) before a rebuild
    /// * `on_source_complete` - Called with (name, index, total) after a rebuild
    ///
    /// Stops at the first failing source; sources before it keep their new
    /// state and the failing one keeps its previous state.
    pub fn update_forecast_with_callbacks<F1, F2>(
        &mut self,
        mut on_source_start: F1,
        mut on_source_complete: F2,
    ) -> Result<usize>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        let total = self.sources.len();
        let mut rebuilt = 0;

        for (i, source) in self.sources.iter_mut().enumerate() {
            if !source.is_stale() {
                debug!(source = source.name(), "source up to date");
                continue;
            }
            on_source_start(source.name(), i, total);
            source.rebuild()?;
            rebuilt += 1;
            on_source_complete(source.name(), i, total);
        }

        info!(sources = total, rebuilt, "forecast updated");
        Ok(rebuilt)
    }

    /// Samples a stochastic catalog across all sources.
    ///
    /// # Errors
    /// `UnsupportedOperation` if any source is non-Poissonian.
    pub fn draw_random_event_set<R: Rng>(&self, rng: &mut R) -> Result<Vec<Rupture>> {
        let mut events = Vec::new();
        for source in &self.sources {
            events.extend(source.draw_random_event_set(rng)?);
        }
        Ok(events)
    }

    /// Probability of at least one rupture with magnitude ≥ `mag` from any source.
    pub fn total_prob_above(&self, mag: f64, region: Option<&Region>) -> f64 {
        let none: f64 = self
            .sources
            .iter()
            .map(|s| 1.0 - s.compute_total_prob_above(mag, region))
            .product();
        1.0 - none
    }
}
