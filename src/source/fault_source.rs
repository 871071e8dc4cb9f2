//! Fault source: moment budget, MFDs and floated ruptures of one fault.

use glam::{DVec2, DVec3};
use rand::Rng;
use tracing::{debug, info};

use super::config::validate_duration;
use super::{Rupture, RuptureKind, SourceConfig};
use crate::error::{QuakeError, Result};
use crate::floater::{float_mfd, segment_overlap, FloatedRupture};
use crate::geometry::{GriddedSurface, Region};
use crate::mfd::{
    characteristic_magnitude, prob_visible, synthesize, visible_mfd, IncrementalMfd, MfdDiagnostics,
    SynthesizedMfd,
};
use crate::moment::{
    average_slip, FaultSection, FaultSegmentData, HanksBakun2002, MagAreaRelation, SectionExclusion,
};
use crate::probability::{
    bpt_rate_gain, effective_correction, poisson_event_count_for_lambda, EmpiricalCorrection,
    ProbabilityModel,
};

/// Farthest a site query may lie from the fault trace, in km.
pub const SITE_CUTOFF_KM: f64 = 2.0;

/// Derived state of one successful rebuild.
struct BuiltSource {
    version: u64,
    /// Configuration the state was built from (duration kept current).
    config: SourceConfig,
    segment_data: FaultSegmentData,
    surface: GriddedSurface,
    mfd: SynthesizedMfd,
    source_mag: Option<f64>,
    visible: IncrementalMfd,
    segment_mfds: Vec<IncrementalMfd>,
    ruptures: Vec<Rupture>,
    num_char: usize,
}

/// Aggregation root of one fault's ruptures.
///
/// Configuration changes are buffered and only take effect on the next
/// [`FaultSource::rebuild`]. Until the first successful rebuild the source
/// has no ruptures.
pub struct FaultSource {
    name: String,
    segments: Vec<Vec<FaultSection>>,
    exclusions: Vec<SectionExclusion>,
    config: SourceConfig,
    correction: Option<Box<dyn EmpiricalCorrection>>,
    config_version: u64,
    built: Option<BuiltSource>,
}

impl FaultSource {
    /// Creates an unbuilt source.
    ///
    /// # Arguments
    /// * `name` - Fault name
    /// * `segments` - Sections of each segment, in along-strike order
    /// * `config` - Source configuration
    pub fn new(name: impl Into<String>, segments: Vec<Vec<FaultSection>>, config: SourceConfig) -> Self {
        Self {
            name: name.into(),
            segments,
            exclusions: Vec::new(),
            config,
            correction: None,
            config_version: 1,
            built: None,
        }
    }

    /// Sets the section exclusion table used when stitching the surface.
    pub fn with_exclusions(mut self, exclusions: Vec<SectionExclusion>) -> Self {
        self.exclusions = exclusions;
        self.config_version += 1;
        self
    }

    /// Sets the regional correction used by the empirical probability model.
    pub fn with_empirical_correction(mut self, correction: impl EmpiricalCorrection + 'static) -> Self {
        self.correction = Some(Box::new(correction));
        self.config_version += 1;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current (possibly not yet applied) configuration.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Buffers a configuration change for the next rebuild.
    pub fn configure(&mut self, f: impl FnOnce(&mut SourceConfig)) {
        f(&mut self.config);
        self.config_version += 1;
    }

    /// Replaces the fault sections.
    pub fn set_segments(&mut self, segments: Vec<Vec<FaultSection>>) {
        self.segments = segments;
        self.config_version += 1;
    }

    /// Whether the built state lags the configuration.
    pub fn is_stale(&self) -> bool {
        self.built.as_ref().map_or(true, |b| b.version != self.config_version)
    }

    /// Whether a rebuild has ever succeeded.
    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Recomputes the moment budget, MFDs, ruptures and probabilities.
    ///
    /// On error the previously built state stays in place.
    pub fn rebuild(&mut self) -> Result<()> {
        let built = self.build()?;
        info!(
            source = %self.name,
            ruptures = built.ruptures.len(),
            characteristic = built.num_char,
            source_mag = ?built.source_mag,
            moment_rate = built.segment_data.total_moment_rate(),
            "rebuilt fault source"
        );
        self.built = Some(built);
        Ok(())
    }

    fn build(&self) -> Result<BuiltSource> {
        let config = &self.config;
        config.validate()?;

        let named_segments = self
            .segments
            .iter()
            .map(|sections| {
                let name = sections.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(" + ");
                (name, sections.clone())
            })
            .collect();
        let segment_data = FaultSegmentData::new(self.name.clone(), named_segments, config.aseismicity)?
            .with_exclusions(self.exclusions.clone())?;

        let moment_rate = segment_data.total_moment_rate();
        let area = segment_data.total_area();
        let fixed_rate = config.mfd.fixed_char.map_or(0.0, |f| f.rate);
        let has_area = area > 0.0 && segment_data.total_length() > 0.0;
        if !has_area && (moment_rate > 0.0 || fixed_rate > 0.0) {
            return Err(QuakeError::config(format!(
                "fault '{}' has no seismogenic area but a non-zero rate is requested",
                self.name
            )));
        }

        let surface = segment_data.combined_surface(config.grid_spacing_km)?;
        let (mfd, source_mag) = if has_area {
            let char_mag = characteristic_magnitude(
                &config.scaling,
                area,
                config.mfd.mean_mag_correction,
                config.mfd.grid.delta,
            );
            let mfd = synthesize(&config.mfd, moment_rate, char_mag)?;
            let mag = mfd.char_mag;
            (mfd, Some(mag))
        } else {
            (SynthesizedMfd::empty(config.mfd.grid), None)
        };
        debug!(
            source = %self.name,
            area,
            moment_rate,
            rows = surface.num_rows(),
            cols = surface.num_cols(),
            "moment budget and surface ready"
        );

        // Window sizes always follow Hanks-Bakun, whichever relation sets the
        // characteristic magnitude.
        let floated_char = float_mfd(
            &surface,
            &mfd.characteristic,
            &HanksBakun2002,
            &config.floater,
            !config.floater.float_characteristic,
        )?;
        let floated_gr = match &mfd.gutenberg_richter {
            Some(gr) => float_mfd(&surface, gr, &HanksBakun2002, &config.floater, false)?,
            None => Vec::new(),
        };

        let correction = match (&config.probability, &self.correction) {
            (ProbabilityModel::Empirical { .. }, None) => {
                return Err(QuakeError::config(format!(
                    "fault '{}' uses the empirical model without a correction provider",
                    self.name
                )))
            }
            (ProbabilityModel::Empirical { weight }, Some(provider)) => Some((*weight, &**provider)),
            _ => None,
        };

        let rake = segment_data.average_rake();
        let num_char = floated_char.len();
        let mut ruptures: Vec<Rupture> = floated_char
            .iter()
            .map(|f| (f, RuptureKind::Characteristic))
            .chain(floated_gr.iter().map(|f| (f, RuptureKind::GutenbergRichter)))
            .map(|(f, kind)| make_rupture(f, kind, rake, &surface, correction))
            .collect();

        apply_probabilities(&mut ruptures, &config.probability, config.duration);

        let segment_mfds = participation_mfds(&segment_data, &mfd.total, &config.scaling);
        let visible = visible_mfd(&mfd.total);

        Ok(BuiltSource {
            version: self.config_version,
            config: config.clone(),
            segment_data,
            surface,
            mfd,
            source_mag,
            visible,
            segment_mfds,
            ruptures,
            num_char,
        })
    }

    /// Number of ruptures in the built state.
    pub fn num_ruptures(&self) -> usize {
        self.built.as_ref().map_or(0, |b| b.ruptures.len())
    }

    /// All ruptures of the built state.
    pub fn ruptures(&self) -> &[Rupture] {
        match &self.built {
            Some(built) => &built.ruptures,
            None => &[],
        }
    }

    /// Borrow of rupture `index`.
    pub fn rupture(&self, index: usize) -> Result<&Rupture> {
        let ruptures = self.ruptures();
        ruptures.get(index).ok_or(QuakeError::IndexOutOfRange {
            kind: "rupture",
            index,
            len: ruptures.len(),
        })
    }

    /// Independent copy of rupture `index`.
    pub fn rupture_clone(&self, index: usize) -> Result<Rupture> {
        self.rupture(index).cloned()
    }

    /// Changes the forecast duration and rescales every probability.
    ///
    /// Does not re-run the floater, and does not mark the source stale.
    pub fn set_duration(&mut self, duration: f64) -> Result<()> {
        validate_duration(duration)?;
        self.config.duration = duration;
        if let Some(built) = &mut self.built {
            apply_probabilities(&mut built.ruptures, &built.config.probability, duration);
            built.config.duration = duration;
        }
        Ok(())
    }

    /// Duration the built probabilities refer to.
    pub fn duration(&self) -> f64 {
        self.built.as_ref().map_or(self.config.duration, |b| b.config.duration)
    }

    /// Probability model of the built state.
    pub fn probability_model(&self) -> Option<&ProbabilityModel> {
        self.built.as_ref().map(|b| &b.config.probability)
    }

    /// Probability of at least one rupture with magnitude ≥ `mag`.
    ///
    /// With a region, each rupture counts by the fraction of its surface
    /// points inside the polygon.
    pub fn compute_total_prob_above(&self, mag: f64, region: Option<&Region>) -> f64 {
        let Some(built) = &self.built else {
            return 0.0;
        };
        let log_sum: f64 = built
            .ruptures
            .iter()
            .filter(|r| r.magnitude >= mag)
            .map(|r| {
                let frac = region.map_or(1.0, |reg| reg.fraction_inside(built.surface.window_points(&r.window)));
                (1.0 - r.probability * frac).ln()
            })
            .sum();
        1.0 - log_sum.exp()
    }

    /// Samples a stochastic catalog: each rupture appears as many times as
    /// it occurs in one draw.
    ///
    /// Counts are drawn from each rupture's expected count over the current
    /// duration, so ruptures whose probability has rounded to 1 still sample.
    ///
    /// # Errors
    /// `UnsupportedOperation` for non-Poissonian probability models.
    pub fn draw_random_event_set<R: Rng>(&self, rng: &mut R) -> Result<Vec<Rupture>> {
        let Some(built) = &self.built else {
            return Ok(Vec::new());
        };
        let model = &built.config.probability;
        if !model.is_poissonian() {
            return Err(QuakeError::UnsupportedOperation(format!(
                "fault '{}' uses the {} model; only Poissonian sources can be sampled",
                self.name,
                model.name()
            )));
        }

        let duration = built.config.duration;
        let mut events = Vec::new();
        for rupture in &built.ruptures {
            let count = poisson_event_count_for_lambda(rng, rupture.effective_rate() * duration)?;
            events.extend(std::iter::repeat(rupture).take(count).cloned());
        }
        Ok(events)
    }

    pub fn num_char_ruptures(&self) -> usize {
        self.built.as_ref().map_or(0, |b| b.num_char)
    }

    pub fn num_gr_ruptures(&self) -> usize {
        self.built.as_ref().map_or(0, |b| b.ruptures.len() - b.num_char)
    }

    /// Summed characteristic and GR distribution.
    pub fn mag_freq_dist(&self) -> Option<&IncrementalMfd> {
        self.built.as_ref().map(|b| &b.mfd.total)
    }

    pub fn char_mag_freq_dist(&self) -> Option<&IncrementalMfd> {
        self.built.as_ref().map(|b| &b.mfd.characteristic)
    }

    /// GR tail, absent when the characteristic magnitude is at or below the cutoff.
    pub fn gr_mag_freq_dist(&self) -> Option<&IncrementalMfd> {
        self.built.as_ref().and_then(|b| b.mfd.gutenberg_richter.as_ref())
    }

    /// Distribution of surface-rupturing events.
    pub fn visible_mag_freq_dist(&self) -> Option<&IncrementalMfd> {
        self.built.as_ref().map(|b| &b.visible)
    }

    pub fn mfd_diagnostics(&self) -> Option<&MfdDiagnostics> {
        self.built.as_ref().map(|b| &b.mfd.diagnostics)
    }

    /// Characteristic magnitude; `None` for a fault without area.
    pub fn source_mag(&self) -> Option<f64> {
        self.built.as_ref().and_then(|b| b.source_mag)
    }

    /// Fault moment rate before any reduction (N·m/yr).
    pub fn moment_rate(&self) -> f64 {
        self.built.as_ref().map_or(0.0, |b| b.segment_data.total_moment_rate())
    }

    pub fn surface(&self) -> Option<&GriddedSurface> {
        self.built.as_ref().map(|b| &b.surface)
    }

    pub fn segment_data(&self) -> Option<&FaultSegmentData> {
        self.built.as_ref().map(|b| &b.segment_data)
    }

    /// Ratio of corrected to uncorrected total rate (1 when there is no rate).
    pub fn source_gain(&self) -> f64 {
        let ruptures = self.ruptures();
        let rate: f64 = ruptures.iter().map(|r| r.rate).sum();
        if rate > 0.0 {
            ruptures.iter().map(Rupture::effective_rate).sum::<f64>() / rate
        } else {
            1.0
        }
    }

    fn built_segment(&self, segment: usize) -> Result<(&BuiltSource, &IncrementalMfd)> {
        let built = self.built.as_ref().ok_or(QuakeError::IndexOutOfRange {
            kind: "segment",
            index: segment,
            len: 0,
        })?;
        let mfd = built.segment_mfds.get(segment).ok_or(QuakeError::IndexOutOfRange {
            kind: "segment",
            index: segment,
            len: built.segment_mfds.len(),
        })?;
        Ok((built, mfd))
    }

    /// Rate of ruptures touching a segment, by magnitude.
    pub fn segment_mag_freq_dist(&self, segment: usize) -> Result<&IncrementalMfd> {
        self.built_segment(segment).map(|(_, mfd)| mfd)
    }

    /// Total rate of ruptures touching a segment.
    pub fn segment_rate(&self, segment: usize) -> Result<f64> {
        self.segment_mag_freq_dist(segment).map(IncrementalMfd::total_rate)
    }

    /// `(average slip in m, rate)` of each magnitude bin touching a segment.
    pub fn segment_slip_distribution(&self, segment: usize) -> Result<Vec<(f64, f64)>> {
        let (built, mfd) = self.built_segment(segment)?;
        Ok(slip_distribution(mfd, &built.config.scaling))
    }

    /// `(average slip in m, rate)` of the surface-rupturing events touching a
    /// segment.
    pub fn segment_visible_slip_distribution(&self, segment: usize) -> Result<Vec<(f64, f64)>> {
        let (built, mfd) = self.built_segment(segment)?;
        Ok(slip_distribution(&visible_mfd(mfd), &built.config.scaling))
    }

    /// Slip rate (mm/yr) delivered to a segment by its ruptures.
    pub fn final_ave_segment_slip_rate(&self, segment: usize) -> Result<f64> {
        let dist = self.segment_slip_distribution(segment)?;
        Ok(dist.iter().map(|(slip, rate)| slip * rate).sum::<f64>() * 1e3)
    }

    /// Per-segment `(final - target) / std-dev`, both scaled by the moment-rate
    /// reduction; `None` where the std-dev is zero.
    pub fn normalized_slip_rate_residuals(&self) -> Result<Vec<Option<f64>>> {
        let Some(built) = &self.built else {
            return Ok(Vec::new());
        };
        let keep = 1.0 - built.config.mfd.moment_rate_reduction;
        built
            .segment_data
            .segments()
            .iter()
            .enumerate()
            .map(|(i, seg)| {
                let final_rate = self.final_ave_segment_slip_rate(i)?;
                let std_dev = seg.slip_rate_std_dev * keep;
                Ok((std_dev > 0.0).then(|| (final_rate - seg.slip_rate * keep) / std_dev))
            })
            .collect()
    }

    /// Horizontal distance (km) from `site` to the nearest of the trace's
    /// two ends and midpoint; `None` before the first rebuild.
    pub fn min_distance(&self, site: DVec2) -> Option<f64> {
        let surface = self.surface()?;
        let cols = surface.num_cols();
        [0, cols / 2, cols.saturating_sub(1)]
            .into_iter()
            .filter_map(|col| surface.location(0, col))
            .map(|p| p.truncate().distance(site))
            .reduce(f64::min)
    }

    /// Annual rate of ruptures passing through a trace location.
    ///
    /// # Errors
    /// `OffFault` when `location` is more than [`SITE_CUTOFF_KM`] from the trace.
    pub fn pred_event_rate(&self, location: DVec2) -> Result<f64> {
        self.sum_at_site(location, |r, _| r.effective_rate())
    }

    /// Annual rate of surface-rupturing events passing through a trace
    /// location, as seen by a paleoseismic site.
    ///
    /// # Errors
    /// `OffFault` when `location` is more than [`SITE_CUTOFF_KM`] from the trace.
    pub fn pred_obs_event_rate(&self, location: DVec2) -> Result<f64> {
        self.sum_at_site(location, |r, _| r.effective_rate() * prob_visible(r.magnitude))
    }

    /// Slip rate (mm/yr) at a trace location implied by the ruptures through it.
    ///
    /// # Errors
    /// `OffFault` when `location` is more than [`SITE_CUTOFF_KM`] from the trace.
    pub fn pred_slip_rate(&self, location: DVec2) -> Result<f64> {
        self.sum_at_site(location, |r, surface| {
            let area = surface.window_length(&r.window) * surface.window_width(&r.window);
            if area > 0.0 {
                r.effective_rate() * average_slip(r.magnitude, area) * 1e3
            } else {
                0.0
            }
        })
    }

    /// Sums `value` over ruptures with a grid point as close to `location` as
    /// the nearest trace point.
    fn sum_at_site(&self, location: DVec2, value: impl Fn(&Rupture, &GriddedSurface) -> f64) -> Result<f64> {
        let Some(built) = &self.built else {
            return Ok(0.0);
        };
        let surface = &built.surface;
        let horizontal = |p: DVec3| p.truncate().distance(location);

        let trace_distance = (0..surface.num_cols())
            .filter_map(|col| surface.location(0, col))
            .map(horizontal)
            .fold(f64::INFINITY, f64::min);
        // One metre of slack so the nearest trace point itself qualifies.
        let cutoff = trace_distance + 1e-3;
        if cutoff > SITE_CUTOFF_KM {
            return Err(QuakeError::OffFault {
                distance: trace_distance,
                limit: SITE_CUTOFF_KM,
            });
        }

        Ok(built
            .ruptures
            .iter()
            .filter(|r| surface.window_points(&r.window).any(|p| horizontal(p) < cutoff))
            .map(|r| value(r, surface))
            .sum())
    }

    /// Slip rate (mm/yr) at each surface column implied by the ruptures.
    pub fn slip_rate_along_strike(&self) -> Vec<f64> {
        let Some(built) = &self.built else {
            return Vec::new();
        };
        let surface = &built.surface;
        let mut slip_rates = vec![0.0; surface.num_cols()];
        for rupture in &built.ruptures {
            let area = surface.window_length(&rupture.window) * surface.window_width(&rupture.window);
            if area <= 0.0 {
                continue;
            }
            let slip = average_slip(rupture.magnitude, area);
            let end = rupture.window.end_col().min(slip_rates.len());
            for value in &mut slip_rates[rupture.window.start_col..end] {
                *value += rupture.effective_rate() * slip * 1e3;
            }
        }
        slip_rates
    }

    /// Target slip rate (mm/yr) at each surface column: a step function of
    /// the segment slip rates, scaled by the moment-rate reduction.
    pub fn original_slip_rate_along_strike(&self) -> Vec<f64> {
        let Some(built) = &self.built else {
            return Vec::new();
        };
        let keep = 1.0 - built.config.mfd.moment_rate_reduction;
        let bounds = built.segment_data.segment_bounds();
        let segments = built.segment_data.segments();
        let surface = &built.surface;
        let scale = if surface.surface_length() > 0.0 {
            built.segment_data.total_length() / surface.surface_length()
        } else {
            1.0
        };

        (0..surface.num_cols())
            .map(|col| {
                let distance = col as f64 * surface.spacing_along() * scale;
                let index = bounds
                    .iter()
                    .position(|&(_, end)| distance < end)
                    .unwrap_or(segments.len() - 1);
                segments[index].slip_rate * keep
            })
            .collect()
    }
}

fn slip_distribution(mfd: &IncrementalMfd, scaling: &impl MagAreaRelation) -> Vec<(f64, f64)> {
    mfd.iter()
        .filter(|&(_, rate)| rate > 0.0)
        .map(|(mag, rate)| (average_slip(mag, scaling.median_area(mag)), rate))
        .collect()
}

fn make_rupture(
    floated: &FloatedRupture,
    kind: RuptureKind,
    rake: f64,
    surface: &GriddedSurface,
    correction: Option<(f64, &dyn EmpiricalCorrection)>,
) -> Rupture {
    let rate_gain = match correction {
        Some((weight, provider)) => {
            let corr = provider.mean_correction(&mut surface.window_points(&floated.window));
            effective_correction(corr, weight)
        }
        None => 1.0,
    };
    Rupture {
        magnitude: floated.mag,
        rake,
        rate: floated.rate,
        rate_gain,
        probability: 0.0,
        window: floated.window,
        hypocenter: surface.window_centroid(&floated.window),
        kind,
    }
}

/// Sets every rupture's probability for `duration`.
///
/// The BPT gain depends on the duration, so it is recomputed here; the
/// empirical gain is fixed at build time.
fn apply_probabilities(ruptures: &mut [Rupture], model: &ProbabilityModel, duration: f64) {
    if let ProbabilityModel::TimeDependent(params) = model {
        let total_rate: f64 = ruptures.iter().map(|r| r.rate).sum();
        let gain = bpt_rate_gain(total_rate, params, duration);
        for rupture in ruptures.iter_mut() {
            rupture.rate_gain = gain;
        }
    }
    for rupture in ruptures.iter_mut() {
        rupture.update_probability(duration);
    }
}

/// Rate of ruptures touching each segment, using the probability that a
/// floating rupture of the bin's median length covers the segment.
fn participation_mfds(data: &FaultSegmentData, total: &IncrementalMfd, scaling: &impl MagAreaRelation) -> Vec<IncrementalMfd> {
    let mut mfds = vec![IncrementalMfd::zeros(*total.grid()); data.num_segments()];
    let ddw = data.average_down_dip_width();
    if ddw <= 0.0 {
        return mfds;
    }
    let bounds = data.segment_bounds();
    let length = data.total_length();

    for (index, (mag, rate)) in total.iter().enumerate() {
        if rate <= 0.0 {
            continue;
        }
        let rup_length = scaling.median_area(mag) / ddw;
        let overlap = segment_overlap(&bounds, length, rup_length);
        for (mfd, obs) in mfds.iter_mut().zip(&overlap.observation) {
            mfd.set_rate(index, rate * obs);
        }
    }
    mfds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floater::{float_windows, FloaterType};
    use crate::geometry::FaultTrace;
    use crate::mfd::{MagGrid, MfdConfig};
    use crate::moment::{moment_from_mag, EllsworthB, ScalingRelation};
    use crate::probability::{bpt_conditional_probability, BptParams, RegionalCorrection};
    use glam::DVec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn create_test_section(name: &str, y0: f64, y1: f64, slip: f64) -> FaultSection {
        FaultSection {
            slip_rate_std_dev: 2.0,
            ..FaultSection::vertical(
                name,
                FaultTrace::straight(name, DVec2::new(0.0, y0), DVec2::new(0.0, y1)),
                15.0,
                slip,
            )
        }
    }

    fn create_test_source(config: SourceConfig) -> FaultSource {
        FaultSource::new("test fault", vec![vec![create_test_section("s0", 0.0, 100.0, 10.0)]], config)
    }

    fn create_built_source(config: SourceConfig) -> FaultSource {
        let mut source = create_test_source(config);
        source.rebuild().unwrap();
        source
    }

    #[test]
    fn test_end_to_end_moment_conservation() {
        let source = create_built_source(SourceConfig::default());
        assert!((source.moment_rate() - 4.5e17).abs() / 4.5e17 < 1e-12);
        assert!((source.source_mag().unwrap() - 7.3).abs() < 1e-9);

        let realized: f64 = source.ruptures().iter().map(|r| r.rate * moment_from_mag(r.magnitude)).sum();
        assert!((realized - 4.5e17).abs() / 4.5e17 < 1e-2);
        assert!(source.mfd_diagnostics().unwrap().relative_error < 1e-3);
        assert!(source.gr_mag_freq_dist().is_some());
    }

    #[test]
    fn test_rupture_rates_match_mfd() {
        let source = create_built_source(SourceConfig::default());
        let mfd = source.mag_freq_dist().unwrap();
        let total: f64 = source.ruptures().iter().map(|r| r.rate).sum();
        assert!((total - mfd.total_rate()).abs() / mfd.total_rate() < 1e-12);

        // Characteristic ruptures span the whole surface by default.
        let full = source.surface().unwrap().full_window();
        assert_eq!(source.num_char_ruptures(), 4);
        assert!(source
            .ruptures()
            .iter()
            .filter(|r| r.kind == RuptureKind::Characteristic)
            .all(|r| r.window == full));
        assert_eq!(source.num_char_ruptures() + source.num_gr_ruptures(), source.num_ruptures());
    }

    #[test]
    fn test_small_fault_has_no_gr_tail() {
        let mut source = FaultSource::new(
            "short",
            vec![vec![create_test_section("s0", 0.0, 10.0, 5.0)]],
            SourceConfig::default(),
        );
        source.rebuild().unwrap();
        assert!(source.source_mag().unwrap() <= 6.5);
        assert!(source.gr_mag_freq_dist().is_none());
        assert_eq!(source.num_gr_ruptures(), 0);
    }

    #[test]
    fn test_staleness_tracking() {
        let mut source = create_test_source(SourceConfig::default());
        assert!(source.is_stale());
        assert_eq!(source.num_ruptures(), 0);

        source.rebuild().unwrap();
        assert!(!source.is_stale());

        source.configure(|c| c.mfd.b_value = 1.0);
        assert!(source.is_stale());
        source.rebuild().unwrap();
        assert!(!source.is_stale());

        source.set_duration(30.0).unwrap();
        assert!(!source.is_stale());
    }

    #[test]
    fn test_failed_rebuild_keeps_prior_state() {
        let mut source = create_built_source(SourceConfig::default());
        let before: Vec<Rupture> = source.ruptures().to_vec();

        // 0.3 km rounds to zero grid columns.
        source.configure(|c| c.floater.offset_km = 0.3);
        assert!(matches!(source.rebuild(), Err(QuakeError::Configuration(_))));
        assert_eq!(source.ruptures(), before.as_slice());
        assert!(source.is_stale());
    }

    #[test]
    fn test_rupture_clone_is_independent() {
        let source = create_built_source(SourceConfig::default());
        let mut copy = source.rupture_clone(0).unwrap();
        let original = source.rupture(0).unwrap().clone();
        copy.probability = 0.99;
        copy.magnitude += 1.0;
        assert_eq!(source.rupture(0).unwrap(), &original);

        let len = source.num_ruptures();
        assert_eq!(
            source.rupture(len).unwrap_err(),
            QuakeError::IndexOutOfRange { kind: "rupture", index: len, len }
        );
    }

    #[test]
    fn test_set_duration_round_trip() {
        let mut source = create_built_source(SourceConfig::default());
        let one_year: Vec<f64> = source.ruptures().iter().map(|r| r.probability).collect();

        source.set_duration(50.0).unwrap();
        assert!(source.ruptures().iter().zip(&one_year).all(|(r, p)| r.probability > *p));

        source.set_duration(1.0).unwrap();
        let restored: Vec<f64> = source.ruptures().iter().map(|r| r.probability).collect();
        assert_eq!(restored, one_year);
        assert!(source.set_duration(-2.0).is_err());
    }

    #[test]
    fn test_time_dependent_fold_matches_bpt() {
        let params = BptParams {
            aperiodicity: 0.5,
            years_since_last: 150.0,
        };
        let mut source = create_built_source(SourceConfig::time_dependent(params));
        source.set_duration(30.0).unwrap();

        let total_rate = source.mag_freq_dist().unwrap().total_rate();
        let expected = bpt_conditional_probability(1.0 / total_rate, 0.5, 150.0, 30.0);
        let folded = source.compute_total_prob_above(MagGrid::default().min_mag, None);
        assert!((folded - expected).abs() < 1e-9);

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert!(matches!(
            source.draw_random_event_set(&mut rng),
            Err(QuakeError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_empirical_correction_gain() {
        let mut source = create_test_source(SourceConfig::empirical(1.0));
        assert!(source.rebuild().is_err());

        let everywhere = crate::geometry::Region::rectangle(DVec2::new(-50.0, -50.0), DVec2::new(50.0, 150.0));
        let correction = RegionalCorrection::new(vec![(everywhere, 2.0)]);
        let mut source = create_test_source(SourceConfig::empirical(0.5)).with_empirical_correction(correction);
        source.rebuild().unwrap();
        assert!((source.source_gain() - 1.5).abs() < 1e-12);

        let poisson = create_built_source(SourceConfig::default());
        assert_eq!(poisson.source_gain(), 1.0);
        let p_corr = source.compute_total_prob_above(6.0, None);
        let p_plain = poisson.compute_total_prob_above(6.0, None);
        assert!(p_corr > p_plain);
    }

    #[test]
    fn test_region_clips_probability() {
        let source = create_built_source(SourceConfig::default());
        let half = Region::rectangle(DVec2::new(-10.0, -10.0), DVec2::new(10.0, 50.0));
        let clipped = source.compute_total_prob_above(6.0, Some(&half));
        let full = source.compute_total_prob_above(6.0, None);
        assert!(clipped > 0.0 && clipped < full);
        assert_eq!(source.compute_total_prob_above(9.5, None), 0.0);
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let mut source = create_built_source(SourceConfig::default());
        source.set_duration(2000.0).unwrap();
        let a = source.draw_random_event_set(&mut ChaCha8Rng::seed_from_u64(11)).unwrap();
        let b = source.draw_random_event_set(&mut ChaCha8Rng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_sampling_after_long_duration() {
        let mut source = create_built_source(SourceConfig::default());
        source.set_duration(100_000.0).unwrap();
        assert!(source.ruptures().iter().any(|r| r.probability == 1.0));

        let events = source.draw_random_event_set(&mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        let expected: f64 = source.ruptures().iter().map(|r| r.effective_rate() * 100_000.0).sum();
        let count = events.len() as f64;
        assert!(
            (count - expected).abs() < 5.0 * expected.sqrt(),
            "{count} events, expected {expected}"
        );
    }

    #[test]
    fn test_floater_sizes_follow_hanks_bakun() {
        let config = SourceConfig {
            scaling: ScalingRelation::EllsworthB,
            ..Default::default()
        };
        let source = create_built_source(config);
        let surface = source.surface().unwrap();
        let gr: Vec<&Rupture> = source
            .ruptures()
            .iter()
            .filter(|r| r.kind == RuptureKind::GutenbergRichter)
            .collect();
        assert!(!gr.is_empty());

        let cols_for = |area: f64| float_windows(surface, area, 5.0, FloaterType::FullWidth).unwrap()[0].cols;
        for r in &gr {
            assert_eq!(r.window.cols, cols_for(HanksBakun2002.median_area(r.magnitude)));
        }
        assert!(gr.iter().any(|r| r.window.cols != cols_for(EllsworthB.median_area(r.magnitude))));
    }

    #[test]
    fn test_site_rates_along_trace() {
        assert_eq!(create_test_source(SourceConfig::default()).min_distance(DVec2::ZERO), None);

        let source = create_built_source(SourceConfig::default());
        let middle = DVec2::new(0.0, 50.0);
        let rate = source.pred_event_rate(middle).unwrap();
        let total = source.mag_freq_dist().unwrap().total_rate();
        let characteristic = source.char_mag_freq_dist().unwrap().total_rate();
        // Characteristic ruptures cover the whole trace; floaters only some of it.
        assert!(rate >= characteristic && rate < total);

        let end = source.pred_event_rate(DVec2::ZERO).unwrap();
        assert!(end >= characteristic && end < rate);

        let observed = source.pred_obs_event_rate(middle).unwrap();
        assert!(observed > 0.0 && observed < rate);

        // A site 1 km off the trace picks the same ruptures as the trace point.
        let beside = source.pred_event_rate(DVec2::new(1.0, 50.0)).unwrap();
        assert!((beside - rate).abs() <= 1e-12 * rate);

        let slip = source.pred_slip_rate(middle).unwrap();
        let along = source.slip_rate_along_strike();
        assert!(slip > 0.0);
        assert!((slip - along[50]).abs() <= 1e-9 * slip);

        assert!(matches!(
            source.pred_event_rate(DVec2::new(5.0, 50.0)),
            Err(QuakeError::OffFault { .. })
        ));
        assert!((source.min_distance(DVec2::new(3.0, 50.0)).unwrap() - 3.0).abs() < 1e-9);
        assert!((source.min_distance(DVec2::new(0.0, -4.0)).unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_area_fault() {
        let flat = FaultSection {
            upper_depth: 5.0,
            lower_depth: 5.0,
            ..create_test_section("flat", 0.0, 20.0, 10.0)
        };
        let mut source = FaultSource::new("flat", vec![vec![flat.clone()]], SourceConfig::default());
        source.rebuild().unwrap();
        assert_eq!(source.num_ruptures(), 0);
        assert!(source.source_mag().is_none());

        let fixed = SourceConfig {
            mfd: MfdConfig::default().with_fixed_characteristic(6.8, 0.01),
            ..Default::default()
        };
        let mut source = FaultSource::new("flat", vec![vec![flat]], fixed);
        assert!(matches!(source.rebuild(), Err(QuakeError::Configuration(_))));
    }

    #[test]
    fn test_segment_diagnostics() {
        let mut source = FaultSource::new(
            "two segments",
            vec![
                vec![create_test_section("north", 0.0, 50.0, 10.0)],
                vec![create_test_section("south", 50.0, 100.0, 10.0)],
            ],
            SourceConfig::default(),
        );
        source.rebuild().unwrap();

        let north = source.segment_rate(0).unwrap();
        let south = source.segment_rate(1).unwrap();
        assert!((north - south).abs() / north < 1e-9);
        assert!(north <= source.mag_freq_dist().unwrap().total_rate());
        assert!(source.segment_rate(2).is_err());

        let slip = source.final_ave_segment_slip_rate(0).unwrap();
        assert!(slip > 0.0);

        let all = source.segment_slip_distribution(0).unwrap();
        let visible = source.segment_visible_slip_distribution(0).unwrap();
        assert_eq!(all.len(), visible.len());
        for ((s, r), (vs, vr)) in all.iter().zip(&visible) {
            assert_eq!(s, vs);
            assert!(*vr > 0.0 && vr < r);
        }
        assert!(source.segment_visible_slip_distribution(2).is_err());
        let residuals = source.normalized_slip_rate_residuals().unwrap();
        assert_eq!(residuals.len(), 2);
        assert!(residuals.iter().all(Option::is_some));

        let cols = source.surface().unwrap().num_cols();
        let along = source.slip_rate_along_strike();
        assert_eq!(along.len(), cols);
        assert!(along[cols / 2] > 0.0);
        let original = source.original_slip_rate_along_strike();
        assert!(original.iter().all(|v| (v - 10.0).abs() < 1e-9));

        let visible = source.visible_mag_freq_dist().unwrap();
        assert!(visible.total_rate() < source.mag_freq_dist().unwrap().total_rate());
    }
}
