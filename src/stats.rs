//! Per-school summaries and cross-school statistics.
//!
//! Everything here is pure: callers pass in loaded records and get numbers
//! back. A value that cannot be computed (no records, zero variance) is
//! `None` or [`StatisticUndefined`], never `0.0` or `NaN`.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use crate::config::StudyConfig;
use crate::data::model::{BySchool, EnvironmentRecord, GrowthRecord};

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum StatisticUndefined {
    #[error("series have different lengths ({0} vs {1})")]
    LengthMismatch(usize, usize),
    #[error("need at least two points, got {0}")]
    TooFewPoints(usize),
    #[error("a series has zero variance")]
    ZeroVariance,
}

/// Arithmetic mean; `None` for an empty input.
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Pearson correlation coefficient of two equally long series.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Result<f64, StatisticUndefined> {
    if xs.len() != ys.len() {
        return Err(StatisticUndefined::LengthMismatch(xs.len(), ys.len()));
    }
    let n = xs.len();
    let (Some(mx), Some(my)) = (mean(xs.iter().copied()), mean(ys.iter().copied())) else {
        return Err(StatisticUndefined::TooFewPoints(n));
    };
    if n < 2 {
        return Err(StatisticUndefined::TooFewPoints(n));
    }

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if is_constant(xs, mx) || is_constant(ys, my) {
        return Err(StatisticUndefined::ZeroVariance);
    }
    Ok((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Relative spread below which a series counts as constant. Means of equal
/// readings over different row counts differ by a few ULPs.
const CONSTANT_TOLERANCE: f64 = 1e-12;

fn is_constant(values: &[f64], mean: f64) -> bool {
    let scale = mean.abs().max(1.0);
    values
        .iter()
        .all(|v| (v - mean).abs() <= CONSTANT_TOLERANCE * scale)
}

/// Index of the largest defined value. Ties go to the lowest index.
pub fn best_index(values: &[Option<f64>]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().enumerate() {
        let Some(v) = *v else { continue };
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// SchoolStats
// ---------------------------------------------------------------------------

/// Means of every measured quantity for one school.
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolStats {
    pub school: String,
    pub target_ec: f64,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub ph: Option<f64>,
    pub measured_ec: Option<f64>,
    pub weight: Option<f64>,
    pub leaf_count: Option<f64>,
    pub shoot_length: Option<f64>,
    pub root_length: Option<f64>,
    pub env_rows: usize,
    /// Number of growth records.
    pub sample_count: usize,
    pub expected_samples: Option<usize>,
}

impl SchoolStats {
    fn compute(
        school: &str,
        target_ec: f64,
        env: &[EnvironmentRecord],
        growth: &[GrowthRecord],
    ) -> Self {
        Self {
            school: school.to_string(),
            target_ec,
            temperature: mean(env.iter().map(|r| r.temperature)),
            humidity: mean(env.iter().map(|r| r.humidity)),
            ph: mean(env.iter().map(|r| r.ph)),
            measured_ec: mean(env.iter().map(|r| r.ec)),
            weight: mean(growth.iter().map(|r| r.weight)),
            leaf_count: mean(growth.iter().map(|r| f64::from(r.leaf_count))),
            shoot_length: mean(growth.iter().map(|r| r.shoot_length)),
            root_length: mean(growth.iter().map(|r| r.root_length)),
            env_rows: env.len(),
            sample_count: growth.len(),
            expected_samples: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Metric – a named per-school scalar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    Humidity,
    Ph,
    MeasuredEc,
    TargetEc,
    Weight,
    LeafCount,
    ShootLength,
    RootLength,
}

impl Metric {
    pub fn label(self) -> &'static str {
        match self {
            Self::Temperature => "온도 (℃)",
            Self::Humidity => "습도 (%)",
            Self::Ph => "pH",
            Self::MeasuredEc => "실측 EC (dS/m)",
            Self::TargetEc => "목표 EC (dS/m)",
            Self::Weight => "생중량 (g)",
            Self::LeafCount => "잎 수 (장)",
            Self::ShootLength => "지상부 길이 (mm)",
            Self::RootLength => "지하부 길이 (mm)",
        }
    }

    pub fn value(self, stats: &SchoolStats) -> Option<f64> {
        match self {
            Self::Temperature => stats.temperature,
            Self::Humidity => stats.humidity,
            Self::Ph => stats.ph,
            Self::MeasuredEc => stats.measured_ec,
            Self::TargetEc => Some(stats.target_ec),
            Self::Weight => stats.weight,
            Self::LeafCount => stats.leaf_count,
            Self::ShootLength => stats.shoot_length,
            Self::RootLength => stats.root_length,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// StudySummary
// ---------------------------------------------------------------------------

/// Means over every loaded row, regardless of school.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverallMeans {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub ph: Option<f64>,
    pub measured_ec: Option<f64>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudySummary {
    /// One entry per configured school, in configuration order.
    pub schools: Vec<SchoolStats>,
    pub overall: OverallMeans,
    pub total_samples: usize,
    /// Index into `schools` of the highest mean weight.
    pub best: Option<usize>,
}

impl StudySummary {
    pub fn best_school(&self) -> Option<&SchoolStats> {
        self.best.map(|i| &self.schools[i])
    }

    /// Correlate two metrics across the schools where both are defined.
    pub fn correlate(&self, x: Metric, y: Metric) -> Result<f64, StatisticUndefined> {
        let (xs, ys): (Vec<f64>, Vec<f64>) = self
            .schools
            .iter()
            .filter_map(|s| Some((x.value(s)?, y.value(s)?)))
            .unzip();
        pearson(&xs, &ys)
    }

    /// `(school, expected, actual)` for every school whose growth sample
    /// count differs from its configured expectation.
    pub fn sample_mismatches(&self) -> Vec<(&str, usize, usize)> {
        self.schools
            .iter()
            .filter_map(|s| {
                let expected = s.expected_samples?;
                (expected != s.sample_count).then_some((s.school.as_str(), expected, s.sample_count))
            })
            .collect()
    }
}

/// Summarize loaded records. Schools missing from either map still get an
/// entry with undefined means.
pub fn summarize(
    config: &StudyConfig,
    env: &BySchool<EnvironmentRecord>,
    growth: &BySchool<GrowthRecord>,
) -> StudySummary {
    let schools: Vec<SchoolStats> = config
        .schools()
        .iter()
        .map(|profile| {
            let e = env.get(&profile.name).map(Vec::as_slice).unwrap_or_default();
            let g = growth.get(&profile.name).map(Vec::as_slice).unwrap_or_default();
            SchoolStats {
                expected_samples: profile.expected_samples,
                ..SchoolStats::compute(&profile.name, profile.target_ec, e, g)
            }
        })
        .collect();

    let all_env = || env.values().flatten();
    let all_growth = || growth.values().flatten();
    let overall = OverallMeans {
        temperature: mean(all_env().map(|r| r.temperature)),
        humidity: mean(all_env().map(|r| r.humidity)),
        ph: mean(all_env().map(|r| r.ph)),
        measured_ec: mean(all_env().map(|r| r.ec)),
        weight: mean(all_growth().map(|r| r.weight)),
    };

    let weights: Vec<Option<f64>> = schools.iter().map(|s| s.weight).collect();
    StudySummary {
        total_samples: schools.iter().map(|s| s.sample_count).sum(),
        best: best_index(&weights),
        schools,
        overall,
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    /// 1-based; schools without a mean weight are unranked.
    pub rank: Option<usize>,
    pub school: String,
    pub target_ec: f64,
    pub ph: Option<f64>,
    pub weight: Option<f64>,
}

/// Schools ordered by mean weight, heaviest first. Ties keep configuration
/// order; schools without growth data come last.
pub fn ranked(summary: &StudySummary) -> Vec<RankedRow> {
    let mut order: Vec<&SchoolStats> = summary.schools.iter().collect();
    order.sort_by(|a, b| match (a.weight, b.weight) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    order
        .into_iter()
        .enumerate()
        .map(|(i, s)| RankedRow {
            rank: s.weight.map(|_| i + 1),
            school: s.school.clone(),
            target_ec: s.target_ec,
            ph: s.ph,
            weight: s.weight,
        })
        .collect()
}
