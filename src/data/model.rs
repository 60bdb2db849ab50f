use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// EnvironmentRecord – one sensor reading
// ---------------------------------------------------------------------------

/// A single row of a school's sensor log.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentRecord {
    pub time: NaiveDateTime,
    /// Air temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    pub ph: f64,
    /// Measured EC in dS/m (may drift from the school's target).
    pub ec: f64,
    pub school: String,
}

// ---------------------------------------------------------------------------
// GrowthRecord – one specimen
// ---------------------------------------------------------------------------

/// One plant specimen measured at harvest.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthRecord {
    /// Fresh biomass weight in g.
    pub weight: f64,
    pub leaf_count: u32,
    /// Shoot length in mm.
    pub shoot_length: f64,
    /// Root length in mm.
    pub root_length: f64,
    pub school: String,
    /// Copy of the school's target EC.
    pub target_ec: f64,
}

// ---------------------------------------------------------------------------
// RowReport – what happened to the rows of one source
// ---------------------------------------------------------------------------

/// Row accounting for one parsed source. `kept + dropped() == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowReport {
    pub total: usize,
    pub kept: usize,
    pub bad_timestamps: usize,
    pub bad_values: usize,
}

impl RowReport {
    pub fn dropped(&self) -> usize {
        self.bad_timestamps + self.bad_values
    }
}

impl fmt::Display for RowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} rows kept", self.kept, self.total)?;
        if self.bad_timestamps > 0 {
            write!(f, ", {} bad timestamps", self.bad_timestamps)?;
        }
        if self.bad_values > 0 {
            write!(f, ", {} bad values", self.bad_values)?;
        }
        Ok(())
    }
}

/// Records grouped by school name.
pub type BySchool<T> = BTreeMap<String, Vec<T>>;
