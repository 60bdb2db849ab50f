//! Writes a synthetic data directory for the dashboard: one environment CSV
//! per school (NFD file names, as copied off a macOS volume) and the growth
//! workbook with one sheet per school plus a notes sheet.
//!
//! Usage: `generate_sample [OUT_DIR]` (defaults to `./data`).

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook};
use unicode_normalization::UnicodeNormalization;

const ENV_SUFFIX: &str = "_환경데이터.csv";
const WORKBOOK: &str = "4개교_생육결과데이터.xlsx";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Readings every ten minutes for three days.
const READINGS: usize = 3 * 24 * 6;
const READING_STEP_MINUTES: i64 = 10;

struct School {
    name: &'static str,
    target_ec: f64,
    samples: usize,
    base_temperature: f64,
    base_humidity: f64,
    base_ph: f64,
}

const SCHOOLS: [School; 4] = [
    School { name: "송도고", target_ec: 1.0, samples: 29, base_temperature: 15.8, base_humidity: 72.0, base_ph: 6.3 },
    School { name: "하늘고", target_ec: 2.0, samples: 45, base_temperature: 14.2, base_humidity: 65.0, base_ph: 6.1 },
    School { name: "아라고", target_ec: 4.0, samples: 106, base_temperature: 13.5, base_humidity: 58.0, base_ph: 5.9 },
    School { name: "동산고", target_ec: 8.0, samples: 58, base_temperature: 16.4, base_humidity: 61.0, base_ph: 5.6 },
];

/// Deterministic generator (splitmix64) so repeated runs produce identical files.
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Normal deviate via Box-Muller.
    fn normal(&mut self, mean: f64, sd: f64) -> f64 {
        let u1 = self.uniform().max(f64::MIN_POSITIVE);
        let u2 = self.uniform();
        mean + sd * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

/// Growth response peaks at EC 2.0 and falls off on a log scale.
fn growth_factor(target_ec: f64) -> f64 {
    let d = (target_ec / 2.0).log2();
    (-d * d / 2.0).exp()
}

fn write_environment(dir: &Path, school: &School, start: NaiveDateTime, rng: &mut Rng) -> Result<PathBuf> {
    let file_name: String = format!("{}{}", school.name, ENV_SUFFIX).nfd().collect();
    let path = dir.join(file_name);

    let mut file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    file.write_all(UTF8_BOM)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(["time", "temperature", "humidity", "ph", "ec"])?;

    for i in 0..READINGS {
        let time = start + Duration::minutes(i as i64 * READING_STEP_MINUTES);
        let day_phase = (i % (24 * 6)) as f64 / (24.0 * 6.0) * std::f64::consts::TAU;
        let temperature = school.base_temperature + 2.5 * day_phase.sin() + rng.normal(0.0, 0.3);
        let humidity = (school.base_humidity - 6.0 * day_phase.sin() + rng.normal(0.0, 1.5)).clamp(0.0, 100.0);
        let ph = school.base_ph + rng.normal(0.0, 0.08);
        let ec = (school.target_ec * rng.normal(1.0, 0.05)).max(0.0);
        writer.write_record([
            time.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{temperature:.2}"),
            format!("{humidity:.1}"),
            format!("{ph:.2}"),
            format!("{ec:.3}"),
        ])?;
    }
    writer.flush()?;
    Ok(path)
}

fn write_growth(dir: &Path, rng: &mut Rng) -> Result<PathBuf> {
    let path = dir.join(WORKBOOK);
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let headers = ["개체번호", "잎 수(장)", "지상부 길이(mm)", "지하부길이(mm)", "생중량(g)"];

    for school in &SCHOOLS {
        let factor = growth_factor(school.target_ec);
        let sheet = workbook.add_worksheet();
        sheet.set_name(school.name)?;
        for (col, h) in headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *h, &bold)?;
        }
        for i in 0..school.samples {
            let row = i as u32 + 1;
            let weight = (0.4 + 2.6 * factor + rng.normal(0.0, 0.35)).max(0.05);
            let leaves = (4.0 + 3.0 * weight + rng.normal(0.0, 1.0)).round().max(1.0);
            let shoot = (40.0 + 55.0 * factor + rng.normal(0.0, 8.0)).max(5.0);
            let root = (60.0 + 40.0 * factor + rng.normal(0.0, 12.0)).max(5.0);
            sheet.write_number(row, 0, f64::from(row))?;
            sheet.write_number(row, 1, leaves)?;
            sheet.write_number(row, 2, (shoot * 10.0).round() / 10.0)?;
            sheet.write_number(row, 3, (root * 10.0).round() / 10.0)?;
            sheet.write_number(row, 4, (weight * 1000.0).round() / 1000.0)?;
        }
    }

    // A sheet that matches no school; the dashboard ignores it.
    let notes = workbook.add_worksheet();
    notes.set_name("메모")?;
    notes.write_string(0, 0, "합성 데이터 (generate_sample)")?;

    workbook.save(&path).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn main() -> Result<()> {
    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let start = NaiveDate::from_ymd_opt(2025, 5, 26)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start timestamp")?;
    let mut rng = Rng(42);

    for school in &SCHOOLS {
        let path = write_environment(&out_dir, school, start, &mut rng)?;
        println!("Wrote {} readings to {}", READINGS, path.display());
    }
    let path = write_growth(&out_dir, &mut rng)?;
    let total: usize = SCHOOLS.iter().map(|s| s.samples).sum();
    println!("Wrote {total} specimens to {}", path.display());

    Ok(())
}
