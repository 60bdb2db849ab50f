//! Fixtures shared by the data-layer tests.

use std::path::Path;

use rust_xlsxwriter::Workbook;

use super::growth::{LEAF_HEADER, ROOT_HEADER, SHOOT_HEADER, WEIGHT_HEADER};
use crate::config::StudyConfig;

pub struct GrowthRow {
    pub leaves: f64,
    pub shoot: f64,
    pub root: f64,
    pub weight: f64,
}

impl GrowthRow {
    pub fn new(leaves: f64, shoot: f64, root: f64, weight: f64) -> Self {
        Self {
            leaves,
            shoot,
            root,
            weight,
        }
    }
}

/// Write a workbook with one sheet per `(name, rows)` pair, laid out like the
/// study's growth workbook (specimen number first, weight last).
pub fn write_growth_workbook(path: &Path, sheets: &[(&str, Vec<GrowthRow>)]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        let headers = ["개체번호", LEAF_HEADER, SHOOT_HEADER, ROOT_HEADER, WEIGHT_HEADER];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        for (i, row) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_number(r, 0, r).unwrap();
            sheet.write_number(r, 1, row.leaves).unwrap();
            sheet.write_number(r, 2, row.shoot).unwrap();
            sheet.write_number(r, 3, row.root).unwrap();
            sheet.write_number(r, 4, row.weight).unwrap();
        }
    }
    workbook.save(path).unwrap();
}

/// Populate `dir` with a complete four-school dataset.
///
/// School `i` (config order) gets two sensor rows with pH `6.0 + i / 10` and
/// growth rows with the given weights.
pub fn write_study(dir: &Path, weights: [&[f64]; 4]) -> StudyConfig {
    let config = StudyConfig::study_default(dir);
    let mut sheets = Vec::new();
    for (i, school) in config.schools().iter().enumerate() {
        let ph = 6.0 + i as f64 / 10.0;
        let body = format!(
            "time,temperature,humidity,ph,ec\n\
             2025-05-26 09:00:00,{t0},70.0,{ph},{ec}\n\
             2025-05-26 10:00:00,{t1},72.0,{ph},{ec}\n",
            t0 = 14.0 + i as f64,
            t1 = 16.0 + i as f64,
            ec = school.target_ec + 0.1,
        );
        std::fs::write(
            dir.join(school.environment_file(&config.env_file_suffix)),
            body,
        )
        .unwrap();

        let rows = weights[i]
            .iter()
            .map(|&w| GrowthRow::new(6.0, 50.0 + w, 80.0, w))
            .collect();
        sheets.push((school.name.as_str(), rows));
    }
    write_growth_workbook(&dir.join(&config.growth_workbook), &sheets);
    config
}
