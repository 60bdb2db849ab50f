use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};

use super::error::LoadError;
use super::locate::{assign_school, nfc, FileLocator, MatchStrategy};
use super::model::{BySchool, GrowthRecord, RowReport};
use crate::config::{SchoolProfile, StudyConfig};

/// Header written for each growth column; also the first accepted alias.
pub const LEAF_HEADER: &str = "잎 수(장)";
pub const SHOOT_HEADER: &str = "지상부 길이(mm)";
pub const ROOT_HEADER: &str = "지하부길이(mm)";
pub const WEIGHT_HEADER: &str = "생중량(g)";

// Aliases are compared after `header_key`.
const WEIGHT_ALIASES: [&str; 4] = ["생중량(g)", "생중량", "weight", "weight(g)"];
const LEAF_ALIASES: [&str; 4] = ["잎수(장)", "잎수", "leafcount", "leaves"];
const SHOOT_ALIASES: [&str; 4] = ["지상부길이(mm)", "지상부길이", "shootlength", "shootlength(mm)"];
const ROOT_ALIASES: [&str; 4] = ["지하부길이(mm)", "지하부길이", "rootlength", "rootlength(mm)"];

/// Growth measurements for every school whose sheet loaded.
#[derive(Debug, Default)]
pub struct GrowthLoad {
    pub records: BySchool<GrowthRecord>,
    pub reports: BTreeMap<String, RowReport>,
    pub failures: BTreeMap<String, LoadError>,
    /// Sheets that matched no school, or a school already claimed by an
    /// earlier sheet.
    pub ignored_sheets: Vec<String>,
}

/// Load the growth workbook and parse one sheet per configured school.
///
/// A missing or unreadable workbook is a hard error. Sheets that match no
/// school are skipped; schools without a sheet are recorded in `failures`.
pub fn load_growth(config: &StudyConfig) -> Result<GrowthLoad, LoadError> {
    let path = FileLocator::new(&config.data_dir)
        .with_strategies(&MatchStrategy::EXACT)
        .find(&config.growth_workbook)?
        .ok_or_else(|| LoadError::WorkbookNotFound(config.growth_workbook.clone()))?;

    let mut workbook = open_workbook_auto(&path).map_err(|e| LoadError::Workbook {
        path: path.clone(),
        message: e.to_string(),
    })?;

    let schools = config.schools();
    let mut load = GrowthLoad::default();
    let mut claimed = BTreeSet::new();

    for sheet in workbook.sheet_names() {
        let Some(i) = assign_school(&sheet, schools) else {
            log::info!("Ignoring sheet '{sheet}': no matching school");
            load.ignored_sheets.push(sheet);
            continue;
        };
        let school = &schools[i];
        if !claimed.insert(i) {
            log::warn!("Ignoring sheet '{sheet}': {} already has a sheet", school.name);
            load.ignored_sheets.push(sheet);
            continue;
        }

        let result = workbook
            .worksheet_range(&sheet)
            .map_err(|e| LoadError::Workbook {
                path: path.clone(),
                message: format!("sheet '{sheet}': {e}"),
            })
            .and_then(|range| parse_growth_sheet(&range, school, &path));

        match result {
            Ok((records, report)) => {
                log::info!("{} (sheet '{sheet}'): {report}", school.name);
                load.records.insert(school.name.clone(), records);
                load.reports.insert(school.name.clone(), report);
            }
            Err(e) => {
                log::warn!("Growth data unavailable: {e}");
                load.failures.insert(school.name.clone(), e);
            }
        }
    }

    for (i, school) in schools.iter().enumerate() {
        if !claimed.contains(&i) {
            let e = LoadError::FileNotFound {
                school: school.name.clone(),
                expected: format!("sheet '{}' in {}", school.name, config.growth_workbook),
            };
            log::warn!("Growth data unavailable: {e}");
            load.failures.insert(school.name.clone(), e);
        }
    }

    Ok(load)
}

/// Parse one school's sheet. The first row is the header.
pub fn parse_growth_sheet(
    range: &Range<Data>,
    school: &SchoolProfile,
    path: &Path,
) -> Result<(Vec<GrowthRecord>, RowReport), LoadError> {
    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|cells| cells.iter().map(|c| header_key(&c.to_string())).collect())
        .unwrap_or_default();

    let column = |aliases: &[&str], name: &str| {
        header
            .iter()
            .position(|h| aliases.contains(&h.as_str()))
            .ok_or_else(|| LoadError::MissingColumn {
                school: school.name.clone(),
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let weight_idx = column(&WEIGHT_ALIASES, WEIGHT_HEADER)?;
    let leaf_idx = column(&LEAF_ALIASES, LEAF_HEADER)?;
    let shoot_idx = column(&SHOOT_ALIASES, SHOOT_HEADER)?;
    let root_idx = column(&ROOT_ALIASES, ROOT_HEADER)?;

    let mut records = Vec::new();
    let mut report = RowReport::default();

    for cells in rows {
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        report.total += 1;

        let measure = |i: usize| cells.get(i).and_then(cell_measure);
        let leaf_count = measure(leaf_idx)
            .filter(|v| v.fract() == 0.0 && *v <= f64::from(u32::MAX))
            .map(|v| v as u32);

        match (measure(weight_idx), leaf_count, measure(shoot_idx), measure(root_idx)) {
            (Some(weight), Some(leaf_count), Some(shoot_length), Some(root_length)) => {
                records.push(GrowthRecord {
                    weight,
                    leaf_count,
                    shoot_length,
                    root_length,
                    school: school.name.clone(),
                    target_ec: school.target_ec,
                });
                report.kept += 1;
            }
            _ => report.bad_values += 1,
        }
    }

    if report.kept == 0 {
        return Err(LoadError::NoValidRows {
            school: school.name.clone(),
            path: path.to_path_buf(),
            total: report.total,
        });
    }
    Ok((records, report))
}

/// NFC, no whitespace, lowercase: "잎 수(장)" and "잎수(장)" compare equal.
fn header_key(s: &str) -> String {
    nfc(s)
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// A finite, non-negative measurement from a number or numeric text cell.
fn cell_measure(cell: &Data) -> Option<f64> {
    let value = match cell {
        Data::Float(v) => Some(*v),
        Data::Int(v) => Some(*v as f64),
        Data::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::locate::nfd;
    use crate::data::test_utils::{write_growth_workbook, GrowthRow};
    use rust_xlsxwriter::Workbook;

    fn rows(weights: &[f64]) -> Vec<GrowthRow> {
        weights
            .iter()
            .enumerate()
            .map(|(i, &w)| GrowthRow::new(5.0 + i as f64, 40.0, 60.0, w))
            .collect()
    }

    #[test]
    fn loads_matching_sheets_and_ignores_others() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StudyConfig::study_default(tmp.path());
        write_growth_workbook(
            &tmp.path().join(&config.growth_workbook),
            &[
                ("송도고", rows(&[1.0, 2.0])),
                (nfd("하늘고").as_str(), rows(&[3.0])),
                ("아라고", rows(&[0.5, 0.7, 0.9])),
                ("동산고", rows(&[2.5])),
                ("메모", rows(&[9.9])),
            ],
        );

        let load = load_growth(&config).unwrap();
        assert!(load.failures.is_empty(), "{:?}", load.failures);
        assert_eq!(load.ignored_sheets, vec!["메모".to_string()]);
        assert_eq!(load.records["아라고"].len(), 3);

        let sky = &load.records["하늘고"][0];
        assert_eq!(sky.school, "하늘고");
        assert_eq!(sky.target_ec, 2.0);
        assert_eq!(sky.weight, 3.0);
        assert_eq!(sky.leaf_count, 5);
    }

    #[test]
    fn missing_sheet_is_partial_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StudyConfig::study_default(tmp.path());
        write_growth_workbook(
            &tmp.path().join(&config.growth_workbook),
            &[("송도고", rows(&[1.0])), ("하늘고", rows(&[1.0])), ("아라고", rows(&[1.0]))],
        );

        let load = load_growth(&config).unwrap();
        assert_eq!(load.records.len(), 3);
        assert!(matches!(
            load.failures.get("동산고"),
            Some(LoadError::FileNotFound { .. })
        ));
    }

    #[test]
    fn duplicate_sheet_first_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StudyConfig::study_default(tmp.path());
        write_growth_workbook(
            &tmp.path().join(&config.growth_workbook),
            &[
                ("송도고", rows(&[1.0])),
                ("송도고 재측정", rows(&[7.0, 7.0])),
                ("하늘고", rows(&[1.0])),
                ("아라고", rows(&[1.0])),
                ("동산고", rows(&[1.0])),
            ],
        );
        let load = load_growth(&config).unwrap();
        assert_eq!(load.records["송도고"].len(), 1);
        assert_eq!(load.ignored_sheets, vec!["송도고 재측정".to_string()]);
    }

    #[test]
    fn missing_workbook_is_total_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StudyConfig::study_default(tmp.path());
        assert!(matches!(load_growth(&config), Err(LoadError::WorkbookNotFound(_))));

        let config = StudyConfig::study_default(tmp.path().join("gone"));
        assert!(matches!(load_growth(&config), Err(LoadError::DirectoryNotFound(_))));
    }

    #[test]
    fn unreadable_workbook_is_total_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StudyConfig::study_default(tmp.path());
        std::fs::write(tmp.path().join(&config.growth_workbook), b"not a zip").unwrap();
        assert!(matches!(load_growth(&config), Err(LoadError::Workbook { .. })));
    }

    #[test]
    fn invalid_rows_are_counted() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sheet.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("동산고").unwrap();
        for (c, h) in ["Weight (g)", "Leaves", "Shoot Length", "Root Length"].iter().enumerate() {
            sheet.write_string(0, c as u16, *h).unwrap();
        }
        // valid, numeric text
        sheet.write_string(1, 0, "2.5").unwrap();
        sheet.write_number(1, 1, 6).unwrap();
        sheet.write_number(1, 2, 55.0).unwrap();
        sheet.write_number(1, 3, 80.0).unwrap();
        // fractional leaf count
        sheet.write_number(2, 0, 1.5).unwrap();
        sheet.write_number(2, 1, 6.5).unwrap();
        sheet.write_number(2, 2, 50.0).unwrap();
        sheet.write_number(2, 3, 70.0).unwrap();
        // negative weight
        sheet.write_number(3, 0, -1.0).unwrap();
        sheet.write_number(3, 1, 4).unwrap();
        sheet.write_number(3, 2, 50.0).unwrap();
        sheet.write_number(3, 3, 70.0).unwrap();
        workbook.save(&path).unwrap();

        let mut book = open_workbook_auto(&path).unwrap();
        let range = book.worksheet_range("동산고").unwrap();
        let school = SchoolProfile::new("동산고", 8.0, "#d62728");
        let (records, report) = parse_growth_sheet(&range, &school, &path).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.kept, 1);
        assert_eq!(report.bad_values, 2);
        assert_eq!(records[0].weight, 2.5);
        assert_eq!(records[0].leaf_count, 6);
        assert_eq!(records[0].target_ec, 8.0);
    }

    #[test]
    fn header_keys_ignore_spacing_and_case() {
        assert_eq!(header_key("잎 수(장)"), "잎수(장)");
        assert_eq!(header_key(&nfd("지상부 길이(mm)")), "지상부길이(mm)");
        assert_eq!(header_key("Shoot Length"), "shootlength");
    }
}
