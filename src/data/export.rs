use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;

use super::environment::UTF8_BOM;
use super::growth::{LEAF_HEADER, ROOT_HEADER, SHOOT_HEADER, WEIGHT_HEADER};
use super::model::{EnvironmentRecord, GrowthRecord};
use crate::stats::RankedRow;

/// Timestamp layout written to exported CSVs; read back by the loader.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub const ENVIRONMENT_CSV_NAME: &str = "환경데이터_전체.csv";
pub const GROWTH_XLSX_NAME: &str = "생육결과_전체.xlsx";
pub const SUMMARY_XLSX_NAME: &str = "학교별_요약.xlsx";

const ENVIRONMENT_COLUMNS: [&str; 6] = ["time", "temperature", "humidity", "ph", "ec", "school"];
const GROWTH_SHEET: &str = "생육결과";
const SCHOOL_HEADER: &str = "학교";
const EC_HEADER: &str = "EC";
const SUMMARY_SHEET: &str = "요약";

#[derive(Serialize)]
struct EnvironmentRow<'a> {
    time: String,
    temperature: f64,
    humidity: f64,
    ph: f64,
    ec: f64,
    school: &'a str,
}

/// Combined sensor table as UTF-8 CSV with a BOM, so spreadsheet programs
/// pick the right encoding for the Korean school names.
pub fn environment_csv(records: &[EnvironmentRecord]) -> Result<Vec<u8>> {
    let mut out = UTF8_BOM.to_vec();
    {
        // Header written by hand so an empty export still has one.
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut out);
        writer
            .write_record(ENVIRONMENT_COLUMNS)
            .context("writing environment header")?;
        for r in records {
            writer
                .serialize(EnvironmentRow {
                    time: r.time.format(TIME_FORMAT).to_string(),
                    temperature: r.temperature,
                    humidity: r.humidity,
                    ph: r.ph,
                    ec: r.ec,
                    school: &r.school,
                })
                .context("writing environment row")?;
        }
        writer.flush().context("flushing environment CSV")?;
    }
    Ok(out)
}

/// Combined growth table as an xlsx workbook with a single sheet.
pub fn growth_workbook(records: &[GrowthRecord]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(GROWTH_SHEET)?;
    write_header(
        sheet,
        &[LEAF_HEADER, SHOOT_HEADER, ROOT_HEADER, WEIGHT_HEADER, SCHOOL_HEADER, EC_HEADER],
    )?;

    for (i, r) in records.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number(row, 0, r.leaf_count)?;
        sheet.write_number(row, 1, r.shoot_length)?;
        sheet.write_number(row, 2, r.root_length)?;
        sheet.write_number(row, 3, r.weight)?;
        sheet.write_string(row, 4, &r.school)?;
        sheet.write_number(row, 5, r.target_ec)?;
    }

    workbook.save_to_buffer().context("serializing growth workbook")
}

/// Ranked per-school summary. Undefined means are left blank.
pub fn summary_workbook(rows: &[RankedRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SUMMARY_SHEET)?;
    write_header(sheet, &[SCHOOL_HEADER, EC_HEADER, "pH", WEIGHT_HEADER, "순위"])?;

    for (i, r) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &r.school)?;
        sheet.write_number(row, 1, r.target_ec)?;
        if let Some(ph) = r.ph {
            sheet.write_number(row, 2, ph)?;
        }
        if let Some(weight) = r.weight {
            sheet.write_number(row, 3, weight)?;
        }
        if let Some(rank) = r.rank {
            sheet.write_number(row, 4, rank as f64)?;
        }
    }

    workbook.save_to_buffer().context("serializing summary workbook")
}

fn write_header(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    let bold = Format::new().set_bold();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    Ok(())
}

/// Write exported bytes to `path`.
pub fn save(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchoolProfile;
    use crate::data::environment::parse_environment;
    use crate::data::growth::parse_growth_sheet;
    use calamine::{open_workbook_auto, Data, Reader};
    use chrono::NaiveDate;

    fn readings() -> Vec<EnvironmentRecord> {
        let day = NaiveDate::from_ymd_opt(2025, 5, 26).unwrap();
        vec![
            EnvironmentRecord {
                time: day.and_hms_milli_opt(9, 0, 0, 250).unwrap(),
                temperature: 14.25,
                humidity: 71.0,
                ph: 6.1,
                ec: 1.05,
                school: "송도고".to_string(),
            },
            EnvironmentRecord {
                time: day.and_hms_opt(10, 30, 0).unwrap(),
                temperature: -0.1,
                humidity: 68.333333333333,
                ph: 5.9,
                ec: 7.8,
                school: "동산고".to_string(),
            },
        ]
    }

    #[test]
    fn environment_csv_has_bom_and_round_trips() {
        let records = readings();
        let bytes = environment_csv(&records).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let (parsed, report) = parse_environment(&bytes, "", Path::new(ENVIRONMENT_CSV_NAME)).unwrap();
        assert_eq!(report.total, records.len());
        assert_eq!(parsed.len(), records.len());
        for (back, orig) in parsed.iter().zip(&records) {
            assert_eq!(
                EnvironmentRecord {
                    school: orig.school.clone(),
                    ..back.clone()
                },
                *orig
            );
        }

        // The loader takes the school from its caller, so check the column directly.
        let mut reader = csv::Reader::from_reader(&bytes[UTF8_BOM.len()..]);
        let school_idx = reader
            .headers()
            .unwrap()
            .iter()
            .position(|h| h == "school")
            .unwrap();
        let schools: Vec<String> = reader
            .records()
            .map(|row| row.unwrap()[school_idx].to_string())
            .collect();
        assert_eq!(schools, ["송도고", "동산고"]);
    }

    #[test]
    fn empty_environment_export_keeps_header() {
        let bytes = environment_csv(&[]).unwrap();
        let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
        assert_eq!(text, "time,temperature,humidity,ph,ec,school\n");
    }

    #[test]
    fn growth_workbook_is_readable_by_loader() {
        let school = SchoolProfile::new("아라고", 4.0, "#ff7f0e");
        let records = vec![
            GrowthRecord {
                weight: 1.75,
                leaf_count: 7,
                shoot_length: 42.0,
                root_length: 88.5,
                school: school.name.clone(),
                target_ec: 4.0,
            },
            GrowthRecord {
                weight: 0.0,
                leaf_count: 0,
                shoot_length: 12.0,
                root_length: 20.0,
                school: school.name.clone(),
                target_ec: 4.0,
            },
        ];

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(GROWTH_XLSX_NAME);
        save(&path, &growth_workbook(&records).unwrap()).unwrap();

        let mut book = open_workbook_auto(&path).unwrap();
        assert_eq!(book.sheet_names(), vec![GROWTH_SHEET.to_string()]);
        let range = book.worksheet_range(GROWTH_SHEET).unwrap();
        let header: Vec<String> = range.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(header[4..], [SCHOOL_HEADER, EC_HEADER]);
        assert_eq!(range.get_value((1, 4)), Some(&Data::String("아라고".to_string())));
        let (parsed, report) = parse_growth_sheet(&range, &school, &path).unwrap();
        assert_eq!(report.kept, 2);
        assert_eq!(parsed, records);
    }

    #[test]
    fn summary_leaves_undefined_cells_blank() {
        let rows = vec![
            RankedRow {
                rank: Some(1),
                school: "하늘고".to_string(),
                target_ec: 2.0,
                ph: Some(6.2),
                weight: Some(3.4),
            },
            RankedRow {
                rank: None,
                school: "아라고".to_string(),
                target_ec: 4.0,
                ph: None,
                weight: None,
            },
        ];

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(SUMMARY_XLSX_NAME);
        save(&path, &summary_workbook(&rows).unwrap()).unwrap();

        let mut book = open_workbook_auto(&path).unwrap();
        let range = book.worksheet_range(SUMMARY_SHEET).unwrap();
        let cells: Vec<&[Data]> = range.rows().collect();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[1][0], Data::String("하늘고".to_string()));
        assert_eq!(cells[1][4], Data::Float(1.0));
        assert_eq!(cells[2][1], Data::Float(4.0));
        assert_eq!(cells[2][2], Data::Empty);
        assert_eq!(cells[2][4], Data::Empty);
    }
}
