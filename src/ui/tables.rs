use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use super::fmt_opt;
use crate::color::SchoolColors;
use crate::data::export::TIME_FORMAT;
use crate::data::model::{EnvironmentRecord, GrowthRecord};
use crate::stats::{RankedRow, StudySummary};

const ROW_HEIGHT: f32 = 18.0;
const MAX_TABLE_HEIGHT: f32 = 320.0;

fn simple_table(ui: &mut Ui, id: &str, headers: &[&str], add_body: impl FnOnce(egui_extras::TableBody<'_>)) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .max_scroll_height(MAX_TABLE_HEIGHT)
            .columns(Column::auto().at_least(70.0), headers.len())
            .header(ROW_HEIGHT + 2.0, |mut header| {
                for h in headers {
                    header.col(|ui: &mut Ui| {
                        ui.strong(*h);
                    });
                }
            })
            .body(add_body);
    });
}

/// Per-school configuration and sample counts.
pub fn school_table(ui: &mut Ui, summary: &StudySummary, colors: &SchoolColors) {
    let headers = ["학교", "목표 EC", "측정 건수", "개체수", "예상 개체수"];
    simple_table(ui, "school_table", &headers, |mut body| {
        for s in &summary.schools {
            body.row(ROW_HEIGHT, |mut row| {
                row.col(|ui: &mut Ui| {
                    ui.label(RichText::new(&s.school).color(colors.color_for(&s.school)));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.1}", s.target_ec));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(s.env_rows.to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(s.sample_count.to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(s.expected_samples.map_or("—".to_string(), |n| n.to_string()));
                });
            });
        }
    });
}

/// Schools ranked by mean fresh weight.
pub fn summary_table(ui: &mut Ui, rows: &[RankedRow]) {
    let headers = ["순위", "학교", "EC", "pH", "생중량 (g)"];
    simple_table(ui, "summary_table", &headers, |mut body| {
        for r in rows {
            body.row(ROW_HEIGHT, |mut row| {
                row.col(|ui: &mut Ui| {
                    ui.label(r.rank.map_or("—".to_string(), |n| n.to_string()));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(r.school.as_str());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.1}", r.target_ec));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(fmt_opt(r.ph, 2));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(fmt_opt(r.weight, 3));
                });
            });
        }
    });
}

/// Raw sensor readings, one row each.
pub fn environment_table(ui: &mut Ui, records: &[EnvironmentRecord]) {
    let headers = ["time", "학교", "temperature", "humidity", "ph", "ec"];
    simple_table(ui, "environment_table", &headers, |body| {
        body.rows(ROW_HEIGHT, records.len(), |mut row| {
            let r = &records[row.index()];
            row.col(|ui: &mut Ui| {
                ui.label(r.time.format(TIME_FORMAT).to_string());
            });
            row.col(|ui: &mut Ui| {
                ui.label(r.school.as_str());
            });
            for value in [r.temperature, r.humidity, r.ph, r.ec] {
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{value:.2}"));
                });
            }
        });
    });
}

/// Raw growth measurements, one row per specimen.
pub fn growth_table(ui: &mut Ui, records: &[GrowthRecord]) {
    let headers = ["학교", "EC", "생중량 (g)", "잎 수", "지상부 (mm)", "지하부 (mm)"];
    simple_table(ui, "growth_table", &headers, |body| {
        body.rows(ROW_HEIGHT, records.len(), |mut row| {
            let r = &records[row.index()];
            row.col(|ui: &mut Ui| {
                ui.label(r.school.as_str());
            });
            row.col(|ui: &mut Ui| {
                ui.label(format!("{:.1}", r.target_ec));
            });
            row.col(|ui: &mut Ui| {
                ui.label(format!("{:.3}", r.weight));
            });
            row.col(|ui: &mut Ui| {
                ui.label(r.leaf_count.to_string());
            });
            row.col(|ui: &mut Ui| {
                ui.label(format!("{:.1}", r.shoot_length));
            });
            row.col(|ui: &mut Ui| {
                ui.label(format!("{:.1}", r.root_length));
            });
        });
    });
}
