use anyhow::Result;
use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::cache::Snapshot;
use crate::data::export;
use crate::data::filter::{combined_environment, combined_growth, SchoolSelection, ALL_SCHOOLS_LABEL};
use crate::state::{AppState, Tab};
use crate::stats::ranked;

const WARNING_COLOR: Color32 = Color32::from_rgb(0xe0, 0xa0, 0x20);

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the menu bar and the tab strip.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("파일", |ui: &mut Ui| {
            if ui.button("다시 불러오기").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        for tab in Tab::ALL {
            ui.selectable_value(&mut state.tab, tab, tab.label());
        }

        ui.separator();

        if let Some(snapshot) = &state.snapshot {
            ui.label(format!(
                "개체 {}개 · 측정 {}건",
                snapshot.summary.total_samples,
                snapshot.summary.schools.iter().map(|s| s.env_rows).sum::<usize>()
            ));
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – selector, coverage, exports
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("학교 선택");
    ui.separator();

    let schools: Vec<String> = state.config().schools().iter().map(|s| s.name.clone()).collect();
    egui::ComboBox::from_id_salt("school_selector")
        .selected_text(state.selection.label().to_string())
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(&mut state.selection, SchoolSelection::All, ALL_SCHOOLS_LABEL);
            for name in &schools {
                let text = RichText::new(name).color(state.colors.color_for(name));
                ui.selectable_value(&mut state.selection, SchoolSelection::School(name.clone()), text);
            }
        });

    ui.add_space(8.0);

    let Some(snapshot) = state.snapshot.clone() else {
        return;
    };

    ui.strong("데이터 현황");
    egui::Grid::new("coverage_grid").num_columns(3).show(ui, |ui: &mut Ui| {
        for s in &snapshot.summary.schools {
            ui.label(RichText::new(&s.school).color(state.colors.color_for(&s.school)));
            coverage_cell(ui, s.env_rows, "측정");
            coverage_cell(ui, s.sample_count, "개체");
            ui.end_row();
        }
    });

    let warnings = snapshot.warnings();
    if !warnings.is_empty() {
        ui.add_space(8.0);
        egui::CollapsingHeader::new(RichText::new(format!("경고 {}건", warnings.len())).color(WARNING_COLOR))
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                for w in &warnings {
                    ui.label(RichText::new(w).small());
                }
            });
    }

    ui.add_space(8.0);
    ui.strong("내보내기");
    for kind in ExportKind::ALL {
        if ui.button(kind.label()).clicked() {
            export_dialog(state, &snapshot, kind);
        }
    }

    if let Some(msg) = &state.status_message {
        ui.add_space(4.0);
        ui.label(RichText::new(msg).small());
    }
}

fn coverage_cell(ui: &mut Ui, count: usize, unit: &str) {
    if count == 0 {
        ui.label(RichText::new("없음").color(Color32::RED));
    } else {
        ui.label(format!("{count} {unit}"));
    }
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum ExportKind {
    Environment,
    Growth,
    Summary,
}

impl ExportKind {
    const ALL: [ExportKind; 3] = [Self::Environment, Self::Growth, Self::Summary];

    fn label(self) -> &'static str {
        match self {
            Self::Environment => "환경데이터 CSV",
            Self::Growth => "생육결과 XLSX",
            Self::Summary => "학교별 요약 XLSX",
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            Self::Environment => export::ENVIRONMENT_CSV_NAME,
            Self::Growth => export::GROWTH_XLSX_NAME,
            Self::Summary => export::SUMMARY_XLSX_NAME,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Environment => "csv",
            Self::Growth | Self::Summary => "xlsx",
        }
    }

    /// Exports always cover every school, whatever the selector shows.
    fn bytes(self, state: &AppState, snapshot: &Snapshot) -> Result<Vec<u8>> {
        let config = state.config();
        match self {
            Self::Environment => export::environment_csv(&combined_environment(
                &snapshot.environment.records,
                config,
                &SchoolSelection::All,
            )),
            Self::Growth => export::growth_workbook(&combined_growth(
                &snapshot.growth.records,
                config,
                &SchoolSelection::All,
            )),
            Self::Summary => export::summary_workbook(&ranked(&snapshot.summary)),
        }
    }
}

fn export_dialog(state: &mut AppState, snapshot: &Snapshot, kind: ExportKind) {
    let Some(path) = rfd::FileDialog::new()
        .set_title(kind.label())
        .set_file_name(kind.file_name())
        .add_filter(kind.extension().to_uppercase(), &[kind.extension()])
        .save_file()
    else {
        return;
    };

    let result = kind
        .bytes(state, snapshot)
        .and_then(|bytes| export::save(&path, &bytes));
    state.status_message = Some(match result {
        Ok(()) => format!("저장됨: {}", path.display()),
        Err(e) => {
            log::error!("Export failed: {e:#}");
            format!("Error: {e:#}")
        }
    });
}
