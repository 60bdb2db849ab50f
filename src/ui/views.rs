use eframe::egui::{self, Color32, RichText, Ui};

use super::{fmt_opt, plot, tables};
use crate::data::cache::Snapshot;
use crate::data::filter::{combined_environment, combined_growth};
use crate::state::AppState;
use crate::stats::{ranked, Metric};

const TITLE: &str = "극지식물 최적 EC 농도 연구";

/// Metrics the time-series chart can show.
const SERIES_METRICS: [Metric; 4] = [Metric::Temperature, Metric::Humidity, Metric::Ph, Metric::MeasuredEc];

/// Correlations listed on the growth tab.
const CORRELATIONS: [(Metric, Metric); 4] = [
    (Metric::Ph, Metric::Weight),
    (Metric::TargetEc, Metric::Weight),
    (Metric::MeasuredEc, Metric::Weight),
    (Metric::Temperature, Metric::Weight),
];

/// Shown instead of the tabs when nothing could be loaded.
pub fn blocked(ui: &mut Ui, state: &AppState) {
    ui.centered_and_justified(|ui: &mut Ui| {
        let msg = state.fatal_error.as_deref().unwrap_or("데이터를 불러오지 못했습니다.");
        ui.label(
            RichText::new(format!(
                "{msg}\n\n데이터 폴더: {}",
                state.config().data_dir.display()
            ))
            .color(Color32::RED)
            .heading(),
        );
    });
}

fn metric_tile(ui: &mut Ui, caption: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(caption).small());
        ui.label(RichText::new(value).size(22.0).strong());
    });
}

fn coverage_banner(ui: &mut Ui, snapshot: &Snapshot) {
    let missing = snapshot.missing_schools();
    if !missing.is_empty() {
        ui.label(
            RichText::new(format!("일부 학교 데이터 누락: {}", missing.join(", ")))
                .color(Color32::from_rgb(0xe0, 0xa0, 0x20)),
        );
    }
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

pub fn overview(ui: &mut Ui, state: &AppState, snapshot: &Snapshot) {
    let summary = &snapshot.summary;
    ui.heading(TITLE);
    coverage_banner(ui, snapshot);
    ui.add_space(8.0);

    let best = summary
        .best_school()
        .map(|s| format!("{:.1} ({})", s.target_ec, s.school))
        .unwrap_or_else(|| "—".to_string());
    ui.horizontal(|ui: &mut Ui| {
        metric_tile(ui, "총 개체수", summary.total_samples.to_string());
        ui.add_space(24.0);
        metric_tile(ui, "평균 온도", format!("{} ℃", fmt_opt(summary.overall.temperature, 2)));
        ui.add_space(24.0);
        metric_tile(ui, "평균 습도", format!("{} %", fmt_opt(summary.overall.humidity, 2)));
        ui.add_space(24.0);
        metric_tile(ui, "최적 EC", best);
    });

    ui.add_space(12.0);
    ui.strong("학교별 실험 조건");
    tables::school_table(ui, summary, &state.colors);

    ui.add_space(12.0);
    ui.strong("생중량 순위");
    tables::summary_table(ui, &ranked(summary));
}

pub fn environment(ui: &mut Ui, state: &mut AppState, snapshot: &Snapshot) {
    let summary = &snapshot.summary;
    coverage_banner(ui, snapshot);

    ui.columns(2, |cols| {
        plot::school_bars(&mut cols[0], "mean_temperature", summary, &state.colors, Metric::Temperature);
        plot::school_bars(&mut cols[1], "mean_humidity", summary, &state.colors, Metric::Humidity);
    });
    ui.columns(2, |cols| {
        plot::school_bars(&mut cols[0], "mean_ph", summary, &state.colors, Metric::Ph);
        plot::ec_comparison(&mut cols[1], summary, &state.colors);
    });

    ui.add_space(12.0);
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(format!("시계열 · {}", state.selection.label()));
        egui::ComboBox::from_id_salt("series_metric")
            .selected_text(state.series_metric.label())
            .show_ui(ui, |ui: &mut Ui| {
                for metric in SERIES_METRICS {
                    ui.selectable_value(&mut state.series_metric, metric, metric.label());
                }
            });
    });
    plot::time_series(ui, state, snapshot);

    egui::CollapsingHeader::new("환경 데이터 원본")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let rows = combined_environment(&snapshot.environment.records, state.config(), &state.selection);
            tables::environment_table(ui, &rows);
        });
}

pub fn growth(ui: &mut Ui, state: &AppState, snapshot: &Snapshot) {
    let summary = &snapshot.summary;
    coverage_banner(ui, snapshot);

    match summary.best_school() {
        Some(best) => metric_tile(
            ui,
            "최적 EC (평균 생중량 최대)",
            format!("{:.1} dS/m · {} · {} g", best.target_ec, best.school, fmt_opt(best.weight, 3)),
        ),
        None => {
            ui.label("생육 데이터가 없습니다.");
        }
    }

    ui.columns(2, |cols| {
        plot::weight_by_ec(&mut cols[0], summary, &state.colors);
        plot::ph_weight_scatter(&mut cols[1], summary, &state.colors);
    });
    plot::leaf_weight_scatter(ui, state, snapshot);

    ui.add_space(12.0);
    ui.strong("상관계수 (학교별 평균, Pearson r)");
    egui::Grid::new("correlations").num_columns(2).show(ui, |ui: &mut Ui| {
        for (x, y) in CORRELATIONS {
            ui.label(format!("{x} ↔ {y}"));
            match summary.correlate(x, y) {
                Ok(r) => ui.label(format!("{r:+.3}")),
                Err(e) => ui.label(RichText::new(format!("정의되지 않음 ({e})")).weak()),
            };
            ui.end_row();
        }
    });

    egui::CollapsingHeader::new("생육 데이터 원본")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let rows = combined_growth(&snapshot.growth.records, state.config(), &state.selection);
            tables::growth_table(ui, &rows);
        });
}
