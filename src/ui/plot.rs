use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use crate::color::SchoolColors;
use crate::data::cache::Snapshot;
use crate::data::filter::selected;
use crate::data::model::EnvironmentRecord;
use crate::state::AppState;
use crate::stats::{Metric, StudySummary};

const CHART_HEIGHT: f32 = 220.0;
const TARGET_EC_COLOR: Color32 = Color32::from_gray(150);

/// Value of an environment metric in one reading. Growth metrics have no
/// per-reading value.
pub fn reading_value(metric: Metric, r: &EnvironmentRecord) -> Option<f64> {
    match metric {
        Metric::Temperature => Some(r.temperature),
        Metric::Humidity => Some(r.humidity),
        Metric::Ph => Some(r.ph),
        Metric::MeasuredEc => Some(r.ec),
        _ => None,
    }
}

fn base_plot(id: &str) -> Plot {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_drag(false)
        .allow_scroll(false)
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

/// One bar per school for a per-school mean. Schools with an undefined mean
/// get no bar.
pub fn school_bars(ui: &mut Ui, id: &str, summary: &StudySummary, colors: &SchoolColors, metric: Metric) {
    ui.label(metric.label());
    base_plot(id).y_axis_label(metric.label()).show(ui, |plot_ui| {
        for (i, s) in summary.schools.iter().enumerate() {
            let Some(value) = metric.value(s) else { continue };
            let color = colors.color_for(&s.school);
            let bar = Bar::new(i as f64, value).name(&s.school).fill(color).width(0.6);
            plot_ui.bar_chart(BarChart::new(vec![bar]).name(&s.school).color(color));
        }
    });
}

/// Measured EC next to the school's target EC.
pub fn ec_comparison(ui: &mut Ui, summary: &StudySummary, colors: &SchoolColors) {
    ui.label("EC 비교 (실측 / 목표)");
    base_plot("ec_comparison").y_axis_label("EC (dS/m)").show(ui, |plot_ui| {
        let measured: Vec<Bar> = summary
            .schools
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                let v = s.measured_ec?;
                Some(
                    Bar::new(i as f64 - 0.2, v)
                        .name(&s.school)
                        .fill(colors.color_for(&s.school))
                        .width(0.4),
                )
            })
            .collect();
        let target: Vec<Bar> = summary
            .schools
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Bar::new(i as f64 + 0.2, s.target_ec)
                    .name(&s.school)
                    .fill(TARGET_EC_COLOR)
                    .width(0.4)
            })
            .collect();
        plot_ui.bar_chart(BarChart::new(measured).name("실측 EC"));
        plot_ui.bar_chart(BarChart::new(target).name("목표 EC").color(TARGET_EC_COLOR));
    });
}

/// Mean fresh weight at each target EC.
pub fn weight_by_ec(ui: &mut Ui, summary: &StudySummary, colors: &SchoolColors) {
    ui.label("목표 EC별 평균 생중량");
    base_plot("weight_by_ec")
        .x_axis_label(Metric::TargetEc.label())
        .y_axis_label(Metric::Weight.label())
        .show(ui, |plot_ui| {
            for s in &summary.schools {
                let Some(weight) = s.weight else { continue };
                let color = colors.color_for(&s.school);
                let bar = Bar::new(s.target_ec, weight).name(&s.school).fill(color).width(0.6);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(&s.school).color(color));
            }
        });
}

// ---------------------------------------------------------------------------
// Line chart
// ---------------------------------------------------------------------------

/// Time series of one environment metric for the selected schools. The x
/// axis is hours since the earliest reading shown.
pub fn time_series(ui: &mut Ui, state: &AppState, snapshot: &Snapshot) {
    let parts = selected(&snapshot.environment.records, state.config(), &state.selection);
    let Some(t0) = parts.iter().flat_map(|(_, rows)| rows.iter().map(|r| r.time)).min() else {
        ui.label("표시할 환경 데이터가 없습니다.");
        return;
    };

    let metric = state.series_metric;
    base_plot("time_series")
        .height(CHART_HEIGHT * 1.5)
        .allow_drag(true)
        .allow_scroll(true)
        .x_axis_label("경과 시간 (h)")
        .y_axis_label(metric.label())
        .show(ui, |plot_ui| {
            for (school, rows) in &parts {
                let points: PlotPoints = rows
                    .iter()
                    .filter_map(|r| {
                        let hours = (r.time - t0).num_seconds() as f64 / 3600.0;
                        Some([hours, reading_value(metric, r)?])
                    })
                    .collect();
                let line = Line::new(points)
                    .name(*school)
                    .color(state.colors.color_for(school))
                    .width(1.5);
                plot_ui.line(line);
            }
        });
}

// ---------------------------------------------------------------------------
// Scatter plots
// ---------------------------------------------------------------------------

/// Per-school mean pH against mean weight; marker size encodes mean shoot
/// length.
pub fn ph_weight_scatter(ui: &mut Ui, summary: &StudySummary, colors: &SchoolColors) {
    ui.label("평균 pH vs 평균 생중량 (점 크기: 지상부 길이)");
    let max_shoot = summary
        .schools
        .iter()
        .filter_map(|s| s.shoot_length)
        .fold(0.0, f64::max);

    base_plot("ph_weight_scatter")
        .x_axis_label(Metric::Ph.label())
        .y_axis_label(Metric::Weight.label())
        .show(ui, |plot_ui| {
            for s in &summary.schools {
                let (Some(ph), Some(weight)) = (s.ph, s.weight) else { continue };
                let scale = match s.shoot_length {
                    Some(shoot) if max_shoot > 0.0 => shoot / max_shoot,
                    _ => 0.0,
                };
                let points = Points::new(vec![[ph, weight]])
                    .name(&s.school)
                    .color(colors.color_for(&s.school))
                    .radius(4.0 + 10.0 * scale as f32);
                plot_ui.points(points);
            }
        });
}

/// Leaf count against weight for every selected specimen.
pub fn leaf_weight_scatter(ui: &mut Ui, state: &AppState, snapshot: &Snapshot) {
    ui.label("잎 수 vs 생중량 (개체별)");
    let parts = selected(&snapshot.growth.records, state.config(), &state.selection);
    base_plot("leaf_weight_scatter")
        .x_axis_label(Metric::LeafCount.label())
        .y_axis_label(Metric::Weight.label())
        .show(ui, |plot_ui| {
            for (school, rows) in &parts {
                let series: Vec<[f64; 2]> = rows
                    .iter()
                    .map(|r| [f64::from(r.leaf_count), r.weight])
                    .collect();
                let points = Points::new(series)
                    .name(*school)
                    .color(state.colors.color_for(school))
                    .radius(3.0);
                plot_ui.points(points);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn reading_values_cover_environment_metrics_only() {
        let r = EnvironmentRecord {
            time: NaiveDate::from_ymd_opt(2025, 5, 26).unwrap().and_hms_opt(9, 0, 0).unwrap(),
            temperature: 15.0,
            humidity: 60.0,
            ph: 6.2,
            ec: 1.9,
            school: "하늘고".to_string(),
        };
        assert_eq!(reading_value(Metric::Ph, &r), Some(6.2));
        assert_eq!(reading_value(Metric::MeasuredEc, &r), Some(1.9));
        assert_eq!(reading_value(Metric::Weight, &r), None);
        assert_eq!(reading_value(Metric::TargetEc, &r), None);
    }
}
