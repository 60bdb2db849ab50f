use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::config::{StudyConfig, FONT_VAR};
use crate::state::{AppState, Tab};
use crate::ui::{panels, views};

/// Fonts with Hangul glyphs commonly present on desktop systems.
const FONT_CANDIDATES: [&str; 6] = [
    "C:\\Windows\\Fonts\\malgun.ttf",
    "/System/Library/Fonts/AppleSDGothicNeo.ttc",
    "/Library/Fonts/NanumGothic.ttf",
    "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
];

/// How often the data directory is rescanned for changed files.
const REFRESH_INTERVAL: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
    /// `ctx.input().time` of the last rescan.
    last_refresh: f64,
}

impl DashboardApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: StudyConfig) -> Self {
        install_hangul_font(&cc.egui_ctx);
        Self {
            state: AppState::new(config),
            last_refresh: 0.0,
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Cheap when nothing changed: the store only reloads on a new key.
        let now = ctx.input(|i| i.time);
        if now - self.last_refresh >= REFRESH_INTERVAL.as_secs_f64() {
            self.last_refresh = now;
            self.state.refresh();
        }
        ctx.request_repaint_after(REFRESH_INTERVAL);

        // ---- Top panel: title + tabs ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: school selector, warnings, exports ----
        egui::SidePanel::left("control_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: active tab ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(snapshot) = self.state.snapshot.clone() else {
                views::blocked(ui, &self.state);
                return;
            };
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| match self.state.tab {
                    Tab::Overview => views::overview(ui, &self.state, &snapshot),
                    Tab::Environment => views::environment(ui, &mut self.state, &snapshot),
                    Tab::Growth => views::growth(ui, &self.state, &snapshot),
                });
        });
    }
}

/// egui's bundled fonts have no Hangul; add the first system font that does.
fn install_hangul_font(ctx: &egui::Context) {
    let candidates = std::env::var_os(FONT_VAR)
        .map(PathBuf::from)
        .into_iter()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

    let Some((path, bytes)) = candidates
        .into_iter()
        .find_map(|p| std::fs::read(&p).ok().map(|bytes| (p, bytes)))
    else {
        log::warn!("No Hangul font found; set {FONT_VAR} to a .ttf/.ttc file");
        return;
    };
    log::info!("Using font {}", path.display());

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("hangul".to_owned(), Arc::new(egui::FontData::from_owned(bytes)));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .push("hangul".to_owned());
    }
    ctx.set_fonts(fonts);
}
