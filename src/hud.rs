use egui::{Align2, Color32, RichText};

/// Status line shown while assets load.
pub const LOADING_MESSAGE: &str = "Zoom in on the Walkman and hit the 'Play' button...";

/// Overlay state: the loading screen (status text plus percentage
/// readout) and the now-playing progress bar. The renderer draws it
/// through `ui` every frame.
#[derive(Debug, Clone)]
pub struct Hud {
    enabled: bool,
    loading_visible: bool,
    loading_percent: u32,
    now_playing_visible: bool,
    progress_percent: f32,
}

impl Hud {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            loading_visible: true,
            loading_percent: 0,
            now_playing_visible: false,
            progress_percent: 0.0,
        }
    }

    pub fn loading_visible(&self) -> bool {
        self.loading_visible
    }

    pub fn set_load_percent(&mut self, percent: u32) {
        self.loading_percent = percent;
    }

    pub fn load_percent(&self) -> u32 {
        self.loading_percent
    }

    /// Hide the loading screen and show the viewport chrome.
    pub fn reveal(&mut self) {
        self.loading_visible = false;
        self.now_playing_visible = true;
    }

    /// Update the progress bar; `None` leaves the bar exactly where it
    /// was (paused or ended playback does not reset it).
    pub fn set_progress(&mut self, percent: Option<f32>) {
        if let Some(percent) = percent {
            self.progress_percent = percent.clamp(0.0, 100.0);
        }
    }

    pub fn progress_percent(&self) -> f32 {
        self.progress_percent
    }

    pub fn ui(&self, ctx: &egui::Context) {
        if !self.enabled {
            return;
        }

        if self.loading_visible {
            egui::Area::new(egui::Id::new("loading-screen"))
                .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(
                            RichText::new(LOADING_MESSAGE)
                                .size(18.0)
                                .color(Color32::WHITE),
                        );
                        ui.label(
                            RichText::new(format!("{}%", self.loading_percent))
                                .size(32.0)
                                .color(Color32::from_rgb(74, 158, 255)),
                        );
                    });
                });
            return;
        }

        if self.now_playing_visible {
            egui::Area::new(egui::Id::new("now-playing"))
                .anchor(Align2::CENTER_BOTTOM, egui::vec2(0.0, -16.0))
                .show(ctx, |ui| {
                    ui.set_width(ctx.screen_rect().width() * 0.5);
                    ui.add(
                        egui::ProgressBar::new(self.progress_percent / 100.0)
                            .desired_height(6.0)
                            .fill(Color32::from_rgb(74, 158, 255)),
                    );
                });
        }
    }
}
