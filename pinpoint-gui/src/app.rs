use crate::map::MapView;
use anyhow::{Context, Result};
use eframe::egui;
use pinpoint_core::{Bridge, Coordinate, NominatimClient, PinpointConfig, Resolution};

enum LookupStatus {
    Idle,
    Pending(Coordinate),
    Done(Resolution),
    WorkerGone(Coordinate),
}

pub struct PinpointApp {
    map: MapView,
    bridge: Bridge,
    status: LookupStatus,
}

impl PinpointApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: PinpointConfig) -> Result<Self> {
        let client = NominatimClient::new(config.resolver)
            .context("Failed to create geocoding client")?;

        let ctx = cc.egui_ctx.clone();
        let bridge = Bridge::spawn(client, move || ctx.request_repaint())
            .context("Failed to start geocoding worker")?;

        let map = MapView::new(&config.map, &cc.egui_ctx)?;

        Ok(Self {
            map,
            bridge,
            status: LookupStatus::Idle,
        })
    }

    fn check_lookup_complete(&mut self) {
        if let Some(resolution) = self.bridge.poll() {
            self.status = LookupStatus::Done(resolution);
        } else if let LookupStatus::Pending(coordinate) = self.status {
            if !self.bridge.is_pending() {
                self.status = LookupStatus::WorkerGone(coordinate);
            }
        }
    }

    fn render_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| match &self.status {
            LookupStatus::Idle => {
                ui.label("Click anywhere on the map to look up its place name");
            }
            LookupStatus::Pending(coordinate) => {
                ui.label(format!("📍 {}", coordinate));
                ui.separator();
                ui.spinner();
                ui.label("Looking up place name...");
            }
            LookupStatus::Done(resolution) => {
                ui.label(format!("📍 {}", resolution.coordinate));
                ui.separator();
                let color = match &resolution.place {
                    Ok(Some(_)) => egui::Color32::GREEN,
                    Ok(None) => egui::Color32::GRAY,
                    Err(_) => egui::Color32::RED,
                };
                let prefix = if resolution.place.is_err() { "❌ " } else { "" };
                ui.colored_label(color, format!("{}{}", prefix, resolution.summary()));
                ui.separator();
                ui.label(resolution.resolved_at.format("%H:%M:%S").to_string());
            }
            LookupStatus::WorkerGone(coordinate) => {
                ui.label(format!("📍 {}", coordinate));
                ui.separator();
                ui.colored_label(egui::Color32::RED, "❌ Geocoding is unavailable");
            }
        });
    }
}

impl eframe::App for PinpointApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_lookup_complete();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.render_status_bar(ui);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                if let Some(coordinate) = self.map.show(ui) {
                    self.bridge.submit(coordinate);
                    self.status = LookupStatus::Pending(coordinate);
                }
            });
    }
}
