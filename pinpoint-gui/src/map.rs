use crate::tiles::{project, unproject, visible_tiles, world_size, TileCache, TILE_SIZE};
use anyhow::Result;
use eframe::egui;
use pinpoint_core::{Coordinate, MapConfig};

/// Scroll distance (in points) that counts as one zoom step
const SCROLL_PER_ZOOM_STEP: f32 = 40.0;

const ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Pannable, zoomable slippy map that reports clicked coordinates
pub struct MapView {
    /// View center as (latitude, longitude)
    center: (f64, f64),
    zoom: u8,
    min_zoom: u8,
    max_zoom: u8,
    marker: Option<Coordinate>,
    scroll_accum: f32,
    tiles: TileCache,
}

impl MapView {
    pub fn new(config: &MapConfig, ctx: &egui::Context) -> Result<Self> {
        Ok(Self {
            center: config.center,
            zoom: config.zoom.clamp(config.min_zoom, config.max_zoom),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            marker: None,
            scroll_accum: 0.0,
            tiles: TileCache::new(config, ctx)?,
        })
    }

    /// Draw the map into all available space.
    /// Returns the coordinate of a click, if there was one this frame.
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<Coordinate> {
        self.tiles.begin_frame(ui.ctx());

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        let mut center = project(self.center.0, self.center.1, self.zoom);

        if response.dragged() {
            let delta = response.drag_delta();
            center.0 -= delta.x as f64;
            center.1 -= delta.y as f64;
        }

        if response.hovered() {
            self.scroll_accum += ui.input(|i| i.raw_scroll_delta.y);
            let step = if self.scroll_accum >= SCROLL_PER_ZOOM_STEP {
                Some(1i16)
            } else if self.scroll_accum <= -SCROLL_PER_ZOOM_STEP {
                Some(-1i16)
            } else {
                None
            };

            if let Some(step) = step {
                self.scroll_accum = 0.0;
                let anchor = response.hover_pos().unwrap_or(rect.center()) - rect.center();
                let (zoom, new_center) = zoom_around(
                    self.zoom,
                    step,
                    (self.min_zoom, self.max_zoom),
                    center,
                    (anchor.x as f64, anchor.y as f64),
                );
                self.zoom = zoom;
                center = new_center;
            }
        } else {
            self.scroll_accum = 0.0;
        }

        let size = world_size(self.zoom);
        center.0 = center.0.rem_euclid(size);
        center.1 = center.1.clamp(0.0, size);
        self.center = unproject(center.0, center.1, self.zoom);

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, egui::Color32::from_gray(224));
        self.paint_tiles(&painter, rect, center);

        let clicked = if response.clicked() {
            response
                .interact_pointer_pos()
                .and_then(|pos| {
                    let offset = pos - rect.center();
                    coordinate_at(self.zoom, center, (offset.x as f64, offset.y as f64))
                })
        } else {
            None
        };

        if let Some(coordinate) = clicked {
            // Only one marker at a time
            self.marker = Some(coordinate);
        }

        if let Some(marker) = self.marker {
            paint_marker(&painter, self.marker_position(marker, rect, center));
        }

        painter.text(
            rect.right_bottom() - egui::vec2(6.0, 4.0),
            egui::Align2::RIGHT_BOTTOM,
            ATTRIBUTION,
            egui::FontId::proportional(11.0),
            egui::Color32::from_gray(60),
        );

        clicked
    }

    fn paint_tiles(&mut self, painter: &egui::Painter, rect: egui::Rect, center: (f64, f64)) {
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        for tile in visible_tiles(center, rect.width() as f64, rect.height() as f64, self.zoom) {
            let min = rect.center() + egui::vec2(tile.offset.0 as f32, tile.offset.1 as f32);
            let tile_rect = egui::Rect::from_min_size(min, egui::Vec2::splat(TILE_SIZE as f32));
            if let Some(texture) = self.tiles.texture(tile.id) {
                painter.image(texture, tile_rect, uv, egui::Color32::WHITE);
            }
        }
    }

    /// Screen position of the marker, using whichever copy of the world is
    /// closest to the view center
    fn marker_position(&self, marker: Coordinate, rect: egui::Rect, center: (f64, f64)) -> egui::Pos2 {
        let size = world_size(self.zoom);
        let (x, y) = project(marker.latitude(), marker.longitude(), self.zoom);
        let mut dx = x - center.0;
        if dx > size / 2.0 {
            dx -= size;
        } else if dx < -size / 2.0 {
            dx += size;
        }
        rect.center() + egui::vec2(dx as f32, (y - center.1) as f32)
    }
}

/// Step the zoom level by `step` within `limits`, keeping the point at
/// `anchor` (relative to the view center) fixed on screen.
///
/// Returns the new zoom and the new world pixel center.
fn zoom_around(
    zoom: u8,
    step: i16,
    limits: (u8, u8),
    center: (f64, f64),
    anchor: (f64, f64),
) -> (u8, (f64, f64)) {
    let new_zoom = (zoom as i16 + step).clamp(limits.0 as i16, limits.1 as i16) as u8;
    if new_zoom == zoom {
        return (zoom, center);
    }

    let (lat, lon) = unproject(center.0 + anchor.0, center.1 + anchor.1, zoom);
    let fixed = project(lat, lon, new_zoom);
    (new_zoom, (fixed.0 - anchor.0, fixed.1 - anchor.1))
}

/// Coordinate under a point `offset` pixels from the view center
fn coordinate_at(zoom: u8, center: (f64, f64), offset: (f64, f64)) -> Option<Coordinate> {
    let (lat, lon) = unproject(center.0 + offset.0, center.1 + offset.1, zoom);
    match Coordinate::from_map_point(lat, lon) {
        Ok(coordinate) => Some(coordinate),
        Err(e) => {
            log::warn!("Ignoring click outside the map: {}", e);
            None
        }
    }
}

fn paint_marker(painter: &egui::Painter, tip: egui::Pos2) {
    let head = tip - egui::vec2(0.0, 18.0);
    painter.line_segment([head, tip], egui::Stroke::new(3.0, egui::Color32::from_rgb(160, 20, 20)));
    painter.circle(
        head,
        7.0,
        egui::Color32::from_rgb(220, 40, 40),
        egui::Stroke::new(2.0, egui::Color32::WHITE),
    );
}
