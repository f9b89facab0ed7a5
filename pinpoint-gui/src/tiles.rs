//! Web Mercator math and the background tile loader.
//!
//! Tiles are downloaded by a small pool of threads sharing one request
//! queue, decoded off the UI thread, and turned into textures when the UI
//! next draws.

use anyhow::{Context, Result};
use eframe::egui;
use pinpoint_core::{MapConfig, MAX_MERCATOR_LATITUDE};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

/// Edge length of one raster tile in pixels
pub const TILE_SIZE: f64 = 256.0;

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub struct TileId {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

/// Width (and height) of the whole world in pixels at `zoom`
pub fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * (1u64 << zoom) as f64
}

/// Latitude/longitude to world pixel position at `zoom`
pub fn project(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let lat_rad = lat
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    let x = (lon + 180.0) / 360.0 * size;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * size;
    (x, y)
}

/// World pixel position at `zoom` to latitude/longitude.
/// Longitude is not wrapped.
pub fn unproject(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let lon = x / size * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / size)).sinh().atan().to_degrees();
    (lat, lon)
}

/// A tile to draw, and where its top-left corner sits relative to the view
/// center, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleTile {
    pub id: TileId,
    pub offset: (f64, f64),
}

/// Tiles covering a `width` x `height` view centered on world pixel `center`.
///
/// Columns repeat across the antimeridian; rows stop at the poles.
pub fn visible_tiles(center: (f64, f64), width: f64, height: f64, zoom: u8) -> Vec<VisibleTile> {
    let n = 1i64 << zoom;
    let x0 = ((center.0 - width / 2.0) / TILE_SIZE).floor() as i64;
    let x1 = ((center.0 + width / 2.0) / TILE_SIZE).floor() as i64;
    let y0 = (((center.1 - height / 2.0) / TILE_SIZE).floor() as i64).max(0);
    let y1 = (((center.1 + height / 2.0) / TILE_SIZE).floor() as i64).min(n - 1);

    let mut tiles = Vec::new();
    for ty in y0..=y1 {
        for tx in x0..=x1 {
            tiles.push(VisibleTile {
                id: TileId {
                    x: tx.rem_euclid(n) as u32,
                    y: ty as u32,
                    z: zoom,
                },
                offset: (
                    tx as f64 * TILE_SIZE - center.0,
                    ty as f64 * TILE_SIZE - center.1,
                ),
            });
        }
    }
    tiles
}

struct FetchedTile {
    id: TileId,
    image: Option<egui::ColorImage>,
}

enum TileSlot {
    Pending,
    Ready {
        texture: egui::TextureHandle,
        last_used: u64,
    },
    Failed {
        last_used: u64,
    },
}

impl TileSlot {
    fn last_used(&self) -> Option<u64> {
        match self {
            TileSlot::Pending => None,
            TileSlot::Ready { last_used, .. } | TileSlot::Failed { last_used } => Some(*last_used),
        }
    }
}

/// Texture cache backed by background downloads
pub struct TileCache {
    slots: HashMap<TileId, TileSlot>,
    fetch_tx: mpsc::Sender<TileId>,
    result_rx: mpsc::Receiver<FetchedTile>,
    max_tiles: usize,
    frame: u64,
}

impl TileCache {
    pub fn new(config: &MapConfig, ctx: &egui::Context) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build tile HTTP client")?;

        let (fetch_tx, fetch_rx) = mpsc::channel::<TileId>();
        let (result_tx, result_rx) = mpsc::channel::<FetchedTile>();
        let fetch_rx = Arc::new(Mutex::new(fetch_rx));

        for i in 0..config.tile_workers.max(1) {
            let client = client.clone();
            let config = config.clone();
            let rx = Arc::clone(&fetch_rx);
            let tx = result_tx.clone();
            let ctx = ctx.clone();
            std::thread::Builder::new()
                .name(format!("tile-fetch-{}", i))
                .spawn(move || fetch_loop(client, config, rx, tx, ctx))
                .context("Failed to start tile download thread")?;
        }

        Ok(Self {
            slots: HashMap::new(),
            fetch_tx,
            result_rx,
            max_tiles: config.max_cached_tiles,
            frame: 0,
        })
    }

    /// Upload finished downloads and trim the cache. Call once per frame
    /// before drawing.
    pub fn begin_frame(&mut self, ctx: &egui::Context) {
        self.frame += 1;

        while let Ok(fetched) = self.result_rx.try_recv() {
            let id = fetched.id;
            let slot = match fetched.image {
                Some(image) => {
                    let name = format!("tile-{}-{}-{}", id.z, id.x, id.y);
                    TileSlot::Ready {
                        texture: ctx.load_texture(name, image, egui::TextureOptions::LINEAR),
                        last_used: self.frame,
                    }
                }
                None => TileSlot::Failed {
                    last_used: self.frame,
                },
            };
            self.slots.insert(id, slot);
        }

        self.evict();
    }

    /// Texture for a tile, queueing a download the first time it is asked for
    pub fn texture(&mut self, id: TileId) -> Option<egui::TextureId> {
        let frame = self.frame;
        if let Some(slot) = self.slots.get_mut(&id) {
            return match slot {
                TileSlot::Ready { texture, last_used } => {
                    *last_used = frame;
                    Some(texture.id())
                }
                TileSlot::Failed { last_used } => {
                    *last_used = frame;
                    None
                }
                TileSlot::Pending => None,
            };
        }

        if self.fetch_tx.send(id).is_ok() {
            self.slots.insert(id, TileSlot::Pending);
        }
        None
    }

    /// Drop least recently drawn tiles once over the cap. Tiles drawn this
    /// frame and downloads in flight are kept.
    fn evict(&mut self) {
        if self.slots.len() <= self.max_tiles {
            return;
        }

        let mut candidates: Vec<(u64, TileId)> = self
            .slots
            .iter()
            .filter_map(|(id, slot)| slot.last_used().map(|used| (used, *id)))
            .filter(|(used, _)| *used < self.frame)
            .collect();
        candidates.sort_by_key(|(used, _)| *used);

        let excess = self.slots.len() - self.max_tiles;
        for (_, id) in candidates.into_iter().take(excess) {
            self.slots.remove(&id);
        }
    }
}

fn fetch_loop(
    client: reqwest::blocking::Client,
    config: MapConfig,
    rx: Arc<Mutex<mpsc::Receiver<TileId>>>,
    tx: mpsc::Sender<FetchedTile>,
    ctx: egui::Context,
) {
    loop {
        let id = {
            let Ok(lock) = rx.lock() else { break };
            match lock.recv() {
                Ok(id) => id,
                Err(_) => break,
            }
        };

        let url = config.tile_url_for(id.z, id.x, id.y);
        let image = match fetch_tile(&client, &url) {
            Ok(image) => Some(image),
            Err(e) => {
                log::debug!("Tile {}/{}/{} failed: {:#}", id.z, id.x, id.y, e);
                None
            }
        };

        if tx.send(FetchedTile { id, image }).is_err() {
            break;
        }
        ctx.request_repaint();
    }
}

fn fetch_tile(client: &reqwest::blocking::Client, url: &str) -> Result<egui::ColorImage> {
    let response = client
        .get(url)
        .send()
        .context("Failed to send tile request")?;

    if !response.status().is_success() {
        anyhow::bail!("Tile server returned status: {}", response.status());
    }

    let bytes = response.bytes().context("Failed to read tile body")?;
    let rgba = image::load_from_memory(&bytes)
        .context("Failed to decode tile image")?
        .to_rgba8();

    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}
