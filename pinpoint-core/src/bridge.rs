//! Message channel between the map surface and the geocoding worker.
//!
//! The map surface never calls the geocoder directly. Each click becomes a
//! [`MapClick`] tagged with a sequence number and is sent to a dedicated
//! worker thread. Results come back as [`Resolution`] values that the UI
//! thread picks up with [`Bridge::poll`]. Only the result for the newest
//! click is ever handed out; anything older is stale and dropped.

use crate::coordinate::Coordinate;
use crate::error::ResolveError;
use crate::geocoding::{ReverseGeocoder, NO_PLACE_NAME};
use crate::throttle::Throttle;
use chrono::{DateTime, Local};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// A single click on the map, as sent to the worker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapClick {
    /// Increases by one per click, starting at 1
    pub seq: u64,
    pub coordinate: Coordinate,
}

/// Outcome of resolving one click
#[derive(Debug)]
pub struct Resolution {
    pub seq: u64,
    pub coordinate: Coordinate,
    /// `Ok(None)` when the service knew no place name for the point
    pub place: Result<Option<String>, ResolveError>,
    pub resolved_at: DateTime<Local>,
}

impl Resolution {
    /// Human-readable outcome for display
    pub fn summary(&self) -> String {
        match &self.place {
            Ok(Some(name)) => name.clone(),
            Ok(None) => NO_PLACE_NAME.to_string(),
            Err(e) => e.to_string(),
        }
    }
}

/// Host side of the click/result channel
pub struct Bridge {
    clicks: Sender<MapClick>,
    resolutions: Receiver<Resolution>,
    last_seq: u64,
    pending: bool,
}

impl Bridge {
    /// Start the geocoding worker thread.
    ///
    /// Requests are spaced by the geocoder's own `min_interval`. `notify`
    /// runs on the worker after every result is queued, so a GUI can wake
    /// its event loop.
    pub fn spawn<G, F>(geocoder: G, notify: F) -> std::io::Result<Self>
    where
        G: ReverseGeocoder + Send + 'static,
        F: Fn() + Send + 'static,
    {
        let (click_tx, click_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        let throttle = Throttle::new(geocoder.min_interval());

        std::thread::Builder::new()
            .name("reverse-geocoder".to_string())
            .spawn(move || run_worker(geocoder, throttle, click_rx, result_tx, notify))?;

        Ok(Self {
            clicks: click_tx,
            resolutions: result_rx,
            last_seq: 0,
            pending: false,
        })
    }

    /// Queue a clicked coordinate for lookup and return its sequence number.
    /// Never blocks.
    pub fn submit(&mut self, coordinate: Coordinate) -> u64 {
        self.last_seq += 1;
        let click = MapClick {
            seq: self.last_seq,
            coordinate,
        };

        log::info!("Selected coordinate: {}", coordinate);

        if self.clicks.send(click).is_err() {
            log::error!("Geocoding worker is not running, click {} dropped", click.seq);
            self.pending = false;
        } else {
            self.pending = true;
        }

        click.seq
    }

    /// Take the result for the newest click, if it has arrived.
    /// Results for older clicks are discarded.
    pub fn poll(&mut self) -> Option<Resolution> {
        let mut latest = None;

        loop {
            match self.resolutions.try_recv() {
                Ok(resolution) if resolution.seq == self.last_seq => latest = Some(resolution),
                Ok(stale) => {
                    log::debug!(
                        "Discarding stale result for click {} (latest is {})",
                        stale.seq,
                        self.last_seq
                    );
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.pending {
                        log::error!("Geocoding worker stopped before answering click {}", self.last_seq);
                        self.pending = false;
                    }
                    break;
                }
            }
        }

        if latest.is_some() {
            self.pending = false;
        }
        latest
    }

    /// Whether the newest click is still waiting for its result
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Skip ahead to the newest click already waiting in the queue
fn newest_click(mut click: MapClick, clicks: &Receiver<MapClick>) -> MapClick {
    while let Ok(newer) = clicks.try_recv() {
        log::debug!("Click {} superseded by click {}", click.seq, newer.seq);
        click = newer;
    }
    click
}

fn run_worker<G, F>(
    geocoder: G,
    mut throttle: Throttle,
    clicks: Receiver<MapClick>,
    results: Sender<Resolution>,
    notify: F,
) where
    G: ReverseGeocoder,
    F: Fn(),
{
    while let Ok(click) = clicks.recv() {
        let click = newest_click(click, &clicks);
        throttle.wait();
        // More clicks may have landed while we were rate limited
        let click = newest_click(click, &clicks);

        let place = geocoder.reverse(click.coordinate);
        match &place {
            Ok(Some(name)) => log::info!("Place name for {}: {}", click.coordinate, name),
            Ok(None) => log::warn!("No place name available for {}", click.coordinate),
            Err(e) => log::warn!("Reverse geocoding failed for {}: {}", click.coordinate, e),
        }

        let resolution = Resolution {
            seq: click.seq,
            coordinate: click.coordinate,
            place,
            resolved_at: Local::now(),
        };

        if results.send(resolution).is_err() {
            break;
        }
        notify();
    }

    log::debug!("Geocoding worker shutting down");
}
