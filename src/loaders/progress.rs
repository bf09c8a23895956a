use std::path::PathBuf;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::gltf::{load_model, LoadedModel};
use super::hdr::{load_hdr, HdrImage};

/// Minimum time the loading screen stays visible, in milliseconds.
/// Currently zero; the floor is kept so the reveal path always runs
/// through the same check.
pub const MIN_DISPLAY_TIME_MS: f64 = 0.0;

/// Events emitted by the background asset loaders.
pub enum LoadEvent {
    /// More items were discovered and queued for loading.
    ItemsQueued(u32),
    /// One queued item finished.
    ItemLoaded,
    ModelLoaded(Box<LoadedModel>),
    EnvironmentLoaded(HdrImage),
    /// Load failure; logged, never retried. The loading screen stays up.
    Failed(String),
}

/// Starts the model and environment loads on background threads.
/// Progress and payloads arrive on the returned channel; the main
/// thread polls it with `try_recv`.
pub fn spawn_asset_loader(model_path: PathBuf, environment_path: PathBuf) -> Receiver<LoadEvent> {
    let (tx, rx) = unbounded();

    spawn_load_thread("model-loader", tx.clone(), move || {
        let model = load_model(&model_path)?;
        Ok(LoadEvent::ModelLoaded(Box::new(model)))
    });
    spawn_load_thread("environment-loader", tx, move || {
        let image = load_hdr(&environment_path)?;
        Ok(LoadEvent::EnvironmentLoaded(image))
    });

    rx
}

fn spawn_load_thread<F>(name: &str, tx: Sender<LoadEvent>, load: F)
where
    F: FnOnce() -> anyhow::Result<LoadEvent> + Send + 'static,
{
    thread::Builder::new()
        .name(name.into())
        .spawn(move || {
            let _ = tx.send(LoadEvent::ItemsQueued(1));
            match load() {
                Ok(event) => {
                    let _ = tx.send(LoadEvent::ItemLoaded);
                    let _ = tx.send(event);
                }
                Err(err) => {
                    let _ = tx.send(LoadEvent::Failed(format!("{err:#}")));
                }
            }
        })
        .expect("failed to spawn asset loader thread");
}

/// Aggregate progress across all loaders: counts items, reports the
/// rounded percentage, and gates the loading-screen reveal behind the
/// minimum display time.
#[derive(Debug, Clone, Copy)]
pub struct LoadTracker {
    loaded: u32,
    total: u32,
    started_at_ms: f64,
    model_done: bool,
    environment_done: bool,
    failed: bool,
}

impl LoadTracker {
    pub fn new(now_ms: f64) -> Self {
        Self {
            loaded: 0,
            total: 0,
            started_at_ms: now_ms,
            model_done: false,
            environment_done: false,
            failed: false,
        }
    }

    pub fn queue(&mut self, items: u32) {
        self.total += items;
    }

    pub fn item_loaded(&mut self) {
        self.loaded = (self.loaded + 1).min(self.total);
    }

    pub fn mark_model_done(&mut self) {
        self.model_done = true;
    }

    pub fn mark_environment_done(&mut self) {
        self.environment_done = true;
    }

    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Rounded aggregate percentage for the loading readout.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.loaded as f64 / self.total as f64) * 100.0).round() as u32
    }

    pub fn is_complete(&self) -> bool {
        self.model_done && self.environment_done
    }

    /// True once loading is complete and the minimum display time has
    /// elapsed: hide the loading screen, reveal the viewport. A failed
    /// load never reveals; the screen stays up.
    pub fn should_reveal(&self, now_ms: f64) -> bool {
        self.is_complete() && !self.failed && now_ms - self.started_at_ms >= MIN_DISPLAY_TIME_MS
    }
}
