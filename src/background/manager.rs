//! Active background bookkeeping.
//!
//! Loads run on short-lived threads and come back over a channel; the render thread applies
//! them between frames. Every load captures the generation current when it was requested and
//! is discarded if the generation moved on (a newer request, or shutdown).

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crossbeam_channel::{Receiver, Sender};

use crate::{
    background::{
        descriptor::{ActiveBackground, BackgroundKey, BackgroundRequest},
        source::{BackgroundLoader, LoadedBackground},
    },
    foundation::{
        core::Rgba8,
        error::{MatteError, MatteResult},
    },
    render::backend::MatteBackend,
};

/// A recoverable background failure. The default colour was substituted.
#[derive(Debug)]
pub struct BackgroundReport {
    pub request: BackgroundRequest,
    pub error: MatteError,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackgroundStats {
    pub uploads: u64,
    pub cache_hits: u64,
    pub failures: u64,
    pub stale_drops: u64,
}

struct LoadOutcome {
    generation: u64,
    request: BackgroundRequest,
    result: MatteResult<LoadedBackground>,
}

pub struct BackgroundManager {
    loader: Arc<dyn BackgroundLoader>,
    default_color: Rgba8,
    generation: Arc<AtomicU64>,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
    active: Option<ActiveBackground>,
    pending: Option<BackgroundKey>,
    reports: Vec<BackgroundReport>,
    stats: BackgroundStats,
}

impl BackgroundManager {
    pub fn new(loader: Arc<dyn BackgroundLoader>, default_color: Rgba8) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            loader,
            default_color,
            generation: Arc::new(AtomicU64::new(0)),
            tx,
            rx,
            active: None,
            pending: None,
            reports: Vec::new(),
            stats: BackgroundStats::default(),
        }
    }

    pub fn active(&self) -> Option<&ActiveBackground> {
        self.active.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn stats(&self) -> BackgroundStats {
        self.stats
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn drain_reports(&mut self) -> Vec<BackgroundReport> {
        std::mem::take(&mut self.reports)
    }

    /// Resolve `request` on the calling thread.
    ///
    /// Same identity as the active background: nothing is uploaded. Load failures fall back to
    /// the default colour and are queued as reports; only backend failures are returned.
    pub fn resolve(
        &mut self,
        request: &BackgroundRequest,
        backend: &mut dyn MatteBackend,
    ) -> MatteResult<&ActiveBackground> {
        // supersedes anything still loading
        if self.pending.take().is_some() {
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        let key = request.key();
        if self.is_active(key) {
            self.stats.cache_hits += 1;
        } else {
            let loaded = self.loader.load(request);
            self.settle(request.clone(), loaded, backend)?;
        }
        self.ensure_default(backend)
    }

    /// Start loading `request` off the render thread. Returns `false` when nothing needed to be
    /// loaded (already active or already in flight).
    pub fn request(&mut self, request: BackgroundRequest) -> MatteResult<bool> {
        let key = request.key();
        if self.pending == Some(key) {
            self.stats.cache_hits += 1;
            return Ok(false);
        }
        if self.is_active(key) {
            // back to the active source: cancel whatever is still loading
            if self.pending.take().is_some() {
                self.generation.fetch_add(1, Ordering::AcqRel);
            }
            self.stats.cache_hits += 1;
            return Ok(false);
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.pending = Some(key);

        if let BackgroundRequest::Color(c) = request {
            let _ = self.tx.send(LoadOutcome {
                generation,
                result: Ok(LoadedBackground::Color(c)),
                request,
            });
            return Ok(true);
        }

        let loader = Arc::clone(&self.loader);
        let current = Arc::clone(&self.generation);
        let tx = self.tx.clone();
        std::thread::Builder::new()
            .name("segmatte-bg-load".to_string())
            .spawn(move || {
                let result = loader.load(&request);
                if current.load(Ordering::Acquire) != generation {
                    // superseded or closed; dropping `result` releases any decoder
                    tracing::trace!(?request, "background load finished after being superseded");
                    return;
                }
                let _ = tx.send(LoadOutcome {
                    generation,
                    request,
                    result,
                });
            })
            .map_err(|e| {
                self.pending = None;
                MatteError::asset(format!("failed to spawn background loader: {e}"))
            })?;
        Ok(true)
    }

    /// Apply every finished load that is still current. Called on the render thread.
    pub fn apply_ready(&mut self, backend: &mut dyn MatteBackend) -> MatteResult<()> {
        while let Ok(outcome) = self.rx.try_recv() {
            if outcome.generation != self.generation() {
                self.stats.stale_drops += 1;
                tracing::trace!(request = ?outcome.request, "dropping stale background load");
                continue;
            }
            self.pending = None;
            let key = outcome.request.key();
            if self.is_active(key) {
                self.stats.cache_hits += 1;
                continue;
            }
            self.settle(outcome.request, outcome.result, backend)?;
        }
        Ok(())
    }

    /// Make sure something is active, installing the default colour if needed.
    pub fn ensure_default(
        &mut self,
        backend: &mut dyn MatteBackend,
    ) -> MatteResult<&ActiveBackground> {
        if self.active.is_none() {
            let color = self.default_color;
            self.install(
                BackgroundRequest::Color(color).key(),
                LoadedBackground::Color(color),
                backend,
            )?;
        }
        self.active
            .as_ref()
            .ok_or_else(|| MatteError::resource("no active background after install"))
    }

    /// Copy a newer frame of an active video background into its texture.
    pub fn refresh_streaming(&mut self, backend: &mut dyn MatteBackend) -> MatteResult<()> {
        let Some(ActiveBackground::Video {
            texture,
            surface,
            uploaded_version,
            ..
        }) = &mut self.active
        else {
            return Ok(());
        };
        let version = surface.version();
        if version == *uploaded_version {
            return Ok(());
        }
        if let Some(frame) = surface.latest() {
            backend.refresh_background(*texture, &frame)?;
            *uploaded_version = version;
        }
        Ok(())
    }

    /// Invalidate in-flight loads and forget the active background. Textures are left to
    /// the backend's own release.
    pub fn shutdown(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.pending = None;
        self.active = None;
        while self.rx.try_recv().is_ok() {
            self.stats.stale_drops += 1;
        }
    }

    fn is_active(&self, key: BackgroundKey) -> bool {
        self.active.as_ref().is_some_and(|a| a.key() == key)
    }

    fn settle(
        &mut self,
        request: BackgroundRequest,
        loaded: MatteResult<LoadedBackground>,
        backend: &mut dyn MatteBackend,
    ) -> MatteResult<()> {
        let err = match loaded {
            Ok(loaded) => match self.install(request.key(), loaded, backend) {
                Ok(()) => return Ok(()),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => e,
            },
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => e,
        };

        tracing::warn!(?request, "background unavailable, using default colour: {err}");
        self.stats.failures += 1;
        self.reports.push(BackgroundReport {
            request,
            error: err,
        });
        let color = self.default_color;
        let key = BackgroundRequest::Color(color).key();
        if !self.is_active(key) {
            self.install(key, LoadedBackground::Color(color), backend)?;
        }
        Ok(())
    }

    /// Upload, make active, then release whatever was active before.
    fn install(
        &mut self,
        key: BackgroundKey,
        loaded: LoadedBackground,
        backend: &mut dyn MatteBackend,
    ) -> MatteResult<()> {
        let version = match &loaded {
            LoadedBackground::Video { surface, .. } => surface.version(),
            _ => 0,
        };
        let pixels = loaded.initial_pixels();
        let texture = backend.upload_background(&pixels)?;
        self.stats.uploads += 1;

        let next = match loaded {
            LoadedBackground::Image(px) => ActiveBackground::Image {
                key,
                texture,
                size: px.size(),
            },
            LoadedBackground::Video { surface, .. } => ActiveBackground::Video {
                key,
                texture,
                size: surface.size(),
                surface,
                uploaded_version: version,
            },
            LoadedBackground::Color(color) => ActiveBackground::Color {
                key,
                texture,
                color,
            },
        };
        tracing::debug!(key = key.as_u64(), texture = texture.as_u64(), "background installed");
        if let Some(previous) = self.active.replace(next) {
            backend.release_background(previous.texture());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/background/manager.rs"]
mod tests;
