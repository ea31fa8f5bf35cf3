use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::render::surface::{PixelFormat, Surface};

/// Pool configuration for cached offscreen surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SurfacePoolOpts {
    /// Maximum bytes retained across all buckets.
    pub max_pool_bytes: usize,
    /// Maximum number of retained surfaces per (w,h,format) bucket.
    pub max_surfaces_per_bucket: usize,
}

impl Default for SurfacePoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 256 * 1024 * 1024,
            max_surfaces_per_bucket: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SurfaceKey {
    w: u32,
    h: u32,
    format: PixelFormat,
}

impl SurfaceKey {
    fn byte_len(self) -> usize {
        let px = (self.w as usize).saturating_mul(self.h as usize);
        px.saturating_mul(self.format.bytes_per_pixel())
    }
}

/// Allocation counters. `borrowed` counts every borrow, `alloc_surfaces` only the misses.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SurfacePoolStats {
    /// Surfaces currently parked in the pool.
    pub retained_surfaces: usize,
    /// Bytes currently parked in the pool.
    pub retained_bytes: usize,
    /// Total borrows served.
    pub borrowed: u64,
    /// Borrows that had to allocate.
    pub alloc_surfaces: u64,
    /// Bytes allocated by those misses.
    pub alloc_bytes: u64,
    /// Releases dropped because a cap was reached.
    pub dropped_on_release: u64,
}

struct Bucket {
    surfaces: Vec<Surface>,
}

#[derive(Default)]
struct PoolState {
    stats: SurfacePoolStats,
    // Hash lookup is acceptable here: borrow/release happen per layer, not per pixel.
    bucket_idx_by_key: HashMap<SurfaceKey, usize>,
    buckets: Vec<Bucket>,
}

/// Bounded pool of offscreen surfaces shared by the render workers.
///
/// Keyed by `(width, height, format)`. Borrowed surfaces are always cleared to transparent.
pub struct SurfacePool {
    opts: SurfacePoolOpts,
    state: Mutex<PoolState>,
}

impl std::fmt::Debug for SurfacePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfacePool")
            .field("opts", &self.opts)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for SurfacePool {
    fn default() -> Self {
        Self::new(SurfacePoolOpts::default())
    }
}

impl SurfacePool {
    /// Empty pool.
    pub fn new(opts: SurfacePoolOpts) -> Self {
        Self {
            opts,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> SurfacePoolStats {
        self.lock().stats.clone()
    }

    /// Take a transparent `width x height` surface, reusing a parked one when possible.
    pub fn borrow(&self, width: u32, height: u32) -> Surface {
        let key = SurfaceKey {
            w: width,
            h: height,
            format: PixelFormat::Rgba8Premul,
        };
        let mut st = self.lock();
        st.stats.borrowed = st.stats.borrowed.saturating_add(1);
        if let Some(&bi) = st.bucket_idx_by_key.get(&key)
            && let Some(mut s) = st.buckets[bi].surfaces.pop()
        {
            st.stats.retained_surfaces = st.stats.retained_surfaces.saturating_sub(1);
            st.stats.retained_bytes = st.stats.retained_bytes.saturating_sub(key.byte_len());
            drop(st);
            s.data_mut().fill(0);
            return s;
        }

        st.stats.alloc_surfaces = st.stats.alloc_surfaces.saturating_add(1);
        st.stats.alloc_bytes = st.stats.alloc_bytes.saturating_add(key.byte_len() as u64);
        drop(st);
        Surface::new(width, height)
    }

    /// Park `surface` for reuse, or drop it when a cap is reached.
    pub fn release(&self, surface: Surface) {
        let mut st = self.lock();
        if self.opts.max_pool_bytes == 0 || self.opts.max_surfaces_per_bucket == 0 {
            st.stats.dropped_on_release = st.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let key = SurfaceKey {
            w: surface.width(),
            h: surface.height(),
            format: PixelFormat::Rgba8Premul,
        };
        let bytes = key.byte_len();

        if st.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes {
            st.stats.dropped_on_release = st.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bi = match st.bucket_idx_by_key.get(&key).copied() {
            Some(i) => i,
            None => {
                let i = st.buckets.len();
                st.buckets.push(Bucket {
                    surfaces: Vec::new(),
                });
                st.bucket_idx_by_key.insert(key, i);
                i
            }
        };

        if st.buckets[bi].surfaces.len() >= self.opts.max_surfaces_per_bucket {
            st.stats.dropped_on_release = st.stats.dropped_on_release.saturating_add(1);
            return;
        }

        st.buckets[bi].surfaces.push(surface);
        st.stats.retained_surfaces = st.stats.retained_surfaces.saturating_add(1);
        st.stats.retained_bytes = st.stats.retained_bytes.saturating_add(bytes);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface_pool.rs"]
mod tests;
