//! Overworld overview computed off the main thread.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
    thread::{self, JoinHandle},
};

use glam::dvec2;

use crate::{prelude::*, FractalField};

/// One escape-time sample per overworld screen.
#[derive(Clone, Debug, PartialEq)]
pub struct Overview {
    pub screens: i32,
    pub samples: Vec<u32>,
}

impl Overview {
    pub fn compute(field: &FractalField, screens: i32, screen_size: IVec2) -> Self {
        let mut samples = Vec::with_capacity((screens * screens).max(0) as usize);
        for y in 0..screens {
            for x in 0..screens {
                let center = (ivec2(x, y) * screen_size).as_dvec2()
                    + screen_size.as_dvec2() * dvec2(0.5, 0.5);
                samples.push(field.escape(field.to_plane(center)));
            }
        }
        Overview { screens, samples }
    }

    pub fn sample(&self, screen: IVec2) -> Option<u32> {
        if !(0..self.screens).contains(&screen.x)
            || !(0..self.screens).contains(&screen.y)
        {
            return None;
        }
        self.samples
            .get((screen.y * self.screens + screen.x) as usize)
            .copied()
    }
}

/// Handle to the background overview computation.
///
/// The worker only ever publishes through the `OnceLock`, readers never see
/// a half-built overview.
#[derive(Default)]
pub struct WorldMap {
    cache: Arc<OnceLock<Overview>>,
    rendering: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl WorldMap {
    /// Start computing the overview in the background.
    pub fn spawn(field: FractalField, screens: i32, screen_size: IVec2) -> Self {
        let cache = Arc::new(OnceLock::new());
        let rendering = Arc::new(AtomicBool::new(true));

        let worker = {
            let cache = cache.clone();
            let rendering = rendering.clone();
            thread::Builder::new()
                .name("world-map".into())
                .spawn(move || {
                    let overview = Overview::compute(&field, screens, screen_size);
                    log::debug!("world map ready, {} screens", overview.samples.len());
                    let _ = cache.set(overview);
                    rendering.store(false, Ordering::Release);
                })
        };

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("world map thread failed to start: {e}, computing inline");
                let _ = cache.set(Overview::compute(&field, screens, screen_size));
                rendering.store(false, Ordering::Release);
                None
            }
        };

        WorldMap {
            cache,
            rendering,
            worker,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cache.get().is_some()
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::Acquire)
    }

    pub fn get(&self) -> Option<&Overview> {
        self.cache.get()
    }

    /// Block until the overview is published.
    pub fn wait(&mut self) -> Option<&Overview> {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("world map thread panicked");
            }
        }
        self.cache.get()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn background_overview() {
        let field = FractalField::new(3, ivec2(40 * 4, 24 * 4));
        let mut map = WorldMap::spawn(field, 4, ivec2(40, 24));
        let overview = map.wait().cloned().unwrap();
        assert!(map.is_ready());
        assert!(!map.is_rendering());
        assert_eq!(overview.samples.len(), 16);
        assert_eq!(overview, Overview::compute(&field, 4, ivec2(40, 24)));
        assert!(overview.sample(ivec2(4, 0)).is_none());
    }
}
