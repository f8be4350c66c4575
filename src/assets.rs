use std::collections::HashMap;
use std::sync::mpsc;

use anyhow::Context;
use glam::Vec3;
use tokio::task::JoinHandle;

/// One prop to import and place. The manifest is fixed in code; there is no
/// external configuration.
pub struct AssetSpec {
    pub path: &'static str,
    pub position: Vec3,
    pub scale: f32,
    pub name: &'static str,
    pub description: &'static str,
}

pub const MANIFEST: &[AssetSpec] = &[
    AssetSpec {
        path: "assets/models/pumpkin.glb",
        position: Vec3::new(-3.0, 0.0, 2.0),
        scale: 2.0,
        name: "Ember Pumpkin",
        description: "A pumpkin possessed by a fire spirit. Its eyes burn with a hunger for shadows.",
    },
    AssetSpec {
        path: "assets/models/ghost.glb",
        position: Vec3::new(3.0, 2.0, -1.0),
        scale: 4.0,
        name: "Silent Specter",
        description: "It wanders the eternal garden searching for what it lost centuries ago. It does not like to be stared at.",
    },
    AssetSpec {
        path: "assets/models/guardian.glb",
        position: Vec3::new(0.0, 0.0, -4.0),
        scale: 1.0,
        name: "Clockwork Guardian",
        description: "Even in the hereafter, machinery survives. Keeper of the silicon graves.",
    },
    AssetSpec {
        path: "assets/models/gravestone.glb",
        position: Vec3::new(4.0, 0.0, 3.0),
        scale: 1.5,
        name: "Leaning Gravestone",
        description: "The inscription wore away long before anyone thought to read it.",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

pub struct LoadedAsset {
    pub spec: &'static AssetSpec,
    pub document: gltf::Document,
    pub buffers: Vec<gltf::buffer::Data>,
}

/// Observer for load progress. Implementations are opaque sinks; the
/// default one just logs.
pub trait ProgressSink {
    fn on_progress(&mut self, completed: usize, total: usize);
    fn on_complete(&mut self);
}

pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_progress(&mut self, completed: usize, total: usize) {
        log::info!("Loading props: {}/{}", completed, total);
    }

    fn on_complete(&mut self) {
        log::info!("All props accounted for");
    }
}

type LoadResult = (RequestId, &'static AssetSpec, anyhow::Result<LoadedAsset>);

/// Imports manifest entries on a small tokio runtime. Workers only ever
/// talk to the render thread through the channel, drained once per frame;
/// dropping the loader aborts anything still in flight.
pub struct AssetLoader {
    _runtime: tokio::runtime::Runtime,
    tasks: HashMap<RequestId, JoinHandle<()>>,
    receiver: mpsc::Receiver<LoadResult>,
    total: usize,
    completed: usize,
    announced_complete: bool,
}

impl AssetLoader {
    pub fn start(manifest: &'static [AssetSpec]) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("asset-loader")
            .build()
            .context("Failed to create asset loader runtime")?;

        let (sender, receiver) = mpsc::channel();
        let mut tasks = HashMap::new();

        for (index, spec) in manifest.iter().enumerate() {
            let request = RequestId(index as u64);
            let sender = sender.clone();

            let handle = runtime.spawn_blocking(move || {
                let result = gltf::import(spec.path)
                    .with_context(|| format!("Failed to import {}", spec.path))
                    .map(|(document, buffers, _images)| LoadedAsset {
                        spec,
                        document,
                        buffers,
                    });

                // The receiver only disappears on teardown.
                let _ = sender.send((request, spec, result));
            });

            tasks.insert(request, handle);
        }

        Ok(Self {
            _runtime: runtime,
            tasks,
            receiver,
            total: manifest.len(),
            completed: 0,
            announced_complete: false,
        })
    }

    /// Drains imports that finished since the last frame. Failures are
    /// logged and dropped; they still count toward progress so the loading
    /// indicator cannot stall on a missing file.
    pub fn poll_completed(&mut self, progress: &mut dyn ProgressSink) -> Vec<LoadedAsset> {
        let mut ready = Vec::new();

        while let Ok((request, spec, result)) = self.receiver.try_recv() {
            self.tasks.remove(&request);
            self.completed += 1;

            match result {
                Ok(loaded) => ready.push(loaded),
                Err(error) => log::warn!("{} will not appear: {:?}", spec.name, error),
            }

            progress.on_progress(self.completed, self.total);
        }

        if self.completed == self.total && !self.announced_complete {
            self.announced_complete = true;
            progress.on_complete();
        }

        ready
    }

    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

impl Drop for AssetLoader {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct CountingProgress {
        updates: Vec<(usize, usize)>,
        completions: usize,
    }

    impl ProgressSink for CountingProgress {
        fn on_progress(&mut self, completed: usize, total: usize) {
            self.updates.push((completed, total));
        }

        fn on_complete(&mut self) {
            self.completions += 1;
        }
    }

    const MISSING: &[AssetSpec] = &[
        AssetSpec {
            path: "assets/models/does-not-exist-a.glb",
            position: Vec3::ZERO,
            scale: 1.0,
            name: "Phantom A",
            description: "Never materializes.",
        },
        AssetSpec {
            path: "assets/models/does-not-exist-b.glb",
            position: Vec3::ZERO,
            scale: 1.0,
            name: "Phantom B",
            description: "Never materializes either.",
        },
    ];

    #[test]
    fn failed_imports_still_complete_progress() {
        let mut loader = AssetLoader::start(MISSING).unwrap();
        let mut progress = CountingProgress::default();

        let deadline = Instant::now() + Duration::from_secs(10);
        while !loader.is_complete() {
            assert!(Instant::now() < deadline, "loader never completed");
            let loaded = loader.poll_completed(&mut progress);
            assert!(loaded.is_empty(), "missing files must not produce assets");
            std::thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(loader.progress(), 1.0);
        assert_eq!(progress.completions, 1);
        assert_eq!(progress.updates.last(), Some(&(2, 2)));

        // Completion fires exactly once even if polled again.
        loader.poll_completed(&mut progress);
        assert_eq!(progress.completions, 1);
    }
}
