/// Scene tuning knobs. There is no external configuration; everything the
/// scene needs is decided here and in the asset manifest.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Seed for particle placement and flicker jitter. Fixed so the garden
    /// looks the same on every launch.
    pub seed: u64,
    pub fog_count: usize,
    pub ember_count: usize,
    pub rain_count: usize,
    pub leaf_count: usize,
    pub bat_count: usize,
    pub tree_count: usize,
    pub auto_rotate: bool,
    pub bloom: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_CAB1,
            fog_count: 24,
            ember_count: 160,
            rain_count: 400,
            leaf_count: 60,
            bat_count: 7,
            tree_count: 12,
            auto_rotate: true,
            bloom: true,
        }
    }
}
