use rand::Rng;

/// Chance per frame that a strike begins, roughly one every five to six
/// seconds at 60 Hz.
const STRIKE_CHANCE: f64 = 0.003;

const FIRST_FLASH_SECS: f32 = 0.1;
const GAP_SECS: f32 = 0.05;
const SECOND_FLASH_SECS: f32 = 0.1;

const FIRST_FLASH_INTENSITY: f32 = 1.0;
const SECOND_FLASH_INTENSITY: f32 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightningPhase {
    Idle,
    FirstFlash,
    Gap,
    SecondFlash,
}

/// Double-flash lightning strike driven by the frame tick. The whole
/// sequence lives in one state machine, so a second trigger while a
/// sequence is running cannot interleave with it; it is simply ignored
/// until the sky goes dark again.
pub struct Lightning {
    phase: LightningPhase,
    elapsed: f32,
}

impl Lightning {
    pub fn new() -> Self {
        Self {
            phase: LightningPhase::Idle,
            elapsed: 0.0,
        }
    }

    pub fn phase(&self) -> LightningPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != LightningPhase::Idle
    }

    /// Rolls the per-frame strike chance. Returns true when a new sequence
    /// starts this frame; the caller owes a thunderclap and a camera shake.
    pub fn maybe_strike(&mut self, rng: &mut impl Rng) -> bool {
        if self.is_active() {
            return false;
        }
        if rng.gen_bool(STRIKE_CHANCE) {
            self.phase = LightningPhase::FirstFlash;
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }

    /// Forces a sequence to start, used by tests and debug keys. No-op
    /// while a sequence is active.
    pub fn strike(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        self.phase = LightningPhase::FirstFlash;
        self.elapsed = 0.0;
        true
    }

    pub fn update(&mut self, dt: f32) {
        if self.phase == LightningPhase::Idle {
            return;
        }

        self.elapsed += dt;

        loop {
            let duration = match self.phase {
                LightningPhase::Idle => return,
                LightningPhase::FirstFlash => FIRST_FLASH_SECS,
                LightningPhase::Gap => GAP_SECS,
                LightningPhase::SecondFlash => SECOND_FLASH_SECS,
            };

            if self.elapsed < duration {
                return;
            }

            self.elapsed -= duration;
            self.phase = match self.phase {
                LightningPhase::Idle => LightningPhase::Idle,
                LightningPhase::FirstFlash => LightningPhase::Gap,
                LightningPhase::Gap => LightningPhase::SecondFlash,
                LightningPhase::SecondFlash => LightningPhase::Idle,
            };
        }
    }

    /// Sky flash intensity in [0, 1], added on top of scene lighting.
    pub fn flash_intensity(&self) -> f32 {
        match self.phase {
            LightningPhase::Idle | LightningPhase::Gap => 0.0,
            LightningPhase::FirstFlash => FIRST_FLASH_INTENSITY,
            LightningPhase::SecondFlash => SECOND_FLASH_INTENSITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn sequence_walks_through_both_flashes_and_returns_to_idle() {
        let mut lightning = Lightning::new();
        assert!(lightning.strike());
        assert_eq!(lightning.phase(), LightningPhase::FirstFlash);
        assert_eq!(lightning.flash_intensity(), FIRST_FLASH_INTENSITY);

        let mut seen_gap = false;
        let mut seen_second = false;
        for _ in 0..60 {
            lightning.update(DT);
            match lightning.phase() {
                LightningPhase::Gap => {
                    seen_gap = true;
                    assert_eq!(lightning.flash_intensity(), 0.0);
                }
                LightningPhase::SecondFlash => {
                    seen_second = true;
                    assert_eq!(lightning.flash_intensity(), SECOND_FLASH_INTENSITY);
                }
                _ => {}
            }
        }

        assert!(seen_gap && seen_second);
        assert_eq!(lightning.phase(), LightningPhase::Idle);
        assert_eq!(lightning.flash_intensity(), 0.0);
    }

    #[test]
    fn retrigger_during_sequence_is_ignored() {
        let mut lightning = Lightning::new();
        assert!(lightning.strike());
        lightning.update(DT);
        let phase_before = lightning.phase();
        let elapsed_before = lightning.elapsed;

        assert!(!lightning.strike());
        assert_eq!(lightning.phase(), phase_before);
        assert_eq!(lightning.elapsed, elapsed_before);
    }

    #[test]
    fn oversized_step_skips_cleanly_to_idle() {
        let mut lightning = Lightning::new();
        lightning.strike();
        lightning.update(10.0);
        assert_eq!(lightning.phase(), LightningPhase::Idle);
    }

    #[test]
    fn total_sequence_length_matches_phase_durations() {
        let mut lightning = Lightning::new();
        lightning.strike();

        let total = FIRST_FLASH_SECS + GAP_SECS + SECOND_FLASH_SECS;
        let mut elapsed = 0.0;
        while lightning.is_active() {
            lightning.update(DT);
            elapsed += DT;
            assert!(elapsed < total + DT * 2.0);
        }
        assert!(elapsed >= total - DT);
    }
}
