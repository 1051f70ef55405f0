use std::time::Duration;

/// Period between level updates in the demo driver.
pub const DEFAULT_TICK: Duration = Duration::from_millis(60);

const STEP: f32 = 0.01;

/// Triangle-wave level generator: climbs by a fixed step per tick and turns
/// around once the current level reaches either end of `0..=1`.
#[derive(Debug, Default, Clone)]
pub struct LevelRamp {
    falling: bool,
}

impl LevelRamp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the level that should follow `current`.
    pub fn next_level(&mut self, current: f32) -> f32 {
        if current >= 1.0 {
            self.falling = true;
        } else if current <= 0.0 {
            self.falling = false;
        }

        if self.falling {
            current - STEP
        } else {
            current + STEP
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn climbs_from_the_default_level() {
        let mut ramp = LevelRamp::new();
        let next = ramp.next_level(0.5);
        assert!((next - 0.51).abs() < 1e-6);
    }

    #[test]
    fn reverses_at_both_ends() {
        let mut ramp = LevelRamp::new();
        assert!(ramp.next_level(1.0) < 1.0);
        assert!(ramp.next_level(0.7) < 0.7);
        assert!(ramp.next_level(0.0) > 0.0);
        assert!(ramp.next_level(0.2) > 0.2);
    }

    #[test]
    fn oscillates_over_many_ticks() {
        let mut ramp = LevelRamp::new();
        let mut level = 0.5;
        let mut peak = f32::MIN;
        let mut trough = f32::MAX;
        for _ in 0..400 {
            level = ramp.next_level(level);
            peak = peak.max(level);
            trough = trough.min(level);
        }
        assert!(peak >= 1.0 && peak < 1.02);
        assert!(trough <= 0.0 && trough > -0.02);
    }
}
