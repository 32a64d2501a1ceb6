use std::f64::consts::PI;

pub const GAUGE_MAX_SPEED: f64 = 100.0;
pub const ARC_START: f64 = 0.75 * PI;
pub const ARC_SWEEP: f64 = 1.5 * PI;
const EASING: f64 = 0.1;
const SNAP_DISTANCE: f64 = 0.1;

/// Needle state of one speedometer. Each widget owns its own.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gauge {
    current: f64,
    target: f64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.current = 0.0;
        self.target = 0.0;
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }

    /// Advance one animation frame. Returns false when there was nothing to do.
    pub fn step(&mut self) -> bool {
        if self.is_settled() {
            return false;
        }

        let diff = self.target - self.current;
        if diff.abs() > SNAP_DISTANCE {
            self.current += diff * EASING;
        } else {
            self.current = self.target;
        }
        true
    }

    /// Filled fraction of the arc.
    pub fn progress(&self) -> f64 {
        (self.current / GAUGE_MAX_SPEED).clamp(0.0, 1.0)
    }

    /// End angle (radians) of the active arc.
    pub fn arc_end(&self) -> f64 {
        ARC_START + self.progress() * ARC_SWEEP
    }

    /// Value printed in the middle of the dial.
    pub fn label(&self) -> String {
        format!("{}", self.current.round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::{ARC_START, ARC_SWEEP, Gauge};

    #[test]
    fn eases_toward_target_then_snaps() {
        let mut gauge = Gauge::new();
        gauge.set_target(50.0);

        assert!(gauge.step());
        assert!((gauge.current() - 5.0).abs() < 1e-9);

        let mut frames = 1;
        while gauge.step() {
            frames += 1;
            assert!(frames < 1_000);
        }
        assert_eq!(gauge.current(), 50.0);
        assert!(gauge.is_settled());
        assert!(!gauge.step());
    }

    #[test]
    fn moves_down_as_well_as_up() {
        let mut gauge = Gauge::new();
        gauge.set_target(80.0);
        while gauge.step() {}
        gauge.set_target(20.0);
        gauge.step();
        assert!(gauge.current() < 80.0 && gauge.current() > 20.0);
    }

    #[test]
    fn arc_is_clamped_to_full_sweep() {
        let mut gauge = Gauge::new();
        assert_eq!(gauge.arc_end(), ARC_START);

        gauge.set_target(250.0);
        while gauge.step() {}
        assert_eq!(gauge.progress(), 1.0);
        assert_eq!(gauge.arc_end(), ARC_START + ARC_SWEEP);
        assert_eq!(gauge.label(), "250");
    }
}
