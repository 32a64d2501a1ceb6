//! Cosmetic connection speed test. Numbers are simulated; the only real
//! network activity is a liveness probe whose result is discarded.

pub mod counter;
pub mod gauge;
pub mod probe;
pub mod quality;
pub mod run;
pub mod trigger;

pub use counter::LinearCounter;
pub use gauge::Gauge;
pub use probe::{HttpProbe, LivenessProbe};
pub use quality::SpeedQuality;
pub use run::{
    CounterSpeedTest, GaugeSpeedTest, Metrics, ModalPresenter, SpeedTestEvent, SpeedTestSummary,
    Stage,
};
pub use trigger::{RunGuard, SpeedTestTrigger};
