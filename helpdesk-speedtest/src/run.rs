use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Instant, interval_at, sleep, sleep_until};
use tracing::{debug, info};

use helpdesk_utils::formatting::round_to_tenth;

use crate::counter::{COUNTER_TICK, LinearCounter};
use crate::gauge::{GAUGE_MAX_SPEED, Gauge};
use crate::probe::LivenessProbe;
use crate::quality::{SpeedQuality, is_low_speed};

pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);
pub const LOW_SPEED_MODAL_DELAY: Duration = Duration::from_millis(800);
/// Shown when the liveness probe fails.
pub const DEMO_SPEED: f64 = 25.5;

const CONNECTING_AT: Duration = Duration::from_millis(500);
const TESTING_AT: Duration = Duration::from_millis(1500);
const FLICKER_EVERY: Duration = Duration::from_millis(100);
const ANALYSING_AT: Duration = Duration::from_millis(3000);
const PROBE_AT: Duration = Duration::from_millis(4000);
const COUNT_UP: Duration = Duration::from_millis(2000);

const PING_AT: Duration = Duration::from_millis(500);
const DOWNLOAD_AT: Duration = Duration::from_millis(1500);
const RAMP_EVERY: Duration = Duration::from_millis(100);
const DOWNLOAD_DONE_AT: Duration = Duration::from_millis(3000);
const UPLOAD_AT: Duration = Duration::from_millis(3500);
const FINISH_AT: Duration = Duration::from_millis(5000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Initializing,
    Connecting,
    Testing,
    Analysing,
    Latency,
    Download,
    Upload,
    /// The start button is usable again.
    Done,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Self::Initializing => "Инициализация...",
            Self::Connecting => "Установка соединения...",
            Self::Testing => "Измерение скорости...",
            Self::Analysing => "Обработка результатов...",
            Self::Latency => "Измерение задержки...",
            Self::Download => "Тест загрузки...",
            Self::Upload => "Тест отдачи...",
            Self::Done => "Повторить тест",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Metrics {
    pub download: f64,
    pub upload: f64,
    pub ping: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpeedTestEvent {
    Stage(Stage),
    /// Counter widget display value.
    Value(i64),
    Metrics(Metrics),
    /// Gauge widget needle position for one frame.
    Gauge(f64),
    Finished {
        speed: f64,
        quality: SpeedQuality,
    },
    LowSpeedModal,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedTestSummary {
    pub speed: f64,
    pub quality: SpeedQuality,
    pub low_speed_modal: bool,
}

/// Host dialog capability for the low-speed suggestion.
pub trait ModalPresenter: Send + Sync {
    fn show_low_speed(&self);
}

fn emit(events: &UnboundedSender<SpeedTestEvent>, event: SpeedTestEvent) {
    // A closed receiver only means nobody is watching anymore.
    let _ = events.send(event);
}

async fn offer_low_speed_modal(
    modal: Option<&Arc<dyn ModalPresenter>>,
    events: &UnboundedSender<SpeedTestEvent>,
) -> bool {
    sleep(LOW_SPEED_MODAL_DELAY).await;
    let Some(modal) = modal else {
        debug!("no modal presenter; skipping low speed dialog");
        return false;
    };

    modal.show_low_speed();
    emit(events, SpeedTestEvent::LowSpeedModal);
    true
}

/// Numeric counter widget.
pub struct CounterSpeedTest {
    probe: Arc<dyn LivenessProbe>,
    modal: Option<Arc<dyn ModalPresenter>>,
}

impl CounterSpeedTest {
    pub fn new(probe: Arc<dyn LivenessProbe>, modal: Option<Arc<dyn ModalPresenter>>) -> Self {
        Self { probe, modal }
    }

    pub async fn run<R>(
        &self,
        rng: &mut R,
        events: &UnboundedSender<SpeedTestEvent>,
    ) -> SpeedTestSummary
    where
        R: Rng + Send,
    {
        let start = Instant::now();
        emit(events, SpeedTestEvent::Stage(Stage::Initializing));
        emit(events, SpeedTestEvent::Value(0));

        sleep_until(start + CONNECTING_AT).await;
        emit(events, SpeedTestEvent::Stage(Stage::Connecting));

        sleep_until(start + TESTING_AT).await;
        emit(events, SpeedTestEvent::Stage(Stage::Testing));

        let mut flicker_at = start + TESTING_AT + FLICKER_EVERY;
        while flicker_at < start + ANALYSING_AT {
            sleep_until(flicker_at).await;
            let noise: f64 = rng.gen_range(0.0..60.0);
            emit(events, SpeedTestEvent::Value(noise.round() as i64));
            flicker_at += FLICKER_EVERY;
        }

        sleep_until(start + ANALYSING_AT).await;
        emit(events, SpeedTestEvent::Stage(Stage::Analysing));

        sleep_until(start + PROBE_AT).await;
        let alive = self.probe.probe().await;
        let speed = if alive {
            round_to_tenth(rng.gen_range(10.0..50.0))
        } else {
            DEMO_SPEED
        };

        let mut counter = LinearCounter::new(0.0, speed, COUNT_UP);
        let counting_started = Instant::now();
        while !counter.is_done() {
            sleep(COUNTER_TICK).await;
            emit(events, SpeedTestEvent::Value(counter.tick()));
        }

        sleep_until(counting_started + COUNT_UP).await;
        let quality = SpeedQuality::classify(speed);
        info!(speed, ?quality, alive, "speed test finished");
        emit(events, SpeedTestEvent::Finished { speed, quality });
        emit(events, SpeedTestEvent::Stage(Stage::Done));

        let low_speed_modal = alive
            && is_low_speed(speed)
            && offer_low_speed_modal(self.modal.as_ref(), events).await;

        SpeedTestSummary {
            speed,
            quality,
            low_speed_modal,
        }
    }
}

/// Speedometer widget with ping, download and upload readouts.
pub struct GaugeSpeedTest {
    gauge: Gauge,
    metrics: Metrics,
    modal: Option<Arc<dyn ModalPresenter>>,
}

impl GaugeSpeedTest {
    pub fn new(modal: Option<Arc<dyn ModalPresenter>>) -> Self {
        Self {
            gauge: Gauge::new(),
            metrics: Metrics::default(),
            modal,
        }
    }

    pub fn gauge(&self) -> &Gauge {
        &self.gauge
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    fn publish_metrics(&self, events: &UnboundedSender<SpeedTestEvent>) {
        emit(events, SpeedTestEvent::Metrics(self.metrics));
    }

    pub async fn run<R>(
        &mut self,
        rng: &mut R,
        events: &UnboundedSender<SpeedTestEvent>,
    ) -> SpeedTestSummary
    where
        R: Rng + Send,
    {
        self.gauge.reset();
        self.metrics = Metrics::default();
        emit(events, SpeedTestEvent::Stage(Stage::Initializing));
        self.publish_metrics(events);
        emit(events, SpeedTestEvent::Gauge(0.0));

        let start = Instant::now();
        let mut frames = interval_at(start, FRAME_INTERVAL);
        let mut next_ramp = start + DOWNLOAD_AT + RAMP_EVERY;
        let mut ramp_speed = 0.0_f64;
        let (mut ping_done, mut download_started, mut download_done, mut upload_done) =
            (false, false, false, false);

        loop {
            let now = frames.tick().await;
            let elapsed = now.duration_since(start);

            if !ping_done && elapsed >= PING_AT {
                ping_done = true;
                self.metrics.ping = rng.gen_range(10.0..40.0_f64).round();
                emit(events, SpeedTestEvent::Stage(Stage::Latency));
                self.publish_metrics(events);
            }

            if !download_started && elapsed >= DOWNLOAD_AT {
                download_started = true;
                emit(events, SpeedTestEvent::Stage(Stage::Download));
            }

            if download_started && !download_done {
                while next_ramp <= now && next_ramp < start + DOWNLOAD_DONE_AT {
                    ramp_speed += rng.gen_range(0.0..15.0);
                    self.gauge.set_target(ramp_speed.min(GAUGE_MAX_SPEED));
                    next_ramp += RAMP_EVERY;
                }
            }

            if !download_done && elapsed >= DOWNLOAD_DONE_AT {
                download_done = true;
                self.metrics.download = round_to_tenth(rng.gen_range(20.0..80.0));
                self.gauge.set_target(self.metrics.download);
                self.publish_metrics(events);
            }

            if !upload_done && elapsed >= UPLOAD_AT {
                upload_done = true;
                self.metrics.upload = round_to_tenth(rng.gen_range(10.0..40.0));
                emit(events, SpeedTestEvent::Stage(Stage::Upload));
                self.publish_metrics(events);
            }

            if self.gauge.step() {
                emit(events, SpeedTestEvent::Gauge(self.gauge.current()));
            }

            if elapsed >= FINISH_AT {
                break;
            }
        }

        let speed = self.metrics.download;
        let quality = SpeedQuality::classify_coarse(speed);
        info!(
            download = speed,
            upload = self.metrics.upload,
            ping = self.metrics.ping,
            ?quality,
            "speed test finished"
        );
        emit(events, SpeedTestEvent::Finished { speed, quality });
        emit(events, SpeedTestEvent::Stage(Stage::Done));

        // The needle keeps easing after the readouts are final.
        while self.gauge.step() {
            frames.tick().await;
            emit(events, SpeedTestEvent::Gauge(self.gauge.current()));
        }

        let low_speed_modal =
            is_low_speed(speed) && offer_low_speed_modal(self.modal.as_ref(), events).await;

        SpeedTestSummary {
            speed,
            quality,
            low_speed_modal,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

    use super::{
        CounterSpeedTest, DEMO_SPEED, GaugeSpeedTest, ModalPresenter, SpeedTestEvent, Stage,
    };
    use crate::probe::LivenessProbe;
    use crate::quality::SpeedQuality;

    struct FixedProbe(bool);

    #[async_trait]
    impl LivenessProbe for FixedProbe {
        async fn probe(&self) -> bool {
            self.0
        }
    }

    #[derive(Default)]
    struct CountingModal(AtomicUsize);

    impl ModalPresenter for CountingModal {
        fn show_low_speed(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn drain(mut rx: UnboundedReceiver<SpeedTestEvent>) -> Vec<SpeedTestEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn stages(events: &[SpeedTestEvent]) -> Vec<Stage> {
        events
            .iter()
            .filter_map(|event| match event {
                SpeedTestEvent::Stage(stage) => Some(*stage),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn counter_run_walks_through_stages_and_counts_to_result() {
        let (tx, rx) = unbounded_channel();
        let widget = CounterSpeedTest::new(Arc::new(FixedProbe(true)), None);
        let mut rng = StdRng::seed_from_u64(7);

        let summary = widget.run(&mut rng, &tx).await;
        let events = drain(rx);

        assert_eq!(
            stages(&events),
            [
                Stage::Initializing,
                Stage::Connecting,
                Stage::Testing,
                Stage::Analysing,
                Stage::Done
            ]
        );
        assert!((10.0..50.0).contains(&summary.speed));
        assert_eq!(summary.quality, SpeedQuality::classify(summary.speed));

        let last_value = events.iter().rev().find_map(|event| match event {
            SpeedTestEvent::Value(value) => Some(*value),
            _ => None,
        });
        assert_eq!(last_value, Some(summary.speed.round() as i64));
        assert!(events.contains(&SpeedTestEvent::Finished {
            speed: summary.speed,
            quality: summary.quality,
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn counter_falls_back_to_demo_speed_when_probe_fails() {
        let (tx, rx) = unbounded_channel();
        let modal = Arc::new(CountingModal::default());
        let widget = CounterSpeedTest::new(Arc::new(FixedProbe(false)), Some(modal.clone()));
        let mut rng = StdRng::seed_from_u64(1);

        let summary = widget.run(&mut rng, &tx).await;

        assert_eq!(summary.speed, DEMO_SPEED);
        assert_eq!(summary.quality, SpeedQuality::Good);
        assert!(!summary.low_speed_modal);
        assert_eq!(modal.0.load(Ordering::SeqCst), 0);
        assert!(!drain(rx).contains(&SpeedTestEvent::LowSpeedModal));
    }

    #[tokio::test(start_paused = true)]
    async fn gauge_run_reports_metrics_and_settles_needle() {
        let (tx, rx) = unbounded_channel();
        let mut widget = GaugeSpeedTest::new(None);
        let mut rng = StdRng::seed_from_u64(42);

        let summary = widget.run(&mut rng, &tx).await;
        let metrics = widget.metrics();
        let events = drain(rx);

        assert!((20.0..80.0).contains(&metrics.download));
        assert!((10.0..40.0).contains(&metrics.upload));
        assert!((10.0..=40.0).contains(&metrics.ping));
        assert_eq!(summary.speed, metrics.download);
        assert_eq!(summary.quality, SpeedQuality::classify_coarse(metrics.download));
        assert!(widget.gauge().is_settled());
        assert_eq!(widget.gauge().current(), metrics.download);

        assert_eq!(
            stages(&events),
            [
                Stage::Initializing,
                Stage::Latency,
                Stage::Download,
                Stage::Upload,
                Stage::Done
            ]
        );
        assert!(
            events
                .iter()
                .filter(|event| matches!(event, SpeedTestEvent::Gauge(_)))
                .count()
                > 10
        );
    }

    #[tokio::test(start_paused = true)]
    async fn gauge_state_is_per_instance() {
        let (tx, _rx) = unbounded_channel();
        let mut first = GaugeSpeedTest::new(None);
        let second = GaugeSpeedTest::new(None);

        first.run(&mut StdRng::seed_from_u64(3), &tx).await;

        assert!(first.gauge().current() > 0.0);
        assert_eq!(second.gauge().current(), 0.0);
        assert_eq!(second.metrics().download, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn low_counter_result_offers_modal() {
        let modal = Arc::new(CountingModal::default());
        let mut summaries = Vec::new();

        for seed in 0..200 {
            let (tx, rx) = unbounded_channel();
            let widget =
                CounterSpeedTest::new(Arc::new(FixedProbe(true)), Some(modal.clone()));
            let summary = widget.run(&mut StdRng::seed_from_u64(seed), &tx).await;
            if summary.speed < 15.0 {
                assert!(summary.low_speed_modal);
                assert!(drain(rx).contains(&SpeedTestEvent::LowSpeedModal));
                summaries.push(summary);
                break;
            }
        }

        assert_eq!(summaries.len(), 1);
        assert_eq!(modal.0.load(Ordering::SeqCst), 1);
    }
}
