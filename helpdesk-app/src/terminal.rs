use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{info, warn};

use helpdesk_chat::{BubbleView, ChatSession, RateOutcome, SubmitOutcome, VoiceOutcome};
use helpdesk_client::api::OPERATOR_TICKETS_PATH;
use helpdesk_core::{Error, MessageId, Rating};
use helpdesk_operator::{FilterQuery, TicketTable};
use helpdesk_speedtest::{
    CounterSpeedTest, GaugeSpeedTest, LivenessProbe, ModalPresenter, SpeedTestEvent,
    SpeedTestTrigger,
};
use helpdesk_utils::formatting::format_speed_mbps;

use crate::commands::{Command, HELP_TEXT, SpeedTestWidget, load_attachment};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Line-oriented front end over one chat window.
#[derive(Clone)]
pub struct Terminal {
    session: ChatSession,
    printed: Arc<Mutex<usize>>,
    speedtest: SpeedTestTrigger,
    probe: Arc<dyn LivenessProbe>,
}

impl Terminal {
    pub fn new(session: ChatSession, probe: Arc<dyn LivenessProbe>) -> Self {
        Self {
            session,
            printed: Arc::default(),
            speedtest: SpeedTestTrigger::new(),
            probe,
        }
    }

    /// Print messages that appeared since the last flush.
    pub async fn flush(&self) {
        let view = self.session.view().await;
        let mut printed = self.printed.lock().await;

        let messages: Vec<&BubbleView> = view
            .bubbles
            .iter()
            .filter(|bubble| !bubble.typing)
            .collect();
        for bubble in messages.iter().skip(*printed) {
            println!("{}", bubble.to_terminal());
        }
        *printed = messages.len();
    }

    pub async fn print_quick_replies(&self) {
        let Some(options) = self.session.view().await.quick_replies else {
            return;
        };

        for (number, option) in options.iter().enumerate() {
            println!("  /quick {}  {}", number + 1, option.label);
        }
    }

    pub async fn handle(&self, command: Command) -> Result<Flow, Error> {
        match command {
            Command::Say(text) => self.say(text).await,
            Command::Rate { message_id, rating } => self.rate(message_id, rating).await,
            Command::Attach(Some(path)) => {
                let attachment = load_attachment(&path)?;
                let is_image = attachment.is_image();
                self.session.select_file(attachment).await;
                if is_image {
                    println!("Image attached: {}", path.display());
                } else {
                    println!("File attached (no preview): {}", path.display());
                }
            }
            Command::Attach(None) => {
                self.session.clear_file().await;
                println!("Attachment cleared.");
            }
            Command::Quick(index) => {
                let Some(options) = self.session.view().await.quick_replies else {
                    println!("Quick replies are only offered in an empty chat.");
                    return Ok(Flow::Continue);
                };
                if index >= options.len() {
                    println!("No quick reply number {}.", index + 1);
                    return Ok(Flow::Continue);
                }

                let terminal = self.clone();
                println!("{}", BubbleView::typing_indicator().to_terminal());
                tokio::spawn(async move {
                    if let Some(outcome) = terminal.session.quick_reply(index).await {
                        report_submit(outcome);
                    }
                    terminal.flush().await;
                });
            }
            Command::Voice => match self.session.listen().await {
                VoiceOutcome::Transcribed(text) => println!("Heard: {text} (press enter to send)"),
                VoiceOutcome::Unavailable => println!("Voice input is not available here."),
                VoiceOutcome::Busy => println!("Already listening."),
                VoiceOutcome::Failed(reason) => println!("Voice input failed: {reason}"),
                VoiceOutcome::Ended => {}
            },
            Command::Tickets(query) => self.tickets(query).await?,
            Command::SpeedTest(widget) => self.start_speed_test(widget),
            Command::Help => println!("{HELP_TEXT}"),
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    async fn say(&self, text: String) {
        if !text.is_empty() {
            self.session.set_input(text).await;
        }

        let Some(draft) = self.session.take_draft().await else {
            return;
        };

        println!("{}", BubbleView::typing_indicator().to_terminal());
        let terminal = self.clone();
        tokio::spawn(async move {
            let outcome = terminal.session.submit_draft(draft).await;
            report_submit(outcome);
            terminal.flush().await;
        });
    }

    async fn rate(&self, message_id: MessageId, rating: Rating) {
        match self.session.rate(message_id, rating).await {
            RateOutcome::Applied => {
                let view = self.session.view().await;
                let rated = view.bubbles.iter().find(|bubble| {
                    bubble
                        .rating
                        .as_ref()
                        .is_some_and(|controls| controls.message_id == message_id)
                });
                match rated {
                    Some(bubble) => println!("{}", bubble.to_terminal()),
                    None => println!("Rating saved."),
                }
            }
            RateOutcome::Rejected => println!("The server did not accept the rating."),
            RateOutcome::Failed => println!("Could not reach the server to rate the message."),
        }
    }

    async fn tickets(&self, query: FilterQuery) -> Result<(), Error> {
        let page = self.session.client().fetch_page(OPERATOR_TICKETS_PATH).await?;
        let mut table = TicketTable::from_html(&page);
        table.apply(query);

        for line in ticket_lines(&table) {
            println!("{line}");
        }
        Ok(())
    }

    fn start_speed_test(&self, widget: SpeedTestWidget) {
        let Some(guard) = self.speedtest.try_start() else {
            println!("A speed test is already running.");
            return;
        };

        let probe = Arc::clone(&self.probe);
        tokio::spawn(async move {
            let _guard = guard;
            let (events, mut receiver) = unbounded_channel();
            let printer = tokio::spawn(async move {
                while let Some(event) = receiver.recv().await {
                    print_speed_event(&event);
                }
            });

            let modal: Arc<dyn ModalPresenter> = Arc::new(TerminalModal);
            let mut rng = StdRng::from_entropy();
            let summary = match widget {
                SpeedTestWidget::Counter => {
                    let counter = CounterSpeedTest::new(probe, Some(modal));
                    counter.run(&mut rng, &events).await
                }
                SpeedTestWidget::Gauge => {
                    let mut gauge = GaugeSpeedTest::new(Some(modal));
                    gauge.run(&mut rng, &events).await
                }
            };

            drop(events);
            if let Err(source) = printer.await {
                warn!(?source, "speed test printer stopped early");
            }
            info!(speed = summary.speed, ?widget, "speed test run complete");
        });
    }
}

/// Counter label followed by one line per visible row.
pub fn ticket_lines(table: &TicketTable) -> Vec<String> {
    let mut lines = vec![table.counter_label()];
    lines.extend(
        table
            .visible_rows()
            .map(|row| format!("  {}", row.cells().join(" | "))),
    );
    lines
}

fn report_submit(outcome: SubmitOutcome) {
    if let SubmitOutcome::NoReply { submission } = outcome {
        println!("(no reply to message #{submission})");
    }
}

fn print_speed_event(event: &SpeedTestEvent) {
    match event {
        SpeedTestEvent::Stage(stage) => println!("[speedtest] {}", stage.label()),
        SpeedTestEvent::Metrics(metrics) if metrics.download > 0.0 || metrics.ping > 0.0 => {
            println!(
                "[speedtest] ping {} ms, download {}, upload {}",
                metrics.ping,
                format_speed_mbps(metrics.download),
                format_speed_mbps(metrics.upload)
            );
        }
        SpeedTestEvent::Finished { speed, quality } => {
            println!(
                "[speedtest] {} ({})",
                format_speed_mbps(*speed),
                quality.label()
            );
        }
        _ => {}
    }
}

struct TerminalModal;

impl ModalPresenter for TerminalModal {
    fn show_low_speed(&self) {
        println!(
            "[speedtest] Скорость ниже ожидаемой. Опишите проблему в чате, и мы поможем её решить."
        );
    }
}
