use rand::{Rng, seq::IndexedRandom};
use uavlink_core::{
    messages::{Command, InboundMessage, StatusUpdate},
    state::{Link, LogEntry, Severity, StatusRecord},
};

pub const SAMPLE_IMAGES: [&str; 3] = ["sample1.png", "sample2.png", "sample3.png"];

const MODES: [&str; 4] = ["manual", "guided", "auto", "rtl"];

const CHATTER: [(&str, Severity); 6] = [
    ("heartbeat received", Severity::Info),
    ("gps fix acquired", Severity::Info),
    ("waypoint reached", Severity::Info),
    ("battery below 30%", Severity::Warning),
    ("wind gusts above limit", Severity::Warning),
    ("telemetry packet dropped", Severity::Error),
];

/// State of the pretend vehicle behind one client connection.
#[derive(Debug, Clone)]
pub struct Vehicle {
    link: Link,
    mode: &'static str,
    images_sent: u64,
    seconds_since_message: u64,
}

impl Default for Vehicle {
    fn default() -> Self {
        Self {
            link: Link::No,
            mode: MODES[0],
            images_sent: 0,
            seconds_since_message: 0,
        }
    }
}

impl Vehicle {
    /// Snapshot for a freshly connected client.
    pub fn load(&self) -> InboundMessage {
        InboundMessage::Load {
            status: StatusRecord {
                connected: self.link,
                mode: self.mode.to_string(),
                image_count: self.images_sent,
                time_since_last_message: self.seconds_since_message,
            },
            image: self.current_image().map(str::to_string),
        }
    }

    pub fn handle_command(&mut self, command: Command) -> Vec<InboundMessage> {
        let (link, text) = match command {
            Command::Connect => (Link::Yes, "vehicle link established"),
            Command::Disconnect => (Link::No, "vehicle link dropped"),
        };
        self.link = link;
        vec![
            StatusUpdate::Connection { value: link }.into(),
            LogEntry::new(text, Severity::Info).into(),
        ]
    }

    /// A chatter log line followed by `new_msg`, now and then preceded by a
    /// mode change.
    pub fn message(&mut self, rng: &mut impl Rng) -> Vec<InboundMessage> {
        let mut out = Vec::with_capacity(3);
        if rng.random_bool(0.1) {
            let mode = MODES.choose(rng).copied().unwrap_or(self.mode);
            if mode != self.mode {
                self.mode = mode;
                out.push(StatusUpdate::Mode { value: mode.to_string() }.into());
            }
        }
        if let Some((text, severity)) = CHATTER.choose(rng) {
            out.push(LogEntry::new(*text, *severity).into());
        }
        out.push(StatusUpdate::NewMsg.into());
        self.seconds_since_message = 0;
        out
    }

    pub fn image(&mut self) -> InboundMessage {
        let name = SAMPLE_IMAGES[(self.images_sent % SAMPLE_IMAGES.len() as u64) as usize];
        self.images_sent += 1;
        StatusUpdate::NewImg {
            value: name.to_string(),
        }
        .into()
    }

    pub fn tick(&mut self) {
        self.seconds_since_message = self.seconds_since_message.saturating_add(1);
    }

    fn current_image(&self) -> Option<&'static str> {
        let last = self.images_sent.checked_sub(1)?;
        Some(SAMPLE_IMAGES[(last % SAMPLE_IMAGES.len() as u64) as usize])
    }
}
