use std::io::{self, Write};

use uavlink_core::{
    session::Phase,
    state::{LogEntry, Severity, ViewState},
};

/// Plain-text renderer: a one-line summary whenever something other than the
/// message clock changes, plus every log line it has not printed yet.
#[derive(Debug, Default)]
pub struct Renderer {
    seen_logs: u64,
    last_summary: Option<String>,
}

impl Renderer {
    pub fn render(&mut self, out: &mut impl Write, state: &ViewState, phase: Phase) -> io::Result<()> {
        for entry in self.unseen_logs(state) {
            writeln!(out, "{}", log_line(entry))?;
        }

        let summary = summary(state, phase);
        if self.last_summary.as_ref() != Some(&summary) {
            writeln!(out, "{summary}")?;
            self.last_summary = Some(summary);
        }
        out.flush()
    }

    /// Summary including the seconds since the last vehicle message.
    pub fn status(&self, out: &mut impl Write, state: &ViewState, phase: Phase) -> io::Result<()> {
        writeln!(
            out,
            "{} | last message {}s ago | {} log lines",
            summary(state, phase),
            state.status.time_since_last_message,
            state.logs.len()
        )?;
        out.flush()
    }

    /// oldest first
    fn unseen_logs<'a>(&mut self, state: &'a ViewState) -> Vec<&'a LogEntry> {
        let total = state.logs.total_pushed();
        let fresh = usize::try_from(total.saturating_sub(self.seen_logs)).unwrap_or(usize::MAX);
        self.seen_logs = total;
        let mut entries: Vec<_> = state.logs.iter().take(fresh).collect();
        entries.reverse();
        entries
    }
}

fn summary(state: &ViewState, phase: Phase) -> String {
    let status = &state.status;
    format!(
        "[{phase}] link={} mode={} images={} image={}",
        status.connected,
        status.mode,
        status.image_count,
        state.current_image.as_deref().unwrap_or("-")
    )
}

fn log_line(entry: &LogEntry) -> String {
    let tag = match entry.severity {
        Severity::Info => "info ",
        Severity::Warning => "warn ",
        Severity::Error => "ERROR",
    };
    format!("  {tag} {}", entry.message)
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]
    use uavlink_core::messages::{InboundMessage, StatusUpdate};

    use super::*;

    fn render(renderer: &mut Renderer, state: &ViewState, phase: Phase) -> String {
        let mut out = Vec::new();
        renderer.render(&mut out, state, phase).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn log(message: &str, severity: Severity) -> InboundMessage {
        LogEntry::new(message, severity).into()
    }

    #[test]
    fn test_initial_summary() {
        let mut renderer = Renderer::default();
        let out = render(&mut renderer, &ViewState::default(), Phase::Unconfigured);
        assert_eq!(out, "[unconfigured] link=no mode=null images=0 image=-\n");
    }

    #[test]
    fn test_clock_alone_prints_nothing() {
        let mut renderer = Renderer::default();
        let state = ViewState::default();
        render(&mut renderer, &state, Phase::Open);
        let out = render(&mut renderer, &state.tick().tick(), Phase::Open);
        assert_eq!(out, "");
    }

    #[test]
    fn test_new_logs_print_oldest_first_once() {
        let mut renderer = Renderer::default();
        let state = ViewState::default().apply(&log("first", Severity::Info));
        let out = render(&mut renderer, &state, Phase::Open);
        assert!(out.starts_with("  info  first\n"));

        let state = state
            .apply(&log("second", Severity::Warning))
            .apply(&log("third", Severity::Error));
        let out = render(&mut renderer, &state, Phase::Open);
        assert_eq!(out, "  warn  second\n  ERROR third\n");

        assert_eq!(render(&mut renderer, &state, Phase::Open), "");
    }

    #[test]
    fn test_evicted_logs_are_skipped() {
        let mut renderer = Renderer::default();
        let mut state = ViewState::new(Some(2));
        for i in 0..5 {
            state = state.apply(&log(&format!("line {i}"), Severity::Info));
        }
        let out = render(&mut renderer, &state, Phase::Open);
        assert!(out.starts_with("  info  line 3\n  info  line 4\n"));
    }

    #[test]
    fn test_status_changes_reprint_summary() {
        let mut renderer = Renderer::default();
        let state = ViewState::default();
        render(&mut renderer, &state, Phase::Connecting);
        let state = state.apply(&StatusUpdate::NewImg {
            value: "img_001.jpg".to_string(),
        }
        .into());
        let out = render(&mut renderer, &state, Phase::Open);
        assert_eq!(out, "[open] link=no mode=null images=1 image=img_001.jpg\n");
    }

    #[test]
    fn test_status_line() {
        let renderer = Renderer::default();
        let mut out = Vec::new();
        let state = ViewState::default().tick().tick().tick();
        renderer.status(&mut out, &state, Phase::Closed).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[closed] link=no mode=null images=0 image=- | last message 3s ago | 0 log lines\n"
        );
    }
}
