//! A [`BattleHost`] that prints the battle as plain text.
//!
//! Log text and message-window lines go to the writer; everything else
//! (animations, sounds, collapse effects) is only traced. There is no event
//! interpreter, so troop pages and common events finish immediately.

use std::io::{self, Write};

use battle_core::{BattleHost, BattleLog, BattleOutcome, EventRunner, LogCommand, SoundCue, SoundSink};
use tracing::{debug, info, trace};

pub struct ConsoleHost<W> {
    out: W,
    error: Option<io::Error>,
    lines: usize,
    outcome: Option<BattleOutcome>,
}

impl<W: Write> ConsoleHost<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            error: None,
            lines: 0,
            outcome: None,
        }
    }

    /// Lines written so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    /// Flushes and hands back the writer, or the first write error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_line(&mut self, line: &str) {
        if self.error.is_some() {
            return;
        }
        match writeln!(self.out, "{line}") {
            Ok(()) => self.lines += 1,
            Err(err) => self.error = Some(err),
        }
    }
}

impl<W: Write> BattleLog for ConsoleHost<W> {
    fn push(&mut self, command: LogCommand) {
        if let Some(cue) = command.sound_cue() {
            self.play(cue);
        }
        match command {
            LogCommand::AddText(text) => self.write_line(&text),
            other => trace!(command = ?other, "log command"),
        }
    }

    fn is_busy(&self) -> bool {
        false
    }
}

impl<W: Write> SoundSink for ConsoleHost<W> {
    fn play(&mut self, cue: SoundCue) {
        trace!(%cue, "sound");
    }
}

impl<W: Write> EventRunner for ConsoleHost<W> {
    fn setup_page(&mut self, troop_id: u32, page_index: usize) {
        debug!(troop_id, page_index, "battle event page has no interpreter");
    }

    fn setup_common_event(&mut self, event_id: u32) {
        debug!(event_id, "common event has no interpreter");
    }

    fn is_running(&self) -> bool {
        false
    }

    fn update(&mut self) {}
}

impl<W: Write> BattleHost for ConsoleHost<W> {
    fn show_message(&mut self, text: String) {
        self.write_line(&format!("> {text}"));
    }

    fn new_message_page(&mut self) {
        self.write_line("");
    }

    fn on_battle_end(&mut self, outcome: BattleOutcome) {
        info!(%outcome, code = outcome.code(), "battle ended");
        self.outcome = Some(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::BattlerId;

    #[test]
    fn prints_log_text_and_messages_only() {
        let mut host = ConsoleHost::new(Vec::new());
        host.push(LogCommand::AddText("Slime A attacks!".into()));
        host.push(LogCommand::PerformDamage(BattlerId::Actor(1)));
        host.push(LogCommand::Wait);
        host.show_message("Reid's party was victorious!".into());
        host.on_battle_end(BattleOutcome::Victory);

        assert_eq!(host.lines(), 2);
        assert_eq!(host.outcome(), Some(BattleOutcome::Victory));
        let out = String::from_utf8(host.finish().unwrap()).unwrap();
        assert_eq!(out, "Slime A attacks!\n> Reid's party was victorious!\n");
    }

    #[test]
    fn events_never_keep_running() {
        let mut host = ConsoleHost::new(io::sink());
        host.setup_page(1, 0);
        host.setup_common_event(4);
        assert!(!host.is_running());
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn first_write_error_is_reported() {
        let mut host = ConsoleHost::new(Broken);
        host.push(LogCommand::AddText("lost".into()));
        host.push(LogCommand::AddText("also lost".into()));
        assert_eq!(host.lines(), 0);
        assert!(host.finish().is_err());
    }
}
