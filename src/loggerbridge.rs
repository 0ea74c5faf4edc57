use serde::Serialize;
use std::io::Write;
use tracing::debug;
use trapcycle_bus::{NoteOn, Trigger};
use trapcycle_core::note::pitch_name;

/// One fired note as printed by the CLI
#[derive(Debug, Clone, Serialize)]
pub struct LoggerPayload {
    pub step: i64,
    pub note: String,
    #[serde(flatten)]
    pub event: NoteOn,
}

/// Trigger that writes every note to a sink, one line each
pub struct Logger<W: Write> {
    writer: W,
    step: i64,
    json: bool,
    fired: usize,
}

impl<W: Write> Logger<W> {
    pub fn new(writer: W, json: bool) -> Self {
        Logger {
            writer,
            step: 0,
            json,
            fired: 0,
        }
    }

    /// Step reported with the following notes
    pub fn set_step(&mut self, step: i64) {
        self.step = step;
    }

    pub fn fired(&self) -> usize {
        self.fired
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn log(&mut self, payload: &LoggerPayload) {
        let line = if self.json {
            serde_json::to_string(payload).unwrap_or_default()
        } else {
            format!(
                "{:>6}  {:<4} pitch={:<3} dur={:.3} vel={:<3} pan={:+.2}",
                payload.step,
                payload.note,
                payload.event.pitch,
                payload.event.duration_beats,
                payload.event.velocity_byte(),
                payload.event.pan
            )
        };
        // A closed pipe only loses output
        let _ = writeln!(self.writer, "{}", line);
    }
}

impl<W: Write> Trigger for Logger<W> {
    fn trigger(&mut self, note: NoteOn) {
        debug!(step = self.step, pitch = note.pitch, duration = note.duration_beats, "note");
        self.fired += 1;
        let payload = LoggerPayload {
            step: self.step,
            note: pitch_name(note.pitch),
            event: note,
        };
        self.log(&payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_line() {
        let mut logger = Logger::new(Vec::new(), false);
        logger.set_step(12);
        logger.trigger(NoteOn::new(61, 0.25));

        let out = String::from_utf8(logger.into_inner()).unwrap();
        assert_eq!(out, "    12  c#4  pitch=61  dur=0.250 vel=102 pan=+0.00\n");
    }

    #[test]
    fn test_json_line() {
        let mut logger = Logger::new(Vec::new(), true);
        logger.trigger(NoteOn::new(60, 1.0));
        assert_eq!(logger.fired(), 1);

        let out = String::from_utf8(logger.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["note"], "c4");
        assert_eq!(value["pitch"], 60);
        assert_eq!(value["step"], 0);
    }
}
