//! Buffered host implementations of the engine's I/O contracts.

use std::collections::VecDeque;

use crate::{InputSource, OutputSink, TraceEvent, TraceSink};

/// Character code delivered at the end of every queued line.
pub const NEWLINE: u16 = 10;

/// FIFO of pending input character codes.
///
/// Lines are queued whole and drained one character per `in`; each line ends
/// with a newline so programs that read until newline see complete commands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputQueue {
    pending: VecDeque<u16>,
}

impl InputQueue {
    /// Queues a line of text followed by a newline. A line terminator already
    /// present in `line` is not doubled.
    pub fn push_line(&mut self, line: &str) {
        self.pending
            .extend(line.trim_end_matches(&['\r', '\n'][..]).encode_utf16());
        self.pending.push_back(NEWLINE);
    }

    /// Queues raw character codes as-is.
    pub fn push_codes(&mut self, codes: impl IntoIterator<Item = u16>) {
        self.pending.extend(codes);
    }

    /// Number of codes waiting to be read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` when no input is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Discards all pending input.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl InputSource for InputQueue {
    fn try_read(&mut self) -> Option<u16> {
        self.pending.pop_front()
    }
}

/// In-memory host: queued input, captured output and an optional trace log.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BufferedHost {
    /// Pending input.
    pub input: InputQueue,
    /// Every code emitted by `out`, in order.
    pub output: Vec<u16>,
    /// Trace events, recorded only when `record_trace` is set.
    pub trace: Vec<TraceEvent>,
    /// Enables trace recording.
    pub record_trace: bool,
}

impl BufferedHost {
    /// Creates a host that also records trace events.
    #[must_use]
    pub fn tracing() -> Self {
        Self {
            record_trace: true,
            ..Self::default()
        }
    }

    /// Captured output decoded as text; codes that are not characters become
    /// U+FFFD.
    #[must_use]
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .map(|code| char::from_u32(u32::from(*code)).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}

impl OutputSink for BufferedHost {
    fn emit(&mut self, code: u16) {
        self.output.push(code);
    }
}

impl InputSource for BufferedHost {
    fn try_read(&mut self) -> Option<u16> {
        self.input.try_read()
    }
}

impl TraceSink for BufferedHost {
    fn on_instruction(&mut self, event: &TraceEvent) {
        if self.record_trace {
            self.trace.push(*event);
        }
    }
}
