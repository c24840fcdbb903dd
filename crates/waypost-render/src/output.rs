//! Output sink and scoped capture.
//!
//! Rendering in "emit" mode writes into an [`OutputStack`]: text goes to the
//! innermost open capture buffer, or to the sink when no capture is open.
//! Captures nest with stack discipline, and a [`Capture`] guard always pops
//! its buffer when dropped, so an error half way through a template cannot
//! leave output redirected for the next render.
//!
//! ```text
//! sink <- [layout capture] <- [script capture] <- [partial capture]
//!                                    ^ writes land here while open
//! ```

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Destination for rendered output plus the stack of open captures.
pub struct OutputStack {
    state: Mutex<StackState>,
}

struct StackState {
    sink: Box<dyn Write + Send>,
    buffers: Vec<Vec<u8>>,
}

impl OutputStack {
    /// Creates a stack that emits into `sink`.
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            state: Mutex::new(StackState {
                sink,
                buffers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the sink, returning the previous one.
    pub fn replace_sink(&self, sink: Box<dyn Write + Send>) -> Box<dyn Write + Send> {
        std::mem::replace(&mut self.lock().sink, sink)
    }

    /// Opens a capture region. Everything written until the guard is finished
    /// or dropped is collected into its buffer.
    pub fn capture(&self) -> Capture<'_> {
        let mut state = self.lock();
        state.buffers.push(Vec::new());
        Capture {
            stack: self,
            depth: state.buffers.len(),
            finished: false,
        }
    }

    /// Number of capture regions currently open.
    pub fn depth(&self) -> usize {
        self.lock().buffers.len()
    }

    /// Returns a writer that appends to the innermost open capture, or to the
    /// sink when none is open.
    pub fn writer(&self) -> StackWriter<'_> {
        StackWriter { stack: self }
    }

    /// Writes `text` at the current position.
    pub fn emit(&self, text: &str) -> io::Result<()> {
        self.writer().write_all(text.as_bytes())
    }

    /// Flushes the sink.
    pub fn flush(&self) -> io::Result<()> {
        self.lock().sink.flush()
    }

    fn close(&self, depth: usize) -> Vec<u8> {
        let mut state = self.lock();
        if state.buffers.len() < depth {
            return Vec::new();
        }
        // Inner captures that leaked past this guard are discarded with it.
        state.buffers.truncate(depth);
        state.buffers.pop().unwrap_or_default()
    }
}

impl Default for OutputStack {
    fn default() -> Self {
        Self::new(Box::new(io::stdout()))
    }
}

impl fmt::Debug for OutputStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputStack")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

/// Guard for an open capture region.
///
/// Call [`finish`](Self::finish) to take the captured text. Dropping the guard
/// without finishing discards the text and still closes the region.
#[must_use = "dropping a capture discards its output"]
pub struct Capture<'a> {
    stack: &'a OutputStack,
    depth: usize,
    finished: bool,
}

impl Capture<'_> {
    /// Closes the region and returns everything written into it.
    pub fn finish(mut self) -> String {
        self.finished = true;
        let bytes = self.stack.close(self.depth);
        String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
    }
}

impl Drop for Capture<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.stack.close(self.depth);
        }
    }
}

/// [`Write`] adapter over an [`OutputStack`].
pub struct StackWriter<'a> {
    stack: &'a OutputStack,
}

impl Write for StackWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.stack.lock();
        match state.buffers.last_mut() {
            Some(buffer) => {
                buffer.extend_from_slice(buf);
                Ok(buf.len())
            }
            None => state.sink.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.stack.lock();
        if state.buffers.is_empty() {
            state.sink.flush()
        } else {
            Ok(())
        }
    }
}

/// A cloneable in-memory sink.
///
/// Every clone appends to the same buffer, so a caller can hand one clone to
/// the renderer and read the response body from another.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the buffered text.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// Takes the buffered text, leaving the buffer empty.
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.lock());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
