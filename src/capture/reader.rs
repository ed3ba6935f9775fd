//! Blocking frame readers driven from a dedicated thread.
//!
//! Device and network sources can block inside a read for as long as
//! they like. The reader lives on its own thread and is driven over
//! channels, so open, each read and shutdown are all bounded by a
//! timeout and the underlying handle never has to cross threads.

#![cfg_attr(not(any(feature = "camera", feature = "stream")), allow(dead_code))]

use super::CameraError;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Decoded RGB image handed back by a reader.
#[derive(Debug)]
pub(crate) struct RawImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// A source whose calls may block. Created and used on the reader thread.
pub(crate) trait FrameReader {
    /// Reads the next image. `Ok(None)` means nothing was available.
    fn read(&mut self) -> Result<Option<RawImage>, String>;

    /// Releases the underlying handle.
    fn shutdown(&mut self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ReaderTimeouts {
    pub open: Duration,
    pub read: Duration,
    pub close: Duration,
}

impl Default for ReaderTimeouts {
    fn default() -> Self {
        Self {
            open: Duration::from_secs(5),
            read: Duration::from_millis(500),
            close: Duration::from_secs(2),
        }
    }
}

enum Command {
    Capture,
    Close,
}

type ReadResult = Result<Option<RawImage>, String>;

/// Handle to a running reader thread.
pub(crate) struct ReaderThread {
    name: String,
    timeouts: ReaderTimeouts,
    commands: Sender<Command>,
    images: Receiver<ReadResult>,
    /// Disconnects when the thread exits, however it exits.
    done: Receiver<()>,
    thread: Option<JoinHandle<()>>,
    /// A read timed out and its result has not been collected yet.
    pending: bool,
}

impl ReaderThread {
    /// Spawns the thread and runs `open` on it, waiting at most
    /// `timeouts.open` for the reader to come up.
    pub(crate) fn spawn<R, F>(
        name: impl Into<String>,
        timeouts: ReaderTimeouts,
        open: F,
    ) -> Result<Self, CameraError>
    where
        R: FrameReader,
        F: FnOnce() -> Result<R, CameraError> + Send + 'static,
    {
        let name = name.into();
        let (command_tx, command_rx) = mpsc::channel();
        let (image_tx, image_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let thread = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let _done = done_tx;
                let reader = match open() {
                    Ok(reader) => reader,
                    Err(e) => {
                        // Receiver gone means the opener already timed out.
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if ready_tx.send(Ok(())).is_err() {
                    return;
                }
                serve(reader, command_rx, image_tx);
            })
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        match ready_rx.recv_timeout(timeouts.open) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(RecvTimeoutError::Timeout) => {
                return Err(CameraError::OpenFailed(format!(
                    "{name} did not open within {:?}",
                    timeouts.open
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(CameraError::OpenFailed(format!("{name} exited while opening")))
            }
        }

        Ok(Self {
            name,
            timeouts,
            commands: command_tx,
            images: image_rx,
            done: done_rx,
            thread: Some(thread),
            pending: false,
        })
    }

    /// Requests one image and waits at most `timeouts.read` for it.
    ///
    /// A timed-out read is not repeated: its result is collected by a
    /// later call once the reader finishes it.
    pub(crate) fn read(&mut self) -> Result<Option<RawImage>, CameraError> {
        if self.pending {
            return match self.images.try_recv() {
                Ok(result) => {
                    self.pending = false;
                    result.map_err(CameraError::CaptureFailed)
                }
                Err(TryRecvError::Empty) => Ok(None),
                Err(TryRecvError::Disconnected) => Err(self.exited()),
            };
        }

        self.commands
            .send(Command::Capture)
            .map_err(|_| self.exited())?;

        match self.images.recv_timeout(self.timeouts.read) {
            Ok(result) => result.map_err(CameraError::CaptureFailed),
            Err(RecvTimeoutError::Timeout) => {
                self.pending = true;
                Ok(None)
            }
            Err(RecvTimeoutError::Disconnected) => Err(self.exited()),
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.thread.as_ref().is_some_and(|thread| !thread.is_finished())
    }

    /// Asks the reader to shut down and waits at most `timeouts.close`.
    ///
    /// A reader stuck inside a read is detached and reported as a
    /// release failure; it exits on its own if the read ever returns.
    pub(crate) fn close(mut self) -> Result<(), CameraError> {
        // Send fails only if the thread is already gone.
        let _ = self.commands.send(Command::Close);

        match self.done.recv_timeout(self.timeouts.close) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => match self.thread.take() {
                Some(thread) => thread
                    .join()
                    .map_err(|_| CameraError::ReleaseFailed(format!("{} panicked", self.name))),
                None => Ok(()),
            },
            Err(RecvTimeoutError::Timeout) => {
                drop(self.thread.take());
                Err(CameraError::ReleaseFailed(format!(
                    "{} did not shut down within {:?}; detached",
                    self.name, self.timeouts.close
                )))
            }
        }
    }

    fn exited(&self) -> CameraError {
        CameraError::CaptureFailed(format!("{} exited", self.name))
    }
}

fn serve<R: FrameReader>(mut reader: R, commands: Receiver<Command>, images: Sender<ReadResult>) {
    while let Ok(Command::Capture) = commands.recv() {
        if images.send(reader.read()).is_err() {
            break;
        }
    }
    if let Err(e) = reader.shutdown() {
        tracing::warn!(error = %e, "Failed to shut down frame reader");
    }
}
