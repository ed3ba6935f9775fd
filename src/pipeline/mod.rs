//! Detection pipeline and session control.
//!
//! ```text
//! source → capture ─┬─→ frame slot ──→ MJPEG stream
//!                   └─→ landmarks → EAR → drowsiness monitor ─┐
//!                       features → motion → speed monitor ────┴─→ alert slot
//! ```
//!
//! [`Session`] owns one background loop at a time. Each cycle runs on the
//! blocking pool so slow capture or inference never stalls the server.

mod cycle;
mod session;
mod slot;
pub mod stream;
mod worker;

pub use cycle::{Collaborators, CycleError, CycleReport, DetectionPipeline};
pub use session::{Session, SessionError, SessionStatus, StartOutcome};
pub use slot::Slot;
pub use stream::{encode_jpeg, multipart_chunk, EncodeError};
pub use worker::{run_cycle, run_detection_loop, CycleOutcome, LoopContext, LoopTiming};
