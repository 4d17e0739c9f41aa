//! Waiting for eventually consistent registry state

pub mod clock;
pub mod poller;

pub use clock::{Clock, ManualClock, TokioClock};
pub use poller::{PollOutcome, PollReport, PollTarget, SyncPoller};
