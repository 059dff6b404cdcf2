//! Application orchestration layer
//!
//! Runs the calculator repeatedly on behalf of callers that want to follow
//! a surface's visibility over time.

pub mod state;
pub mod watch;

pub use state::EmitState;
pub use watch::{
    watch_channel, watch_iter, watch_with, WatchError, WatchEvent, WatchHandle, WatchStream,
};
