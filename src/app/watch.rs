//! Periodic occlusion watching
//!
//! A watch runs a background thread that recalculates one target's occlusion
//! at a fixed interval and forwards outcomes allowed by the emit policy. The
//! polling loop exists once; callers pick a presentation on top of it:
//!
//! - [`watch_with`] pushes events into a callback,
//! - [`watch_channel`] delivers events through an `mpsc` channel,
//! - [`watch_iter`] exposes a blocking iterator of results.
//!
//! Cancellation is observed between ticks, so a calculation that has started
//! always completes. Any calculation error is forwarded once and ends the
//! watch; the target may simply have closed.

use std::io;
use std::ops::ControlFlow;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;

use crate::app::state::EmitState;
use crate::config::WatchConfig;
use crate::domain::occlusion::{OcclusionCalculator, OcclusionError, OcclusionOutcome};
use crate::domain::surface::SurfaceId;
use crate::platform::SurfaceProvider;

/// Errors starting a watch
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to spawn watch thread: {0}")]
    SpawnFailed(#[from] io::Error),
}

/// Event delivered by a running watch
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// A recalculated outcome that passed the emit policy
    Outcome(OcclusionOutcome),
    /// The calculation failed; no further events follow
    Failed(OcclusionError),
}

/// Owner of a running watch thread
///
/// Dropping the handle cancels the watch and waits for the thread to exit.
#[derive(Debug)]
pub struct WatchHandle {
    target: SurfaceId,
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Surface being watched
    pub fn target(&self) -> SurfaceId {
        self.target
    }

    /// Returns true once the watch thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stops future ticks and waits for the thread to exit
    ///
    /// A tick already in progress runs to completion first. Calling this
    /// more than once is harmless.
    pub fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The thread may already be gone after an error
            let _ = stop.send(());
        }

        if let Some(handle) = self.thread.take() {
            // Never join from inside the watch thread itself
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                warn!("Watch thread for surface {} panicked", self.target);
            }
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Starts a watch that hands every forwarded event to `callback`
pub fn watch_with<P, F>(
    calculator: Arc<OcclusionCalculator<P>>,
    target: SurfaceId,
    config: WatchConfig,
    mut callback: F,
) -> Result<WatchHandle, WatchError>
where
    P: SurfaceProvider + Send + Sync + 'static,
    F: FnMut(WatchEvent) + Send + 'static,
{
    spawn_watch(calculator, target, config, move |event| {
        callback(event);
        ControlFlow::Continue(())
    })
}

/// Starts a watch that sends events through a channel
///
/// The watch stops by itself once the receiver is dropped.
pub fn watch_channel<P>(
    calculator: Arc<OcclusionCalculator<P>>,
    target: SurfaceId,
    config: WatchConfig,
) -> Result<(WatchHandle, Receiver<WatchEvent>), WatchError>
where
    P: SurfaceProvider + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel();
    let handle = spawn_watch(calculator, target, config, move |event| {
        match tx.send(event) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    })?;
    Ok((handle, rx))
}

/// Starts a watch consumed as a blocking iterator
pub fn watch_iter<P>(
    calculator: Arc<OcclusionCalculator<P>>,
    target: SurfaceId,
    config: WatchConfig,
) -> Result<WatchStream, WatchError>
where
    P: SurfaceProvider + Send + Sync + 'static,
{
    let (handle, events) = watch_channel(calculator, target, config)?;
    Ok(WatchStream {
        handle,
        events,
        done: false,
    })
}

/// Blocking iterator over a watch's results
///
/// Yields `Ok` for each forwarded outcome. After an error it yields that
/// error once and then ends. It also ends when the watch is cancelled.
#[derive(Debug)]
pub struct WatchStream {
    handle: WatchHandle,
    events: Receiver<WatchEvent>,
    done: bool,
}

impl WatchStream {
    pub fn target(&self) -> SurfaceId {
        self.handle.target()
    }

    /// Waits up to `timeout` for the next result
    ///
    /// Returns None on timeout or once the stream has ended.
    pub fn next_timeout(
        &mut self,
        timeout: Duration,
    ) -> Option<Result<OcclusionOutcome, OcclusionError>> {
        if self.done {
            return None;
        }
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(self.finish_event(event)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.done = true;
                None
            }
        }
    }

    /// Stops the underlying watch; the iterator ends after buffered results
    pub fn cancel(&mut self) {
        self.handle.cancel();
    }

    fn finish_event(&mut self, event: WatchEvent) -> Result<OcclusionOutcome, OcclusionError> {
        match event {
            WatchEvent::Outcome(outcome) => Ok(outcome),
            WatchEvent::Failed(err) => {
                self.done = true;
                Err(err)
            }
        }
    }
}

impl Iterator for WatchStream {
    type Item = Result<OcclusionOutcome, OcclusionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.events.recv() {
            Ok(event) => Some(self.finish_event(event)),
            Err(_) => {
                self.done = true;
                None
            }
        }
    }
}

/// Spawns the polling thread shared by every presentation
fn spawn_watch<P, F>(
    calculator: Arc<OcclusionCalculator<P>>,
    target: SurfaceId,
    config: WatchConfig,
    mut sink: F,
) -> Result<WatchHandle, WatchError>
where
    P: SurfaceProvider + Send + Sync + 'static,
    F: FnMut(WatchEvent) -> ControlFlow<()> + Send + 'static,
{
    let config = config.sanitized();
    let (stop_tx, stop_rx) = mpsc::channel();

    let thread = thread::Builder::new()
        .name(format!("occlusion-watch-{target}"))
        .spawn(move || {
            info!(
                "Watching surface {} every {:?} ({:?})",
                target, config.interval, config.policy
            );
            run_watch(&calculator, target, &config, &stop_rx, &mut sink);
            info!("Stopped watching surface {}", target);
        })?;

    Ok(WatchHandle {
        target,
        stop: Some(stop_tx),
        thread: Some(thread),
    })
}

/// Polling loop; returns when cancelled, on error, or when the sink breaks
fn run_watch<P, F>(
    calculator: &OcclusionCalculator<P>,
    target: SurfaceId,
    config: &WatchConfig,
    stop: &Receiver<()>,
    sink: &mut F,
) where
    P: SurfaceProvider,
    F: FnMut(WatchEvent) -> ControlFlow<()>,
{
    let mut state = EmitState::new();

    loop {
        match calculator.calculate(target) {
            Ok(outcome) => {
                let (next, emit) = state.advance(config.policy, &outcome);
                state = next;
                if emit {
                    debug!("Surface {} coverage now {:.4}", target, outcome.coverage);
                    if sink(WatchEvent::Outcome(outcome)).is_break() {
                        return;
                    }
                }
            }
            Err(err) => {
                warn!("Watch for surface {} ended: {}", target, err);
                let _ = sink(WatchEvent::Failed(err));
                return;
            }
        }

        // The stop channel doubles as the interval timer
        match stop.recv_timeout(config.interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    use crate::config::EmitPolicy;
    use crate::domain::core::Rect;
    use crate::domain::surface::SurfaceDescriptor;
    use crate::platform::{ProviderError, SnapshotProvider};

    const WAIT: Duration = Duration::from_secs(5);

    fn fast(policy: EmitPolicy) -> WatchConfig {
        WatchConfig::new(Duration::from_millis(10), policy)
    }

    fn setup() -> (SnapshotProvider, Arc<OcclusionCalculator<SnapshotProvider>>) {
        let provider = SnapshotProvider::new(vec![SurfaceDescriptor::new(
            1,
            Rect::new(0.0, 0.0, 100.0, 100.0),
        )]);
        let calculator = Arc::new(OcclusionCalculator::new(provider.clone()));
        (provider, calculator)
    }

    fn cover_left_half(provider: &SnapshotProvider) {
        provider.update(|surfaces| {
            surfaces.insert(0, SurfaceDescriptor::new(2, Rect::new(0.0, 0.0, 50.0, 100.0)))
        });
    }

    fn expect_outcome(rx: &Receiver<WatchEvent>) -> OcclusionOutcome {
        match rx.recv_timeout(WAIT) {
            Ok(WatchEvent::Outcome(outcome)) => outcome,
            other => panic!("expected an outcome, got {:?}", other),
        }
    }

    #[test]
    fn channel_emits_initial_and_changed_coverage() {
        let (provider, calculator) = setup();
        let (_handle, rx) =
            watch_channel(calculator, SurfaceId(1), fast(EmitPolicy::OnChange)).unwrap();

        assert_eq!(expect_outcome(&rx).coverage, 0.0);

        cover_left_half(&provider);
        assert_eq!(expect_outcome(&rx).coverage, 0.5);
    }

    #[test]
    fn on_change_suppresses_repeats() {
        let (provider, calculator) = setup();
        let (mut handle, rx) =
            watch_channel(calculator, SurfaceId(1), fast(EmitPolicy::OnChange)).unwrap();

        assert_eq!(expect_outcome(&rx).coverage, 0.0);

        // Let several identical ticks pass
        let reads_before = provider.read_count();
        let deadline = Instant::now() + WAIT;
        while provider.read_count() < reads_before + 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        handle.cancel();

        assert!(provider.read_count() >= reads_before + 3);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn error_is_forwarded_once_and_ends_watch() {
        let (provider, calculator) = setup();
        let (handle, rx) =
            watch_channel(calculator, SurfaceId(1), fast(EmitPolicy::Always)).unwrap();

        expect_outcome(&rx);
        provider.fail_with(ProviderError::Unavailable {
            reason: "session locked".to_string(),
        });

        let failure = loop {
            match rx.recv_timeout(WAIT) {
                Ok(WatchEvent::Outcome(_)) => continue,
                Ok(WatchEvent::Failed(err)) => break err,
                Err(err) => panic!("watch ended without error event: {err:?}"),
            }
        };
        assert!(matches!(failure, OcclusionError::Provider(_)));

        // Sender is dropped once the thread exits
        assert!(rx.recv_timeout(WAIT).is_err());
        let deadline = Instant::now() + WAIT;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(handle.is_finished());
    }

    #[test]
    fn cancel_stops_ticks() {
        let (provider, calculator) = setup();
        let (mut handle, rx) =
            watch_channel(calculator, SurfaceId(1), fast(EmitPolicy::Always)).unwrap();

        expect_outcome(&rx);
        handle.cancel();
        assert!(handle.is_finished());

        let reads = provider.read_count();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(provider.read_count(), reads);

        // Drain whatever was buffered, then the channel reports disconnection
        while let Ok(event) = rx.recv_timeout(WAIT) {
            assert!(matches!(event, WatchEvent::Outcome(_)));
        }

        handle.cancel();
    }

    #[test]
    fn callback_receives_events() {
        let (provider, calculator) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut handle = watch_with(
            calculator,
            SurfaceId(1),
            fast(EmitPolicy::OnChange),
            move |event| {
                if let WatchEvent::Outcome(outcome) = event {
                    sink.lock().unwrap().push(outcome.coverage);
                }
            },
        )
        .unwrap();

        let wait_for = |count: usize| {
            let deadline = Instant::now() + WAIT;
            while seen.lock().unwrap().len() < count && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
        };

        wait_for(1);
        cover_left_half(&provider);
        wait_for(2);
        handle.cancel();

        assert_eq!(*seen.lock().unwrap(), vec![0.0, 0.5]);
    }

    #[test]
    fn iterator_ends_after_target_closes() {
        let (provider, calculator) = setup();
        let mut stream = watch_iter(calculator, SurfaceId(1), fast(EmitPolicy::OnChange)).unwrap();
        assert_eq!(stream.target(), SurfaceId(1));

        let first = stream.next_timeout(WAIT).unwrap().unwrap();
        assert_eq!(first.coverage, 0.0);

        provider.replace(Vec::new());

        assert_eq!(
            stream.next(),
            Some(Err(OcclusionError::TargetNotFound { id: SurfaceId(1) }))
        );
        assert_eq!(stream.next(), None);
        assert_eq!(stream.next_timeout(Duration::from_millis(1)), None);
    }

    #[test]
    fn dropping_receiver_stops_watch() {
        let (_provider, calculator) = setup();
        let (handle, rx) =
            watch_channel(calculator, SurfaceId(1), fast(EmitPolicy::Always)).unwrap();
        drop(rx);

        let deadline = Instant::now() + WAIT;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(handle.is_finished());
    }
}
