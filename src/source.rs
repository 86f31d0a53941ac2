//! External event sources.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{SimError, SimResult};
use crate::event::{Event, EventSender, PushOutcome};
use crate::types::SimTime;
use crate::value::Value;

/// Shared flag that ends a run at the next step boundary.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn flag(&self) -> &AtomicBool {
        &self.0
    }
}

/// Counters reported by a finished timer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimerReport {
    pub ticks: u64,
    pub queued: u64,
    pub dropped: u64,
}

/// A background thread emitting ticks at a fixed wall-clock interval.
///
/// Each tick is an [`Event`] stamped with the elapsed time in milliseconds and
/// carrying the elapsed time in seconds as a real value. The timer stops after
/// `duration`, when cancelled, or when its queue closes. If a [`StopHandle`]
/// is attached, the timer raises it when it stops.
pub struct Timer {
    name: String,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<SimResult<TimerReport>>>,
}

impl Timer {
    pub fn spawn(
        name: impl Into<String>,
        sender: EventSender,
        interval: Duration,
        duration: Duration,
        stop: Option<StopHandle>,
    ) -> SimResult<Self> {
        let name = name.into();
        if interval.is_zero() {
            return Err(SimError::behavior(format!("timer '{}' needs a non-zero interval", name)));
        }
        let cancel = Arc::new(AtomicBool::new(false));
        let thread_cancel = Arc::clone(&cancel);
        let thread_name = name.clone();

        let handle = thread::Builder::new()
            .name(format!("timer-{}", name))
            .spawn(move || {
                let report = tick_loop(&thread_name, &sender, interval, duration, &thread_cancel);
                if let Some(stop) = stop {
                    stop.request_stop();
                }
                report
            })?;

        tracing::info!(timer = %name, ?interval, ?duration, "timer started");
        Ok(Self {
            name,
            cancel,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Asks the thread to stop after its current tick.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Waits for the thread and returns its report.
    pub fn join(mut self) -> SimResult<TimerReport> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SimError::behavior(format!("timer '{}' panicked", self.name)))?,
            None => Ok(TimerReport::default()),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn tick_loop(
    name: &str,
    sender: &EventSender,
    interval: Duration,
    duration: Duration,
    cancel: &AtomicBool,
) -> SimResult<TimerReport> {
    let start = Instant::now();
    let mut report = TimerReport::default();
    let mut next = interval;

    while next <= duration && !cancel.load(Ordering::SeqCst) {
        let now = start.elapsed();
        if next > now {
            thread::sleep(next - now);
        }
        let ms = next.as_millis() as SimTime;
        let event = Event::new(ms, Value::Real(next.as_secs_f64()));
        match sender.send(event) {
            Ok(PushOutcome::Queued) => report.queued += 1,
            Ok(PushOutcome::Dropped) => report.dropped += 1,
            Err(SimError::QueueClosed(_)) => {
                tracing::debug!(timer = name, "queue closed, timer exiting");
                break;
            }
            Err(e) => return Err(e),
        }
        report.ticks += 1;
        next += interval;
    }

    tracing::info!(
        timer = name,
        ticks = report.ticks,
        dropped = report.dropped,
        "timer finished"
    );
    Ok(report)
}
