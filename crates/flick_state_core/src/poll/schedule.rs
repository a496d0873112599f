use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use log::{debug, warn};
use std::io;
use std::thread::JoinHandle;
use std::time::Duration;

/// Whether the first callback runs right away or after one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    Immediate,
    #[default]
    AfterInterval,
}

/// Callback verdict after each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollControl {
    Continue,
    Stop,
}

/// Entry point for scheduling fixed-interval callbacks.
pub struct PollLoop;

impl PollLoop {
    /// Runs `callback` every `interval` until it returns
    /// [`PollControl::Stop`] or the returned handle is stopped or dropped.
    ///
    /// # Errors
    /// - Returns the spawn error when the loop thread cannot be created.
    pub fn schedule<F>(
        name: &str,
        interval: Duration,
        start: StartMode,
        callback: F,
    ) -> io::Result<PollHandle>
    where
        F: FnMut() -> PollControl + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let loop_name = name.to_string();
        let worker = std::thread::Builder::new()
            .name(format!("flick-poll-{name}"))
            .spawn(move || run_loop(&loop_name, interval, start, stop_rx, callback))?;

        debug!(
            "event=poll_schedule module=poll status=ok loop={} interval_ms={}",
            name,
            interval.as_millis()
        );
        Ok(PollHandle {
            name: name.to_string(),
            stop: Some(stop_tx),
            worker: Some(worker),
        })
    }
}

fn run_loop<F>(
    name: &str,
    interval: Duration,
    start: StartMode,
    stop: Receiver<()>,
    mut callback: F,
) where
    F: FnMut() -> PollControl,
{
    if start == StartMode::Immediate && callback() == PollControl::Stop {
        debug!("event=poll_stop module=poll status=ok loop={name} reason=callback");
        return;
    }

    // `tick` holds at most one pending tick, so a slow callback skips ticks.
    let ticker = tick(interval);
    loop {
        select! {
            recv(stop) -> _ => {
                debug!("event=poll_stop module=poll status=ok loop={name} reason=cancelled");
                break;
            }
            recv(ticker) -> _ => {
                if callback() == PollControl::Stop {
                    debug!("event=poll_stop module=poll status=ok loop={name} reason=callback");
                    break;
                }
            }
        }
    }
}

/// Owner of a running loop. Dropping it cancels the loop.
pub struct PollHandle {
    name: String,
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the loop already ended (stopped by its callback or cancelled).
    pub fn is_finished(&self) -> bool {
        self.worker
            .as_ref()
            .map(|worker| worker.is_finished())
            .unwrap_or(true)
    }

    /// Cancels the loop and waits for an in-flight callback to return.
    pub fn stop(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        // Disconnecting the stop channel wakes the select.
        self.stop.take();
        let Some(worker) = self.worker.take() else {
            return;
        };
        if worker.thread().id() == std::thread::current().id() {
            return;
        }
        if worker.join().is_err() {
            warn!(
                "event=poll_stop module=poll status=error loop={} reason=callback_panicked",
                self.name
            );
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
