//! Async session driver.
//!
//! Owns one [`BreathingTimer`] inside a tokio task and drives it with two
//! sources: a fixed-rate frame interval that refreshes progress, and a
//! single-shot sleep until the current phase deadline. Both are re-derived
//! from the timer on every loop iteration, so a stop or restart can never
//! leave a stale wake-up behind.
//!
//! Hosts talk to the task through a [`SessionDriver`] handle: commands go
//! in over an mpsc channel, snapshots come out on a watch channel and
//! events on an mpsc channel.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::timer::{BreathingTimer, Clock, TimerSnapshot};

/// Default frame interval, roughly 30 frames per second.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCommand {
    Start,
    Pause,
    Resume,
    Stop,
}

/// Handle to a running session task.
pub struct SessionDriver<C: Clock> {
    commands: mpsc::UnboundedSender<DriverCommand>,
    snapshots: watch::Receiver<TimerSnapshot>,
    events: mpsc::UnboundedReceiver<Event>,
    task: JoinHandle<BreathingTimer<C>>,
}

impl<C> SessionDriver<C>
where
    C: Clock + Send + 'static,
{
    /// Spawn the driver task. The timer is driven as-is: pass a started
    /// timer, or send [`DriverCommand::Start`] afterwards.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(timer: BreathingTimer<C>, frame_interval: Duration) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(timer.snapshot());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let frame_interval = frame_interval.max(Duration::from_millis(1));

        let task = tokio::spawn(drive(
            timer,
            frame_interval,
            command_rx,
            snapshot_tx,
            event_tx,
        ));

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_rx,
            task,
        }
    }

    /// Queue a command. Returns false once the task has ended.
    pub fn send(&self, command: DriverCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn start(&self) -> bool {
        self.send(DriverCommand::Start)
    }

    pub fn pause(&self) -> bool {
        self.send(DriverCommand::Pause)
    }

    pub fn resume(&self) -> bool {
        self.send(DriverCommand::Resume)
    }

    pub fn stop(&self) -> bool {
        self.send(DriverCommand::Stop)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Independent receiver for renderers that want change notifications.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshots.clone()
    }

    /// Next event from the timer. `None` once the task has ended and all
    /// buffered events were read.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Wait for the task to end and take the timer back.
    pub async fn join(self) -> Result<BreathingTimer<C>> {
        drop(self.commands);
        self.task
            .await
            .map_err(|e| CoreError::Custom(format!("session driver task failed: {e}")))
    }
}

async fn drive<C: Clock>(
    mut timer: BreathingTimer<C>,
    frame_interval: Duration,
    mut commands: mpsc::UnboundedReceiver<DriverCommand>,
    snapshots: watch::Sender<TimerSnapshot>,
    events: mpsc::UnboundedSender<Event>,
) -> BreathingTimer<C> {
    let mut frames = tokio::time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(pattern = %timer.pattern().id, ?frame_interval, "session driver running");

    loop {
        let until_transition = timer.time_until_transition_ms();
        let running = timer.is_running();

        let (produced, done) = tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(command) => {
                    debug!(?command, "driver command");
                    let produced = match command {
                        DriverCommand::Start => timer.start(),
                        DriverCommand::Pause => timer.pause(),
                        DriverCommand::Resume => timer.resume(),
                        DriverCommand::Stop => timer.stop(),
                    };
                    let done = command == DriverCommand::Stop
                        || produced.iter().any(Event::is_completion);
                    (produced, done)
                }
                None => {
                    debug!("driver handle dropped");
                    (timer.stop(), true)
                }
            },
            _ = tokio::time::sleep(Duration::from_millis(until_transition.unwrap_or(0))),
                if until_transition.is_some() =>
            {
                trace!("phase deadline reached");
                let produced = timer.tick();
                let done = produced.iter().any(Event::is_completion);
                (produced, done)
            }
            _ = frames.tick(), if running => {
                let produced = timer.tick();
                let done = produced.iter().any(Event::is_completion);
                (produced, done)
            }
        };

        snapshots.send_replace(timer.snapshot());
        for event in produced {
            // Receiver may be gone; the snapshot channel still carries state.
            let _ = events.send(event);
        }
        if done {
            break;
        }
    }

    info!(pattern = %timer.pattern().id, "session driver finished");
    timer
}
