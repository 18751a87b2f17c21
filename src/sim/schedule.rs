//! Deferred, cancellable game tasks
//!
//! Countdown steps, serves, rotation phases and level transitions all run
//! after a delay. Each task is filed under a `TaskKey` so a whole family can
//! be cancelled at once (a new game cancels everything, a miss cancels the
//! pending serve). Tasks only ever run from inside `tick`, never from a timer
//! callback, so they cannot race the physics step.

use serde::{Deserialize, Serialize};

/// Task family, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKey {
    Countdown,
    Serve,
    Rotation,
    Transition,
}

/// What to do when a task comes due
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Task {
    /// Show countdown banner `step` (index into the countdown messages)
    CountdownStep { step: usize },
    /// Release every anchored ball
    Launch,
    /// Freeze is over, start turning the container
    RotationSweep { angle: f32 },
    /// Sweep is over, commit the new orientation
    RotationFinish { angle: f32 },
    /// Level-clear banner done, load the next layout
    TransitionLoadLevel,
    /// "Level N" banner done, respawn and count down
    TransitionCountdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub key: TaskKey,
    /// Simulation time (seconds) the task becomes runnable
    pub due: f64,
    pub task: Task,
    seq: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, key: TaskKey, due: f64, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(ScheduledTask { key, due, task, seq });
    }

    /// Cancel everything under `key`, then schedule
    pub fn replace(&mut self, key: TaskKey, due: f64, task: Task) {
        self.cancel(key);
        self.schedule(key, due, task);
    }

    /// Returns how many tasks were dropped
    pub fn cancel(&mut self, key: TaskKey) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.key != key);
        before - self.tasks.len()
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_pending(&self, key: TaskKey) -> bool {
        self.tasks.iter().any(|t| t.key == key)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Remove and return the earliest task due at `now`; ties run in
    /// scheduling order
    pub fn pop_due(&mut self, now: f64) -> Option<ScheduledTask> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
            .map(|(i, _)| i)?;
        Some(self.tasks.remove(index))
    }
}
