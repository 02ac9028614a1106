// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A cooperative, single-threaded tick loop.

use std::cell::Cell;

/// Result of polling a scheduled task once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The task wants to be polled again on the next tick.
    Pending,
    /// The task has finished and is dropped.
    Done,
}

type Task = Box<dyn FnMut() -> TaskStatus>;

/// Drives deferred work one tick at a time.
///
/// Work that "takes more than one tick" (package I/O, object extraction) is
/// spawned here and polled once per [`Scheduler::tick`] until it reports
/// [`TaskStatus::Done`]. Tasks spawned while a tick is running are first
/// polled on the following tick, so a tick never blocks on work it creates.
pub struct Scheduler {
    sender: flume::Sender<Task>,
    receiver: flume::Receiver<Task>,
    ticks: Cell<u64>,
}

impl Scheduler {
    /// Creates an idle scheduler.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("Scheduler initialized.");
        Self {
            sender,
            receiver,
            ticks: Cell::new(0),
        }
    }

    /// Queues a task to be polled from the next tick onwards.
    pub fn spawn<F>(&self, task: F)
    where
        F: FnMut() -> TaskStatus + 'static,
    {
        self.enqueue(Box::new(task));
    }

    /// Queues a closure that runs exactly once, on the next tick.
    pub fn defer<F>(&self, work: F)
    where
        F: FnOnce() + 'static,
    {
        let mut work = Some(work);
        self.spawn(move || {
            if let Some(work) = work.take() {
                work();
            }
            TaskStatus::Done
        });
    }

    /// Polls every task that was queued before this tick started.
    ///
    /// Returns the number of tasks polled.
    pub fn tick(&self) -> usize {
        self.ticks.set(self.ticks.get() + 1);
        let queued = self.receiver.len();

        for _ in 0..queued {
            let Ok(mut task) = self.receiver.try_recv() else {
                break;
            };
            if task() == TaskStatus::Pending {
                self.enqueue(task);
            }
        }

        log::trace!("Tick {} polled {} task(s).", self.ticks.get(), queued);
        queued
    }

    /// Ticks until no task is queued or `max_ticks` ticks have run.
    ///
    /// Returns the number of ticks that ran.
    pub fn run_until_idle(&self, max_ticks: u64) -> u64 {
        let mut ran = 0;
        while !self.is_idle() && ran < max_ticks {
            self.tick();
            ran += 1;
        }
        if !self.is_idle() {
            log::warn!(
                "Scheduler still has {} task(s) after {} tick(s).",
                self.pending(),
                ran
            );
        }
        ran
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.get()
    }

    fn enqueue(&self, task: Task) {
        if self.sender.send(task).is_err() {
            log::error!("Failed to queue task: scheduler channel disconnected.");
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
