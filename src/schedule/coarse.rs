//! Greedy grouping of whole columns into coarse tasks

use crate::schedule::Task;

/// A run of consecutive columns accumulating toward the work target
pub(crate) struct CoarseRun {
    start: usize,
    work: usize,
    target: usize,
}

impl CoarseRun {
    pub(crate) fn new(target: usize) -> Self {
        Self {
            start: 0,
            work: 0,
            target,
        }
    }

    /// Adds column `j`, emitting the run once it reaches the target
    pub(crate) fn add(&mut self, j: usize, work: usize, tasks: &mut Vec<Task>) {
        self.work += work;
        if self.work >= self.target {
            tasks.push(Task::Coarse {
                columns: self.start..j + 1,
            });
            self.resume(j + 1);
        }
    }

    /// Emits the pending columns before `end`, if any
    pub(crate) fn close(&mut self, end: usize, tasks: &mut Vec<Task>) {
        if self.start < end {
            tasks.push(Task::Coarse {
                columns: self.start..end,
            });
        }
        self.resume(end);
    }

    /// Starts a fresh run at column `start`
    pub(crate) fn resume(&mut self, start: usize) {
        self.start = start;
        self.work = 0;
    }
}
