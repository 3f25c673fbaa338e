//! Scheduled tasks and the per-vehicle time-ordered task list.

use std::fmt;

use fc_core::{LocationId, Tick};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DriveTask {
    pub destination:   LocationId,
    pub distance_km:   f64,
    pub speed_kmh:     f64,
    /// Ambient temperature for the trip.  `None` = look it up in the grid
    /// context at the departure location when the drive starts.
    pub temperature_c: Option<f64>,
}

/// What the vehicle does during a task.  Charge tasks carry no target: the
/// location selector resolves one when the task starts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TaskKind {
    Drive(DriveTask),
    Park,
    Break,
    Charge,
}

impl TaskKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Drive(_) => "drive",
            Self::Park => "park",
            Self::Break => "break",
            Self::Charge => "charge",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A task occupying the half-open step window `[start, end)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Task {
    pub start: Tick,
    pub end:   Tick,
    pub kind:  TaskKind,
}

impl Task {
    pub fn new(start: Tick, end: Tick, kind: TaskKind) -> Self {
        Self { start, end, kind }
    }

    #[inline]
    pub fn duration_ticks(&self) -> u64 {
        self.end.since(self.start)
    }

    #[inline]
    pub fn contains(&self, tick: Tick) -> bool {
        self.start <= tick && tick < self.end
    }

    #[inline]
    pub fn overlaps(&self, other: &Task) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn drive(&self) -> Option<&DriveTask> {
        match &self.kind {
            TaskKind::Drive(d) => Some(d),
            _ => None,
        }
    }
}

// ── TaskList ──────────────────────────────────────────────────────────────────

/// A vehicle's tasks, kept sorted by start tick.
///
/// Sorting is maintained on insert; non-overlap is *not* enforced here but
/// checked once before the run by [`crate::has_valid_task_list`].  Lookups
/// assume it holds.
#[derive(Clone, Debug, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(mut tasks: Vec<Task>) -> Self {
        tasks.sort_by_key(|t| (t.start, t.end));
        Self { tasks }
    }

    /// Insert keeping start order; returns the index it landed at.
    pub fn insert(&mut self, task: Task) -> usize {
        let idx = self
            .tasks
            .partition_point(|t| (t.start, t.end) <= (task.start, task.end));
        self.tasks.insert(idx, task);
        idx
    }

    pub fn remove(&mut self, index: usize) -> Option<Task> {
        (index < self.tasks.len()).then(|| self.tasks.remove(index))
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    #[inline]
    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    /// Index of the task whose window contains `tick`.  O(log n).
    pub fn active_index(&self, tick: Tick) -> Option<usize> {
        let i = self.tasks.partition_point(|t| t.start <= tick);
        (i > 0 && self.tasks[i - 1].contains(tick)).then(|| i - 1)
    }

    /// First pair of adjacent tasks whose windows overlap.
    pub fn first_overlap(&self) -> Option<(usize, usize)> {
        self.tasks
            .windows(2)
            .position(|w| w[0].overlaps(&w[1]))
            .map(|i| (i, i + 1))
    }
}
