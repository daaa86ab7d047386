//! Task table
//!
//! Bookkeeping for everything the device runs: three persistent background
//! tasks started at boot and at most one exclusive mode task. The exclusive
//! entry is an `Option`, so a second exclusive entry cannot be represented.

/// Background tasks that run for the lifetime of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistentTask {
    Connectivity,
    SerialInput,
    HttpInput,
}

impl PersistentTask {
    pub const ALL: [PersistentTask; 3] = [
        PersistentTask::Connectivity,
        PersistentTask::SerialInput,
        PersistentTask::HttpInput,
    ];

    /// Task name used in the table and in logs
    pub const fn name(self) -> &'static str {
        match self {
            PersistentTask::Connectivity => "connectivity",
            PersistentTask::SerialInput => "serial_input",
            PersistentTask::HttpInput => "http_input",
        }
    }

    const fn index(self) -> usize {
        match self {
            PersistentTask::Connectivity => 0,
            PersistentTask::SerialInput => 1,
            PersistentTask::HttpInput => 2,
        }
    }
}

/// One running (or just finished) task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskHandle {
    pub name: &'static str,
    /// Set by the orchestrator before it raises the cancel token
    pub cancellation_requested: bool,
    /// Set once the task has returned, for any reason
    pub completed: bool,
}

impl TaskHandle {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            cancellation_requested: false,
            completed: false,
        }
    }
}

/// State of the exclusive slot
///
/// ```text
///          start            cancel             teardown done
///  Empty ─────────► Running ───────► CancelRequested ───────► Empty
///                      │
///                      └─ mode returns ─► Finished ── next switch ─► Empty
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    Empty,
    Running,
    CancelRequested,
    Finished,
}

/// Table errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TableError {
    /// Entry already present
    SlotOccupied,
}

/// Persistent entries plus the exclusive slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskTable {
    persistent: [Option<TaskHandle>; 3],
    exclusive: Option<TaskHandle>,
}

impl TaskTable {
    pub const fn new() -> Self {
        Self {
            persistent: [None; 3],
            exclusive: None,
        }
    }

    /// Record a background task as started
    pub fn register_persistent(&mut self, task: PersistentTask) -> Result<(), TableError> {
        let entry = &mut self.persistent[task.index()];
        if entry.is_some() {
            return Err(TableError::SlotOccupied);
        }
        *entry = Some(TaskHandle::new(task.name()));
        Ok(())
    }

    pub fn persistent(&self, task: PersistentTask) -> Option<&TaskHandle> {
        self.persistent[task.index()].as_ref()
    }

    /// Place a new exclusive task; the slot must be empty
    pub fn insert_exclusive(&mut self, handle: TaskHandle) -> Result<(), TableError> {
        if self.exclusive.is_some() {
            return Err(TableError::SlotOccupied);
        }
        self.exclusive = Some(handle);
        Ok(())
    }

    pub fn exclusive(&self) -> Option<&TaskHandle> {
        self.exclusive.as_ref()
    }

    pub fn exclusive_mut(&mut self) -> Option<&mut TaskHandle> {
        self.exclusive.as_mut()
    }

    pub fn remove_exclusive(&mut self) -> Option<TaskHandle> {
        self.exclusive.take()
    }

    /// Derived state of the exclusive slot
    pub fn slot_state(&self) -> SlotState {
        match self.exclusive {
            None => SlotState::Empty,
            Some(h) if h.completed => SlotState::Finished,
            Some(h) if h.cancellation_requested => SlotState::CancelRequested,
            Some(_) => SlotState::Running,
        }
    }

    /// Number of entries, persistent and exclusive
    pub fn len(&self) -> usize {
        self.persistent.iter().flatten().count() + usize::from(self.exclusive.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
