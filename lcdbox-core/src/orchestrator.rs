//! Mode orchestrator
//!
//! Owns the task table and is the only thing allowed to start or stop the
//! exclusive mode task. Input channels call [`Orchestrator::switch_mode`];
//! a dedicated slot task runs [`Orchestrator::run_slot`], which actually
//! executes modes through a [`ModeLauncher`].
//!
//! ```text
//!  serial_input ─┐                      ┌────────────── slot task ───────────────┐
//!                ├─► switch_mode(id) ──►│ wait start ─► insert handle ─► launch  │
//!  http_input ───┘   │  (single-flight) │      ▲                         │       │
//!                    │ cancel + await   │      └──── stopped ◄───────────┘       │
//!                    └─ stopped ◄───────┴────────────────────────────────────────┘
//! ```
//!
//! A switch always finishes tearing down the old mode before the new one is
//! started. Concurrent switches queue on the switch guard.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::mutex::Mutex as AsyncMutex;
use embassy_sync::signal::Signal;

use crate::cancel::CancelToken;
use crate::log::{log_debug, log_error, log_info, log_warn};
use crate::registry::{ModeDescriptor, ModeFactory, Registry};
use crate::table::{PersistentTask, SlotState, TableError, TaskHandle, TaskTable};

/// How a mode run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeExit {
    /// Returned on its own, successfully or after a runtime error
    Finished,
    /// Stopped after the cancel token was raised
    Cancelled,
    /// Failed before its main loop; the slot is left empty
    SetupFailed,
}

/// Runs one mode to completion in the exclusive slot
#[allow(async_fn_in_trait)]
pub trait ModeLauncher<M: RawMutex, K> {
    /// Run `mode` until it returns or observes `cancel`
    async fn launch(&mut self, mode: &ModeDescriptor<K>, cancel: &CancelToken<M>) -> ModeExit;
}

/// Single-exclusive-task coordinator
pub struct Orchestrator<M: RawMutex, K> {
    registry: Registry<K>,
    table: Mutex<M, RefCell<TaskTable>>,
    switch_guard: AsyncMutex<M, ()>,
    cancel: CancelToken<M>,
    /// Registry index of the mode to start next
    start: Signal<M, usize>,
    /// Slot has inserted the new handle
    started: Signal<M, ()>,
    /// Slot's current mode has returned
    stopped: Signal<M, ()>,
}

impl<M: RawMutex, K: ModeFactory> Orchestrator<M, K> {
    pub fn new(registry: Registry<K>) -> Self {
        Self {
            registry,
            table: Mutex::new(RefCell::new(TaskTable::new())),
            switch_guard: AsyncMutex::new(()),
            cancel: CancelToken::new(),
            start: Signal::new(),
            started: Signal::new(),
            stopped: Signal::new(),
        }
    }

    pub fn registry(&self) -> &Registry<K> {
        &self.registry
    }

    /// Record a background task started at boot
    pub fn register_persistent(&self, task: PersistentTask) -> Result<(), TableError> {
        self.table
            .lock(|t| t.borrow_mut().register_persistent(task))
    }

    /// Snapshot of the task table
    pub fn table(&self) -> TaskTable {
        self.table.lock(|t| *t.borrow())
    }

    pub fn slot_state(&self) -> SlotState {
        self.table.lock(|t| t.borrow().slot_state())
    }

    /// Id of the mode currently running in the exclusive slot
    pub fn active_mode(&self) -> Option<&'static str> {
        self.table.lock(|t| {
            let table = t.borrow();
            match table.slot_state() {
                SlotState::Running => table.exclusive().map(|h| h.name),
                _ => None,
            }
        })
    }

    /// Switch the exclusive slot to mode `id`
    ///
    /// Returns `false` for an unknown id without touching the running mode.
    /// Otherwise tears down the current mode, waits for it to finish, starts
    /// `id` and returns `true`. Requesting the running mode restarts it.
    pub async fn switch_mode(&self, id: &str) -> bool {
        let Some(index) = self.registry.position(id) else {
            log_warn!("Unknown mode '{}'", id);
            return false;
        };

        let _guard = self.switch_guard.lock().await;
        self.stop_exclusive().await;

        self.started.reset();
        self.start.signal(index);
        self.started.wait().await;

        log_info!("Switched to mode '{}'", id);
        true
    }

    async fn stop_exclusive(&self) {
        match self.slot_state() {
            SlotState::Empty => {}
            SlotState::Finished => {
                self.table.lock(|t| t.borrow_mut().remove_exclusive());
            }
            SlotState::Running | SlotState::CancelRequested => {
                self.table.lock(|t| {
                    if let Some(handle) = t.borrow_mut().exclusive_mut() {
                        handle.cancellation_requested = true;
                        log_debug!("Cancelling mode '{}'", handle.name);
                    }
                });
                self.cancel.cancel();
                self.stopped.wait().await;
                self.table.lock(|t| t.borrow_mut().remove_exclusive());
            }
        }
    }

    /// Drive the exclusive slot forever
    ///
    /// Must run in its own task. Each start request inserts a fresh handle,
    /// acknowledges the switch, and runs the mode until it returns.
    pub async fn run_slot<L: ModeLauncher<M, K>>(&self, launcher: &mut L) -> ! {
        loop {
            let index = self.start.wait().await;
            let Some(mode) = self.registry.get(index) else {
                self.started.signal(());
                continue;
            };

            self.cancel.reset();
            self.stopped.reset();
            let inserted = self
                .table
                .lock(|t| t.borrow_mut().insert_exclusive(TaskHandle::new(mode.id)));
            if inserted.is_err() {
                log_error!("Exclusive slot still occupied when starting '{}'", mode.id);
            }
            self.started.signal(());

            let exit = launcher.launch(mode, &self.cancel).await;

            self.table.lock(|t| {
                let mut table = t.borrow_mut();
                match exit {
                    ModeExit::SetupFailed => {
                        log_error!("Mode '{}' failed to start, slot left empty", mode.id);
                        table.remove_exclusive();
                    }
                    ModeExit::Finished | ModeExit::Cancelled => {
                        if let Some(handle) = table.exclusive_mut() {
                            handle.completed = true;
                        }
                    }
                }
            });
            self.stopped.signal(());
        }
    }
}
