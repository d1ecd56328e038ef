use std::sync::{Arc, Condvar, Mutex};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventAddress {
    pub run: u64,
    pub subrun: u64,
    pub event: u64,
}

impl EventAddress {
    pub fn new(run: u64, subrun: u64, event: u64) -> Self {
        Self { run, subrun, event }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavCommand {
    NextEvent,
    PrevEvent,
    ReloadEvent,
    GotoEvent { target: EventAddress },
    SequentialOnly,
}

#[derive(Debug, Default)]
struct Slot {
    command: Option<NavCommand>,
    sequential_only: bool,
    disconnected: bool,
}

/// Single-slot command channel between the GUI callbacks and the event
/// loop. `post` stores a command (last one wins) and wakes the loop
/// synchronously; `await_command` blocks until a command or disconnect.
///
/// Once `SequentialOnly` is posted it latches: further posts still wake the
/// loop, but the delivered command stays `SequentialOnly`. Sources that can
/// only move forward must not be asked to seek.
#[derive(Debug, Clone, Default)]
pub struct NavChannel {
    inner: Arc<(Mutex<Slot>, Condvar)>,
}

impl NavChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, command: NavCommand) {
        let (slot, wake) = &*self.inner;
        let mut slot = slot.lock().expect("nav slot lock");
        if command == NavCommand::SequentialOnly {
            slot.sequential_only = true;
        }
        slot.command = Some(if slot.sequential_only {
            NavCommand::SequentialOnly
        } else {
            command
        });
        wake.notify_one();
    }

    /// Blocks until the next command. None means the posting side is gone
    /// and the loop should finish.
    pub fn await_command(&self) -> Option<NavCommand> {
        let (slot, wake) = &*self.inner;
        let mut slot = slot.lock().expect("nav slot lock");
        loop {
            if let Some(command) = slot.command.take() {
                return Some(command);
            }
            if slot.disconnected {
                return None;
            }
            slot = wake.wait(slot).expect("nav slot lock");
        }
    }

    pub fn try_take(&self) -> Option<NavCommand> {
        let (slot, _) = &*self.inner;
        slot.lock().expect("nav slot lock").command.take()
    }

    pub fn disconnect(&self) {
        let (slot, wake) = &*self.inner;
        slot.lock().expect("nav slot lock").disconnected = true;
        wake.notify_all();
    }
}
