//! Arbitration state for a source governed by two triggers.
//!
//! The owning trigger (the scheduled music window) sets the authoritative
//! intent. The secondary trigger (duck while speaking) only ever overrides
//! that intent temporarily: once every duck has been restored the physical
//! state falls back to whatever the owner currently wants.

use serde::Serialize;

/// Observable arbitration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedSourceState {
    /// The owner wants the source off.
    OwnerOff,
    /// The owner wants the source on and nothing overrides it.
    OwnerOn,
    /// The owner wants the source on but speech is holding it down.
    OwnerOnButDucked,
}

/// Per-source arbitration record.
#[derive(Debug, Clone, Default)]
pub struct SharedSource {
    owner_on: bool,
    ducks: u32,
    window: u64,
    applied: Option<bool>,
}

impl SharedSource {
    /// Current arbitration state.
    #[must_use]
    pub fn state(&self) -> SharedSourceState {
        match (self.owner_on, self.ducks) {
            (false, _) => SharedSourceState::OwnerOff,
            (true, 0) => SharedSourceState::OwnerOn,
            (true, _) => SharedSourceState::OwnerOnButDucked,
        }
    }

    /// Physical visibility the source should have right now.
    #[must_use]
    pub fn desired(&self) -> bool {
        self.owner_on && self.ducks == 0
    }

    /// Number of outstanding ducks.
    #[must_use]
    pub fn duck_depth(&self) -> u32 {
        self.ducks
    }

    /// The owner opens a window. Returns the window generation, which the
    /// matching close must present.
    pub fn open_window(&mut self) -> u64 {
        self.window += 1;
        self.owner_on = true;
        self.window
    }

    /// The owner closes window `generation`.
    ///
    /// Returns `false` and changes nothing if a newer window has replaced it.
    pub fn close_window(&mut self, generation: u64) -> bool {
        if generation != self.window {
            return false;
        }
        self.owner_on = false;
        true
    }

    /// Speech started: hold the source down.
    pub fn duck(&mut self) {
        self.ducks += 1;
    }

    /// Speech ended: release one duck.
    pub fn restore(&mut self) {
        self.ducks = self.ducks.saturating_sub(1);
    }

    /// The command needed to bring the physical source in line with
    /// [`SharedSource::desired`], if any.
    #[must_use]
    pub fn pending_command(&self) -> Option<bool> {
        let desired = self.desired();
        (self.applied != Some(desired)).then_some(desired)
    }

    /// Records that the control plane accepted `enabled`.
    pub fn mark_applied(&mut self, enabled: bool) {
        self.applied = Some(enabled);
    }
}
