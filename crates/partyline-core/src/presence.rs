//! Room-wide typing presence.

/// Single shared "someone else is typing" flag.
///
/// The backend aggregates typing presence across the room, so this is one
/// boolean with last-write-wins semantics, not a per-user map. Reset on
/// leave.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenceTracker {
    anyone_typing: bool,
}

impl PresenceTracker {
    /// Create a tracker with nobody typing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the flag from the most recent presence event.
    pub fn set(&mut self, anyone_typing: bool) {
        self.anyone_typing = anyone_typing;
    }

    /// Reset to nobody typing.
    pub fn clear(&mut self) {
        self.anyone_typing = false;
    }

    /// True while anyone else in the room is typing.
    pub fn anyone_typing(&self) -> bool {
        self.anyone_typing
    }
}
