use serde::{Deserialize, Serialize};

/// Logical clock of the watcher: one frame per detection pass.
///
/// Only used to order observations inside a process; it is never persisted
/// alongside presence records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tick {
    pub frame: u64,
}

impl Tick {
    pub fn new() -> Self {
        Tick { frame: 0 }
    }

    pub fn next(&self) -> Self {
        Tick { frame: self.frame + 1 }
    }
}
