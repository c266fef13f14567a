use serde::{Deserialize, Serialize};

/// Identity of one `arm` call. Notifications carrying a stale generation are dropped.
pub type ClockGeneration = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClockEvent {
    Tick {
        generation: ClockGeneration,
        remaining: u32,
    },
    Expired {
        generation: ClockGeneration,
    },
}

impl ClockEvent {
    pub fn generation(&self) -> ClockGeneration {
        match self {
            ClockEvent::Tick { generation, .. } | ClockEvent::Expired { generation } => *generation,
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            ClockEvent::Tick { .. } => "clock-tick",
            ClockEvent::Expired { .. } => "clock-expired",
        }
    }
}
