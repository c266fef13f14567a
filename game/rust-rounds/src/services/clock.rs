use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::game_session::SessionEvent;
use crate::models::{ClockEvent, ClockGeneration};

/// Time units a player gets to answer one question.
pub const ROUND_TIME_BUDGET: u32 = 30;

/// Length of one time unit.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    Running(u32),
    Expired,
}

/// Pure countdown arithmetic; expires exactly once.
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: u32,
    expired: bool,
}

impl Countdown {
    pub fn new(budget: u32) -> Self {
        Self {
            remaining: budget,
            expired: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Advances one unit. Returns `None` once expiry has already been reported.
    pub fn tick(&mut self) -> Option<CountdownStep> {
        if self.expired {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            Some(CountdownStep::Expired)
        } else {
            Some(CountdownStep::Running(self.remaining))
        }
    }
}

struct ArmedClock {
    generation: ClockGeneration,
    handle: JoinHandle<()>,
}

/// Repeating one-unit timer feeding the session event queue.
///
/// At most one countdown is armed. Notifications are stamped with the generation
/// passed to `arm`; once `disarm` returns, `accepts` rejects everything that was
/// already queued for that generation.
pub struct Clock {
    events: UnboundedSender<SessionEvent>,
    period: Duration,
    armed: Option<ArmedClock>,
}

impl Clock {
    pub fn new(events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            events,
            period: TICK_PERIOD,
            armed: None,
        }
    }

    pub fn arm(&mut self, generation: ClockGeneration, budget: u32) {
        self.disarm();

        let events = self.events.clone();
        let period = self.period;
        let handle = tokio::spawn(run_countdown(generation, budget, period, events));

        tracing::debug!(generation, budget, "clock armed");
        self.armed = Some(ArmedClock { generation, handle });
    }

    /// Stops ticking. Idempotent.
    pub fn disarm(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.handle.abort();
            tracing::debug!(generation = armed.generation, "clock disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Whether a notification pulled off the queue still belongs to the armed countdown.
    /// An accepted expiry also releases the countdown.
    pub fn accepts(&mut self, event: &ClockEvent) -> bool {
        let current = match &self.armed {
            Some(armed) => armed.generation == event.generation(),
            None => false,
        };
        if current && matches!(event, ClockEvent::Expired { .. }) {
            self.armed = None;
        }
        current
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.disarm();
    }
}

async fn run_countdown(
    generation: ClockGeneration,
    budget: u32,
    period: Duration,
    events: UnboundedSender<SessionEvent>,
) {
    let mut countdown = Countdown::new(budget);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of a tokio interval completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        let event = match countdown.tick() {
            Some(CountdownStep::Running(remaining)) => ClockEvent::Tick {
                generation,
                remaining,
            },
            Some(CountdownStep::Expired) => ClockEvent::Expired { generation },
            None => break,
        };

        if events.send(SessionEvent::Clock(event)).is_err() {
            break;
        }
        if matches!(event, ClockEvent::Expired { .. }) {
            break;
        }
    }
}
