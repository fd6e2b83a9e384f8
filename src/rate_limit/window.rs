/*!
 * Time Window
 *
 * Admission bookkeeping for one rate limiter. Not synchronized: the limiter
 * holds it behind a mutex and calls `try_admit` inside one critical section.
 *
 * Invariants:
 * - never more than `capacity` admissions inside a window
 * - with spacing enabled, no two admissions closer than `min_spacing`
 */

use super::config::{RateLimitConfig, WindowKind};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_PREALLOCATED_SLOTS: usize = 1024;

enum Slots {
    /// Admission instants, oldest first
    Rolling(VecDeque<Instant>),
    Fixed {
        opened: Option<Instant>,
        admitted: usize,
    },
}

pub struct TimeWindow {
    capacity: usize,
    window: Duration,
    min_spacing: Duration,
    slots: Slots,
    last_admission: Option<Instant>,
    latest_observed: Option<Instant>,
}

impl TimeWindow {
    pub fn new(config: &RateLimitConfig) -> Self {
        let slots = match config.kind {
            WindowKind::Rolling => Slots::Rolling(VecDeque::with_capacity(
                config.capacity.min(MAX_PREALLOCATED_SLOTS),
            )),
            WindowKind::Fixed => Slots::Fixed {
                opened: None,
                admitted: 0,
            },
        };
        Self {
            capacity: config.capacity,
            window: config.window,
            min_spacing: config.min_spacing,
            slots,
            last_admission: None,
            latest_observed: None,
        }
    }

    /// Evict, check and record in one step
    ///
    /// Returns `true` and records `now` if the call is admitted. A rejected
    /// call leaves the window untouched.
    ///
    /// # Panics
    ///
    /// If `now` is earlier than an instant previously passed in: a clock
    /// moving backwards would silently corrupt the window.
    pub fn try_admit(&mut self, now: Instant) -> bool {
        if let Some(latest) = self.latest_observed {
            assert!(now >= latest, "rate limiter clock moved backwards");
        }
        self.latest_observed = Some(now);

        self.evict(now);
        if !self.has_room() || !self.spacing_allows(now) {
            return false;
        }

        match &mut self.slots {
            Slots::Rolling(admissions) => admissions.push_back(now),
            Slots::Fixed { opened, admitted } => {
                opened.get_or_insert(now);
                *admitted += 1;
            }
        }
        self.last_admission = Some(now);
        true
    }

    /// Admissions currently counted against capacity
    pub fn admitted(&self) -> usize {
        match &self.slots {
            Slots::Rolling(admissions) => admissions.len(),
            Slots::Fixed { admitted, .. } => *admitted,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict(&mut self, now: Instant) {
        let window = self.window;
        match &mut self.slots {
            Slots::Rolling(admissions) => {
                while let Some(&oldest) = admissions.front() {
                    if now.duration_since(oldest) < window {
                        break;
                    }
                    admissions.pop_front();
                }
            }
            Slots::Fixed { opened, admitted } => {
                if let Some(start) = *opened {
                    if now.duration_since(start) >= window {
                        *opened = None;
                        *admitted = 0;
                    }
                }
            }
        }
    }

    #[inline]
    fn has_room(&self) -> bool {
        self.admitted() < self.capacity
    }

    #[inline]
    fn spacing_allows(&self, now: Instant) -> bool {
        if self.min_spacing.is_zero() {
            return true;
        }
        match self.last_admission {
            Some(last) => now.duration_since(last) >= self.min_spacing,
            None => true,
        }
    }
}

impl std::fmt::Debug for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeWindow")
            .field("capacity", &self.capacity)
            .field("window", &self.window)
            .field("min_spacing", &self.min_spacing)
            .field("admitted", &self.admitted())
            .finish()
    }
}
