//! Transient notification.
//!
//! A single message slot with a time-to-live. The state here only records
//! the message; the countdown is a cancellable [`Effect::Delay`] under
//! [`NOTIFICATION_TIMER`], so raising again replaces the running timer and
//! dismissing cancels it.
//!
//! Each raise bumps a generation counter and the timer carries the generation
//! it was started for, so an expiry that races a newer raise is ignored.

use chrono::{DateTime, Utc};
use std::time::Duration;
use todomvc_core::effect::{Effect, EffectId};

/// Default time-to-live of a notification
pub const DEFAULT_TTL: Duration = Duration::from_secs(3);

/// Effect id of the expiry countdown
pub const NOTIFICATION_TIMER: EffectId = EffectId::new("notification-timer");

/// The currently shown message, if any
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Notification {
    message: Option<String>,
    raised_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl Notification {
    /// Sets the message, overwriting any previous one.
    ///
    /// Returns the generation the expiry timer must carry.
    pub fn raise(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> u64 {
        self.generation += 1;
        self.message = Some(message.into());
        self.raised_at = Some(now);
        self.generation
    }

    /// Clears the message. Returns whether one was shown.
    pub fn dismiss(&mut self) -> bool {
        self.raised_at = None;
        self.message.take().is_some()
    }

    /// Clears the message if it is still the one raised as `generation`.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation == self.generation && self.message.is_some() {
            self.dismiss()
        } else {
            false
        }
    }

    /// The shown message
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// When the shown message was raised
    #[must_use]
    pub const fn raised_at(&self) -> Option<DateTime<Utc>> {
        self.raised_at
    }

    /// Generation of the latest raise
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a message is shown
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.message.is_some()
    }
}

/// Countdown that dispatches `expired(generation)` after `ttl`, replacing any
/// running countdown.
pub fn expiry_timer<A>(ttl: Duration, generation: u64, expired: impl FnOnce(u64) -> A) -> Effect<A> {
    Effect::Delay {
        duration: ttl,
        action: Box::new(expired(generation)),
    }
    .cancellable(NOTIFICATION_TIMER)
}

/// Stops the running countdown, if any.
#[must_use]
pub const fn cancel_timer<A>() -> Effect<A> {
    Effect::Cancel(NOTIFICATION_TIMER)
}
