//! Short-lived UI signals (celebration, highlighted task).
//!
//! Each raise bumps a monotonically increasing token. A delayed clear only
//! succeeds when it carries the current token, so the expiry of an older
//! request can never cut a newer one short.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalToken(u64);

#[derive(Debug, Clone)]
pub struct TransientSignal<T> {
    value: Option<T>,
    token: u64,
    deadline: Option<DateTime<Utc>>,
    ttl: Duration,
}

impl<T> TransientSignal<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            value: None,
            token: 0,
            deadline: None,
            ttl,
        }
    }

    /// Set the signal until `now + ttl`, superseding any earlier request.
    pub fn raise(&mut self, value: T, now: DateTime<Utc>) -> SignalToken {
        self.token += 1;
        self.value = Some(value);
        self.deadline = Some(now + self.ttl);
        SignalToken(self.token)
    }

    /// Clear the signal if `token` is still the latest request.
    pub fn expire(&mut self, token: SignalToken) -> bool {
        if token.0 != self.token || self.value.is_none() {
            return false;
        }
        self.value = None;
        self.deadline = None;
        true
    }

    /// Value if raised and not yet past its deadline.
    pub fn current(&self, now: DateTime<Utc>) -> Option<&T> {
        match self.deadline {
            Some(deadline) if now < deadline => self.value.as_ref(),
            _ => None,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.current(now).is_some()
    }
}
