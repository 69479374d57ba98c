//! Flood protection.
//!
//! [`ModerationGuard`] keeps one [`BanRecord`] per sender and answers, for
//! every inbound message, whether the sender is currently banned and whether
//! that ban started with this very message.
//!
//! ```text
//!            window expired / ban expired
//!   ┌───────────────────────────────────────────┐
//!   ▼                                           │
//! Clean ──msg──▶ Counting ──count > penalty──▶ BannedJustNow ──msg──▶ BannedOngoing
//!                  │  ▲                                                  │
//!                  └──┘ count <= penalty                                 │
//!   ▲                                                                    │
//!   └──────────────────────────── ban expired ───────────────────────────┘
//! ```
//!
//! The guard is owned by the relay loop and mutated through `&mut self`, so
//! no locking is involved.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, trace};

use crate::foundation::Identity;

/// Record count above which expired records are pruned.
const PRUNE_THRESHOLD: usize = 4096;

// ============================================================================
// ExcludeSet
// ============================================================================

/// Usernames exempt from moderation.
///
/// Matching is case-insensitive and ignores a leading `@` in the configured
/// names. Identities without a username are never excluded.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    names: HashSet<String>,
}

impl ExcludeSet {
    /// Builds the set from configured usernames.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| n.as_ref().trim().trim_start_matches('@').to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }

    /// Returns `true` if the identity is exempt.
    pub fn contains(&self, identity: &Identity) -> bool {
        identity.has_username() && self.names.contains(&identity.username.to_lowercase())
    }

    /// Number of excluded usernames.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nobody is excluded.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ============================================================================
// GuardConfig
// ============================================================================

/// Moderation policy.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Length of the counting window.
    pub allowed_period: Duration,
    /// Messages tolerated inside one window; one more starts a ban.
    pub ban_penalty: u32,
    /// How long a ban lasts.
    pub ban_duration: Duration,
    /// Senders exempt from moderation.
    pub exclude: ExcludeSet,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            allowed_period: Duration::from_secs(120),
            ban_penalty: 2,
            ban_duration: Duration::from_secs(600),
            exclude: ExcludeSet::default(),
        }
    }
}

// ============================================================================
// Verdict
// ============================================================================

/// Outcome of [`ModerationGuard::check`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verdict {
    /// The sender is banned; the message must not be dispatched.
    pub active: bool,
    /// The ban started with this message.
    pub is_new: bool,
}

impl Verdict {
    /// Not banned.
    pub const CLEAR: Self = Self {
        active: false,
        is_new: false,
    };

    /// Ban started with this message.
    pub const BANNED_NOW: Self = Self {
        active: true,
        is_new: true,
    };

    /// Ban already in effect.
    pub const BANNED: Self = Self {
        active: true,
        is_new: false,
    };
}

// ============================================================================
// BanRecord
// ============================================================================

#[derive(Debug, Clone)]
struct BanRecord {
    count: u32,
    window_start: DateTime<Utc>,
    banned: bool,
    ban_expiry: DateTime<Utc>,
}

impl BanRecord {
    fn fresh(at: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            window_start: at,
            banned: false,
            ban_expiry: at,
        }
    }
}

// ============================================================================
// ModerationGuard
// ============================================================================

/// Sliding-window flood detector with temporary bans.
#[derive(Debug)]
pub struct ModerationGuard {
    allowed_period: TimeDelta,
    ban_penalty: u32,
    ban_duration: TimeDelta,
    exclude: ExcludeSet,
    records: HashMap<Identity, BanRecord>,
}

impl ModerationGuard {
    /// Creates a guard with the given policy.
    pub fn new(config: GuardConfig) -> Self {
        Self {
            allowed_period: to_delta(config.allowed_period),
            ban_penalty: config.ban_penalty,
            ban_duration: to_delta(config.ban_duration),
            exclude: config.exclude,
            records: HashMap::new(),
        }
    }

    /// Configured ban duration.
    pub fn ban_duration(&self) -> Duration {
        self.ban_duration.to_std().unwrap_or_default()
    }

    /// Number of senders currently tracked.
    pub fn tracked(&self) -> usize {
        self.records.len()
    }

    /// Registers a message from `who` sent at `at` and reports the ban state.
    pub fn check(&mut self, who: &Identity, at: DateTime<Utc>) -> Verdict {
        if self.exclude.contains(who) {
            trace!(user = %who, "Sender excluded from moderation");
            return Verdict::CLEAR;
        }

        if self.records.len() > PRUNE_THRESHOLD {
            self.prune(at);
        }

        let Some(record) = self.records.get_mut(who) else {
            self.records.insert(who.clone(), BanRecord::fresh(at));
            return Verdict::CLEAR;
        };

        if record.banned {
            if at < record.ban_expiry {
                return Verdict::BANNED;
            }
            debug!(user = %who, "Ban expired");
            *record = BanRecord::fresh(at);
            return Verdict::CLEAR;
        }

        if at - record.window_start >= self.allowed_period {
            *record = BanRecord::fresh(at);
            return Verdict::CLEAR;
        }

        record.count += 1;
        if record.count > self.ban_penalty {
            record.banned = true;
            record.ban_expiry = at
                .checked_add_signed(self.ban_duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            debug!(
                user = %who,
                count = record.count,
                until = %record.ban_expiry,
                "Flood detected, ban started"
            );
            return Verdict::BANNED_NOW;
        }

        Verdict::CLEAR
    }

    /// Drops records that no longer influence any verdict.
    ///
    /// A record is dropped when its window has expired and it carries no
    /// active ban; the next message from that sender starts fresh either way.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let before = self.records.len();
        let period = self.allowed_period;
        self.records.retain(|_, r| {
            if r.banned {
                now < r.ban_expiry
            } else {
                now - r.window_start < period
            }
        });
        trace!(
            before,
            after = self.records.len(),
            "Pruned moderation records"
        );
    }
}

fn to_delta(d: Duration) -> TimeDelta {
    TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX)
}
