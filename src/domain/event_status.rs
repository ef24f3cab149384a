//! Event lifecycle state machine.
//!
//! ```text
//! REGISTRATION_OPEN ──► REGISTRATION_CLOSED ──► LIVE ──► SETTLED
//!         │                     │
//!         └──────► VOIDED ◄─────┘
//! ```
//!
//! Time drives the first three states via [`derive_status`]; settlement is
//! an explicit administrative action. `VOIDED` and `SETTLED` are terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status stored in `events_metadata.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Accepting registrations.
    RegistrationOpen,
    /// Registration deadline passed with at least one participant.
    RegistrationClosed,
    /// Event date reached.
    Live,
    /// Yield distributed; counters frozen.
    Settled,
    /// Registration closed with nobody registered.
    Voided,
}

/// Rejected status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event status: {0}")]
pub struct UnknownStatus(pub String);

impl EventStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::RegistrationOpen,
        Self::RegistrationClosed,
        Self::Voided,
        Self::Live,
        Self::Settled,
    ];

    /// Wire and database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RegistrationOpen => "REGISTRATION_OPEN",
            Self::RegistrationClosed => "REGISTRATION_CLOSED",
            Self::Live => "LIVE",
            Self::Settled => "SETTLED",
            Self::Voided => "VOIDED",
        }
    }

    /// `true` for `VOIDED` and `SETTLED`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Voided | Self::Settled)
    }

    /// Position along the time-driven axis.
    const fn rank(self) -> u8 {
        match self {
            Self::RegistrationOpen => 0,
            Self::RegistrationClosed | Self::Voided => 1,
            Self::Live => 2,
            Self::Settled => 3,
        }
    }

    /// Combines the stored status with the one derived from the clock.
    ///
    /// Terminal statuses never change; otherwise the status only moves
    /// forward, so an administrative close is not reopened by the clock.
    #[must_use]
    pub const fn advance(self, derived: Self) -> Self {
        if self.is_terminal() || derived.rank() <= self.rank() {
            self
        } else {
            derived
        }
    }

    /// Whether an administrator may move an event from `self` to `next`.
    ///
    /// `SETTLED` is reachable only through settlement, never through a
    /// plain status update.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::RegistrationOpen,
                Self::RegistrationClosed | Self::Voided | Self::Live
            ) | (Self::RegistrationClosed, Self::Live | Self::Voided)
        )
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Status implied by the clock alone.
///
/// - `now < registration_deadline` → `REGISTRATION_OPEN`
/// - `registration_deadline <= now < event_date` → `REGISTRATION_CLOSED`
///   when anyone registered, else `VOIDED`
/// - `now >= event_date` → `LIVE`
///
/// All times are Unix seconds.
#[must_use]
pub const fn derive_status(
    now: i64,
    registration_deadline: i64,
    event_date: i64,
    current_participants: i64,
) -> EventStatus {
    if now < registration_deadline {
        EventStatus::RegistrationOpen
    } else if now < event_date {
        if current_participants > 0 {
            EventStatus::RegistrationClosed
        } else {
            EventStatus::Voided
        }
    } else {
        EventStatus::Live
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000;
    const T1: i64 = T0 + 86_400;

    #[test]
    fn closed_window_depends_on_participants() {
        let now = T0 + 10;
        assert_eq!(derive_status(now, T0, T1, 0), EventStatus::Voided);
        assert_eq!(
            derive_status(now, T0, T1, 3),
            EventStatus::RegistrationClosed
        );
    }

    #[test]
    fn timeline_for_single_event() {
        assert_eq!(
            derive_status(T0 - 1, T0, T1, 0),
            EventStatus::RegistrationOpen
        );
        assert_eq!(derive_status(T0 + 1, T0, T1, 0), EventStatus::Voided);
        assert_eq!(derive_status(T1 + 1, T0, T1, 0), EventStatus::Live);
    }

    #[test]
    fn boundaries_are_inclusive_on_the_left() {
        assert_eq!(derive_status(T0, T0, T1, 1), EventStatus::RegistrationClosed);
        assert_eq!(derive_status(T1, T0, T1, 1), EventStatus::Live);
    }

    #[test]
    fn advance_never_leaves_terminal() {
        assert_eq!(
            EventStatus::Voided.advance(EventStatus::Live),
            EventStatus::Voided
        );
        assert_eq!(
            EventStatus::Settled.advance(EventStatus::Live),
            EventStatus::Settled
        );
    }

    #[test]
    fn advance_only_moves_forward() {
        assert_eq!(
            EventStatus::RegistrationOpen.advance(EventStatus::Voided),
            EventStatus::Voided
        );
        assert_eq!(
            EventStatus::RegistrationClosed.advance(EventStatus::RegistrationOpen),
            EventStatus::RegistrationClosed
        );
        assert_eq!(
            EventStatus::RegistrationClosed.advance(EventStatus::Live),
            EventStatus::Live
        );
        assert_eq!(
            EventStatus::Live.advance(EventStatus::RegistrationOpen),
            EventStatus::Live
        );
    }

    #[test]
    fn admin_transitions() {
        use EventStatus::*;
        assert!(RegistrationOpen.can_transition_to(RegistrationClosed));
        assert!(RegistrationOpen.can_transition_to(Voided));
        assert!(RegistrationClosed.can_transition_to(Live));
        assert!(!Live.can_transition_to(Settled));
        assert!(!Voided.can_transition_to(RegistrationOpen));
        assert!(!Settled.can_transition_to(Live));
        assert!(!Live.can_transition_to(RegistrationOpen));
    }

    #[test]
    fn string_round_trip() {
        for status in EventStatus::ALL {
            let Ok(parsed) = status.as_str().parse::<EventStatus>() else {
                panic!("status should parse");
            };
            assert_eq!(parsed, status);
        }
        assert!("PENDING".parse::<EventStatus>().is_err());
    }

    #[test]
    fn serde_uses_screaming_case() {
        let json = serde_json::to_string(&EventStatus::RegistrationClosed).unwrap_or_default();
        assert_eq!(json, "\"REGISTRATION_CLOSED\"");
    }
}
