use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Assist request lifecycle. The only legal transitions are
/// pending → accepted, pending → escalated, pending → cancelled and
/// accepted → resolved; resolved, escalated and cancelled are terminal.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AssistStatus {
    Pending,
    Accepted,
    Resolved,
    Escalated,
    Cancelled,
}

impl AssistStatus {
    pub fn can_transition_to(self, next: AssistStatus) -> bool {
        use AssistStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted) | (Pending, Escalated) | (Pending, Cancelled) | (Accepted, Resolved)
        )
    }

    /// The only status an update to `next` may find in the row, derived from
    /// the transition table. Bound as the WHERE precondition so a lost race
    /// shows up as zero affected rows.
    pub fn required_prior(next: AssistStatus) -> Option<AssistStatus> {
        use AssistStatus::*;
        [Pending, Accepted, Resolved, Escalated, Cancelled]
            .into_iter()
            .find(|prior| prior.can_transition_to(next))
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AssistRequest {
    #[schema(example = 31)]
    pub id: u64,

    #[schema(example = "Ground floor gents")]
    pub location: String,

    #[schema(example = 1)]
    pub customer_id: u64,

    #[schema(example = "supplies")]
    pub issue_type: String,

    #[schema(example = "Paper towels out", nullable = true)]
    pub description: Option<String>,

    #[schema(example = "pending", value_type = String)]
    pub status: String,

    #[schema(example = "2026-01-05T10:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub accepted_at: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub resolved_at: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub escalated_at: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub cancelled_at: Option<DateTime<Utc>>,

    #[schema(example = "Maria Kovacs", nullable = true)]
    pub accepted_by: Option<String>,

    #[schema(example = "Maria Kovacs", nullable = true)]
    pub resolved_by: Option<String>,

    /// JSON-serialized lists of storage object keys
    #[schema(example = "[\"assist/31/before1.jpg\"]", value_type = String)]
    pub before_photos: String,

    #[schema(example = "[]", value_type = String)]
    pub after_photos: String,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AssistEvent {
    #[schema(example = 77)]
    pub id: u64,

    #[schema(example = 31)]
    pub request_id: u64,

    #[schema(example = "accepted")]
    pub event: String,

    #[schema(example = "Maria Kovacs")]
    pub actor: String,

    #[schema(example = "2026-01-05T10:05:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::AssistStatus::*;

    #[test]
    fn pending_fans_out() {
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Escalated));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Resolved));
    }

    #[test]
    fn accepted_only_resolves() {
        assert!(Accepted.can_transition_to(Resolved));
        assert!(!Accepted.can_transition_to(Escalated));
        assert!(!Accepted.can_transition_to(Cancelled));
        assert!(!Accepted.can_transition_to(Pending));
    }

    #[test]
    fn terminal_states_stay_terminal() {
        for terminal in [Resolved, Escalated, Cancelled] {
            for next in [Pending, Accepted, Resolved, Escalated, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn required_prior_matches_transition_table() {
        use super::AssistStatus;
        for next in [Accepted, Resolved, Escalated, Cancelled] {
            let prior = AssistStatus::required_prior(next).unwrap();
            assert!(prior.can_transition_to(next));
        }
        assert_eq!(AssistStatus::required_prior(Pending), None);
    }

    #[test]
    fn each_target_has_a_unique_prior() {
        use super::AssistStatus;
        let all = [Pending, Accepted, Resolved, Escalated, Cancelled];
        for next in [Accepted, Resolved, Escalated, Cancelled] {
            let priors: Vec<_> = all.into_iter().filter(|p| p.can_transition_to(next)).collect();
            assert_eq!(priors.len(), 1, "{next} must have exactly one legal prior");
            assert_eq!(AssistStatus::required_prior(next), Some(priors[0]));
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        use std::str::FromStr;
        for s in [Pending, Accepted, Resolved, Escalated, Cancelled] {
            let text = s.to_string();
            assert_eq!(super::AssistStatus::from_str(&text).unwrap(), s);
        }
        assert_eq!(Pending.to_string(), "pending");
    }
}
