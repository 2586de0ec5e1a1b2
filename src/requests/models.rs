use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, Type};
use uuid::Uuid;
use validator::Validate;

/// Trip request status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trip request entity. Labels are free text supplied by the requester;
/// coordinates are derived from them by reconciliation and each pair is
/// either both-present or both-absent once a geocode job has completed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TripRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub passenger_name: String,
    pub purpose: Option<String>,
    pub origin_label: String,
    pub destination_label: String,
    pub from_lat: Option<f64>,
    pub from_lng: Option<f64>,
    pub to_lat: Option<f64>,
    pub to_lng: Option<f64>,
    pub status: RequestStatus,
    pub status_actor_id: Option<Uuid>,
    pub status_note: Option<String>,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TripRequest {
    pub fn new(
        requester_id: Uuid,
        passenger_name: String,
        purpose: Option<String>,
        origin_label: String,
        destination_label: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            requester_id,
            passenger_name,
            purpose,
            origin_label,
            destination_label,
            from_lat: None,
            from_lng: None,
            to_lat: None,
            to_lng: None,
            status: RequestStatus::Pending,
            status_actor_id: None,
            status_note: None,
            status_changed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn origin_pair(&self) -> Option<(f64, f64)> {
        self.from_lat.zip(self.from_lng)
    }

    pub fn destination_pair(&self) -> Option<(f64, f64)> {
        self.to_lat.zip(self.to_lng)
    }

    /// A half-filled pair counts as incomplete and needs reconciliation.
    pub fn origin_complete(&self) -> bool {
        self.origin_pair().is_some()
    }

    pub fn destination_complete(&self) -> bool {
        self.destination_pair().is_some()
    }

    pub fn set_origin_pair(&mut self, lat: f64, lng: f64) {
        self.from_lat = Some(lat);
        self.from_lng = Some(lng);
    }

    pub fn set_destination_pair(&mut self, lat: f64, lng: f64) {
        self.to_lat = Some(lat);
        self.to_lng = Some(lng);
    }

    pub fn apply_transition(&mut self, transition: &StatusTransition) {
        self.status = transition.target;
        self.status_actor_id = Some(transition.actor_id);
        self.status_note = transition.note.clone();
        self.status_changed_at = Some(transition.at);
        self.updated_at = transition.at;
    }
}

/// A status change together with who made it, when, and why. Applying one is
/// total over any current status; which transitions are legal is decided by
/// the authorization layer before this engine runs.
#[derive(Debug, Clone)]
pub struct StatusTransition {
    pub target: RequestStatus,
    pub actor_id: Uuid,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

impl StatusTransition {
    pub fn new(target: RequestStatus, actor_id: Uuid, note: Option<String>) -> Self {
        Self {
            target,
            actor_id,
            note,
            at: Utc::now(),
        }
    }
}

/// Changed-field comparison between the pre-write snapshot and the saved
/// record, handed to the reconciliation observer by the write path.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestDiff {
    pub origin_label_changed: bool,
    pub destination_label_changed: bool,
    pub status_changed: bool,
}

impl RequestDiff {
    pub fn between(before: &TripRequest, after: &TripRequest) -> Self {
        Self {
            origin_label_changed: before.origin_label != after.origin_label,
            destination_label_changed: before.destination_label != after.destination_label,
            status_changed: before.status != after.status,
        }
    }

    pub fn any_label_changed(&self) -> bool {
        self.origin_label_changed || self.destination_label_changed
    }
}

/// Request to create a trip request. The label fields accept their historical
/// names (`from_location`/`to_location`) from older clients.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTripRequest {
    pub requester_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub passenger_name: String,
    pub purpose: Option<String>,
    #[validate(length(min = 1, max = 255))]
    #[serde(alias = "from_location")]
    pub origin_label: String,
    #[validate(length(min = 1, max = 255))]
    #[serde(alias = "to_location")]
    pub destination_label: String,
}

/// Partial update of a trip request's editable fields.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTripRequest {
    pub passenger_name: Option<String>,
    pub purpose: Option<String>,
    #[serde(alias = "from_location")]
    pub origin_label: Option<String>,
    #[serde(alias = "to_location")]
    pub destination_label: Option<String>,
}

/// Body for approve/reject/cancel actions.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub actor_id: Uuid,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TripRequest {
        TripRequest::new(
            Uuid::new_v4(),
            "J. Doe".to_string(),
            Some("Site visit".to_string()),
            "Office".to_string(),
            "Onne Base".to_string(),
        )
    }

    #[test]
    fn test_new_request_has_no_coordinates() {
        let request = request();

        assert_eq!(request.status, RequestStatus::Pending);
        assert!(!request.origin_complete());
        assert!(!request.destination_complete());
    }

    #[test]
    fn test_half_filled_pair_is_incomplete() {
        let mut request = request();
        request.from_lat = Some(4.7888);

        assert!(!request.origin_complete());
        assert_eq!(request.origin_pair(), None);

        request.from_lng = Some(7.0545);
        assert_eq!(request.origin_pair(), Some((4.7888, 7.0545)));
    }

    #[test]
    fn test_diff_detects_label_and_status_changes() {
        let before = request();

        let mut after = before.clone();
        after.origin_label = "Warri Yard".to_string();
        let diff = RequestDiff::between(&before, &after);
        assert!(diff.origin_label_changed);
        assert!(!diff.destination_label_changed);
        assert!(!diff.status_changed);
        assert!(diff.any_label_changed());

        let mut after = before.clone();
        after.status = RequestStatus::Approved;
        let diff = RequestDiff::between(&before, &after);
        assert!(diff.status_changed);
        assert!(!diff.any_label_changed());
    }

    #[test]
    fn test_unrelated_edit_produces_empty_diff() {
        let before = request();
        let mut after = before.clone();
        after.purpose = Some("Changed purpose".to_string());

        let diff = RequestDiff::between(&before, &after);
        assert!(!diff.any_label_changed());
        assert!(!diff.status_changed);
    }

    #[test]
    fn test_apply_transition_writes_audit_fields() {
        let mut request = request();
        let actor = Uuid::new_v4();
        let transition = StatusTransition::new(
            RequestStatus::Rejected,
            actor,
            Some("No vehicle available".to_string()),
        );

        request.apply_transition(&transition);

        assert_eq!(request.status, RequestStatus::Rejected);
        assert_eq!(request.status_actor_id, Some(actor));
        assert_eq!(
            request.status_note.as_deref(),
            Some("No vehicle available")
        );
        assert_eq!(request.status_changed_at, Some(transition.at));
        assert_eq!(request.updated_at, transition.at);
    }
}
