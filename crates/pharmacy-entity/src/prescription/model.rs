//! Prescription entity model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::item::{NewPrescriptionItem, PrescriptionItem};
use super::status::PrescriptionStatus;

/// A prescription as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Prescription {
    pub id: Uuid,
    pub prescription_number: String,
    pub client_name: String,
    pub doctor_name: String,
    pub status: PrescriptionStatus,
    pub prescription_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub created_by: Uuid,
    pub delivered_by: Option<Uuid>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prescription {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        self.expiry_date.signed_duration_since(today).num_days()
    }

    /// Status implied by the items and the calendar.
    ///
    /// Completion is terminal. Otherwise an expired prescription reports as
    /// expired whatever was already delivered.
    pub fn recompute_status(
        &self,
        items: &[PrescriptionItem],
        today: NaiveDate,
    ) -> PrescriptionStatus {
        if self.status == PrescriptionStatus::Completed {
            return PrescriptionStatus::Completed;
        }
        if self.is_expired(today) {
            PrescriptionStatus::Expired
        } else if !items.is_empty() && items.iter().all(PrescriptionItem::is_fully_delivered) {
            PrescriptionStatus::Completed
        } else if items.iter().any(|item| item.quantity_delivered > 0) {
            PrescriptionStatus::PartiallyDelivered
        } else {
            PrescriptionStatus::Pending
        }
    }

    /// Move to the recomputed status. Returns `false` and leaves the record
    /// untouched when nothing changed.
    pub fn refresh_status(
        &mut self,
        items: &[PrescriptionItem],
        today: NaiveDate,
        now: DateTime<Utc>,
        actor: Option<Uuid>,
    ) -> bool {
        let next = self.recompute_status(items, today);
        if next == self.status {
            return false;
        }
        self.status = next;
        if next == PrescriptionStatus::Completed {
            if self.delivered_at.is_none() {
                self.delivered_at = Some(now);
            }
            if self.delivered_by.is_none() {
                self.delivered_by = actor;
            }
        }
        self.updated_at = now;
        true
    }
}

/// Delivered over prescribed quantities, as a percentage with one decimal.
pub fn delivery_progress(items: &[PrescriptionItem]) -> f64 {
    let prescribed: i64 = items.iter().map(|i| i64::from(i.quantity_prescribed)).sum();
    if prescribed == 0 {
        return 0.0;
    }
    let delivered: i64 = items.iter().map(|i| i64::from(i.quantity_delivered)).sum();
    (delivered as f64 / prescribed as f64 * 1000.0).round() / 10.0
}

/// A prescription with its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionDetails {
    pub prescription: Prescription,
    pub items: Vec<PrescriptionItem>,
}

impl PrescriptionDetails {
    pub fn delivery_progress(&self) -> f64 {
        delivery_progress(&self.items)
    }
}

/// Input for registering a prescription.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPrescription {
    #[validate(length(min = 1, max = 255))]
    pub client_name: String,
    #[validate(length(min = 1, max = 255))]
    pub doctor_name: String,
    pub prescription_date: NaiveDate,
    pub expiry_date: NaiveDate,
    #[validate(length(min = 1, message = "a prescription needs at least one item"), nested)]
    pub items: Vec<NewPrescriptionItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
    }

    fn prescription(expiry: NaiveDate) -> Prescription {
        Prescription {
            id: Uuid::new_v4(),
            prescription_number: "ORD-2026-0001".to_string(),
            client_name: "Awa Diallo".to_string(),
            doctor_name: "Dr Mensah".to_string(),
            status: PrescriptionStatus::Pending,
            prescription_date: today(),
            expiry_date: expiry,
            created_by: Uuid::new_v4(),
            delivered_by: None,
            delivered_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(prescribed: i32, delivered: i32) -> PrescriptionItem {
        PrescriptionItem {
            id: Uuid::new_v4(),
            prescription_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity_prescribed: prescribed,
            quantity_delivered: delivered,
            dosage_instructions: None,
        }
    }

    #[test]
    fn test_recompute_status_precedence() {
        let valid = prescription(today() + chrono::Days::new(30));
        assert_eq!(
            valid.recompute_status(&[item(2, 0)], today()),
            PrescriptionStatus::Pending
        );
        assert_eq!(
            valid.recompute_status(&[item(2, 1), item(1, 0)], today()),
            PrescriptionStatus::PartiallyDelivered
        );
        assert_eq!(
            valid.recompute_status(&[item(2, 2), item(1, 3)], today()),
            PrescriptionStatus::Completed
        );
        assert_eq!(valid.recompute_status(&[], today()), PrescriptionStatus::Pending);

        let expired = prescription(today() - chrono::Days::new(1));
        assert_eq!(
            expired.recompute_status(&[item(2, 1)], today()),
            PrescriptionStatus::Expired
        );
    }

    #[test]
    fn test_expiry_day_itself_is_not_expired() {
        let due_today = prescription(today());
        assert!(!due_today.is_expired(today()));
        assert_eq!(due_today.days_until_expiry(today()), 0);
    }

    #[test]
    fn test_completed_is_terminal() {
        let mut done = prescription(today() - chrono::Days::new(5));
        done.status = PrescriptionStatus::Completed;
        assert_eq!(
            done.recompute_status(&[item(1, 1)], today()),
            PrescriptionStatus::Completed
        );
    }

    #[test]
    fn test_refresh_status_is_idempotent() {
        let mut p = prescription(today() + chrono::Days::new(10));
        let items = [item(2, 1)];
        let now = Utc::now();
        assert!(p.refresh_status(&items, today(), now, None));
        let snapshot = p.clone();
        assert!(!p.refresh_status(&items, today(), now + chrono::Duration::hours(1), None));
        assert_eq!(p, snapshot);
    }

    #[test]
    fn test_refresh_to_completed_stamps_delivery() {
        let mut p = prescription(today() + chrono::Days::new(10));
        let actor = Uuid::new_v4();
        let now = Utc::now();
        assert!(p.refresh_status(&[item(1, 1)], today(), now, Some(actor)));
        assert_eq!(p.status, PrescriptionStatus::Completed);
        assert_eq!(p.delivered_at, Some(now));
        assert_eq!(p.delivered_by, Some(actor));
    }

    #[test]
    fn test_delivery_progress_rounds_to_one_decimal() {
        assert_eq!(delivery_progress(&[item(3, 1)]), 33.3);
        assert_eq!(delivery_progress(&[item(2, 1), item(2, 2)]), 75.0);
        assert_eq!(delivery_progress(&[]), 0.0);
    }
}
