//! Prescription lifecycle alerts.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use pharmacy_core::config::AlertingConfig;
use pharmacy_database::store::UserDirectory;
use pharmacy_entity::notification::{AlertPayload, AlertSubject, NotificationPriority};
use pharmacy_entity::prescription::{PrescriptionDetails, PrescriptionStatus};

use super::emitter::{Alert, AlertEmitter, Dedup, Delivery};
use super::outcome::AlertOutcome;
use super::recipients::Audience;

const UNKNOWN_USER: &str = "Unknown";

/// Pharmacists get the actionable wording, managers an informational copy.
pub fn created_alert(details: &PrescriptionDetails) -> Alert {
    let p = &details.prescription;
    Alert::new(
        AlertPayload::PrescriptionCreated {
            prescription_id: p.id,
            prescription_number: p.prescription_number.clone(),
            client_name: p.client_name.clone(),
            doctor_name: p.doctor_name.clone(),
        },
        Dedup::Permanent,
    )
    .deliver(Delivery::new(
        Audience::Pharmacists,
        NotificationPriority::Medium,
        "New prescription",
        format!(
            "New prescription {} for {}, prescribed by {}",
            p.prescription_number, p.client_name, p.doctor_name
        ),
    ))
    .deliver(Delivery::new(
        Audience::Admins,
        NotificationPriority::Low,
        "New prescription",
        format!(
            "Prescription {} registered for {}",
            p.prescription_number, p.client_name
        ),
    ))
}

pub fn completed_alert(details: &PrescriptionDetails, delivered_by: &str) -> Alert {
    let p = &details.prescription;
    Alert::new(
        AlertPayload::PrescriptionCompleted {
            prescription_id: p.id,
            prescription_number: p.prescription_number.clone(),
            client_name: p.client_name.clone(),
            delivered_by: delivered_by.to_string(),
        },
        Dedup::Permanent,
    )
    .deliver(Delivery::new(
        Audience::Admins,
        NotificationPriority::Low,
        "Prescription completed",
        format!(
            "Prescription {} for {} has been fully delivered",
            p.prescription_number, p.client_name
        ),
    ))
}

/// Repeatable: every partial delivery is news to the pharmacists.
pub fn partially_delivered_alert(details: &PrescriptionDetails) -> Alert {
    let p = &details.prescription;
    let progress = details.delivery_progress();
    Alert::new(
        AlertPayload::PrescriptionPartiallyDelivered {
            prescription_id: p.id,
            prescription_number: p.prescription_number.clone(),
            client_name: p.client_name.clone(),
            progress,
        },
        Dedup::None,
    )
    .deliver(Delivery::new(
        Audience::Pharmacists,
        NotificationPriority::Medium,
        "Prescription partially delivered",
        format!(
            "Prescription {} for {} has been partially delivered ({progress}%)",
            p.prescription_number, p.client_name
        ),
    ))
}

/// Expiring alert for a still-pending prescription within `lookahead_days`.
pub fn expiring_alert(
    details: &PrescriptionDetails,
    today: NaiveDate,
    lookahead_days: i64,
    dedup: Dedup,
) -> Option<Alert> {
    let p = &details.prescription;
    let days = p.days_until_expiry(today);
    if p.status != PrescriptionStatus::Pending || !(0..=lookahead_days).contains(&days) {
        return None;
    }
    Some(
        Alert::new(
            AlertPayload::PrescriptionExpiring {
                prescription_id: p.id,
                prescription_number: p.prescription_number.clone(),
                client_name: p.client_name.clone(),
                expiry_date: p.expiry_date,
                days_until_expiry: days,
            },
            dedup,
        )
        .deliver(Delivery::new(
            Audience::AllUsers,
            NotificationPriority::High,
            "Prescription expiring soon",
            format!(
                "Prescription {} for {} expires in {days} day(s)",
                p.prescription_number, p.client_name
            ),
        )),
    )
}

/// Observer reacting to prescription creation and status changes.
#[derive(Debug, Clone)]
pub struct PrescriptionAlerts {
    emitter: Arc<AlertEmitter>,
    users: Arc<dyn UserDirectory>,
    settings: Arc<AlertingConfig>,
}

impl PrescriptionAlerts {
    pub fn new(
        emitter: Arc<AlertEmitter>,
        users: Arc<dyn UserDirectory>,
        settings: Arc<AlertingConfig>,
    ) -> Self {
        Self {
            emitter,
            users,
            settings,
        }
    }

    pub async fn on_created(&self, details: &PrescriptionDetails) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        info!(
            prescription_id = %details.prescription.id,
            prescription_number = %details.prescription.prescription_number,
            "Prescription created, sending notifications"
        );
        self.emitter
            .emit_recorded("prescription_created", created_alert(details), &mut outcome)
            .await;
        self.check_expiring(details, &mut outcome).await;
        outcome
    }

    pub async fn on_updated(
        &self,
        previous: PrescriptionStatus,
        details: &PrescriptionDetails,
    ) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        let status = details.prescription.status;

        if previous != status {
            match status {
                PrescriptionStatus::Completed => {
                    let delivered_by = self.delivered_by_name(details, &mut outcome).await;
                    self.emitter
                        .emit_recorded(
                            "prescription_completed",
                            completed_alert(details, &delivered_by),
                            &mut outcome,
                        )
                        .await;
                }
                PrescriptionStatus::PartiallyDelivered => {
                    self.emitter
                        .emit_recorded(
                            "prescription_partially_delivered",
                            partially_delivered_alert(details),
                            &mut outcome,
                        )
                        .await;
                }
                PrescriptionStatus::Pending | PrescriptionStatus::Expired => {}
            }
        }

        outcome
    }

    /// Expiring-soon check for a pending prescription. Only creation reaches
    /// it from the event path; the batch scan covers the days after.
    pub async fn check_expiring(&self, details: &PrescriptionDetails, outcome: &mut AlertOutcome) {
        if let Some(alert) = expiring_alert(
            details,
            Utc::now().date_naive(),
            self.settings.prescription_expiry_days,
            Dedup::Within(self.settings.windows.prescription_expiring()),
        ) {
            self.emitter
                .emit_recorded("prescription_expiring", alert, outcome)
                .await;
        }
    }

    async fn delivered_by_name(&self, details: &PrescriptionDetails, outcome: &mut AlertOutcome) -> String {
        let Some(user_id) = details.prescription.delivered_by else {
            return UNKNOWN_USER.to_string();
        };
        match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => user.name,
            Ok(None) => UNKNOWN_USER.to_string(),
            Err(e) => {
                outcome.record(
                    "prescription_completed",
                    AlertSubject::Prescription(details.prescription.id),
                    Err(e),
                );
                UNKNOWN_USER.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    use pharmacy_entity::prescription::{Prescription, PrescriptionItem};

    fn details(status: PrescriptionStatus, expiry_date: NaiveDate, delivered: i32) -> PrescriptionDetails {
        let id = Uuid::new_v4();
        PrescriptionDetails {
            prescription: Prescription {
                id,
                prescription_number: "ORD-20260310-00AA11".to_string(),
                client_name: "Fatou Diallo".to_string(),
                doctor_name: "Dr Kane".to_string(),
                status,
                prescription_date: expiry_date - Duration::days(60),
                expiry_date,
                created_by: Uuid::new_v4(),
                delivered_by: None,
                delivered_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            items: vec![PrescriptionItem {
                id: Uuid::new_v4(),
                prescription_id: id,
                product_id: Uuid::new_v4(),
                quantity_prescribed: 4,
                quantity_delivered: delivered,
                dosage_instructions: None,
            }],
        }
    }

    #[test]
    fn test_created_targets_both_roles() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let alert = created_alert(&details(PrescriptionStatus::Pending, today, 0));
        let audiences: Vec<_> = alert
            .deliveries
            .iter()
            .map(|d| (d.audience.clone(), d.priority))
            .collect();
        assert_eq!(
            audiences,
            vec![
                (Audience::Pharmacists, NotificationPriority::Medium),
                (Audience::Admins, NotificationPriority::Low),
            ]
        );
        assert_eq!(alert.dedup, Dedup::Permanent);
    }

    #[test]
    fn test_partial_delivery_carries_progress() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let alert = partially_delivered_alert(&details(PrescriptionStatus::PartiallyDelivered, today, 1));
        assert_eq!(alert.dedup, Dedup::None);
        match alert.payload {
            AlertPayload::PrescriptionPartiallyDelivered { progress, .. } => assert_eq!(progress, 25.0),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_expiring_only_while_pending_and_close() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let soon = details(PrescriptionStatus::Pending, today + Duration::days(5), 0);
        assert!(expiring_alert(&soon, today, 7, Dedup::None).is_some());

        let later = details(PrescriptionStatus::Pending, today + Duration::days(8), 0);
        assert!(expiring_alert(&later, today, 7, Dedup::None).is_none());

        let partial = details(PrescriptionStatus::PartiallyDelivered, today + Duration::days(2), 1);
        assert!(expiring_alert(&partial, today, 7, Dedup::None).is_none());

        let past = details(PrescriptionStatus::Pending, today - Duration::days(1), 0);
        assert!(expiring_alert(&past, today, 7, Dedup::None).is_none());
    }
}
