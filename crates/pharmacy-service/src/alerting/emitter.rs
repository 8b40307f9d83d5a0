//! Deduplicated fan-out of alerts into the notification store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use pharmacy_core::result::AppResult;
use pharmacy_database::store::NotificationStore;
use pharmacy_entity::notification::{
    AlertPayload, AlertSubject, DuplicateQuery, NewNotification, NotificationPriority,
};
use pharmacy_entity::user::User;

use super::outcome::AlertOutcome;
use super::recipients::{Audience, RecipientResolver, select_recipients};

/// Deduplication rule checked once per alert, before any row is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dedup {
    /// Always emit; every occurrence is news.
    None,
    /// Once ever per subject and alert key.
    Permanent,
    /// Once per subject and alert key within the window.
    Within(Duration),
    /// Once per subject within the window, whatever the alert key.
    SubjectWithin(Duration),
}

impl Dedup {
    /// Existence query guarding `payload`, or `None` when nothing is deduplicated.
    pub fn query(&self, payload: &AlertPayload, now: DateTime<Utc>) -> Option<DuplicateQuery> {
        let (alert_key, since) = match *self {
            Self::None => return None,
            Self::Permanent => (Some(payload.alert_key()), None),
            Self::Within(window) => (Some(payload.alert_key()), Some(now - window)),
            Self::SubjectWithin(window) => (None, Some(now - window)),
        };
        Some(DuplicateQuery {
            kind: payload.notification_type(),
            subject: payload.subject(),
            alert_key,
            since,
        })
    }
}

/// One audience slice of an alert with its own wording and priority.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub audience: Audience,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Delivery {
    pub fn new(
        audience: Audience,
        priority: NotificationPriority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            audience,
            priority,
            title: title.into(),
            message: message.into(),
            expires_at: None,
        }
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }
}

/// A detected alert condition: one payload, one dedup rule, one or more
/// audience slices sharing them.
#[derive(Debug, Clone)]
pub struct Alert {
    pub payload: AlertPayload,
    pub dedup: Dedup,
    pub deliveries: Vec<Delivery>,
}

impl Alert {
    pub fn new(payload: AlertPayload, dedup: Dedup) -> Self {
        Self {
            payload,
            dedup,
            deliveries: Vec::new(),
        }
    }

    pub fn deliver(mut self, delivery: Delivery) -> Self {
        self.deliveries.push(delivery);
        self
    }

    pub fn subject(&self) -> AlertSubject {
        self.payload.subject()
    }
}

/// What happened to one emitted alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    /// Rows written, one per recipient. Zero when the audience is empty.
    Created(usize),
    /// An earlier alert covers this one.
    Suppressed,
    /// The condition does not hold.
    Skipped,
}

/// Builds the deep link of a subject's detail page.
#[derive(Debug, Clone, Default)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn for_subject(&self, subject: AlertSubject) -> Option<String> {
        subject
            .detail_path()
            .map(|path| format!("{}{}", self.base_url, path))
    }
}

/// Writes alerts to the notification store: dedup check, recipient
/// resolution, then one notification per recipient.
#[derive(Debug, Clone)]
pub struct AlertEmitter {
    store: Arc<dyn NotificationStore>,
    recipients: RecipientResolver,
    links: LinkBuilder,
}

impl AlertEmitter {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        recipients: RecipientResolver,
        links: LinkBuilder,
    ) -> Self {
        Self {
            store,
            recipients,
            links,
        }
    }

    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    /// Whether an earlier alert suppresses this one.
    pub async fn is_duplicate(&self, alert: &Alert, now: DateTime<Utc>) -> AppResult<bool> {
        match alert.dedup.query(&alert.payload, now) {
            Some(query) => self.store.exists(&query).await,
            None => Ok(false),
        }
    }

    /// Emit `alert` unless deduplicated.
    ///
    /// The first store error aborts the fan-out and is returned; rows already
    /// written stay.
    pub async fn emit(&self, alert: Alert) -> AppResult<Emission> {
        let now = Utc::now();
        if self.is_duplicate(&alert, now).await? {
            debug!(
                subject = ?alert.subject(),
                alert_key = alert.payload.alert_key(),
                "Alert suppressed by earlier notification"
            );
            return Ok(Emission::Suppressed);
        }

        let directory: Vec<User> = if alert.deliveries.iter().any(|d| d.audience.needs_directory()) {
            self.recipients.directory().await?
        } else {
            Vec::new()
        };

        let kind = alert.payload.notification_type();
        let action_url = self.links.for_subject(alert.subject());
        let mut created = 0;

        for delivery in &alert.deliveries {
            for user_id in select_recipients(&delivery.audience, &directory) {
                self.store
                    .create(NewNotification {
                        user_id,
                        kind,
                        title: delivery.title.clone(),
                        message: delivery.message.clone(),
                        data: alert.payload.clone(),
                        priority: delivery.priority,
                        action_url: action_url.clone(),
                        expires_at: delivery.expires_at,
                    })
                    .await?;
                created += 1;
            }
        }

        debug!(
            subject = ?alert.subject(),
            alert_key = alert.payload.alert_key(),
            created,
            "Alert emitted"
        );
        Ok(Emission::Created(created))
    }

    /// Emit `alert` and fold the result into `outcome` under `check`.
    pub async fn emit_recorded(&self, check: &'static str, alert: Alert, outcome: &mut AlertOutcome) {
        let subject = alert.subject();
        let result = self.emit(alert).await;
        if let Ok(Emission::Created(recipients)) = result {
            if recipients > 0 {
                info!(check, subject = ?subject, recipients, "Alert notifications created");
            }
        }
        outcome.record(check, subject, result);
    }
}
