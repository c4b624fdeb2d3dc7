pub mod appeals;
pub mod date_cards;
pub mod expiry;
pub mod matches;
pub mod notifier;
pub mod reconciler;
pub mod reveal;

use chrono_tz::Tz;
use std::sync::Arc;

use crate::db::DateCardStore;
use notifier::Notifier;

pub use appeals::AppealOutcome;
pub use matches::match_id_for;
pub use notifier::{
    LogNotifier, MemoryNotifier, NotificationInbox, PgNotifier, WebhookNotifier, notify_best_effort,
};
pub use reconciler::reconcile;
pub use reveal::{RevealOutcome, RevealSummary};

/// Entry point for every date card operation.
///
/// All mutations go through the store's versioned update, and every
/// notification goes through `notify_best_effort`.
#[derive(Clone)]
pub struct DateCardService {
    store: Arc<dyn DateCardStore>,
    notifier: Arc<dyn Notifier>,
    default_zone: Tz,
}

impl DateCardService {
    pub fn new(store: Arc<dyn DateCardStore>, notifier: Arc<dyn Notifier>, default_zone: Tz) -> Self {
        Self {
            store,
            notifier,
            default_zone,
        }
    }

    pub fn store(&self) -> &dyn DateCardStore {
        self.store.as_ref()
    }

    async fn notify(&self, user_id: &str, payload: crate::models::NotificationPayload) {
        notify_best_effort(self.notifier.as_ref(), user_id, payload).await;
    }
}
