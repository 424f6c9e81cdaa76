//! AlertDispatcher: raises the completion alert for a finished transfer.
//!
//! The dispatcher builds the alert; a `NotificationSink` presents it. Sinks
//! key alerts by correlation id, so posting the same id twice replaces the
//! first alert instead of stacking a second one.

use crate::core::config::{ALERT_CHANNEL_DESCRIPTION, ALERT_CHANNEL_ID, ALERT_CHANNEL_NAME};
use crate::core::transfer::NotificationPayload;
use tracing::{debug, info};

/// Identity of the alert channel, registered once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertChannel {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl Default for AlertChannel {
    fn default() -> Self {
        Self {
            id: ALERT_CHANNEL_ID.to_string(),
            name: ALERT_CHANNEL_NAME.to_string(),
            description: ALERT_CHANNEL_DESCRIPTION.to_string(),
        }
    }
}

/// What happens when the user activates an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertAction {
    OpenResult(NotificationPayload),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub text: String,
    pub action_label: String,
    pub action: AlertAction,
}

/// Alert texts, taken from the label settings.
#[derive(Debug, Clone)]
pub struct AlertTexts {
    pub title: String,
    pub success: String,
    pub failure: String,
    pub action: String,
}

/// Presentation side of alerts.
pub trait NotificationSink {
    fn register_channel(&mut self, channel: &AlertChannel);

    /// Show `alert` under `id`, replacing an alert with the same id.
    fn post(&mut self, id: i64, alert: Alert);

    fn cancel(&mut self, id: i64);
}

pub struct AlertDispatcher<N: NotificationSink> {
    sink: N,
    channel: AlertChannel,
    texts: AlertTexts,
    channel_registered: bool,
}

impl<N: NotificationSink> AlertDispatcher<N> {
    pub fn new(sink: N, texts: AlertTexts) -> Self {
        Self {
            sink,
            channel: AlertChannel::default(),
            texts,
            channel_registered: false,
        }
    }

    /// Raise (or refresh) the alert for `correlation_id`.
    pub fn notify(&mut self, correlation_id: i64, display_name: &str, succeeded: bool) {
        if !self.channel_registered {
            self.sink.register_channel(&self.channel);
            self.channel_registered = true;
            debug!(event = "alert_channel_registered", channel = %self.channel.id);
        }

        let text = if succeeded {
            &self.texts.success
        } else {
            &self.texts.failure
        };
        let alert = Alert {
            title: self.texts.title.clone(),
            text: text.clone(),
            action_label: self.texts.action.clone(),
            action: AlertAction::OpenResult(NotificationPayload {
                display_name: display_name.to_string(),
                succeeded,
                correlation_id,
            }),
        };

        info!(
            event = "alert_posted",
            id = correlation_id,
            name = %display_name,
            succeeded,
        );
        self.sink.post(correlation_id, alert);
    }

    pub fn cancel(&mut self, correlation_id: i64) {
        self.sink.cancel(correlation_id);
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut N {
        &mut self.sink
    }
}

#[cfg(test)]
pub mod testing {
    //! Recording sink shared by dispatcher and coordinator tests.

    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    pub struct RecordingSink {
        pub channels: Vec<AlertChannel>,
        pub posts: Vec<(i64, Alert)>,
        pub visible: BTreeMap<i64, Alert>,
        pub cancelled: Vec<i64>,
    }

    impl NotificationSink for RecordingSink {
        fn register_channel(&mut self, channel: &AlertChannel) {
            self.channels.push(channel.clone());
        }

        fn post(&mut self, id: i64, alert: Alert) {
            self.posts.push((id, alert.clone()));
            self.visible.insert(id, alert);
        }

        fn cancel(&mut self, id: i64) {
            self.cancelled.push(id);
            self.visible.remove(&id);
        }
    }

    pub fn texts() -> AlertTexts {
        AlertTexts {
            title: "Download finished".to_string(),
            success: "Your download succeeded".to_string(),
            failure: "Your download failed".to_string(),
            action: "Check the status".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{RecordingSink, texts};
    use super::*;

    #[test]
    fn channel_is_registered_once() {
        let mut dispatcher = AlertDispatcher::new(RecordingSink::default(), texts());
        dispatcher.notify(1, "Glide", true);
        dispatcher.notify(2, "Retrofit", false);

        assert_eq!(dispatcher.sink().channels, vec![AlertChannel::default()]);
    }

    #[test]
    fn alert_carries_result_payload() {
        let mut dispatcher = AlertDispatcher::new(RecordingSink::default(), texts());
        dispatcher.notify(4, "Retrofit", false);

        let alert = &dispatcher.sink().visible[&4];
        assert_eq!(alert.text, "Your download failed");
        assert_eq!(alert.action_label, "Check the status");
        assert_eq!(
            alert.action,
            AlertAction::OpenResult(NotificationPayload {
                display_name: "Retrofit".to_string(),
                succeeded: false,
                correlation_id: 4,
            })
        );
    }

    #[test]
    fn renotify_same_id_updates_instead_of_duplicating() {
        let mut dispatcher = AlertDispatcher::new(RecordingSink::default(), texts());
        dispatcher.notify(3, "Glide", false);
        dispatcher.notify(3, "Glide", true);

        let sink = dispatcher.sink();
        assert_eq!(sink.visible.len(), 1);
        assert_eq!(sink.visible[&3].text, "Your download succeeded");
    }

    #[test]
    fn cancel_removes_alert() {
        let mut dispatcher = AlertDispatcher::new(RecordingSink::default(), texts());
        dispatcher.notify(5, "Glide", true);
        dispatcher.cancel(5);

        assert!(dispatcher.sink().visible.is_empty());
        assert_eq!(dispatcher.sink().cancelled, vec![5]);
    }
}
