use migwatch_core::model::{lenient, lenient_seq, ObjectMeta};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventList {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub items: Vec<Event>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: ObjectMeta,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub event_type: String,
    #[serde(default, deserialize_with = "lenient")]
    pub reason: String,
    #[serde(default, deserialize_with = "lenient")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient")]
    pub involved_object: InvolvedObject,
    #[serde(default, deserialize_with = "lenient")]
    pub event_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub first_timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvolvedObject {
    #[serde(default, deserialize_with = "lenient")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
}

impl Event {
    /// The most specific timestamp the event carries.
    pub fn timestamp(&self) -> Option<&str> {
        [&self.event_time, &self.last_timestamp, &self.first_timestamp]
            .into_iter()
            .filter_map(|ts| ts.as_deref())
            .chain(std::iter::once(self.metadata.creation_timestamp.as_str()))
            .find(|ts| !ts.is_empty())
    }

    pub fn object(&self) -> String {
        format!("{}/{}", self.involved_object.kind, self.involved_object.name)
    }
}

/// Newest first, at most `limit`. Events without a timestamp sort last.
pub fn recent(events: &[Event], limit: usize) -> Vec<&Event> {
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    sorted.truncate(limit);
    sorted
}
