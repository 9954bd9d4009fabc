use serde::{Deserialize, Serialize};

/// Object-created notification in the S3 event layout:
/// `{"Records":[{"s3":{"bucket":{"name":..},"object":{"key":..}}}]}`.
///
/// Object keys in notifications are URL-encoded; use [`EventObject::decoded_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectCreatedEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: EventBucket,
    pub object: EventObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBucket {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventObject {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ObjectCreatedEvent {
    /// Notification for a single object. The key is encoded segment by segment
    /// so that `/` separators survive.
    pub fn single(bucket: &str, key: &str) -> Self {
        let encoded_key = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        Self {
            records: vec![EventRecord {
                s3: S3Entity {
                    bucket: EventBucket {
                        name: bucket.to_string(),
                    },
                    object: EventObject {
                        key: encoded_key,
                        size: None,
                    },
                },
            }],
        }
    }
}

impl EventObject {
    /// The object key with `+` and percent escapes decoded. Falls back to the
    /// raw key when the escapes are not valid UTF-8.
    pub fn decoded_key(&self) -> String {
        let spaced = self.key.replace('+', " ");
        match urlencoding::decode(&spaced) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => self.key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_notification_body() {
        let body = r#"{"Records":[{"eventName":"ObjectCreated:Put","s3":{"bucket":{"name":"my-test-bucket"},"object":{"key":"files/abc/my+notes%281%29.txt","size":12}}}]}"#;
        let event: ObjectCreatedEvent = serde_json::from_str(body).unwrap();

        assert_eq!(event.records.len(), 1);
        let s3 = &event.records[0].s3;
        assert_eq!(s3.bucket.name, "my-test-bucket");
        assert_eq!(s3.object.decoded_key(), "files/abc/my notes(1).txt");
    }

    #[test]
    fn test_single_keeps_separators_and_decodes_back() {
        let event = ObjectCreatedEvent::single("bucket", "files/abc/hello world.txt");
        let object = &event.records[0].s3.object;

        assert_eq!(object.key, "files/abc/hello%20world.txt");
        assert_eq!(object.decoded_key(), "files/abc/hello world.txt");
    }

    #[test]
    fn test_missing_records_is_empty() {
        let event: ObjectCreatedEvent = serde_json::from_str("{}").unwrap();
        assert!(event.records.is_empty());
    }
}
