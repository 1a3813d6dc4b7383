//! Default descriptor codec: one JSON document per record.

use tasklane_core::{JobDescriptor, RecordSerializer, Result, TaskLaneError};

/// JSON codec for job records. Unknown fields in stored records are
/// ignored, so older records survive additive schema changes.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl RecordSerializer for JsonSerializer {
    fn serialize(&self, descriptor: &JobDescriptor) -> Result<String> {
        serde_json::to_string(descriptor).map_err(|e| TaskLaneError::Persistence(e.to_string()))
    }

    fn deserialize(&self, data: &str) -> Result<JobDescriptor> {
        serde_json::from_str(data).map_err(|e| TaskLaneError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tasklane_core::{IntervalPolicy, RunLimit};

    use super::*;

    #[test]
    fn test_round_trips_every_field() {
        let mut descriptor = JobDescriptor::new("sync");
        descriptor.lane = "background".into();
        descriptor.tags.insert("nightly".into());
        descriptor.tags.insert("tenant-7".into());
        descriptor.persisted = true;
        descriptor.run_count = 3;
        descriptor.retry_count = 2;
        descriptor.interval = IntervalPolicy::Periodic {
            limit: RunLimit::Limited(5),
            interval: Duration::from_secs(30),
        };
        descriptor.params = serde_json::json!({ "path": "/tmp/x", "depth": 2 });

        let serializer = JsonSerializer;
        let data = serializer.serialize(&descriptor).unwrap();
        let restored = serializer.deserialize(&data).unwrap();
        assert_eq!(restored, descriptor);
    }

    #[test]
    fn test_garbage_is_a_deserialization_error() {
        let err = JsonSerializer.deserialize("{ nope").unwrap_err();
        assert!(matches!(err, TaskLaneError::Deserialization(_)));
    }
}
