//! Positional encoding of access-log records.

use std::sync::Arc;

use super::record::AccessLogRecord;
use super::schema::LogSchema;

/// Converts records to and from the ordered blob array stored by the
/// analytics backend.
///
/// Encoding always produces one string per schema slot. Decoding accepts any
/// prefix of that array so rows written under an older, narrower schema stay
/// readable.
#[derive(Debug, Clone)]
pub struct LogCodec {
    schema: Arc<LogSchema>,
}

impl LogCodec {
    pub fn new(schema: Arc<LogSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &LogSchema {
        &self.schema
    }

    /// Encodes a record into `schema.slot_count()` blobs, absent values as `""`.
    pub fn encode(&self, record: &AccessLogRecord) -> Vec<String> {
        self.schema
            .fields()
            .map(|field| record.get(field).unwrap_or_default().to_string())
            .collect()
    }

    /// Decodes blobs in slot order. Missing trailing slots stay absent and
    /// blobs beyond the schema are ignored.
    pub fn decode<S: AsRef<str>>(&self, blobs: &[S]) -> AccessLogRecord {
        let mut record = AccessLogRecord::new();
        for (field, blob) in self.schema.fields().zip(blobs) {
            record.set(field, Some(blob.as_ref().to_string()));
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access_log::LogField;

    fn codec() -> LogCodec {
        LogCodec::new(Arc::new(LogSchema::v1()))
    }

    fn sample() -> AccessLogRecord {
        AccessLogRecord::new()
            .with(LogField::Slug, "launch")
            .with(LogField::Url, "https://example.com/launch")
            .with(LogField::Ip, "203.0.113.9")
            .with(LogField::Language, "fr-FR")
            .with(LogField::UtmSource, "a,b")
            .with(LogField::UtmContent, "hero")
    }

    #[test]
    fn test_encode_is_full_width() {
        let blobs = codec().encode(&AccessLogRecord::new());
        assert_eq!(blobs.len(), 20);
        assert!(blobs.iter().all(String::is_empty));

        assert_eq!(codec().encode(&sample()).len(), 20);
    }

    #[test]
    fn test_encode_positions_follow_slot_numbers() {
        let blobs = codec().encode(&sample());
        assert_eq!(blobs[0], "launch");
        assert_eq!(blobs[1], "https://example.com/launch");
        assert_eq!(blobs[3], "203.0.113.9");
        // blob10 sits after blob9, not after blob1
        assert_eq!(blobs[9], "fr-FR");
        assert_eq!(blobs[15], "a,b");
        assert_eq!(blobs[19], "hero");
        assert_eq!(blobs[2], "");
    }

    #[test]
    fn test_round_trip_preserves_defined_and_absent_fields() {
        let codec = codec();
        let record = sample();
        let decoded = codec.decode(&codec.encode(&record));

        assert_eq!(decoded, record);
        assert_eq!(decoded.get(LogField::Country), None);
    }

    #[test]
    fn test_decode_short_input_leaves_trailing_fields_absent() {
        let decoded = codec().decode(&["s", "https://example.com", "curl/8.4.0"]);

        assert_eq!(decoded.get(LogField::Slug), Some("s"));
        assert_eq!(decoded.get(LogField::Ua), Some("curl/8.4.0"));
        assert_eq!(decoded.get(LogField::Ip), None);
        assert_eq!(decoded.get(LogField::UtmContent), None);
    }

    #[test]
    fn test_decode_empty_input() {
        let empty: [&str; 0] = [];
        assert!(codec().decode(&empty).is_empty());
    }

    #[test]
    fn test_decode_ignores_extra_blobs() {
        let mut blobs = codec().encode(&sample());
        blobs.push("from-a-newer-schema".to_string());

        assert_eq!(codec().decode(&blobs), sample());
    }

    #[test]
    fn test_alternate_schema() {
        let schema = LogSchema::new(
            7,
            [
                ("blob2", LogField::Country),
                ("blob1", LogField::Ip),
                ("blob3", LogField::Slug),
            ],
        )
        .unwrap();
        let codec = LogCodec::new(Arc::new(schema));

        let record = AccessLogRecord::new()
            .with(LogField::Slug, "x")
            .with(LogField::Ip, "10.0.0.1")
            .with(LogField::Browser, "Firefox");

        let blobs = codec.encode(&record);
        assert_eq!(blobs, vec!["10.0.0.1", "", "x"]);

        let decoded = codec.decode(&blobs);
        assert_eq!(decoded.get(LogField::Ip), Some("10.0.0.1"));
        // not part of this schema
        assert_eq!(decoded.get(LogField::Browser), None);
    }

    #[test]
    fn test_twelve_slot_schema_keeps_numeric_order() {
        let declared: Vec<(String, LogField)> = LogField::ALL[..12]
            .iter()
            .enumerate()
            .map(|(i, field)| (format!("blob{}", i + 1), *field))
            .rev()
            .collect();
        let schema =
            LogSchema::new(1, declared.iter().map(|(s, f)| (s.as_str(), *f))).unwrap();
        let codec = LogCodec::new(Arc::new(schema));

        let record = AccessLogRecord::new()
            .with(LogField::Url, "second")
            .with(LogField::Language, "tenth");
        let blobs = codec.encode(&record);

        assert_eq!(blobs[1], "second");
        assert_eq!(blobs[9], "tenth");
    }
}
