//! Length-prefixed document stream decoding
//!
//! A BSON export (`mongodump` output) is a plain concatenation of documents,
//! each starting with its own little-endian 32-bit byte length. The reader
//! walks the buffer one document at a time through a [`DocumentDecoder`] and
//! stops at the first failure, keeping whatever was decoded before it.

use crate::error::DecodeError;
use crate::types::{Document, Value};
use bson::Bson;
use chrono::{TimeZone, Utc};
use tracing::{debug, warn};

/// Smallest well-formed BSON document: length prefix plus terminating NUL
const MIN_DOCUMENT_LEN: usize = 5;

/// Decodes one document starting at a byte offset
pub trait DocumentDecoder {
    /// Returns the decoded document and the number of bytes it occupies
    fn decode_one(&self, buffer: &[u8], offset: usize) -> Result<(Document, usize), DecodeError>;
}

/// Decoder backed by the `bson` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct BsonDecoder;

impl DocumentDecoder for BsonDecoder {
    fn decode_one(&self, buffer: &[u8], offset: usize) -> Result<(Document, usize), DecodeError> {
        let len = declared_length(buffer, offset)?;
        let bytes = &buffer[offset..offset + len];
        let raw = bson::Document::from_reader(bytes)
            .map_err(|e| DecodeError::new(offset, e.to_string()))?;
        Ok((convert_document(raw), len))
    }
}

/// Read and bounds-check the length prefix of the document at `offset`
fn declared_length(buffer: &[u8], offset: usize) -> Result<usize, DecodeError> {
    let Some(prefix) = buffer.get(offset..offset + 4) else {
        return Err(DecodeError::new(
            offset,
            format!("truncated length prefix ({} bytes left)", buffer.len().saturating_sub(offset)),
        ));
    };
    let declared = i32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
    let len = usize::try_from(declared)
        .map_err(|_| DecodeError::new(offset, format!("negative document length {}", declared)))?;

    if len < MIN_DOCUMENT_LEN {
        return Err(DecodeError::new(offset, format!("document length {} is too small", len)));
    }
    if offset + len > buffer.len() {
        return Err(DecodeError::new(
            offset,
            format!(
                "document length {} runs past end of input ({} bytes left)",
                len,
                buffer.len() - offset
            ),
        ));
    }
    Ok(len)
}

/// Documents decoded from one buffer
#[derive(Debug, Default)]
pub struct DocumentStream {
    /// Documents in input order
    pub documents: Vec<Document>,

    /// The failure that stopped the walk early, if any
    pub truncated: Option<DecodeError>,
}

impl DocumentStream {
    pub fn is_complete(&self) -> bool {
        self.truncated.is_none()
    }
}

/// Decode every document in `buffer`, stopping at the first failure
pub fn read_all<D: DocumentDecoder + ?Sized>(buffer: &[u8], decoder: &D) -> DocumentStream {
    let mut stream = DocumentStream::default();
    let mut offset = 0;

    while offset < buffer.len() {
        match decoder.decode_one(buffer, offset) {
            // A zero-length report would never make progress
            Ok((_, 0)) => {
                warn!(offset, "decoder consumed zero bytes, stopping");
                stream.truncated = Some(DecodeError::new(offset, "decoder consumed zero bytes"));
                break;
            }
            Ok((doc, len)) => {
                stream.documents.push(doc);
                offset += len;
            }
            Err(err) => {
                warn!(
                    offset = err.offset,
                    decoded = stream.documents.len(),
                    "stopping at undecodable document: {}",
                    err.reason
                );
                stream.truncated = Some(err);
                break;
            }
        }
    }

    debug!(documents = stream.documents.len(), bytes = offset, "document stream read");
    stream
}

/// Convert a `bson` document into the crate's value tree
pub fn convert_document(doc: bson::Document) -> Document {
    doc.into_iter()
        .map(|(key, value)| (key, convert_bson(value)))
        .collect()
}

fn convert_bson(value: Bson) -> Value {
    match value {
        Bson::Double(f) => Value::Float(f),
        Bson::Int32(n) => Value::Int(n.into()),
        Bson::Int64(n) => Value::Int(n),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::String(s) | Bson::Symbol(s) | Bson::JavaScriptCode(s) => Value::Text(s),
        Bson::JavaScriptCodeWithScope(code) => Value::Text(code.code),
        Bson::ObjectId(oid) => Value::Text(oid.to_hex()),
        Bson::Decimal128(d) => Value::Text(d.to_string()),
        Bson::RegularExpression(re) => Value::Text(format!("/{}/{}", re.pattern, re.options)),
        Bson::Binary(bin) => Value::Text(hex::encode(&bin.bytes)),
        Bson::DateTime(dt) => match Utc.timestamp_millis_opt(dt.timestamp_millis()).single() {
            Some(instant) => Value::Instant(instant),
            None => Value::Null,
        },
        Bson::Timestamp(ts) => match Utc.timestamp_opt(i64::from(ts.time), 0).single() {
            Some(instant) => Value::Instant(instant),
            None => Value::Null,
        },
        Bson::Array(items) => Value::Array(items.into_iter().map(convert_bson).collect()),
        Bson::Document(doc) => Value::Document(convert_document(doc)),
        Bson::Null | Bson::Undefined | Bson::MaxKey | Bson::MinKey | Bson::DbPointer(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use std::sync::{Arc, Mutex};

    fn encode(docs: &[bson::Document]) -> Vec<u8> {
        let mut buffer = Vec::new();
        for d in docs {
            d.to_writer(&mut buffer).unwrap();
        }
        buffer
    }

    /// Hands out fixed-size empty documents until `fail_at`
    struct FixedDecoder {
        record_len: usize,
        fail_at: usize,
    }

    impl DocumentDecoder for FixedDecoder {
        fn decode_one(&self, _buffer: &[u8], offset: usize) -> Result<(Document, usize), DecodeError> {
            if offset >= self.fail_at {
                return Err(DecodeError::new(offset, "corrupt record"));
            }
            let mut doc = Document::new();
            doc.insert("offset".to_string(), Value::Int(offset as i64));
            Ok((doc, self.record_len))
        }
    }

    #[test]
    fn test_reads_all_documents_in_order() {
        let buffer = encode(&[
            doc! {"_id": 1, "name": "Alice"},
            doc! {"_id": 2, "name": "Bob"},
        ]);

        let stream = read_all(&buffer, &BsonDecoder);

        assert!(stream.is_complete());
        assert_eq!(stream.documents.len(), 2);
        assert_eq!(stream.documents[0]["name"], Value::from("Alice"));
        assert_eq!(stream.documents[1]["_id"], Value::Int(2));
    }

    #[test]
    fn test_empty_buffer_yields_nothing() {
        let stream = read_all(&[], &BsonDecoder);
        assert!(stream.is_complete());
        assert!(stream.documents.is_empty());
    }

    #[test]
    fn test_failure_keeps_earlier_documents() {
        let buffer = vec![0u8; 200];
        let decoder = FixedDecoder { record_len: 50, fail_at: 100 };

        let stream = read_all(&buffer, &decoder);

        assert_eq!(stream.documents.len(), 2);
        let err = stream.truncated.unwrap();
        assert_eq!(err.offset, 100);
        assert!(err.to_string().contains("offset 100"));
    }

    /// Collects formatted log output for assertions
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failure_is_logged_with_offset() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let buffer = vec![0u8; 200];
        let decoder = FixedDecoder { record_len: 50, fail_at: 100 };
        let stream = tracing::subscriber::with_default(subscriber, || read_all(&buffer, &decoder));

        assert_eq!(stream.documents.len(), 2);
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|l| l.contains("WARN"))
            .expect("a warning for the failed document");
        assert!(line.contains("offset=100"));
        assert!(line.contains("corrupt record"));
    }

    #[test]
    fn test_binary_converts_to_hex() {
        let raw = doc! {
            "blob": bson::Binary {
                subtype: bson::spec::BinarySubtype::Generic,
                bytes: vec![0x00, 0xab, 0x10],
            },
        };

        let converted = convert_document(raw);

        assert_eq!(converted["blob"], Value::from("00ab10"));
    }

    #[test]
    fn test_trailing_garbage_truncates() {
        let mut buffer = encode(&[doc! {"a": 1}]);
        let first_len = buffer.len();
        buffer.extend_from_slice(&[0xff, 0xff]);

        let stream = read_all(&buffer, &BsonDecoder);

        assert_eq!(stream.documents.len(), 1);
        assert_eq!(stream.truncated.unwrap().offset, first_len);
    }

    #[test]
    fn test_length_past_end_is_rejected() {
        let mut buffer = encode(&[doc! {"a": 1}]);
        buffer.truncate(buffer.len() - 1);

        let err = BsonDecoder.decode_one(&buffer, 0).unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(err.reason.contains("past end"));
    }

    #[test]
    fn test_bson_types_convert() {
        let oid = bson::oid::ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let raw = doc! {
            "oid": oid,
            "when": bson::DateTime::from_millis(1_700_000_000_123),
            "ratio": 0.5,
            "big": 9_000_000_000i64,
            "nothing": bson::Bson::Null,
            "nested": {"tags": ["a", "b"]},
        };

        let converted = convert_document(raw);

        assert_eq!(converted["oid"], Value::from("507f1f77bcf86cd799439011"));
        match &converted["when"] {
            Value::Instant(t) => assert_eq!(t.timestamp_millis(), 1_700_000_000_123),
            other => panic!("expected instant, got {:?}", other),
        }
        assert_eq!(converted["ratio"], Value::Float(0.5));
        assert_eq!(converted["big"], Value::Int(9_000_000_000));
        assert!(converted["nothing"].is_null());
        let nested = converted["nested"].as_document().unwrap();
        assert_eq!(
            nested["tags"],
            Value::Array(vec![Value::from("a"), Value::from("b")])
        );
        let keys: Vec<&str> = converted.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["oid", "when", "ratio", "big", "nothing", "nested"]);
    }
}
