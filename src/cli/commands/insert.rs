//! Insert command implementation
//!
//! Reads a JSON document, or a JSON array of documents, from a file and
//! inserts it into a collection of a storage plugin. Runs until done, until
//! `--timeout-ms` passes, or until the process receives a shutdown signal.

use crate::adapters::mongodb::MongoStore;
use crate::core::ServiceHost;
use crate::domain::context::OpContext;
use crate::domain::errors::SvckitError;
use crate::log_error_with_context;
use clap::Args;
use mongodb::bson::{self, Document};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the insert command
#[derive(Args, Debug)]
pub struct InsertArgs {
    /// Collection to insert into
    #[arg(long)]
    pub collection: String,

    /// JSON file holding one document or an array of documents
    #[arg(short, long)]
    pub file: PathBuf,

    /// Storage plugin to use
    #[arg(long, default_value = "mongodb")]
    pub plugin: String,

    /// Create an index on these fields first (comma-separated, `-field` for descending)
    #[arg(long, value_name = "FIELDS")]
    pub index: Option<String>,

    /// Make the index created with --index unique
    #[arg(long, requires = "index")]
    pub unique: bool,

    /// Give up after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Documents read from the input file
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    One(Document),
    Many(Vec<Document>),
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Payload::One(_) => 1,
            Payload::Many(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InsertArgs {
    /// Execute the insert command
    pub async fn execute(
        &self,
        host: &mut ServiceHost,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(
            plugin = %self.plugin,
            collection = %self.collection,
            file = %self.file.display(),
            "Starting insert command"
        );

        let payload = match std::fs::read_to_string(&self.file)
            .map_err(SvckitError::from)
            .and_then(|text| parse_payload(&text))
        {
            Ok(payload) => payload,
            Err(e) => {
                println!("❌ Failed to read {}: {e}", self.file.display());
                return Ok(4);
            }
        };
        let index_keys = match self.index.as_deref().map(parse_index_keys).transpose() {
            Ok(keys) => keys,
            Err(e) => {
                println!("❌ {e}");
                return Ok(4);
            }
        };

        if let Err(e) = host.activate_all().await {
            log_error_with_context!(&e, "Plugin activation failed");
            println!("❌ Activation failed: {e}");
            host.stop_all().await?;
            return Ok(4);
        }

        let mut ctx = OpContext::background().with_cancel(shutdown_signal);
        if let Some(ms) = self.timeout_ms {
            ctx = ctx.with_timeout(Duration::from_millis(ms));
        }

        let exit_code = self.run(host, &ctx, index_keys, payload).await;
        host.stop_all().await?;
        Ok(exit_code)
    }

    async fn run(
        &self,
        host: &ServiceHost,
        ctx: &OpContext,
        index_keys: Option<Document>,
        payload: Payload,
    ) -> i32 {
        let Some(store) = host.plugin::<MongoStore>(&self.plugin) else {
            println!("❌ No storage plugin named {:?}", self.plugin);
            return 4;
        };
        let Some(handle) = store.handle() else {
            println!("❌ Storage plugin {:?} is {}", self.plugin, store.state());
            return 4;
        };

        if let Some(keys) = index_keys {
            if !handle.create_index(&self.collection, keys, self.unique).await {
                println!("❌ Failed to create index on {}", self.collection);
                return 4;
            }
        }

        let count = payload.len();
        let result = match &payload {
            Payload::One(doc) => handle.insert_one(ctx, &self.collection, doc).await,
            Payload::Many(docs) => handle.insert_many(ctx, &self.collection, docs.as_slice()).await,
        };

        match result {
            Ok(()) => {
                println!(
                    "✅ Inserted {count} document(s) into {}.{}",
                    handle.database_name(),
                    self.collection
                );
                0
            }
            Err(SvckitError::Cancelled) => {
                println!("⚠️  Insert cancelled by shutdown signal");
                4
            }
            Err(e) => {
                println!("❌ Insert failed: {e}");
                4
            }
        }
    }
}

/// Parses the input file into documents
///
/// # Errors
///
/// Returns [`SvckitError::Serialization`] for invalid JSON or for values
/// that are not objects.
pub fn parse_payload(text: &str) -> Result<Payload, SvckitError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .map(to_document)
            .collect::<Result<Vec<_>, _>>()
            .map(Payload::Many),
        other => to_document(&other).map(Payload::One),
    }
}

fn to_document(value: &serde_json::Value) -> Result<Document, SvckitError> {
    if !value.is_object() {
        return Err(SvckitError::Serialization(format!(
            "expected a JSON object, found {value}"
        )));
    }
    Ok(bson::to_document(value)?)
}

/// Parses `a,-b` into the index key document `{ a: 1, b: -1 }`
pub fn parse_index_keys(fields: &str) -> Result<Document, SvckitError> {
    let mut keys = Document::new();
    for field in fields.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        let (name, order) = match field.strip_prefix('-') {
            Some(name) => (name, -1),
            None => (field.strip_prefix('+').unwrap_or(field), 1),
        };
        if name.is_empty() {
            return Err(SvckitError::Serialization(format!(
                "invalid index field {field:?}"
            )));
        }
        keys.insert(name, order);
    }
    if keys.is_empty() {
        return Err(SvckitError::Serialization(
            "index needs at least one field".to_string(),
        ));
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use test_case::test_case;

    #[test]
    fn test_parse_payload_single() {
        let payload = parse_payload(r#"{"sku": "A-1", "qty": 3}"#).unwrap();
        assert_eq!(payload, Payload::One(doc! { "sku": "A-1", "qty": 3_i64 }));
    }

    #[test]
    fn test_parse_payload_array() {
        let payload = parse_payload(r#"[{"sku": "A-1"}, {"sku": "B-2"}]"#).unwrap();
        assert_eq!(payload.len(), 2);
    }

    #[test]
    fn test_parse_payload_empty_array() {
        let payload = parse_payload("[]").unwrap();
        assert!(payload.is_empty());
    }

    #[test_case("42" ; "number")]
    #[test_case("[1, 2]" ; "array of numbers")]
    #[test_case("{not json" ; "malformed")]
    fn test_parse_payload_rejects(input: &str) {
        assert!(matches!(
            parse_payload(input),
            Err(SvckitError::Serialization(_))
        ));
    }

    #[test]
    fn test_parse_index_keys() {
        let keys = parse_index_keys("email, -created_at").unwrap();
        assert_eq!(keys, doc! { "email": 1, "created_at": -1 });
    }

    #[test_case("" ; "empty")]
    #[test_case("-" ; "bare minus")]
    fn test_parse_index_keys_rejects(keys: &str) {
        assert!(parse_index_keys(keys).is_err());
    }

    #[tokio::test]
    async fn test_insert_with_disabled_store() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"sku": "A-1"}"#).unwrap();
        file.flush().unwrap();

        let mut host = ServiceHost::new("svckit");
        host.add_plugin(MongoStore::new("mongodb", "db").unwrap())
            .unwrap();
        host.init_flags().unwrap();

        let args = InsertArgs {
            collection: "orders".to_string(),
            file: file.path().to_path_buf(),
            plugin: "mongodb".to_string(),
            index: None,
            unique: false,
            timeout_ms: None,
        };
        let (_tx, rx) = watch::channel(false);
        assert_eq!(args.execute(&mut host, rx).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_insert_missing_file() {
        let mut host = ServiceHost::new("svckit");
        let args = InsertArgs {
            collection: "orders".to_string(),
            file: PathBuf::from("/nonexistent/svckit-input.json"),
            plugin: "mongodb".to_string(),
            index: None,
            unique: false,
            timeout_ms: None,
        };
        let (_tx, rx) = watch::channel(false);
        assert_eq!(args.execute(&mut host, rx).await.unwrap(), 4);
    }
}
