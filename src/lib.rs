//! norimdb - an embeddable document store
//!
//! Documents live in named collections inside one directory. Each database
//! directory holds exactly two files: `sys.ndb`, the persistent index, and
//! `data.ndb`, an append-only log of encoded documents.
//!
//! ```no_run
//! use norimdb::{Database, Filter, SortSpec};
//! use serde_json::json;
//!
//! # fn main() -> norimdb::Result<()> {
//! let db = Database::open("/var/lib/app")?;
//! let users = db.get_collection("users")?;
//! let id = users.add(json!({"name": "b", "age": 66}))?;
//! users.update(&id, json!({"age": 67}))?;
//!
//! let older = Filter::from_json(json!({"age": {"$gt": 30}}))?;
//! let found = users.find(&older, Some(&SortSpec::desc("age")))?;
//! # let _ = found;
//! db.close();
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod document;
pub mod errors;
pub mod index;
pub mod observability;
pub mod query;
pub mod storage;

pub use db::{Collection, Database, DbConfig};
pub use document::{DocId, Document, DocumentCodec, Fields, IntoDocument, JsonCodec, Value};
pub use errors::{DbError, ErrorCode, Result};
pub use query::{Filter, SortSpec};
pub use storage::SyncMode;
