//! Persistent key-value storage over the browser's IndexedDB.
//!
//! One versioned database with four fixed partitions, each keyed by a
//! store-assigned auto-incrementing `id` field. Records cross the boundary as
//! JSON via serde, so any `Serialize`/`Deserialize` type with an
//! `Option<u32>` id works. `Store::open` is idempotent and cheap once the
//! handle is cached, so callers open before every operation.

use std::cell::RefCell;
use std::fmt;

use js_sys::{Object, Promise, Reflect};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    console, Event, IdbDatabase, IdbObjectStore, IdbOpenDbRequest, IdbRequest,
    IdbTransactionMode, IdbVersionChangeEvent,
};

const DB_NAME: &str = "webtop_db";
const DB_VERSION: u32 = 1;

/// The fixed partitions of the database. Unknown partitions cannot be named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Users,
    Notes,
    Scripts,
    BrowserData,
}

impl Partition {
    pub const ALL: [Partition; 4] = [
        Partition::Users,
        Partition::Notes,
        Partition::Scripts,
        Partition::BrowserData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Users => "users",
            Partition::Notes => "notepad_notes",
            Partition::Scripts => "python_scripts",
            Partition::BrowserData => "browser_data",
        }
    }
}

#[derive(Debug, Clone)]
pub enum StoreError {
    /// IndexedDB is missing from the environment (private mode, old browser).
    Unavailable,
    /// The underlying store rejected the operation (quota, blocked upgrade,
    /// corruption); carries whatever text the backend gave us.
    Backend(String),
    /// A record failed to encode or decode.
    Codec(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable => write!(f, "storage is not available"),
            StoreError::Backend(msg) => write!(f, "storage error: {}", msg),
            StoreError::Codec(msg) => write!(f, "record codec error: {}", msg),
        }
    }
}

impl From<JsValue> for StoreError {
    fn from(value: JsValue) -> Self {
        let msg = value
            .as_string()
            .or_else(|| {
                value
                    .dyn_ref::<web_sys::DomException>()
                    .map(|e| e.message())
            })
            .unwrap_or_else(|| format!("{:?}", value));
        StoreError::Backend(msg)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}

thread_local! {
    static DB_HANDLE: RefCell<Option<IdbDatabase>> = const { RefCell::new(None) };
}

/// Handle to the open database. Clones share the same connection.
#[derive(Clone)]
pub struct Store {
    db: IdbDatabase,
}

impl Store {
    /// Open (creating on first use) the database with its four partitions.
    /// Safe to call repeatedly; concurrent calls reuse the cached connection
    /// and the upgrade path never creates duplicate partitions.
    pub async fn open() -> Result<Store, StoreError> {
        if let Some(db) = DB_HANDLE.with(|h| h.borrow().clone()) {
            return Ok(Store { db });
        }

        let window = web_sys::window().ok_or(StoreError::Unavailable)?;
        let factory = window
            .indexed_db()
            .map_err(StoreError::from)?
            .ok_or(StoreError::Unavailable)?;
        let request: IdbOpenDbRequest = factory
            .open_with_u32(DB_NAME, DB_VERSION)
            .map_err(StoreError::from)?;

        let upgrade_req = request.clone();
        let on_upgrade = Closure::once_into_js(move |_: IdbVersionChangeEvent| {
            if let Ok(result) = upgrade_req.result() {
                let db: IdbDatabase = result.unchecked_into();
                let existing = db.object_store_names();
                for partition in Partition::ALL {
                    if !existing.contains(partition.as_str()) {
                        // Auto-incrementing "id" key path on every partition.
                        let opts = Object::new();
                        let _ = Reflect::set(&opts, &"keyPath".into(), &"id".into());
                        let _ = Reflect::set(&opts, &"autoIncrement".into(), &JsValue::TRUE);
                        let _ = db.create_object_store_with_optional_parameters(
                            partition.as_str(),
                            opts.unchecked_ref(),
                        );
                    }
                }
                console::log_1(&"storage upgrade complete".into());
            }
        });
        request.set_onupgradeneeded(Some(on_upgrade.unchecked_ref()));

        let result = settle(request.clone().into()).await?;
        let db: IdbDatabase = result.unchecked_into();
        DB_HANDLE.with(|h| *h.borrow_mut() = Some(db.clone()));
        console::log_1(&"storage opened".into());
        Ok(Store { db })
    }

    fn object_store(
        &self,
        partition: Partition,
        mode: IdbTransactionMode,
    ) -> Result<IdbObjectStore, StoreError> {
        let tx = self
            .db
            .transaction_with_str_and_mode(partition.as_str(), mode)
            .map_err(StoreError::from)?;
        tx.object_store(partition.as_str()).map_err(StoreError::from)
    }

    /// Insert a record without an id; the store assigns a unique, strictly
    /// increasing identifier and returns it.
    pub async fn add<T: Serialize>(
        &self,
        partition: Partition,
        record: &T,
    ) -> Result<u32, StoreError> {
        let value = encode(record)?;
        let store = self.object_store(partition, IdbTransactionMode::Readwrite)?;
        let key = settle(store.add(&value).map_err(StoreError::from)?).await?;
        key_as_id(&key)
    }

    /// Point lookup; an absent record is `Ok(None)`, not an error.
    pub async fn get<T: DeserializeOwned>(
        &self,
        partition: Partition,
        id: u32,
    ) -> Result<Option<T>, StoreError> {
        let store = self.object_store(partition, IdbTransactionMode::Readonly)?;
        let result = settle(
            store
                .get(&JsValue::from_f64(id as f64))
                .map_err(StoreError::from)?,
        )
        .await?;
        if result.is_undefined() || result.is_null() {
            return Ok(None);
        }
        Ok(Some(decode(&result)?))
    }

    /// All records in the partition, in store order.
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        partition: Partition,
    ) -> Result<Vec<T>, StoreError> {
        let store = self.object_store(partition, IdbTransactionMode::Readonly)?;
        let result = settle(store.get_all().map_err(StoreError::from)?).await?;
        decode(&result)
    }

    /// Upsert: replaces the record under its id, or inserts it there.
    pub async fn update<T: Serialize>(
        &self,
        partition: Partition,
        record: &T,
    ) -> Result<u32, StoreError> {
        let value = encode(record)?;
        let store = self.object_store(partition, IdbTransactionMode::Readwrite)?;
        let key = settle(store.put(&value).map_err(StoreError::from)?).await?;
        key_as_id(&key)
    }

    /// Remove the record if present; absent is not an error.
    pub async fn delete(&self, partition: Partition, id: u32) -> Result<(), StoreError> {
        let store = self.object_store(partition, IdbTransactionMode::Readwrite)?;
        settle(
            store
                .delete(&JsValue::from_f64(id as f64))
                .map_err(StoreError::from)?,
        )
        .await?;
        Ok(())
    }
}

fn encode<T: Serialize>(record: &T) -> Result<JsValue, StoreError> {
    let json = serde_json::to_string(record)?;
    js_sys::JSON::parse(&json).map_err(StoreError::from)
}

fn decode<T: DeserializeOwned>(value: &JsValue) -> Result<T, StoreError> {
    let json: String = js_sys::JSON::stringify(value)
        .map_err(StoreError::from)?
        .into();
    Ok(serde_json::from_str(&json)?)
}

fn key_as_id(key: &JsValue) -> Result<u32, StoreError> {
    key.as_f64()
        .map(|k| k as u32)
        .ok_or_else(|| StoreError::Backend("non-numeric key from store".into()))
}

/// Adapt an IdbRequest to a future over its success value. The request's
/// callbacks settle a wrapping Promise, which `JsFuture` can await.
async fn settle(request: IdbRequest) -> Result<JsValue, StoreError> {
    let promise = Promise::new(&mut |resolve, reject| {
        let on_ok_req = request.clone();
        let on_ok = Closure::once_into_js(move |_: Event| {
            let value = on_ok_req.result().unwrap_or(JsValue::UNDEFINED);
            let _ = resolve.call1(&JsValue::NULL, &value);
        });
        request.set_onsuccess(Some(on_ok.unchecked_ref()));

        let on_err_req = request.clone();
        let on_err = Closure::once_into_js(move |_: Event| {
            let reason = on_err_req
                .error()
                .ok()
                .flatten()
                .map(JsValue::from)
                .unwrap_or_else(|| JsValue::from_str("storage request failed"));
            let _ = reject.call1(&JsValue::NULL, &reason);
        });
        request.set_onerror(Some(on_err.unchecked_ref()));
    });
    JsFuture::from(promise).await.map_err(StoreError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_names() {
        let names: Vec<&str> = Partition::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(
            names,
            vec!["users", "notepad_notes", "python_scripts", "browser_data"]
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            StoreError::Backend("quota exceeded".into()).to_string(),
            "storage error: quota exceeded"
        );
        assert_eq!(StoreError::Unavailable.to_string(), "storage is not available");
    }
}
