//! Source adapters: one per raw dataset shape.
//!
//! An adapter is created empty, `load`ed from a location, and then asked for
//! its episodes. `to_episodes` is a pure function of the loaded state.

pub mod contract;
pub mod conversation;
pub mod price;

use kg_loader_schemas::{Episode, RawRecord};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::error::SourceError;

pub use contract::{ContractAdapter, ReferenceAnchor};
pub use conversation::ConversationAdapter;
pub use price::PriceAdapter;

/// Capability shared by every source adapter.
pub trait SourceAdapter: Send {
    /// Read and parse the source, replacing anything loaded before.
    fn load(&mut self, location: &Path) -> Result<(), SourceError>;

    /// Loaded records, unchanged.
    fn raw_records(&self) -> Vec<RawRecord>;

    /// Normalize the loaded records. Performs no I/O.
    fn to_episodes(&self) -> Result<Vec<Episode>, SourceError>;
}

/// Adapters shipped with the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinSource {
    Contract,
    Price,
    Conversation,
}

impl BuiltinSource {
    pub const ALL: [BuiltinSource; 3] = [
        BuiltinSource::Contract,
        BuiltinSource::Price,
        BuiltinSource::Conversation,
    ];

    pub fn type_id(&self) -> &'static str {
        match self {
            BuiltinSource::Contract => "contract",
            BuiltinSource::Price => "price",
            BuiltinSource::Conversation => "conversation",
        }
    }

    pub fn adapter(&self) -> Box<dyn SourceAdapter> {
        match self {
            BuiltinSource::Contract => Box::new(ContractAdapter::new()),
            BuiltinSource::Price => Box::new(PriceAdapter::new()),
            BuiltinSource::Conversation => Box::new(ConversationAdapter::new()),
        }
    }
}

/// Read a JSON array of records, failing closed on the first bad element.
pub(crate) fn read_records<T: DeserializeOwned>(location: &Path) -> Result<Vec<T>, SourceError> {
    let text = std::fs::read_to_string(location).map_err(|e| SourceError::read(location, e))?;

    let value: Value = serde_json::from_str(&text)
        .map_err(|e| SourceError::read(location, format!("invalid JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(SourceError::read(
            location,
            "expected a JSON array of records",
        ));
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item)
                .map_err(|e| SourceError::read(location, format!("record #{}: {}", index, e)))
        })
        .collect::<Result<Vec<T>, _>>()?;

    debug!("Loaded {} records from {}", records.len(), location.display());
    Ok(records)
}

/// Serialize a record (or group of records) as episode content.
pub(crate) fn to_content<T: serde::Serialize + ?Sized>(
    index: usize,
    label: &str,
    value: &T,
) -> Result<String, SourceError> {
    serde_json::to_string(value).map_err(|e| SourceError::normalization(index, label, e))
}
