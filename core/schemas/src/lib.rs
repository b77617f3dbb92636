use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ============================================================================
// ULID and ID Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Episode Schema
// ============================================================================

/// Payload encoding of an episode's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeType {
    #[serde(rename = "message")]
    Message,
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "text")]
    Text,
}

impl EpisodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeType::Message => "message",
            EpisodeType::Json => "json",
            EpisodeType::Text => "text",
        }
    }
}

/// Normalized, time-anchored unit of content accepted by the graph service.
///
/// `content` is a complete serialization produced by the adapter and is never
/// rewritten after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub name: String,
    pub content: String,
    pub source_description: String,
    pub source: EpisodeType,
    pub reference_time: DateTime<Utc>,
    pub group_id: Option<String>,
}

// ============================================================================
// Raw Source Records
// ============================================================================

/// One contract as found in a contract dataset.
///
/// The parsed object is kept as-is, explicit `null`s and unknown keys
/// included; the fields the loader reads are validated up front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ContractRecord {
    customer_id: String,
    fields: Map<String, Value>,
}

impl ContractRecord {
    /// Customer id as text; numeric ids are rendered in decimal.
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn contract_id(&self) -> Option<String> {
        self.fields.get("contract_id").and_then(scalar_text)
    }

    /// `YYYY-MM-DD` start date, if present and not `null`.
    pub fn start_date(&self) -> Option<&str> {
        self.fields.get("start_date").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Map<String, Value>> for ContractRecord {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let customer_id = required_scalar(&fields, "customer_id")?;
        optional_scalar(&fields, "contract_id")?;
        optional_string(&fields, "start_date")?;
        Ok(Self {
            customer_id,
            fields,
        })
    }
}

impl From<ContractRecord> for Map<String, Value> {
    fn from(record: ContractRecord) -> Self {
        record.fields
    }
}

/// One energy price observation, kept exactly as parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct PricePoint {
    date: String, // YYYY-MM-DD or RFC3339
    location_id: Option<String>,
    fields: Map<String, Value>,
}

impl PricePoint {
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn location_id(&self) -> Option<&str> {
        self.location_id.as_deref()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Map<String, Value>> for PricePoint {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let date = optional_string(&fields, "date")?
            .ok_or_else(|| "missing field `date`".to_string())?
            .to_string();
        let location_id = optional_scalar(&fields, "location_id")?;
        Ok(Self {
            date,
            location_id,
            fields,
        })
    }
}

impl From<PricePoint> for Map<String, Value> {
    fn from(price: PricePoint) -> Self {
        price.fields
    }
}

/// One message of a customer/bot conversation, kept exactly as parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ConversationMessage {
    thread_id: String,
    timestamp: String, // RFC3339, offset required
    fields: Map<String, Value>,
}

impl ConversationMessage {
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Map<String, Value>> for ConversationMessage {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let thread_id = required_scalar(&fields, "thread_id")?;
        let timestamp = optional_string(&fields, "timestamp")?
            .ok_or_else(|| "missing field `timestamp`".to_string())?
            .to_string();
        Ok(Self {
            thread_id,
            timestamp,
            fields,
        })
    }
}

impl From<ConversationMessage> for Map<String, Value> {
    fn from(message: ConversationMessage) -> Self {
        message.fields
    }
}

/// Text form of a JSON scalar; `None` for null, arrays and objects.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn optional_scalar(fields: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_text(value)
            .map(Some)
            .ok_or_else(|| format!("field `{}` must be a string or number", key)),
    }
}

fn required_scalar(fields: &Map<String, Value>, key: &str) -> Result<String, String> {
    optional_scalar(fields, key)?.ok_or_else(|| format!("missing field `{}`", key))
}

fn optional_string<'a>(fields: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>, String> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(format!("field `{}` must be a string", key)),
    }
}

/// A loaded record as exposed for inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawRecord {
    Contract(ContractRecord),
    Price(PricePoint),
    Message(ConversationMessage),
    Custom(Value),
}

// ============================================================================
// Search Results
// ============================================================================

/// A fact (entity edge) returned by the graph service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactResult {
    pub uuid: FactId,
    pub fact: String,
    pub source_node_uuid: NodeId,
    #[serde(default)]
    pub target_node_uuid: Option<NodeId>,
    /// Start of the real-world validity interval.
    #[serde(default)]
    pub valid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invalid_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Helper Functions
// ============================================================================

pub fn generate_run_id() -> RunId {
    RunId(format!("run_{}", ulid::Ulid::new()))
}
