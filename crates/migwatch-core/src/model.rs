//! Snapshot records as returned by `oc get ... -o json`.
//!
//! Every field decodes leniently: a value of the wrong JSON type becomes its
//! default instead of failing the whole list, so one malformed object never
//! hides the rest of the dashboard.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Decode `T` from whatever JSON is present, falling back to `T::default()`.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Decode a JSON array element by element, dropping elements that do not fit `T`.
pub fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(elements) = value else {
        return Ok(Vec::new());
    };
    Ok(elements
        .into_iter()
        .filter_map(|element| serde_json::from_value(element).ok())
        .collect())
}

fn lenient_resources<'de, D>(deserializer: D) -> Result<Vec<Resource>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(elements) = value else {
        return Ok(Vec::new());
    };
    Ok(elements
        .into_iter()
        .map(|element| Resource::deserialize(element).unwrap_or(Resource::Other))
        .collect())
}

/// A decoded `kind: List` response. Kinds the dashboard does not use
/// (providers, anything unknown) are kept as [`Resource::Other`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceCollection {
    #[serde(default, deserialize_with = "lenient_resources")]
    pub items: Vec<Resource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind")]
pub enum Resource {
    Migration(Migration),
    Plan(Plan),
    #[serde(rename = "DataVolume")]
    StorageTransfer(StorageTransfer),
    #[serde(other)]
    Other,
}

impl ResourceCollection {
    pub fn new(items: Vec<Resource>) -> Self {
        Self { items }
    }

    pub fn migrations(&self) -> impl Iterator<Item = &Migration> {
        self.items.iter().filter_map(|item| match item {
            Resource::Migration(migration) => Some(migration),
            _ => None,
        })
    }

    pub fn plans(&self) -> impl Iterator<Item = &Plan> {
        self.items.iter().filter_map(|item| match item {
            Resource::Plan(plan) => Some(plan),
            _ => None,
        })
    }

    pub fn storage_transfers(&self) -> impl Iterator<Item = &StorageTransfer> {
        self.items.iter().filter_map(|item| match item {
            Resource::StorageTransfer(transfer) => Some(transfer),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub namespace: String,
    /// RFC3339; compared as a string when ordering migrations.
    #[serde(default, deserialize_with = "lenient")]
    pub creation_timestamp: String,
    #[serde(default, deserialize_with = "lenient")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub owner_references: Vec<OwnerReference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerReference {
    #[serde(default, deserialize_with = "lenient")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectReference {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Condition {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub condition_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
}

impl Condition {
    /// `Type=Status(message)`, or `None` when type or status is missing.
    pub fn summary(&self) -> Option<String> {
        let condition_type = self.condition_type.as_deref().filter(|s| !s.is_empty())?;
        let status = self.status.as_deref().filter(|s| !s.is_empty())?;
        match self.message.as_deref().filter(|s| !s.is_empty()) {
            Some(message) => Some(format!("{}={}({})", condition_type, status, message)),
            None => Some(format!("{}={}", condition_type, status)),
        }
    }
}

// ---------- Plan ----------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Plan {
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: ObjectMeta,
    #[serde(default, deserialize_with = "lenient")]
    pub spec: PlanSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSpec {
    #[serde(default, deserialize_with = "lenient")]
    pub target_namespace: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub warm: Option<bool>,
}

// ---------- Migration ----------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Migration {
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: ObjectMeta,
    #[serde(default, deserialize_with = "lenient")]
    pub spec: MigrationSpec,
    #[serde(default, deserialize_with = "lenient")]
    pub status: MigrationStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationSpec {
    #[serde(default, deserialize_with = "lenient")]
    pub plan: Option<ObjectReference>,
    #[serde(default, deserialize_with = "lenient")]
    pub target_namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MigrationStatus {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub vms: Vec<VmStatus>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub conditions: Vec<Condition>,
}

impl Migration {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn creation_timestamp(&self) -> &str {
        &self.metadata.creation_timestamp
    }

    /// Name of the owning plan; `None` when the reference is missing or empty.
    pub fn plan_name(&self) -> Option<&str> {
        self.spec
            .plan
            .as_ref()
            .and_then(|plan| plan.name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VmStatus {
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub phase: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub pipeline: Vec<PipelineStage>,
    #[serde(default, deserialize_with = "lenient")]
    pub error: Option<VmError>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub conditions: Vec<Condition>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub hooks: Vec<HookStatus>,
}

impl VmStatus {
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|error| error.message.as_deref())
            .filter(|message| !message.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VmError {
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookStatus {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub hook_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineStage {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub started: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub ended: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub progress: Option<StageProgress>,
}

/// A byte counter as reported. Anything other than a non-negative integer is
/// kept as `Invalid` so a present-but-broken field still hides its fallback.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ByteCounter {
    Count(u64),
    Invalid(Value),
}

impl ByteCounter {
    pub fn count(&self) -> Option<u64> {
        match self {
            ByteCounter::Count(count) => Some(*count),
            ByteCounter::Invalid(_) => None,
        }
    }
}

/// Byte counters of one stage. Older controllers report `total`/`current`
/// instead of `totalBytes`/`copiedBytes`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageProgress {
    #[serde(default, deserialize_with = "lenient")]
    pub total_bytes: Option<ByteCounter>,
    #[serde(default, deserialize_with = "lenient")]
    pub copied_bytes: Option<ByteCounter>,
    #[serde(default, deserialize_with = "lenient")]
    pub total: Option<ByteCounter>,
    #[serde(default, deserialize_with = "lenient")]
    pub current: Option<ByteCounter>,
}

impl StageProgress {
    /// `totalBytes` whenever the key is present, `total` only when it is not.
    pub fn total(&self) -> Option<&ByteCounter> {
        self.total_bytes.as_ref().or(self.total.as_ref())
    }

    pub fn copied(&self) -> Option<&ByteCounter> {
        self.copied_bytes.as_ref().or(self.current.as_ref())
    }

    /// `(copied, total)` when total is positive and copied is a non-negative
    /// integer. Copied is not clamped to total.
    pub fn usable(&self) -> Option<(u64, u64)> {
        let total = self.total()?.count().filter(|total| *total > 0)?;
        let copied = self.copied()?.count()?;
        Some((copied, total))
    }
}

// ---------- StorageTransfer (DataVolume) ----------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageTransfer {
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: ObjectMeta,
    #[serde(default, deserialize_with = "lenient")]
    pub spec: StorageTransferSpec,
    #[serde(default, deserialize_with = "lenient")]
    pub status: StorageTransferStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageTransferSpec {
    #[serde(default, deserialize_with = "lenient")]
    pub storage: Option<StorageRequest>,
    #[serde(default, deserialize_with = "lenient")]
    pub pvc: Option<StorageRequest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageRequest {
    #[serde(default, deserialize_with = "lenient")]
    pub resources: Option<ResourceRequirements>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default, deserialize_with = "lenient")]
    pub requests: Option<ResourceRequests>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceRequests {
    #[serde(default, deserialize_with = "lenient")]
    pub storage: Option<Quantity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageTransferStatus {
    /// Percentage string such as `"37%"` or `"N/A"`.
    #[serde(default, deserialize_with = "lenient")]
    pub progress: Option<String>,
}

/// A capacity as found in a manifest: either raw bytes or a notation like `10Gi`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Bytes(f64),
    Notation(String),
}

impl StorageRequest {
    fn storage(&self) -> Option<&Quantity> {
        self.resources
            .as_ref()?
            .requests
            .as_ref()?
            .storage
            .as_ref()
    }
}

impl StorageTransfer {
    /// Requested capacity from `spec.storage`, or `spec.pvc` when the former
    /// carries no storage request.
    pub fn requested_capacity(&self) -> Option<&Quantity> {
        let primary = self.spec.storage.as_ref().and_then(StorageRequest::storage);
        primary.or_else(|| self.spec.pvc.as_ref().and_then(StorageRequest::storage))
    }
}
