use serde::{Deserialize, Serialize};

/// Represents a specific device type
///
/// API generally just reports standard `code` values and their
/// `version`. `name` is a human-friendly readable value.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct DeviceType {
    #[serde(default)]
    pub name: String,
    pub code: u32,
    pub version: u8,
}

/// Contains an initialization value of an attribute.
///
/// This is the parsed form of the literal authored in the data model
/// (for example `0x1F`, `-5`, `1.5` or `true`). String-typed
/// attributes keep their raw text and never take this form.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum DefaultAttributeValue {
    Number(u64),
    Signed(i64),
    Float(f64),
    /// Authored as `0x...`: a raw bit pattern, taken as-is for signed types too.
    Hex(u64),
    Bool(bool),
}

/// Which side of a cluster something belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Client,
    #[default]
    Server,
}

/// How an attribute value is stored on the device.
///
/// Values are kept as authored: anything that is not one of the
/// known options ends up in `Other` and is judged by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StorageOption {
    /// Stored in RAM, may be lost at reboot
    #[default]
    Ram,
    /// Stored in RAM and persisted in NVM
    Nvm,
    /// Application code handles reads/writes
    External,
    Other(String),
}

impl From<&str> for StorageOption {
    fn from(value: &str) -> Self {
        match value {
            "RAM" | "ram" => StorageOption::Ram,
            "NVM" | "nvm" => StorageOption::Nvm,
            "External" | "external" => StorageOption::External,
            other => StorageOption::Other(other.to_string()),
        }
    }
}

impl From<String> for StorageOption {
    fn from(value: String) -> Self {
        StorageOption::from(value.as_str())
    }
}

impl From<StorageOption> for String {
    fn from(value: StorageOption) -> Self {
        match value {
            StorageOption::Ram => "RAM".into(),
            StorageOption::Nvm => "NVM".into(),
            StorageOption::External => "External".into(),
            StorageOption::Other(s) => s,
        }
    }
}

/// Boolean properties of an attribute instantiation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeFlags {
    pub writable: bool,
    pub singleton: bool,
    pub nullable: bool,
    pub bounded: bool,
    pub must_use_timed_write: bool,
    pub reportable: bool,
}

/// Default reporting configuration of a reportable attribute.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingDefaults {
    pub min_interval: Option<u16>,
    pub max_interval: Option<u16>,
    pub reportable_change: Option<u32>,
}

/// Describes an attribute enabled on a cluster instance.
///
/// `type_name` should be looked up in the type registry to figure out
/// the actual sizing and classification.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct AttributeDef {
    #[serde(default)]
    pub name: String,
    pub code: u16,
    #[serde(default)]
    pub manufacturer_code: Option<u16>,
    pub type_name: String,
    #[serde(default)]
    pub side: Side,
    #[serde(default)]
    pub storage: StorageOption,
    #[serde(default)]
    pub flags: AttributeFlags,
    /// Lists are always handled by application code and have no fixed size.
    #[serde(default)]
    pub is_list: bool,
    /// Maximum length of string types, excluding the length prefix.
    #[serde(default)]
    pub max_length: Option<u16>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
    #[serde(default)]
    pub reporting: ReportingDefaults,
}

impl AttributeDef {
    /// Bounded attributes carry a min/max table entry.
    pub fn is_bounded(&self) -> bool {
        self.flags.bounded || (self.flags.writable && (self.min.is_some() || self.max.is_some()))
    }
}

/// Describes a command enabled on a cluster instance.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct CommandDef {
    #[serde(default)]
    pub name: String,
    pub code: u16,
    #[serde(default)]
    pub manufacturer_code: Option<u16>,
    /// Side that sends this command
    pub source: Side,
    #[serde(default)]
    pub incoming: bool,
    #[serde(default)]
    pub outgoing: bool,
}

/// Describes an event a cluster instance may emit.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct EventDef {
    #[serde(default)]
    pub name: String,
    pub code: u16,
    #[serde(default)]
    pub manufacturer_code: Option<u16>,
}

/// Application callbacks a cluster instance wants the firmware to invoke.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterFunction {
    Init,
    AttributeChanged,
    Shutdown,
    PreAttributeChanged,
}

/// A cluster instantiated on an endpoint type
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct ClusterInstance {
    #[serde(default)]
    pub name: String,
    pub code: u16,
    #[serde(default)]
    pub manufacturer_code: Option<u16>,
    pub side: Side,
    #[serde(default)]
    pub functions: Vec<ClusterFunction>,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
    #[serde(default)]
    pub commands: Vec<CommandDef>,
    #[serde(default)]
    pub events: Vec<EventDef>,
}

/// Reusable template of enabled clusters, instantiated by endpoints.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct EndpointType {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub clusters: Vec<ClusterInstance>,
}

/// Represents an endpoint exposed by a server.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: u16,
    pub endpoint_type: u32,
    #[serde(default)]
    pub profile_id: u16,
    #[serde(default)]
    pub network_id: u16,
    #[serde(default)]
    pub device_types: Vec<DeviceType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_option_keeps_unknown_values() {
        assert_eq!(StorageOption::from("NVM"), StorageOption::Nvm);
        assert_eq!(StorageOption::from("External"), StorageOption::External);
        assert_eq!(
            StorageOption::from("Flash"),
            StorageOption::Other("Flash".into())
        );
        assert_eq!(String::from(StorageOption::Other("Flash".into())), "Flash");
    }

    #[test]
    fn bounded_requires_writable_or_flag() {
        let mut attr = AttributeDef {
            code: 1,
            type_name: "int8u".into(),
            min: Some("0".into()),
            ..Default::default()
        };
        assert!(!attr.is_bounded());

        attr.flags.writable = true;
        assert!(attr.is_bounded());

        attr.flags.writable = false;
        attr.min = None;
        attr.flags.bounded = true;
        assert!(attr.is_bounded());
    }

    #[test]
    fn attribute_deserializes_with_defaults() {
        let attr: AttributeDef = serde_json::from_str(
            r#"{"code": 5, "type_name": "int32u", "storage": "NVM", "flags": {"singleton": true}}"#,
        )
        .expect("valid attribute");

        assert_eq!(attr.storage, StorageOption::Nvm);
        assert_eq!(attr.side, Side::Server);
        assert!(attr.flags.singleton);
        assert!(!attr.flags.writable);
        assert_eq!(attr.default_value, None);
    }

    #[test]
    fn cluster_events_default_to_empty() {
        let cluster: ClusterInstance =
            serde_json::from_str(r#"{"code": 6, "side": "server"}"#).expect("valid cluster");
        assert!(cluster.events.is_empty());

        let cluster: ClusterInstance = serde_json::from_str(
            r#"{"code": 6, "side": "server", "events": [{"code": 0}, {"code": 1, "manufacturer_code": 4098}]}"#,
        )
        .expect("valid cluster");
        assert_eq!(cluster.events.len(), 2);
        assert_eq!(cluster.events[1].manufacturer_code, Some(0x1002));
    }
}
