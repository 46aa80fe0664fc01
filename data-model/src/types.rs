use serde::{Deserialize, Serialize};

/// An enumeration declared by the cluster library.
///
/// `size` is the declared width in bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub size: u16,
}

/// A bitmap declared by the cluster library.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BitmapDef {
    pub name: String,
    pub size: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub type_name: String,
}

/// A composite type. Fields may reference other structs by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<StructField>,
}

impl StructDef {
    /// Names of the types referenced by fields, in field order.
    pub fn field_types(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.type_name.as_str())
    }
}
