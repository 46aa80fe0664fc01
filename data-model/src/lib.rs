mod endpoint_composition;
mod types;

pub use endpoint_composition::*;
pub use types::*;

use serde::{Deserialize, Serialize};

/// Everything a single compilation run consumes.
///
/// This is a snapshot of the data model: endpoints reference
/// endpoint types by id, and attribute types are looked up among the
/// builtin atomics plus the declared `enums`, `bitmaps` and `structs`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilationInput {
    pub endpoint_types: Vec<EndpointType>,
    pub endpoints: Vec<Endpoint>,
    pub enums: Vec<EnumDef>,
    pub bitmaps: Vec<BitmapDef>,
    pub structs: Vec<StructDef>,
}

impl CompilationInput {
    pub fn endpoint_type(&self, id: u32) -> Option<&EndpointType> {
        self.endpoint_types.iter().find(|t| t.id == id)
    }
}
