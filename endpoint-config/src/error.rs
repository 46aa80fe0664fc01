use std::fmt;

use matter_data_model::{AttributeDef, ClusterInstance, EndpointType};
use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Where in the data model an attribute lives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub endpoint_type: String,
    pub cluster: String,
    pub cluster_code: u16,
    pub attribute: String,
    pub attribute_code: u16,
}

impl Location {
    pub fn of(endpoint_type: &EndpointType, cluster: &ClusterInstance, attribute: &AttributeDef) -> Self {
        Self {
            endpoint_type: endpoint_type.name.clone(),
            cluster: cluster.name.clone(),
            cluster_code: cluster.code,
            attribute: attribute.name.clone(),
            attribute_code: attribute.code,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "endpoint type '{}' / cluster '{}' (0x{:04X}) / attribute '{}' (0x{:04X})",
            self.endpoint_type, self.cluster, self.cluster_code, self.attribute, self.attribute_code
        )
    }
}

/// Every way a compilation run can fail.
///
/// All of these abort the run: there is no partial output.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{location}: cannot determine the storage size of type '{type_name}'")]
    #[diagnostic(
        code(endpoint_config::unresolvable_size),
        help("declare the type (or a max length for strings), or mark the attribute as externally stored")
    )]
    UnresolvableSize {
        location: Location,
        type_name: String,
    },

    #[error("{location}: min/max bounds need a value of at most 2 bytes, attribute is {size} bytes")]
    #[diagnostic(
        code(endpoint_config::oversized_bounded_attribute),
        help("remove the min/max bounds or use a narrower type")
    )]
    OversizedBoundedAttribute { location: Location, size: u16 },

    #[error("{location}: unrecognized storage option '{option}'")]
    #[diagnostic(
        code(endpoint_config::unrecognized_storage_option),
        help("use one of RAM, NVM or External, or enable lenient storage handling")
    )]
    UnrecognizedStorageOption { location: Location, option: String },

    #[error("{location}: string length {length} exceeds the limit of {limit} bytes for its type")]
    #[diagnostic(
        code(endpoint_config::string_too_long),
        help("lower the max length, or use a long string type")
    )]
    StringTooLong {
        location: Location,
        length: usize,
        limit: u16,
    },

    #[error("struct '{name}' is part of a dependency cycle")]
    #[diagnostic(
        code(endpoint_config::struct_dependency_cycle),
        help("structs may not contain themselves, directly or through other structs")
    )]
    StructDependencyCycle { name: String },

    #[error("{location}: null default for floating point type '{type_name}' is not supported")]
    #[diagnostic(code(endpoint_config::unsupported_null_float))]
    UnsupportedNullFloat {
        location: Location,
        type_name: String,
    },

    #[error("{location}: invalid value '{value}': {reason}")]
    #[diagnostic(code(endpoint_config::invalid_default))]
    InvalidDefault {
        location: Location,
        value: String,
        reason: String,
    },

    #[error("{count} NVM attributes do not fit the token range starting at 0x{base:04X}")]
    #[diagnostic(
        code(endpoint_config::token_space_exhausted),
        help("lower the token base")
    )]
    TokenSpaceExhausted { base: u16, count: usize },

    #[error("endpoint {endpoint} references unknown endpoint type {endpoint_type}")]
    #[diagnostic(code(endpoint_config::unknown_endpoint_type))]
    UnknownEndpointType { endpoint: u16, endpoint_type: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_attribute() {
        let err = Error::OversizedBoundedAttribute {
            location: Location {
                endpoint_type: "Light".into(),
                cluster: "Level Control".into(),
                cluster_code: 8,
                attribute: "remaining time".into(),
                attribute_code: 1,
            },
            size: 4,
        };

        assert_eq!(
            err.to_string(),
            "endpoint type 'Light' / cluster 'Level Control' (0x0008) / attribute 'remaining time' (0x0001): \
             min/max bounds need a value of at most 2 bytes, attribute is 4 bytes"
        );
    }
}
