//! Renders compiled endpoint configuration tables as Rust `static` items.
//!
//! The generated code refers to `AttributeMetadata`, `DefaultValue`,
//! `MinMaxDefaults`, `ClusterMetadata`, `CommandMetadata`, `EventMetadata`,
//! `EndpointTypeMetadata`, `FixedEndpoint`, `DeviceType` and
//! `ReportingConfig`, which must be in scope wherever it is included.

use matter_endpoint_config::compiler::{
    ClusterEntry, CommandEntry, DeviceTypeEntry, EndpointConfig, EndpointTypeEntry, EventEntry,
    FixedEndpoint, PackedAttribute, ReportingEntry,
};
use matter_endpoint_config::encode::{DefaultValueRef, LongDefaultEntry, MinMaxEntry};
use proc_macro2::{Literal, TokenStream};
use quote::quote;

fn len_literal<T>(items: &[T]) -> Literal {
    Literal::usize_unsuffixed(items.len())
}

pub fn long_defaults_generate(entries: &[LongDefaultEntry]) -> TokenStream {
    let bytes: Vec<Literal> = entries
        .iter()
        .flat_map(|e| e.bytes.iter().copied())
        .map(Literal::u8_unsuffixed)
        .collect();
    let len = len_literal(&bytes);

    quote!(
        pub static GENERATED_DEFAULTS: [u8; #len] = [#(#bytes),*];
    )
}

pub fn min_max_generate(entries: &[MinMaxEntry]) -> TokenStream {
    let len = len_literal(entries);
    let items = entries.iter().map(|e| {
        let default = Literal::u16_unsuffixed(e.default);
        let min = Literal::u16_unsuffixed(e.min);
        let max = Literal::u16_unsuffixed(e.max);
        quote!(MinMaxDefaults { default: #default, min: #min, max: #max })
    });

    quote!(
        pub static GENERATED_MIN_MAX_DEFAULTS: [MinMaxDefaults; #len] = [#(#items),*];
    )
}

fn default_value(default: &DefaultValueRef) -> TokenStream {
    match default {
        DefaultValueRef::Empty => quote!(DefaultValue::Empty),
        DefaultValueRef::Inline(_) => {
            let value = Literal::u64_unsuffixed(default.inline_value().unwrap_or_default());
            quote!(DefaultValue::Inline(#value))
        }
        DefaultValueRef::LongDefaultsIndex(index) => {
            let index = Literal::u32_unsuffixed(*index);
            quote!(DefaultValue::LongDefault(#index))
        }
        DefaultValueRef::MinMaxIndex(index) => {
            let index = Literal::u32_unsuffixed(*index);
            quote!(DefaultValue::MinMax(#index))
        }
    }
}

pub fn attributes_generate(attributes: &[PackedAttribute]) -> TokenStream {
    let len = len_literal(attributes);
    let items = attributes.iter().map(|a| {
        let id = Literal::u32_unsuffixed(a.id);
        let type_id = Literal::u8_unsuffixed(a.type_id);
        let size = Literal::u16_unsuffixed(a.size);
        let mask = Literal::u16_unsuffixed(a.mask.bits());
        let default = default_value(&a.default);
        quote!(
            AttributeMetadata {
                id: #id,
                type_id: #type_id,
                size: #size,
                mask: #mask,
                default: #default
            }
        )
    });

    quote!(
        pub static GENERATED_ATTRIBUTES: [AttributeMetadata; #len] = [#(#items),*];
    )
}

pub fn clusters_generate(clusters: &[ClusterEntry]) -> TokenStream {
    let len = len_literal(clusters);
    let items = clusters.iter().map(|c| {
        let id = Literal::u32_unsuffixed(c.id);
        let attribute_index = Literal::u32_unsuffixed(c.attribute_index);
        let attribute_count = Literal::u32_unsuffixed(c.attribute_count);
        let attribute_size = Literal::u32_unsuffixed(c.attribute_size);
        let command_index = Literal::u32_unsuffixed(c.command_index);
        let command_count = Literal::u32_unsuffixed(c.command_count);
        let event_index = Literal::u32_unsuffixed(c.event_index);
        let event_count = Literal::u32_unsuffixed(c.event_count);
        let mask = Literal::u8_unsuffixed(c.mask.bits());
        quote!(
            ClusterMetadata {
                id: #id,
                attribute_index: #attribute_index,
                attribute_count: #attribute_count,
                attribute_size: #attribute_size,
                command_index: #command_index,
                command_count: #command_count,
                event_index: #event_index,
                event_count: #event_count,
                mask: #mask
            }
        )
    });

    quote!(
        pub static GENERATED_CLUSTERS: [ClusterMetadata; #len] = [#(#items),*];
    )
}

pub fn commands_generate(commands: &[CommandEntry]) -> TokenStream {
    let len = len_literal(commands);
    let items = commands.iter().map(|c| {
        let cluster_id = Literal::u32_unsuffixed(c.cluster_id);
        let command_id = Literal::u32_unsuffixed(c.command_id);
        let mask = Literal::u8_unsuffixed(c.mask.bits());
        quote!(CommandMetadata { cluster_id: #cluster_id, command_id: #command_id, mask: #mask })
    });

    quote!(
        pub static GENERATED_COMMANDS: [CommandMetadata; #len] = [#(#items),*];
    )
}

pub fn events_generate(events: &[EventEntry]) -> TokenStream {
    let len = len_literal(events);
    let items = events.iter().map(|e| {
        let cluster_id = Literal::u32_unsuffixed(e.cluster_id);
        let event_id = Literal::u32_unsuffixed(e.event_id);
        quote!(EventMetadata { cluster_id: #cluster_id, event_id: #event_id })
    });

    quote!(
        pub static GENERATED_EVENTS: [EventMetadata; #len] = [#(#items),*];
    )
}

pub fn endpoint_types_generate(endpoint_types: &[EndpointTypeEntry]) -> TokenStream {
    let len = len_literal(endpoint_types);
    let items = endpoint_types.iter().map(|t| {
        let cluster_index = Literal::u32_unsuffixed(t.cluster_index);
        let cluster_count = Literal::u32_unsuffixed(t.cluster_count);
        let attribute_size = Literal::u32_unsuffixed(t.attribute_size);
        quote!(
            EndpointTypeMetadata {
                cluster_index: #cluster_index,
                cluster_count: #cluster_count,
                attribute_size: #attribute_size
            }
        )
    });

    quote!(
        pub static GENERATED_ENDPOINT_TYPES: [EndpointTypeMetadata; #len] = [#(#items),*];
    )
}

/// Fixed endpoints plus their device type lists.
pub fn fixed_endpoints_generate(
    endpoints: &[FixedEndpoint],
    device_types: &[DeviceTypeEntry],
    offsets: &[u32],
    lengths: &[u32],
) -> TokenStream {
    let len = len_literal(endpoints);
    let items = endpoints.iter().map(|e| {
        let endpoint_id = Literal::u16_unsuffixed(e.endpoint_id);
        let endpoint_type_index = Literal::u32_unsuffixed(e.endpoint_type_index);
        let profile_id = Literal::u16_unsuffixed(e.profile_id);
        let network_id = Literal::u16_unsuffixed(e.network_id);
        quote!(
            FixedEndpoint {
                endpoint_id: #endpoint_id,
                endpoint_type_index: #endpoint_type_index,
                profile_id: #profile_id,
                network_id: #network_id
            }
        )
    });

    let device_types_len = len_literal(device_types);
    let device_type_items = device_types.iter().map(|d| {
        let code = Literal::u32_unsuffixed(d.code);
        let version = Literal::u8_unsuffixed(d.version);
        quote!(DeviceType { code: #code, version: #version })
    });
    let offsets = offsets.iter().copied().map(Literal::u32_unsuffixed);
    let lengths = lengths.iter().copied().map(Literal::u32_unsuffixed);

    quote!(
        pub static GENERATED_FIXED_ENDPOINTS: [FixedEndpoint; #len] = [#(#items),*];
        pub static GENERATED_DEVICE_TYPES: [DeviceType; #device_types_len] = [#(#device_type_items),*];
        pub static GENERATED_DEVICE_TYPE_OFFSETS: [u32; #len] = [#(#offsets),*];
        pub static GENERATED_DEVICE_TYPE_LENGTHS: [u32; #len] = [#(#lengths),*];
    )
}

pub fn reporting_generate(reporting: &[ReportingEntry]) -> TokenStream {
    let len = len_literal(reporting);
    let items = reporting.iter().map(|r| {
        let endpoint_id = Literal::u16_unsuffixed(r.endpoint_id);
        let cluster_id = Literal::u32_unsuffixed(r.cluster_id);
        let attribute_id = Literal::u32_unsuffixed(r.attribute_id);
        let mask = Literal::u8_unsuffixed(r.mask.bits());
        let manufacturer_code = Literal::u16_unsuffixed(r.manufacturer_code);
        let min_interval = Literal::u16_unsuffixed(r.min_interval);
        let max_interval = Literal::u16_unsuffixed(r.max_interval);
        let reportable_change = Literal::u32_unsuffixed(r.reportable_change);
        quote!(
            ReportingConfig {
                endpoint_id: #endpoint_id,
                cluster_id: #cluster_id,
                attribute_id: #attribute_id,
                mask: #mask,
                manufacturer_code: #manufacturer_code,
                min_interval: #min_interval,
                max_interval: #max_interval,
                reportable_change: #reportable_change
            }
        )
    });

    quote!(
        pub static GENERATED_REPORTING_CONFIG: [ReportingConfig; #len] = [#(#items),*];
    )
}

/// All tables and size constants of a compiled configuration.
pub fn endpoint_config_generate(config: &EndpointConfig) -> TokenStream {
    let largest = Literal::u16_unsuffixed(config.largest_attribute_size);
    let singletons = Literal::u32_unsuffixed(config.singletons_size);
    let max_size = Literal::u32_unsuffixed(config.total_attribute_size);
    let endpoint_count = len_literal(&config.endpoints);

    let long_defaults = long_defaults_generate(&config.long_defaults);
    let min_max = min_max_generate(&config.min_max);
    let attributes = attributes_generate(&config.attributes);
    let clusters = clusters_generate(&config.clusters);
    let commands = commands_generate(&config.commands);
    let events = events_generate(&config.events);
    let endpoint_types = endpoint_types_generate(&config.endpoint_types);
    let endpoints = fixed_endpoints_generate(
        &config.endpoints,
        &config.device_types,
        &config.device_type_offsets,
        &config.device_type_lengths,
    );
    let reporting = reporting_generate(&config.reporting);

    quote!(
        pub const ATTRIBUTE_LARGEST: u16 = #largest;
        pub const ATTRIBUTE_SINGLETONS_SIZE: u32 = #singletons;
        pub const ATTRIBUTE_MAX_SIZE: u32 = #max_size;
        pub const FIXED_ENDPOINT_COUNT: usize = #endpoint_count;

        #long_defaults
        #min_max
        #attributes
        #clusters
        #commands
        #events
        #endpoint_types
        #endpoints
        #reporting
    )
}
