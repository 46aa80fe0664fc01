//! The endpoint-config compiler.
//!
//! Compilation runs in two phases. `resolve_all` classifies and sizes
//! every attribute of every referenced endpoint type and computes the
//! cross-endpoint aggregates; only then does `pack` walk the resolved
//! model and emit the tables. A failure in either phase aborts the run.

use std::collections::{BTreeSet, HashMap};
use std::ops::RangeInclusive;

use matter_data_model::{
    AttributeDef, ClusterInstance, CommandDef, CompilationInput, Endpoint, EndpointType, EventDef,
    Side,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::encode::{encode_default, uses_min_max, DefaultValueRef, DefaultsTables, LongDefaultEntry, MinMaxEntry};
use crate::error::{Error, Location, Result};
use crate::masks::{AttributeMask, ClusterMask, CommandMask, MANUFACTURER_SPECIFIC_CLUSTER_START};
use crate::options::CompilerOptions;
use crate::ordering::{endpoints_by_id, in_emission_order, mei};
use crate::structs::topo_sort;
use crate::types::{resolve_size, StorageClass, TypeRegistry, TypeSize};

/// Global attributes (generated/accepted command lists, event list,
/// attribute list) that are never part of the emitted metadata.
pub const EXCLUDED_GLOBAL_ATTRIBUTES: RangeInclusive<u16> = 0xFFF8..=0xFFFB;

pub const DEFAULT_REPORT_MIN_INTERVAL: u16 = 1;
pub const DEFAULT_REPORT_MAX_INTERVAL: u16 = 0xFFFE;

pub fn is_excluded_global(attr: &AttributeDef) -> bool {
    attr.manufacturer_code.is_none() && EXCLUDED_GLOBAL_ATTRIBUTES.contains(&attr.code)
}

/// One entry per compiled endpoint type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointTypeEntry {
    pub id: u32,
    pub cluster_index: u32,
    pub cluster_count: u32,
    /// Bytes of attribute storage one endpoint of this type needs.
    pub attribute_size: u32,
}

/// A concrete endpoint and the endpoint type it instantiates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixedEndpoint {
    pub endpoint_id: u16,
    pub endpoint_type_index: u32,
    pub profile_id: u16,
    pub network_id: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterEntry {
    pub id: u32,
    pub attribute_index: u32,
    pub attribute_count: u32,
    pub attribute_size: u32,
    pub command_index: u32,
    pub command_count: u32,
    pub event_index: u32,
    pub event_count: u32,
    pub mask: ClusterMask,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackedAttribute {
    pub id: u32,
    pub type_id: u8,
    /// Size of the attribute's type; externally stored attributes keep it
    /// here even though they take no packed storage.
    pub size: u16,
    pub mask: AttributeMask,
    pub default: DefaultValueRef,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandEntry {
    pub cluster_id: u32,
    pub command_id: u32,
    pub mask: CommandMask,
}

/// An event a server cluster instance may emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventEntry {
    pub cluster_id: u32,
    pub event_id: u32,
}

/// Manufacturer code of the item at `index` in its table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManufacturerCodeEntry {
    pub index: u32,
    pub code: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportingEntry {
    pub endpoint_id: u16,
    pub cluster_id: u32,
    pub attribute_id: u32,
    pub mask: ClusterMask,
    pub manufacturer_code: u16,
    pub min_interval: u16,
    pub max_interval: u16,
    pub reportable_change: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceTypeEntry {
    pub code: u32,
    pub version: u8,
}

/// All tables of a compiled device, cross references resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointConfig {
    pub endpoint_types: Vec<EndpointTypeEntry>,
    pub endpoints: Vec<FixedEndpoint>,
    pub clusters: Vec<ClusterEntry>,
    pub attributes: Vec<PackedAttribute>,
    pub commands: Vec<CommandEntry>,
    pub events: Vec<EventEntry>,
    pub cluster_manufacturer_codes: Vec<ManufacturerCodeEntry>,
    pub attribute_manufacturer_codes: Vec<ManufacturerCodeEntry>,
    pub command_manufacturer_codes: Vec<ManufacturerCodeEntry>,
    pub long_defaults: Vec<LongDefaultEntry>,
    pub min_max: Vec<MinMaxEntry>,
    pub reporting: Vec<ReportingEntry>,
    pub device_types: Vec<DeviceTypeEntry>,
    pub device_type_offsets: Vec<u32>,
    pub device_type_lengths: Vec<u32>,
    pub struct_order: Vec<String>,
    pub largest_attribute_size: u16,
    pub singletons_size: u32,
    pub total_attribute_size: u32,
}

impl EndpointConfig {
    /// Total bytes of the long defaults array.
    pub fn long_defaults_size(&self) -> u32 {
        self.long_defaults.iter().map(|e| e.bytes.len() as u32).sum()
    }
}

struct ResolvedAttribute<'a> {
    def: &'a AttributeDef,
    size: TypeSize,
    location: Location,
}

struct ResolvedCluster<'a> {
    def: &'a ClusterInstance,
    attributes: Vec<ResolvedAttribute<'a>>,
    commands: Vec<&'a CommandDef>,
    events: Vec<&'a EventDef>,
    attribute_size: u32,
}

struct ResolvedEndpointType<'a> {
    def: &'a EndpointType,
    clusters: Vec<ResolvedCluster<'a>>,
}

impl ResolvedEndpointType<'_> {
    fn attribute_size(&self) -> u32 {
        self.clusters.iter().map(|c| c.attribute_size).sum()
    }
}

/// Aggregates over the whole device, known before packing starts.
#[derive(Debug, Default)]
struct Sizing {
    largest_attribute_size: u16,
    singletons_size: u32,
    total_attribute_size: u32,
}

struct ResolvedModel<'a> {
    endpoint_types: Vec<ResolvedEndpointType<'a>>,
    /// Endpoints by id, with the index of their endpoint type.
    endpoints: Vec<(&'a Endpoint, usize)>,
    sizing: Sizing,
}

fn resolve_cluster<'a>(
    endpoint_type: &'a EndpointType,
    cluster: &'a ClusterInstance,
    registry: &TypeRegistry,
    options: &CompilerOptions,
) -> Result<ResolvedCluster<'a>> {
    if cluster.side == Side::Client {
        return Ok(ResolvedCluster {
            def: cluster,
            attributes: Vec::new(),
            commands: Vec::new(),
            events: Vec::new(),
            attribute_size: 0,
        });
    }

    let attributes = in_emission_order(&cluster.attributes)
        .into_iter()
        .filter(|attr| attr.side == Side::Server && !is_excluded_global(attr))
        .map(|def| -> Result<ResolvedAttribute<'a>> {
            let location = Location::of(endpoint_type, cluster, def);
            let storage = StorageClass::resolve(&def.storage, &location, options.lenient_storage)?;
            let size = resolve_size(def, storage, registry, options, &location)?;
            Ok(ResolvedAttribute { def, size, location })
        })
        .collect::<Result<Vec<_>>>()?;

    let commands = in_emission_order(&cluster.commands);
    let events = in_emission_order(&cluster.events);

    Ok(ResolvedCluster {
        def: cluster,
        attributes,
        commands,
        events,
        attribute_size: 0,
    })
}

/// Resolves every attribute of every referenced endpoint type.
fn resolve_all<'a>(
    input: &'a CompilationInput,
    registry: &TypeRegistry,
    options: &CompilerOptions,
) -> Result<ResolvedModel<'a>> {
    let mut type_index: HashMap<u32, usize> = HashMap::new();
    let mut referenced: Vec<&EndpointType> = Vec::new();
    let mut endpoints = Vec::with_capacity(input.endpoints.len());

    for endpoint in endpoints_by_id(&input.endpoints) {
        let endpoint_type =
            input
                .endpoint_type(endpoint.endpoint_type)
                .ok_or(Error::UnknownEndpointType {
                    endpoint: endpoint.id,
                    endpoint_type: endpoint.endpoint_type,
                })?;
        let idx = *type_index.entry(endpoint_type.id).or_insert_with(|| {
            referenced.push(endpoint_type);
            referenced.len() - 1
        });
        endpoints.push((endpoint, idx));
    }

    for unused in input
        .endpoint_types
        .iter()
        .filter(|t| !type_index.contains_key(&t.id))
    {
        debug!("endpoint type '{}' ({}) is not used by any endpoint", unused.name, unused.id);
    }

    let mut endpoint_types = referenced
        .into_iter()
        .map(|def| -> Result<ResolvedEndpointType<'a>> {
            let clusters = in_emission_order(&def.clusters)
                .into_iter()
                .map(|cluster| resolve_cluster(def, cluster, registry, options))
                .collect::<Result<Vec<_>>>()?;
            Ok(ResolvedEndpointType { def, clusters })
        })
        .collect::<Result<Vec<_>>>()?;

    let sizing = size_all(&mut endpoint_types, &endpoints);

    Ok(ResolvedModel {
        endpoint_types,
        endpoints,
        sizing,
    })
}

/// Fills in cluster storage sizes and computes the device aggregates.
///
/// Singletons are stored once per device, so they count towards the
/// singleton total once per distinct (cluster, attribute) and never
/// towards their cluster.
fn size_all(endpoint_types: &mut [ResolvedEndpointType<'_>], endpoints: &[(&Endpoint, usize)]) -> Sizing {
    let mut sizing = Sizing::default();
    let mut singletons: BTreeSet<(u32, u32)> = BTreeSet::new();

    for endpoint_type in endpoint_types.iter_mut() {
        for cluster in endpoint_type.clusters.iter_mut() {
            let cluster_id = mei(cluster.def.manufacturer_code, cluster.def.code);
            for attr in &cluster.attributes {
                sizing.largest_attribute_size = sizing.largest_attribute_size.max(attr.size.nominal);
                if attr.size.storage == StorageClass::External {
                    continue;
                }
                let size = u32::from(attr.size.size);
                if attr.def.flags.singleton {
                    let key = (cluster_id, mei(attr.def.manufacturer_code, attr.def.code));
                    if singletons.insert(key) {
                        sizing.singletons_size += size;
                    }
                } else {
                    cluster.attribute_size += size;
                }
            }
        }
    }

    sizing.total_attribute_size = endpoints
        .iter()
        .map(|(_, idx)| endpoint_types[*idx].attribute_size())
        .sum();
    sizing
}

fn attribute_mask(attr: &ResolvedAttribute<'_>, cluster: &ClusterInstance) -> AttributeMask {
    let def = attr.def;
    let mut mask = match attr.size.storage {
        StorageClass::Ram => AttributeMask::empty(),
        StorageClass::NonVolatile => AttributeMask::TOKENIZE,
        StorageClass::External => AttributeMask::EXTERNAL_STORAGE,
    };
    mask.set(AttributeMask::WRITABLE, def.flags.writable);
    mask.set(AttributeMask::MIN_MAX, uses_min_max(def, &attr.size));
    mask.set(
        AttributeMask::MANUFACTURER_SPECIFIC,
        def.manufacturer_code.is_some() && cluster.code < MANUFACTURER_SPECIFIC_CLUSTER_START,
    );
    mask.set(AttributeMask::SINGLETON, def.flags.singleton);
    mask.set(AttributeMask::NULLABLE, def.flags.nullable);
    mask.set(AttributeMask::MUST_USE_TIMED_WRITE, def.flags.must_use_timed_write);
    mask
}

/// Emits the tables of one cluster instance into `config`.
fn pack_cluster(
    cluster: &ResolvedCluster<'_>,
    config: &mut EndpointConfig,
    defaults: &mut DefaultsTables,
    options: &CompilerOptions,
) -> Result<()> {
    let def = cluster.def;
    let cluster_id = mei(def.manufacturer_code, def.code);
    let attribute_index = config.attributes.len() as u32;
    let command_index = config.commands.len() as u32;
    let event_index = config.events.len() as u32;

    for attr in &cluster.attributes {
        let encoded = encode_default(attr.def, &attr.size, options, &attr.location)?;
        let default = defaults.place(encoded, &attr.def.name);

        if let Some(code) = attr.def.manufacturer_code {
            config.attribute_manufacturer_codes.push(ManufacturerCodeEntry {
                index: config.attributes.len() as u32,
                code,
            });
        }
        config.attributes.push(PackedAttribute {
            id: mei(attr.def.manufacturer_code, attr.def.code),
            type_id: attr.size.info.type_id,
            size: attr.size.nominal,
            mask: attribute_mask(attr, def),
            default,
            name: attr.def.name.clone(),
        });
    }

    for command in &cluster.commands {
        let mask = CommandMask::for_command(
            command.source,
            def.side,
            command.incoming,
            command.outgoing,
            command.manufacturer_code.is_some(),
        );
        if mask.is_empty() {
            debug!("command '{}' of cluster '{}' has no direction here, skipping", command.name, def.name);
            continue;
        }
        if let Some(code) = command.manufacturer_code {
            config.command_manufacturer_codes.push(ManufacturerCodeEntry {
                index: config.commands.len() as u32,
                code,
            });
        }
        config.commands.push(CommandEntry {
            cluster_id,
            command_id: mei(command.manufacturer_code, command.code),
            mask,
        });
    }

    config.events.extend(cluster.events.iter().map(|event| EventEntry {
        cluster_id,
        event_id: mei(event.manufacturer_code, event.code),
    }));

    if let Some(code) = def.manufacturer_code {
        config.cluster_manufacturer_codes.push(ManufacturerCodeEntry {
            index: config.clusters.len() as u32,
            code,
        });
    }
    config.clusters.push(ClusterEntry {
        id: cluster_id,
        attribute_index,
        attribute_count: config.attributes.len() as u32 - attribute_index,
        attribute_size: cluster.attribute_size,
        command_index,
        command_count: config.commands.len() as u32 - command_index,
        event_index,
        event_count: config.events.len() as u32 - event_index,
        mask: ClusterMask::for_cluster(def.side, &def.functions),
        name: def.name.clone(),
    });
    Ok(())
}

fn reporting_entries(endpoint: &Endpoint, endpoint_type: &ResolvedEndpointType<'_>) -> Vec<ReportingEntry> {
    endpoint_type
        .clusters
        .iter()
        .flat_map(|cluster| {
            cluster
                .attributes
                .iter()
                .filter(|attr| attr.def.flags.reportable)
                .map(move |attr| {
                    let reporting = &attr.def.reporting;
                    ReportingEntry {
                        endpoint_id: endpoint.id,
                        cluster_id: mei(cluster.def.manufacturer_code, cluster.def.code),
                        attribute_id: mei(attr.def.manufacturer_code, attr.def.code),
                        mask: ClusterMask::SERVER,
                        manufacturer_code: attr.def.manufacturer_code.unwrap_or(0),
                        min_interval: reporting.min_interval.unwrap_or(DEFAULT_REPORT_MIN_INTERVAL),
                        max_interval: reporting.max_interval.unwrap_or(DEFAULT_REPORT_MAX_INTERVAL),
                        reportable_change: reporting.reportable_change.unwrap_or(0),
                    }
                })
        })
        .collect()
}

/// Emits all tables from a fully resolved model.
fn pack(model: &ResolvedModel<'_>, options: &CompilerOptions) -> Result<EndpointConfig> {
    let mut config = EndpointConfig {
        largest_attribute_size: model.sizing.largest_attribute_size,
        singletons_size: model.sizing.singletons_size,
        total_attribute_size: model.sizing.total_attribute_size,
        ..Default::default()
    };
    let mut defaults = DefaultsTables::default();

    for endpoint_type in &model.endpoint_types {
        let cluster_index = config.clusters.len() as u32;
        for cluster in &endpoint_type.clusters {
            pack_cluster(cluster, &mut config, &mut defaults, options)?;
        }
        config.endpoint_types.push(EndpointTypeEntry {
            id: endpoint_type.def.id,
            cluster_index,
            cluster_count: config.clusters.len() as u32 - cluster_index,
            attribute_size: endpoint_type.attribute_size(),
        });
    }

    for (endpoint, type_idx) in &model.endpoints {
        config.endpoints.push(FixedEndpoint {
            endpoint_id: endpoint.id,
            endpoint_type_index: *type_idx as u32,
            profile_id: endpoint.profile_id,
            network_id: endpoint.network_id,
        });
        config.device_type_offsets.push(config.device_types.len() as u32);
        config.device_type_lengths.push(endpoint.device_types.len() as u32);
        config
            .device_types
            .extend(endpoint.device_types.iter().map(|dt| DeviceTypeEntry {
                code: dt.code,
                version: dt.version,
            }));
        config
            .reporting
            .extend(reporting_entries(endpoint, &model.endpoint_types[*type_idx]));
    }

    config.long_defaults = defaults.long_defaults;
    config.min_max = defaults.min_max;
    Ok(config)
}

/// Compiles the endpoint configuration tables of a device.
#[instrument(skip_all)]
pub fn compile(input: &CompilationInput, options: &CompilerOptions) -> Result<EndpointConfig> {
    let struct_order = topo_sort(&input.structs)?
        .into_iter()
        .map(|s| s.name.clone())
        .collect();

    let registry = TypeRegistry::from_input(input);
    let model = resolve_all(input, &registry, options)?;
    let mut config = pack(&model, options)?;
    config.struct_order = struct_order;

    info!(
        "compiled {} endpoint types for {} endpoints: {} clusters, {} attributes, {} commands, {} events",
        config.endpoint_types.len(),
        config.endpoints.len(),
        config.clusters.len(),
        config.attributes.len(),
        config.commands.len(),
        config.events.len()
    );
    Ok(config)
}
