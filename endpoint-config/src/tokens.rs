//! Grouping of NVM-backed attributes into persistence tokens.
//!
//! Every distinct (cluster code, attribute code) pair stored in NVM gets
//! exactly one token, however many endpoints enable it. A pair is a
//! singleton token as soon as any occurrence is flagged singleton; that
//! is decided for all occurrences first, and only then are the tokens
//! assigned to the global, per-endpoint and per-cluster groups.

use std::collections::HashMap;

use matter_data_model::{CompilationInput, Side};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::compiler::is_excluded_global;
use crate::error::{Error, Location, Result};
use crate::options::CompilerOptions;
use crate::ordering::{endpoints_by_id, in_emission_order};
use crate::types::{resolve_size, StorageClass, TypeRegistry};

type TokenKey = (u16, u16);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub id: u16,
    pub cluster_code: u16,
    pub attribute_code: u16,
    pub name: String,
    /// Largest storage size seen for this attribute.
    pub size: u16,
    pub singleton: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterTokens {
    pub cluster_code: u16,
    pub singletons: Vec<u16>,
    pub non_singletons: Vec<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointTokens {
    pub endpoint_id: u16,
    pub singletons: Vec<u16>,
    pub non_singletons: Vec<u16>,
    pub clusters: Vec<ClusterTokens>,
}

/// Token ids grouped at every level. Within a level, the singleton and
/// non-singleton lists are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenTable {
    pub tokens: Vec<Token>,
    pub singletons: Vec<u16>,
    pub non_singletons: Vec<u16>,
    pub endpoints: Vec<EndpointTokens>,
}

impl TokenTable {
    pub fn token(&self, cluster_code: u16, attribute_code: u16) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|t| t.cluster_code == cluster_code && t.attribute_code == attribute_code)
    }
}

/// One NVM attribute as enabled on one endpoint.
struct Occurrence {
    endpoint_id: u16,
    key: TokenKey,
}

fn push_unique(ids: &mut Vec<u16>, id: u16) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

fn assign(singletons: &mut Vec<u16>, non_singletons: &mut Vec<u16>, token: &Token) {
    if token.singleton {
        push_unique(singletons, token.id);
    } else {
        push_unique(non_singletons, token.id);
    }
}

/// Allocates NVM tokens for every NVM-backed server attribute of every endpoint.
#[instrument(skip_all)]
pub fn group_nvm_tokens(input: &CompilationInput, options: &CompilerOptions) -> Result<TokenTable> {
    let registry = TypeRegistry::from_input(input);

    // Pass 1: collect occurrences and classify every key.
    let mut tokens: Vec<Token> = Vec::new();
    let mut by_key: HashMap<TokenKey, usize> = HashMap::new();
    let mut occurrences: Vec<Occurrence> = Vec::new();

    for endpoint in endpoints_by_id(&input.endpoints) {
        let endpoint_type =
            input
                .endpoint_type(endpoint.endpoint_type)
                .ok_or(Error::UnknownEndpointType {
                    endpoint: endpoint.id,
                    endpoint_type: endpoint.endpoint_type,
                })?;

        for cluster in in_emission_order(&endpoint_type.clusters) {
            if cluster.side != Side::Server {
                continue;
            }
            for attr in in_emission_order(&cluster.attributes) {
                if attr.side != Side::Server || is_excluded_global(attr) {
                    continue;
                }
                let location = Location::of(endpoint_type, cluster, attr);
                let storage = StorageClass::resolve(&attr.storage, &location, options.lenient_storage)?;
                if storage != StorageClass::NonVolatile {
                    continue;
                }
                let size = resolve_size(attr, storage, &registry, options, &location)?.size;

                let key = (cluster.code, attr.code);
                let idx = match by_key.get(&key) {
                    Some(&idx) => idx,
                    None => {
                        let id = u16::try_from(tokens.len())
                            .ok()
                            .and_then(|offset| options.token_base.checked_add(offset))
                            .ok_or(Error::TokenSpaceExhausted {
                                base: options.token_base,
                                count: tokens.len() + 1,
                            })?;
                        debug!(
                            "token 0x{:04X} for attribute '{}' (0x{:04X}) of cluster 0x{:04X}",
                            id, attr.name, attr.code, cluster.code
                        );
                        tokens.push(Token {
                            id,
                            cluster_code: cluster.code,
                            attribute_code: attr.code,
                            name: attr.name.clone(),
                            size,
                            singleton: false,
                        });
                        by_key.insert(key, tokens.len() - 1);
                        tokens.len() - 1
                    }
                };
                let token = &mut tokens[idx];
                token.singleton |= attr.flags.singleton;
                token.size = token.size.max(size);

                occurrences.push(Occurrence {
                    endpoint_id: endpoint.id,
                    key,
                });
            }
        }
    }

    // Pass 2: every key now has its final classification.
    let mut table = TokenTable::default();
    for occurrence in &occurrences {
        let Some(token) = by_key.get(&occurrence.key).map(|&idx| &tokens[idx]) else {
            continue;
        };

        assign(&mut table.singletons, &mut table.non_singletons, token);

        if table.endpoints.last().map(|e| e.endpoint_id) != Some(occurrence.endpoint_id) {
            table.endpoints.push(EndpointTokens {
                endpoint_id: occurrence.endpoint_id,
                ..Default::default()
            });
        }
        let Some(endpoint) = table.endpoints.last_mut() else {
            continue;
        };
        assign(&mut endpoint.singletons, &mut endpoint.non_singletons, token);

        let cluster_code = occurrence.key.0;
        let cluster = match endpoint.clusters.iter().position(|c| c.cluster_code == cluster_code) {
            Some(idx) => &mut endpoint.clusters[idx],
            None => {
                endpoint.clusters.push(ClusterTokens {
                    cluster_code,
                    ..Default::default()
                });
                let last = endpoint.clusters.len() - 1;
                &mut endpoint.clusters[last]
            }
        };
        assign(&mut cluster.singletons, &mut cluster.non_singletons, token);
    }

    table.tokens = tokens;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use matter_data_model::{AttributeDef, ClusterInstance, Endpoint, EndpointType, StorageOption};

    fn nvm(code: u16, singleton: bool) -> AttributeDef {
        let mut attr = AttributeDef {
            name: format!("attr{}", code),
            code,
            type_name: "int16u".into(),
            storage: StorageOption::Nvm,
            ..Default::default()
        };
        attr.flags.singleton = singleton;
        attr
    }

    fn cluster(code: u16, attributes: Vec<AttributeDef>) -> ClusterInstance {
        ClusterInstance {
            name: format!("cluster{}", code),
            code,
            side: Side::Server,
            attributes,
            ..Default::default()
        }
    }

    fn input(types: Vec<Vec<ClusterInstance>>) -> CompilationInput {
        CompilationInput {
            endpoint_types: types
                .into_iter()
                .enumerate()
                .map(|(idx, clusters)| EndpointType {
                    id: idx as u32,
                    name: format!("type{}", idx),
                    clusters,
                })
                .collect(),
            endpoints: vec![],
            ..Default::default()
        }
    }

    fn with_endpoints(mut input: CompilationInput, endpoints: &[(u16, u32)]) -> CompilationInput {
        input.endpoints = endpoints
            .iter()
            .map(|&(id, endpoint_type)| Endpoint {
                id,
                endpoint_type,
                ..Default::default()
            })
            .collect();
        input
    }

    fn group(input: &CompilationInput) -> TokenTable {
        group_nvm_tokens(input, &CompilerOptions::default()).expect("groups")
    }

    #[test]
    fn shared_singleton_gets_one_token() {
        let input = with_endpoints(
            input(vec![
                vec![cluster(0x28, vec![nvm(0, true)])],
                vec![cluster(0x28, vec![nvm(0, true)])],
            ]),
            &[(0, 0), (1, 1)],
        );
        let table = group(&input);

        assert_eq!(table.tokens.len(), 1);
        let token = &table.tokens[0];
        assert_eq!(token.id, 0xB000);
        assert!(token.singleton);

        assert_eq!(table.singletons, vec![0xB000]);
        assert!(table.non_singletons.is_empty());
        assert_eq!(table.endpoints.len(), 2);
        for endpoint in &table.endpoints {
            assert_eq!(endpoint.singletons, vec![token.id]);
            assert!(endpoint.non_singletons.is_empty());
        }
    }

    #[test]
    fn later_singleton_promotes_earlier_occurrences() {
        let input = with_endpoints(
            input(vec![
                vec![cluster(6, vec![nvm(0, false)])],
                vec![cluster(6, vec![nvm(0, true), nvm(1, false)])],
            ]),
            &[(1, 0), (2, 1)],
        );
        let table = group(&input);

        let promoted = table.token(6, 0).expect("token");
        let plain = table.token(6, 1).expect("token");
        assert!(promoted.singleton);
        assert!(!plain.singleton);

        assert_eq!(table.singletons, vec![promoted.id]);
        assert_eq!(table.non_singletons, vec![plain.id]);

        let first = &table.endpoints[0];
        assert_eq!(first.endpoint_id, 1);
        assert_eq!(first.singletons, vec![promoted.id]);
        assert!(first.non_singletons.is_empty());
        assert_eq!(first.clusters[0].singletons, vec![promoted.id]);
        assert!(first.clusters[0].non_singletons.is_empty());

        let second = &table.endpoints[1];
        assert_eq!(second.non_singletons, vec![plain.id]);
    }

    #[test]
    fn ids_are_sequential_per_unique_key() {
        let input = with_endpoints(
            input(vec![vec![
                cluster(6, vec![nvm(0, false), nvm(0x4003, false)]),
                cluster(8, vec![nvm(0, false)]),
            ]]),
            &[(1, 0), (2, 0), (3, 0)],
        );
        let options = CompilerOptions {
            token_base: 0x1000,
            ..Default::default()
        };
        let table = group_nvm_tokens(&input, &options).expect("groups");

        let ids: Vec<(u16, u16, u16)> = table
            .tokens
            .iter()
            .map(|t| (t.id, t.cluster_code, t.attribute_code))
            .collect();
        assert_eq!(
            ids,
            vec![(0x1000, 6, 0), (0x1001, 6, 0x4003), (0x1002, 8, 0)]
        );
        assert_eq!(table.endpoints.len(), 3);
        assert_eq!(table.endpoints[2].clusters.len(), 2);
        assert_eq!(table.endpoints[2].clusters[1].non_singletons, vec![0x1002]);
    }

    #[test]
    fn only_nvm_server_attributes_participate() {
        let mut ram = nvm(1, false);
        ram.storage = StorageOption::Ram;
        let mut client_attr = nvm(2, false);
        client_attr.side = Side::Client;
        let global = nvm(0xFFFB, false);
        let mut client_cluster = cluster(3, vec![nvm(0, false)]);
        client_cluster.side = Side::Client;

        let input = with_endpoints(
            input(vec![vec![
                cluster(6, vec![nvm(0, false), ram, client_attr, global]),
                client_cluster,
            ]]),
            &[(1, 0)],
        );
        let table = group(&input);

        assert_eq!(table.tokens.len(), 1);
        assert_eq!(table.tokens[0].attribute_code, 0);
        assert_eq!(table.tokens[0].size, 2);
    }

    #[test]
    fn unknown_storage_follows_leniency() {
        let mut odd = nvm(0, false);
        odd.storage = StorageOption::Other("Flash".into());
        let input = with_endpoints(input(vec![vec![cluster(6, vec![odd])]]), &[(1, 0)]);

        assert!(matches!(
            group_nvm_tokens(&input, &CompilerOptions::default()),
            Err(Error::UnrecognizedStorageOption { .. })
        ));
        let lenient = CompilerOptions {
            lenient_storage: true,
            ..Default::default()
        };
        let table = group_nvm_tokens(&input, &lenient).expect("lenient");
        assert!(table.tokens.is_empty());
        assert!(table.endpoints.is_empty());
    }

    #[test]
    fn token_ids_never_wrap() {
        let input = with_endpoints(
            input(vec![vec![cluster(6, vec![nvm(0, false), nvm(1, false), nvm(2, false)])]]),
            &[(1, 0)],
        );

        let near_top = CompilerOptions {
            token_base: 0xFFFE,
            ..Default::default()
        };
        assert_eq!(
            group_nvm_tokens(&input, &near_top),
            Err(Error::TokenSpaceExhausted {
                base: 0xFFFE,
                count: 3
            })
        );

        let fits = CompilerOptions {
            token_base: 0xFFFD,
            ..Default::default()
        };
        let table = group_nvm_tokens(&input, &fits).expect("fits");
        let ids: Vec<u16> = table.tokens.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0xFFFD, 0xFFFE, 0xFFFF]);
    }
}
