//! Emission order of struct definitions.
//!
//! A struct may only be emitted once every struct it uses as a field
//! type has been emitted.

use std::collections::{HashMap, HashSet};

use matter_data_model::StructDef;

use crate::error::{Error, Result};

struct DependencySorter<'a> {
    structs: &'a [StructDef],
    outgoing: HashMap<usize, Vec<usize>>,
    visited: HashSet<usize>,
    path: HashSet<usize>,
    finished: Vec<usize>,
}

impl<'a> DependencySorter<'a> {
    fn visit(&mut self, node: usize) -> Result<()> {
        if self.path.contains(&node) {
            return Err(Error::StructDependencyCycle {
                name: self.structs[node].name.clone(),
            });
        }
        if !self.visited.insert(node) {
            return Ok(());
        }

        let children = self.outgoing.get(&node).cloned().unwrap_or_default();
        self.path.insert(node);
        for child in children.into_iter().rev() {
            self.visit(child)?;
        }
        self.path.remove(&node);

        self.finished.push(node);
        Ok(())
    }
}

/// Orders `structs` so that dependencies come before their dependents.
///
/// Structs that neither use nor are used by another struct keep their
/// relative order and come after the ones that do.
pub fn topo_sort(structs: &[StructDef]) -> Result<Vec<&StructDef>> {
    let index_of: HashMap<String, usize> = structs
        .iter()
        .enumerate()
        .map(|(idx, s)| (s.name.to_lowercase(), idx))
        .collect();

    let mut nodes: Vec<usize> = Vec::new();
    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for (from, def) in structs.iter().enumerate() {
        for field_type in def.field_types() {
            let Some(&to) = index_of.get(&field_type.to_lowercase()) else {
                continue;
            };
            for node in [from, to] {
                if !nodes.contains(&node) {
                    nodes.push(node);
                }
            }
            let edges = outgoing.entry(from).or_default();
            if !edges.contains(&to) {
                edges.push(to);
            }
        }
    }

    let mut sorter = DependencySorter {
        structs,
        outgoing,
        visited: HashSet::new(),
        path: HashSet::new(),
        finished: Vec::with_capacity(nodes.len()),
    };
    for &node in nodes.iter().rev() {
        sorter.visit(node)?;
    }

    let participating: HashSet<usize> = nodes.iter().copied().collect();
    Ok(sorter
        .finished
        .iter()
        .map(|&idx| &structs[idx])
        .chain(
            structs
                .iter()
                .enumerate()
                .filter(|(idx, _)| !participating.contains(idx))
                .map(|(_, s)| s),
        )
        .collect())
}
