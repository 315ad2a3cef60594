//! Flat authorized list -> route forest.

use std::collections::{HashMap, HashSet};

use crate::descriptor::{RouteDescriptor, RouteTree, join_path};
use crate::error::RouteInitError;

/// Build the route forest for a flat descriptor list.
///
/// Linkage rules:
/// - an explicit `parent` must name another descriptor in the list;
/// - otherwise an absolute path is nested under the descriptor whose path is
///   its longest proper segment prefix (`/system/users` under `/system`);
/// - everything else is a root. Root paths are made absolute.
///
/// Roots and siblings keep list order. Descriptors that do not say otherwise
/// require authentication.
pub fn build_forest(descriptors: &[RouteDescriptor]) -> Result<Vec<RouteTree>, RouteInitError> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(descriptors.len());
    for (i, d) in descriptors.iter().enumerate() {
        if index.insert(d.name.as_str(), i).is_some() {
            return Err(RouteInitError::DuplicateName(d.name.clone()));
        }
    }

    let parents = link_parents(descriptors, &index)?;
    detect_cycles(descriptors, &parents)?;

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); descriptors.len()];
    let mut roots = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    Ok(roots
        .into_iter()
        .map(|i| {
            let mut tree = assemble(descriptors, &children, i);
            tree.descriptor.path = join_path(None, &tree.descriptor.path);
            tree
        })
        .collect())
}

fn link_parents(
    descriptors: &[RouteDescriptor],
    index: &HashMap<&str, usize>,
) -> Result<Vec<Option<usize>>, RouteInitError> {
    // Only descriptors without an explicit parent take part in path inference;
    // their full path is known without walking the tree.
    let candidates: Vec<(usize, Vec<&str>)> = descriptors
        .iter()
        .enumerate()
        .filter(|(_, d)| d.parent.is_none())
        .map(|(i, d)| (i, segments(&d.path)))
        .filter(|(_, segs)| !segs.is_empty())
        .collect();

    descriptors
        .iter()
        .enumerate()
        .map(|(i, d)| {
            if let Some(parent) = &d.parent {
                return match index.get(parent.as_str()) {
                    Some(&p) if p == i => Err(RouteInitError::Cycle(d.name.clone())),
                    Some(&p) => Ok(Some(p)),
                    None => Err(RouteInitError::MissingParent {
                        name: d.name.clone(),
                        parent: parent.clone(),
                    }),
                };
            }
            if !d.path.starts_with('/') {
                return Ok(None);
            }

            let own = segments(&d.path);
            Ok(candidates
                .iter()
                .filter(|(j, segs)| *j != i && segs.len() < own.len() && own.starts_with(segs))
                .max_by_key(|(_, segs)| segs.len())
                .map(|(j, _)| *j))
        })
        .collect()
}

fn detect_cycles(descriptors: &[RouteDescriptor], parents: &[Option<usize>]) -> Result<(), RouteInitError> {
    for start in 0..descriptors.len() {
        let mut seen = HashSet::new();
        let mut cursor = Some(start);
        while let Some(i) = cursor {
            if !seen.insert(i) {
                return Err(RouteInitError::Cycle(descriptors[start].name.clone()));
            }
            cursor = parents[i];
        }
    }
    Ok(())
}

fn assemble(descriptors: &[RouteDescriptor], children: &[Vec<usize>], i: usize) -> RouteTree {
    let mut descriptor = descriptors[i].clone();
    descriptor.parent = None;
    descriptor.meta.requires_auth.get_or_insert(true);
    RouteTree::with_children(
        descriptor,
        children[i].iter().map(|&c| assemble(descriptors, children, c)).collect(),
    )
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Names of keep-alive routes, first occurrence wins.
pub fn cache_routes(descriptors: &[RouteDescriptor]) -> Vec<String> {
    let mut seen = HashSet::new();
    descriptors
        .iter()
        .filter(|d| d.meta.is_keep_alive())
        .filter(|d| seen.insert(d.name.as_str()))
        .map(|d| d.name.clone())
        .collect()
}
