//! Dependency graph planning.
//!
//! Turns the registered descriptors into an initialization plan: a list
//! of stages where every component's dependencies live in strictly
//! earlier stages. Components within one stage are mutually independent,
//! which is what lets the scope run their `init` hooks concurrently.
//!
//! Planning fails fast: unknown dependency ids and cycles are reported
//! before any factory runs, so a bad graph never half-starts.

use std::collections::HashMap;

use crate::error::RuntimeError;

/// One registered component's edges, in registration order.
pub(crate) struct GraphEntry {
    pub id: String,
    pub deps: Vec<String>,
}

/// Computes the staged initialization plan.
///
/// Stage `n` holds every component whose longest dependency chain has
/// length `n`. Within a stage, registration order is preserved.
///
/// # Errors
///
/// - [`RuntimeError::UnknownComponent`] for a declared dep that matches
///   no entry.
/// - [`RuntimeError::CyclicDependency`] carrying the cycle path, first
///   id repeated at the end.
pub(crate) fn plan(entries: &[GraphEntry]) -> Result<Vec<Vec<String>>, RuntimeError> {
    let index: HashMap<&str, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.id.as_str(), i))
        .collect();

    for entry in entries {
        for dep in &entry.deps {
            if !index.contains_key(dep.as_str()) {
                return Err(RuntimeError::UnknownComponent(dep.clone()));
            }
        }
    }

    let mut depths: Vec<Option<usize>> = vec![None; entries.len()];
    let mut on_stack: Vec<bool> = vec![false; entries.len()];
    let mut path: Vec<usize> = Vec::new();

    for i in 0..entries.len() {
        depth_of(i, entries, &index, &mut depths, &mut on_stack, &mut path)?;
    }

    let max_depth = depths.iter().flatten().copied().max().unwrap_or(0);
    let mut stages: Vec<Vec<String>> = vec![Vec::new(); if entries.is_empty() { 0 } else { max_depth + 1 }];
    for (i, entry) in entries.iter().enumerate() {
        if let Some(depth) = depths[i] {
            stages[depth].push(entry.id.clone());
        }
    }
    Ok(stages)
}

/// Longest-chain depth of `node`, memoized. The explicit recursion path
/// is what lets a detected cycle report the ids along it.
fn depth_of(
    node: usize,
    entries: &[GraphEntry],
    index: &HashMap<&str, usize>,
    depths: &mut Vec<Option<usize>>,
    on_stack: &mut Vec<bool>,
    path: &mut Vec<usize>,
) -> Result<usize, RuntimeError> {
    if let Some(depth) = depths[node] {
        return Ok(depth);
    }
    if on_stack[node] {
        let start = path
            .iter()
            .position(|&n| n == node)
            .unwrap_or(0);
        let mut cycle: Vec<String> = path[start..]
            .iter()
            .map(|&n| entries[n].id.clone())
            .collect();
        cycle.push(entries[node].id.clone());
        return Err(RuntimeError::CyclicDependency { cycle });
    }

    on_stack[node] = true;
    path.push(node);

    let mut depth = 0;
    for dep in &entries[node].deps {
        // Validated above, every dep id resolves.
        if let Some(&dep_node) = index.get(dep.as_str()) {
            let dep_depth = depth_of(dep_node, entries, index, depths, on_stack, path)?;
            depth = depth.max(dep_depth + 1);
        }
    }

    path.pop();
    on_stack[node] = false;
    depths[node] = Some(depth);
    Ok(depth)
}
