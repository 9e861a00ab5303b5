//! Resource tree diffing
//!
//! Pure set-difference between a desired and an observed tree, producing
//! the [`SyncPlan`] the synchronizer applies. Children are matched by name
//! with set semantics: a device that returns children in a different order
//! never causes a false mismatch. Ordering by (kind, size, name) is used
//! only to make traversal, and therefore plan output, deterministic.
//!
//! Files are replaced wholesale on any difference; the device has no
//! partial-file update primitive, so there is nothing to patch in place.
//! A node whose kind flipped (file became directory or vice versa) shows
//! up as a delete of the observed subtree plus an add of the desired one.

use s7web_core::domain::newtypes::ResourcePath;
use s7web_core::domain::plan::SyncPlan;
use s7web_core::domain::resource::{NodeIndex, ResourceKind, ResourceTree};

/// Computes the plan that turns `observed` into `desired`
///
/// `diff(t, t)` is empty for any tree compared to a structurally identical
/// copy. Plan vectors are sorted lexicographically, which places every
/// parent before its descendants.
#[must_use]
pub fn diff(desired: &ResourceTree, observed: &ResourceTree) -> SyncPlan {
    let mut plan = SyncPlan::empty();
    diff_children(desired, desired.root(), observed, observed.root(), &mut plan);
    plan.to_add.sort();
    plan.to_update.sort();
    plan.to_delete.sort();
    plan
}

/// Produces the all-add plan used on first deployment, when the observed
/// root does not exist on the device.
#[must_use]
pub fn plan_fresh_deploy(desired: &ResourceTree) -> SyncPlan {
    let mut plan = SyncPlan::empty();
    plan.to_add = desired.walk().into_iter().map(|(_, path)| path).collect();
    plan.to_add.sort();
    plan
}

fn diff_children(
    desired: &ResourceTree,
    d_idx: NodeIndex,
    observed: &ResourceTree,
    o_idx: NodeIndex,
    plan: &mut SyncPlan,
) {
    for &d_child in &ordered_children(desired, d_idx) {
        let name = &desired.node(d_child).name;
        match observed.child_by_name(o_idx, name) {
            None => add_subtree(desired, d_child, plan),
            Some(o_child) => {
                let d_node = desired.node(d_child);
                let o_node = observed.node(o_child);
                match (&d_node.kind, &o_node.kind) {
                    (ResourceKind::Directory, ResourceKind::Directory) => {
                        diff_children(desired, d_child, observed, o_child, plan);
                    }
                    (ResourceKind::File(d_attrs), ResourceKind::File(o_attrs)) => {
                        if !d_attrs.content_equal(o_attrs) {
                            if let Some(path) = desired.path_of(d_child) {
                                plan.to_update.push(path);
                            }
                        }
                    }
                    // Kind flipped: tear down the observed subtree, then
                    // recreate from desired
                    _ => {
                        delete_subtree(observed, o_child, plan);
                        add_subtree(desired, d_child, plan);
                    }
                }
            }
        }
    }

    for &o_child in &ordered_children(observed, o_idx) {
        let name = &observed.node(o_child).name;
        if desired.child_by_name(d_idx, name).is_none() {
            delete_subtree(observed, o_child, plan);
        }
    }
}

fn add_subtree(tree: &ResourceTree, idx: NodeIndex, plan: &mut SyncPlan) {
    if let Some(path) = tree.path_of(idx) {
        plan.to_add.push(path);
    }
    for &child in tree.children(idx) {
        add_subtree(tree, child, plan);
    }
}

fn delete_subtree(tree: &ResourceTree, idx: NodeIndex, plan: &mut SyncPlan) {
    if let Some(path) = tree.path_of(idx) {
        plan.to_delete.push(path);
    }
    for &child in tree.children(idx) {
        delete_subtree(tree, child, plan);
    }
}

/// Children ordered by (kind, size, name): directories first, then by
/// size ascending, ties broken by name
fn ordered_children(tree: &ResourceTree, idx: NodeIndex) -> Vec<NodeIndex> {
    let mut children = tree.children(idx).to_vec();
    children.sort_by(|&a, &b| {
        let node_a = tree.node(a);
        let node_b = tree.node(b);
        node_b
            .is_directory()
            .cmp(&node_a.is_directory())
            .then(node_a.kind.size().cmp(&node_b.kind.size()))
            .then(node_a.name.cmp(&node_b.name))
    });
    children
}
