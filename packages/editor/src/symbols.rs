//! # Symbol Registry
//!
//! Global components (masters) and their page-local instances.
//!
//! An instance is a snapshot: it is cloned from the master when it is
//! created or promoted and is never updated by later master edits. The
//! link (`is_global_instance` + `global_component_id`) only records where
//! it came from, so deleting a master has to detach every instance left
//! behind on every page.

use crate::id_generator::IdAllocator;
use crate::mutations::MutationError;
use crate::node::{ComponentNode, GlobalComponent, Project};
use crate::tree;

/// Instances of one master, for confirmation prompts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceCount {
    pub total: usize,
    /// (page id, instances on that page), pages without instances omitted
    pub per_page: Vec<(String, usize)>,
    /// Instances nested inside other masters' definitions
    pub in_masters: usize,
}

/// What a cascading master deletion did
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeReport {
    pub global_component_id: String,
    /// Number of instances detached across the whole project
    pub detached: usize,
    pub per_page: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MasterSummary {
    pub id: String,
    pub name: String,
    pub node_type: String,
    pub instances: usize,
}

fn for_each_node_mut(nodes: &mut [ComponentNode], f: &mut impl FnMut(&mut ComponentNode)) {
    for node in nodes {
        f(node);
        for_each_node_mut(&mut node.children, f);
    }
}

fn count_in(nodes: &[ComponentNode], master_id: &str) -> usize {
    nodes
        .iter()
        .map(|node| usize::from(node.instance_of() == Some(master_id)) + count_in(&node.children, master_id))
        .sum()
}

/// Turn a node into the first instance of a new master
///
/// The master gets a copy of the node's subtree with fresh ids; the node
/// keeps its own id and position and becomes linked to the master.
pub fn promote(
    project: &mut Project,
    node_id: &str,
    name: &str,
    ids: &mut IdAllocator,
) -> Result<String, MutationError> {
    let page = project
        .pages
        .iter_mut()
        .find(|page| tree::contains(&page.tree, node_id))
        .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;
    let node = tree::find_node_mut(&mut page.tree, node_id)
        .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;

    let master_id = ids.next_id();
    let master = GlobalComponent {
        id: master_id.clone(),
        name: name.to_string(),
        node_type: node.node_type.clone(),
        props: node.props.clone(),
        children: node
            .children
            .iter()
            .map(|child| tree::clone_with_fresh_ids(child, ids))
            .collect(),
    };
    node.link_to_master(master_id.clone());
    project.global_components.push(master);

    tracing::info!("promoted {} to global component {} ({})", node_id, master_id, name);
    Ok(master_id)
}

/// Fresh-id clone of a master, linked back to it
pub fn instantiate_master(
    project: &Project,
    global_component_id: &str,
    ids: &mut IdAllocator,
) -> Result<ComponentNode, MutationError> {
    let master = project
        .global_component(global_component_id)
        .ok_or_else(|| MutationError::GlobalComponentNotFound(global_component_id.to_string()))?;

    let mut root = ComponentNode::new(ids.next_id(), master.node_type.clone()).with_name(master.name.clone());
    root.props = master.props.clone();
    root.children = master
        .children
        .iter()
        .map(|child| tree::clone_with_fresh_ids(child, ids))
        .collect();
    root.link_to_master(global_component_id);
    Ok(root)
}

/// Make an instance an ordinary node, keeping its props and children
///
/// Like `promote`, the node may sit on any page of the project.
pub fn detach(project: &mut Project, node_id: &str) -> Result<(), MutationError> {
    let node = project
        .pages
        .iter_mut()
        .find_map(|page| tree::find_node_mut(&mut page.tree, node_id))
        .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;
    if !node.is_global_instance && node.global_component_id.is_none() {
        return Err(MutationError::Unchanged);
    }
    node.unlink_from_master();
    Ok(())
}

pub fn count_instances(project: &Project, global_component_id: &str) -> InstanceCount {
    let mut count = InstanceCount::default();
    for page in &project.pages {
        let n = count_in(&page.tree, global_component_id);
        if n > 0 {
            count.per_page.push((page.id.clone(), n));
            count.total += n;
        }
    }
    for master in &project.global_components {
        count.in_masters += count_in(&master.children, global_component_id);
    }
    count.total += count.in_masters;
    count
}

/// Detach every instance of a master on every page, then remove the master
///
/// The new pages and masters are computed on copies and swapped in at the
/// end, so a failure leaves the project exactly as it was.
pub fn delete_master(project: &mut Project, global_component_id: &str) -> Result<CascadeReport, MutationError> {
    let position = project
        .global_components
        .iter()
        .position(|g| g.id == global_component_id)
        .ok_or_else(|| MutationError::GlobalComponentNotFound(global_component_id.to_string()))?;

    let mut pages = project.pages.clone();
    let mut masters = project.global_components.clone();
    let mut per_page = Vec::new();
    let mut detached = 0;

    let unlink = |node: &mut ComponentNode, counter: &mut usize| {
        if node.instance_of() == Some(global_component_id) {
            node.unlink_from_master();
            *counter += 1;
        }
    };

    for page in &mut pages {
        let mut on_page = 0;
        for_each_node_mut(&mut page.tree, &mut |node| unlink(node, &mut on_page));
        if on_page > 0 {
            per_page.push((page.id.clone(), on_page));
            detached += on_page;
        }
    }

    masters.remove(position);
    for master in &mut masters {
        for_each_node_mut(&mut master.children, &mut |node| unlink(node, &mut detached));
    }

    project.pages = pages;
    project.global_components = masters;

    tracing::info!(
        "deleted global component {}, detached {} instance(s)",
        global_component_id,
        detached
    );
    Ok(CascadeReport {
        global_component_id: global_component_id.to_string(),
        detached,
        per_page,
    })
}

pub fn rename_master(project: &mut Project, global_component_id: &str, name: &str) -> Result<(), MutationError> {
    let master = project
        .global_components
        .iter_mut()
        .find(|g| g.id == global_component_id)
        .ok_or_else(|| MutationError::GlobalComponentNotFound(global_component_id.to_string()))?;
    if master.name == name {
        return Err(MutationError::Unchanged);
    }
    master.name = name.to_string();
    Ok(())
}

pub fn list_masters(project: &Project) -> Vec<MasterSummary> {
    project
        .global_components
        .iter()
        .map(|master| MasterSummary {
            id: master.id.clone(),
            name: master.name.clone(),
            node_type: master.node_type.clone(),
            instances: count_instances(project, &master.id).total,
        })
        .collect()
}

/// Clear instance flags whose master is missing; returns how many changed
pub fn normalize_instances(project: &mut Project) -> usize {
    let known: Vec<String> = project.global_components.iter().map(|g| g.id.clone()).collect();
    let mut repaired = 0;
    let mut repair = |node: &mut ComponentNode| {
        if node.is_global_instance {
            let live = node
                .global_component_id
                .as_ref()
                .map(|id| known.contains(id))
                .unwrap_or(false);
            if !live {
                tracing::warn!("node {} referenced a missing global component, detaching", node.id);
                node.unlink_from_master();
                repaired += 1;
            }
        }
    };

    for page in &mut project.pages {
        for_each_node_mut(&mut page.tree, &mut repair);
    }
    for master in &mut project.global_components {
        for_each_node_mut(&mut master.children, &mut repair);
    }
    repaired
}
