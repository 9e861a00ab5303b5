//! Resource tree entities
//!
//! Models files and directories, either scanned from the local filesystem or
//! reported by the device's browse call. The tree owns all of its nodes in a
//! flat arena (`Vec<ResourceNode>`) and links them by index; ancestor lookup
//! is a walk over parent indices. There is no back-reference bookkeeping and
//! no way to build a cycle.
//!
//! The file-vs-directory invariant is enforced structurally: byte-content
//! attributes only exist on [`ResourceKind::File`], children can only be
//! attached to [`ResourceKind::Directory`] nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::ResourcePath;

// ============================================================================
// Node attributes
// ============================================================================

/// Visibility of a resource on the device's web server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Served without authentication
    #[default]
    Public,
    /// Served only to authenticated sessions
    Protected,
}

/// Attributes carried by file nodes only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttrs {
    /// File size in bytes
    pub size: u64,
    /// Last modification timestamp
    pub last_modified: DateTime<Utc>,
    /// Content identity reported by the device (etag), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Media type served for this resource (e.g. `text/html`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Whether the resource is publicly served or protected
    #[serde(default)]
    pub visibility: Visibility,
}

impl FileAttrs {
    /// Minimal attributes: size and modification time
    #[must_use]
    pub fn new(size: u64, last_modified: DateTime<Utc>) -> Self {
        Self {
            size,
            last_modified,
            etag: None,
            media_type: None,
            visibility: Visibility::default(),
        }
    }

    /// Content equality: size, modification time, and etag when both sides
    /// report one. A missing etag on either side falls back to size + mtime.
    #[must_use]
    pub fn content_equal(&self, other: &FileAttrs) -> bool {
        if self.size != other.size || self.last_modified != other.last_modified {
            return false;
        }
        match (&self.etag, &other.etag) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

/// Discriminates file and directory nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResourceKind {
    /// A leaf carrying byte content
    File(FileAttrs),
    /// An inner node carrying children
    Directory,
}

impl ResourceKind {
    /// Whether this is a directory node
    #[must_use]
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Size in bytes for files, 0 for directories (used for diff ordering)
    #[must_use]
    pub fn size(&self) -> u64 {
        match self {
            Self::File(attrs) => attrs.size,
            Self::Directory => 0,
        }
    }
}

// ============================================================================
// Arena tree
// ============================================================================

/// Index of a node within its owning [`ResourceTree`]
///
/// Indices are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIndex(usize);

/// A single file or directory node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Node name (single path segment, no separators)
    pub name: String,
    /// File attributes or directory marker
    pub kind: ResourceKind,
    /// Owning parent, `None` for the root
    parent: Option<NodeIndex>,
    /// Child indices (directories only)
    children: Vec<NodeIndex>,
}

impl ResourceNode {
    /// Whether this node is a directory
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    /// File attributes, `None` for directories
    #[must_use]
    pub fn file_attrs(&self) -> Option<&FileAttrs> {
        match &self.kind {
            ResourceKind::File(attrs) => Some(attrs),
            ResourceKind::Directory => None,
        }
    }
}

/// A rooted tree of resources stored in a flat arena
///
/// The root is always a directory; it represents the application root and
/// does not appear in any [`ResourcePath`] produced from the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTree {
    nodes: Vec<ResourceNode>,
    root: NodeIndex,
}

impl ResourceTree {
    /// Create a tree containing only a directory root named `root_name`
    #[must_use]
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = ResourceNode {
            name: root_name.into(),
            kind: ResourceKind::Directory,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeIndex(0),
        }
    }

    /// Index of the root node
    #[must_use]
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Borrow a node by index
    ///
    /// # Panics
    /// Panics if the index came from a different tree and is out of range.
    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> &ResourceNode {
        &self.nodes[idx.0]
    }

    /// Total number of nodes, including the root
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root exists
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Child indices of a node (empty for files)
    #[must_use]
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        &self.nodes[idx.0].children
    }

    /// Parent of a node, `None` for the root
    #[must_use]
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.nodes[idx.0].parent
    }

    /// Walk from a node's parent up to the root
    pub fn ancestors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(self.parent(idx), |&i| self.parent(i))
    }

    /// Attach a directory child under `parent`
    pub fn add_directory(
        &mut self,
        parent: NodeIndex,
        name: impl Into<String>,
    ) -> Result<NodeIndex, DomainError> {
        self.add_node(parent, name.into(), ResourceKind::Directory)
    }

    /// Attach a file child under `parent`
    pub fn add_file(
        &mut self,
        parent: NodeIndex,
        name: impl Into<String>,
        attrs: FileAttrs,
    ) -> Result<NodeIndex, DomainError> {
        self.add_node(parent, name.into(), ResourceKind::File(attrs))
    }

    fn add_node(
        &mut self,
        parent: NodeIndex,
        name: String,
        kind: ResourceKind,
    ) -> Result<NodeIndex, DomainError> {
        if !self.nodes[parent.0].is_directory() {
            return Err(DomainError::MixedResourceKind(format!(
                "cannot attach {name:?} to file node {:?}",
                self.nodes[parent.0].name
            )));
        }
        if name.contains('/') || name.is_empty() {
            return Err(DomainError::InvalidResourcePath(format!(
                "node name must be a single segment: {name:?}"
            )));
        }
        if self.child_by_name(parent, &name).is_some() {
            return Err(DomainError::ValidationFailed(format!(
                "duplicate child name {name:?} under {:?}",
                self.nodes[parent.0].name
            )));
        }
        let idx = NodeIndex(self.nodes.len());
        self.nodes.push(ResourceNode {
            name,
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(idx);
        Ok(idx)
    }

    /// Find a direct child of `parent` by name
    #[must_use]
    pub fn child_by_name(&self, parent: NodeIndex, name: &str) -> Option<NodeIndex> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].name == name)
    }

    /// Resolve a path (relative to the root) to a node index
    #[must_use]
    pub fn find(&self, path: &ResourcePath) -> Option<NodeIndex> {
        let mut current = self.root;
        for segment in path.segments() {
            current = self.child_by_name(current, segment)?;
        }
        Some(current)
    }

    /// Path of a node relative to the root, `None` for the root itself
    #[must_use]
    pub fn path_of(&self, idx: NodeIndex) -> Option<ResourcePath> {
        if idx == self.root {
            return None;
        }
        let mut segments = vec![self.nodes[idx.0].name.as_str()];
        for ancestor in self.ancestors(idx) {
            if ancestor == self.root {
                break;
            }
            segments.push(self.nodes[ancestor.0].name.as_str());
        }
        segments.reverse();
        // Segments were validated at insertion, joining them is always valid
        ResourcePath::new(segments.join("/")).ok()
    }

    /// Depth-first walk over all nodes below the root, yielding
    /// `(index, path)` pairs in deterministic (insertion) order
    #[must_use]
    pub fn walk(&self) -> Vec<(NodeIndex, ResourcePath)> {
        let mut out = Vec::with_capacity(self.nodes.len().saturating_sub(1));
        let mut stack: Vec<NodeIndex> = self.children(self.root).to_vec();
        stack.reverse();
        while let Some(idx) = stack.pop() {
            if let Some(path) = self.path_of(idx) {
                out.push((idx, path));
            }
            let mut kids = self.children(idx).to_vec();
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// Semantic equality against another tree
    ///
    /// Compares every node's name, kind and file attributes recursively.
    /// Children are compared as unordered name-keyed sets, so two trees that
    /// only differ in child ordering are equal. Root names are not compared;
    /// the root is an anchor, not content.
    #[must_use]
    pub fn semantically_equal(&self, other: &ResourceTree) -> bool {
        self.subtrees_equal(self.root, other, other.root)
    }

    fn subtrees_equal(&self, a: NodeIndex, other: &ResourceTree, b: NodeIndex) -> bool {
        let node_a = self.node(a);
        let node_b = other.node(b);
        match (&node_a.kind, &node_b.kind) {
            (ResourceKind::File(attrs_a), ResourceKind::File(attrs_b)) => {
                attrs_a.content_equal(attrs_b)
            }
            (ResourceKind::Directory, ResourceKind::Directory) => {
                if node_a.children.len() != node_b.children.len() {
                    return false;
                }
                self.children(a).iter().all(|&child_a| {
                    let name = &self.node(child_a).name;
                    match other.child_by_name(b, name) {
                        Some(child_b) => self.subtrees_equal(child_a, other, child_b),
                        None => false,
                    }
                })
            }
            _ => false,
        }
    }
}
