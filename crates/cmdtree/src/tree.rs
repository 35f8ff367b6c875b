//! The command tree.
//!
//! Nodes live in an arena owned by [`CommandTree`] and refer to each other by
//! [`NodeId`]. A node's children map owns the downward edges; the parent link
//! is an id used only to walk back up (usage paths, error messages).

use std::collections::BTreeMap;

use crate::builder::CommandBuilder;
use crate::flags::FlagSet;
use crate::handler::{Handler, Middleware};

/// Index of a node in its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One command or subcommand.
#[derive(Debug)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) help: Option<String>,
    pub(crate) middlewares: Vec<Middleware>,
    pub(crate) handler: Option<Handler>,
    pub(crate) children: BTreeMap<String, NodeId>,
    pub(crate) flags: FlagSet,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            help: None,
            middlewares: Vec::new(),
            handler: None,
            children: BTreeMap::new(),
            flags: FlagSet::new(name),
            parent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    /// Returns true if the node has no handler and only groups subcommands.
    pub fn is_router(&self) -> bool {
        self.handler.is_none()
    }

    /// Locally declared flags. Inherited flags are merged in only at dispatch.
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    /// Children sorted by name.
    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.children.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A tree of commands rooted at the program itself.
///
/// Build it once with [`root`](Self::root) and the returned
/// [`CommandBuilder`], then dispatch with
/// [`execute`](Self::execute).
#[derive(Debug)]
pub struct CommandTree {
    nodes: Vec<Node>,
}

impl CommandTree {
    /// Creates a tree whose root is called `name` (normally the program name).
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            nodes: vec![Node::new(name.as_ref(), None)],
        }
    }

    /// Creates a tree whose root is named after the running executable.
    pub fn from_env() -> Self {
        let name = std::env::args_os()
            .next()
            .as_deref()
            .and_then(|arg0| std::path::Path::new(arg0).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string());
        Self::new(name)
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    /// Builder handle for the root node.
    pub fn root(&mut self) -> CommandBuilder<'_> {
        let id = self.root_id();
        CommandBuilder::new(self, id)
    }

    /// Builder handle for any node.
    pub fn builder(&mut self, id: NodeId) -> CommandBuilder<'_> {
        CommandBuilder::new(self, id)
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub(crate) fn push(&mut self, name: &str, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name, Some(parent)));
        self.node_mut(parent).children.insert(name.to_string(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Names from the root down to `id`, root included.
    pub fn path(&self, id: NodeId) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.node(id);
            path.push(node.name.clone());
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// Follows child names from the root. An empty path finds the root.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        path.iter().try_fold(self.root_id(), |id, name| {
            self.node(id).child(name.as_ref())
        })
    }
}
