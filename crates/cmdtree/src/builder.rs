//! Fluent configuration of command nodes.
//!
//! A [`CommandBuilder`] is a handle on one node of a [`CommandTree`]. Every
//! configuration method mutates that node and returns the same handle, so
//! calls chain:
//!
//! ```rust
//! use cmdtree::{CommandTree, Handler};
//!
//! let mut tree = CommandTree::new("app");
//! let mut root = tree.root();
//! root.help("Example command")
//!     .flags(|f| {
//!         f.bool("verbose", false, "Enable verbose output")?;
//!         Ok(())
//!     })?;
//!
//! root.sub_command("echo")?
//!     .help("Print the arguments")
//!     .action(|_ctx, _flags, args| {
//!         println!("{}", args.join(" "));
//!         Ok(())
//!     })
//!     .flags(|f| {
//!         f.string("case", "", "Case to use (upper, lower)")?;
//!         Ok(())
//!     })?;
//! # Ok::<(), cmdtree::SetupError>(())
//! ```
//!
//! Nested groups keep a handle per level:
//!
//! ```rust
//! use cmdtree::CommandTree;
//!
//! let mut tree = CommandTree::new("gh");
//! let mut root = tree.root();
//! let mut repos = root.sub_command("repos")?;
//! repos.help("Manage GitHub repositories");
//! repos
//!     .sub_command("list")?
//!     .help("List repositories of a GitHub user")
//!     .action(|_, _, _| Ok(()));
//! # Ok::<(), cmdtree::SetupError>(())
//! ```

use crate::context::Context;
use crate::error::SetupError;
use crate::flags::FlagSet;
use crate::handler::{Handler, HandlerResult, Middleware};
use crate::tree::{CommandTree, NodeId};

/// Mutable handle on one node of a [`CommandTree`].
pub struct CommandBuilder<'a> {
    tree: &'a mut CommandTree,
    id: NodeId,
}

impl<'a> CommandBuilder<'a> {
    pub(crate) fn new(tree: &'a mut CommandTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    /// The node being configured.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Adds a child node and returns a handle on it.
    ///
    /// Fails with [`SetupError::DuplicateCommand`] if this node already has a
    /// child named `name`.
    pub fn sub_command(&mut self, name: &str) -> Result<CommandBuilder<'_>, SetupError> {
        if self.tree.node(self.id).child(name).is_some() {
            let mut path = self.tree.path(self.id);
            path.push(name.to_string());
            return Err(SetupError::DuplicateCommand(path.join(" ")));
        }

        let child = self.tree.push(name, self.id);
        Ok(CommandBuilder::new(self.tree, child))
    }

    /// Declares this node's own flags. `declare` runs once, immediately.
    pub fn flags<F>(&mut self, declare: F) -> Result<&mut Self, SetupError>
    where
        F: FnOnce(&mut FlagSet) -> Result<(), SetupError>,
    {
        declare(&mut self.tree.node_mut(self.id).flags)?;
        Ok(self)
    }

    /// Appends one middleware, applied to this node and all descendants.
    pub fn middleware<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Handler) -> Handler + 'static,
    {
        self.middlewares([Middleware::new(f)])
    }

    /// Appends middleware in order.
    pub fn middlewares<I>(&mut self, middlewares: I) -> &mut Self
    where
        I: IntoIterator<Item = Middleware>,
    {
        self.tree
            .node_mut(self.id)
            .middlewares
            .extend(middlewares);
        self
    }

    /// Sets the action run when dispatch stops at this node.
    pub fn action<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Context, &FlagSet, &[String]) -> HandlerResult + 'static,
    {
        self.handler(Handler::new(f))
    }

    /// Same as [`action`](Self::action) for an already built [`Handler`].
    pub fn handler(&mut self, handler: Handler) -> &mut Self {
        self.tree.node_mut(self.id).handler = Some(handler);
        self
    }

    /// Sets the descriptive text shown in usage.
    pub fn help(&mut self, text: impl Into<String>) -> &mut Self {
        self.tree.node_mut(self.id).help = Some(text.into());
        self
    }
}
