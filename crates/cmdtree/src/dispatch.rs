//! Dispatch engine.
//!
//! Walks the command tree along the positional tokens of the command line,
//! parsing each node's flags on the way, then runs the resolved node's action
//! inside the accumulated middleware.
//!
//! # Algorithm
//!
//! ```text
//! node = root, flags = root flags, chain = root middleware
//! loop:
//!     rest = flags.parse(args)
//!     rest empty, or rest[0] not a child of node → stop
//!     child flags = child's own flags + every flag in `flags` not declared by the child
//!     chain += child middleware
//!     node = child, args = rest[1..]
//! ```
//!
//! Flags therefore flow down the path actually taken: a root flag can be given
//! after any subcommand name, while sibling subcommands never see each other's
//! flags.

use crate::context::{CommandPath, Context};
use crate::error::DispatchError;
use crate::flags::FlagSet;
use crate::handler::{compose, Middleware};
use crate::tree::{CommandTree, NodeId};
use crate::usage;

/// Outcome of walking the tree, before anything is invoked.
#[derive(Debug)]
pub struct Resolution<'t> {
    tree: &'t CommandTree,
    node: NodeId,
    flags: FlagSet,
    middlewares: Vec<Middleware>,
}

impl<'t> Resolution<'t> {
    /// The resolved node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Names from the root down to the resolved node, root excluded.
    pub fn command_path(&self) -> Vec<String> {
        self.tree.path(self.node).into_iter().skip(1).collect()
    }

    /// Effective flags: the resolved node's own plus those inherited along the path.
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    /// Residual positional arguments.
    pub fn args(&self) -> &[String] {
        self.flags.args()
    }

    /// Middleware collected along the path, root first.
    pub fn middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }

    /// Usage of the resolved node with its effective flags.
    pub fn usage(&self) -> String {
        usage::render(self.tree, self.node, &self.flags)
    }

    /// Runs the resolved node's action inside the middleware chain.
    ///
    /// Router nodes fail with [`DispatchError::UnknownCommand`] when
    /// positional arguments are left, [`DispatchError::MissingCommand`]
    /// otherwise.
    pub fn invoke(&self, ctx: &Context) -> Result<(), DispatchError> {
        let node = self.tree.node(self.node);
        let Some(handler) = node.handler() else {
            return Err(match self.args().first() {
                Some(name) => DispatchError::UnknownCommand {
                    name: name.clone(),
                    usage: self.usage(),
                },
                None => DispatchError::MissingCommand {
                    usage: self.usage(),
                },
            });
        };

        let handler = compose(handler.clone(), &self.middlewares);
        let ctx = ctx.with_value(CommandPath(self.command_path()));
        handler
            .call(&ctx, &self.flags, self.args())
            .map_err(DispatchError::Handler)
    }
}

impl CommandTree {
    /// Walks the tree along `args` (program name excluded) without invoking
    /// anything.
    pub fn resolve<I, S>(&self, args: I) -> Result<Resolution<'_>, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut id = self.root_id();
        let root = self.node(id);
        let mut flags = root.flags.clone();
        let mut middlewares = root.middlewares.clone();
        let mut args: Vec<String> = args.into_iter().map(Into::into).collect();

        loop {
            let parsed = flags.parse(args).map(|_| ());
            if let Err(source) = parsed {
                return Err(DispatchError::Flag {
                    source,
                    usage: usage::render(self, id, &flags),
                });
            }

            let Some(child) = flags
                .args()
                .first()
                .and_then(|token| self.node(id).child(token))
            else {
                break;
            };

            let node = self.node(child);
            tracing::trace!(command = %node.name, "descending into subcommand");

            let mut child_flags = node.flags.clone();
            child_flags.inherit(&flags);
            middlewares.extend(node.middlewares.iter().cloned());
            args = flags.args()[1..].to_vec();
            flags = child_flags;
            id = child;
        }

        let resolution = Resolution {
            tree: self,
            node: id,
            flags,
            middlewares,
        };
        tracing::debug!(
            command = %resolution.command_path().join(" "),
            args = resolution.args().len(),
            middlewares = resolution.middlewares.len(),
            "resolved command"
        );
        Ok(resolution)
    }

    /// Resolves `args` and invokes the resolved node.
    ///
    /// Handler errors are returned unchanged inside
    /// [`DispatchError::Handler`]; nothing is printed.
    pub fn execute<I, S>(&self, ctx: &Context, args: I) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolve(args)?.invoke(ctx)
    }

    /// [`execute`](Self::execute) with the process arguments.
    pub fn execute_env(&self, ctx: &Context) -> Result<(), DispatchError> {
        self.execute(ctx, std::env::args().skip(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlagError;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Calls = Rc<RefCell<Vec<(String, Vec<String>)>>>;

    fn record(calls: &Calls, name: &'static str) -> impl Fn(&Context, &FlagSet, &[String]) -> crate::HandlerResult {
        let calls = Rc::clone(calls);
        move |_, _, args| {
            calls.borrow_mut().push((name.to_string(), args.to_vec()));
            Ok(())
        }
    }

    fn tree(calls: &Calls) -> CommandTree {
        let mut tree = CommandTree::new("app");
        let mut root = tree.root();
        root.flags(|f| {
            f.bool("verbose", false, "Enable verbose output")?;
            Ok(())
        })
        .unwrap();

        root.sub_command("echo")
            .unwrap()
            .action(record(calls, "echo"))
            .flags(|f| {
                f.string("case", "", "Case to use")?;
                Ok(())
            })
            .unwrap();

        let mut repos = root.sub_command("repos").unwrap();
        repos
            .sub_command("list")
            .unwrap()
            .action(record(calls, "list"))
            .flags(|f| {
                f.string("user", "", "GitHub user")?;
                Ok(())
            })
            .unwrap();
        tree
    }

    #[test]
    fn test_resolve_root() {
        let calls = Calls::default();
        let tree = tree(&calls);
        let resolution = tree.resolve(Vec::<String>::new()).unwrap();
        assert_eq!(resolution.node(), tree.root_id());
        assert!(resolution.command_path().is_empty());
    }

    #[test]
    fn test_resolve_nested_path() {
        let calls = Calls::default();
        let tree = tree(&calls);
        let resolution = tree.resolve(["repos", "list", "--user=me", "extra"]).unwrap();
        assert_eq!(resolution.command_path(), vec!["repos", "list"]);
        assert_eq!(resolution.flags().lookup::<String>("user"), "me");
        assert_eq!(resolution.args(), ["extra"]);
    }

    #[test]
    fn test_root_flag_after_subcommand() {
        let calls = Calls::default();
        let tree = tree(&calls);
        let resolution = tree.resolve(["echo", "--verbose", "hi"]).unwrap();
        assert!(resolution.flags().lookup::<bool>("verbose"));
        assert_eq!(resolution.args(), ["hi"]);
    }

    #[test]
    fn test_root_flag_before_subcommand_is_carried() {
        let calls = Calls::default();
        let tree = tree(&calls);
        let resolution = tree.resolve(["--verbose", "repos", "list"]).unwrap();
        assert!(resolution.flags().lookup::<bool>("verbose"));
        assert!(resolution.flags().get("verbose").unwrap().is_set());
    }

    #[test]
    fn test_sibling_flags_not_visible() {
        let calls = Calls::default();
        let tree = tree(&calls);
        let err = tree.resolve(["repos", "list", "--case=upper"]).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Flag {
                source: FlagError::Unknown(_),
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_flag_usage_is_for_failing_node() {
        let calls = Calls::default();
        let tree = tree(&calls);
        let err = tree.resolve(["echo", "--bogus"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.usage().unwrap().starts_with("Usage: app echo [OPTIONS]\n"));
        assert!(err.usage().unwrap().contains("--verbose"));
    }

    #[test]
    fn test_non_child_token_stays_positional() {
        let calls = Calls::default();
        let tree = tree(&calls);
        tree.execute(&Context::background(), ["echo", "repos", "list"])
            .unwrap();
        assert_eq!(
            *calls.borrow(),
            vec![("echo".to_string(), vec!["repos".to_string(), "list".to_string()])]
        );
    }

    #[test]
    fn test_router_without_args_is_missing_command() {
        let calls = Calls::default();
        let tree = tree(&calls);
        let err = tree.execute(&Context::background(), ["repos"]).unwrap_err();
        assert!(matches!(err, DispatchError::MissingCommand { .. }));
        assert_eq!(err.exit_code(), 0);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_router_with_unknown_token() {
        let calls = Calls::default();
        let tree = tree(&calls);
        let err = tree
            .execute(&Context::background(), ["repos", "bogus"])
            .unwrap_err();
        match &err {
            DispatchError::UnknownCommand { name, usage } => {
                assert_eq!(name, "bogus");
                assert!(usage.starts_with("Usage: app repos [OPTIONS] COMMAND\n"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_help_flag_at_any_depth() {
        let calls = Calls::default();
        let tree = tree(&calls);
        let err = tree
            .execute(&Context::background(), ["repos", "list", "--help"])
            .unwrap_err();
        assert_eq!(err.exit_code(), 0);
        assert!(err.report().starts_with("Usage: app repos list [OPTIONS]\n"));
    }

    #[test]
    fn test_command_path_in_context() {
        let mut tree = CommandTree::new("app");
        let seen = Rc::new(RefCell::new(String::new()));
        let sink = Rc::clone(&seen);
        tree.root()
            .sub_command("repos")
            .unwrap()
            .sub_command("list")
            .unwrap()
            .action(move |ctx, _, _| {
                *sink.borrow_mut() = ctx.value_required::<CommandPath>()?.to_string();
                Ok(())
            });

        tree.execute(&Context::background(), ["repos", "list"])
            .unwrap();
        assert_eq!(*seen.borrow(), "repos list");
    }

    #[test]
    fn test_handler_error_propagates() {
        let mut tree = CommandTree::new("app");
        tree.root()
            .action(|_, _, _| Err(anyhow::anyhow!("boom")));

        let err = tree
            .execute(&Context::background(), Vec::<String>::new())
            .unwrap_err();
        assert!(err.is_handler());
        assert_eq!(err.to_string(), "boom");
    }
}
