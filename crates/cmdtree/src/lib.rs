//! Tree-structured command dispatch.
//!
//! `cmdtree` builds a tree of named commands, walks it along the positional
//! tokens of a command line, and runs the action of the node it stops at.
//!
//! # Features
//!
//! - **Command tree**: nested subcommands, each with optional action and help
//! - **Scoped flags**: every node declares its own flags; flags flow down the
//!   path being dispatched, so `app --verbose repos list` and
//!   `app repos list --verbose` both work while siblings stay isolated
//! - **Middleware**: handler wrappers inherited by all descendants, composed
//!   with the root outermost
//! - **Explicit exits**: dispatch never terminates the process; errors carry the
//!   conventional exit status and usage text
//!
//! # Example
//!
//! ```rust
//! use cmdtree::{CommandTree, Context};
//!
//! let mut tree = CommandTree::new("app");
//! let mut root = tree.root();
//! root.flags(|f| {
//!     f.bool("verbose", false, "Enable verbose output")?;
//!     Ok(())
//! })?;
//! root.sub_command("echo")?
//!     .action(|_ctx, flags, args| {
//!         let text = args.join(" ");
//!         match flags.lookup::<String>("case").as_str() {
//!             "upper" => println!("{}", text.to_uppercase()),
//!             "lower" => println!("{}", text.to_lowercase()),
//!             _ => println!("{text}"),
//!         }
//!         Ok(())
//!     })
//!     .flags(|f| {
//!         f.string("case", "", "Case to use (upper, lower)")?;
//!         Ok(())
//!     })?;
//!
//! tree.execute(&Context::background(), ["echo", "--case=upper", "hello", "world"])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! In a binary, hand the process arguments over and let errors exit:
//!
//! ```rust,ignore
//! if let Err(err) = tree.execute_env(&Context::background()) {
//!     err.exit();
//! }
//! ```

mod builder;
mod context;
mod dispatch;
mod error;
mod flags;
mod handler;
mod tree;
mod usage;

pub use builder::CommandBuilder;

pub use context::{Cancelled, CommandPath, Context};

pub use tokio_util::sync::CancellationToken;

pub use dispatch::Resolution;

pub use error::{DispatchError, FlagError, SetupError};

pub use flags::{Flag, FlagKind, FlagSet, FlagValue, FromFlagValue};

pub use handler::{compose, Handler, HandlerResult, Middleware};

pub use tree::{CommandTree, Node, NodeId};
