//! Invocation context passed to every handler and middleware.
//!
//! [`Context`] carries two things down the handler chain:
//!
//! - a cancellation signal ([`CancellationToken`]) that outside code may
//!   trigger and handlers may observe; the dispatcher itself never cancels
//! - typed values, keyed by type, that middleware can attach for the handlers
//!   they wrap
//!
//! Contexts are immutable. Deriving one with [`Context::with_value`] or
//! [`Context::with_cancel`] leaves the original untouched, so a middleware
//! cannot leak state into sibling invocations.
//!
//! # Example
//!
//! ```rust
//! use cmdtree::Context;
//!
//! struct ApiClient { base_url: String }
//!
//! let ctx = Context::background()
//!     .with_value(ApiClient { base_url: "https://api.example.com".into() });
//!
//! let api = ctx.value_required::<ApiClient>()?;
//! assert_eq!(api.base_url, "https://api.example.com");
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Returned by [`Context::check`] once the context has been cancelled.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("context cancelled")]
pub struct Cancelled;

/// Cancellation signal plus typed values, handed to handlers.
#[derive(Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
    values: HashMap<TypeId, Rc<dyn Any>>,
}

impl Context {
    /// An empty context that is never cancelled unless its token is.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a context with its own cancellation token, returning the token.
    ///
    /// Cancelling the returned token cancels the new context only; cancelling
    /// this context's token cancels both.
    pub fn with_cancel(&self) -> (Context, CancellationToken) {
        let token = self.cancel.child_token();
        let ctx = Context {
            cancel: token.clone(),
            values: self.values.clone(),
        };
        (ctx, token)
    }

    /// The token observed by this context. Tokens are `Send + Sync`, so a
    /// signal handler on another thread can hold a clone.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Err(Cancelled)` once the context is cancelled, for use with `?`.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Derives a context holding `value`. An existing value of the same type is
    /// shadowed in the derived context.
    pub fn with_value<T: 'static>(&self, value: T) -> Context {
        let mut values = self.values.clone();
        values.insert(TypeId::of::<T>(), Rc::new(value));
        Context {
            cancel: self.cancel.clone(),
            values,
        }
    }

    /// Gets a reference to a value of the specified type.
    pub fn value<T: 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref())
    }

    /// Gets a required reference to a value of the specified type.
    ///
    /// Returns an error if no value of this type exists.
    pub fn value_required<T: 'static>(&self) -> Result<&T, anyhow::Error> {
        self.value::<T>().ok_or_else(|| {
            anyhow::anyhow!(
                "Context value missing: type {} not found in context",
                std::any::type_name::<T>()
            )
        })
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.is_cancelled())
            .field("values", &self.values.len())
            .finish_non_exhaustive()
    }
}

/// Path of the command being invoked, from the root's first subcommand down.
///
/// The dispatcher stores it in the context handed to the composed handler:
///
/// ```rust,ignore
/// let path = ctx.value::<CommandPath>().map(|p| p.to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandPath(pub Vec<String>);

impl CommandPath {
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_not_cancelled() {
        let ctx = Context::background();
        assert!(!ctx.is_cancelled());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_with_cancel() {
        let parent = Context::background();
        let (child, token) = parent.with_cancel();

        token.cancel();
        assert!(child.is_cancelled());
        assert_eq!(child.check(), Err(Cancelled));
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_parent_cancel_reaches_child() {
        let (parent, parent_token) = Context::background().with_cancel();
        let (child, _) = parent.with_cancel();

        parent_token.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_token_cancel_from_other_thread() {
        let (ctx, token) = Context::background().with_cancel();
        std::thread::spawn(move || token.cancel()).join().unwrap();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_cancel_via_context_token() {
        let (ctx, _) = Context::background().with_cancel();
        let (child, _) = ctx.with_cancel();

        ctx.token().cancel();
        assert!(ctx.is_cancelled());
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_values() {
        struct MyState {
            value: i32,
        }

        let base = Context::background();
        let ctx = base.with_value(MyState { value: 42 });

        assert_eq!(ctx.value::<MyState>().unwrap().value, 42);
        assert!(ctx.contains::<MyState>());
        assert!(!base.contains::<MyState>());
    }

    #[test]
    fn test_value_shadowing() {
        struct Value(i32);

        let outer = Context::background().with_value(Value(1));
        let inner = outer.with_value(Value(2));

        assert_eq!(outer.value::<Value>().unwrap().0, 1);
        assert_eq!(inner.value::<Value>().unwrap().0, 2);
    }

    #[test]
    fn test_value_required_missing() {
        #[derive(Debug)]
        struct Missing;

        let ctx = Context::background();
        let err = ctx.value_required::<Missing>().unwrap_err();
        assert!(err.to_string().contains("Context value missing"));
    }

    #[test]
    fn test_values_survive_with_cancel() {
        struct Marker;

        let (ctx, _) = Context::background().with_value(Marker).with_cancel();
        assert!(ctx.contains::<Marker>());
    }

    #[test]
    fn test_command_path_display() {
        let path = CommandPath(vec!["repos".into(), "list".into()]);
        assert_eq!(path.to_string(), "repos list");
        assert_eq!(path.names(), ["repos", "list"]);
    }
}
