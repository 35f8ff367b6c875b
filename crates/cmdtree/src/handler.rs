//! Handler and middleware contracts.
//!
//! A [`Handler`] is the terminal action of a command: it receives the
//! invocation [`Context`], the resolved [`FlagSet`] (local plus inherited
//! flags) and the residual positional arguments.
//!
//! A [`Middleware`] turns one handler into another. It can run code before
//! and after calling through, replace the context, or short-circuit by not
//! calling the wrapped handler at all. Middleware registered on a node applies
//! to that node and every descendant.
//!
//! # Composition Order
//!
//! Middleware is accumulated root-to-leaf and applied leaf-first, so the
//! first one ever registered is the outermost layer:
//!
//! ```text
//! root mw (before)
//!   → leaf mw (before)
//!     → handler
//!   → leaf mw (after)
//! root mw (after)
//! ```
//!
//! # Example
//!
//! ```rust
//! use cmdtree::{Context, FlagSet, Handler, Middleware};
//!
//! let timing = Middleware::new(|next: Handler| {
//!     Handler::new(move |ctx, flags, args| {
//!         let started = std::time::Instant::now();
//!         let result = next.call(ctx, flags, args);
//!         eprintln!("took {:?}", started.elapsed());
//!         result
//!     })
//! });
//!
//! let echo = Handler::new(|_ctx, _flags, args| {
//!     println!("{}", args.join(" "));
//!     Ok(())
//! });
//!
//! let wrapped = cmdtree::compose(echo, &[timing]);
//! wrapped.call(&Context::background(), &FlagSet::new("echo"), &["hi".to_string()])?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fmt;
use std::rc::Rc;

use crate::context::Context;
use crate::flags::FlagSet;

/// Result type of handlers.
pub type HandlerResult = Result<(), anyhow::Error>;

type HandlerFn = dyn Fn(&Context, &FlagSet, &[String]) -> HandlerResult;
type MiddlewareFn = dyn Fn(Handler) -> Handler;

/// A command action. Cheap to clone.
#[derive(Clone)]
pub struct Handler(Rc<HandlerFn>);

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context, &FlagSet, &[String]) -> HandlerResult + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn call(&self, ctx: &Context, flags: &FlagSet, args: &[String]) -> HandlerResult {
        (self.0)(ctx, flags, args)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

/// A handler-to-handler wrapper. Cheap to clone.
#[derive(Clone)]
pub struct Middleware(Rc<MiddlewareFn>);

impl Middleware {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Handler) -> Handler + 'static,
    {
        Self(Rc::new(f))
    }

    /// Wraps `next`, returning the combined handler.
    pub fn wrap(&self, next: Handler) -> Handler {
        (self.0)(next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware")
    }
}

/// Wraps `handler` in `middlewares`, the first element ending up outermost.
pub fn compose(handler: Handler, middlewares: &[Middleware]) -> Handler {
    middlewares
        .iter()
        .rev()
        .fold(handler, |next, middleware| middleware.wrap(next))
}
