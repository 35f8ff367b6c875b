//! Logs its arguments at a fixed level, filtered by a global `--level` flag.
//!
//! ```text
//! log-level [--level debug|info|warn|error] info|error WORDS...
//! ```
//!
//! The threshold is applied by a root middleware, so it takes effect for every
//! subcommand no matter where on the command line `--level` appears.

use std::io::IsTerminal;

use cmdtree::{CommandTree, Context, FlagSet, Handler, HandlerResult, SetupError};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, Registry};

type FilterHandle = reload::Handle<LevelFilter, Registry>;

fn init_logging() -> FilterHandle {
    let (filter, handle) = reload::Layer::new(LevelFilter::INFO);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .init();
    handle
}

fn level_middleware(filter: FilterHandle) -> impl Fn(Handler) -> Handler {
    move |next: Handler| {
        let filter = filter.clone();
        Handler::new(move |ctx, flags, args| {
            let level = match flags.lookup::<String>("level").as_str() {
                "debug" => LevelFilter::DEBUG,
                "info" => LevelFilter::INFO,
                "warn" => LevelFilter::WARN,
                "error" => LevelFilter::ERROR,
                other => anyhow::bail!("unknown level: {other}"),
            };
            filter.reload(level)?;
            tracing::debug!(%level, "log level set");
            next.call(ctx, flags, args)
        })
    }
}

fn info(_ctx: &Context, _flags: &FlagSet, args: &[String]) -> HandlerResult {
    tracing::info!("{}", args.join(" "));
    Ok(())
}

fn error(_ctx: &Context, _flags: &FlagSet, args: &[String]) -> HandlerResult {
    tracing::error!("{}", args.join(" "));
    Ok(())
}

fn build(filter: FilterHandle) -> Result<CommandTree, SetupError> {
    let mut tree = CommandTree::from_env();
    let mut root = tree.root();
    root.flags(|f| {
        f.string("level", "info", "Minimum level of logs to display")?;
        Ok(())
    })?
    .middleware(level_middleware(filter));

    root.sub_command("info")?
        .help("Log the arguments at info level")
        .action(info);
    root.sub_command("error")?
        .help("Log the arguments at error level")
        .action(error);

    Ok(tree)
}

fn main() {
    let filter = init_logging();
    let tree = match build(filter) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = tree.execute_env(&Context::background()) {
        err.exit();
    }
}
