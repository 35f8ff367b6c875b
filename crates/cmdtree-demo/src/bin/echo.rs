//! Prints its arguments, optionally changing their case.
//!
//! ```text
//! echo [--verbose] echo [--case upper|lower] WORDS...
//! ```

use cmdtree::{CommandTree, Context, FlagSet, HandlerResult, SetupError};

fn echo(_ctx: &Context, flags: &FlagSet, args: &[String]) -> HandlerResult {
    let verbose = flags.lookup::<bool>("verbose");
    let text_case = flags.lookup::<String>("case");

    if verbose {
        println!("command echo called with case: {text_case}");
    }

    let text = args.join(" ");
    match text_case.as_str() {
        "upper" => println!("{}", text.to_uppercase()),
        "lower" => println!("{}", text.to_lowercase()),
        _ => println!("{text}"),
    }

    Ok(())
}

fn build() -> Result<CommandTree, SetupError> {
    let mut tree = CommandTree::from_env();
    let mut root = tree.root();
    root.help("Example command").flags(|f| {
        f.bool("verbose", false, "Enable verbose output")?;
        Ok(())
    })?;

    root.sub_command("echo")?
        .help("Print the arguments")
        .action(echo)
        .flags(|f| {
            f.string("case", "", "Case to use (upper, lower)")?;
            Ok(())
        })?;

    Ok(tree)
}

fn main() {
    let tree = match build() {
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
