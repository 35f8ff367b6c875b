//! Usage text for command nodes.
//!
//! ```text
//! Usage: gh repos [OPTIONS] COMMAND
//!
//! Manage GitHub repositories
//!
//! Options:
//!   --verbose
//!         Enable verbose output
//!
//! Subcommands:
//!   list  List repositories of a GitHub user
//! ```
//!
//! `[OPTIONS]` appears when the node has flags. `COMMAND` is required when the
//! node is a router and optional (`[COMMAND]`) when it also has an action.

use crate::flags::{FlagKind, FlagSet, FlagValue};
use crate::tree::{CommandTree, NodeId};

const HELP_INDENT: &str = "        ";

impl CommandTree {
    /// Usage for `id`, listing only the flags declared on that node.
    pub fn usage(&self, id: NodeId) -> String {
        render(self, id, &self.node(id).flags)
    }
}

/// Renders usage for `id` with `flags` as the effective flag set.
///
/// The dispatcher passes the merged set (local plus inherited flags) so that
/// error output lists every flag the user could actually have given.
pub(crate) fn render(tree: &CommandTree, id: NodeId, flags: &FlagSet) -> String {
    let node = tree.node(id);

    let options_hint = if flags.is_empty() { "" } else { " [OPTIONS]" };
    let command_hint = match (node.has_children(), node.is_router()) {
        (false, _) => "",
        (true, true) => " COMMAND",
        (true, false) => " [COMMAND]",
    };
    let mut lines = vec![format!(
        "Usage: {}{options_hint}{command_hint}",
        tree.path(id).join(" ")
    )];

    if let Some(help) = node.help().filter(|help| !help.is_empty()) {
        lines.push(String::new());
        lines.push(help.to_string());
    }

    if !flags.is_empty() {
        lines.push(String::new());
        lines.push("Options:".to_string());
        for flag in flags.iter() {
            let type_name = flag.kind().type_name();
            lines.push(if type_name.is_empty() {
                format!("  --{}", flag.name())
            } else {
                format!("  --{} {type_name}", flag.name())
            });

            let help = match default_hint(flag.default_value()) {
                Some(default) if flag.help().is_empty() => default,
                Some(default) => format!("{} {default}", flag.help()),
                None => flag.help().to_string(),
            };
            if !help.is_empty() {
                lines.push(format!("{HELP_INDENT}{help}"));
            }
        }
    }

    if node.has_children() {
        lines.push(String::new());
        lines.push("Subcommands:".to_string());
        let width = node
            .children()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);
        for (name, child) in node.children() {
            let help = tree.node(child).help().unwrap_or("");
            let line = format!("  {name:<width$}  {help}");
            lines.push(line.trim_end().to_string());
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn default_hint(default: &FlagValue) -> Option<String> {
    if default.is_zero() {
        return None;
    }
    Some(match default.kind() {
        FlagKind::String => format!("(default {:?})", default.to_string()),
        _ => format!("(default {default})"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn github_tree() -> CommandTree {
        let mut tree = CommandTree::new("gh");
        let mut root = tree.root();
        root.help("Example command")
            .flags(|f| {
                f.bool("verbose", false, "Enable verbose output")?;
                Ok(())
            })
            .unwrap();

        let mut repos = root.sub_command("repos").unwrap();
        repos.help("Manage GitHub repositories");
        repos
            .sub_command("list")
            .unwrap()
            .help("List repositories of a GitHub user")
            .action(|_, _, _| Ok(()))
            .flags(|f| {
                f.string("user", "", "GitHub user")?;
                Ok(())
            })
            .unwrap();
        tree
    }

    #[test]
    fn test_root_usage() {
        let tree = github_tree();
        assert_eq!(
            tree.usage(tree.root_id()),
            "Usage: gh [OPTIONS] COMMAND\n\
             \n\
             Example command\n\
             \n\
             Options:\n  \
             --verbose\n        \
             Enable verbose output\n\
             \n\
             Subcommands:\n  \
             repos  Manage GitHub repositories\n"
        );
    }

    #[test]
    fn test_router_usage_with_effective_flags() {
        let tree = github_tree();
        let repos = tree.find(&["repos"]).unwrap();
        let mut flags = tree.node(repos).flags().clone();
        flags.inherit(tree.node(tree.root_id()).flags());

        assert_eq!(
            render(&tree, repos, &flags),
            "Usage: gh repos [OPTIONS] COMMAND\n\
             \n\
             Manage GitHub repositories\n\
             \n\
             Options:\n  \
             --verbose\n        \
             Enable verbose output\n\
             \n\
             Subcommands:\n  \
             list  List repositories of a GitHub user\n"
        );
    }

    #[test]
    fn test_router_usage_local_flags_only() {
        let tree = github_tree();
        let repos = tree.find(&["repos"]).unwrap();
        assert!(tree.usage(repos).starts_with("Usage: gh repos COMMAND\n"));
    }

    #[test]
    fn test_leaf_usage() {
        let tree = github_tree();
        let list = tree.find(&["repos", "list"]).unwrap();
        assert_eq!(
            tree.usage(list),
            "Usage: gh repos list [OPTIONS]\n\
             \n\
             List repositories of a GitHub user\n\
             \n\
             Options:\n  \
             --user string\n        \
             GitHub user\n"
        );
    }

    #[test]
    fn test_optional_command_hint_and_defaults() {
        let mut tree = CommandTree::new("app");
        let mut root = tree.root();
        root.action(|_, _, _| Ok(()))
            .flags(|f| {
                f.string("level", "info", "Minimum level of logs to display")?
                    .int("retries", 3, "")?;
                Ok(())
            })
            .unwrap();
        root.sub_command("info").unwrap();

        assert_eq!(
            tree.usage(tree.root_id()),
            "Usage: app [OPTIONS] [COMMAND]\n\
             \n\
             Options:\n  \
             --level string\n        \
             Minimum level of logs to display (default \"info\")\n  \
             --retries int\n        \
             (default 3)\n\
             \n\
             Subcommands:\n  \
             info\n"
        );
    }

    #[test]
    fn test_bare_usage() {
        let tree = CommandTree::new("app");
        assert_eq!(tree.usage(tree.root_id()), "Usage: app\n");
    }
}
