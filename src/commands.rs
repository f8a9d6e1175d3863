//! Slash commands of the terminal studio.

/// A slash command definition.
pub struct SlashCommand {
    pub name: &'static str,
    pub description: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
}

impl SlashCommand {
    fn matches(&self, word: &str) -> bool {
        self.name == word || self.aliases.contains(&word)
    }

    /// Format as a help line, e.g. "  /help, /h, /?     - Show this help"
    fn help_line(&self) -> String {
        let mut names = format!("/{}", self.name);
        for alias in self.aliases {
            names.push_str(&format!(", /{}", alias));
        }
        if !self.usage.is_empty() {
            names.push_str(&format!(" {}", self.usage));
        }
        format!("  {:<20}- {}", names, self.description)
    }
}

pub const COMMANDS: &[SlashCommand] = &[
    SlashCommand {
        name: "help",
        description: "Show available commands",
        aliases: &["h", "?"],
        usage: "",
    },
    SlashCommand {
        name: "quit",
        description: "Leave the studio",
        aliases: &["exit", "q"],
        usage: "",
    },
    SlashCommand {
        name: "new",
        description: "Discard the current creation and start over",
        aliases: &["reset"],
        usage: "",
    },
    SlashCommand {
        name: "cost",
        description: "Set or clear the target cost",
        aliases: &[],
        usage: "[amount]",
    },
    SlashCommand {
        name: "price",
        description: "Set or clear the target selling price",
        aliases: &[],
        usage: "[amount]",
    },
    SlashCommand {
        name: "show",
        description: "Show the current creation",
        aliases: &[],
        usage: "",
    },
    SlashCommand {
        name: "save",
        description: "Save recipe and images to disk",
        aliases: &[],
        usage: "[dir]",
    },
];

/// Split `/name rest of line` into its command and trimmed argument.
///
/// Returns `None` for plain text and for unknown commands; callers tell the
/// two apart by the leading slash.
pub fn parse(input: &str) -> Option<(&'static SlashCommand, &str)> {
    let body = input.trim().strip_prefix('/')?;
    let (word, rest) = match body.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (body, ""),
    };
    COMMANDS
        .iter()
        .find(|cmd| cmd.matches(word))
        .map(|cmd| (cmd, rest))
}

/// Help text listing every command.
pub fn format_help_text() -> String {
    let mut lines = vec!["Commands:".to_string()];
    lines.extend(COMMANDS.iter().map(SlashCommand::help_line));
    lines.push("Anything else is an order: keywords for a new dessert,".to_string());
    lines.push("or a refinement of the current one.".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_aliases_and_arguments() {
        let (cmd, arg) = parse("/cost  300円 ").unwrap();
        assert_eq!(cmd.name, "cost");
        assert_eq!(arg, "300円");

        let (cmd, arg) = parse("/q").unwrap();
        assert_eq!(cmd.name, "quit");
        assert_eq!(arg, "");

        let (cmd, _) = parse("/reset").unwrap();
        assert_eq!(cmd.name, "new");
    }

    #[test]
    fn plain_text_and_unknown_commands() {
        assert!(parse("midnight forest").is_none());
        assert!(parse("/bake now").is_none());
    }

    #[test]
    fn help_mentions_every_command() {
        let help = format_help_text();
        for cmd in COMMANDS {
            assert!(help.contains(&format!("/{}", cmd.name)));
        }
        assert!(help.contains("/save [dir]"));
    }
}
