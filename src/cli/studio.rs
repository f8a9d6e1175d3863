//! CLI subcommand: `atelier studio`
//!
//! Line-oriented studio. Plain input orders a dessert, or refines the one on
//! the counter; slash commands manage constraints and saving.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use super::generate::drive;
use crate::commands::{self, format_help_text};
use crate::config::Config;
use crate::generator::RecipeGenerator;
use crate::render::{creation_dir, format_sweet, save_sweet};
use crate::studio::{StudioCommand, StudioState};

#[derive(Args)]
pub struct StudioArgs {
    /// Skip the per-step pencil sketches
    #[arg(long)]
    pub no_illustrations: bool,
}

enum CommandResult {
    Continue,
    Quit,
    Error(String),
}

pub async fn run(args: StudioArgs, config: &Config) -> Result<()> {
    let locale = config.studio.locale;
    let generator = RecipeGenerator::from_config(config)
        .with_illustrations(config.generation.illustrate_steps && !args.no_illustrations);
    let mut state = StudioState::new(locale);

    println!(
        "L'Atelier v{} | Text: {} | Image: {}\n",
        env!("CARGO_PKG_VERSION"),
        config.generation.text_model,
        config.generation.image_model,
    );
    println!("Type keywords to order a dessert, /help for commands, /quit to exit\n");

    let mut rl = DefaultEditor::new()?;

    loop {
        let prompt = if state.current.is_some() {
            "Refine: "
        } else {
            "Order: "
        };

        let input = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                break; // Ctrl+D
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let _ = rl.add_history_entry(input);

        if input.starts_with('/') {
            match handle_command(input, &mut state, config) {
                CommandResult::Continue => continue,
                CommandResult::Quit => break,
                CommandResult::Error(e) => {
                    eprintln!("Error: {}", e);
                    continue;
                }
            }
        }

        state.keywords = input.to_string();
        let refine = state.current.is_some();
        let Some(StudioCommand::Generate { ticket, request }) = state.submit(refine) else {
            continue;
        };

        println!();
        match drive(&generator, &mut state, ticket, request).await {
            Some(Ok(sweet)) => println!("\n{}", format_sweet(&sweet, locale)),
            // The localized message was already reported.
            Some(Err(_)) => println!(),
            None => {
                state.cancel();
                println!("\nOrder cancelled.\n");
            }
        }
    }

    println!("Au revoir!");
    Ok(())
}

fn handle_command(input: &str, state: &mut StudioState, config: &Config) -> CommandResult {
    let Some((command, arg)) = commands::parse(input) else {
        let word = input.split_whitespace().next().unwrap_or(input);
        return CommandResult::Error(format!("Unknown command: {} (try /help)", word));
    };

    match command.name {
        "quit" => CommandResult::Quit,

        "help" => {
            println!("\n{}\n", format_help_text());
            CommandResult::Continue
        }

        "new" => {
            state.reset();
            println!("\nThe counter is clear. Order something new.\n");
            CommandResult::Continue
        }

        "cost" => {
            state.cost = arg.to_string();
            print_constraint("Target cost", arg);
            CommandResult::Continue
        }

        "price" => {
            state.price = arg.to_string();
            print_constraint("Target selling price", arg);
            CommandResult::Continue
        }

        "show" => {
            match &state.current {
                Some(sweet) => println!("\n{}", format_sweet(sweet, state.locale)),
                None => println!("\nNothing on the counter yet.\n"),
            }
            CommandResult::Continue
        }

        "save" => {
            let Some(sweet) = &state.current else {
                return CommandResult::Error("Nothing to save yet".into());
            };
            let dir = if arg.is_empty() {
                creation_dir(&config.save_dir(), &sweet.recipe.name, chrono::Local::now())
            } else {
                PathBuf::from(shellexpand::tilde(arg).to_string())
            };
            match save_sweet(&dir, sweet) {
                Ok(written) => {
                    println!("\nSaved {} file(s) to {}\n", written.len(), dir.display());
                    CommandResult::Continue
                }
                Err(e) => CommandResult::Error(format!("Save failed: {:#}", e)),
            }
        }

        other => CommandResult::Error(format!("Unhandled command: /{}", other)),
    }
}

fn print_constraint(label: &str, value: &str) {
    if value.is_empty() {
        println!("\n{} cleared.\n", label);
    } else {
        println!("\n{}: {}\n", label, value);
    }
}
