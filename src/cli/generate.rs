//! CLI subcommand: `atelier generate`
//!
//! Runs the generation flow once, reporting progress on stderr and printing
//! the finished creation on stdout.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use tokio::sync::mpsc::unbounded_channel;

use crate::config::Config;
use crate::error::GenerationError;
use crate::generator::{GenerationEvent, RecipeGenerator};
use crate::recipe::{GeneratedSweet, GenerationRequest, StepIllustration};
use crate::render::{format_sweet, save_sweet};
use crate::studio::{StudioCommand, StudioState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Keywords for the dessert (e.g. "first love" "midnight forest")
    #[arg(required = true)]
    pub keywords: Vec<String>,

    /// Target cost (e.g. "300円")
    #[arg(long)]
    pub cost: Option<String>,

    /// Target selling price (e.g. "1500円")
    #[arg(long)]
    pub price: Option<String>,

    /// Skip the per-step pencil sketches
    #[arg(long)]
    pub no_illustrations: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also write recipe.json and images into this directory
    #[arg(long, value_name = "DIR")]
    pub save: Option<String>,
}

pub async fn run(args: GenerateArgs, config: &Config) -> Result<()> {
    let locale = config.studio.locale;
    let generator = RecipeGenerator::from_config(config)
        .with_illustrations(config.generation.illustrate_steps && !args.no_illustrations);

    let mut state = StudioState::new(locale);
    state.keywords = args.keywords.join(" ");
    state.cost = args.cost.unwrap_or_default();
    state.price = args.price.unwrap_or_default();

    let Some(StudioCommand::Generate { ticket, request }) = state.submit(false) else {
        anyhow::bail!("{}", GenerationError::EmptyKeywords);
    };

    let sweet = match drive(&generator, &mut state, ticket, request).await {
        Some(Ok(sweet)) => sweet,
        Some(Err(e)) => return Err(e.into()),
        None => anyhow::bail!("Cancelled"),
    };

    match args.format {
        OutputFormat::Text => println!("{}", format_sweet(&sweet, locale)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sweet)?),
    }

    if let Some(dir) = args.save {
        let dir = PathBuf::from(shellexpand::tilde(&dir).to_string());
        for path in save_sweet(&dir, &sweet)? {
            eprintln!("Saved {}", path.display());
        }
    }

    Ok(())
}

/// Run one flow to completion, folding its events into `state` and
/// reporting progress on stderr.
///
/// Returns `None` when interrupted with Ctrl+C; the flow and its sketches
/// are dropped at that point.
pub(crate) async fn drive(
    generator: &RecipeGenerator,
    state: &mut StudioState,
    ticket: u64,
    request: GenerationRequest,
) -> Option<Result<GeneratedSweet, GenerationError>> {
    let (tx, mut rx) = unbounded_channel();
    let flow = generator.run(ticket, request, &tx);
    tokio::pin!(flow);

    let result = loop {
        tokio::select! {
            result = &mut flow => break Some(result),
            Some(event) = rx.recv() => report(state, event),
            _ = tokio::signal::ctrl_c() => break None,
        }
    };

    if result.is_some() {
        while let Ok(event) = rx.try_recv() {
            report(state, event);
        }
    }
    result
}

fn report(state: &mut StudioState, event: GenerationEvent) {
    if !state.apply(event.clone()) {
        return;
    }

    match event {
        GenerationEvent::Status { .. } => {
            if let (Some(line), Some(detail)) = (state.status_line(), state.status_detail()) {
                eprintln!("{} {}", line, detail);
            }
        }
        GenerationEvent::RecipeReady { recipe, .. } => {
            eprintln!("  recipe: {}", recipe.name);
        }
        GenerationEvent::HeroImage { image_url, .. } => match image_url {
            Some(_) => eprintln!("  hero image: ready"),
            None => eprintln!("  hero image: unavailable"),
        },
        GenerationEvent::StepIllustration { index, outcome, .. } => match outcome {
            StepIllustration::Ready(_) => eprintln!("  sketch {:02}: ready", index + 1),
            StepIllustration::Failed(message) => {
                eprintln!("  sketch {:02}: {}", index + 1, message)
            }
            StepIllustration::Pending | StepIllustration::Unavailable => {}
        },
        GenerationEvent::Failed { message, .. } => eprintln!("{}", message),
    }
}
