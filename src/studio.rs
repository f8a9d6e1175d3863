//! Application state shared by the REPL and the desktop window
//!
//! [`StudioState`] owns the draft inputs and the creation on display. Front
//! ends turn user actions into [`StudioCommand`]s and feed generation events
//! back through [`StudioState::apply`].

use crate::error::Locale;
use crate::generator::GenerationEvent;
use crate::recipe::{GeneratedSweet, GenerationRequest, LoadingState, StepIllustration};

/// Message from the front end to whoever runs the generation flow
#[derive(Debug, Clone, PartialEq)]
pub enum StudioCommand {
    /// Start a flow; supersedes any flow in progress
    Generate {
        ticket: u64,
        request: GenerationRequest,
    },
    /// Abort the flow in progress
    Cancel,
}

#[derive(Debug, Default)]
pub struct StudioState {
    /// Draft keyword input
    pub keywords: String,
    /// Draft cost target, blank when unset
    pub cost: String,
    /// Draft selling price target, blank when unset
    pub price: String,
    pub loading: LoadingState,
    /// Creation on display
    pub current: Option<GeneratedSweet>,
    /// Localized error banner
    pub error: Option<String>,
    pub locale: Locale,
    ticket: u64,
}

impl StudioState {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            ..Self::default()
        }
    }

    /// Ticket of the most recent submission
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn is_generating(&self) -> bool {
        self.loading.is_generating()
    }

    pub fn can_submit(&self) -> bool {
        !self.is_generating() && !self.keywords.trim().is_empty()
    }

    /// Whether Refine has something to refine
    pub fn can_refine(&self) -> bool {
        self.can_submit() && self.current.is_some()
    }

    /// True once the flow is over and no step sketch is still pending.
    pub fn is_settled(&self) -> bool {
        !self.is_generating()
            && self.current.as_ref().is_none_or(|sweet| {
                !sweet
                    .step_illustrations
                    .iter()
                    .any(|s| *s == StepIllustration::Pending)
            })
    }

    /// Turn the draft inputs into a generation command.
    ///
    /// With `refine` set and a creation on display, the request carries that
    /// recipe so the model evolves it instead of starting over.
    pub fn submit(&mut self, refine: bool) -> Option<StudioCommand> {
        if !self.can_submit() {
            return None;
        }

        let previous = if refine {
            self.current.as_ref().map(|sweet| sweet.recipe.clone())
        } else {
            None
        };
        let request = GenerationRequest::new(self.keywords.trim())
            .with_cost(Some(self.cost.clone()))
            .with_price(Some(self.price.clone()))
            .refining(previous);

        self.ticket += 1;
        self.error = None;
        self.loading = LoadingState::GeneratingRecipe;

        Some(StudioCommand::Generate {
            ticket: self.ticket,
            request,
        })
    }

    /// Back to a blank studio. Anything still in flight becomes stale.
    pub fn reset(&mut self) -> StudioCommand {
        self.ticket += 1;
        self.keywords.clear();
        self.cost.clear();
        self.price.clear();
        self.loading = LoadingState::Idle;
        self.current = None;
        self.error = None;
        StudioCommand::Cancel
    }

    /// Drop the order in flight and keep everything else. Its events become
    /// stale, and sketches it never delivered are marked unavailable.
    pub fn cancel(&mut self) -> StudioCommand {
        self.ticket += 1;
        self.loading = match &mut self.current {
            Some(sweet) => {
                for slot in &mut sweet.step_illustrations {
                    if *slot == StepIllustration::Pending {
                        *slot = StepIllustration::Unavailable;
                    }
                }
                LoadingState::Complete
            }
            None => LoadingState::Idle,
        };
        StudioCommand::Cancel
    }

    /// Fold one event into the state. Returns false for stale events.
    pub fn apply(&mut self, event: GenerationEvent) -> bool {
        if event.ticket() != self.ticket {
            return false;
        }

        match event {
            GenerationEvent::Status { state, .. } => {
                self.loading = state;
            }
            GenerationEvent::RecipeReady { recipe, .. } => {
                self.current = Some(GeneratedSweet::new(recipe));
            }
            GenerationEvent::HeroImage { image_url, .. } => {
                if let Some(sweet) = self.current.as_mut() {
                    sweet.image_url = image_url;
                }
            }
            GenerationEvent::StepIllustration { index, outcome, .. } => {
                if let Some(sweet) = self.current.as_mut() {
                    sweet.set_step_illustration(index, outcome);
                }
            }
            GenerationEvent::Failed { message, .. } => {
                // The previous creation stays on display.
                self.loading = LoadingState::Error;
                self.error = Some(message);
            }
        }
        true
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Headline for the progress indicator
    pub fn status_line(&self) -> Option<&'static str> {
        match (self.locale, self.loading) {
            (Locale::Ja, LoadingState::GeneratingRecipe) => Some("アイデアを練っています..."),
            (Locale::Ja, LoadingState::GeneratingImage) => Some("仕上げの盛り付け中..."),
            (Locale::En, LoadingState::GeneratingRecipe) => Some("Working on the idea..."),
            (Locale::En, LoadingState::GeneratingImage) => Some("Plating the final touches..."),
            _ => None,
        }
    }

    /// Secondary line under [`Self::status_line`]
    pub fn status_detail(&self) -> Option<&'static str> {
        match (self.locale, self.loading) {
            (Locale::Ja, LoadingState::GeneratingRecipe) => {
                Some("フレーバーの組み合わせと構成を設計中")
            }
            (Locale::Ja, LoadingState::GeneratingImage) => {
                Some("光と影を調整し、美しいビジュアルを生成しています")
            }
            (Locale::En, LoadingState::GeneratingRecipe) => {
                Some("Designing the flavor pairings and structure")
            }
            (Locale::En, LoadingState::GeneratingImage) => {
                Some("Adjusting light and shadow for the photograph")
            }
            _ => None,
        }
    }
}
