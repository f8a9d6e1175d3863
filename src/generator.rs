//! Recipe generation flow
//!
//! Recipe first, then the hero photo; step sketches run alongside the hero
//! photo with staggered starts. Progress is reported as [`GenerationEvent`]s
//! tagged with the caller's ticket so that consumers can drop stale ones.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{GenerationError, Locale};
use crate::prompt::{self, HERO_ASPECT_RATIO, PromptStyle, STEP_ASPECT_RATIO};
use crate::provider::{GenerativeProvider, ImageRequest, TextRequest, create_provider};
use crate::recipe::{GeneratedSweet, GenerationRequest, LoadingState, Recipe, StepIllustration};

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    Status {
        ticket: u64,
        state: LoadingState,
    },
    RecipeReady {
        ticket: u64,
        recipe: Recipe,
    },
    HeroImage {
        ticket: u64,
        image_url: Option<String>,
    },
    StepIllustration {
        ticket: u64,
        index: usize,
        outcome: StepIllustration,
    },
    Failed {
        ticket: u64,
        message: String,
    },
}

impl GenerationEvent {
    pub fn ticket(&self) -> u64 {
        match self {
            GenerationEvent::Status { ticket, .. }
            | GenerationEvent::RecipeReady { ticket, .. }
            | GenerationEvent::HeroImage { ticket, .. }
            | GenerationEvent::StepIllustration { ticket, .. }
            | GenerationEvent::Failed { ticket, .. } => *ticket,
        }
    }
}

pub type EventSender = UnboundedSender<GenerationEvent>;

pub struct RecipeGenerator {
    provider: Arc<dyn GenerativeProvider>,
    style: PromptStyle,
    temperature: f32,
    step_stagger: Duration,
    locale: Locale,
}

impl RecipeGenerator {
    pub fn new(provider: Arc<dyn GenerativeProvider>, config: &Config) -> Self {
        Self {
            provider,
            style: config.generation.prompt_style(),
            temperature: config.generation.temperature,
            step_stagger: config.generation.step_stagger(),
            locale: config.studio.locale,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::from(create_provider(config)), config)
    }

    pub fn with_step_stagger(mut self, stagger: Duration) -> Self {
        self.step_stagger = stagger;
        self
    }

    pub fn with_illustrations(mut self, enabled: bool) -> Self {
        self.style.illustrated_steps = enabled;
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Ask the text model for a recipe. Refines `request.previous` when set.
    pub async fn generate_recipe(
        &self,
        request: &GenerationRequest,
    ) -> Result<Recipe, GenerationError> {
        if request.keywords.trim().is_empty() {
            return Err(GenerationError::EmptyKeywords);
        }

        let text_request = TextRequest {
            system_instruction: prompt::system_instruction(request, &self.style),
            prompt: prompt::user_prompt(request),
            response_schema: prompt::recipe_schema(&self.style),
            temperature: self.temperature,
        };

        info!(
            refine = request.is_refinement(),
            "Designing dessert for: {}",
            request.keywords.trim()
        );
        let text = self.provider.generate_text(&text_request).await?;
        let recipe = Recipe::from_json(&text)?;
        info!("Recipe ready: {}", recipe.name);

        Ok(recipe)
    }

    /// Hero photo (1:1) for the recipe's image prompt
    pub async fn generate_image(&self, image_prompt: &str) -> Result<String, GenerationError> {
        let request = ImageRequest {
            prompt: prompt::hero_image_prompt(image_prompt),
            aspect_ratio: HERO_ASPECT_RATIO.to_string(),
        };
        self.provider.generate_image(&request).await
    }

    /// Pencil sketch (4:3) for one step's visual description
    pub async fn generate_step_illustration(
        &self,
        visual_description: &str,
    ) -> Result<String, GenerationError> {
        request_step_sketch(self.provider.as_ref(), visual_description).await
    }

    /// Run the whole flow for one submission.
    ///
    /// A recipe failure ends the flow with an error. A hero photo failure
    /// leaves `image_url` empty. A sketch failure only affects its own slot.
    /// Dropping the returned future aborts any sketches still in flight.
    pub async fn run(
        &self,
        ticket: u64,
        request: GenerationRequest,
        events: &EventSender,
    ) -> Result<GeneratedSweet, GenerationError> {
        let emit = |event: GenerationEvent| {
            // The receiver may be gone after a reset; nothing left to notify.
            let _ = events.send(event);
        };

        emit(GenerationEvent::Status {
            ticket,
            state: LoadingState::GeneratingRecipe,
        });

        let recipe = match self.generate_recipe(&request).await {
            Ok(recipe) => recipe,
            Err(e) => {
                warn!("Recipe generation failed: {}", e);
                emit(GenerationEvent::Failed {
                    ticket,
                    message: e.user_message(self.locale).to_string(),
                });
                return Err(e);
            }
        };

        let mut sweet = GeneratedSweet::new(recipe.clone());
        emit(GenerationEvent::RecipeReady {
            ticket,
            recipe: recipe.clone(),
        });
        emit(GenerationEvent::Status {
            ticket,
            state: LoadingState::GeneratingImage,
        });

        let mut sketches = JoinSet::new();
        for (index, step) in recipe.steps.iter().enumerate() {
            let visual = match step.visual_description() {
                Some(visual) if self.style.illustrated_steps => visual.to_string(),
                _ => {
                    sweet.set_step_illustration(index, StepIllustration::Unavailable);
                    emit(GenerationEvent::StepIllustration {
                        ticket,
                        index,
                        outcome: StepIllustration::Unavailable,
                    });
                    continue;
                }
            };

            let provider = Arc::clone(&self.provider);
            let delay = self.step_stagger * index as u32;
            let events = events.clone();
            let locale = self.locale;

            sketches.spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                debug!("Sketching step {}", index + 1);

                let outcome = match request_step_sketch(provider.as_ref(), &visual).await {
                    Ok(url) => StepIllustration::Ready(url),
                    Err(e) => {
                        warn!("Sketch for step {} failed: {}", index + 1, e);
                        StepIllustration::Failed(e.user_message(locale).to_string())
                    }
                };

                let _ = events.send(GenerationEvent::StepIllustration {
                    ticket,
                    index,
                    outcome: outcome.clone(),
                });
                (index, outcome)
            });
        }

        let image_url = match self.generate_image(&recipe.image_prompt).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Hero image failed, keeping recipe without it: {}", e);
                None
            }
        };
        sweet.image_url = image_url.clone();
        emit(GenerationEvent::HeroImage { ticket, image_url });
        emit(GenerationEvent::Status {
            ticket,
            state: LoadingState::Complete,
        });

        while let Some(joined) = sketches.join_next().await {
            match joined {
                Ok((index, outcome)) => sweet.set_step_illustration(index, outcome),
                Err(e) => warn!("Sketch task ended abnormally: {}", e),
            }
        }

        Ok(sweet)
    }
}

async fn request_step_sketch(
    provider: &dyn GenerativeProvider,
    visual_description: &str,
) -> Result<String, GenerationError> {
    let request = ImageRequest {
        prompt: prompt::step_sketch_prompt(visual_description),
        aspect_ratio: STEP_ASPECT_RATIO.to_string(),
    };
    provider.generate_image(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{PHOTO_STYLE, SKETCH_STYLE};
    use crate::provider::MockGenerativeProvider;
    use crate::recipe::tests::{SAMPLE_RECIPE_JSON, sample_recipe};
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

    const HERO: &str = "data:image/png;base64,SEVSTw==";
    const SKETCH: &str = "data:image/png;base64,U0tFVENI";

    fn generator(mock: MockGenerativeProvider) -> RecipeGenerator {
        RecipeGenerator::new(Arc::new(mock), &Config::default()).with_step_stagger(Duration::ZERO)
    }

    fn drain(rx: &mut UnboundedReceiver<GenerationEvent>) -> Vec<GenerationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn position(events: &[GenerationEvent], pred: impl Fn(&GenerationEvent) -> bool) -> usize {
        events.iter().position(pred).expect("event not emitted")
    }

    #[tokio::test]
    async fn empty_keywords_never_call_the_model() {
        let mut mock = MockGenerativeProvider::new();
        mock.expect_generate_text().times(0);
        mock.expect_generate_image().times(0);

        let result = generator(mock)
            .generate_recipe(&GenerationRequest::new("   \n"))
            .await;
        assert_eq!(result, Err(GenerationError::EmptyKeywords));
    }

    #[tokio::test]
    async fn full_flow_for_example_keywords() {
        let mut mock = MockGenerativeProvider::new();
        mock.expect_generate_text()
            .withf(|req: &TextRequest| {
                req.prompt.contains("initial love, midnight forest")
                    && req.system_instruction.contains("avant-garde pastry chef")
                    && req.temperature == 1.0
            })
            .times(1)
            .returning(|_| Ok(SAMPLE_RECIPE_JSON.to_string()));
        let expected_hero_prompt = format!("{} {}", sample_recipe().image_prompt, PHOTO_STYLE);
        mock.expect_generate_image()
            .withf(move |req: &ImageRequest| {
                req.aspect_ratio == "1:1" && req.prompt == expected_hero_prompt
            })
            .times(1)
            .returning(|_| Ok(HERO.to_string()));
        mock.expect_generate_image()
            .withf(|req: &ImageRequest| {
                req.aspect_ratio == "4:3" && req.prompt.ends_with(SKETCH_STYLE)
            })
            .times(2)
            .returning(|_| Ok(SKETCH.to_string()));

        let (tx, mut rx) = unbounded_channel();
        let sweet = generator(mock)
            .run(7, GenerationRequest::new("initial love, midnight forest"), &tx)
            .await
            .unwrap();

        assert!(!sweet.recipe.name.is_empty());
        assert!(!sweet.recipe.description.is_empty());
        assert!(!sweet.recipe.ingredients.is_empty());
        assert!(!sweet.recipe.steps.is_empty());
        assert!(!sweet.recipe.image_prompt.is_empty());
        assert_eq!(sweet.image_url.as_deref(), Some(HERO));
        assert_eq!(
            sweet.step_illustrations,
            vec![
                StepIllustration::Ready(SKETCH.into()),
                StepIllustration::Ready(SKETCH.into())
            ]
        );

        let events = drain(&mut rx);
        assert!(events.iter().all(|e| e.ticket() == 7));
        let recipe_at = position(&events, |e| matches!(e, GenerationEvent::RecipeReady { .. }));
        let hero_at = position(&events, |e| matches!(e, GenerationEvent::HeroImage { .. }));
        let complete_at = position(&events, |e| {
            matches!(
                e,
                GenerationEvent::Status {
                    state: LoadingState::Complete,
                    ..
                }
            )
        });
        assert!(recipe_at < hero_at);
        assert!(hero_at < complete_at);
        assert!(matches!(
            events[0],
            GenerationEvent::Status {
                state: LoadingState::GeneratingRecipe,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn hero_failure_keeps_the_recipe() {
        let mut mock = MockGenerativeProvider::new();
        mock.expect_generate_text()
            .returning(|_| Ok(SAMPLE_RECIPE_JSON.to_string()));
        mock.expect_generate_image()
            .withf(|req: &ImageRequest| req.aspect_ratio == "1:1")
            .returning(|_| Err(GenerationError::NoImage));
        mock.expect_generate_image()
            .withf(|req: &ImageRequest| req.aspect_ratio == "4:3")
            .returning(|_| Ok(SKETCH.to_string()));

        let (tx, mut rx) = unbounded_channel();
        let sweet = generator(mock)
            .run(1, GenerationRequest::new("yuzu"), &tx)
            .await
            .unwrap();

        assert_eq!(sweet.recipe, sample_recipe());
        assert!(sweet.image_url.is_none());

        let events = drain(&mut rx);
        assert!(events.contains(&GenerationEvent::HeroImage {
            ticket: 1,
            image_url: None
        }));
        assert!(!events.iter().any(|e| matches!(e, GenerationEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn missing_field_fails_the_flow() {
        let mut mock = MockGenerativeProvider::new();
        mock.expect_generate_text().returning(|_| {
            Ok(r#"{"name":"x","description":"y","steps":["a"],"costPrice":"1",
                   "sellingPrice":"2","imagePrompt":"p","flavorProfile":"f"}"#
                .to_string())
        });
        mock.expect_generate_image().times(0);

        let (tx, mut rx) = unbounded_channel();
        let result = generator(mock)
            .run(3, GenerationRequest::new("matcha"), &tx)
            .await;
        assert!(matches!(result, Err(GenerationError::MalformedRecipe(_))));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            GenerationEvent::Failed { ticket: 3, message } if message == crate::error::ErrorKind::MalformedResponse.message(Locale::Ja)
        ));
    }

    #[tokio::test]
    async fn sketch_failures_are_isolated() {
        let mut mock = MockGenerativeProvider::new();
        mock.expect_generate_text()
            .returning(|_| Ok(SAMPLE_RECIPE_JSON.to_string()));
        mock.expect_generate_image()
            .withf(|req: &ImageRequest| req.aspect_ratio == "1:1")
            .returning(|_| Ok(HERO.to_string()));
        mock.expect_generate_image()
            .withf(|req: &ImageRequest| req.aspect_ratio == "4:3" && req.prompt.contains("melting"))
            .returning(|_| {
                Err(GenerationError::Api {
                    status: 503,
                    message: "UNAVAILABLE: overloaded".into(),
                })
            });
        mock.expect_generate_image()
            .withf(|req: &ImageRequest| req.aspect_ratio == "4:3" && req.prompt.contains("pouring"))
            .returning(|_| Ok(SKETCH.to_string()));

        let (tx, _rx) = unbounded_channel();
        let sweet = generator(mock)
            .run(1, GenerationRequest::new("forest"), &tx)
            .await
            .unwrap();

        assert!(matches!(sweet.step_illustrations[0], StepIllustration::Failed(_)));
        assert_eq!(
            sweet.step_illustrations[1],
            StepIllustration::Ready(SKETCH.into())
        );
        assert_eq!(sweet.image_url.as_deref(), Some(HERO));
    }

    #[tokio::test(start_paused = true)]
    async fn step_sketches_start_staggered() {
        let stagger = Duration::from_millis(1500);
        let started = tokio::time::Instant::now();
        let issued = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut mock = MockGenerativeProvider::new();
        mock.expect_generate_text()
            .returning(|_| Ok(SAMPLE_RECIPE_JSON.to_string()));
        mock.expect_generate_image()
            .withf(|req: &ImageRequest| req.aspect_ratio == "1:1")
            .returning(|_| Ok(HERO.to_string()));
        let log = Arc::clone(&issued);
        mock.expect_generate_image()
            .withf(|req: &ImageRequest| req.aspect_ratio == "4:3")
            .times(2)
            .returning(move |req| {
                let step = if req.prompt.contains("melting") { 0 } else { 1 };
                log.lock().unwrap().push((step, started.elapsed()));
                Ok(SKETCH.to_string())
            });

        let (tx, _rx) = unbounded_channel();
        RecipeGenerator::new(Arc::new(mock), &Config::default())
            .with_step_stagger(stagger)
            .run(1, GenerationRequest::new("forest"), &tx)
            .await
            .unwrap();

        let mut issued = issued.lock().unwrap().clone();
        issued.sort_by_key(|(step, _)| *step);
        assert_eq!(issued.len(), 2);
        assert!(issued[0].1 < stagger);
        assert!(issued[1].1 >= stagger);
        assert!(issued[1].1 < stagger * 2);
    }

    #[tokio::test]
    async fn refinement_sends_previous_recipe() {
        let previous = sample_recipe();
        let name = previous.name.clone();

        let mut mock = MockGenerativeProvider::new();
        mock.expect_generate_text()
            .withf(move |req: &TextRequest| {
                req.prompt.contains(&name) && req.prompt.contains("more sakura")
            })
            .times(1)
            .returning(|_| Ok(SAMPLE_RECIPE_JSON.to_string()));

        let request = GenerationRequest::new("more sakura").refining(Some(previous));
        let recipe = generator(mock).generate_recipe(&request).await.unwrap();
        assert_eq!(recipe.steps.len(), 2);
    }

    #[tokio::test]
    async fn illustrations_disabled_skips_sketches() {
        let mut mock = MockGenerativeProvider::new();
        mock.expect_generate_text()
            .withf(|req: &TextRequest| req.response_schema["properties"]["steps"]["items"]["type"] == "STRING")
            .returning(|_| Ok(SAMPLE_RECIPE_JSON.to_string()));
        mock.expect_generate_image()
            .withf(|req: &ImageRequest| req.aspect_ratio == "1:1")
            .times(1)
            .returning(|_| Ok(HERO.to_string()));

        let (tx, _rx) = unbounded_channel();
        let sweet = generator(mock)
            .with_illustrations(false)
            .run(1, GenerationRequest::new("plain"), &tx)
            .await
            .unwrap();

        assert!(
            sweet
                .step_illustrations
                .iter()
                .all(|s| *s == StepIllustration::Unavailable)
        );
    }
}
