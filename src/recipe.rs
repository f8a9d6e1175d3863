//! Dessert concept data model
//!
//! A [`Recipe`] is what the text model returns, parsed strictly from the
//! response schema. A [`GeneratedSweet`] pairs it with the images that arrive
//! afterwards.

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// One preparation step.
///
/// Older prompts ask for plain strings, the illustrated variant asks for an
/// instruction plus an English visual description for the sketch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecipeStep {
    Illustrated {
        instruction: String,
        #[serde(rename = "visualDescription")]
        visual_description: String,
    },
    Plain(String),
}

impl RecipeStep {
    pub fn instruction(&self) -> &str {
        match self {
            RecipeStep::Illustrated { instruction, .. } => instruction,
            RecipeStep::Plain(text) => text,
        }
    }

    pub fn visual_description(&self) -> Option<&str> {
        match self {
            RecipeStep::Illustrated {
                visual_description, ..
            } if !visual_description.trim().is_empty() => Some(visual_description),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<RecipeStep>,
    pub cost_price: String,
    pub selling_price: String,
    pub image_prompt: String,
    pub flavor_profile: String,
}

impl Recipe {
    /// Parse the model's JSON text.
    ///
    /// Every schema field is required. A recipe without a name, ingredients,
    /// steps or an image prompt is rejected rather than displayed half-empty.
    pub fn from_json(text: &str) -> Result<Self, GenerationError> {
        let recipe: Recipe = serde_json::from_str(text.trim())
            .map_err(|e| GenerationError::MalformedRecipe(e.to_string()))?;
        recipe.validate()?;
        Ok(recipe)
    }

    fn validate(&self) -> Result<(), GenerationError> {
        let missing = if self.name.trim().is_empty() {
            Some("name")
        } else if self.description.trim().is_empty() {
            Some("description")
        } else if self.ingredients.iter().all(|i| i.trim().is_empty()) {
            Some("ingredients")
        } else if self.steps.iter().all(|s| s.instruction().trim().is_empty()) {
            Some("steps")
        } else if self.image_prompt.trim().is_empty() {
            Some("imagePrompt")
        } else {
            None
        };

        match missing {
            Some(field) => Err(GenerationError::MalformedRecipe(format!(
                "field `{}` is empty",
                field
            ))),
            None => Ok(()),
        }
    }
}

/// Outcome of one step sketch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum StepIllustration {
    Pending,
    Ready(String),
    Failed(String),
    /// The step carries no visual description to draw from
    Unavailable,
}

impl StepIllustration {
    pub fn image_url(&self) -> Option<&str> {
        match self {
            StepIllustration::Ready(url) => Some(url),
            _ => None,
        }
    }
}

/// A recipe together with its images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSweet {
    pub recipe: Recipe,
    /// Hero photo as a data URI; `None` until the image call resolves
    pub image_url: Option<String>,
    #[serde(default)]
    pub step_illustrations: Vec<StepIllustration>,
}

impl GeneratedSweet {
    pub fn new(recipe: Recipe) -> Self {
        let step_illustrations = vec![StepIllustration::Pending; recipe.steps.len()];
        Self {
            recipe,
            image_url: None,
            step_illustrations,
        }
    }

    /// Fill one illustration slot. Out-of-range indices are ignored.
    pub fn set_step_illustration(&mut self, index: usize, outcome: StepIllustration) {
        if let Some(slot) = self.step_illustrations.get_mut(index) {
            *slot = outcome;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadingState {
    #[default]
    Idle,
    GeneratingRecipe,
    GeneratingImage,
    Complete,
    Error,
}

impl LoadingState {
    pub fn is_generating(self) -> bool {
        matches!(
            self,
            LoadingState::GeneratingRecipe | LoadingState::GeneratingImage
        )
    }
}

/// Everything the orchestrator needs for one submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    pub keywords: String,
    pub cost_constraint: Option<String>,
    pub price_constraint: Option<String>,
    /// Set when refining an existing creation
    pub previous: Option<Recipe>,
}

impl GenerationRequest {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            ..Self::default()
        }
    }

    pub fn with_cost(mut self, cost: Option<String>) -> Self {
        self.cost_constraint = non_blank(cost);
        self
    }

    pub fn with_price(mut self, price: Option<String>) -> Self {
        self.price_constraint = non_blank(price);
        self
    }

    pub fn refining(mut self, previous: Option<Recipe>) -> Self {
        self.previous = previous;
        self
    }

    pub fn is_refinement(&self) -> bool {
        self.previous.is_some()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_RECIPE_JSON: &str = r#"{
        "name": "Forêt de Minuit (フォレ・ド・ミニュイ)",
        "description": "初恋のように甘酸っぱい、夜の森のデザート。",
        "ingredients": ["ダークチョコレート 80g", "カシスピューレ 50g", "松の新芽シロップ 10ml"],
        "steps": [
            {"instruction": "チョコレートを湯煎で溶かす。", "visualDescription": "Sketch of chocolate melting in a bowl over water"},
            {"instruction": "カシスのジュレを流し固める。", "visualDescription": "Sketch of a hand pouring jelly into a ring mould"}
        ],
        "costPrice": "約420円",
        "sellingPrice": "1,800円",
        "imagePrompt": "A dark chocolate dome on black slate, moss-like matcha crumble, cassis glaze",
        "flavorProfile": "ほろ苦い、ベリー、森の香り"
    }"#;

    pub(crate) fn sample_recipe() -> Recipe {
        Recipe::from_json(SAMPLE_RECIPE_JSON).unwrap()
    }

    #[test]
    fn parses_illustrated_steps() {
        let recipe = sample_recipe();
        assert_eq!(recipe.ingredients.len(), 3);
        assert_eq!(recipe.steps.len(), 2);
        assert_eq!(
            recipe.steps[1].visual_description(),
            Some("Sketch of a hand pouring jelly into a ring mould")
        );
        assert_eq!(recipe.cost_price, "約420円");
    }

    #[test]
    fn parses_plain_string_steps() {
        let json = r#"{
            "name": "Yuzu Cloud",
            "description": "Airy citrus foam.",
            "ingredients": ["yuzu juice 30ml"],
            "steps": ["Whip the egg whites.", "Fold in the juice."],
            "costPrice": "300円",
            "sellingPrice": "1200円",
            "imagePrompt": "Yuzu foam in a glass",
            "flavorProfile": "citrus"
        }"#;
        let recipe = Recipe::from_json(json).unwrap();
        assert_eq!(recipe.steps[0], RecipeStep::Plain("Whip the egg whites.".into()));
        assert_eq!(recipe.steps[0].visual_description(), None);
        assert_eq!(recipe.steps[1].instruction(), "Fold in the juice.");
    }

    #[test]
    fn missing_ingredients_is_rejected() {
        let json = r#"{
            "name": "Nothing",
            "description": "x",
            "steps": ["a"],
            "costPrice": "1",
            "sellingPrice": "2",
            "imagePrompt": "p",
            "flavorProfile": "f"
        }"#;
        let err = Recipe::from_json(json).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedRecipe(ref m) if m.contains("ingredients")));
    }

    #[test]
    fn empty_image_prompt_is_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(SAMPLE_RECIPE_JSON).unwrap();
        value["imagePrompt"] = serde_json::json!("  ");
        let err = Recipe::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedRecipe(ref m) if m.contains("imagePrompt")));
    }

    #[test]
    fn empty_description_is_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(SAMPLE_RECIPE_JSON).unwrap();
        value["description"] = serde_json::json!("");
        let err = Recipe::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedRecipe(ref m) if m.contains("description")));
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert!(matches!(
            Recipe::from_json("{\"name\": "),
            Err(GenerationError::MalformedRecipe(_))
        ));
    }

    #[test]
    fn new_sweet_has_no_image_and_pending_slots() {
        let sweet = GeneratedSweet::new(sample_recipe());
        assert!(sweet.image_url.is_none());
        assert_eq!(
            sweet.step_illustrations,
            vec![StepIllustration::Pending, StepIllustration::Pending]
        );
    }

    #[test]
    fn blank_constraints_are_dropped() {
        let request = GenerationRequest::new("matcha")
            .with_cost(Some("   ".into()))
            .with_price(Some(" 1500円 ".into()));
        assert_eq!(request.cost_constraint, None);
        assert_eq!(request.price_constraint.as_deref(), Some("1500円"));
        assert!(!request.is_refinement());
    }

    #[test]
    fn generating_states() {
        assert!(LoadingState::GeneratingRecipe.is_generating());
        assert!(LoadingState::GeneratingImage.is_generating());
        assert!(!LoadingState::Idle.is_generating());
        assert!(!LoadingState::Complete.is_generating());
        assert!(!LoadingState::Error.is_generating());
    }
}
