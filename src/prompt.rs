//! Prompt templates for the patissier persona
//!
//! Builds the system instruction, the user prompt and the response schema
//! sent with every recipe request.

use serde_json::{Value, json};

use crate::recipe::GenerationRequest;

/// Appended to the hero image prompt
pub const PHOTO_STYLE: &str = "Professional food photography, 8k resolution, soft studio lighting, macro shot, highly detailed, appetizing, cinematic depth of field.";

/// Appended to every step illustration prompt
pub const SKETCH_STYLE: &str = "Black and white pencil sketch, hand-drawn technical illustration, cookbook style, simple lines, white background, minimalist, high contrast.";

pub const HERO_ASPECT_RATIO: &str = "1:1";
pub const STEP_ASPECT_RATIO: &str = "4:3";

/// Output language and currency for the generated text
#[derive(Debug, Clone)]
pub struct PromptStyle {
    pub language: String,
    pub currency: String,
    /// Ask for `{instruction, visualDescription}` steps instead of plain strings
    pub illustrated_steps: bool,
}

impl Default for PromptStyle {
    fn default() -> Self {
        Self {
            language: "Japanese".to_string(),
            currency: "Japanese yen (円)".to_string(),
            illustrated_steps: true,
        }
    }
}

pub fn system_instruction(request: &GenerationRequest, style: &PromptStyle) -> String {
    let mut instruction = format!(
        "You are a world-class avant-garde pastry chef working at a three-star restaurant.\n\
         Your job is to invent a novel, creative and visually stunning dessert based on the user's input.\n\
         \n\
         Ground rules:\n\
         1. Do not settle for an ordinary cake. Think deconstruction, molecular gastronomy, unexpected textures and artistic plating.\n\
         2. Write the name, description, ingredients and steps in {language} that a guest can easily follow and that makes them hungry. \
         The name may be French or English with a {language} reading alongside.\n\
         3. Express costPrice and sellingPrice in {currency}.\n\
         4. Write imagePrompt in detailed English for a high-quality photograph of the finished dessert: lighting, plating, texture, macro detail.",
        language = style.language,
        currency = style.currency,
    );

    if style.illustrated_steps {
        instruction.push_str(
            "\n5. For every step, write visualDescription in English: a short instruction for a simple hand-drawn sketch, like an illustration in a recipe book.",
        );
    }

    if request.cost_constraint.is_some() || request.price_constraint.is_some() {
        instruction.push_str(
            "\n\nIMPORTANT - pricing constraints.\nDesign the recipe to respect the following targets:",
        );
        if let Some(cost) = &request.cost_constraint {
            instruction.push_str(&format!("\n- Target cost: around {}", cost));
        }
        if let Some(price) = &request.price_constraint {
            instruction.push_str(&format!("\n- Target selling price: around {}", price));
        }
        instruction.push_str(
            "\nChoose ingredients and the amount of work so that they fit the price.",
        );
    }

    if request.previous.is_some() {
        instruction.push_str(
            "\n\nYou are currently refining an existing recipe. Keep what makes the previous recipe good, \
             fold in the new requests and keywords, and evolve the recipe rather than starting over.",
        );
    }

    instruction
}

pub fn user_prompt(request: &GenerationRequest) -> String {
    match &request.previous {
        Some(previous) => format!(
            "[Base recipe]\n\
             Name: {}\n\
             Character: {}\n\
             Flavor profile: {}\n\
             \n\
             [Additional requests / keywords]\n\
             {}\n\
             \n\
             Create a new recipe that builds on the base recipe above and incorporates the additional requests.",
            previous.name,
            previous.description,
            previous.flavor_profile,
            request.keywords.trim(),
        ),
        None => format!(
            "Create a unique dessert concept using the following keywords: {}",
            request.keywords.trim()
        ),
    }
}

/// JSON schema (Gemini `responseSchema` dialect) for the recipe payload
pub fn recipe_schema(style: &PromptStyle) -> Value {
    let steps_items = if style.illustrated_steps {
        json!({
            "type": "OBJECT",
            "properties": {
                "instruction": {
                    "type": "STRING",
                    "description": format!("Detailed explanation of the step in {}.", style.language)
                },
                "visualDescription": {
                    "type": "STRING",
                    "description": "English description for a hand-drawn sketch of this step (e.g. 'Sketch of a hand whisking egg whites in a bowl')."
                }
            },
            "required": ["instruction", "visualDescription"]
        })
    } else {
        json!({ "type": "STRING" })
    };

    json!({
        "type": "OBJECT",
        "properties": {
            "name": {
                "type": "STRING",
                "description": format!("Elegant name of the dessert (French or English) with a {} reading.", style.language)
            },
            "description": {
                "type": "STRING",
                "description": format!("Poetic, appetizing description of the dessert in {}.", style.language)
            },
            "ingredients": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": format!("Ingredient list with exact quantities, in {}.", style.language)
            },
            "steps": {
                "type": "ARRAY",
                "items": steps_items,
                "description": "Step-by-step preparation."
            },
            "costPrice": {
                "type": "STRING",
                "description": format!("Estimated cost in {}. Follow the target if one is given.", style.currency)
            },
            "sellingPrice": {
                "type": "STRING",
                "description": format!("Selling price in {}. Follow the target if one is given.", style.currency)
            },
            "imagePrompt": {
                "type": "STRING",
                "description": "Very detailed English prompt for a photograph of the finished dessert, focusing on lighting, plating, texture and macro detail."
            },
            "flavorProfile": {
                "type": "STRING",
                "description": "Main flavor composition (e.g. 'bittersweet, citrus, creamy')."
            }
        },
        "required": [
            "name", "description", "ingredients", "steps",
            "costPrice", "sellingPrice", "imagePrompt", "flavorProfile"
        ]
    })
}

pub fn hero_image_prompt(image_prompt: &str) -> String {
    format!("{} {}", image_prompt.trim(), PHOTO_STYLE)
}

pub fn step_sketch_prompt(visual_description: &str) -> String {
    format!("{}. {}", visual_description.trim(), SKETCH_STYLE)
}
