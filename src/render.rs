//! Terminal rendering and on-disk export of a creation

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use crate::data_uri::{decode_data_uri, extension_for};
use crate::error::Locale;
use crate::recipe::{GeneratedSweet, StepIllustration};

struct Labels {
    flavor: &'static str,
    cost: &'static str,
    price: &'static str,
    ingredients: &'static str,
    steps: &'static str,
    image: &'static str,
    ready: &'static str,
    pending: &'static str,
    failed: &'static str,
    unavailable: &'static str,
}

fn labels(locale: Locale) -> Labels {
    match locale {
        Locale::Ja => Labels {
            flavor: "フレーバー",
            cost: "原価",
            price: "販売価格",
            ingredients: "材料",
            steps: "作り方",
            image: "画像",
            ready: "生成済み",
            pending: "生成中",
            failed: "生成失敗",
            unavailable: "なし",
        },
        Locale::En => Labels {
            flavor: "Flavor",
            cost: "Cost",
            price: "Selling price",
            ingredients: "Ingredients",
            steps: "Steps",
            image: "Image",
            ready: "ready",
            pending: "in progress",
            failed: "failed",
            unavailable: "none",
        },
    }
}

/// Plain-text recipe card.
pub fn format_sweet(sweet: &GeneratedSweet, locale: Locale) -> String {
    let l = labels(locale);
    let recipe = &sweet.recipe;
    let mut out = String::new();

    let _ = writeln!(out, "== {} ==", recipe.name);
    let _ = writeln!(out, "\"{}\"", recipe.description);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}: {}", l.flavor, recipe.flavor_profile);
    let _ = writeln!(
        out,
        "{}: {}  /  {}: {}",
        l.cost, recipe.cost_price, l.price, recipe.selling_price
    );

    let _ = writeln!(out, "\n{}", l.ingredients);
    for ingredient in &recipe.ingredients {
        let _ = writeln!(out, "  - {}", ingredient);
    }

    let _ = writeln!(out, "\n{}", l.steps);
    for (i, step) in recipe.steps.iter().enumerate() {
        let _ = writeln!(out, "  {:02}  {}", i + 1, step.instruction());
        let sketch = match sweet.step_illustrations.get(i) {
            Some(StepIllustration::Ready(_)) => Some(l.ready.to_string()),
            Some(StepIllustration::Pending) => Some(l.pending.to_string()),
            Some(StepIllustration::Failed(message)) => Some(format!("{} ({})", l.failed, message)),
            Some(StepIllustration::Unavailable) | None => None,
        };
        if let Some(sketch) = sketch {
            let _ = writeln!(out, "      [sketch: {}]", sketch);
        }
    }

    let image = match &sweet.image_url {
        Some(_) => l.ready,
        None => l.unavailable,
    };
    let _ = writeln!(out, "\n{}: {}", l.image, image);

    out
}

/// Directory name for a creation saved at `now`, e.g. `20261016-142530-yuzu-cloud`.
pub fn creation_dir(base: &Path, name: &str, now: DateTime<Local>) -> PathBuf {
    base.join(format!("{}-{}", now.format("%Y%m%d-%H%M%S"), slug(name)))
}

fn slug(name: &str) -> String {
    let mut slug = String::new();
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "creation".to_string()
    } else {
        slug.to_string()
    }
}

/// Write `recipe.json`, the hero image and every ready step sketch into `dir`.
///
/// Returns the written files in that order.
pub fn save_sweet(dir: &Path, sweet: &GeneratedSweet) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let mut written = Vec::new();

    let recipe_path = dir.join("recipe.json");
    let json = serde_json::to_string_pretty(&sweet.recipe)?;
    fs::write(&recipe_path, json)
        .with_context(|| format!("Failed to write {}", recipe_path.display()))?;
    written.push(recipe_path);

    if let Some(uri) = &sweet.image_url {
        written.push(write_image(dir, "hero", uri)?);
    }

    for (i, illustration) in sweet.step_illustrations.iter().enumerate() {
        if let Some(uri) = illustration.image_url() {
            written.push(write_image(dir, &format!("step-{:02}", i + 1), uri)?);
        }
    }

    Ok(written)
}

fn write_image(dir: &Path, stem: &str, uri: &str) -> Result<PathBuf> {
    let (mime, bytes) = decode_data_uri(uri).with_context(|| format!("Bad image for {}", stem))?;
    let path = dir.join(format!("{}.{}", stem, extension_for(&mime)));
    fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
