//! Main eframe application

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use eframe::egui;
use tracing::{debug, warn};

use super::worker::WorkerHandle;
use crate::config::Config;
use crate::data_uri::decode_data_uri;
use crate::error::Locale;
use crate::generator::RecipeGenerator;
use crate::recipe::{GeneratedSweet, LoadingState, StepIllustration};
use crate::studio::{StudioCommand, StudioState};

const GOLD: egui::Color32 = egui::Color32::from_rgb(212, 175, 55);
const CREAM: egui::Color32 = egui::Color32::from_rgb(245, 240, 230);

/// System fonts with Japanese glyphs, tried in order
const CJK_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
    "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
    "C:\\Windows\\Fonts\\YuGothM.ttc",
    "C:\\Windows\\Fonts\\msgothic.ttc",
];

/// The main desktop application
pub struct DesktopApp {
    state: StudioState,
    worker: WorkerHandle,
    textures: Textures,
}

impl DesktopApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &Config) -> Result<Self> {
        Self::configure_style(&cc.egui_ctx);
        Self::configure_fonts(&cc.egui_ctx);

        let generator = RecipeGenerator::from_config(config);
        let worker = WorkerHandle::start(generator)?;

        Ok(Self {
            state: StudioState::new(config.studio.locale),
            worker,
            textures: Textures::default(),
        })
    }

    fn configure_style(ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        style.text_styles.insert(
            egui::TextStyle::Body,
            egui::FontId::new(15.0, egui::FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            egui::FontId::new(15.0, egui::FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Heading,
            egui::FontId::new(26.0, egui::FontFamily::Proportional),
        );

        style.visuals = egui::Visuals::dark();
        style.visuals.override_text_color = Some(CREAM);
        style.visuals.window_corner_radius = egui::CornerRadius::same(8);
        style.visuals.widgets.noninteractive.corner_radius = egui::CornerRadius::same(4);
        style.visuals.widgets.inactive.corner_radius = egui::CornerRadius::same(4);
        style.visuals.widgets.hovered.corner_radius = egui::CornerRadius::same(4);
        style.visuals.widgets.active.corner_radius = egui::CornerRadius::same(4);

        ctx.set_style(style);
    }

    /// egui's bundled fonts have no kana or kanji; borrow a system font if one exists.
    fn configure_fonts(ctx: &egui::Context) {
        let Some((path, bytes)) = CJK_FONT_CANDIDATES
            .iter()
            .find_map(|path| std::fs::read(path).ok().map(|bytes| (*path, bytes)))
        else {
            warn!("No CJK font found; Japanese text may not render");
            return;
        };
        debug!("Using CJK font {}", path);

        let mut fonts = egui::FontDefinitions::default();
        fonts.font_data.insert(
            "cjk".to_string(),
            Arc::new(egui::FontData::from_owned(bytes)),
        );
        for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
            fonts
                .families
                .entry(family)
                .or_default()
                .push("cjk".to_string());
        }
        ctx.set_fonts(fonts);
    }

    /// Process all pending worker events
    fn process_worker_events(&mut self) {
        while let Some(event) = self.worker.try_recv() {
            self.state.apply(event);
        }
    }

    fn send(&mut self, command: StudioCommand) {
        if let Err(e) = self.worker.send(command) {
            self.state.error = Some(format!("Failed to send to worker: {}", e));
        }
    }
}

impl eframe::App for DesktopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_worker_events();

        // Keep polling until every sketch has arrived
        if !self.state.is_settled() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(8.0);
                ui.heading(egui::RichText::new("L'ATELIER IA").color(GOLD).strong());
                let tagline = match self.state.locale {
                    Locale::Ja => "AIパティシエが贈る、至高のスイーツ提案",
                    Locale::En => "Signature desserts, designed by an AI patissier",
                };
                ui.label(egui::RichText::new(tagline).italics());
                ui.add_space(8.0);
            });
        });

        let mut command = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                command = input_section(ui, &mut self.state);
                ui.add_space(12.0);
                progress_section(ui, &mut self.state);

                if let Some(sweet) = &self.state.current {
                    ui.add_space(12.0);
                    showcase(ui, sweet, &self.state, &mut self.textures);
                }
            });
        });

        if let Some(command) = command {
            self.send(command);
        }
    }
}

fn input_section(ui: &mut egui::Ui, state: &mut StudioState) -> Option<StudioCommand> {
    let (keywords_hint, order, refine, reset) = match state.locale {
        Locale::Ja => (
            "例: 初恋, 真夜中の森, 柚子",
            "オーダー",
            "改良する",
            "リセット",
        ),
        Locale::En => (
            "e.g. first love, midnight forest, yuzu",
            "Order",
            "Refine",
            "Reset",
        ),
    };

    let mut command = None;
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.add_enabled(
            !state.is_generating(),
            egui::TextEdit::multiline(&mut state.keywords)
                .hint_text(keywords_hint)
                .desired_rows(2)
                .desired_width(f32::INFINITY),
        );

        ui.horizontal(|ui| {
            ui.label("Cost");
            ui.add(
                egui::TextEdit::singleline(&mut state.cost)
                    .hint_text("300円")
                    .desired_width(120.0),
            );
            ui.label("Price");
            ui.add(
                egui::TextEdit::singleline(&mut state.price)
                    .hint_text("1500円")
                    .desired_width(120.0),
            );
        });

        ui.horizontal(|ui| {
            if ui
                .add_enabled(state.can_submit(), egui::Button::new(order))
                .clicked()
            {
                command = state.submit(false);
            }
            if ui
                .add_enabled(state.can_refine(), egui::Button::new(refine))
                .clicked()
            {
                command = state.submit(true);
            }
            if ui.button(reset).clicked() {
                command = Some(state.reset());
            }
        });
    });
    command
}

fn progress_section(ui: &mut egui::Ui, state: &mut StudioState) {
    if let Some(line) = state.status_line() {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(egui::RichText::new(line).color(GOLD).size(18.0));
        });
        if let Some(detail) = state.status_detail() {
            ui.label(egui::RichText::new(detail).weak());
        }
    }

    let mut dismissed = false;
    if let Some(error) = &state.error {
        egui::Frame::group(ui.style())
            .fill(egui::Color32::from_rgb(90, 24, 24))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::from_rgb(255, 200, 200), error);
                    dismissed = ui.small_button("x").clicked();
                });
            });
    }
    if dismissed {
        state.clear_error();
    }
}

fn showcase(
    ui: &mut egui::Ui,
    sweet: &GeneratedSweet,
    state: &StudioState,
    textures: &mut Textures,
) {
    let recipe = &sweet.recipe;
    let (plating, no_image, ingredients, steps, flavor, cost, price) = match state.locale {
        Locale::Ja => (
            "盛り付け中...",
            "画像なし",
            "材料",
            "作り方",
            "フレーバー",
            "原価",
            "販売価格",
        ),
        Locale::En => (
            "Plating...",
            "No image",
            "Ingredients",
            "Steps",
            "Flavor",
            "Cost",
            "Selling price",
        ),
    };

    ui.vertical_centered(|ui| match hero_slot(sweet, state.loading) {
        HeroSlot::Image(uri) => match textures.get(ui.ctx(), "hero", uri) {
            Some(texture) => {
                ui.add(egui::Image::new(&texture).max_width(480.0));
            }
            None => {
                ui.label(egui::RichText::new("(image could not be displayed)").weak());
            }
        },
        HeroSlot::Plating => {
            ui.add_space(40.0);
            ui.spinner();
            ui.label(egui::RichText::new(plating).weak());
            ui.add_space(40.0);
        }
        HeroSlot::Unavailable => {
            ui.label(egui::RichText::new(no_image).weak());
        }
    });

    ui.add_space(8.0);
    ui.heading(egui::RichText::new(&recipe.name).color(GOLD));
    ui.label(egui::RichText::new(format!("\"{}\"", recipe.description)).italics());
    ui.add_space(6.0);
    ui.label(format!("{}: {}", flavor, recipe.flavor_profile));
    ui.horizontal(|ui| {
        ui.label(format!("{}: {}", cost, recipe.cost_price));
        ui.separator();
        ui.label(
            egui::RichText::new(format!("{}: {}", price, recipe.selling_price)).color(GOLD),
        );
    });

    ui.add_space(10.0);
    ui.label(egui::RichText::new(ingredients).strong().size(18.0));
    for ingredient in &recipe.ingredients {
        ui.label(format!("• {}", ingredient));
    }

    ui.add_space(10.0);
    ui.label(egui::RichText::new(steps).strong().size(18.0));
    for (i, step) in recipe.steps.iter().enumerate() {
        ui.add_space(6.0);
        ui.horizontal_top(|ui| {
            ui.label(
                egui::RichText::new(format!("{:02}", i + 1))
                    .color(GOLD)
                    .size(22.0),
            );
            ui.vertical(|ui| {
                ui.label(step.instruction());
                match sweet.step_illustrations.get(i) {
                    Some(StepIllustration::Ready(uri)) => {
                        let key = format!("step-{}", i);
                        if let Some(texture) = textures.get(ui.ctx(), &key, uri) {
                            ui.add(egui::Image::new(&texture).max_width(240.0));
                        }
                    }
                    Some(StepIllustration::Pending) => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(egui::RichText::new("sketching...").weak());
                        });
                    }
                    Some(StepIllustration::Failed(message)) => {
                        ui.label(egui::RichText::new(message).weak().small());
                    }
                    Some(StepIllustration::Unavailable) | None => {}
                }
            });
        });
    }
}

#[derive(Debug, PartialEq, Eq)]
enum HeroSlot<'a> {
    Image(&'a str),
    Plating,
    Unavailable,
}

/// Only an image request still in flight gets the spinner.
fn hero_slot(sweet: &GeneratedSweet, loading: LoadingState) -> HeroSlot<'_> {
    match &sweet.image_url {
        Some(uri) => HeroSlot::Image(uri),
        None if loading == LoadingState::GeneratingImage => HeroSlot::Plating,
        None => HeroSlot::Unavailable,
    }
}

/// Decoded images for the creation on display, keyed by slot.
///
/// A slot is reloaded whenever its data URI changes, since the ticket moves
/// on while the previous creation is still shown.
#[derive(Default)]
struct Textures {
    loaded: HashMap<String, (String, Option<egui::TextureHandle>)>,
}

impl Textures {
    fn get(&mut self, ctx: &egui::Context, key: &str, uri: &str) -> Option<egui::TextureHandle> {
        if let Some((cached_uri, texture)) = self.loaded.get(key)
            && cached_uri == uri
        {
            return texture.clone();
        }

        let texture = match load_texture(ctx, key, uri) {
            Ok(texture) => Some(texture),
            Err(e) => {
                warn!("Could not decode {} image: {:#}", key, e);
                None
            }
        };
        self.loaded
            .insert(key.to_string(), (uri.to_string(), texture.clone()));
        texture
    }
}

fn load_texture(ctx: &egui::Context, name: &str, uri: &str) -> Result<egui::TextureHandle> {
    let (_, bytes) = decode_data_uri(uri)?;
    let rgba = image::load_from_memory(&bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    Ok(ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR))
}
