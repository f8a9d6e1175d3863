//! Desktop GUI launch command

use anyhow::Result;
use clap::Args;

use crate::config::Config;

#[derive(Args)]
pub struct DesktopArgs {
    /// Initial window width
    #[arg(long, default_value_t = 900.0)]
    pub width: f32,

    /// Initial window height
    #[arg(long, default_value_t = 960.0)]
    pub height: f32,
}

pub fn run(args: DesktopArgs, config: Config) -> Result<()> {
    use crate::desktop::DesktopApp;

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([args.width, args.height])
            .with_min_inner_size([480.0, 480.0])
            .with_title("L'Atelier IA"),
        ..Default::default()
    };

    eframe::run_native(
        "L'Atelier IA",
        native_options,
        Box::new(move |cc| Ok(Box::new(DesktopApp::new(cc, &config)?))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run desktop app: {}", e))
}
