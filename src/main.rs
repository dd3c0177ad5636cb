use ::rand as external_rand;
use clap::Parser;
use external_rand::rngs::StdRng;
use external_rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use rootweave::config::GrowthConfig;
use rootweave::simulation::Simulation;

#[cfg(feature = "ui")]
use macroquad::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run in headless mode (HTTP API server)
    #[arg(long)]
    headless: bool,

    /// Port for headless API server
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Configuration file path (YAML or JSON). If not specified, searches for rootweave.yaml, rootweave.yml, or rootweave.json in current directory.
    #[arg(short, long)]
    config: Option<String>,

    /// Seed for the random generator; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Simulate offline and write the final frame to this PNG, then exit
    #[arg(long)]
    snapshot: Option<String>,

    /// Number of 16 ms ticks to simulate for --snapshot
    #[arg(long, default_value_t = 600)]
    ticks: usize,

    /// Surface width for headless and snapshot modes (overrides config)
    #[arg(long)]
    width: Option<f32>,

    /// Surface height for headless and snapshot modes (overrides config)
    #[arg(long)]
    height: Option<f32>,
}

impl Args {
    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(not(feature = "ui"))]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let args = Args::parse();
    let config = load_config(&args)?;

    if let Some(path) = args.snapshot.as_deref() {
        return snapshot_main(&args, config, path);
    }
    headless_main(&args, config).await
}

#[cfg(feature = "ui")]
#[macroquad::main(window_conf)]
async fn main() {
    init_logging();
    let args = Args::parse();

    // Load configuration
    let config = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("error loading config: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = args.snapshot.as_deref() {
        if let Err(e) = snapshot_main(&args, config, path) {
            tracing::error!("snapshot failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    if args.headless {
        // Run headless mode even with UI feature enabled
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("failed to start tokio runtime: {}", e);
                std::process::exit(1);
            }
        };
        rt.block_on(async {
            if let Err(e) = headless_main(&args, config).await {
                tracing::error!("error running headless mode: {}", e);
                std::process::exit(1);
            }
        });
    } else {
        // Run UI mode
        ui_main(&args, config).await;
    }
}

/// Load configuration from file or use default, then apply surface overrides
fn load_config(args: &Args) -> Result<GrowthConfig, Box<dyn std::error::Error>> {
    let mut config = if let Some(path) = args.config.as_deref() {
        // User specified a config file
        GrowthConfig::from_file(path)?
    } else {
        // Try default paths
        GrowthConfig::from_default_paths()
    };

    if let Some(width) = args.width {
        config.surface_width = width;
    }
    if let Some(height) = args.height {
        config.surface_height = height;
    }
    config.validate()?;
    Ok(config)
}

fn snapshot_main(
    args: &Args,
    config: GrowthConfig,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let seed = args.seed.unwrap_or_else(::rand::random);
    tracing::info!(seed, ticks = args.ticks, "running offline snapshot");
    rootweave::snapshot::write_snapshot(config, seed, args.ticks, 16.0, path)?;
    Ok(())
}

#[cfg(feature = "ui")]
async fn ui_main(args: &Args, config: GrowthConfig) {
    use rootweave::controls::handle_controls;
    use rootweave::render::DrawSurface;
    use rootweave::visualization::{draw_help_popup, draw_stats_and_help, ScreenSurface};

    let mut rng = args.rng();
    let mut surface = ScreenSurface::new();
    let (width, height) = surface.size();
    let mut sim = Simulation::with_surface(&mut rng, config, width, height);
    let mut help_visible = false;

    loop {
        // Follow the window size; branches keep their coordinates
        let (w, h) = (screen_width(), screen_height());
        if (w, h) != surface.size() {
            surface.resize(w, h);
            sim.resize(w, h);
        }

        let requests = handle_controls(&mut sim, &mut rng);
        if requests.toggle_help {
            help_visible = !help_visible;
        }

        sim.frame(&mut rng, get_time() * 1000.0);
        sim.render(&mut surface);

        draw_stats_and_help(&sim.stats(), sim.paused, sim.speed_multiplier);
        if help_visible {
            draw_help_popup();
        } else {
            let hint_text = "Press F1 for controls";
            let hint_font_size = 16.0;
            let hint_width = measure_text(hint_text, None, hint_font_size as u16, 1.0).width;
            draw_text(
                hint_text,
                screen_width() - hint_width - 10.0,
                screen_height() - 25.0,
                hint_font_size,
                Color::new(0.7, 0.7, 0.7, 0.6),
            );
        }

        // Take screenshot if requested
        if requests.screenshot {
            let timestamp = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            let filename = format!("rootweave_screenshot_{}.png", timestamp);

            match capture_screenshot(&filename) {
                Ok(_) => tracing::info!(file = %filename, "screenshot saved"),
                Err(e) => tracing::warn!(file = %filename, "failed to save screenshot: {}", e),
            }
        }

        next_frame().await;
    }
}

#[cfg(feature = "ui")]
fn window_conf() -> Conf {
    // Try to load config to set window size, fall back to defaults if not available
    let config = GrowthConfig::from_default_paths();

    Conf {
        window_title: "rootweave".to_owned(),
        window_width: config.surface_width as i32,
        window_height: config.surface_height as i32,
        window_resizable: true,
        ..Default::default()
    }
}

#[cfg(feature = "ui")]
/// Save the current framebuffer as a PNG.
fn capture_screenshot(filename: &str) -> Result<(), Box<dyn std::error::Error>> {
    let frame = get_screen_data();
    let (width, height) = (u32::from(frame.width), u32::from(frame.height));
    let mut img = image::RgbaImage::from_raw(width, height, frame.bytes)
        .ok_or("framebuffer size does not match its dimensions")?;
    // GL rows run bottom-up
    image::imageops::flip_vertical_in_place(&mut img);
    img.save(filename)?;
    Ok(())
}

/// Headless mode - runs HTTP API server
async fn headless_main(args: &Args, config: GrowthConfig) -> Result<(), Box<dyn std::error::Error>> {
    use rootweave::api::{run_server, ApiState};

    let mut rng = args.rng();
    let sim = Simulation::with_config(&mut rng, config);
    let api_state = ApiState::with_rng(sim, rng);

    run_server(api_state, args.port).await?;

    Ok(())
}
