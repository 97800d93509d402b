mod app;
mod braille;
mod clock;
mod color;
mod config;
mod engine;
mod error;
mod export;
mod field;
mod logging;
mod particle;
mod pointer;
mod presets;
mod raster;
mod relay;
mod settings;
mod surface;
mod ui;

use anyhow::{bail, Context, Result};
use app::{App, Focus};
use clap::{Parser, Subcommand};
use color::Palette;
use config::AppConfig;
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
        KeyCode, KeyEventKind, KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use export::RenderJob;
use logging::{init_logging, LogTarget};
use presets::{Preset, PresetManager};
use ratatui::{backend::CrosstermBackend, Terminal};
use relay::{HttpUpstream, RelayConfig, RelayRequest};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "particle-field")]
#[command(about = "Pointer-reactive particle field animation in the terminal")]
struct Args {
    /// Config file to load (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start from a named preset (neural, drift, storm, sparse, web or a saved one)
    #[arg(long)]
    preset: Option<String>,

    /// Color palette (neural, ember, aurora, mono)
    #[arg(long)]
    palette: Option<String>,

    /// Fixed RNG seed for a reproducible field
    #[arg(long)]
    seed: Option<u64>,

    // === Field Parameters ===
    /// Pointer interaction radius in pixels (20-400)
    #[arg(long = "pointer-radius")]
    pointer_radius: Option<f32>,

    /// Repulsion strength (0.0-2.0)
    #[arg(long)]
    repel: Option<f32>,

    /// Maximum drift speed per axis (0.0-5.0)
    #[arg(long)]
    drift: Option<f32>,

    /// Particles for narrow viewports (1-110)
    #[arg(long = "narrow-count")]
    narrow_count: Option<usize>,

    /// Particles for wide viewports (1-110)
    #[arg(long = "wide-count")]
    wide_count: Option<usize>,

    /// Target frame rate (10-120)
    #[arg(long)]
    fps: Option<u32>,

    /// Hide the on-canvas pointer marker
    #[arg(long = "no-marker")]
    no_marker: bool,

    // === Presets ===
    /// Save the resulting settings as a user preset and exit
    #[arg(long = "save-preset", value_name = "NAME")]
    save_preset: Option<String>,

    /// Delete a user preset and exit
    #[arg(long = "delete-preset", value_name = "NAME")]
    delete_preset: Option<String>,

    /// Directory for the log file in interactive mode
    #[arg(long = "log-dir")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate headlessly and write a PNG snapshot and/or an animated GIF
    Render {
        #[arg(long, default_value = "1280")]
        width: u32,

        #[arg(long, default_value = "720")]
        height: u32,

        /// Frames to simulate
        #[arg(long, default_value = "180")]
        frames: usize,

        /// PNG snapshot of the last frame
        #[arg(long)]
        png: Option<PathBuf>,

        /// Animated GIF of the run
        #[arg(long)]
        gif: Option<PathBuf>,

        /// Keep every Nth frame in the GIF
        #[arg(long, default_value = "2")]
        stride: usize,

        /// Move a virtual pointer in a loop around the center
        #[arg(long)]
        orbit: bool,
    },
    /// Send a source file to the code-analysis relay and print the response
    Analyze {
        /// Source file to analyze
        file: PathBuf,
    },
}

fn parse_palette(s: &str) -> Result<Palette> {
    match s.to_lowercase().as_str() {
        "neural" => Ok(Palette::Neural),
        "ember" => Ok(Palette::Ember),
        "aurora" => Ok(Palette::Aurora),
        "mono" | "gray" | "grey" => Ok(Palette::Mono),
        other => bail!("unknown palette '{}' (expected neural, ember, aurora or mono)", other),
    }
}

/// Config file, then preset, then individual flags
fn resolve_config(args: &Args, presets: &PresetManager) -> Result<AppConfig> {
    let mut config = AppConfig::resolve(args.config.as_deref()).context("Failed to load config")?;

    if let Some(name) = &args.preset {
        let preset = presets
            .find(name)
            .with_context(|| format!("Unknown preset '{}'", name))?;
        config.settings = preset.settings.clone();
        config.palette = preset.palette;
    }
    if let Some(palette) = &args.palette {
        config.palette = parse_palette(palette)?;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let settings = &mut config.settings;
    if let Some(radius) = args.pointer_radius {
        settings.pointer_radius = radius;
    }
    if let Some(repel) = args.repel {
        settings.repel_strength = repel;
    }
    if let Some(drift) = args.drift {
        settings.max_drift = drift;
    }
    if let Some(count) = args.narrow_count {
        settings.narrow_count = count;
    }
    if let Some(count) = args.wide_count {
        settings.wide_count = count;
    }
    if let Some(fps) = args.fps {
        settings.target_fps = fps;
    }
    if args.no_marker {
        settings.show_pointer_marker = false;
    }
    config.settings = config.settings.clone().sanitized();

    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut presets = PresetManager::new();

    if let Some(name) = &args.delete_preset {
        let _guard = init_logging(LogTarget::Stderr, "warn")?;
        let removed = presets
            .delete_preset(name)
            .with_context(|| format!("Failed to delete preset '{}'", name))?;
        if removed {
            println!("Deleted preset '{}'", name);
        } else {
            println!("No user preset named '{}'", name);
        }
        return Ok(());
    }

    let config = resolve_config(&args, &presets)?;

    if let Some(name) = &args.save_preset {
        let _guard = init_logging(LogTarget::Stderr, "warn")?;
        let preset = Preset::new(name.clone(), "Saved from the command line", config.settings, config.palette);
        let path = presets
            .save_preset(preset)
            .with_context(|| format!("Failed to save preset '{}'", name))?;
        println!("Saved preset '{}' to {}", name, path.display());
        return Ok(());
    }

    match args.command {
        Some(Command::Render {
            width,
            height,
            frames,
            png,
            gif,
            stride,
            orbit,
        }) => {
            let _guard = init_logging(LogTarget::Stderr, "info")?;
            if png.is_none() && gif.is_none() {
                bail!("Nothing to write: pass --png and/or --gif");
            }
            let job = RenderJob {
                width,
                height,
                frames,
                settings: config.settings,
                palette: config.palette,
                seed: config.seed,
                orbit_pointer: orbit,
                png,
                gif,
                gif_stride: stride,
            };
            let report = export::render(&job).context("Render failed")?;
            println!(
                "Rendered {} frames ({} in GIF) with {} particles",
                report.frames, report.gif_frames, report.particles
            );
            Ok(())
        }
        Some(Command::Analyze { file }) => {
            let _guard = init_logging(LogTarget::Stderr, "info")?;
            run_analyze(&file)
        }
        None => {
            let log_dir = args.log_dir.clone().unwrap_or_else(LogTarget::default_dir);
            let guard = init_logging(LogTarget::File(log_dir), "info")?;
            if let Some(path) = guard.log_file() {
                tracing::info!(path = %path.display(), "logging to file");
            }
            run_terminal(&config, presets)
        }
    }
}

fn run_analyze(file: &std::path::Path) -> Result<()> {
    let code = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let request = RelayRequest::post(serde_json::json!({ "code": code }).to_string());

    let response = relay::handle(&request, &RelayConfig::from_env(), &HttpUpstream::new());

    println!("{}", serde_json::to_string_pretty(&response.body)?);
    if response.status != 200 {
        bail!("Analysis relay returned status {}", response.status);
    }
    Ok(())
}

fn run_terminal(config: &AppConfig, presets: PresetManager) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = terminal
        .size()
        .map_err(anyhow::Error::from)
        .and_then(|size| {
            App::new((size.width, size.height), config, presets)
                .context("Terminal is too small for the particle field")
        })
        .and_then(|mut app| {
            app.start();
            run_app(&mut terminal, &mut app)
        });

    // Cleanup
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!("{:#}", err);
    }
    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let mut dirty = true;

    loop {
        if dirty {
            terminal.draw(|frame| ui::render(frame, app))?;
            dirty = false;
        }

        // Sleep until the next frame or settled resize, unless input arrives first
        let now = Instant::now();
        let mut timeout = app.clock.time_until_due(now);
        if let Some(resize) = app.resize.time_until_ready(now) {
            timeout = timeout.min(resize);
        }

        if event::poll(timeout.max(Duration::from_millis(1)))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only process Press events
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    // Handle Ctrl+C
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    app.status_message = None;
                    dirty = true;

                    match key.code {
                        // System controls
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char(' ') => app.toggle_pause(),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.reset(),
                        KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_fullscreen(),
                        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => app.toggle_help(),
                        KeyCode::Char('p') | KeyCode::Char('P') => app.next_preset(),
                        KeyCode::Char('w') | KeyCode::Char('W') => app.save_config(),
                        KeyCode::Char('c') | KeyCode::Char('C') => {
                            app.cycle_palette();
                            app.focus = Focus::Palette;
                        }
                        KeyCode::Char('+') | KeyCode::Char('=') => app.increase_fps(),
                        KeyCode::Char('-') | KeyCode::Char('_') => app.decrease_fps(),

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Right => {
                            if app.focus.is_param() {
                                app.adjust_focused_up();
                            }
                        }
                        KeyCode::Left => {
                            if app.focus.is_param() {
                                app.adjust_focused_down();
                            }
                        }
                        KeyCode::Up => {
                            if app.show_help {
                                app.scroll_help_up();
                            } else if app.focus.is_param() {
                                app.adjust_focused_up();
                            } else {
                                app.scroll_controls_up();
                            }
                        }
                        KeyCode::Down => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            } else if app.focus.is_param() {
                                app.adjust_focused_down();
                            } else {
                                let visible = ui::get_controls_visible_lines(app.terminal_size.1);
                                app.scroll_controls_down(ui::CONTROLS_CONTENT_LINES.saturating_sub(visible));
                            }
                        }
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else if app.focus.is_param() {
                                app.focus = Focus::Controls;
                            }
                        }
                        KeyCode::Char('j') | KeyCode::Char('J') => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            }
                        }
                        KeyCode::Char('k') | KeyCode::Char('K') => {
                            if app.show_help {
                                app.scroll_help_up();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::Moved | MouseEventKind::Drag(_) | MouseEventKind::Down(_) => {
                        app.on_pointer(mouse.column, mouse.row);
                    }
                    _ => {}
                },
                Event::FocusLost => app.on_pointer_left(),
                Event::Resize(width, height) => app.on_terminal_resize(width, height, Instant::now()),
                _ => {}
            }
        }

        dirty |= app.tick(Instant::now());
    }
}
