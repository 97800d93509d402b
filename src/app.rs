use crate::braille::{self, BrailleCanvas};
use crate::clock::{FrameClock, ResizeDebounce};
use crate::color::Palette;
use crate::config::AppConfig;
use crate::engine::FieldEngine;
use crate::presets::PresetManager;
use crate::surface::DrawSurface;
use crate::ui;
use ratatui::layout::Rect;
use std::time::Instant;

/// Focus state for parameter editing in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    PointerRadius,
    Repel,
    PointerLink,
    AmbientLink,
    Drift,
    NarrowCount,
    WideCount,
    Palette,
    Fps,
    // Controls box (not a param)
    Controls,
}

impl Focus {
    /// Tab cycles through parameters in sidebar order
    pub fn next(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::PointerRadius,
            Focus::PointerRadius => Focus::Repel,
            Focus::Repel => Focus::PointerLink,
            Focus::PointerLink => Focus::AmbientLink,
            Focus::AmbientLink => Focus::Drift,
            Focus::Drift => Focus::NarrowCount,
            Focus::NarrowCount => Focus::WideCount,
            Focus::WideCount => Focus::Palette,
            Focus::Palette => Focus::Fps,
            Focus::Fps => Focus::PointerRadius, // Loop back
        }
    }

    /// Shift+Tab cycles in reverse
    pub fn prev(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Fps,
            Focus::PointerRadius => Focus::Fps, // Loop back
            Focus::Repel => Focus::PointerRadius,
            Focus::PointerLink => Focus::Repel,
            Focus::AmbientLink => Focus::PointerLink,
            Focus::Drift => Focus::AmbientLink,
            Focus::NarrowCount => Focus::Drift,
            Focus::WideCount => Focus::NarrowCount,
            Focus::Palette => Focus::WideCount,
            Focus::Fps => Focus::Palette,
        }
    }

    /// Line index of this parameter in the parameters box
    pub fn line_index(&self) -> u16 {
        match self {
            Focus::None | Focus::Controls => 0,
            Focus::PointerRadius => 0,
            Focus::Repel => 1,
            Focus::PointerLink => 2,
            Focus::AmbientLink => 3,
            Focus::Drift => 4,
            Focus::NarrowCount => 5,
            Focus::WideCount => 6,
            Focus::Palette => 7,
            Focus::Fps => 8,
        }
    }

    /// Check if focus is on a parameter (not Controls or None)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }
}

/// Main application state
pub struct App {
    pub engine: FieldEngine<BrailleCanvas>,
    pub clock: FrameClock,
    pub resize: ResizeDebounce,
    pub presets: PresetManager,
    pub preset_index: Option<usize>,
    pub seed: Option<u64>,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    pub controls_scroll: u16,
    /// Last known terminal size
    pub terminal_size: (u16, u16),
    pub status_message: Option<String>,
}

impl App {
    /// Build the app for a terminal of the given size. Returns `None` when the
    /// terminal leaves no room for a canvas.
    pub fn new(terminal_size: (u16, u16), config: &AppConfig, presets: PresetManager) -> Option<Self> {
        let (columns, rows) = ui::get_canvas_size(full_rect(terminal_size), false);
        let surface = (columns > 0 && rows > 0).then(|| BrailleCanvas::new(columns, rows));
        let engine = FieldEngine::attach(surface, config.settings.clone(), config.palette, config.seed)?;

        Some(Self {
            engine,
            clock: FrameClock::new(config.settings.target_fps),
            resize: ResizeDebounce::default(),
            presets,
            preset_index: None,
            seed: config.seed,
            focus: Focus::Controls,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            controls_scroll: 0,
            terminal_size,
            status_message: None,
        })
    }

    /// Kick off the frame loop
    pub fn start(&mut self) {
        self.engine.start(&mut self.clock);
    }

    pub fn is_paused(&self) -> bool {
        !self.engine.is_running()
    }

    /// Fire the pending frame if it is due, and apply a settled resize.
    /// Returns whether anything changed on screen.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        if let Some(size) = self.resize.take_ready(now) {
            self.apply_terminal_size(size);
            changed = true;
        }
        if let Some(request) = self.clock.take_due(now) {
            changed |= self.engine.on_frame(&mut self.clock, request);
        }
        changed
    }

    /// Terminal reported a new size; applied once resizing settles
    pub fn on_terminal_resize(&mut self, width: u16, height: u16, now: Instant) {
        self.resize.notify((width, height), now);
    }

    /// Resize the canvas for a terminal size, regenerating the field if it changed
    pub fn apply_terminal_size(&mut self, size: (u16, u16)) {
        self.terminal_size = size;
        let (columns, rows) = ui::get_canvas_size(full_rect(size), self.fullscreen_mode);
        let canvas = self.engine.surface();
        if canvas.columns() == columns && canvas.rows() == rows {
            return;
        }
        let (width, height) = braille::viewport_size(columns, rows);
        self.engine.resize(width, height);
    }

    /// Inner canvas rectangle for the current terminal size
    pub fn canvas_area(&self) -> Rect {
        ui::get_canvas_inner(full_rect(self.terminal_size), self.fullscreen_mode)
    }

    /// Mouse moved (or dragged) to a terminal cell
    pub fn on_pointer(&mut self, column: u16, row: u16) {
        let area = self.canvas_area();
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        if inside {
            let (x, y) = braille::cell_center(column - area.x, row - area.y);
            self.engine.pointer_moved(x, y);
        } else {
            self.engine.pointer_left();
        }
    }

    /// Pointer left the canvas (terminal lost focus)
    pub fn on_pointer_left(&mut self) {
        self.engine.pointer_left();
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_up(&mut self) {
        self.adjust_focused(1.0);
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_down(&mut self) {
        self.adjust_focused(-1.0);
    }

    fn adjust_focused(&mut self, sign: f32) {
        let settings = &mut self.engine.field_mut().settings;
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::PointerRadius => settings.adjust_pointer_radius(10.0 * sign),
            Focus::Repel => settings.adjust_repel_strength(0.05 * sign),
            Focus::PointerLink => settings.adjust_pointer_link_distance(10.0 * sign),
            Focus::AmbientLink => settings.adjust_ambient_link_distance(10.0 * sign),
            Focus::Drift => {
                settings.adjust_max_drift(0.05 * sign);
                self.engine.reset();
            }
            Focus::NarrowCount => {
                settings.adjust_narrow_count(5 * sign as i32);
                self.engine.reset();
            }
            Focus::WideCount => {
                settings.adjust_wide_count(5 * sign as i32);
                self.engine.reset();
            }
            Focus::Palette => {
                if sign > 0.0 {
                    self.cycle_palette();
                } else {
                    self.cycle_palette_prev();
                }
            }
            Focus::Fps => {
                settings.adjust_target_fps(5 * sign as i32);
                let fps = settings.target_fps;
                self.clock.set_target_fps(fps);
            }
        }
        self.preset_index = None;
    }

    /// Cycle to next focus
    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Navigate to previous parameter (Shift+Tab)
    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Pause stops the frame loop; resume restarts it
    pub fn toggle_pause(&mut self) {
        if self.engine.is_running() {
            self.engine.stop(&mut self.clock);
        } else {
            self.engine.start(&mut self.clock);
        }
    }

    /// Regenerate the particles at the current size
    pub fn reset(&mut self) {
        self.engine.reset();
    }

    pub fn palette(&self) -> Palette {
        self.engine.field().palette()
    }

    pub fn cycle_palette(&mut self) {
        let next = self.palette().next();
        self.engine.field_mut().set_palette(next);
    }

    pub fn cycle_palette_prev(&mut self) {
        let prev = self.palette().prev();
        self.engine.field_mut().set_palette(prev);
    }

    /// Switch to the next preset (builtin then user)
    pub fn next_preset(&mut self) {
        if self.presets.is_empty() {
            return;
        }
        let index = self.preset_index.map_or(0, |i| (i + 1) % self.presets.len());
        self.apply_preset(index);
    }

    /// Apply the preset at `index` and regenerate the field
    pub fn apply_preset(&mut self, index: usize) {
        let Some(preset) = self.presets.get(index) else { return };
        let (settings, palette, name) = (preset.settings.clone(), preset.palette, preset.name.clone());

        self.clock.set_target_fps(settings.target_fps);
        let field = self.engine.field_mut();
        field.settings = settings;
        field.set_palette(palette);
        self.engine.reset();

        self.preset_index = Some(index);
        self.status_message = Some(format!("Preset: {}", name));
        tracing::info!(preset = %name, "preset applied");
    }

    /// Name of the active preset, if the settings still match one
    pub fn preset_name(&self) -> Option<&str> {
        self.preset_index
            .and_then(|i| self.presets.get(i))
            .map(|p| p.name.as_str())
    }

    /// Snapshot of the current settings as a config
    pub fn current_config(&self) -> AppConfig {
        AppConfig {
            settings: self.engine.field().settings.clone(),
            palette: self.palette(),
            seed: self.seed,
            ..AppConfig::default()
        }
    }

    /// Write the current config to the default location
    pub fn save_config(&mut self) {
        match self.current_config().save_default() {
            Ok(path) => {
                tracing::info!(path = %path.display(), "config saved");
                self.status_message = Some("Config saved".to_string());
            }
            Err(err) => {
                tracing::warn!(%err, "config save failed");
                self.status_message = Some(format!("Save failed: {}", err));
            }
        }
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
        self.apply_terminal_size(self.terminal_size);
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0; // Reset scroll when opening
        }
    }

    /// Scroll help content up
    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    /// Scroll help content down
    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    /// Scroll controls box up
    pub fn scroll_controls_up(&mut self) {
        self.controls_scroll = self.controls_scroll.saturating_sub(1);
    }

    /// Scroll controls box down
    pub fn scroll_controls_down(&mut self, max_scroll: u16) {
        self.controls_scroll = (self.controls_scroll + 1).min(max_scroll);
    }

    /// Raise the frame rate
    pub fn increase_fps(&mut self) {
        self.focus = Focus::Fps;
        self.adjust_focused(1.0);
    }

    /// Lower the frame rate
    pub fn decrease_fps(&mut self) {
        self.focus = Focus::Fps;
        self.adjust_focused(-1.0);
    }

    #[cfg(test)]
    /// Viewport size of the canvas in virtual pixels
    pub fn viewport(&self) -> (f32, f32) {
        self.engine.surface().size()
    }
}

fn full_rect((width, height): (u16, u16)) -> Rect {
    Rect {
        x: 0,
        y: 0,
        width,
        height,
    }
}
