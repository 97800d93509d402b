use crate::app::{App, Focus};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 50;

/// Number of lines in controls content
pub const CONTROLS_CONTENT_LINES: u16 = 13;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    let inner = get_canvas_inner(frame_area, fullscreen);
    (inner.width, inner.height)
}

/// Screen rectangle the particle canvas draws into (inside its border)
pub fn get_canvas_inner(frame_area: Rect, fullscreen: bool) -> Rect {
    let offset = if fullscreen { 0 } else { SIDEBAR_WIDTH.min(frame_area.width) };
    Rect {
        x: frame_area.x + offset + 1,
        y: frame_area.y + 1,
        width: frame_area.width.saturating_sub(offset + 2),
        height: frame_area.height.saturating_sub(2),
    }
}

/// Visible lines in the controls box for a terminal of the given height
pub fn get_controls_visible_lines(terminal_height: u16) -> u16 {
    // Status (8) + parameters (11) + controls borders (2)
    terminal_height.saturating_sub(8 + 11 + 2)
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),  // Status
            Constraint::Length(11), // Parameters
            Constraint::Min(6),     // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Particle Field ");
    let field = app.engine.field();

    let (status_text, status_color) = if app.is_paused() {
        ("PAUSED", HIGHLIGHT_COLOR)
    } else {
        ("RUNNING", Color::Green)
    };

    let fps = if app.is_paused() {
        "--".to_string()
    } else {
        format!("{:.0}", app.clock.measured_fps())
    };

    let pointer_text = if field.pointer().is_present() {
        "Pointer: on canvas"
    } else {
        "Pointer: away"
    };

    let preset_line = match (&app.status_message, app.preset_name()) {
        (Some(message), _) => message.clone(),
        (None, Some(name)) => format!("Preset: {}", name),
        (None, None) => "Preset: custom".to_string(),
    };

    let content = vec![
        Line::from(Span::styled(
            format!("Particles: {}", field.particles().len()),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(Span::styled(
            format!("Energized: {}", field.energized_count()),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(Span::styled(pointer_text, Style::default().fg(DIM_TEXT_COLOR))),
        Line::from(Span::styled(format!("FPS: {}", fps), Style::default().fg(DIM_TEXT_COLOR))),
        Line::from(Span::styled(status_text, Style::default().fg(status_color))),
        Line::from(Span::styled(preset_line, Style::default().fg(DIM_TEXT_COLOR))),
    ];

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |label: &str, value: String, focused: bool| {
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
    };

    let settings = &app.engine.field().settings;

    let content = vec![
        make_line(
            "Radius",
            format!("{:.0}", settings.pointer_radius),
            app.focus == Focus::PointerRadius,
        ),
        make_line(
            "Repel",
            format!("{:.2}", settings.repel_strength),
            app.focus == Focus::Repel,
        ),
        make_line(
            "Ptr link",
            format!("{:.0}", settings.pointer_link_distance),
            app.focus == Focus::PointerLink,
        ),
        make_line(
            "Link",
            format!("{:.0}", settings.ambient_link_distance),
            app.focus == Focus::AmbientLink,
        ),
        make_line(
            "Drift",
            format!("{:.2}", settings.max_drift),
            app.focus == Focus::Drift,
        ),
        make_line(
            "Narrow",
            format!("{}", settings.narrow_count),
            app.focus == Focus::NarrowCount,
        ),
        make_line(
            "Wide",
            format!("{}", settings.wide_count),
            app.focus == Focus::WideCount,
        ),
        make_line(
            "Palette",
            app.palette().name().to_string(),
            app.focus == Focus::Palette,
        ),
        make_line(
            "FPS",
            format!("{}", settings.target_fps),
            app.focus == Focus::Fps,
        ),
    ];

    // Calculate scroll to keep focused item visible based on actual area
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2); // minus borders
    let content_height = content.len() as u16;

    let scroll = if visible_height == 0 || visible_height >= content_height {
        0 // No scrolling needed
    } else if focus_line >= visible_height {
        // Scroll to show focused line at bottom of visible area
        focus_line.saturating_sub(visible_height - 1)
    } else {
        0 // Focus is within first visible lines
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    // Helper to create a control line
    let make_control = |key: &str, desc: &str| -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Space", "pause/resume"),
        make_control("H/?", "help"),
        make_control("R", "regenerate"),
        make_control("C", "palette"),
        make_control("P", "next preset"),
        make_control("V", "fullscreen"),
        make_control("Tab", "select param"),
        make_control("←/→", "adjust param"),
        make_control("+/-", "frame rate"),
        make_control("W", "save config"),
        make_control("Mouse", "repel particles"),
        make_control("Esc", "deselect"),
        make_control("Q", "quit"),
    ];

    let content_height = content.len() as u16;
    let visible_height = area.height.saturating_sub(2); // minus borders
    let max_scroll = content_height.saturating_sub(visible_height);
    let is_scrollable = max_scroll > 0;

    let title = if is_scrollable {
        " Controls (↑↓) "
    } else {
        " Controls "
    };

    let block = styled_block(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .scroll((app.controls_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("").style(Style::default().bg(app.engine.field().colors().background.to_ratatui()));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    for cell in app.engine.surface().cells() {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            let cell_rect = Rect {
                x,
                y,
                width: 1,
                height: 1,
            };
            let span = Span::styled(cell.char.to_string(), Style::default().fg(cell.color));
            let paragraph = Paragraph::new(Line::from(span));
            frame.render_widget(paragraph, cell_rect);
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Calculate the canvas area (exclude sidebar unless fullscreen)
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if app.fullscreen_mode {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    // Center the help dialog within the canvas
    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(36);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    // Clear the background
    frame.render_widget(Clear, help_area);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled("PARTICLE FIELD", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Particles drift slowly and bounce off the edges. Nearby particles are joined by faint lines that fade with distance."),
        Line::from(""),
        Line::from(Span::styled("POINTER:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Move the mouse over the canvas. Particles inside the interaction radius are pushed away, grow and turn bright. Heavier particles move less."),
        Line::from("Particles close to the pointer are linked to it. Energized particles shrink back once the pointer leaves."),
        Line::from(""),
        Line::from(Span::styled("PARAMETERS (Tab, ←/→):", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from(Span::styled("Radius / Repel", Style::default().fg(TEXT_COLOR))),
        Line::from("Size of the interaction zone and how hard it pushes"),
        Line::from(Span::styled("Ptr link / Link", Style::default().fg(TEXT_COLOR))),
        Line::from("Maximum length of pointer and particle links"),
        Line::from(Span::styled("Drift", Style::default().fg(TEXT_COLOR))),
        Line::from("Top speed of the ambient motion (regenerates)"),
        Line::from(Span::styled("Narrow / Wide", Style::default().fg(TEXT_COLOR))),
        Line::from("Particle counts for narrow and wide canvases (regenerates)"),
        Line::from(""),
        Line::from(Span::styled("PRESETS AND CONFIG:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("P cycles presets (Neural, Drift, Storm, Sparse, Web, then your own). W writes the current settings to the config file."),
        Line::from(""),
        Line::from(Span::styled("BASIC CONTROLS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Space=Pause, R=Regenerate, C=Palette, V=Fullscreen, +/-=Frame rate, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2); // minus borders
    let max_scroll = content_height.saturating_sub(visible_height);
    let is_scrollable = max_scroll > 0;

    // Update title to show scroll hint if scrollable
    let title = if is_scrollable {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
