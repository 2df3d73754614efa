//! Terminal preview.
//!
//! A parameter panel on the left, the tiled surface on the right drawn as a
//! Sixel image, and a status line at the bottom. The preview is rasterized
//! on a background thread so holding an arrow key never blocks input;
//! PNG and PDF exports run as [`ExportTask`]s polled from the same loop.

use std::io::{self, stdout};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use image::{DynamicImage, RgbaImage};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use ratatui_image::{picker::{Picker, ProtocolType}, protocol::StatefulProtocol, StatefulImage};
use tracing::{info, warn};

use svg_tiler::export::raster::rasterize_on;
use svg_tiler::{user_notice, ExportKind, ExportTask, Param, SurfaceSnapshot, TileController};

use crate::cli::common::parse_common;

/// Rasterize a surface snapshot over a white page for display.
///
/// Exports keep transparency; the preview doesn't, because most terminals
/// draw transparent Sixel pixels as black.
fn render_preview(snapshot: &SurfaceSnapshot) -> Result<DynamicImage, String> {
    let pixmap = rasterize_on(&snapshot.svg, snapshot.viewport, Some(tiny_skia::Color::WHITE))
        .map_err(|e| e.to_string())?;

    let (width, height) = (pixmap.width(), pixmap.height());
    let rgba = RgbaImage::from_raw(width, height, pixmap.take())
        .ok_or_else(|| "preview buffer has the wrong size".to_string())?;
    Ok(DynamicImage::ImageRgba8(rgba))
}

/// Result from background preview rendering
struct PreviewResult {
    image: Result<DynamicImage, String>,
    render_ms: f64,
}

/// Application state for TUI
struct App {
    controller: TileController,
    /// Parameter selection, indexes into `Param::all()`
    param_state: ListState,
    /// Name shown in the preview title
    source_name: String,
    should_quit: bool,
    /// Is a preview render in progress?
    is_rendering: bool,
    /// Parameters changed while a render was running
    needs_render: bool,
    preview_rx: Receiver<PreviewResult>,
    preview_tx: Sender<PreviewResult>,
    render_ms: f64,
    spinner_frame: usize,
    picker: Picker,
    image_state: Option<Box<dyn StatefulProtocol>>,
    /// Background PNG/PDF exports still running
    exports: Vec<ExportTask>,
    /// Last message for the status line
    status: String,
}

impl App {
    fn new(controller: TileController, source_name: String, status: String) -> Self {
        let mut param_state = ListState::default();
        param_state.select(Some(0));

        let (preview_tx, preview_rx) = mpsc::channel();

        // Initialize image picker - force Sixel protocol
        let mut picker = Picker::from_termios().unwrap_or_else(|_| Picker::new((8, 16)));
        picker.protocol_type = ProtocolType::Sixel;

        let mut app = App {
            controller,
            param_state,
            source_name,
            should_quit: false,
            is_rendering: false,
            needs_render: false,
            preview_rx,
            preview_tx,
            render_ms: 0.0,
            spinner_frame: 0,
            picker,
            image_state: None,
            exports: Vec::new(),
            status,
        };

        app.request_render();
        app
    }

    fn selected_param(&self) -> Param {
        Param::all()[self.param_state.selected().unwrap_or(0)]
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = format!("{} {}", Local::now().format("%H:%M:%S"), message.into());
    }

    fn request_render(&mut self) {
        if self.is_rendering {
            self.needs_render = true;
            return;
        }

        self.needs_render = false;
        let Some(snapshot) = self.controller.surface().snapshot() else {
            self.image_state = None;
            return;
        };
        let tx = self.preview_tx.clone();

        self.is_rendering = true;

        thread::spawn(move || {
            let start = Instant::now();
            let image = render_preview(&snapshot);
            let render_ms = start.elapsed().as_secs_f64() * 1000.0;
            let _ = tx.send(PreviewResult { image, render_ms });
        });
    }

    fn check_preview_result(&mut self) {
        // Drain all pending results, keep only the latest
        let mut latest: Option<PreviewResult> = None;
        while let Ok(result) = self.preview_rx.try_recv() {
            latest = Some(result);
        }

        if let Some(result) = latest {
            self.is_rendering = false;
            self.render_ms = result.render_ms;
            match result.image {
                Ok(image) => self.image_state = Some(self.picker.new_resize_protocol(image)),
                Err(e) => {
                    warn!(error = %e, "preview render failed");
                    self.set_status(format!("Preview failed: {}", e));
                }
            }

            if self.needs_render {
                self.request_render();
            }
        }
    }

    fn check_exports(&mut self) {
        let mut finished = Vec::new();
        let mut i = 0;
        while i < self.exports.len() {
            match self.exports[i].try_take() {
                Some(result) => finished.push((self.exports.remove(i), result)),
                None => i += 1,
            }
        }

        for (task, result) in finished {
            let stale = task.is_stale(self.controller.surface());
            let saved = result.and_then(|artifact| artifact.save_in(self.controller.output_dir()));
            match saved {
                Ok(path) if stale => {
                    self.set_status(format!("Saved {} (layout changed while exporting)", path.display()))
                }
                Ok(path) => self.set_status(format!("Saved {}", path.display())),
                Err(e) => self.set_status(format!("Export failed: {}", user_notice(&e))),
            }
        }
    }

    fn next_param(&mut self) {
        let i = match self.param_state.selected() {
            Some(i) => (i + 1) % Param::all().len(),
            None => 0,
        };
        self.param_state.select(Some(i));
    }

    fn prev_param(&mut self) {
        let i = match self.param_state.selected() {
            Some(i) => {
                if i == 0 { Param::all().len() - 1 } else { i - 1 }
            }
            None => 0,
        };
        self.param_state.select(Some(i));
    }

    fn adjust(&mut self, steps: i32) {
        let param = self.selected_param();
        let before = self.controller.params().get(param);
        self.controller.step(param, steps);
        if self.controller.params().get(param) != before {
            self.request_render();
        }
    }

    fn reset(&mut self) {
        self.controller.reset_params();
        self.set_status("Parameters reset");
        self.request_render();
    }

    fn export(&mut self, kind: ExportKind) {
        if kind.is_raster() {
            match self.controller.spawn_export(kind) {
                Ok(Some(task)) => {
                    self.set_status(format!("Exporting {}...", kind.file_name()));
                    self.exports.push(task);
                }
                Ok(None) => self.set_status("Nothing to export"),
                Err(e) => self.set_status(format!("Export failed: {}", user_notice(&e))),
            }
            return;
        }

        match self.controller.export_to_output_dir(kind) {
            Ok(Some(path)) => self.set_status(format!("Saved {}", path.display())),
            Ok(None) => self.set_status("Nothing to export"),
            Err(e) => self.set_status(format!("Export failed: {}", user_notice(&e))),
        }
    }
}

/// Launch the TUI. `args` may name an SVG and carry the shared options.
pub fn run(args: &[String]) -> anyhow::Result<()> {
    let parsed = parse_common(args, &[])?;
    let svg_path = parsed
        .rest
        .iter()
        .find(|a| !a.starts_with('-'))
        .cloned();

    let mut controller = TileController::new(parsed.config);
    let mut status = String::new();
    let source_name = match svg_path {
        Some(path) => {
            if let Err(e) = controller.upload_path(Path::new(&path)) {
                status = user_notice(&e);
            }
            path
        }
        None => {
            if let Err(e) = controller.load_default() {
                status = format!("No default image: {}", user_notice(&e));
            }
            "default".to_string()
        }
    };
    info!(source = %source_name, "starting preview");

    run_tui(App::new(controller, source_name, status))
}

fn run_tui(mut app: App) -> anyhow::Result<()> {
    // Initialize terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> anyhow::Result<()> {
    loop {
        app.check_preview_result();
        app.check_exports();

        if app.is_rendering || !app.exports.is_empty() {
            app.spinner_frame = (app.spinner_frame + 1) % 8;
        }

        terminal.draw(|frame| ui(frame, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                        KeyCode::Up | KeyCode::Char('k') => app.prev_param(),
                        KeyCode::Down | KeyCode::Char('j') => app.next_param(),
                        KeyCode::Left | KeyCode::Char('h') => app.adjust(-1),
                        KeyCode::Right | KeyCode::Char('l') => app.adjust(1),
                        KeyCode::Char('[') => app.adjust(-10),
                        KeyCode::Char(']') => app.adjust(10),
                        KeyCode::Char('1') => app.export(ExportKind::Svg),
                        KeyCode::Char('2') => app.export(ExportKind::Png),
                        KeyCode::Char('3') => app.export(ExportKind::Pdf),
                        KeyCode::Char('r') => app.reset(),
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            if !app.exports.is_empty() {
                warn!(pending = app.exports.len(), "quitting with exports still running");
            }
            return Ok(());
        }
    }
}

fn format_value(param: Param, value: f64) -> String {
    match param {
        Param::Copies | Param::Rows => format!("{}", value),
        Param::Rotation => format!("{}°", value),
        Param::RowOffset => format!("{}px", value),
        Param::Scale => format!("{:.2}", value),
        Param::HorizontalSpacing | Param::VerticalSpacing => format!("{:.0}%", value * 100.0),
    }
}

fn ui(frame: &mut Frame, app: &mut App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let top_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(30),
            Constraint::Min(40),
        ])
        .split(main_layout[0]);

    let sidebar_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(9),
            Constraint::Length(6),
        ])
        .split(top_layout[0]);

    // Parameter list
    let params = *app.controller.params();
    let items: Vec<ListItem> = Param::all()
        .iter()
        .map(|&p| ListItem::new(format!("{:<20}{:>7}", p.label(), format_value(p, params.get(p)))))
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Parameters ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)))
        .highlight_style(Style::default()
            .bg(Color::DarkGray)
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD))
        .highlight_symbol("► ");

    frame.render_stateful_widget(list, sidebar_layout[0], &mut app.param_state.clone());

    // Stats panel
    let viewport = app.controller.surface().viewport();
    let stats_text = format!(
        "Tiles: {}\nCanvas: {}x{}\nRender: {:.1}ms\nExports: {}",
        app.controller.surface().tiles().len(),
        viewport.width,
        viewport.height,
        app.render_ms,
        app.exports.len()
    );
    let stats = Paragraph::new(stats_text)
        .block(Block::default()
            .title(" Stats ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)))
        .style(Style::default().fg(Color::White));

    frame.render_widget(stats, sidebar_layout[1]);

    let spinner_chars = ['|', '/', '-', '\\', '|', '/', '-', '\\'];
    let spinner = spinner_chars[app.spinner_frame % spinner_chars.len()];

    let busy = app.is_rendering || !app.exports.is_empty();
    let image_title = if app.is_rendering {
        format!(" [{}] Rendering... ", spinner)
    } else if !app.exports.is_empty() {
        format!(" [{}] Exporting... ", spinner)
    } else {
        format!(" {} ", app.source_name)
    };
    let border_color = if busy { Color::Yellow } else { Color::Green };

    let image_block = Block::default()
        .title(image_title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let inner_area = image_block.inner(top_layout[1]);
    frame.render_widget(image_block, top_layout[1]);

    if let Some(ref mut image_state) = app.image_state {
        let image_widget = StatefulImage::new(None);
        frame.render_stateful_widget(image_widget, inner_area, image_state);
    } else if app.controller.document().is_none() {
        let empty = Paragraph::new("No SVG loaded")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(empty, inner_area);
    }

    // Bottom bar: summary + status, help
    let bottom_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(65),
            Constraint::Percentage(35),
        ])
        .split(main_layout[1]);

    let status = Paragraph::new(format!("{}\n{}", params.summary(), app.status))
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, bottom_layout[0]);

    let help = Paragraph::new("↑↓ select  ←→/[] adjust  r reset\n1 svg  2 png  3 pdf  q quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(help, bottom_layout[1]);
}

// ===== TESTS =====
