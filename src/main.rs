pub mod breath;
pub mod clock;
pub mod engine;
pub mod events;
pub mod fade;
pub mod gate;
pub mod layout;
pub mod render;
pub mod runtime;
pub mod session;
pub mod store;
pub mod util;

use std::collections::HashMap;
use std::error::Error;
use std::io::{self, stdin};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::Text,
    widgets::{Block, Paragraph},
    Frame, Terminal,
};

use crate::engine::Practice;
use crate::layout::{CANVAS_H, CANVAS_W};
use crate::render::{DisplayBridge, PageLayout, Region, RegionKind, RenderError};
use crate::runtime::{FixedTicker, HubEvent, KeyEventSource, Runner};
use crate::session::SessionRegistry;
use crate::store::FileKvStore;

/// calm ambient breathing overlay, simulated in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Simulates the Stillness glasses overlay in a terminal: a collapsed badge that expands into a breath animation, deepening visual hierarchy over the run, and a persisted daily practice total. Keys: space/enter tap, t tap (fallback code), up/down swipe, b background toggle, q quit."
)]
pub struct Cli {
    /// show raw event codes in a debug overlay region
    #[clap(long)]
    debug_input: bool,

    /// watcher poll interval in milliseconds
    #[clap(long, default_value_t = 60)]
    poll_ms: u64,

    /// alternate persistence file (defaults to the platform state dir)
    #[clap(long)]
    store: Option<PathBuf>,
}

/// Terminal stand-in for the glasses display: keeps the last page layout and
/// per-region text, repaints the whole 576x288 canvas scaled into the
/// terminal on every bridge call.
struct TermBridge {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    page: PageLayout,
    texts: HashMap<Region, String>,
}

impl TermBridge {
    fn new(terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Self {
        Self {
            terminal,
            page: PageLayout::default(),
            texts: HashMap::new(),
        }
    }

    fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<io::Stdout>> {
        &mut self.terminal
    }

    fn redraw(&mut self) -> Result<(), RenderError> {
        let page = self.page.clone();
        let texts = self.texts.clone();
        self.terminal
            .draw(|f| draw_page(f, &page, &texts))
            .map_err(|_| RenderError::Unavailable)?;
        Ok(())
    }

    fn set_page(&mut self, layout: &PageLayout) -> Result<(), RenderError> {
        self.page = layout.clone();
        self.texts = layout
            .regions
            .iter()
            .map(|r| (r.region, r.content.clone()))
            .collect();
        self.redraw()
    }
}

impl DisplayBridge for TermBridge {
    fn create_page(&mut self, layout: &PageLayout) -> Result<(), RenderError> {
        self.set_page(layout)
    }

    fn rebuild_page(&mut self, layout: &PageLayout) -> Result<(), RenderError> {
        self.set_page(layout)
    }

    fn update_text(&mut self, region: Region, content: &str) -> Result<(), RenderError> {
        self.texts.insert(region, content.to_string());
        self.redraw()
    }
}

fn scale(v: u16, canvas: u16, term: u16) -> u16 {
    ((v as u32 * term as u32) / canvas.max(1) as u32) as u16
}

fn draw_page(f: &mut Frame, page: &PageLayout, texts: &HashMap<Region, String>) {
    let area = f.area();
    // Reserve the bottom line for the key hints.
    let canvas = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: area.height.saturating_sub(1),
    };

    for spec in &page.regions {
        // The list gesture catcher is invisible on the real display too.
        if spec.kind == RegionKind::List {
            continue;
        }

        let rect = Rect {
            x: canvas.x + scale(spec.x, CANVAS_W, canvas.width),
            y: canvas.y + scale(spec.y, CANVAS_H, canvas.height),
            width: scale(spec.w, CANVAS_W, canvas.width).max(1),
            height: scale(spec.h, CANVAS_H, canvas.height).max(1),
        };
        if rect.right() > canvas.right() || rect.bottom() > canvas.bottom() {
            continue;
        }

        let dim = spec.border_color == 1;
        let mut style = Style::default();
        if dim {
            style = style.add_modifier(Modifier::DIM);
        }

        let content = texts.get(&spec.region).cloned().unwrap_or_default();
        let mut paragraph = Paragraph::new(Text::from(content))
            .style(style)
            .alignment(Alignment::Center);
        if spec.border_width > 0 {
            paragraph = paragraph.block(Block::bordered().style(style));
        }
        f.render_widget(paragraph, rect);
    }

    let hints = Paragraph::new("space tap · t tap(13) · ↑/↓ swipe · b background · q quit")
        .style(Style::default().add_modifier(Modifier::DIM))
        .alignment(Alignment::Center);
    let hint_line = Rect {
        x: area.x,
        y: area.bottom().saturating_sub(1),
        width: area.width,
        height: 1,
    };
    f.render_widget(hints, hint_line);
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        use clap::{error::ErrorKind, CommandFactory};
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;

    let result = run(cli, terminal);

    disable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen)?;

    result
}

fn run(
    cli: Cli,
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(), Box<dyn Error>> {
    let mut store = match &cli.store {
        Some(path) => FileKvStore::with_path(path),
        None => FileKvStore::new(),
    };
    let mut bridge = TermBridge::new(terminal);
    let mut engine = Practice::new(SessionRegistry::builtin(), cli.debug_input);

    // Startup page build is the one fatal render call.
    engine.startup(&mut bridge, &mut store)?;

    let runner = Runner::new(
        KeyEventSource::new(),
        FixedTicker::new(Duration::from_millis(cli.poll_ms.max(1))),
    );

    loop {
        match runner.step() {
            HubEvent::Device(payload) => {
                engine.handle_raw(&payload, &mut bridge, &mut store, Instant::now());
            }
            HubEvent::Poll => {
                engine.on_poll(&mut bridge, Instant::now());
            }
            HubEvent::Resize => {
                let _ = bridge.redraw();
            }
            HubEvent::Quit => break,
        }
        if engine.is_exiting() {
            break;
        }
    }

    engine.stop(&mut store, Instant::now());
    bridge.terminal_mut().show_cursor()?;

    Ok(())
}
