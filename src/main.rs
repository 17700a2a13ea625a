use anyhow::{anyhow, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use hood_map::app::App;
use hood_map::{data, ui};
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::sync::mpsc::TryRecvError;
use std::sync::Arc;
use std::time::Duration;

const LOG_PATH: &str = "hood-map.log";

fn main() -> Result<()> {
    init_logging();

    // The single configuration knob: where the boundary dataset lives
    let data_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(data::DEFAULT_DATA_PATH));

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, data_path);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Diagnostics go to a file; the terminal belongs to the UI while we run
fn init_logging() {
    if let Ok(file) = std::fs::File::create(LOG_PATH) {
        tracing_subscriber::fmt()
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .init();
    }
}

fn run(terminal: &mut DefaultTerminal, data_path: PathBuf) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(size.width as usize, size.height as usize);

    // The one fetch of the session; the map is interactive while it runs
    let load = data::spawn_load(data_path);

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| ui::render(frame, &mut app))?;

        if app.is_loading() {
            match load.try_recv() {
                Ok(result) => app.attach_load_result(result),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    app.attach_load_result(Err(anyhow!("loader thread terminated")));
                }
            }
        }

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        handle_key(&mut app, key.code);
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                // The terminal emits no final move event on exit
                Event::FocusLost => app.pointer_left(),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.quit(),

        // Esc dismisses the panel first; with nothing open it quits
        KeyCode::Esc => {
            if app.panel().is_some() {
                app.close_panel();
            } else {
                app.quit();
            }
        }

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Refit to the dataset
        KeyCode::Char('r') | KeyCode::Char('0') => app.refit(),

        _ => {}
    }
}

/// Route mouse input: hover tracking, drag-to-pan, click-to-select, zoom
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for the cursor marker
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Moved => app.pointer_moved(mouse.column, mouse.row),
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // A press that never drags becomes a click on release
        MouseEventKind::Down(MouseButton::Left) => app.press(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.drag_to(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.release(mouse.column, mouse.row),
        _ => {}
    }
}
