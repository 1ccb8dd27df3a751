mod app;

use anyhow::Result;
use app::App;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use env_logger::{Env, Target};
use gridclip_config::{Config, LoggingSettings};
use gridclip_engine::grid::GridMap;
use gridclip_engine::render::render_document;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::{
    env,
    fs::{self, OpenOptions},
    io::{Stdout, stdout},
    process,
};

const COLUMN_WIDTH: u16 = 10;

fn main() -> Result<()> {
    // Config from an explicit file argument, else the default location
    let args: Vec<String> = env::args().collect();
    let config = match args.len() {
        1 => match Config::load_or_default() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                process::exit(1);
            }
        },
        2 => match Config::load_from_path(&args[1]) {
            Ok(Some(config)) => config,
            Ok(None) => {
                eprintln!("Error: Config file '{}' not found", args[1]);
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Usage: {} [config-file]", args[0]);
            process::exit(1);
        }
    };

    // The terminal belongs to the UI, so log lines go to a file
    init_logging(&config.logging)?;
    log::info!("gridclip starting with {:?}", config.clipboard);

    let mut app = App::new(config.clipboard)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn init_logging(settings: &LoggingSettings) -> Result<()> {
    if let Some(parent) = settings.file.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.file)?;
    env_logger::Builder::from_env(Env::default().default_filter_or(settings.filter.as_str()))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let extend = key.modifiers.contains(KeyModifiers::SHIFT);
        let action = match key.code {
            KeyCode::Char('q') => return Ok(()),
            KeyCode::Up => app.move_cursor(-1, 0, extend),
            KeyCode::Down => app.move_cursor(1, 0, extend),
            KeyCode::Left => app.move_cursor(0, -1, extend),
            KeyCode::Right => app.move_cursor(0, 1, extend),
            KeyCode::Char('c') => app.copy(),
            KeyCode::Char('x') => app.cut(),
            KeyCode::Char('v') => app.paste(),
            KeyCode::Char('m') => app.mark(),
            _ => Ok(()),
        };
        // Clipboard operations are atomic, a failure leaves the document as it was
        if let Err(e) = action {
            log::warn!("{e:#}");
            app.status = format!("Error: {e}");
        }
    }
}

fn grid_table(app: &App) -> Table<'static> {
    let Ok(map) = GridMap::build(app.doc.tree(), app.grid) else {
        return Table::new(Vec::<Row>::new(), Vec::<Constraint>::new());
    };
    let dimensions = map.dimensions();
    let selection = app.selection();
    let tree = app.doc.tree();

    let rows: Vec<Row> = (0..dimensions.height)
        .map(|row| {
            let cells: Vec<Cell> = (0..dimensions.width)
                .map(|column| {
                    let text = match map.slot(row, column) {
                        None => ".".to_string(),
                        Some(cref) if cref.row == row && cref.column == column => {
                            tree.text_content(cref.cell)
                        }
                        Some(cref) if cref.row == row => "<".to_string(),
                        Some(_) => "^".to_string(),
                    };
                    let mut style = Style::default();
                    if row < map.heading_rows() || column < map.heading_columns() {
                        style = style.add_modifier(Modifier::BOLD);
                    }
                    if (row, column) == app.cursor {
                        style = style.bg(Color::Cyan).fg(Color::Black);
                    } else if selection.contains(row, column) {
                        style = style.bg(Color::Yellow).fg(Color::Black);
                    }
                    Cell::from(text).style(style)
                })
                .collect();
            Row::new(cells)
        })
        .collect();

    let widths = vec![Constraint::Length(COLUMN_WIDTH); dimensions.width];
    Table::new(rows, widths)
}

fn text_lines(text: &str) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| Line::from(vec![Span::raw(line.to_string())]))
        .collect()
}

fn ui(f: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
        .split(outer[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(panels[1]);

    let grid = grid_table(app).block(Block::default().borders(Borders::ALL).title("Grid"));
    f.render_widget(grid, panels[0]);

    let document = match render_document(&app.doc) {
        Ok(text) => text_lines(&text),
        Err(e) => vec![Line::from(format!("Error rendering document: {e}"))],
    };
    let document = Paragraph::new(document)
        .block(Block::default().borders(Borders::ALL).title("Document"));
    f.render_widget(document, side[0]);

    let held = match app.held.as_ref().map(render_document) {
        None => vec![Line::from("Nothing copied yet")],
        Some(Ok(text)) => text_lines(&text),
        Some(Err(e)) => vec![Line::from(format!("Error rendering clipboard: {e}"))],
    };
    let held =
        Paragraph::new(held).block(Block::default().borders(Borders::ALL).title("Clipboard"));
    f.render_widget(held, side[1]);

    let help = Paragraph::new(vec![
        Line::from(vec![Span::raw(app.status.clone())]),
        Line::from(vec![
            Span::raw("q: Quit | "),
            Span::raw("Arrows: Move (Shift extends) | "),
            Span::raw("c: Copy | x: Cut | v: Paste | m: Mark"),
        ]),
    ])
    .block(Block::default());
    f.render_widget(help, outer[1]);
}
