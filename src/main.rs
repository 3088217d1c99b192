mod app;
mod event;
mod ui;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};
use tracing::{info, warn};

use rekishi::config::Config;
use rekishi::content::EraCatalog;
use rekishi::engine::history::group_history;

use app::{App, AppScreen, open_store};
use event::{AppEvent, EventHandler};
use ui::components::era_list::EraList;
use ui::components::history_list::HistoryList;
use ui::components::memorize_list::MemorizeList;
use ui::components::progress_bar::ProgressBar;
use ui::components::quiz_card::QuizCard;
use ui::components::results::ResultsDashboard;
use ui::layout::AppLayout;
use ui::theme::Theme;

#[derive(Parser)]
#[command(name = "rekishi", version, about = "Master Japanese history terms, one era at a time")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short = 'n', long, help = "Maximum questions per quiz")]
    set_size: Option<usize>,

    #[arg(short, long, help = "Correct answers needed to clear a question")]
    required_correct: Option<u32>,

    #[arg(long, help = "Directory for progress data and logs")]
    data_dir: Option<PathBuf>,

    #[arg(long, help = "Directory of extra era JSON files")]
    content_dir: Option<PathBuf>,

    #[arg(long, help = "Seed for reproducible shuffles")]
    seed: Option<u64>,

    #[arg(short, long, help = "Log level (trace, debug, info, warn, error)")]
    log_level: Option<String>,

    #[arg(long, help = "Print the bundled theme names and exit")]
    list_themes: bool,
}

fn setup_logging(log_dir: &Path, level: &str) -> Result<()> {
    fs::create_dir_all(log_dir).context("Failed to create log directory")?;

    let level = match level.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        other => {
            eprintln!("Warning: Unknown log-level '{other}', defaulting to INFO");
            tracing::Level::INFO
        }
    };

    let log_file =
        fs::File::create(log_dir.join("rekishi.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: ignoring unreadable config: {e}");
        Config::default()
    });
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(size) = cli.set_size {
        config.quiz_set_size = size;
    }
    if let Some(required) = cli.required_correct {
        config.required_correct = required;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(dir) = cli.content_dir {
        config.content_dir = Some(dir);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.validate();

    if cli.list_themes {
        for name in Theme::available_themes() {
            println!("{name}");
        }
        return Ok(());
    }

    // Logging is best effort: an unusable data dir must not stop the app.
    if let Err(e) = setup_logging(&config.log_dir(), &config.log_level) {
        eprintln!("Warning: logging disabled: {e:#}");
    }

    let catalog = EraCatalog::load(config.content_dir.as_deref());
    let theme = Theme::load(&config.theme).unwrap_or_else(|| {
        warn!(theme = %config.theme, "unknown theme, using default");
        Theme::default()
    });
    let theme: &'static Theme = Box::leak(Box::new(theme));
    let store = open_store(config.data_dir());

    let mut app = App::new(config, theme, catalog, store, cli.seed);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }
    info!("exiting");

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.on_tick(Instant::now()),
            AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // A notice blocks everything until dismissed.
    if app.notice.is_some() {
        app.dismiss_notice();
        return;
    }

    match app.screen {
        AppScreen::EraSelect => handle_era_select_key(app, key),
        AppScreen::Memorize => handle_memorize_key(app, key),
        AppScreen::Quiz => handle_quiz_key(app, key),
        AppScreen::Results => handle_results_key(app, key),
        AppScreen::History => handle_history_key(app, key),
    }
}

fn handle_era_select_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.era_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.era_next(),
        KeyCode::Enter | KeyCode::Char(' ') => app.start_selected_era(Instant::now()),
        KeyCode::Char('h') => app.go_to_history(),
        _ => {}
    }
}

fn handle_memorize_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_era_select(),
        KeyCode::Enter | KeyCode::Char(' ') => app.try_begin_quiz(Instant::now(), true),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
        _ => {}
    }
}

fn handle_quiz_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_era_select(),
        KeyCode::Up | KeyCode::Char('k') => app.choice_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.choice_next(),
        KeyCode::Enter | KeyCode::Char(' ') => app.answer_selected(Instant::now()),
        KeyCode::Char(ch @ '1'..='9') => {
            let index = ch as usize - '1' as usize;
            app.answer(index, Instant::now());
        }
        _ => {}
    }
}

fn handle_results_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('r') => app.retry_era(Instant::now()),
        KeyCode::Char('h') => app.go_to_history(),
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_era_select(),
        _ => {}
    }
}

fn handle_history_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_era_select(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    frame.render_widget(Block::default().style(Style::default().bg(colors.bg())), area);

    match app.screen {
        AppScreen::EraSelect => render_era_select(frame, app),
        AppScreen::Memorize => render_memorize(frame, app),
        AppScreen::Quiz => render_quiz(frame, app),
        AppScreen::Results => render_results(frame, app),
        AppScreen::History => render_history(frame, app),
    }

    if let Some(notice) = &app.notice {
        render_notice(frame, app, notice);
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect, title: &str) {
    let colors = &app.theme.colors;
    let header = Paragraph::new(Line::from(Span::styled(
        format!(" {title} "),
        Style::default()
            .fg(colors.header_fg())
            .bg(colors.header_bg())
            .add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().style(Style::default().bg(colors.header_bg())));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect, hints: &str) {
    let footer = Paragraph::new(Line::from(Span::styled(
        hints.to_string(),
        Style::default().fg(app.theme.colors.muted()),
    )));
    frame.render_widget(footer, area);
}

fn render_era_select(frame: &mut ratatui::Frame, app: &App) {
    let layout = AppLayout::new(frame.area());
    render_header(frame, app, layout.header, "rekishi");

    let rows = app.era_rows();
    let list_area = ui::layout::centered_rect(60, 100, layout.main);
    frame.render_widget(EraList::new(&rows, app.era_selected, app.theme), list_area);

    render_footer(
        frame,
        app,
        layout.footer,
        " [↑↓] Select  [Enter] Start  [h] History  [q] Quit ",
    );
}

fn render_memorize(frame: &mut ratatui::Frame, app: &App) {
    let layout = AppLayout::new(frame.area());
    let era = app.active_era.as_deref().unwrap_or_default();
    render_header(frame, app, layout.header, era);

    let time_left = app
        .memorize
        .as_ref()
        .map(|m| m.time_left(Instant::now()))
        .unwrap_or(0);
    let list = MemorizeList {
        era,
        questions: &app.working_set,
        scroll: app.memorize_scroll,
        time_left,
        theme: app.theme,
    };
    frame.render_widget(list, ui::layout::centered_rect(70, 100, layout.main));

    render_footer(
        frame,
        app,
        layout.footer,
        " [Enter] スタート！  [↑↓] Scroll  [q] 時代選択へ ",
    );
}

fn render_quiz(frame: &mut ratatui::Frame, app: &App) {
    let Some(session) = app.session.as_ref() else {
        return;
    };
    let queue = session.queue();
    let layout = AppLayout::new(frame.area());
    render_header(
        frame,
        app,
        layout.header,
        app.active_era.as_deref().unwrap_or_default(),
    );

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(8)])
        .split(ui::layout::centered_rect(70, 100, layout.main));

    let needed = queue.working_set().len() as u32 * queue.required_correct();
    let progress = ProgressBar::new("進捗", queue.progress(), app.theme)
        .detail(format!("{}/{}", queue.correct_answers(), needed));
    frame.render_widget(progress, main[0]);

    let card = QuizCard::new(
        queue,
        app.choice_selected,
        session.feedback_remaining(Instant::now()),
        app.theme,
    );
    frame.render_widget(card, main[1]);

    render_footer(
        frame,
        app,
        layout.footer,
        " [1-4] Answer  [↑↓] Move  [Enter] Choose  [q] 時代選択へ ",
    );
}

fn render_results(frame: &mut ratatui::Frame, app: &App) {
    let Some(result) = app.last_result.as_ref() else {
        return;
    };
    let centered = ui::layout::centered_rect(50, 60, frame.area());
    frame.render_widget(ResultsDashboard::new(result, app.theme), centered);
}

fn render_history(frame: &mut ratatui::Frame, app: &App) {
    let layout = AppLayout::new(frame.area());
    render_header(frame, app, layout.header, "学習履歴");

    let groups = group_history(&app.history, &Local::now());
    let list = HistoryList::new(&groups, app.history_scroll, app.theme);
    frame.render_widget(list, ui::layout::centered_rect(70, 100, layout.main));

    render_footer(frame, app, layout.footer, " [↑↓] Scroll  [q] Back ");
}

fn render_notice(frame: &mut ratatui::Frame, app: &App, notice: &str) {
    let colors = &app.theme.colors;
    let area = ui::layout::centered_rect(40, 20, frame.area());
    frame.render_widget(Clear, area);

    let popup = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            notice.to_string(),
            Style::default()
                .fg(colors.warning())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key",
            Style::default().fg(colors.muted()),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::bordered()
            .border_style(Style::default().fg(colors.warning()))
            .style(Style::default().bg(colors.bg())),
    );
    frame.render_widget(popup, area);
}
