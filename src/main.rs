// Defensive programming lints - prevent panics and unsafe patterns
#![deny(clippy::indexing_slicing)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::fallible_impl_from)]
#![warn(clippy::wildcard_enum_match_arm)]
// Idiomatic Rust lints
#![warn(clippy::needless_return)]
#![warn(clippy::let_and_return)]
#![warn(clippy::must_use_candidate)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::map_unwrap_or)]
#![warn(clippy::explicit_iter_loop)]

mod api;
mod app;
mod config;
mod store;
mod ui;

use app::{App, AppMode};
use color_eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::{io, time::Duration};

fn main() -> Result<()> {
    // Setup error handling
    color_eyre::install()?;

    // Load config
    let config = config::Config::load()?;

    // Check for command-line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        return handle_cli_args(&args, &config);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn handle_cli_args(args: &[String], config: &config::Config) -> Result<()> {
    let cmd = args
        .get(1)
        .ok_or_else(|| color_eyre::eyre::eyre!("No command provided"))?;
    let program_name = args.first().map_or("quill", String::as_str);

    match cmd.as_str() {
        "--help" | "-h" => print_help(program_name),
        "--version" | "-v" => println!("quill v{}", env!("CARGO_PKG_VERSION")),
        "balance" => {
            let balance = api::balance::fetch_balance(&config.api.base_url, &config.api.key)?;
            println!("{}", balance.summary());
        }
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Run with --help for available commands.");
            std::process::exit(1);
        }
    }
    Ok(())
}

fn print_help(program_name: &str) {
    println!("Quill - terminal chat client for the DeepSeek API");
    println!();
    println!("Usage: {} [command]", program_name);
    println!();
    println!("Commands:");
    println!("  balance    - Print the account balance");
    println!("  --help     - Show this help");
    println!("  --version  - Show version");
    println!();
    println!("Run without arguments to start interactive mode.");
    println!();
    println!(
        "Configuration (API key, model defaults, functions) lives in {}",
        config::Config::config_path()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|_| "the config directory".to_string())
    );
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        // Drain worker events before drawing
        app.check_exchange_events();
        app.refresh_balance();
        tick_loading_animation(app);
        app.clear_expired_status_toast();

        terminal.draw(|f| ui::render(f, app))?;

        if app.should_quit {
            break;
        }

        // Poll for events with a timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Only handle KeyPress events to avoid duplicate handling
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    app.should_quit = true;
                    continue;
                }

                match app.mode {
                    AppMode::Chat => handle_chat_mode(app, key.code, key.modifiers),
                    AppMode::Windows => handle_windows_mode(app, key.code),
                    AppMode::Settings => handle_settings_mode(app, key.code),
                    AppMode::Help => app.mode = AppMode::Chat,
                }
            }
        }
    }

    // One final snapshot on the way out
    app.save_store();
    Ok(())
}

fn tick_loading_animation(app: &mut App) {
    use std::time::Instant;
    if !app.store.is_sending() {
        app.loading_frame = 0;
        app.last_loading_tick = None;
        return;
    }

    let now = Instant::now();
    let should_tick = app
        .last_loading_tick
        .map(|last_tick| now.duration_since(last_tick) >= Duration::from_millis(200))
        .unwrap_or(true);

    if should_tick {
        app.loading_frame = app.loading_frame.wrapping_add(1);
        app.last_loading_tick = Some(now);
    }
}

fn handle_chat_mode(app: &mut App, key_code: KeyCode, modifiers: KeyModifiers) {
    if modifiers.contains(KeyModifiers::CONTROL) {
        match key_code {
            KeyCode::Char('n') => app.new_window(),
            KeyCode::Char('s') => app.open_settings(),
            KeyCode::Char('r') => app.retry_last_exchange(),
            KeyCode::Char('l') => app.clear_chat(),
            _ => {}
        }
        return;
    }

    match key_code {
        KeyCode::Enter => app.send_chat_message(),
        KeyCode::Esc => {
            if app.store.is_sending() {
                app.cancel_exchange();
            } else {
                app.open_windows();
            }
        }
        KeyCode::Up => app.scroll_chat_up(),
        KeyCode::Down => app.scroll_chat_down(),
        KeyCode::F(1) => app.mode = AppMode::Help,
        KeyCode::Char(character) => app.add_chat_input_char(character),
        KeyCode::Backspace => app.remove_chat_input_char(),
        _ => {}
    }
}

fn handle_windows_mode(app: &mut App, key_code: KeyCode) {
    // Rename overlay captures all input while open
    if app.window_rename_input.is_some() {
        match key_code {
            KeyCode::Enter => app.commit_window_rename(),
            KeyCode::Esc => app.cancel_window_rename(),
            KeyCode::Char(character) => {
                if let Some(input) = &mut app.window_rename_input {
                    input.add_char(character);
                }
            }
            KeyCode::Backspace => {
                if let Some(input) = &mut app.window_rename_input {
                    input.remove_char();
                }
            }
            _ => {}
        }
        return;
    }

    match key_code {
        KeyCode::Esc => app.close_windows(),
        KeyCode::Enter => app.select_window_under_cursor(),
        KeyCode::Up => app.previous_window_item(),
        KeyCode::Down => app.next_window_item(),
        KeyCode::Char('n') => app.new_window(),
        KeyCode::Char('r') => app.start_window_rename(),
        KeyCode::Char('d') => app.delete_window_under_cursor(),
        _ => {}
    }
}

fn handle_settings_mode(app: &mut App, key_code: KeyCode) {
    if app.settings_edit_input.is_some() {
        match key_code {
            KeyCode::Enter => app.commit_settings_edit(),
            KeyCode::Esc => app.cancel_settings_edit(),
            KeyCode::Char(character) => {
                if let Some(input) = &mut app.settings_edit_input {
                    input.add_char(character);
                }
            }
            KeyCode::Backspace => {
                if let Some(input) = &mut app.settings_edit_input {
                    input.remove_char();
                }
            }
            _ => {}
        }
        return;
    }

    match key_code {
        KeyCode::Esc => app.close_settings(),
        KeyCode::Enter => app.start_settings_edit(),
        KeyCode::Up => app.previous_settings_item(),
        KeyCode::Down => app.next_settings_item(),
        _ => {}
    }
}
