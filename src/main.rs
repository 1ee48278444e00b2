use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use persona_chat::app::{App, Severity};
use persona_chat::auth::AuthMode;
use persona_chat::backends;
use persona_chat::guard::Screen;
use persona_chat::runtime::RuntimeController;
use session_store::{state_file, Sender, SessionStore};

const SETTLE_POLL: Duration = Duration::from_millis(25);

fn main() -> io::Result<()> {
    let cwd = std::env::current_dir()?;
    let mut store = SessionStore::open(&state_file(&cwd)).map_err(io::Error::other)?;
    let store_changes = store.subscribe();

    let backend = backends::backend_from_env().map_err(io::Error::other)?;
    let backend_profile = backend.profile();

    let app = Arc::new(Mutex::new(App::new(store)));
    let controller = RuntimeController::new(Arc::clone(&app), backend);
    controller.watch_store(store_changes);
    let mut host = Arc::clone(&controller);

    println!(
        "persona_chat v{} (backend: {})",
        env!("CARGO_PKG_VERSION"),
        backend_profile.backend_id
    );

    let mut rendered_messages = 0usize;
    render(&app, &mut rendered_messages);
    prompt(&app)?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        handle_line(&line, &app, &mut host);
        settle(&controller, &app);

        render(&app, &mut rendered_messages);
        if lock_unpoisoned(&app).should_exit || controller.stop_requested() {
            break;
        }
        prompt(&app)?;
    }

    Ok(())
}

fn handle_line(line: &str, app: &Arc<Mutex<App>>, host: &mut Arc<RuntimeController>) {
    let mut app = lock_unpoisoned(app);
    match app.screen {
        Screen::Auth => handle_auth_line(line, &mut app, host),
        Screen::Onboard => handle_onboard_line(line, &mut app, host),
        Screen::Chat => {
            app.on_input_replace(line.to_string());
            app.on_submit(host);
        }
    }
}

fn handle_auth_line(line: &str, app: &mut App, host: &mut Arc<RuntimeController>) {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("login") => {
            app.auth_form.mode = AuthMode::Login;
            app.auth_form.email = parts.next().unwrap_or_default().to_string();
            app.auth_form.password = parts.next().unwrap_or_default().to_string();
            app.auth_form.full_name = String::new();
            app.submit_auth(host);
        }
        Some("signup") => {
            app.auth_form.mode = AuthMode::Signup;
            app.auth_form.email = parts.next().unwrap_or_default().to_string();
            app.auth_form.password = parts.next().unwrap_or_default().to_string();
            app.auth_form.full_name = parts.collect::<Vec<_>>().join(" ");
            app.submit_auth(host);
        }
        Some("quit") => app.on_quit(host),
        _ => println!("Usage: login <email> <password> | signup <email> <password> <full name> | quit"),
    }
}

fn handle_onboard_line(line: &str, app: &mut App, host: &mut Arc<RuntimeController>) {
    let trimmed = line.trim();
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };

    match word {
        "next" => {
            if !app.wizard.advance() {
                println!("Answer the current step first.");
            }
        }
        "back" => {
            if !app.wizard.back() {
                println!("Already at the first step.");
            }
        }
        "remove" => match rest.parse::<usize>() {
            Ok(index) => app.wizard.remove_entry(index),
            Err(_) => println!("Usage: remove <index>"),
        },
        "done" => app.submit_onboarding(host),
        "quit" => app.on_quit(host),
        _ => app.wizard.add_entry(trimmed),
    }
}

/// Applies queued worker events until every in-flight request has resolved.
/// Requests carry bounded timeouts, so this always terminates.
fn settle(controller: &Arc<RuntimeController>, app: &Arc<Mutex<App>>) {
    loop {
        controller.flush_pending_events();
        if !lock_unpoisoned(app).busy() {
            return;
        }
        thread::sleep(SETTLE_POLL);
    }
}

fn render(app: &Arc<Mutex<App>>, rendered_messages: &mut usize) {
    let mut app = lock_unpoisoned(app);

    for notice in std::mem::take(&mut app.notices) {
        println!("* {notice}");
    }

    if let Some(alert) = app.alert.take() {
        let tag = match alert.severity {
            Severity::Success => "ok",
            Severity::Warning => "warn",
            Severity::Error => "error",
        };
        println!("[{tag}] {}", alert.message);
    }

    let messages = app.messages();
    if *rendered_messages > messages.len() {
        // History was cleared (clear-chat or logout).
        *rendered_messages = 0;
    }
    for message in &messages[*rendered_messages..] {
        let who = match message.sender {
            Sender::User => "you",
            Sender::Bot => "bot",
        };
        println!("{who}> {}", message.text);
        if let Some(image_url) = &message.image_url {
            println!("     [image] {image_url}");
        }
    }
    *rendered_messages = messages.len();
}

fn prompt(app: &Arc<Mutex<App>>) -> io::Result<()> {
    let app = lock_unpoisoned(app);
    let label = match app.screen {
        Screen::Auth => "auth".to_string(),
        Screen::Onboard => format!("onboard:{:?}", app.wizard.step()).to_lowercase(),
        Screen::Chat => "chat".to_string(),
    };
    print!("{label}> ");
    io::stdout().flush()
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
