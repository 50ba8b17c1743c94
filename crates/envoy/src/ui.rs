use anyhow::Result;
use chrono::{Local, TimeZone, Timelike};
use crossterm::style::{Color, Stylize};
use std::io::{self, Write};
use std::path::Path;

use crate::app::App;
use crate::commands::{self, Command, HELP};
use crate::conversation::{Conversation, Message, Sender, now_millis};
use crate::models::{self, MODELS};
use crate::render::render_reply;
use crate::session;

fn toast(message: &str) {
    println!("{}", format!("» {}", message).with(Color::Yellow));
}

fn problem(message: impl std::fmt::Display) {
    eprintln!("{}", format!("✗ {}", message).with(Color::Red));
}

fn clock(timestamp: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

fn print_message(out: &mut impl Write, message: &Message) -> io::Result<()> {
    match message.sender {
        Sender::User => {
            writeln!(out, "{} {}", "You:".bold(), message.content)?;
            for file in &message.files {
                writeln!(out, "  📎 {} ({})", file.name, file.mime_type)?;
            }
        }
        Sender::Assistant => {
            writeln!(out, "{}", "StacXai:".bold().with(Color::Green))?;
            render_reply(out, &message.content)?;
        }
    }
    writeln!(out, "{}", clock(message.timestamp).with(Color::DarkGrey))
}

fn print_conversation(app: &App, chat: &Conversation) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "\n── {} ──", chat.display_title().bold())?;
    if chat.messages.is_empty() {
        print_greeting(app);
    }
    for message in &chat.messages {
        print_message(&mut out, message)?;
    }
    Ok(())
}

fn print_greeting(app: &App) {
    let hour = Local::now().hour();
    if let Some(greeting) = session::greeting(app.user.as_ref(), hour) {
        println!("\n{}\n", greeting.bold());
    }
}

/// Sidebar listing. History stays hidden while temporary mode is on.
pub fn print_chat_list(app: &App) {
    if app.store.is_temporary() {
        println!("Temporary chat is on. History is hidden and nothing is saved.");
        return;
    }
    if app.store.chats().is_empty() {
        println!("No conversations yet.");
        return;
    }

    let positions = |id: &str| app.store.chats().iter().position(|c| c.id == id).unwrap_or(0) + 1;
    for group in app.store.grouped_by_date(now_millis()) {
        println!("{}", group.label.as_str().with(Color::DarkGrey));
        for chat in group.chats {
            let marker = if app.store.current_id() == Some(chat.id.as_str()) { "*" } else { " " };
            println!("{} {:>3}. {}", marker, positions(&chat.id), chat.display_title());
        }
    }
}

fn print_models(app: &App) {
    for (i, label) in MODELS.iter().enumerate() {
        let marker = if app.model == *label { "*" } else { " " };
        println!("{} {}. {}", marker, i + 1, label);
    }
}

fn prompt(app: &App) -> String {
    let mut tags = Vec::new();
    if app.store.is_temporary() {
        tags.push("temp".to_string());
    }
    if !app.pending.is_empty() {
        tags.push(format!("📎{}", app.pending.list().len()));
    }
    if tags.is_empty() {
        "You: ".to_string()
    } else {
        format!("[{}] You: ", tags.join(" "))
    }
}

/// Sends one message and prints the reply.
pub async fn single_message(app: &mut App, message: &str) -> Result<()> {
    let (_, reply) = app.send(message).await?;
    let mut out = io::stdout().lock();
    render_reply(&mut out, &reply)?;
    Ok(())
}

pub async fn interactive_chat(app: &mut App) -> Result<()> {
    println!("StacXai chat started. Type /help for commands, 'quit' to exit.");
    match app.store.current() {
        Some(chat) => print_conversation(app, chat)?,
        None => print_greeting(app),
    }

    loop {
        print!("{}", prompt(app));
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            println!();
            break;
        }
        if input.trim().is_empty() {
            continue;
        }

        match commands::parse(&input) {
            Command::Quit => {
                println!("Goodbye!");
                break;
            }
            command => {
                if let Err(e) = handle(app, command).await {
                    problem(e);
                }
            }
        }
    }

    Ok(())
}

async fn handle(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Message(text) => {
            println!();
            let (_, reply) = app.send(&text).await?;
            println!("{}", "StacXai:".bold().with(Color::Green));
            render_reply(&mut io::stdout().lock(), &reply)?;
            println!();
        }
        Command::New => {
            app.store.create()?;
            println!("Started a new conversation.");
            print_greeting(app);
        }
        Command::List => print_chat_list(app),
        Command::Select(target) => {
            let id = app.chat_ref(&target)?;
            app.store.select(&id)?;
            if let Some(chat) = app.store.current() {
                print_conversation(app, chat)?;
            }
        }
        Command::Rename(title) => {
            let id = app
                .store
                .current_id()
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("No conversation is open"))?;
            app.store.rename(&id, &title)?;
            toast("Conversation renamed");
        }
        Command::Delete(target) => {
            let id = match target {
                Some(target) => app.chat_ref(&target)?,
                None => app
                    .store
                    .current_id()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow::anyhow!("No conversation is open"))?,
            };
            app.store.delete(&id)?;
            toast("Conversation deleted");
        }
        Command::Edit { position, text } => {
            app.edit_message(position, &text)?;
            toast("Message updated");
        }
        Command::Model(None) => print_models(app),
        Command::Model(Some(choice)) => {
            let model = models::resolve(&choice)
                .ok_or_else(|| anyhow::anyhow!("Unknown model '{}'", choice))?;
            println!("Model: {}", model);
            app.model = model;
        }
        Command::Temp => {
            let on = !app.store.is_temporary();
            app.store.set_temporary(on)?;
            if on {
                toast("Temporary chat on. Conversations won't be saved.");
            } else {
                toast("Temporary chat off");
                if let Some(chat) = app.store.current() {
                    print_conversation(app, chat)?;
                }
            }
        }
        Command::Attach(path) => {
            let described = app.attach(Path::new(&path))?;
            toast(&format!("Attached {}", described));
        }
        Command::Detach(n) => match app.pending.detach(n) {
            Some(file) => toast(&format!("Removed {}", file.name)),
            None => problem(format!("No attachment #{}", n)),
        },
        Command::Mic => match app.dictation.toggle() {
            Ok(true) => toast("Listening..."),
            Ok(false) => toast("Stopped listening"),
            Err(notice) => toast(&notice),
        },
        Command::Home => {
            app.store.clear_selection()?;
            print_greeting(app);
        }
        Command::Like => toast("Thanks for your upvote!"),
        Command::Dislike => toast("Downvoted Response!"),
        Command::Help => println!("{}", HELP),
        Command::Usage(usage) => problem(format!("Usage: {}", usage)),
        Command::Unknown(name) => problem(format!("Unknown command /{} (try /help)", name)),
        Command::Quit => {}
    }
    Ok(())
}
