//! # rusty-chat
//!
//! Terminal front end for an anonymous one-to-one chat session.
//! Reads commands from stdin, prints session events to stdout and
//! logs to stderr.

mod commands;
mod render;

use std::path::Path;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{Command, EmojiChoice, HELP};
use configs::{LogFormat, Settings};
use domains::{MediaRef, RandomSource};
use services::{messaging, ChatSession, DelayRange, Scheduler, SessionSettings, StdRandom};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;
    init_tracing(&settings);

    let rng: Box<dyn RandomSource> = match settings.rng_seed {
        Some(seed) => Box::new(StdRandom::seeded(seed)),
        None => Box::new(StdRandom::from_entropy()),
    };
    let session = ChatSession::new(session_settings(&settings), rng, Scheduler::current());
    tracing::info!(platform_link = %session.platform_link(), "rusty-chat ready");

    let printer = tokio::spawn(print_events(session.clone()));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => run(&session, command)?,
            Err(usage) => println!("! {usage}"),
        }
    }

    session.logout();
    printer.abort();
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match settings.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn session_settings(settings: &Settings) -> SessionSettings {
    SessionSettings {
        match_delay: DelayRange::from_millis(
            settings.matchmaking.min_delay_ms,
            settings.matchmaking.max_delay_ms,
        ),
        reply_delay: DelayRange::from_millis(
            settings.messaging.min_reply_delay_ms,
            settings.messaging.max_reply_delay_ms,
        ),
        reply_probability: settings.messaging.reply_probability,
        platform_link: settings.platform_link.clone(),
        link_marker: settings.link_marker.clone(),
        event_capacity: settings.event_capacity,
    }
}

fn run(session: &ChatSession, command: Command) -> anyhow::Result<()> {
    let outcome = match command {
        Command::Login { name, age, gender } => session.login(&name, age, gender).map(drop),
        Command::Search => session.start_search().map(drop),
        Command::Stop => session.stop_search(),
        Command::Disconnect => session.disconnect(),
        Command::Block => match session.partner() {
            Some(partner) => session.block(partner.id),
            None => {
                println!("! nobody to block");
                Ok(())
            }
        },
        Command::Unblock(id) => {
            if !session.unblock(id) {
                println!("! {id} was not blocked");
            }
            Ok(())
        }
        Command::Blocked => {
            let blocked = session.blocked();
            if blocked.is_empty() {
                println!("You haven't blocked any users yet.");
            }
            for id in blocked {
                println!("  User {id}");
            }
            Ok(())
        }
        Command::Palette => {
            for (index, emoji) in messaging::EMOJI_PALETTE.iter().enumerate() {
                print!("{index}:{emoji} ");
            }
            println!();
            Ok(())
        }
        Command::Emoji(EmojiChoice::Index(index)) => session.send_palette_emoji(index).map(drop),
        Command::Emoji(EmojiChoice::Literal(emoji)) => session.send_emoji(&emoji).map(drop),
        Command::Photo(path) => {
            let file_name = Path::new(&path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            session.send_photo(&file_name, MediaRef::new(path)).map(drop)
        }
        Command::Status => {
            let snapshot = session.snapshot();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        Command::Link => {
            println!("Also available at {}", session.platform_link());
            Ok(())
        }
        Command::Logout => {
            session.logout();
            Ok(())
        }
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Say(text) => session.send_text(&text).map(drop),
        Command::Empty | Command::Quit => Ok(()),
    };

    if let Err(err) = outcome {
        println!("! {err}");
    }
    Ok(())
}

async fn print_events(session: ChatSession) {
    let mut events = session.subscribe();
    loop {
        match events.recv().await {
            Ok(event) => {
                let user = session.user();
                let partner = session.partner();
                println!("{}", render::event_line(&event, user.as_ref(), partner.as_ref()));
            }
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "terminal fell behind, events skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
