use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use client_core::{
    endpoint_from_origin,
    surface::{Slider, TextField},
    CommandDispatcher, ConnectionManager, WsTransport,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

#[derive(Parser, Debug)]
struct Args {
    /// Web origin of the remote control server; the WebSocket
    /// endpoint is derived from it.
    #[arg(long, default_value = "http://localhost:8080")]
    server_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let origin = Url::parse(&args.server_url)?;
    let endpoint = endpoint_from_origin(&origin)?;
    let manager = ConnectionManager::new(Arc::new(WsTransport), endpoint);

    let mut updates = manager.subscribe_updates();
    tokio::spawn(async move {
        while let Ok(update) = updates.recv().await {
            let marker = if update.connected { "online" } else { "offline" };
            println!("[{marker}] {}", update.message);
        }
    });

    manager.connect().await;
    let dispatcher = CommandDispatcher::new(Arc::clone(&manager));

    println!("Media Remote Control");
    println!("Commands:");
    println!("- play / pause / next / previous / volumeUp / volumeDown");
    println!("- volume <0-100>: set the volume level");
    println!("- open <url>: open a YouTube URL");
    println!("- reconnect: retry the connection now");
    println!("- quit: exit");

    let mut volume = Slider::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" {
            break;
        }

        let (action, rest) = match input.split_once(' ') {
            Some((action, rest)) => (action, rest.trim()),
            None => (input, ""),
        };
        match action {
            "open" => {
                let mut field = TextField::new();
                field.set(rest);
                dispatcher.open_url(&mut field).await;
            }
            "volume" => match rest.parse::<i64>() {
                Ok(level) => {
                    volume.set_value(level);
                    dispatcher.set_volume(&volume).await;
                }
                Err(_) => println!("volume takes a number, e.g. `volume 42`"),
            },
            "reconnect" => manager.notify_focus().await,
            _ => dispatcher.press(action).await,
        }
    }

    manager.disconnect().await;
    Ok(())
}
