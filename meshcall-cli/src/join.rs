use crate::console::{self, ConsoleCommand};
use anyhow::{Context, Result};
use colored::*;
use meshcall::client::{
    CallClient, ChatSender, ClientConfig, ClientId, DEFAULT_SIGNALING_URL, MediaConstraints,
    Session, SessionEvent, SignalingEndpoint,
};
use std::env;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

#[derive(clap::Args)]
pub struct JoinArgs {
    /// Signaling endpoint, e.g. wss://example.org [env: MESHCALL_SIGNALING_URL]
    #[arg(long)]
    url: Option<String>,

    /// Mount point of the room sockets on the endpoint [env: MESHCALL_WS_PATH]
    #[arg(long)]
    ws_path: Option<String>,

    /// Room to join. Prompted for when missing.
    #[arg(short, long)]
    room: Option<String>,

    /// Identity in the room. Generated when missing.
    #[arg(long)]
    client_id: Option<String>,

    #[arg(long)]
    no_video: bool,

    #[arg(long)]
    no_audio: bool,
}

pub async fn run(args: JoinArgs) -> Result<()> {
    let config = build_config(&args)?;
    let room = match args.room {
        Some(room) => room,
        None => prompt_room().await?,
    };

    let client = CallClient::native(config).context("Failed to set up WebRTC")?;
    let (mut session, mut events) = client
        .join(room.as_str(), args.client_id.map(ClientId::from))
        .await
        .context("Failed to join room")?;

    println!(
        "{} {} {} {}",
        "Joining".cyan().bold(),
        room.bold(),
        "as".cyan(),
        session.client_id().to_string().bold()
    );
    println!("{}", console::HELP.dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let done = matches!(event, SessionEvent::Disconnected { .. });
                    print_event(&event);
                    if done {
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => warn!("Missed {} session events", n),
                Err(RecvError::Closed) => break,
            },

            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if !handle_line(&mut session, &line).await? {
                        break;
                    }
                }
                None => stdin_open = false,
            },
        }
    }

    session.leave().await?;
    Ok(())
}

fn build_config(args: &JoinArgs) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("Invalid client environment")?;
    if args.url.is_some() || args.ws_path.is_some() {
        let url = args
            .url
            .clone()
            .or_else(|| env::var("MESHCALL_SIGNALING_URL").ok())
            .unwrap_or_else(|| DEFAULT_SIGNALING_URL.to_owned());
        let ws_path = args
            .ws_path
            .clone()
            .unwrap_or_else(|| config.endpoint.ws_path().to_owned());
        config.endpoint = SignalingEndpoint::new(&url, &ws_path)?;
    }
    config.media = MediaConstraints {
        video: !args.no_video,
        audio: !args.no_audio,
    };
    Ok(config)
}

async fn prompt_room() -> Result<String> {
    tokio::task::spawn_blocking(|| {
        dialoguer::Input::<String>::new()
            .with_prompt("Room")
            .interact_text()
    })
    .await?
    .context("Failed to read room name")
}

/// Returns false when the user wants to leave.
async fn handle_line(session: &mut Session, line: &str) -> Result<bool> {
    match console::parse(line) {
        ConsoleCommand::Empty => {}
        ConsoleCommand::Chat(text) => {
            if let Err(e) = session.send_chat(text).await {
                println!("{} {}", "!".red().bold(), e);
            }
        }
        ConsoleCommand::Mute => {
            let media = session.set_audio_enabled(false).await?;
            println!("{} audio {}", "*".yellow(), on_off(media.audio_enabled));
        }
        ConsoleCommand::Unmute => {
            let media = session.set_audio_enabled(true).await?;
            println!("{} audio {}", "*".yellow(), on_off(media.audio_enabled));
        }
        ConsoleCommand::Video(enabled) => {
            let media = session.set_video_enabled(enabled).await?;
            println!("{} video {}", "*".yellow(), on_off(media.video_enabled));
        }
        ConsoleCommand::Peers => {
            let peers = session.peers().await?;
            if peers.is_empty() {
                println!("{} nobody else here", "*".yellow());
            }
            for peer in peers {
                let tracks = peer.remote_stream.map(|s| s.tracks.len()).unwrap_or(0);
                println!(
                    "{} {} ({:?}, {} tracks)",
                    "*".yellow(),
                    peer.peer_id.to_string().bold(),
                    peer.negotiation,
                    tracks
                );
            }
        }
        ConsoleCommand::Help => println!("{}", console::HELP.dimmed()),
        ConsoleCommand::Invalid(input) => {
            println!("{} unknown command {:?}. {}", "!".red().bold(), input, console::HELP);
        }
        ConsoleCommand::Leave => {
            session.leave().await?;
            return Ok(false);
        }
    }
    Ok(true)
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Connected { client_id } => {
            println!("{} connected as {}", "+".green().bold(), client_id);
        }
        SessionEvent::UserJoined { peer_id } => {
            println!("{} {} joined", "+".green(), peer_id.to_string().bold());
        }
        SessionEvent::UserLeft { peer_id } => {
            println!("{} {} left", "-".red(), peer_id.to_string().bold());
        }
        SessionEvent::Track { peer_id, stream } => {
            let kinds: Vec<String> = stream
                .tracks
                .iter()
                .map(|t| format!("{:?}", t.kind).to_lowercase())
                .collect();
            println!(
                "{} media from {}: {}",
                "~".blue(),
                peer_id.to_string().bold(),
                kinds.join(", ")
            );
        }
        SessionEvent::Chat(chat) => {
            let name = match &chat.sender {
                ChatSender::Local => "me".dimmed(),
                ChatSender::Peer(id) => id.to_string().magenta().bold(),
            };
            println!("[{}] {}", name, chat.content);
        }
        SessionEvent::Error(e) if e.is_fatal() => {
            println!("{} {}", "error:".red().bold(), e);
        }
        SessionEvent::Error(e) => println!("{} {}", "warning:".yellow().bold(), e),
        SessionEvent::Disconnected { reason } => {
            println!(
                "{} disconnected{}",
                "x".red().bold(),
                reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default()
            );
        }
    }
}
