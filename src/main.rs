use clap::Parser;
use srbeep::audio::open_device;
use srbeep::config::Settings;
use srbeep::events::{DeviceFactory, EventPlayer};
use srbeep::init_app_dirs;
use srbeep::logging;
use srbeep::ui::{display_events, parse_event_line, Args, Command};
use std::error::Error;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if let Err(e) = logging::init(args.log_json) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let config_path = args.config_path();
    let mut settings = Settings::load(&config_path)?;
    args.apply_to(&mut settings);
    settings.validate()?;
    debug!("Settings loaded from {}", config_path.display());

    match args.command {
        Command::Events => {
            let mut stdout = std::io::stdout().lock();
            display_events(&mut stdout, &settings.sound_library())?;
        }
        Command::Play { events } => {
            init_app_dirs(&config_path, &settings)?;
            let mut player = event_player(&settings);
            for event in events {
                player.trigger(event).await;
            }
            player.shutdown().await;
        }
        Command::Listen => {
            init_app_dirs(&config_path, &settings)?;
            let mut player = event_player(&settings);
            listen(&mut player).await?;
            player.shutdown().await;
        }
    }

    Ok(())
}

fn event_player(settings: &Settings) -> EventPlayer {
    let device_name = settings.output_device.clone();
    let factory: DeviceFactory = Arc::new(move || open_device(&device_name));
    EventPlayer::new(settings.sound_library(), settings.session_options(), factory)
}

async fn listen(player: &mut EventPlayer) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Listening for events on stdin.");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Stdin closed.");
                    break;
                };
                match parse_event_line(&line) {
                    Some(Ok(event)) => player.trigger(event).await,
                    Some(Err(e)) => warn!("Ignoring input: {}", e),
                    None => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, waiting for sessions to finish.");
                break;
            }
        }
    }
    Ok(())
}
