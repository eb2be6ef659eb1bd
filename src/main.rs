// Weather Atlas v0.1
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod errors;
mod helpers;
mod models;
mod services;
mod shell;
#[cfg(test)]
mod test_support;
mod view;

use config::{AppConfig, INITIAL_CAMERA};
use services::photos::{PhotoSource, WikipediaPhotos};
use services::report_client::HttpReportClient;
use shell::{Command, ConsoleNotifier, Flow, LoggingMapSurface};
use view::controller::{Collaborators, SelectionController};

#[tokio::main]
async fn main() {
    // Initialize tracing; stdout is reserved for the console.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_atlas=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let reports = match HttpReportClient::new(
        &config.report_api_url,
        &config.user_agent,
        config.request_timeout,
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to build report client: {}", e);
            std::process::exit(1);
        }
    };

    let photos: Option<Arc<dyn PhotoSource>> = if config.photo_lookup {
        match reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()
        {
            Ok(client) => {
                let photos: Arc<dyn PhotoSource> =
                    Arc::new(WikipediaPhotos::new(client, &config.wikipedia_base_url));
                Some(photos)
            }
            Err(e) => {
                tracing::warn!("Photo lookup disabled, client setup failed: {}", e);
                None
            }
        }
    } else {
        tracing::info!("Photo lookup disabled");
        None
    };

    let mut controller = SelectionController::new(
        Collaborators {
            reports: Arc::new(reports),
            photos,
            surface: Box::new(LoggingMapSurface::new(INITIAL_CAMERA)),
            notifier: Box::new(ConsoleNotifier),
        },
        INITIAL_CAMERA,
    );

    tracing::info!(
        "Weather Atlas ready, reports from {}",
        config.report_api_url
    );
    println!("Search a place, then pick a date to see its weather report. Type 'help' for commands.");

    let download_dir = PathBuf::from(&config.download_dir);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("Failed to read input: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse(&line) {
                    Ok(command) => {
                        if shell::execute(&mut controller, command, &download_dir).await == Flow::Quit {
                            break;
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            Some(completion) = controller.next_completion() => {
                if controller.handle_completion(completion) {
                    if let Some(error) = controller.error() {
                        println!("{}", error);
                    }
                }
            }
        }
    }

    tracing::info!("Shutting down");
}
