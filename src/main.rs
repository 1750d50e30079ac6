use clap::Parser;
use std::env;
use trackdeck::audio_worker::AudioBackend;
use trackdeck::domain::{Catalog, load_catalog};
use trackdeck::error::AppError;
use trackdeck::ui::{Cli, Command, cli::no_audio_from_env, console, run_console};
use trackdeck::core::spawn_app_actor;
use trackdeck::{logging, settings};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir();

    let no_audio_env = no_audio_from_env(env::var("TRACKDECK_NO_AUDIO").ok().as_deref());
    let audio_backend = if cli.no_audio || no_audio_env {
        AudioBackend::Null
    } else {
        AudioBackend::Real
    };

    let _log_guard = logging::init(
        &data_dir,
        logging::LogConfig {
            dir: cli.log_dir.clone(),
            filter: cli.log_filter.clone(),
        },
    );
    tracing::info!(data_dir = %data_dir.display(), "trackdeck 启动");

    let catalog = match cli.catalog.as_deref() {
        Some(path) => load_catalog(path)?,
        None => Catalog::builtin(),
    };

    match cli.command.unwrap_or(Command::Console) {
        Command::Console => {
            let settings = settings::load_settings(&data_dir);
            let (tx, rx) = spawn_app_actor(catalog, settings, audio_backend);
            run_console(tx, rx, cli.json).await?;
            tracing::info!("trackdeck 退出");
            Ok(())
        }
        Command::Tracks => {
            println!("{}", console::render_catalog(&catalog));
            Ok(())
        }
    }
}
