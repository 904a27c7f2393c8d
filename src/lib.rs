pub mod cli;
pub mod core;
pub mod providers;

use crate::core::BackendKind;
use crate::core::config::AppConfig;
use crate::core::request::ConvertRequest;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Rates,
    Convert {
        amount: f64,
        from: String,
        to: String,
    },
    Currencies,
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => {
            let default_path = AppConfig::default_config_path()?;
            if default_path.exists() {
                AppConfig::load_from_path(&default_path)
            } else {
                debug!(
                    "No config at {}, using built-in defaults",
                    default_path.display()
                );
                Ok(AppConfig::default())
            }
        }
    }
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    api_method: Option<BackendKind>,
) -> Result<()> {
    info!("fxconv starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Rates => {
            let service = providers::create_service(&config, api_method).await;
            cli::rates::run(service, chrono::Local::now().naive_local()).await
        }
        AppCommand::Convert { amount, from, to } => {
            let request = ConvertRequest::new(amount, &from, &to)?;
            let service = providers::create_service(&config, api_method).await?;
            cli::convert::run(service.as_ref(), request).await
        }
        AppCommand::Currencies => {
            let service = providers::create_service(&config, api_method).await?;
            let currencies = service.supported_currencies();
            let table = cli::currencies::display_as_table(service.backend(), &currencies);
            println!("{table}");
            Ok(())
        }
    }
}
