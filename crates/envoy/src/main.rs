use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};

use stacx_envoy::app::App;
use stacx_envoy::cli::{Cli, Commands, ConfigAction};
use stacx_envoy::config::Config;
use stacx_envoy::models;
use stacx_envoy::session::password_strength;
use stacx_envoy::storage::{DurableStorage, SessionStorage};
use stacx_envoy::ui;
use stacx_shared::logging;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init("stacx_envoy=warn");
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load config")?;

    if let Some(Commands::Config { action }) = &cli.command {
        return run_config(&mut config, action.as_ref());
    }

    if let Some(url) = &cli.proxy_url {
        config.proxy_url = url.clone();
    }
    if let Some(url) = &cli.auth_url {
        config.auth_url = url.clone();
    }

    let storage_path = Config::storage_path()?;
    let durable = DurableStorage::open(&storage_path)
        .with_context(|| format!("Failed to open {}", storage_path.display()))?;
    let mut app = App::new(config, durable, SessionStorage::new())?;

    if let Some(choice) = &cli.model {
        app.model = models::resolve(choice)
            .ok_or_else(|| anyhow::anyhow!("Unknown model '{}'", choice))?;
    }

    match cli.command.unwrap_or(Commands::Chat { temporary: false }) {
        Commands::Chat { temporary } => {
            if temporary {
                app.store.set_temporary(true)?;
            }
            ui::interactive_chat(&mut app).await?;
        }
        Commands::Send { message, attach } => {
            for path in &attach {
                app.attach(path)?;
            }
            ui::single_message(&mut app, &message.join(" ")).await?;
        }
        Commands::Chats => ui::print_chat_list(&app),
        Commands::Signup {
            name,
            email,
            password,
        } => {
            let name = ask("Name", name)?;
            let email = ask("Email", email)?;
            let password = ask("Password (min 8 characters)", password)?;
            println!("Password strength: {}", password_strength(&password).label());
            let confirm = ask("Confirm password", None)?;

            let user = app.signup(&name, &email, &password, &confirm).await?;
            println!("Account created. Welcome, {}!", user.first_name());
        }
        Commands::Login {
            email,
            password,
            remember,
        } => {
            let email = ask("Email", email)?;
            let password = ask("Password", password)?;

            let user = app.login(&email, &password, remember).await?;
            println!("Signed in as {}", user.email);
            if !remember {
                // Unremembered sessions end with this process
                ui::interactive_chat(&mut app).await?;
            }
        }
        Commands::Logout => {
            app.logout()?;
            println!("Signed out.");
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn run_config(config: &mut Config, action: Option<&ConfigAction>) -> Result<()> {
    match action {
        None | Some(ConfigAction::Show) => {
            println!("Current config ({}):", Config::config_path()?.display());
            println!("  Proxy URL: {}", config.proxy_url);
            println!("  Auth URL:  {}", config.auth_url);
            println!("  Model:     {}", config.model);
        }
        Some(ConfigAction::Set { key, value }) => {
            let value = if key == "model" {
                models::resolve(value).ok_or_else(|| anyhow::anyhow!("Unknown model '{}'", value))?
            } else {
                value.clone()
            };
            config.set(key, &value)?;
            config.save()?;
            println!("{} updated to: {}", key, value);
        }
    }
    Ok(())
}

fn ask(label: &str, given: Option<String>) -> Result<String> {
    if let Some(value) = given {
        return Ok(value);
    }

    print!("{}: ", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
