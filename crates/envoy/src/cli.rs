use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Terminal client for StacXai
#[derive(Parser, Debug)]
#[command(name = "stacx", version, about)]
pub struct Cli {
    /// Override the proxy URL from the config file
    #[arg(long, global = true, env = "STACX_PROXY_URL")]
    pub proxy_url: Option<String>,

    /// Override the auth server URL from the config file
    #[arg(long, global = true, env = "STACX_AUTH_URL")]
    pub auth_url: Option<String>,

    /// Model label (or vendor/model id) for this run
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat (default)
    Chat {
        /// Start in temporary mode; nothing is saved
        #[arg(long)]
        temporary: bool,
    },
    /// Send one message in the open conversation and print the reply
    Send {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// Attach a file preview (repeatable)
        #[arg(short, long = "attach")]
        attach: Vec<PathBuf>,
    },
    /// List saved conversations grouped by date
    Chats,
    /// Create an account on the auth server
    Signup {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, env = "STACX_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign in; without --remember the session lasts for one chat
    Login {
        #[arg(long)]
        email: Option<String>,
        #[arg(long, env = "STACX_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Stay signed in across runs
        #[arg(long)]
        remember: bool,
    },
    /// Forget the signed-in user
    Logout,
    /// Show or change client settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    Show,
    /// Keys: proxy_url, auth_url, model
    Set { key: String, value: String },
}
