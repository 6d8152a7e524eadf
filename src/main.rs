// src/main.rs
use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use expense_tracker::{cli, logging, validate, ApiClient, ApiError, Config, FileSessionStore};

#[derive(Debug, Parser)]
#[command(name = "expense-tracker", version, about = "Track spends and tasks against a REST backend")]
struct Args {
    /// Backend base URL, e.g. http://127.0.0.1:8000/api/
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive terminal client (default)
    Tui,
    /// Log in and store the session. Password from EXPENSE_TRACKER_PASSWORD or stdin.
    Login {
        #[arg(long, short)]
        username: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the profile of the stored session
    Whoami,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err
                .downcast_ref::<ApiError>()
                .map(ApiError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = &args.api_url {
        config = config.with_api_url(url)?;
    }

    let command = args.command.unwrap_or(Command::Tui);
    if matches!(command, Command::Tui) {
        logging::init_file(&config.log_file)?;
        return cli::run(&config).await;
    }

    logging::init_stderr()?;
    let store = Arc::new(FileSessionStore::new(&config.session_file));
    let api = ApiClient::from_config(&config, store)?;

    match command {
        Command::Tui => unreachable!("handled above"),
        Command::Login { username } => {
            let password = match std::env::var("EXPENSE_TRACKER_PASSWORD") {
                Ok(p) if !p.is_empty() => p,
                _ => read_password_line()?,
            };
            let creds = validate::credentials(&username, &password)?;
            let session = api.login(&creds).await?;
            println!(
                "Logged in as {}",
                session.username.unwrap_or(creds.username)
            );
        }
        Command::Logout => {
            api.logout()?;
            println!("Logged out");
        }
        Command::Whoami => {
            let profile = api.get_profile().await?;
            println!("{} <{}>", profile.display_name(), profile.email);
        }
    }
    Ok(())
}

fn read_password_line() -> anyhow::Result<String> {
    eprint!("Password: ");
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
