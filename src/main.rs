use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use std::sync::Arc;

use unibro_client::api::UniBroApi;
use unibro_client::auth::{LoginHint, SqliteTokenStore};
use unibro_client::config::{Command, Config};
use unibro_client::error::ApiError;
use unibro_client::models::chat::{Message, Role};
use unibro_client::models::user::RegisterRequest;
use unibro_client::models::ReviewData;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = Config::load()?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .init();
    }

    tracing::debug!("API base URL: {}", config.api_base_url());
    tracing::debug!("Token store: {}", config.token_db.display());

    let store = Arc::new(SqliteTokenStore::open(&config.token_db)?);
    let api = UniBroApi::from_config(&config, store, Arc::new(LoginHint::default()))?;

    if let Err(e) = run(&api, command).await {
        report(&e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(api: &UniBroApi, command: Command) -> Result<()> {
    match command {
        Command::Login { username } => login(api, username).await,
        Command::Register => register(api).await,
        Command::Logout => {
            api.logout()?;
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => {
            require_login(api)?;
            let user = api.fetch_user().await?;
            println!("{} <{}>", user.username, user.email);
            Ok(())
        }
        Command::Sessions => {
            require_login(api)?;
            let sessions = api.list_sessions().await?;
            if sessions.is_empty() {
                println!("No chat sessions yet");
            }
            for session in sessions {
                let created = session
                    .created_at
                    .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "{:<38} {:<16} {}",
                    session.session_id,
                    created,
                    session.display_title()
                );
            }
            Ok(())
        }
        Command::New => {
            require_login(api)?;
            let session_id = api.create_session().await?;
            println!("{}", session_id);
            Ok(())
        }
        Command::History { session_id } => {
            require_login(api)?;
            for message in api.get_messages(&session_id).await? {
                print_message(&message);
            }
            Ok(())
        }
        Command::Send { session, message } => {
            require_login(api)?;
            let session_id = resolve_session(api, session).await?;
            match api.send_message(&session_id, &message).await? {
                Some(reply) => println!("{}", reply),
                None => println!("(no response)"),
            }
            Ok(())
        }
        Command::Chat { session_id } => {
            require_login(api)?;
            chat(api, session_id).await
        }
        Command::Sop { file } => {
            require_login(api)?;
            let review = api.review_sop(&file).await?;
            print_review(&review);
            Ok(())
        }
    }
}

async fn login(api: &UniBroApi, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .context("Failed to read username")?,
    };
    let password = Password::new()
        .with_prompt("Password")
        .interact()
        .context("Failed to read password")?;

    api.login(&username, &password).await?;
    println!("Signed in as {}.", username);
    Ok(())
}

async fn register(api: &UniBroApi) -> Result<()> {
    let username: String = Input::new()
        .with_prompt("Username")
        .interact_text()
        .context("Failed to read username")?;
    let email: String = Input::new()
        .with_prompt("Email")
        .interact_text()
        .context("Failed to read email")?;
    let password = Password::new()
        .with_prompt("Password")
        .interact()
        .context("Failed to read password")?;
    let confirm_password = Password::new()
        .with_prompt("Confirm password")
        .interact()
        .context("Failed to read password confirmation")?;

    let response = api
        .register(&RegisterRequest {
            username,
            email,
            password,
            confirm_password,
        })
        .await?;

    println!(
        "{}",
        response
            .message
            .unwrap_or_else(|| "User Registered Successfully".to_string())
    );
    println!("Run `unibro login` to sign in.");
    Ok(())
}

async fn chat(api: &UniBroApi, session_id: Option<String>) -> Result<()> {
    let session_id = match session_id {
        Some(id) => id,
        None => match api.latest_session().await? {
            Some(session) => session.session_id,
            None => api.create_session().await?,
        },
    };

    println!("Session {} (empty line or /quit to leave)", session_id);
    for message in api.get_messages(&session_id).await? {
        print_message(&message);
    }

    loop {
        let line: String = Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read message")?;

        let line = line.trim();
        if line.is_empty() || line == "/quit" {
            return Ok(());
        }

        match api.send_message(&session_id, line).await {
            Ok(Some(reply)) => println!("unibro> {}\n", reply),
            Ok(None) => println!("unibro> (no response)\n"),
            Err(e) if e.requires_login() => return Err(e.into()),
            Err(e) => eprintln!("Failed to send message: {}", e),
        }
    }
}

async fn resolve_session(api: &UniBroApi, session: Option<String>) -> Result<String> {
    if let Some(id) = session {
        return Ok(id);
    }
    api.latest_session()
        .await?
        .map(|s| s.session_id)
        .context("No chat sessions yet. Run `unibro new` to start one.")
}

fn require_login(api: &UniBroApi) -> Result<()> {
    if !api.is_authenticated() {
        anyhow::bail!("Not signed in. Run `unibro login` first.");
    }
    Ok(())
}

fn print_message(message: &Message) {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "unibro",
        Role::Other => "system",
    };
    println!("{}> {}", who, message.content);
}

fn print_review(review: &ReviewData) {
    // Set instead of the sections when the upload is not an SOP
    if let Some(message) = &review.message {
        println!("{}", message);
        return;
    }

    for (title, text) in review.sections() {
        println!("== {} ==\n{}\n", title, text);
    }
}

/// One-line notification for a failed command
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<ApiError>() {
        // The navigation sink already told the user to sign in again
        Some(ApiError::RefreshFailed(_)) | Some(ApiError::AuthError(_)) => {
            tracing::debug!("Command failed: {:#}", err);
        }
        Some(ApiError::Unauthorized(msg)) => {
            eprintln!("Not authorized: {}. Run `unibro login`.", msg);
        }
        _ => eprintln!("Error: {:#}", err),
    }
}
