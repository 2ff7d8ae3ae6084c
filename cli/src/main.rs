mod client;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

use clap::{Args, Parser, Subcommand};
use larch_model::csrf::DEFAULT_CSRF_HEADER;
use larch_model::{CsrfToken, EntityPatch, NewEntity};
use serde_json::Value;

use crate::client::LarchClient;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("server returned HTTP {status}; error page: {error_page}")]
    ServerError { status: u16, error_page: String },
    #[error("server returned an empty entity id")]
    EmptyCreatedId,
    #[error("invalid --set argument `{0}`; expected field=value")]
    InvalidAssignment(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "larch", about = "larch repository entity and user CLI")]
struct Cli {
    #[arg(long, env = "LARCH_BASE_URL", default_value = "http://127.0.0.1:8080")]
    base_url: String,

    #[arg(long, env = "LARCH_USER")]
    user: Option<String>,

    #[arg(long, env = "LARCH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, env = "LARCH_CSRF_TOKEN", hide_env_values = true)]
    csrf_token: Option<String>,

    #[arg(long, env = "LARCH_CSRF_HEADER", default_value = DEFAULT_CSRF_HEADER)]
    csrf_header: String,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Entity(EntityCommand),
    User(UserCommand),
}

#[derive(Args, Debug)]
struct EntityCommand {
    #[command(subcommand)]
    command: EntitySubcommand,
}

#[derive(Subcommand, Debug)]
enum EntitySubcommand {
    Create {
        #[arg(long, default_value = "", help = "Identifier; empty lets the server assign one")]
        id: String,
        #[arg(long = "type", default_value = "DATA")]
        entity_type: String,
        #[arg(long)]
        label: String,
        #[arg(long, default_value = "", help = "Comma-separated tags")]
        tags: String,
        #[arg(long, default_value = "")]
        parent: String,
    },
    Get {
        id: String,
    },
    Patch {
        id: String,
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        assignments: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand, Debug)]
enum UserSubcommand {
    List,
    Delete { name: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(log_level(cli.verbose))
        .init();

    let csrf = CsrfToken::from_meta(cli.csrf_token.as_deref(), Some(cli.csrf_header.as_str()));
    let credentials = cli.user.map(|user| (user, cli.password));
    let client = LarchClient::new(cli.base_url, credentials, csrf)?;

    match cli.command {
        Command::Entity(entity) => run_entity(&client, entity).await,
        Command::User(user) => run_user(&client, user).await,
    }
}

fn log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

async fn run_entity(client: &LarchClient, entity: EntityCommand) -> Result<(), CliError> {
    match entity.command {
        EntitySubcommand::Create {
            id,
            entity_type,
            label,
            tags,
            parent,
        } => {
            let body = NewEntity::from_form(&id, &entity_type, &label, &tags, &parent);
            let created = client.create_entity(&body).await?;
            println!("{created}");
            Ok(())
        }
        EntitySubcommand::Get { id } => {
            let json = client.fetch_entity(&id).await?;
            print_json(&json)
        }
        EntitySubcommand::Patch { id, assignments } => {
            let patch = build_patch(&assignments)?;
            client.patch_entity(&id, &patch).await?;
            eprintln!("patched {} field(s) on {id}", patch.len());
            Ok(())
        }
    }
}

async fn run_user(client: &LarchClient, user: UserCommand) -> Result<(), CliError> {
    match user.command {
        UserSubcommand::List => {
            let json = client.fetch_users().await?;
            print_json(&json)
        }
        UserSubcommand::Delete { name } => {
            client.delete_user(&name).await?;
            eprintln!("deleted user {name}");
            Ok(())
        }
    }
}

/// Split a `field=value` argument. The value may itself contain `=`.
fn parse_assignment(raw: &str) -> Result<(String, String), CliError> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| CliError::InvalidAssignment(raw.to_owned()))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(CliError::InvalidAssignment(raw.to_owned()));
    }
    Ok((field.to_owned(), value.to_owned()))
}

/// Build a patch from repeated `--set` arguments; later values win.
fn build_patch(assignments: &[String]) -> Result<EntityPatch, CliError> {
    let mut patch = EntityPatch::new();
    for raw in assignments {
        let (field, value) = parse_assignment(raw)?;
        patch.set(field, value);
    }
    Ok(patch)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
