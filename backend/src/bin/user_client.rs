#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), forbid(clippy::expect_used))]
//! Command-line client for the user service.
//!
//! ```sh
//! user-client create --name Ada --email ada@example.com --idempotency-key abc-1
//! user-client get 01912b8e-...
//! user-client update 01912b8e-... --email lovelace@example.com
//! ```

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use serde::Serialize;

use user_service::client::UsersClient;
use user_service::domain::{CreateUserRequest, UpdateUserRequest};

/// `user-client` arguments.
#[derive(Debug, Parser)]
#[command(name = "user-client", about = "Call the user service HTTP API", version)]
struct Cli {
    /// Base URL of the service.
    #[arg(long, env = "USER_SERVICE_URL", default_value = "http://localhost:8080")]
    url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a user.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        role: Option<String>,
        /// Reuse the same key to retry safely.
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    /// Fetch a user by id.
    Get { id: String },
    /// List all users.
    List,
    /// Update the given fields of a user.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    /// Delete a user.
    Delete { id: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).wrap_err("encode response")?;
    println!("{json}");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let client = UsersClient::new(cli.url).wrap_err("build http client")?;

    match cli.command {
        Command::Create {
            name,
            email,
            role,
            idempotency_key,
        } => {
            let request = CreateUserRequest { name, email, role };
            let user = client
                .create_user(&request, idempotency_key.as_deref())
                .await?;
            print_json(&user)
        }
        Command::Get { id } => print_json(&client.get_user(&id).await?),
        Command::List => print_json(&client.list_users().await?),
        Command::Update {
            id,
            name,
            email,
            role,
        } => {
            let request = UpdateUserRequest { name, email, role };
            print_json(&client.update_user(&id, &request).await?)
        }
        Command::Delete { id } => {
            client.delete_user(&id).await?;
            println!("user {id} deleted");
            Ok(())
        }
    }
}
