// println!/eprintln! are the correct output mechanism for CLI tools (not tracing).
#![allow(clippy::print_stdout, clippy::print_stderr)]

//! TaskHub CLI - Create User
//!
//! Creates an active user and prints an access token for it. Login flows are
//! not part of the server, so this is how API and WebSocket clients get a
//! token.
//! Usage: cargo run --bin create_user -- <username> <email>

use std::io::{self, Write};
use std::process::ExitCode;

use taskhub_web::config::Config;
use taskhub_web::db::create_pool;
use taskhub_web::models::NewUser;
use taskhub_web::services::AuthService;
use taskhub_web::store::{PgStore, UserStore};

#[tokio::main]
async fn main() -> ExitCode {
    println!("\n👤 TaskHub - Create User");
    println!("========================\n");

    let mut args = std::env::args().skip(1);
    let username = match args.next() {
        Some(username) => username,
        None => match prompt("Username") {
            Some(username) => username,
            None => return ExitCode::FAILURE,
        },
    };
    let email = match args.next() {
        Some(email) => email,
        None => match prompt("Email") {
            Some(email) => email,
            None => return ExitCode::FAILURE,
        },
    };

    if username.trim().len() < 3 || username.trim().len() > 150 {
        eprintln!("❌ Username must be between 3 and 150 characters.");
        return ExitCode::FAILURE;
    }
    if !email.contains('@') {
        eprintln!("❌ Invalid email format.");
        return ExitCode::FAILURE;
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let auth = match AuthService::new(&config) {
        Ok(auth) => auth,
        Err(e) => {
            eprintln!("❌ Failed to initialise token signing: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = match create_pool(&config.database) {
        Ok(pool) => PgStore::new(pool),
        Err(e) => {
            eprintln!("❌ Failed to create database pool: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let user = match store
        .insert_user(NewUser::new(username.trim(), email.trim()))
        .await
    {
        Ok(user) => user,
        Err(e) => {
            eprintln!("❌ Failed to create user: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match auth.generate_access_token(user.id, &user.username) {
        Ok(token) => {
            println!("✅ User '{}' created with id {}.", user.username, user.id);
            println!(
                "\nAccess token (valid {} minutes):\n{}\n",
                config.jwt.access_token_lifetime_minutes, token
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ User created but token generation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn prompt(label: &str) -> Option<String> {
    print!("{}: ", label);
    if io::stdout().flush().is_err() {
        return None;
    }
    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(_) => Some(input.trim().to_string()),
        Err(e) => {
            eprintln!("❌ Failed to read {}: {}", label.to_lowercase(), e);
            None
        }
    }
}
