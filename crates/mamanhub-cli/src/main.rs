//! Ma'man Hub CLI - a command-line client for the Ma'man Hub learning platform.
//!
//! Logs in against the platform API, keeps the session tokens locally, and
//! sends authenticated requests. Expired access tokens are refreshed
//! transparently; when that fails the session is cleared and the user is
//! asked to log in again.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use mamanhub_core::auth::{
    FileTokenStore, KeyringTokenStore, LoginRequest, SessionExpired, TokenStore,
};
use mamanhub_core::cart::CartStore;
use mamanhub_core::models::CartItem;
use mamanhub_core::{ApiClient, ApiRequest, AuthService, Config, TokenStorage};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "\
Usage: mamanhub <command> [args]

Commands:
  login [email]              Log in and store the session tokens
  logout                     End the session
  whoami                     Show the logged-in user
  forgot-password <email>    Send a password reset email
  get <path>                 Send an authenticated GET request
  post <path> [json]         Send an authenticated POST request
  cart [list]                Show the cart
  cart add <json>            Add a course (CartItem JSON) to the cart
  cart remove <id>           Remove a course from the cart
  cart coupon <code>         Apply a coupon code
  cart uncoupon              Remove the applied coupon
  cart clear                 Empty the cart

Environment:
  MAMANHUB_API_BASE_URL      Override the API base URL
  RUST_LOG                   Log filter for stderr (default: warn)";

/// Log file prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "mamanhub.log";

/// Initialize the tracing subscriber for logging.
/// stderr honours RUST_LOG; the daily log file in the cache dir records debug output.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_filter(filter);

    let file = config.cache_dir().ok().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
        tracing_appender::non_blocking(appender)
    });

    match file {
        Some((writer, guard)) => {
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new("mamanhub_core=debug,mamanhub=debug"));
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(stderr_layer).init();
            None
        }
    }
}

fn token_store(config: &Config) -> Result<Arc<dyn TokenStore>> {
    Ok(match config.token_storage {
        TokenStorage::File => Arc::new(FileTokenStore::in_dir(&config.cache_dir()?)),
        TokenStorage::Keyring => Arc::new(KeyringTokenStore::new()),
    })
}

fn session_expired(event: &SessionExpired) {
    eprintln!(
        "Session expired ({}). Run `mamanhub login` to sign in again.",
        event.reason
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = Config::load()?;
    let _log_guard = init_tracing(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    info!(command = %command, base_url = %config.api_base_url, "Ma'man Hub CLI starting");

    let client = ApiClient::new(&config, token_store(&config)?)?
        .with_session_expired_handler(session_expired);
    let auth = AuthService::new(client.clone());

    match command.as_str() {
        "login" => login(&auth, &mut config, args.get(1).cloned()).await,
        "logout" => {
            auth.logout().await?;
            println!("Logged out.");
            Ok(())
        }
        "whoami" => {
            let user = auth.current_user().await?;
            println!(
                "{} <{}> - {}",
                user.full_name,
                user.email,
                user.role().display_name()
            );
            Ok(())
        }
        "forgot-password" => {
            let email = args.get(1).context("Missing email")?;
            auth.forgot_password(email).await?;
            println!("If an account exists for {}, a reset email is on its way.", email);
            Ok(())
        }
        "get" => {
            let path = args.get(1).context("Missing path")?;
            let response = client.send(ApiRequest::get(path.as_str())).await?;
            print_body(&response.text());
            Ok(())
        }
        "post" => {
            let path = args.get(1).context("Missing path")?;
            let mut request = ApiRequest::post(path.as_str());
            if let Some(raw) = args.get(2) {
                let body: serde_json::Value =
                    serde_json::from_str(raw).context("Request body is not valid JSON")?;
                request = request.json(&body)?;
            }
            let response = client.send(request).await?;
            print_body(&response.text());
            Ok(())
        }
        "cart" => cart(&config, &args[1..]),
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}

async fn login(auth: &AuthService, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", email))
        .context("Failed to read password")?;

    let response = auth
        .login(&LoginRequest {
            email: email.clone(),
            password,
        })
        .await?;

    if response.access_token.is_none() {
        bail!(
            "{}",
            response
                .message
                .unwrap_or_else(|| "Login did not return a session".to_string())
        );
    }

    config.last_email = Some(email.clone());
    config.save()?;

    match response.user {
        Some(user) => println!("Logged in as {} ({}).", user.full_name, user.role().display_name()),
        None => println!("Logged in as {}.", email),
    }
    Ok(())
}

fn cart(config: &Config, args: &[String]) -> Result<()> {
    let store = CartStore::new(&config.cache_dir()?)?;
    let action = args.first().map(String::as_str).unwrap_or("list");

    match action {
        "list" => {}
        "add" => {
            let raw = args.get(1).context("Missing course JSON")?;
            let item: CartItem = serde_json::from_str(raw).context("Invalid course JSON")?;
            let title = item.title.clone();
            if !store.update(|cart| cart.add_item(item))? {
                println!("{} is already in the cart.", title);
            }
        }
        "remove" => {
            let id = args.get(1).context("Missing course id")?;
            if !store.update(|cart| cart.remove_item(id))? {
                println!("Course {} is not in the cart.", id);
            }
        }
        "coupon" => {
            let code = args.get(1).context("Missing coupon code")?;
            if !store.update(|cart| cart.apply_coupon(code))? {
                bail!("Invalid coupon code: {}", code);
            }
        }
        "uncoupon" => store.update(|cart| cart.remove_coupon())?,
        "clear" => store.update(|cart| cart.clear())?,
        other => bail!("Unknown cart command: {}", other),
    }

    let cart = store.load()?;
    if cart.is_empty() {
        println!("Cart is empty.");
        return Ok(());
    }
    for item in &cart.items {
        println!("  {:<10} {:<40} {:>8.2}", item.id, item.title, item.price);
    }
    println!("  {:<51} {:>8.2}", "Subtotal", cart.subtotal());
    if let Some(code) = &cart.coupon_code {
        println!("  {:<51} {:>7.0}%", format!("Coupon {}", code), cart.discount * 100.0);
    }
    println!("  {:<51} {:>8.2}", "Total", cart.total());
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        bail!("No input given");
    }
    Ok(value)
}

/// Pretty-print JSON bodies, pass anything else through
fn print_body(body: &str) {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", body),
        },
        Err(_) => println!("{}", body),
    }
}
