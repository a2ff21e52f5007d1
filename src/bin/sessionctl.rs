//!
//! sessionctl
//! ----------
//! Small command-line harness for the session core. Restores any persisted
//! session, then optionally signs in or registers against a running auth
//! service and prints the resulting state, so the full bootstrap → login →
//! persist round trip can be exercised outside of tests.

use std::env;
use std::sync::Arc;

use anyhow::Result;

use sessionkit::client::AuthClient;
use sessionkit::config::AuthConfig;
use sessionkit::session::{RegisterOutcome, RegisterRequest, SessionManager, SessionPersistence};
use sessionkit::store::{CookieFileBackend, MemoryBackend, StorageBackend};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--connect <url>] [--store <dir>] [--user <id> --password <p>]\n  {program} --register --email <e> --password <p> [--name <n>] [--connect <url>]\n  {program} --logout [--store <dir>]\n\nFlags:\n  --connect <url>      Auth service base URL (default: SESSIONKIT_BASE_URL or http://127.0.0.1:7878)\n  --store <dir>        Directory for the durable cookie store (default: .sessionkit)\n  --user <id>          Login identifier (email)\n  --password <p>       Login/registration secret\n  --register           Register instead of logging in\n  --email <e>          Registration email\n  --name <n>           Registration display name\n  --logout             Clear any persisted session and exit\n  -h, --help           Show this help\n\nWith no action flags, prints the session restored from the store (if any)."
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut connect: Option<String> = None;
    let mut store_dir = ".sessionkit".to_string();
    let mut user: Option<String> = None;
    let mut password: Option<String> = None;
    let mut email: Option<String> = None;
    let mut name: Option<String> = None;
    let mut register = false;
    let mut logout = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--connect" | "-c" => {
                i += 1;
                connect = args.get(i).cloned();
            }
            "--store" => {
                i += 1;
                if let Some(d) = args.get(i) {
                    store_dir = d.clone();
                }
            }
            "--user" => {
                i += 1;
                user = args.get(i).cloned();
            }
            "--password" => {
                i += 1;
                password = args.get(i).cloned();
            }
            "--email" => {
                i += 1;
                email = args.get(i).cloned();
            }
            "--name" => {
                i += 1;
                name = args.get(i).cloned();
            }
            "--register" => register = true,
            "--logout" => logout = true,
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            other => {
                eprintln!("unknown flag: {other}");
                print_usage(&program);
                std::process::exit(2);
            }
        }
        i += 1;
    }

    let cfg = match connect {
        Some(url) => AuthConfig::new(&url)?,
        None => AuthConfig::from_env()?,
    };
    let ttl = cfg.session_ttl;
    let client = AuthClient::new(cfg)?;
    let backends: Vec<Arc<dyn StorageBackend>> = vec![
        Arc::new(MemoryBackend::new()),
        Arc::new(CookieFileBackend::new(&store_dir)),
    ];
    let persistence = SessionPersistence::new(backends, ttl);
    let manager = Arc::new(SessionManager::new(client, persistence));

    manager.bootstrap();
    let restored = manager.current();
    if restored.authenticated() {
        let u = restored.user.as_ref().unwrap();
        println!(
            "restored session: user={} role_id={:?}",
            u.email.as_deref().unwrap_or("<unknown>"),
            u.role_id
        );
    } else {
        println!("no persisted session");
    }

    if logout {
        manager.logout();
        println!("session cleared");
        return Ok(());
    }

    if register {
        let (Some(email), Some(password)) = (email, password) else {
            eprintln!("--register needs --email and --password");
            std::process::exit(2);
        };
        let req = RegisterRequest { name, email, password, ..RegisterRequest::default() };
        match manager.register(&req).await {
            Ok(RegisterOutcome::Registered { message, redirect_to }) => {
                println!("registered: {message} (next: {redirect_to})");
            }
            Ok(RegisterOutcome::Authenticated { redirect_to }) => {
                println!("registered and signed in (next: {redirect_to})");
            }
            Err(e) => {
                eprintln!("registration failed: {}", e.user_message());
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    if let (Some(user), Some(password)) = (user, password) {
        match manager.login(&user, &password).await {
            Ok(ok) => {
                let st = manager.current();
                println!(
                    "signed in: user={} redirect={}",
                    st.user.as_ref().and_then(|u| u.email.as_deref()).unwrap_or("<unknown>"),
                    ok.redirect_to
                );
            }
            Err(e) => {
                eprintln!("login failed: {}", e.user_message());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
