//! askchat CLI: terminal client for a conversational assistant service

use askchat_engine::{
    strip_ids, Config, ConfigError, ControllerState, ConversationClient, ConversationSession,
    HttpConversationClient, SubmissionController,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Chat with an assistant service from the terminal
#[derive(Parser)]
#[command(name = "askchat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: .askchat/config.json)
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_path: Option<PathBuf>,

    /// Service base URL, overriding the config file
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Request timeout in seconds (0 waits indefinitely)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat TUI (default when no command specified)
    Tui,

    /// Send one message and print the reply
    Ask {
        /// Message to send
        message: String,

        /// Continue an existing session
        #[arg(long)]
        session: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default config file
    Init,
}

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "askchat=info";

fn main() {
    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => fail(&format!("Failed to get current directory: {e}")),
    };
    if let Some(Commands::Init) = cli.command {
        init_stderr_logging();
        cmd_init(&cwd, cli.config_path.as_deref());
        return;
    }

    let config = match resolve_config(&cli, &cwd, |key| std::env::var(key).ok()) {
        Ok(config) => config,
        Err(e) => fail(&format!("Failed to load config: {e}")),
    };

    match cli.command {
        None | Some(Commands::Tui) => {
            init_file_logging(config.log_file.as_deref());
            cmd_tui(&config);
        }
        Some(Commands::Ask {
            message,
            session,
            json,
        }) => {
            init_stderr_logging();
            cmd_ask(&config, &message, session, json);
        }
        Some(Commands::Config { json }) => {
            init_stderr_logging();
            cmd_config(&config, json);
        }
        Some(Commands::Init) => {}
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

/// Load the config file and apply environment and flag overrides, in that
/// order.
fn resolve_config(
    cli: &Cli,
    cwd: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let config = match &cli.config_path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path(cwd))?,
    };
    let mut config = config
        .with_env_lookup(env)
        .with_endpoint_override(cli.endpoint.clone());
    if let Some(timeout) = cli.timeout {
        config.timeout_seconds = timeout;
    }
    Ok(config)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log to a file while the TUI owns the terminal. Without a file nothing
/// is installed.
fn init_file_logging(path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {e}", path.display());
            return;
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn build_client(config: &Config) -> HttpConversationClient {
    match HttpConversationClient::from_config(config) {
        Ok(client) => client,
        Err(e) => fail(&e.to_string()),
    }
}

fn build_runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => fail(&format!("Failed to create tokio runtime: {e}")),
    }
}

fn cmd_tui(config: &Config) {
    let client: Arc<dyn ConversationClient> = Arc::new(build_client(config));
    let rt = build_runtime();
    if let Err(e) = rt.block_on(askchat_tui::run_tui(client, config)) {
        fail(&e.to_string());
    }
}

/// Outcome of a one-shot exchange.
#[derive(Debug)]
struct AskReply {
    message: String,
    session: ConversationSession,
}

async fn ask_once<C>(
    client: &C,
    config: &Config,
    message: &str,
    session: Option<String>,
) -> Result<AskReply, String>
where
    C: ConversationClient + ?Sized,
{
    let session = session.map(ConversationSession::from_id).unwrap_or_default();
    let mut controller = SubmissionController::with_session(session);

    match controller.submit(client, message).await {
        None => return Err("Message is empty".to_string()),
        Some(ControllerState::Error { message }) => return Err(message.clone()),
        Some(_) => {}
    }

    let mut reply = controller
        .transcript()
        .last()
        .map(|entry| entry.message.content.clone())
        .unwrap_or_default();
    if config.strip_product_ids {
        reply = strip_ids(&reply);
    }
    Ok(AskReply {
        message: reply,
        session: controller.session().clone(),
    })
}

fn cmd_ask(config: &Config, message: &str, session: Option<String>, json: bool) {
    let client = build_client(config);
    let rt = build_runtime();
    let reply = match rt.block_on(ask_once(&client, config, message, session)) {
        Ok(reply) => reply,
        Err(e) => fail(&e),
    };
    let session = reply.session.to_string();

    if json {
        println!(
            "{}",
            serde_json::json!({ "message": reply.message, "session": session })
        );
    } else {
        println!("{}", reply.message);
        if !session.is_empty() {
            eprintln!("session: {session}");
        }
    }
}

fn cmd_config(config: &Config, json: bool) {
    if json {
        match serde_json::to_string_pretty(config) {
            Ok(out) => println!("{out}"),
            Err(e) => fail(&e.to_string()),
        }
        return;
    }

    println!("endpoint:          {}", config.endpoint);
    println!("ask_path:          {}", config.ask_path);
    match HttpConversationClient::from_config(config) {
        Ok(client) => println!("exchange url:      {}", client.url()),
        Err(e) => println!("exchange url:      invalid ({e})"),
    }
    if config.timeout_seconds == 0 {
        println!("timeout:           none");
    } else {
        println!("timeout:           {}s", config.timeout_seconds);
    }
    println!("strip_product_ids: {}", config.strip_product_ids);
    match &config.log_file {
        Some(path) => println!("log_file:          {}", path.display()),
        None => println!("log_file:          (none)"),
    }
}

fn cmd_init(cwd: &Path, path: Option<&Path>) {
    let path = path.map_or_else(|| Config::default_path(cwd), Path::to_path_buf);
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return;
    }
    if let Err(e) = Config::default().save(&path) {
        fail(&format!("Failed to write config: {e}"));
    }
    println!("Created {}", path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use askchat_engine::{ExchangeError, ExchangeResponse};
    use async_trait::async_trait;
    use clap::CommandFactory;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    /// Client returning one canned outcome and recording the session it saw.
    struct CannedClient {
        outcome: Mutex<Option<Result<ExchangeResponse, ExchangeError>>>,
        seen_session: Mutex<Option<ConversationSession>>,
    }

    impl CannedClient {
        fn new(outcome: Result<ExchangeResponse, ExchangeError>) -> Self {
            Self {
                outcome: Mutex::new(Some(outcome)),
                seen_session: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ConversationClient for CannedClient {
        async fn exchange(
            &self,
            _message: &str,
            session: &ConversationSession,
        ) -> Result<ExchangeResponse, ExchangeError> {
            *self.seen_session.lock().unwrap() = Some(session.clone());
            self.outcome
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ExchangeError::MissingMessage))
        }
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("askchat").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_command_means_tui() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_ask() {
        let cli = parse(&["ask", "hello there", "--session", "abc123", "--json"]);
        match cli.command {
            Some(Commands::Ask {
                message,
                session,
                json,
            }) => {
                assert_eq!(message, "hello there");
                assert_eq!(session.as_deref(), Some("abc123"));
                assert!(json);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["config", "--endpoint", "http://example.test/", "--timeout", "5"]);
        assert_eq!(cli.endpoint.as_deref(), Some("http://example.test/"));
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn test_resolve_config_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config = resolve_config(&parse(&["--timeout", "0"]), dir.path(), no_env).unwrap();
        assert_eq!(config.ask_path, "ask");
        assert_eq!(config.timeout_seconds, 0);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_resolve_config_flag_beats_file() {
        let dir = TempDir::new().unwrap();
        let file = Config {
            endpoint: "http://from-file.test/".into(),
            timeout_seconds: 30,
            ..Config::default()
        };
        file.save(&Config::default_path(dir.path())).unwrap();

        let config = resolve_config(
            &parse(&["--endpoint", "http://from-flag.test/"]),
            dir.path(),
            no_env,
        )
        .unwrap();
        assert_eq!(config.endpoint, "http://from-flag.test/");
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_resolve_config_env_beats_file_and_flag_beats_env() {
        let dir = TempDir::new().unwrap();
        let file = Config {
            endpoint: "http://from-file.test/".into(),
            ..Config::default()
        };
        file.save(&Config::default_path(dir.path())).unwrap();
        let env = |key: &str| {
            (key == askchat_engine::config::ENDPOINT_ENV)
                .then(|| "http://from-env.test/".to_string())
        };

        let config = resolve_config(&parse(&[]), dir.path(), env).unwrap();
        assert_eq!(config.endpoint, "http://from-env.test/");

        let cli = parse(&["--endpoint", "http://from-flag.test/"]);
        let config = resolve_config(&cli, dir.path(), env).unwrap();
        assert_eq!(config.endpoint, "http://from-flag.test/");
    }

    #[test]
    fn test_resolve_config_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        let cli = parse(&["--config", missing.to_str().unwrap()]);
        assert!(matches!(
            resolve_config(&cli, dir.path(), no_env),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_init_writes_default_config() {
        let dir = TempDir::new().unwrap();
        cmd_init(dir.path(), None);

        let written = Config::load(&Config::default_path(dir.path())).unwrap();
        assert_eq!(written, Config::default());
    }

    #[tokio::test]
    async fn test_ask_once_returns_reply_and_session() {
        let client = CannedClient::new(Ok(ExchangeResponse {
            message: "Try the mug [OLJCESPC7Z].".into(),
            session: ConversationSession::from_id("s-2"),
        }));
        let config = Config {
            strip_product_ids: true,
            ..Config::default()
        };

        let reply = ask_once(&client, &config, "a mug?", Some("s-1".into()))
            .await
            .unwrap();
        assert_eq!(reply.message, "Try the mug.");
        assert_eq!(reply.session.as_str(), "s-2");
        let seen = client.seen_session.lock().unwrap().clone().unwrap();
        assert_eq!(seen.as_str(), "s-1");
    }

    #[tokio::test]
    async fn test_ask_once_reports_failures() {
        let client = CannedClient::new(Err(ExchangeError::Timeout(5)));
        let err = ask_once(&client, &Config::default(), "hello", None)
            .await
            .unwrap_err();
        assert_eq!(err, ExchangeError::Timeout(5).to_string());

        let err = ask_once(&client, &Config::default(), "   ", None)
            .await
            .unwrap_err();
        assert_eq!(err, "Message is empty");
    }
}
