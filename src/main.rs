use aio_checker::bot;
use aio_checker::bot::handlers::{message_user, Command};
use aio_checker::bot::state::{CheckMode, State};
use aio_checker::config::{Settings, RESULT_REGISTRY_CAPACITY, RESULT_TOKEN_TTL_SECS};
use aio_checker::gate::AccessGate;
use aio_checker::probe::ProbeEngine;
use aio_checker::registry::ResultRegistry;
use dotenvy::dotenv;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::dispatching::UpdateHandler;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
struct RedactionPatterns {
    token1: Regex,
    token2: Regex,
    token3: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token1: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token2: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token3: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .token1
            .replace_all(&output, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        output = self
            .token2
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .token3
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // We return the original buffer length to satisfy the contract,
        // even if the redacted string length differs.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    // Setup logging with redaction
    init_logging(patterns);

    info!("Starting AIO Checker Bot...");

    // Load settings
    let settings = init_settings();

    // Initialize the access gate, probe engine, and result registry
    let gate = init_gate(&settings);
    let engine = Arc::new(ProbeEngine::new());
    info!("Probe engine initialized.");
    let registry = init_registry();

    // Initialize Bot
    let bot = Bot::new(settings.bot_token.clone());

    // A leftover webhook blocks polling
    clear_webhook(&bot).await;

    // Initialize bot state
    let bot_state = init_bot_state();

    // Setup handlers
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![settings, gate, engine, registry, bot_state])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("Dispatcher error"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_gate(settings: &Settings) -> Arc<AccessGate> {
    let admins = settings.admins();
    if admins.is_empty() {
        warn!("No admin IDs configured, the admin console will refuse everyone.");
    }
    let gate = AccessGate::new(admins, settings.channel_username());
    info!(
        "Access gate initialized ({} admin(s), gate channel {}).",
        gate.admin_count(),
        settings.channel_username()
    );
    Arc::new(gate)
}

fn init_registry() -> Arc<ResultRegistry> {
    info!(
        "Initializing result registry (ttl: {}s, capacity: {})",
        RESULT_TOKEN_TTL_SECS, RESULT_REGISTRY_CAPACITY
    );
    Arc::new(ResultRegistry::new())
}

fn init_bot_state() -> Arc<InMemStorage<State>> {
    InMemStorage::<State>::new()
}

async fn clear_webhook(bot: &Bot) {
    if let Err(e) = bot.delete_webhook().drop_pending_updates(true).await {
        warn!("Failed to delete webhook: {e} (continuing anyway)");
    } else {
        info!("Webhook removed. Starting polling...");
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(
            Update::filter_callback_query()
                .filter_async(|q: CallbackQuery, gate: Arc<AccessGate>| async move {
                    !gate.is_banned(q.from.id).await
                })
                .enter_dialogue::<CallbackQuery, InMemStorage<State>, State>()
                .endpoint(handle_callback_update),
        )
        .branch(
            Update::filter_message()
                .filter_async(|msg: Message, gate: Arc<AccessGate>| async move {
                    match message_user(&msg) {
                        Some(user) => !gate.is_banned(user).await,
                        None => false,
                    }
                })
                .enter_dialogue::<Message, InMemStorage<State>, State>()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command_update),
                )
                .branch(
                    dptree::case![State::AwaitingTarget(mode)]
                        .branch(
                            dptree::filter(|msg: Message| msg.document().is_some())
                                .endpoint(handle_document_update),
                        )
                        .branch(
                            dptree::filter(|msg: Message| msg.text().is_some())
                                .endpoint(handle_target_text_update),
                        ),
                )
                .branch(dptree::case![State::AwaitingBroadcast].endpoint(handle_broadcast_update))
                .branch(dptree::case![State::AwaitingBan].endpoint(handle_ban_update))
                .branch(dptree::case![State::AwaitingUnban].endpoint(handle_unban_update)),
        )
}

async fn handle_command_update(
    bot: Bot,
    msg: Message,
    cmd: Command,
    settings: Arc<Settings>,
    gate: Arc<AccessGate>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => bot::handlers::start(bot, msg, settings, gate).await,
        Command::Api => bot::handlers::api_menu(bot, msg, settings, gate).await,
        Command::Proxy => bot::handlers::proxy_menu(bot, msg, settings, gate).await,
        Command::Admin => bot::admin::panel(bot, msg, gate).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_target_text_update(
    bot: Bot,
    msg: Message,
    dialogue: Dialogue<State, InMemStorage<State>>,
    mode: CheckMode,
    gate: Arc<AccessGate>,
    engine: Arc<ProbeEngine>,
    registry: Arc<ResultRegistry>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) =
        bot::handlers::handle_target_text(bot, msg, dialogue, mode, gate, engine, registry).await
    {
        error!("Target text handler error: {}", e);
    }
    respond(())
}

async fn handle_document_update(
    bot: Bot,
    msg: Message,
    dialogue: Dialogue<State, InMemStorage<State>>,
    mode: CheckMode,
    gate: Arc<AccessGate>,
    engine: Arc<ProbeEngine>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::handle_document(bot, msg, dialogue, mode, gate, engine).await {
        error!("Document handler error: {}", e);
    }
    respond(())
}

async fn handle_broadcast_update(
    bot: Bot,
    msg: Message,
    dialogue: Dialogue<State, InMemStorage<State>>,
    gate: Arc<AccessGate>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::admin::capture_broadcast(bot, msg, dialogue, gate).await {
        error!("Broadcast handler error: {}", e);
    }
    respond(())
}

async fn handle_ban_update(
    bot: Bot,
    msg: Message,
    dialogue: Dialogue<State, InMemStorage<State>>,
    gate: Arc<AccessGate>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::admin::capture_ban(bot, msg, dialogue, gate).await {
        error!("Ban handler error: {}", e);
    }
    respond(())
}

async fn handle_unban_update(
    bot: Bot,
    msg: Message,
    dialogue: Dialogue<State, InMemStorage<State>>,
    gate: Arc<AccessGate>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::admin::capture_unban(bot, msg, dialogue, gate).await {
        error!("Unban handler error: {}", e);
    }
    respond(())
}

async fn handle_callback_update(
    bot: Bot,
    q: CallbackQuery,
    dialogue: Dialogue<State, InMemStorage<State>>,
    gate: Arc<AccessGate>,
    engine: Arc<ProbeEngine>,
    registry: Arc<ResultRegistry>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) =
        bot::handlers::handle_callback(bot, q, dialogue, gate, engine, registry).await
    {
        error!("Callback handler error: {}", e);
    }
    respond(())
}
