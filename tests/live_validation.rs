use aio_checker::config::{Settings, BEARER_CHECK_URL, IP_ECHO_URL};
use aio_checker::probe::{CheckOutcome, ProbeEngine};
use anyhow::Result;
use dotenvy::dotenv;
use std::path::Path;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::test]
#[ignore = "Requires real credentials"]
async fn test_credentials_validation() -> Result<()> {
    load_dotenv();
    init_tracing();

    info!("Starting integration test for credentials validation...");
    let settings = Settings::new()?;

    validate_token_shape(&settings.bot_token);
    validate_gate_configuration(&settings);
    validate_bot_account(&settings).await?;

    info!("Credentials validation test passed successfully.");
    Ok(())
}

#[tokio::test]
#[ignore = "Requires network access"]
async fn test_probe_endpoints_reachable() -> Result<()> {
    init_tracing();
    let engine = ProbeEngine::new();

    let ip_report = engine.check_api(IP_ECHO_URL).await;
    info!("IP echo probe ({}): {}", IP_ECHO_URL, ip_report.render());
    assert_eq!(
        ip_report.outcome,
        CheckOutcome::UrlValid,
        "IP echo endpoint should answer 200 with a bare address"
    );

    // The check endpoint accepts any bearer token; the point here is that it
    // answers with something the engine can classify.
    let bearer_report = engine.check_api("connectivity-check").await;
    info!(
        "Bearer endpoint probe ({}): {}",
        BEARER_CHECK_URL,
        bearer_report.render()
    );
    assert!(
        !matches!(bearer_report.outcome, CheckOutcome::TransportError(_)),
        "Bearer check endpoint unreachable: {:?}",
        bearer_report.outcome
    );

    Ok(())
}

fn load_dotenv() {
    let env_path = Path::new("../.env");
    if env_path.exists() {
        let _ = dotenvy::from_path(env_path);
    } else {
        dotenv().ok();
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn validate_token_shape(token: &str) {
    assert!(
        !token.is_empty(),
        "BOT_TOKEN is missing (check .env file or loading logic)"
    );

    let (id_part, secret_part) = token
        .split_once(':')
        .expect("BOT_TOKEN must look like <bot id>:<secret>");
    assert!(
        id_part.chars().all(|c| c.is_ascii_digit()),
        "BOT_TOKEN bot id part must be numeric"
    );
    assert!(!secret_part.is_empty(), "BOT_TOKEN secret part is empty");
}

fn validate_gate_configuration(settings: &Settings) {
    let channel = settings.channel_username();
    assert!(
        channel.len() > 1 && channel.starts_with('@'),
        "PUBLIC_CHANNEL must normalize to an @username, got {channel:?}"
    );
    info!("Gate channel: {}", channel);
    info!("Join URL: {}", settings.channel_join_url());

    if settings.admins().is_empty() {
        info!("No ADMINS configured; the admin console will refuse everyone.");
    } else {
        info!("{} admin(s) configured.", settings.admins().len());
    }
}

async fn validate_bot_account(settings: &Settings) -> Result<()> {
    info!("Validating BOT_TOKEN against the Telegram API...");
    let bot = Bot::new(settings.bot_token.clone());
    let me = bot.get_me().await?;
    info!("Token accepted, bot account: @{}", me.username());
    Ok(())
}
