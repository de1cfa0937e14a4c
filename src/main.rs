use std::sync::Arc;

use lead_funnel::config::{DispatchConfig, ServerConfig, VerifyConfig};
use lead_funnel::dispatch::LeadDispatcher;
use lead_funnel::error::Result;
use lead_funnel::otp::{OtpGateway, OtpService, TwilioVerify};
use lead_funnel::quiz::{QuizEngine, SessionStore, spawn_expiry_task};
use lead_funnel::server::build_router;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let verify_config = VerifyConfig::from_env().inspect_err(|_| {
        eprintln!("  export TWILIO_ACCOUNT_SID=AC...");
        eprintln!("  export TWILIO_AUTH_TOKEN=...");
        eprintln!("  export TWILIO_VERIFY_SERVICE_SID=VA...");
    })?;
    let dispatch_config = DispatchConfig::from_env().inspect_err(|_| {
        eprintln!("  export LEAD_PRIMARY_WEBHOOK_URL=https://...");
    })?;
    let server_config = ServerConfig::from_env()?;

    eprintln!("Lead Funnel v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Verify API: {}", verify_config.base_url);
    eprintln!("   Primary webhook: {}", dispatch_config.primary_url);
    match &dispatch_config.backup_url {
        Some(url) => eprintln!("   Backup webhook: {url}"),
        None => eprintln!("   Backup webhook: disabled"),
    }
    eprintln!(
        "   Sessions expire after {} min idle",
        server_config.session_idle_timeout.as_secs() / 60
    );
    eprintln!("   OTP API: http://0.0.0.0:{}/api/send-otp", server_config.port);
    eprintln!("   Quiz API: http://0.0.0.0:{}/api/quiz\n", server_config.port);

    // ── OTP gateway ─────────────────────────────────────────────────────
    let provider = Arc::new(TwilioVerify::new(verify_config));
    let otp: Arc<dyn OtpService> = Arc::new(OtpGateway::new(provider));

    // ── Quiz ────────────────────────────────────────────────────────────
    let dispatcher = Arc::new(LeadDispatcher::from_config(&dispatch_config));
    let store = SessionStore::new(server_config.session_idle_timeout);
    let _expiry_handle = spawn_expiry_task(Arc::clone(&store));
    let engine = Arc::new(QuizEngine::new(store, Arc::clone(&otp), dispatcher));

    let app = build_router(otp, engine, &server_config);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", server_config.port)).await?;
    tracing::info!(port = server_config.port, "Lead funnel server started");
    axum::serve(listener, app).await?;

    Ok(())
}
