use clap::Parser;
use gradebook_client::app::commands;
use gradebook_client::utils::error::ErrorSeverity;
use gradebook_client::utils::logger;
use gradebook_client::{
    App, CliConfig, Command, FileSessionStore, GradebookError, HttpGradingApi, LogFormat, Session,
    Shell,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    };

    match settings.log_format {
        LogFormat::Json => logger::init_json_logger(cli.verbose, settings.log_level.as_deref()),
        LogFormat::Text => logger::init_cli_logger(cli.verbose, settings.log_level.as_deref()),
    }
    tracing::debug!("Settings: {:?}", settings);

    if let Err(e) = run(&cli, &settings).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(exit_code(&e));
    }
}

async fn run(
    cli: &CliConfig,
    settings: &gradebook_client::ClientSettings,
) -> gradebook_client::Result<()> {
    let store = Arc::new(FileSessionStore::new(&settings.token_path));
    let api = Arc::new(HttpGradingApi::new(
        settings.base_url.clone(),
        settings.timeout(),
        store.clone(),
    )?);
    let session = Session::new(store);
    tracing::info!("🌐 Backend: {}", api.base_url());

    match cli.command.as_ref().unwrap_or(&Command::Shell) {
        Command::Shell => {
            let app = App::new(api, session);
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            Shell::new(app, input, tokio::io::stdout()).run().await?;
            Ok(())
        }
        command => {
            let output = commands::execute(command, api.as_ref(), &session).await?;
            println!("{}", output.trim_end());
            Ok(())
        }
    }
}

fn exit_code(e: &GradebookError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 1,      // 輸入錯誤
        ErrorSeverity::Medium => 2,   // 可重試
        ErrorSeverity::High => 3,     // 登入或設定問題
        ErrorSeverity::Critical => 4, // 系統錯誤
    }
}
