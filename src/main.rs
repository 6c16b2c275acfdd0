use anyhow::Context;
use cardio_risk::app::{self, batch, report};
use cardio_risk::config::Command;
use cardio_risk::utils::error::ErrorSeverity;
use cardio_risk::utils::{logger, validation::Validate};
use cardio_risk::{AppConfig, CliConfig, ModelGateway, RiskAssessmentService, RiskError};
use clap::Parser;

fn main() {
    let cli = CliConfig::parse();

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => report_failure(&e),
    };

    std::process::exit(exit_code);
}

fn run(cli: &CliConfig) -> anyhow::Result<i32> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config file '{}'", path.display()))?,
        None => AppConfig::default(),
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    // 初始化日誌
    logger::init_logger(config.logging.format, cli.verbose, config.logging.level.as_deref());
    tracing::info!("🚀 Starting cardio-risk");
    tracing::debug!("Effective config: {:?}", config);

    let format = config.output.format;

    if let Command::Validate { record } = &cli.command {
        let record = app::read_record(record)?;
        let errors = RiskAssessmentService::validate(&record);
        println!("{}", report::render_validation(&errors, format)?);
        return Ok(if errors.is_empty() { 0 } else { exit_code(ErrorSeverity::Medium) });
    }

    // 模型只在需要評估時載入
    let gateway = ModelGateway::new().with_contract(config.feature_contract());
    let artifact_path = config.artifact_path();
    let service = RiskAssessmentService::from_gateway(&gateway, &artifact_path)?
        .with_policy(config.decision_policy()?);

    match &cli.command {
        Command::Assess { record } => {
            let record = app::read_record(record)?;
            match service.assess(&record) {
                Ok(decision) => {
                    let report = report::AssessmentReport::new(&decision, service.handle());
                    println!("{}", report.render(format)?);
                    Ok(0)
                }
                Err(RiskError::Validation(e)) => {
                    println!("{}", report::render_validation(&e.errors, format)?);
                    Ok(exit_code(ErrorSeverity::Medium))
                }
                Err(e) => Err(e.into()),
            }
        }
        Command::Batch { input, output } => {
            let summary = batch::assess_csv_file(&service, input, output)
                .with_context(|| format!("Batch assessment of '{}' failed", input.display()))?;
            println!(
                "✅ Assessed {} record(s): {} elevated, {} low, {} rejected",
                summary.total, summary.elevated, summary.low, summary.rejected
            );
            println!("📁 Results saved to: {}", output.display());
            Ok(0)
        }
        Command::Validate { .. } => Ok(0),
    }
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Medium => 2, // 可修正後重試
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3, // 無法提供服務
    }
}

fn report_failure(error: &anyhow::Error) -> i32 {
    match error.chain().find_map(|e| e.downcast_ref::<RiskError>()) {
        Some(e) => {
            tracing::error!(
                "❌ cardio-risk failed: {} (Category: {:?}, Severity: {:?})",
                error,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            exit_code(e.severity())
        }
        None => {
            tracing::error!("❌ cardio-risk failed: {:#}", error);
            eprintln!("❌ {:#}", error);
            1
        }
    }
}
