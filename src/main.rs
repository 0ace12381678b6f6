use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use proposal_crew::cli::Args;
use proposal_crew::generator::outlet::{DiskOutlet, Outlet};
use proposal_crew::{EchoInvoker, InvocationError, PipelineError, launch, run_pipeline};

#[tokio::main]
async fn main() -> Result<()> {
    // .env 不存在时忽略
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    // 先按命令行参数初始化，读取配置文件后再决定是否切换到 debug
    let log_filter = init_logging(args.verbose);

    let dry_run = args.dry_run;
    let verbose_flag = args.verbose;
    let config = args.into_config()?;
    if config.verbose
        && !verbose_flag
        && let Err(e) = log_filter.reload(logging_filter(true))
    {
        tracing::warn!("⚠️ 无法切换日志级别: {}", e);
    }

    let topic = match config.topic.clone().filter(|t| !t.trim().is_empty()) {
        Some(topic) => topic,
        None => read_topic()?,
    };

    let outcome = if dry_run {
        run_pipeline(&config, &topic, &EchoInvoker)
            .await
            .map_err(anyhow::Error::from)
    } else {
        launch(&config, &topic).await
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            if is_auth_failure(&e) {
                eprintln!("💡 Please ensure you have a valid LLM API key (e.g. GEMINI_API_KEY) in .env file");
            }
            return Err(e);
        }
    };

    println!("\n\n=== {} ===", config.crew.banner());
    println!("{}", result);

    let saved = DiskOutlet::from_config(&config).save(&result).await?;
    println!("\nProposal saved to {}", saved.document.display());
    if let Some(history) = saved.history {
        println!("Task history saved to {}", history.display());
    }

    Ok(())
}

fn logging_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("proposal_crew=debug")
        } else {
            EnvFilter::new("proposal_crew=info")
        }
    })
}

fn init_logging(verbose: bool) -> reload::Handle<EnvFilter, Registry> {
    let (filter, handle) = reload::Layer::new(logging_filter(verbose));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time())
        .init();

    handle
}

fn read_topic() -> Result<String> {
    print!("Enter research topic: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read topic from stdin")?;
    Ok(line.trim().to_string())
}

fn is_auth_failure(error: &anyhow::Error) -> bool {
    if let Some(e) = error.downcast_ref::<PipelineError>() {
        return e.is_auth_failure();
    }
    matches!(
        error.downcast_ref::<InvocationError>(),
        Some(InvocationError::AuthFailure(_))
    )
}
