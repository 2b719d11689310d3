// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::time::Instant;

use anyhow::Context;
use etlflow::config::load_and_validate_config;
use etlflow::errors::PipelineError;
use etlflow::nodes::NodeFactory;
use tracing_subscriber::EnvFilter;

/// Install the log subscriber. `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <process.yaml|process.toml> [more ...]", args[0]);
        eprintln!("Example: {} pipelines/customers.yaml", args[0]);
        std::process::exit(1);
    }

    let mut failed = 0;
    for (i, config_file) in args[1..].iter().enumerate() {
        if i > 0 {
            println!("\n{}", "─".repeat(80));
        }
        if let Err(e) = run_single_config(config_file).await {
            failed += 1;
            eprintln!("❌ Failed to execute {}: {:#}", config_file, e);
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} process(es) failed", failed, args.len() - 1);
    }
    Ok(())
}

async fn run_single_config(config_file: &str) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let config = load_and_validate_config(config_file)
        .with_context(|| format!("loading {}", config_file))?;
    let process = NodeFactory::build_process(&config)?;

    println!("📋 Configuration: {}", config_file);
    println!("🔧 Process: {}", config.name);
    println!("🧩 Nodes: {}", process.node_count());
    println!("🔗 Attachments: {}", process.attachment_count());
    println!(
        "🛡️  Cancel on failure: {}",
        if config.cancel_on_failure { "yes" } else { "no" }
    );

    match process.execute().await {
        Ok(report) => {
            println!("\n📊 Execution Report:");
            println!("{}", serde_json::to_string_pretty(&report)?);
            println!("\n⏱️  Total Time: {:?}", start_time.elapsed());
            Ok(())
        }
        Err(PipelineError::Execution(error)) => {
            println!("\n💥 Node failures:");
            for failure in &error.failures {
                println!("   • {}", failure);
            }
            Err(PipelineError::Execution(error).into())
        }
        Err(e) => Err(e.into()),
    }
}
