//! conductor — run a simulated engine kernel from a JSON registry.

use std::path::PathBuf;

use anyhow::Context;
use conductor_core::{KernelConfig, StaticRegistry};
use conductor_kernel::Kernel;
use conductor_sim::{SimOptions, DEFAULT_TICKS};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_help() {
    println!("conductor — engine orchestration kernel simulator");
    println!();
    println!("Usage: conductor <command>");
    println!();
    println!("Commands:");
    println!("  run <registry.json> [ticks]   Run the kernel for [ticks] rounds (default {DEFAULT_TICKS})");
    println!("  validate <registry.json>      Validate a registry file");
    println!("  help                          Show this help message");
    println!();
    println!("Environment:");
    println!("  CONDUCTOR_TOTAL_BUDGET, CONDUCTOR_HEADROOM_PERCENT,");
    println!("  CONDUCTOR_MAILBOX_CAPACITY, CONDUCTOR_SLOTS_PER_ROUND,");
    println!("  CONDUCTOR_SLOT_COST, RUST_LOG");
}

fn registry_arg(args: &[String]) -> PathBuf {
    match args.get(2) {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("Usage: conductor {} <registry.json>", args[1]);
            std::process::exit(1);
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("run") => {
            let path = registry_arg(&args);
            let ticks = match args.get(3) {
                Some(t) => t
                    .parse()
                    .with_context(|| format!("invalid tick count: {}", t))?,
                None => DEFAULT_TICKS,
            };

            let registry = StaticRegistry::load(&path)
                .with_context(|| format!("failed to load registry {}", path.display()))?;
            let config = KernelConfig::from_env();
            info!(
                "Running {} ticks over {} engines (budget={})",
                ticks,
                registry.engines.len(),
                config.total_budget
            );

            let mut kernel = Kernel::new(&registry, config)?;
            let report = conductor_sim::run(&mut kernel, &SimOptions::from_env(ticks))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some("validate") => {
            let path = registry_arg(&args);
            match StaticRegistry::load(&path) {
                Ok(registry) => {
                    println!(
                        "OK: {} engines, total weight {}",
                        registry.engines.len(),
                        registry.total_weight()
                    );
                }
                Err(e) => {
                    eprintln!("Invalid registry {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            }
        }
        Some("--help" | "-h" | "help") | None => print_help(),
        Some(other) => {
            eprintln!("Unknown command: {}. Use 'conductor help' for usage.", other);
            std::process::exit(1);
        }
    }

    Ok(())
}
