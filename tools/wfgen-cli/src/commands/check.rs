//! Check external tool availability.

use std::process::ExitCode;

use wfgen_common::config::{RenderConfig, BROWSER_PATH_ENV};
use wfgen_toolchain::capability::{capability_report, detect, print_capability_report};
use wfgen_toolchain::runner::ProcessRunner;

pub async fn run(config: RenderConfig) -> anyhow::Result<ExitCode> {
    println!("wfgen System Check");
    println!("{}", "=".repeat(50));

    match &config.browser_executable {
        Some(path) => println!("[OK] Browser override ({BROWSER_PATH_ENV}): {}", path.display()),
        None => println!("[INFO] Browser: renderer default ({BROWSER_PATH_ENV} not set)"),
    }

    let capabilities = detect(&ProcessRunner::new(), &config).await;
    let rows = capability_report(&capabilities, &config);
    println!();
    print_capability_report(&rows);

    let all_required_ok = rows.iter().filter(|c| c.required).all(|c| c.available);

    println!();
    if all_required_ok {
        println!("All required tools are available. wfgen is ready.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Some required tools are missing. See above for fixes.");
        Ok(ExitCode::FAILURE)
    }
}
