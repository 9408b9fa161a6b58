//! Display formatting for CLI output

use console::style;
use std::path::Path;

use funpack_engine::PackageOutcome;

use crate::util::{format_size, shell_quote};

/// Print what a package run uploaded and wrote
pub fn print_outcome(outcome: &PackageOutcome) {
    if outcome.uploaded.is_empty() {
        println!("  {} nothing to upload", style("Skipped").dim());
    }
    for key in &outcome.uploaded {
        println!(
            "  {} oss://{}/{}",
            style("Uploaded").green().bold(),
            outcome.bucket,
            key
        );
    }
    if outcome.wait_count > 0 {
        println!(
            "  {} {} service(s) copy data onto NAS at deploy time",
            style("NAS").cyan(),
            outcome.wait_count
        );
    }

    let size = std::fs::metadata(&outcome.output_path)
        .map(|m| format_size(m.len()))
        .unwrap_or_default();
    println!();
    println!("{}", style("Package success").green().bold());
    println!(
        "  {} {} {}",
        style("Template").dim(),
        outcome.output_path.display(),
        style(size).dim()
    );
    print_tips(&outcome.output_path);
}

/// Next-step hints naming the packaged template
pub fn print_tips(output_path: &Path) {
    let path = shell_quote(&output_path.display().to_string());
    println!();
    println!("{}", style("Tips for next step").bold());
    println!(
        "  {} aliyun ros CreateStack --StackName <name> --TemplateBody \"$(cat {})\"",
        style("Deploy:").dim(),
        path
    );
}
