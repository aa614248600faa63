//! Report rendering: console summary and markdown document.

use crate::report::{ExampleReport, RunSummary};
use chrono::Local;
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

/// Print the per-model summary table to stdout.
pub fn print_console_summary(summary: &RunSummary) {
    let total = summary.total_examples;

    println!();
    println!("{}", "=".repeat(80));
    println!("BENCHMARK RESULTS (n={})", total);
    println!("{}", "=".repeat(80));
    println!(
        "{:<30} | {:<10} | {:<8} | {:<10} | {:<10}",
        "Model", "EM", "Mean F1", "Mean Time", "Mean Calls"
    );
    println!("{}", "-".repeat(80));

    for aggregate in &summary.aggregates {
        let mode = if aggregate.isolated { "isolated" } else { "shared" };
        println!(
            "{:<30} | {:>3}/{:<3} ({:>4.0}%) | {:.3}   | {:>7.2}s   | {:.1}",
            format!("{} ({})", aggregate.model, mode),
            aggregate.exact_matches,
            total,
            aggregate.exact_match_rate * 100.0,
            aggregate.mean_f1,
            aggregate.mean_latency_secs,
            aggregate.mean_sub_calls,
        );
    }

    println!("{}", "=".repeat(80));
}

/// Render the full markdown report.
pub fn render_markdown(reports: &[ExampleReport], summary: &RunSummary, run_id: &str) -> String {
    let total = summary.total_examples;
    let mut out = String::new();

    let _ = writeln!(out, "# Benchmark Report: {}\n", run_id);
    let _ = writeln!(
        out,
        "**Generated:** {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "**Total Examples:** {}\n", total);
    let _ = writeln!(out, "---\n");

    // Overall results
    let _ = writeln!(out, "## Overall Results\n");
    let _ = writeln!(
        out,
        "| Model | EM | EM % | Mean F1 | Mean Latency (s) | Mean Calls | Mean Cost ($) | Errors |"
    );
    let _ = writeln!(
        out,
        "|-------|----|------|---------|------------------|------------|---------------|--------|"
    );
    for a in &summary.aggregates {
        let _ = writeln!(
            out,
            "| {} | {}/{} | {:.1}% | {:.3} | {:.2} | {:.1} | {:.4} | {} |",
            a.model,
            a.exact_matches,
            total,
            a.exact_match_rate * 100.0,
            a.mean_f1,
            a.mean_latency_secs,
            a.mean_sub_calls,
            a.mean_cost_usd,
            a.errors,
        );
    }
    let _ = writeln!(out, "\n---\n");

    // Head-to-head
    let _ = writeln!(out, "## Head-to-Head vs Baseline ({})\n", summary.baseline);
    let _ = writeln!(out, "| Model | Wins | Losses | Ties | Win Rate |");
    let _ = writeln!(out, "|-------|------|--------|------|----------|");
    for h in &summary.head_to_head {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {:.1}% |",
            h.model,
            h.wins,
            h.losses,
            h.ties,
            h.win_rate * 100.0
        );
    }
    let _ = writeln!(out, "\n---\n");

    // Key insights
    let _ = writeln!(out, "## Key Insights\n");
    if let Some(best) = summary
        .aggregates
        .iter()
        .max_by(|a, b| a.mean_f1.total_cmp(&b.mean_f1))
    {
        let _ = writeln!(
            out,
            "- **Best F1 Score:** {} ({:.3})",
            best.model, best.mean_f1
        );
    }
    if let Some(fastest) = summary
        .aggregates
        .iter()
        .min_by(|a, b| a.mean_latency_secs.total_cmp(&b.mean_latency_secs))
    {
        let _ = writeln!(
            out,
            "- **Fastest:** {} ({:.2}s avg)",
            fastest.model, fastest.mean_latency_secs
        );
    }
    if let Some(efficient) = summary
        .aggregates
        .iter()
        .min_by(|a, b| a.mean_sub_calls.total_cmp(&b.mean_sub_calls))
    {
        let _ = writeln!(
            out,
            "- **Most Efficient (Fewest Calls):** {} ({:.1} calls avg)",
            efficient.model, efficient.mean_sub_calls
        );
    }
    let _ = writeln!(out, "\n---\n");

    // Per-example comparisons
    let _ = writeln!(out, "## Sample Comparisons (All {} Examples)\n", reports.len());
    for (i, report) in reports.iter().enumerate() {
        let _ = writeln!(out, "### Example {}\n", i + 1);
        let _ = writeln!(out, "**Question:** {}\n", report.question);
        let _ = writeln!(out, "**Gold Answer:** `{}`\n", report.gold_answer);
        let _ = writeln!(out, "| Model | Answer | F1 | EM | Time | Calls |");
        let _ = writeln!(out, "|-------|--------|----|----|------|-------|");

        for (model, cell) in &report.models {
            let _ = writeln!(
                out,
                "| {} | {} | {:.2} | {} | {:.1}s | {} |",
                model,
                preview(&cell.result.answer, 80),
                cell.f1,
                if cell.exact_match { "yes" } else { "no" },
                cell.result.latency.as_secs_f64(),
                cell.result.sub_calls,
            );
        }

        if let Some((winner, _)) = report
            .models
            .iter()
            .max_by(|(_, a), (_, b)| a.f1.total_cmp(&b.f1))
        {
            let _ = writeln!(out, "\n**Winner:** {}\n", winner);
        }
        let _ = writeln!(out, "---\n");
    }

    out
}

/// Write the markdown report next to the result artifacts.
pub fn write_markdown_report(
    dir: &Path,
    reports: &[ExampleReport],
    summary: &RunSummary,
    run_id: &str,
) -> io::Result<PathBuf> {
    let path = dir.join(format!("report_{}.md", run_id));
    std::fs::write(&path, render_markdown(reports, summary, run_id))?;
    Ok(path)
}

/// First `max_chars` characters of an answer, ellipsized, with table-breaking
/// characters flattened.
fn preview(answer: &str, max_chars: usize) -> String {
    let flat: String = answer
        .chars()
        .map(|c| if c == '\n' || c == '|' { ' ' } else { c })
        .collect();
    if flat.chars().count() > max_chars {
        let truncated: String = flat.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        flat
    }
}
