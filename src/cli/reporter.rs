// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::config::ReconConfig;
use crate::geometry::MeshStats;
use crate::pipeline::PipelineReport;
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Print the effective run parameters
    pub fn report_config(config: &ReconConfig) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Input:".bold(), config.input.display().to_string().cyan());
        println!("{}", "━".repeat(80).bright_black());

        let range = if config.count == 0 {
            format!("from {} to end", config.start)
        } else {
            format!("from {}, {} slices", config.start, config.count)
        };
        Self::print_field("Slices", &range);
        Self::print_field(
            "Resolution",
            &format!("x{} ({})", config.resolution, config.resize_filter),
        );
        Self::print_field("Iso level", &config.iso_level.to_string());
        Self::print_field("Padding", if config.padding { "on" } else { "off" });
        if let Some(threads) = config.threads {
            Self::print_field("Threads", &threads.to_string());
        }
        Self::print_field("Output", &config.output.display().to_string());
    }

    /// Report a finished reconstruction
    pub fn report_reconstruction(report: &PipelineReport) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!(
            "{} {}",
            "Reconstructed:".bold(),
            report.output.display().to_string().cyan()
        );
        println!("{}", "━".repeat(80).bright_black());

        println!(
            "  {} {} ({} .. {})",
            "Slices:".bright_black(),
            report.slice_count.to_string().cyan(),
            file_name(&report.first_slice),
            file_name(&report.last_slice)
        );
        println!(
            "  {} {}x{}",
            "Slice size:".bright_black(),
            report.slice_dims.0,
            report.slice_dims.1
        );
        println!(
            "  {} {} x {} x {}",
            "Volume:".bright_black(),
            report.volume_dims[0],
            report.volume_dims[1],
            report.volume_dims[2]
        );
        println!(
            "  {} {}",
            "Vertices:".bright_black(),
            report.vertex_count.to_string().cyan()
        );
        println!(
            "  {} {}",
            "Triangles:".bright_black(),
            report.triangle_count.to_string().cyan()
        );

        println!("\n{}", "Performance:".bold());
        let timings = &report.timings;
        println!(
            "  {} {:>8} | {} {:>8} | {} {:>8} | {} {:>8}",
            "Load:".bright_black(),
            Self::format_duration(timings.load).yellow(),
            "Volume:".bright_black(),
            Self::format_duration(timings.build).yellow(),
            "Extract:".bright_black(),
            Self::format_duration(timings.extract).yellow(),
            "Export:".bright_black(),
            Self::format_duration(timings.export).yellow()
        );
        println!(
            "  {} {}",
            "Total:".bright_black(),
            Self::format_duration(timings.total()).cyan()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report statistics of an existing mesh
    pub fn report_stats(file: &str, stats: &MeshStats) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Mesh:".bold(), file.cyan());
        println!("{}", "━".repeat(80).bright_black());

        if stats.is_watertight && stats.inconsistent_edges == 0 {
            println!("{} {}", "✅".green(), "Closed, consistently oriented".green().bold());
        } else {
            println!("{} {}", "⚠️ ".yellow(), "Open or inconsistently oriented".yellow().bold());
        }

        println!("\n{}", "Topology:".bold());
        Self::print_field("Vertices", &stats.vertex_count.to_string());
        Self::print_field("Triangles", &stats.triangle_count.to_string());
        Self::print_field("Edges", &stats.edge_count.to_string());
        Self::print_count("Boundary edges", stats.boundary_edges);
        Self::print_count("Non-manifold edges", stats.non_manifold_edges);
        Self::print_count("Flipped edges", stats.inconsistent_edges);
        Self::print_field("Euler", &stats.euler_characteristic.to_string());
        if let Some(genus) = stats.genus() {
            Self::print_field("Genus", &genus.to_string());
        }

        println!("\n{}", "Geometry:".bold());
        Self::print_field("Surface area", &format!("{:.2}", stats.surface_area));
        Self::print_field("Volume", &format!("{:.2}", stats.signed_volume));
        if !stats.bbox.is_empty() {
            let size = stats.bbox.size();
            Self::print_field(
                "Extent",
                &format!("{:.2} x {:.2} x {:.2}", size.x, size.y, size.z),
            );
        }
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    fn print_field(name: &str, value: &str) {
        println!("  {} {}", format!("{}:", name).bright_black(), value.cyan());
    }

    /// Zero is good news, anything else is highlighted
    fn print_count(name: &str, count: usize) {
        let value = if count == 0 {
            count.to_string().green()
        } else {
            count.to_string().red()
        };
        println!("  {} {}", format!("{}:", name).bright_black(), value);
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_duration() {
        assert_eq!(
            Reporter::format_duration(Duration::from_micros(500)),
            "500µs"
        );
        assert_eq!(
            Reporter::format_duration(Duration::from_millis(5)),
            "5.00ms"
        );
        assert_eq!(Reporter::format_duration(Duration::from_secs(2)), "2.00s");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(&PathBuf::from("scan/slice_007.png")), "slice_007.png");
        assert_eq!(file_name(&PathBuf::from("/")), "/");
    }
}
