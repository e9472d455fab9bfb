//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use super::formatter::kind_name;
use crate::progress::humanize_bytes;
use anyhow::Result;
use console::Term;
use console::style;
use sitedrop_core::DeployError;
use sitedrop_core::Deployment;
use sitedrop_core::extraction::ArchivePlan;
use sitedrop_core::security::Verdict;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_deployment(&self, deployment: &Deployment) -> Result<()> {
        if self.quiet {
            // Quiet mode prints only the URL.
            self.line(&deployment.public_url);
            return Ok(());
        }

        let report = &deployment.report;
        if self.use_colors {
            self.line(&format!(
                "{} Published {}",
                style("✓").green().bold(),
                style(&deployment.public_url).cyan()
            ));
        } else {
            self.line(&format!("Published {}", deployment.public_url));
        }

        self.line(&format!("  Tenant:      {}", deployment.tenant));
        self.line(&format!("  Files:       {}", report.files_extracted));
        self.line(&format!("  Directories: {}", report.directories_created));
        self.line(&format!("  Total size:  {}", humanize_bytes(report.bytes_written)));
        if report.files_skipped() > 0 {
            self.line(&format!("  Skipped:     {}", report.files_skipped()));
        }

        if self.verbose {
            self.line(&format!("  Location:    {}", deployment.target.display()));
            self.line(&format!("  Flattened:   {} level(s)", deployment.flatten_levels));
            self.line(&format!("  Duration:    {:?}", deployment.duration));
            for (path, reason) in &report.skipped {
                self.line(&format!("    skipped {} ({reason})", path.display()));
            }
        }

        Ok(())
    }

    fn format_deploy_failure(&self, _error: &DeployError) -> Result<()> {
        // The error itself is reported by the caller on stderr.
        Ok(())
    }

    fn format_plan(&self, plan: &ArchivePlan) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        for entry in &plan.entries {
            let (action, detail) = match &entry.verdict {
                Verdict::Accept(path) => ("extract", path.display().to_string()),
                Verdict::Skip(reason) => ("skip", reason.to_string()),
                Verdict::Reject(reason) => ("REJECT", reason.to_string()),
            };
            let action = if self.use_colors {
                match &entry.verdict {
                    Verdict::Accept(_) => style(action).green().to_string(),
                    Verdict::Skip(_) => style(action).yellow().to_string(),
                    Verdict::Reject(_) => style(action).red().bold().to_string(),
                }
            } else {
                action.to_string()
            };

            if self.verbose {
                self.line(&format!(
                    "{action:<8} {:<9} {:>10}  {}  ({detail})",
                    kind_name(entry.kind),
                    humanize_bytes(entry.size),
                    entry.path.display()
                ));
            } else {
                self.line(&format!("{action:<8} {}  ({detail})", entry.path.display()));
            }
        }

        self.line("");
        self.line(&format!(
            "{} of {} entries would be extracted ({} declared)",
            plan.accepted(),
            plan.entries.len(),
            humanize_bytes(plan.declared_bytes())
        ));

        Ok(())
    }
}
