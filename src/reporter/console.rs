//! Console reporter with colored output

use crate::aggregator::scoring::{entering_transition, leaving_transition};
use crate::session::format_delta;
use crate::{
    stage_key, transition_key, AggregationConfig, ScoreResult, CYCLE_LEN, DEFAULT_STAGE_LABELS,
};
use colored::Colorize;

const BAR_WIDTH: usize = 20;

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
    /// Display labels for S1..S7
    labels: Vec<String>,
}

impl ConsoleReporter {
    /// Create a new console reporter
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
            labels: DEFAULT_STAGE_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Use custom stage labels (ignored unless there are exactly seven)
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        if labels.len() == CYCLE_LEN {
            self.labels = labels;
        }
        self
    }

    /// Report a single result. `previous` adds per-stage deltas.
    pub fn report(
        &self,
        title: &str,
        result: &ScoreResult,
        config: &AggregationConfig,
        previous: Option<&ScoreResult>,
    ) {
        self.print_header(title, config);
        self.print_stages(result, previous);
        self.print_transitions(result);
        self.print_highlights(result);
        println!();
    }

    /// Report in quiet mode (one line)
    pub fn report_quiet(&self, title: &str, result: &ScoreResult) {
        println!("{}: {}", title, self.quiet_line(result));
    }

    /// "dominant S1 (50.0) | bottlenecks T1, T2"
    pub fn quiet_line(&self, result: &ScoreResult) -> String {
        format!(
            "dominant {} ({:.1}) | bottlenecks {}",
            result.dominant_stage,
            result.dominant_score(),
            result.bottleneck_transitions.join(", ")
        )
    }

    /// Label of stage `index`, e.g. "Root"
    pub fn stage_label(&self, index: usize) -> &str {
        self.labels
            .get(index)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// "S1 → S2" for transition `index`
    pub fn transition_label(&self, index: usize) -> String {
        let from = index;
        let to = (index + 1) % CYCLE_LEN;
        format!("{} → {}", stage_key(from), stage_key(to))
    }

    fn print_header(&self, title: &str, config: &AggregationConfig) {
        println!();
        println!("{}", format!("Cycle Scores: {}", title).bold());
        if config.penalty_enabled {
            println!(
                "   Penalty: on (tau {:.1}, delta {:.1})",
                config.tau, config.delta
            );
        } else {
            println!("   Penalty: off");
        }
        println!();
    }

    fn print_stages(&self, result: &ScoreResult, previous: Option<&ScoreResult>) {
        println!("   {}", "Stages:".bold());
        for i in 0..CYCLE_LEN {
            let key = stage_key(i);
            let score = result.stage(&key).unwrap_or(0.0);
            let delta = format_delta(previous.and_then(|p| p.stage(&key)), score);
            let marker = if key == result.dominant_stage {
                "★".yellow().to_string()
            } else {
                " ".to_string()
            };
            println!(
                "   {} {} {:<10} {} {:>6.1}{}",
                marker,
                key,
                self.stage_label(i),
                self.create_score_bar(score),
                score,
                delta.dimmed()
            );
            if self.verbose {
                println!(
                    "        {} entered by {}, left by {}",
                    "↳".dimmed(),
                    transition_key(entering_transition(i)).dimmed(),
                    transition_key(leaving_transition(i)).dimmed()
                );
            }
        }
        println!();
    }

    fn print_transitions(&self, result: &ScoreResult) {
        println!("   {}", "Transitions:".bold());
        for i in 0..CYCLE_LEN {
            let key = transition_key(i);
            let score = result.transition(&key).unwrap_or(0.0);
            let marker = if result.bottleneck_transitions.contains(&key) {
                "▼".red().to_string()
            } else {
                " ".to_string()
            };
            println!(
                "   {} {} {:<10} {} {:>6.1}",
                marker,
                key,
                self.transition_label(i),
                self.create_score_bar(score),
                score
            );
        }
        println!();
    }

    fn print_highlights(&self, result: &ScoreResult) {
        let dominant_label = crate::parse_key(&result.dominant_stage, 'S')
            .map(|i| self.stage_label(i))
            .unwrap_or_default();
        println!(
            "   {} {} {} ({:.1})",
            "Dominant stage:".bold(),
            result.dominant_stage.green().bold(),
            dominant_label,
            result.dominant_score()
        );

        let bottlenecks: Vec<String> = result
            .bottleneck_transitions
            .iter()
            .map(|key| {
                let label = crate::parse_key(key, 'T')
                    .map(|i| self.transition_label(i))
                    .unwrap_or_default();
                format!("{} ({})", key, label)
            })
            .collect();
        println!(
            "   {} {}",
            "Bottlenecks:".bold(),
            bottlenecks.join(", ").red()
        );
    }

    fn create_score_bar(&self, score: f64) -> String {
        let filled = Self::filled_cells(score);
        let bar = format!("[{}{}]", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));

        if self.use_colors {
            if score >= 70.0 {
                bar.green().to_string()
            } else if score >= 40.0 {
                bar.yellow().to_string()
            } else {
                bar.red().to_string()
            }
        } else {
            bar
        }
    }

    /// Bar cells for a 0-100 score; out-of-range scores pin to the ends
    fn filled_cells(score: f64) -> usize {
        if !score.is_finite() {
            return 0;
        }
        ((score.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compute, RawAnswers};

    #[test]
    fn test_quiet_line() {
        let result = compute(&RawAnswers::uniform(5.0), &AggregationConfig::default());
        let line = ConsoleReporter::new().quiet_line(&result);
        assert_eq!(line, "dominant S1 (50.0) | bottlenecks T1, T2");
    }

    #[test]
    fn test_transition_label_wraps() {
        let reporter = ConsoleReporter::new();
        assert_eq!(reporter.transition_label(0), "S1 → S2");
        assert_eq!(reporter.transition_label(6), "S7 → S1");
    }

    #[test]
    fn test_custom_labels() {
        let labels: Vec<String> = (1..=7).map(|i| format!("L{}", i)).collect();
        let reporter = ConsoleReporter::new().with_labels(labels);
        assert_eq!(reporter.stage_label(0), "L1");
        assert_eq!(reporter.stage_label(6), "L7");
    }

    #[test]
    fn test_wrong_label_count_keeps_defaults() {
        let reporter = ConsoleReporter::new().with_labels(vec!["x".to_string()]);
        assert_eq!(reporter.stage_label(0), "Root");
    }

    #[test]
    fn test_filled_cells_bounds() {
        assert_eq!(ConsoleReporter::filled_cells(0.0), 0);
        assert_eq!(ConsoleReporter::filled_cells(50.0), 10);
        assert_eq!(ConsoleReporter::filled_cells(100.0), BAR_WIDTH);
        assert_eq!(ConsoleReporter::filled_cells(140.0), BAR_WIDTH);
        assert_eq!(ConsoleReporter::filled_cells(-20.0), 0);
        assert_eq!(ConsoleReporter::filled_cells(f64::NAN), 0);
    }

    #[test]
    fn test_bar_without_colors_is_plain() {
        let bar = ConsoleReporter::new().without_colors().create_score_bar(50.0);
        assert_eq!(bar, format!("[{}{}]", "█".repeat(10), "░".repeat(10)));
    }
}
