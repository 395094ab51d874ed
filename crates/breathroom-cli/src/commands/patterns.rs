use breathroom_core::timer::builtin_patterns;
use breathroom_core::{BreathingPattern, Config};
use clap::Subcommand;
use serde::Serialize;

use super::{format_clock, print_json, CliResult};

#[derive(Subcommand)]
pub enum PatternsAction {
    /// List built-in and custom patterns
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one pattern in detail as JSON
    Show {
        /// Pattern id
        id: String,
    },
}

#[derive(Serialize)]
struct PatternView<'a> {
    #[serde(flatten)]
    pattern: &'a BreathingPattern,
    custom: bool,
    summary: String,
    cycle_secs: f64,
    total_secs: f64,
    breaths_per_minute: f64,
}

impl<'a> PatternView<'a> {
    fn new(pattern: &'a BreathingPattern, custom: bool) -> Self {
        Self {
            pattern,
            custom,
            summary: pattern.summary(),
            cycle_secs: pattern.cycle_ms() as f64 / 1000.0,
            total_secs: pattern.total_ms() as f64 / 1000.0,
            breaths_per_minute: pattern.breaths_per_minute(),
        }
    }
}

/// Custom patterns first, then built-ins they do not shadow.
fn catalogue(config: &Config) -> Vec<(BreathingPattern, bool)> {
    let mut all: Vec<(BreathingPattern, bool)> =
        config.patterns.iter().cloned().map(|p| (p, true)).collect();
    for builtin in builtin_patterns() {
        if !config.patterns.iter().any(|p| p.id == builtin.id) {
            all.push((builtin, false));
        }
    }
    all
}

pub fn run(action: PatternsAction) -> CliResult {
    let config = Config::load_or_default();

    match action {
        PatternsAction::List { json } => {
            let all = catalogue(&config);
            if json {
                let views: Vec<PatternView> = all
                    .iter()
                    .map(|(p, c)| PatternView::new(p, *c))
                    .collect();
                return print_json(&views);
            }
            for (pattern, custom) in &all {
                let marker = if *custom { "*" } else { " " };
                println!(
                    "{marker} {:<12} {:<18} {:<16} {:>5}  {:.1} bpm",
                    pattern.id,
                    pattern.label,
                    pattern.summary(),
                    format_clock(pattern.total_ms()),
                    pattern.breaths_per_minute(),
                );
            }
        }
        PatternsAction::Show { id } => {
            let pattern = config.find_pattern(&id)?;
            let custom = config.patterns.iter().any(|p| p.id == id);
            print_json(&PatternView::new(&pattern, custom))?;
        }
    }
    Ok(())
}
