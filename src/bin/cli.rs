//! Railbird CLI - Command-line interface for race wagering recommendations

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use railbird::core::kelly::{calculate_kelly, KellyFraction};
use railbird::core::market::{
    decimal_to_american, decimal_to_fractional, implied_probability, parse_odds,
};
use railbird::core::overlay::HorseMarketView;
use railbird::core::signals::{
    DetectorConfidence, DetectorSignals, VulnerableFavoriteVerdict,
};
use railbird::core::sizing::{default_config_for_bankroll, SizingConfig};
use railbird::core::ticket::{
    recommend_race, RaceRecommendation, TicketTemplate, VerdictAction, DEFAULT_MIN_OVERLAY_PCT,
};
use railbird::data::{load_batch_file, load_race_file};

#[derive(Parser)]
#[command(name = "railbird")]
#[command(author, version, about = "Race wagering recommendation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run in interactive mode
    #[arg(short, long)]
    interactive: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a ticket for a single race file
    Recommend {
        /// Path to a race JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Bankroll amount for Kelly staking
        #[arg(long)]
        bankroll: Option<f64>,

        /// Kelly fraction: full, half, quarter, or eighth
        #[arg(long, default_value = "quarter")]
        fraction: String,

        /// Overlay threshold (percent) for value-play highlighting
        #[arg(long, default_value = "10.0")]
        min_overlay: f64,

        /// Emit raw JSON instead of the formatted panel
        #[arg(long)]
        json: bool,
    },

    /// Recommend tickets for every race in a batch file
    Batch {
        /// Path to a JSON array of races
        #[arg(short, long)]
        file: PathBuf,

        /// Bankroll applied to races that do not carry one
        #[arg(long)]
        bankroll: Option<f64>,
    },

    /// Convert an odds string between formats
    Odds {
        /// Odds in any supported format: "5-1", "5/2", "EVEN", "+300", "8"
        value: String,
    },

    /// Kelly staking math for a single probability/odds pair
    Kelly {
        /// Estimated win probability (0-1)
        #[arg(short, long)]
        probability: f64,

        /// Odds in any supported format
        #[arg(short, long)]
        odds: String,

        /// Bankroll amount
        #[arg(short, long, default_value = "1000")]
        bankroll: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("{}", "Railbird CLI".cyan().bold());
    println!();

    if cli.interactive {
        run_interactive()?;
    } else if let Some(command) = cli.command {
        match command {
            Commands::Recommend {
                file,
                bankroll,
                fraction,
                min_overlay,
                json,
            } => {
                run_recommend(&file, bankroll, &fraction, min_overlay, json)?;
            }
            Commands::Batch { file, bankroll } => {
                run_batch(&file, bankroll)?;
            }
            Commands::Odds { value } => {
                run_odds(&value);
            }
            Commands::Kelly {
                probability,
                odds,
                bankroll,
            } => {
                run_kelly(probability, &odds, bankroll);
            }
        }
    } else {
        println!("Use --help for usage information or --interactive for interactive mode.");
    }

    Ok(())
}

fn parse_fraction(raw: &str) -> Result<KellyFraction> {
    match raw.to_ascii_lowercase().as_str() {
        "full" => Ok(KellyFraction::Full),
        "half" => Ok(KellyFraction::Half),
        "quarter" => Ok(KellyFraction::Quarter),
        "eighth" => Ok(KellyFraction::Eighth),
        other => bail!("unknown Kelly fraction '{}'; use full, half, quarter, or eighth", other),
    }
}

fn run_recommend(
    file: &PathBuf,
    bankroll_flag: Option<f64>,
    fraction: &str,
    min_overlay: f64,
    json: bool,
) -> Result<()> {
    let fraction = parse_fraction(fraction)?;
    let request = load_race_file(file)
        .with_context(|| format!("Failed to load race file {:?}", file))?;

    let bankroll = bankroll_flag.or(request.bankroll);
    let sizing = request.sizing.clone().or_else(|| {
        bankroll.map(|b| SizingConfig {
            kelly_fraction: fraction,
            ..default_config_for_bankroll(b)
        })
    });

    let horses = request.to_market_views();
    let recommendation = recommend_race(
        &horses,
        &request.detectors,
        bankroll,
        sizing.as_ref(),
        min_overlay,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
        return Ok(());
    }

    if let Some(race_id) = &request.race_id {
        println!("{}: {}", "Race".green(), race_id);
        println!();
    }
    print_recommendation(&recommendation);
    Ok(())
}

fn run_batch(file: &PathBuf, bankroll: Option<f64>) -> Result<()> {
    let requests = load_batch_file(file)
        .with_context(|| format!("Failed to load batch file {:?}", file))?;

    let bar = ProgressBar::new(requests.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .expect("valid progress template"),
    );

    let mut results: Vec<(String, RaceRecommendation)> = Vec::with_capacity(requests.len());
    for (i, request) in requests.iter().enumerate() {
        let label = request
            .race_id
            .clone()
            .unwrap_or_else(|| format!("race {}", i + 1));
        bar.set_message(label.clone());

        let horses = request.to_market_views();
        let recommendation = recommend_race(
            &horses,
            &request.detectors,
            request.bankroll.or(bankroll),
            request.sizing.as_ref(),
            request.min_overlay.unwrap_or(DEFAULT_MIN_OVERLAY_PCT),
        );
        results.push((label, recommendation));
        bar.inc(1);
    }
    bar.finish_and_clear();

    println!("{}", "Batch Summary:".yellow().bold());
    println!(
        "{:<16} {:>9} {:>7} {:>6} {:>8} {:>10}",
        "race", "template", "conf", "value", "action", "stake"
    );
    println!("{}", "-".repeat(62));

    let mut bets = 0usize;
    for (label, rec) in &results {
        let action = match rec.ticket.verdict.action {
            VerdictAction::Bet => {
                bets += 1;
                "BET".green()
            }
            VerdictAction::Pass => "PASS".dimmed(),
        };
        let stake = rec
            .staking
            .as_ref()
            .map(|s| format!("${:.0}", s.bet.final_bet))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<16} {:>9} {:>7} {:>6} {:>8} {:>10}",
            truncate_label(label, 16),
            template_label(rec.ticket.template),
            rec.ticket.confidence_score,
            rec.ticket
                .value_horse
                .program_number
                .map(|p| format!("#{}", p))
                .unwrap_or_else(|| "-".to_string()),
            action,
            stake
        );
    }

    println!();
    println!(
        "{} of {} races playable",
        bets.to_string().green().bold(),
        results.len()
    );
    Ok(())
}

fn run_odds(value: &str) {
    let decimal = parse_odds(value);
    let implied = implied_probability(decimal);

    println!("{}", "Odds Conversion:".yellow().bold());
    println!("{}", "-".repeat(34));
    println!("{:<22} {}", "input", value);
    println!("{:<22} {:.3}", "decimal", decimal);
    println!("{:<22} {}", "fractional", decimal_to_fractional(decimal));
    println!("{:<22} {}", "american", decimal_to_american(decimal));
    println!("{:<22} {:.1}%", "implied probability", implied * 100.0);
}

fn run_kelly(probability: f64, odds: &str, bankroll: f64) {
    let decimal = parse_odds(odds);
    let kelly = calculate_kelly(probability, decimal, bankroll);

    println!("{}", "Kelly Staking:".yellow().bold());
    println!("{}", "-".repeat(40));
    println!("{:<24} {:.3}", "decimal odds", decimal);
    println!("{:<24} {:.2}%", "full Kelly", kelly.full_kelly_fraction * 100.0);
    println!(
        "{:<24} {:.2}%",
        "quarter Kelly",
        kelly.quarter_kelly_fraction * 100.0
    );
    println!("{:<24} {:+.3}", "expected value / $1", kelly.expected_value);
    println!("{:<24} {:+.1}%", "edge", kelly.edge_percent);
    println!();

    if kelly.should_bet {
        println!(
            "{} suggested stake {} ({})",
            "BET".green().bold(),
            format!("${:.0}", kelly.suggested_bet_size).bold(),
            kelly.reason
        );
    } else {
        println!("{} {}", "NO BET".red().bold(), kelly.reason.dimmed());
    }
}

fn run_interactive() -> Result<()> {
    let theme = ColorfulTheme::default();

    let field_size: usize = Input::with_theme(&theme)
        .with_prompt("How many horses in the field?")
        .validate_with(|n: &usize| {
            if *n >= 2 && *n <= 20 {
                Ok(())
            } else {
                Err("field size must be 2-20")
            }
        })
        .interact_text()?;

    let mut horses = Vec::with_capacity(field_size);
    for program in 1..=field_size as u8 {
        let score: f64 = Input::with_theme(&theme)
            .with_prompt(format!("#{} algorithm score", program))
            .interact_text()?;
        let odds: String = Input::with_theme(&theme)
            .with_prompt(format!("#{} odds (e.g. 5-2, +300, EVEN)", program))
            .interact_text()?;
        horses.push(HorseMarketView {
            program_number: program,
            score,
            scratched: false,
            decimal_odds: parse_odds(&odds),
        });
    }

    let mut detectors = DetectorSignals::default();
    let flagged = Confirm::with_theme(&theme)
        .with_prompt("Did the vulnerable-favorite bot flag the favorite?")
        .default(false)
        .interact()?;
    if flagged {
        let favorite = horses
            .iter()
            .max_by(|a, b| {
                a.score
                    .partial_cmp(&b.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|h| h.program_number)
            .unwrap_or(1);
        let confidence = Select::with_theme(&theme)
            .with_prompt("Bot confidence")
            .items(&["low", "medium", "high"])
            .default(2)
            .interact()?;
        detectors.vulnerable_favorite = Some(VulnerableFavoriteVerdict {
            program_number: favorite,
            vulnerable: true,
            reasons: vec!["flagged interactively".to_string()],
            confidence: match confidence {
                0 => DetectorConfidence::Low,
                1 => DetectorConfidence::Medium,
                _ => DetectorConfidence::High,
            },
        });
    }

    let bankroll: f64 = Input::with_theme(&theme)
        .with_prompt("Bankroll")
        .default(1000.0)
        .interact_text()?;

    let recommendation = recommend_race(
        &horses,
        &detectors,
        Some(bankroll),
        None,
        DEFAULT_MIN_OVERLAY_PCT,
    );

    println!();
    print_recommendation(&recommendation);
    Ok(())
}

fn print_recommendation(rec: &RaceRecommendation) {
    // Market panel
    println!("{}", "Market:".yellow().bold());
    println!(
        "{:>8} {:>8} {:>9} {:>9}",
        "odds", "decimal", "implied", "vig-free"
    );
    println!("{}", "-".repeat(38));
    for horse in &rec.market {
        println!(
            "{:>8} {:>8.2} {:>8.1}% {:>8.1}%",
            decimal_to_fractional(horse.decimal_odds),
            horse.decimal_odds,
            horse.implied_prob * 100.0,
            horse.normalized_prob * 100.0
        );
    }
    println!(
        "{} {:.3} ({:.1}% takeout)",
        "overround".dimmed(),
        rec.market.first().map(|h| h.overround).unwrap_or(1.0),
        rec.market.first().map(|h| h.takeout_percent).unwrap_or(0.0)
    );
    println!();

    // Value plays
    if !rec.overlays.is_empty() {
        println!("{}", "Value Plays:".yellow().bold());
        println!(
            "{:>4} {:>9} {:>9} {:>16} {:>8}",
            "#", "overlay", "EV/$1", "class", "action"
        );
        println!("{}", "-".repeat(52));
        for play in &rec.overlays {
            println!(
                "{:>4} {:>8.0}% {:>9.2} {:>16} {:>8}",
                play.program_number,
                play.analysis.overlay_percent,
                play.analysis.ev_per_dollar,
                format!("{:?}", play.analysis.value_class),
                format!("{:?}", play.analysis.recommendation.action)
            );
        }
        println!();
    }

    // Ticket panel
    let ticket = &rec.ticket;
    println!("{}", "Recommendation:".yellow().bold());
    println!("{}", "-".repeat(52));
    println!(
        "{:<18} {}",
        "template",
        template_label(ticket.template).bold()
    );
    println!("{:<18} {:?}", "favorite status", ticket.favorite_status);
    println!(
        "{:<18} {} ({:?})",
        "confidence",
        ticket.confidence_score,
        ticket.confidence_tier
    );
    if let Some(program) = ticket.value_horse.program_number {
        println!(
            "{:<18} #{} [{}]",
            "value horse",
            program,
            ticket.value_horse.reasoning.dimmed()
        );
    }
    println!(
        "{:<18} {:?}",
        "algorithm top 4", ticket.algorithm_top4
    );
    if ticket.exacta.combinations > 0 {
        println!(
            "{:<18} {:?} / {:?} ({} combos)",
            "exacta", ticket.exacta.first, ticket.exacta.second, ticket.exacta.combinations
        );
        println!(
            "{:<18} {:?} / {:?} / {:?} ({} combos)",
            "trifecta",
            ticket.trifecta.first,
            ticket.trifecta.second,
            ticket.trifecta.third,
            ticket.trifecta.combinations
        );
    }
    println!();

    match ticket.verdict.action {
        VerdictAction::Bet => {
            println!("{} {}", "BET".green().bold(), ticket.verdict.summary)
        }
        VerdictAction::Pass => {
            println!("{} {}", "PASS".red().bold(), ticket.verdict.summary)
        }
    }

    if let Some(staking) = &rec.staking {
        if staking.bet.final_bet > 0.0 {
            println!(
                "{} ${:.0} on #{} ({:.1}% of bankroll)",
                "Stake:".green(),
                staking.bet.final_bet,
                staking.program_number,
                staking.bet.effective_bet_percent
            );
        } else if let Some(reason) = staking.bet.cap_reason {
            println!("{} {:?}", "No stake:".dimmed(), reason);
        }
    }

}

fn template_label(template: TicketTemplate) -> &'static str {
    match template {
        TicketTemplate::A => "A",
        TicketTemplate::B => "B",
        TicketTemplate::C => "C",
        TicketTemplate::Pass => "PASS",
    }
}

fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        label.to_string()
    } else {
        let head: String = label.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}
