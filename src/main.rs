//! Terminal shell for the calculator engine.
//!
//! Reads keystrokes line by line from stdin and prints the session state
//! after each line. All arithmetic lives in the engine; this binary only
//! maps keys and renders text.

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use railcalc::{GuardrailConfig, Operator, Session, Severity};

#[derive(Debug, Parser)]
#[command(name = "railcalc", version, about = "A guarded terminal calculator")]
struct Args {
    /// TOML file overriding the guardrail thresholds.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GuardrailConfig::default(),
    };

    let mut session = Session::with_config(config);
    println!("keys: 0-9 . + - * / | = evaluate (empty line repeats) | c clear | q quit");

    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        for key in line.chars() {
            if key == 'q' {
                return Ok(());
            }
            feed_key(&mut session, key);
        }
        if line.is_empty() {
            session.evaluate();
        }
        render(&session);
    }
    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<GuardrailConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
}

fn feed_key(session: &mut Session, key: char) {
    match key {
        '0'..='9' | '.' => session.push_digit(key),
        '=' => session.evaluate(),
        'c' | 'C' => session.clear(),
        other => {
            if let Some(op) = Operator::from_symbol(map_operator_key(other)) {
                session.push_operator(op);
            }
        }
    }
}

/// ASCII aliases for the engine's operator symbols.
fn map_operator_key(key: char) -> char {
    match key {
        '*' | 'x' | 'X' => '×',
        '/' => '÷',
        other => other,
    }
}

fn render(session: &Session) {
    if let Some(error) = session.error() {
        match error.severity() {
            Severity::Warning => println!("! {error}"),
            Severity::Error => println!("!! {error}"),
        }
        if session.is_halted() {
            println!("   halted, press c to clear");
        }
    } else if !session.expression().is_empty() {
        println!("  {}", session.expression());
    } else if !session.result_text().is_empty() {
        println!("= {}", session.result_text());
    }
}
