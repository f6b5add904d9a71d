// src/main.rs
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use trendreport::config::Config;
use trendreport::dispatch::{invoke, list_operations, parse_code, OpArgs, Operation, Session};
use trendreport::EngineError;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Menu-driven reports over a dated CSV case table"
)]
struct Args {
    /// YAML or JSON config file.
    #[arg(long, env = "TRENDREPORT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(short, long)]
    input: Option<PathBuf>,
    #[arg(long)]
    preamble_lines: Option<usize>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Replace existing artifacts instead of leaving them alone.
    #[arg(long)]
    overwrite: bool,
    /// Run a single operation code and exit instead of showing the menu.
    #[arg(long)]
    op: Option<u8>,
    #[arg(short, long, allow_negative_numbers = true)]
    n: Option<i64>,
    #[arg(long)]
    column: Option<String>,
    #[arg(long)]
    group: Option<String>,
    /// Second column of a trend-line fit.
    #[arg(long)]
    against: Option<String>,
    /// Print outcomes as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // ─── 1) init logging (stderr, stdout is for reports) ─────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    // ─── 2) config, flags on top ─────────────────────────────────────
    let args = Args::parse();
    let config = build_config(&args)?;

    // ─── 3) load the input once ──────────────────────────────────────
    let input = config.input.clone();
    let mut session =
        Session::open(config).with_context(|| format!("loading {}", input.display()))?;
    info!(rows = session.table().len(), "loaded {}", input.display());

    let defaults = OpArgs {
        column: args.column.clone(),
        n: args.n,
        group: args.group.clone(),
        against: args.against.clone(),
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // ─── 4) one operation, or the menu ───────────────────────────────
    match args.op {
        Some(code) => {
            let op = Operation::from_code(code).ok_or_else(|| {
                EngineError::InvalidOperation(format!("no operation with code {}", code))
            })?;
            let outcome = invoke(op, &mut session, &defaults)?;
            render::render(&mut out, &outcome, &session.config().date_format, args.json)?;
        }
        None => {
            let stdin = io::stdin();
            run_menu(&mut session, stdin.lock(), &mut out, &defaults, args.json)?;
        }
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(input) = &args.input {
        cfg.input = input.clone();
    }
    if let Some(n) = args.preamble_lines {
        cfg.preamble_lines = n;
    }
    if let Some(dir) = &args.output_dir {
        cfg.output_dir = dir.clone();
    }
    if args.overwrite {
        cfg.overwrite = true;
    }
    Ok(cfg)
}

/// Show the menu, read a code, run it, repeat until `0` or end of input.
/// Bad input and failed operations are reported and the menu comes back.
fn run_menu<R: BufRead, W: Write>(
    session: &mut Session,
    mut input: R,
    out: &mut W,
    defaults: &OpArgs,
    json: bool,
) -> Result<()> {
    writeln!(
        out,
        "Welcome. {} rows loaded from {}.",
        session.table().len(),
        session.raw().source()
    )?;

    loop {
        print_menu(out)?;
        write!(out, "Choose an option: ")?;
        out.flush()?;
        let Some(line) = read_line(&mut input)? else {
            break;
        };

        let op = match parse_code(&line) {
            Ok(op) => op,
            Err(e) => {
                writeln!(out, "{}. Please try again.", e)?;
                continue;
            }
        };
        if op == Operation::Exit {
            break;
        }

        let mut args = defaults.clone();
        if op.takes_count() {
            match prompt_count(&mut input, out, session.config().top_n)? {
                Some(n) => args.n = Some(n),
                None => break,
            }
        }
        if op.takes_group() {
            write!(
                out,
                "Value of {} (blank for all rows): ",
                session.config().group_column
            )?;
            out.flush()?;
            match read_line(&mut input)? {
                Some(group) => args.group = Some(group),
                None => break,
            }
        }

        match invoke(op, session, &args) {
            Ok(outcome) => render::render(out, &outcome, &session.config().date_format, json)?,
            Err(e) => {
                warn!(code = op.code(), error = %e, "operation failed");
                writeln!(out, "{}", e)?;
            }
        }
    }

    writeln!(out, "Thank you.")?;
    Ok(())
}

fn print_menu<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    for (code, description) in list_operations() {
        writeln!(out, "{:>2}. {}", code, description)?;
    }
    Ok(())
}

/// Ask for a count until one parses; blank takes `default`. `None` on end of input.
fn prompt_count<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    default: i64,
) -> Result<Option<i64>> {
    loop {
        write!(out, "How many? [{}]: ", default)?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        let line = line.trim();
        if line.is_empty() {
            return Ok(Some(default));
        }
        match line.parse::<i64>() {
            Ok(n) => return Ok(Some(n)),
            Err(_) => {
                let e = EngineError::InvalidOperation(format!("`{}` is not a number", line));
                writeln!(out, "{}. Please try again.", e)?;
            }
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim_end_matches(&['\r', '\n'][..]).to_string()))
}
