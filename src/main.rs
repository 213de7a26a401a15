use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mushid::display::{self, prompt_record};
use mushid::{
    Edibility, MushroomData, MushroomError, MushroomModel, REFERENCE_EDIBLE, REFERENCE_POISONOUS,
    TrainingConfig,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DISCLAIMER: &str = "Warning: this is a demonstration model.\n\
                          Do not eat wild mushrooms based on this prediction.";

#[derive(Parser)]
#[command(name = "mushid", about = "Mushroom edibility classifier", version)]
struct Cli {
    /// CSV dataset with a `class` column
    #[arg(long, default_value = "mushroom.csv")]
    dataset: PathBuf,

    /// Fraction of records held out for evaluation
    #[arg(long, default_value_t = 0.25)]
    test_ratio: f64,

    /// Seed for the train/test shuffle
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of feature importances to show
    #[arg(long, default_value_t = 5)]
    top: usize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactively pick attributes and classify (default)
    Classify,
    /// Print accuracy, confusion counts and feature importances
    Report {
        #[arg(long)]
        json: bool,
    },
    /// Classify a single record given as feature=code pairs
    Predict {
        #[arg(long = "set", value_name = "FEATURE=CODE", value_parser = parse_pair)]
        set: Vec<(String, String)>,
    },
    /// Classify the two reference specimens
    SelfCheck,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected FEATURE=CODE, got `{s}`"))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mushid=info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(MushroomError::DatasetNotFound(path)) = err.downcast_ref::<MushroomError>() {
                eprintln!(
                    "'{}' not found. Make sure the dataset is in the working directory or pass --dataset.",
                    path.display()
                );
            } else {
                eprintln!("error: {err:#}");
            }
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = TrainingConfig {
        test_ratio: cli.test_ratio,
        seed: cli.seed,
        ..TrainingConfig::default()
    };

    let data = MushroomData::load_with_target(&cli.dataset, &config.target_column)?;
    let model = MushroomModel::train_with(&data, &config)?;

    match cli.command.unwrap_or(Command::Classify) {
        Command::Classify => classify(&model, cli.top),
        Command::Report { json } => report(&model, cli.top, json),
        Command::Predict { set } => {
            if set.is_empty() {
                bail!("no attributes given, use --set FEATURE=CODE");
            }
            println!("{}", model.predict(set));
            Ok(())
        }
        Command::SelfCheck => self_check(&model),
    }
}

fn report(model: &MushroomModel, top: usize, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(&model.report(top))
            .context("Failed to serialize report")?;
        println!("{out}");
    } else {
        print!("{}", display::render_summary(model, top));
    }
    Ok(())
}

fn classify(model: &MushroomModel, top: usize) -> Result<()> {
    print!("{}", display::render_summary(model, top));

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    loop {
        writeln!(
            output,
            "\nPick attributes (number, name or code, Enter for the first, 'exit' to quit):"
        )?;
        let Some(record) = prompt_record(&mut input, &mut output, model.catalog())? else {
            break;
        };

        let label = model.predict(record);
        let mark = match label {
            Edibility::Poisonous => "☠️",
            Edibility::Edible => "🍄",
        };
        writeln!(output, "\n{mark} PREDICTED: {label}\n{DISCLAIMER}")?;
    }
    Ok(())
}

fn self_check(model: &MushroomModel) -> Result<()> {
    let poisonous = model.predict(REFERENCE_POISONOUS);
    let edible = model.predict(REFERENCE_EDIBLE);
    println!("Reference 1 (foul odour, expected POISONOUS): {poisonous}");
    println!("Reference 2 (no odour, expected EDIBLE):      {edible}");

    if poisonous != Edibility::Poisonous || edible != Edibility::Edible {
        bail!("reference specimens misclassified");
    }
    Ok(())
}
