use std::env;
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::time::Instant;

use anyhow::{anyhow, bail, Error};
use clap::{value_t, values_t, App, AppSettings, Arg};
use env_logger::{fmt, Builder, Target};
use log::{error, info};
use log::{Level, LevelFilter, Record};

use bnsl::config::{LearnerConfig, LearnerConfigUpdate};
use bnsl::learner::table_bytes;
use bnsl::scorefile::{random_scores, write_scores, ScoreFileParser};
use bnsl::{Learner, ScoreTable, Var};

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging() {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .format(format)
        .filter(None, LevelFilter::Info);

    if let Ok(ref env_var) = env::var("BNSL_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn banner() {
    info!("This is bnsl {}", env!("BNSL_VERSION"));
    info!(
        "  {} build - {}",
        env!("BNSL_PROFILE"),
        env!("BNSL_RUSTC_VERSION")
    );
}

/// Largest variable count whose tables fit into `limit` bytes.
fn max_var_count(limit: u128) -> usize {
    (0..=Var::max_count())
        .take_while(|&var_count| table_bytes(var_count) <= limit)
        .last()
        .unwrap_or(0)
}

fn read_scores(path: &str, var_limit: usize) -> Result<ScoreTable, Error> {
    info!("Reading scores from '{}'", path);

    let file = io::BufReader::new(fs::File::open(path)?);
    let mut parser = ScoreFileParser::new();
    parser.set_var_limit(var_limit);

    for line in file.lines() {
        parser.parse_line(&line?)?;
    }

    Ok(parser.finish()?)
}

fn main_with_err() -> Result<i32, Error> {
    let matches = App::new("bnsl")
        .version(env!("BNSL_VERSION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .arg_from_usage("[nof-vars] 'Number of variables, random scores are used without --scores'")
        .arg_from_usage("[seed] 'Seed for the random scores (0 if omitted)'")
        .arg_from_usage("[score-file] --scores=[FILE] 'Read local scores from a score file'")
        .arg_from_usage(
            "[write-scores] --write-scores=[FILE] 'Write the used local scores to a score file'",
        )
        .arg(
            Arg::from_usage(
                "[memory-limit] --memory-limit=[MIB] 'Reject inputs whose tables exceed this size'",
            )
            .default_value("4096"),
        )
        .arg_from_usage("[config-file] --config=[FILE] 'Read parameters from configuration file'")
        .arg(
            Arg::from_usage("[config-option] -C --config-option")
                .value_name("OPTION>=<VALUE")
                .help("Specify a single config option, see 'bnsl -C help' for a list of options.")
                .multiple(true)
                .number_of_values(1),
        )
        .get_matches();

    if values_t!(matches, "config-option", String)
        .unwrap_or(vec![])
        .iter()
        .any(|option| option == "help")
    {
        print!("{}", LearnerConfig::help());
        return Ok(0);
    }

    init_logging();
    banner();

    let mut config_update = LearnerConfigUpdate::new();

    if let Some(config_path) = matches.value_of("config-file") {
        let mut config_contents = String::new();
        fs::File::open(config_path)?.read_to_string(&mut config_contents)?;

        config_update.merge(toml::from_str(&config_contents)?);
    }

    for config_option in values_t!(matches, "config-option", String).unwrap_or(vec![]) {
        config_update.merge(toml::from_str(&config_option)?);
    }

    let memory_limit = value_t!(matches, "memory-limit", u64)?;
    let var_limit = max_var_count(u128::from(memory_limit) << 20);

    let nof_vars = match matches.value_of("nof-vars") {
        Some(_) => Some(value_t!(matches, "nof-vars", usize)?),
        None => None,
    };

    let scores = match (matches.value_of("score-file"), nof_vars) {
        (Some(path), _) => {
            let scores = read_scores(path, var_limit)?;
            if let Some(var_count) = nof_vars {
                if var_count != scores.var_count() {
                    bail!(
                        "Score file has {} variables, but {} were requested",
                        scores.var_count(),
                        var_count
                    );
                }
            }
            scores
        }
        (None, Some(var_count)) => {
            if var_count > var_limit {
                bail!(
                    "{} variables exceed the memory limit of {} MiB, which allows at most {}",
                    var_count,
                    memory_limit,
                    var_limit
                );
            }
            let seed = match matches.value_of("seed") {
                Some(_) => value_t!(matches, "seed", u64)?,
                None => 0,
            };
            info!(
                "Generating random scores for {} variables with seed {}",
                var_count, seed
            );
            random_scores(var_count, seed)
        }
        (None, None) => {
            return Err(anyhow!(
                "Either a number of variables or a score file is required"
            ))
        }
    };

    if let Some(path) = matches.value_of("write-scores") {
        info!("Writing scores to '{}'", path);
        let mut file = io::BufWriter::new(fs::File::create(path)?);
        write_scores(&mut file, &scores)?;
        file.flush()?;
    }

    let mut learner = Learner::new();
    learner.config(&config_update)?;
    learner.set_scores(scores);

    let start_time = Instant::now();
    let network = learner.learn()?;
    let elapsed = start_time.elapsed();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "{}", network)?;
    writeln!(out, "s {}", network.total_score())?;
    out.flush()?;

    info!("Learned network in {:.3}s", elapsed.as_secs_f64());

    Ok(0)
}
