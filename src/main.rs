use clap::{Arg, ArgAction, Command};
use jiki::{EvaluationContext, LanguageFeatures, RunOptions};
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    jiki::init_tracing();

    let matches = Command::new("jiki")
        .about("Runs a teaching subset of Python and records every step it takes")
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("features")
                .long("features")
                .value_name("JSON")
                .help("JSON file with the language features for this run"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Report every syntax error without running the program")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("trace")
                .long("trace")
                .help("Describe each recorded step instead of printing output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the frames and output as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("variables")
                .long("variables")
                .help("Record the visible variables on every frame")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("N")
                .help("Seed for the random module")
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();

    let mut context = EvaluationContext::default();
    if let Some(path) = matches.get_one::<String>("features") {
        context.language_features = load_features(path);
    }
    context.random_seed = matches.get_one::<u64>("seed").copied();
    context.snapshot_variables = matches.get_flag("variables");

    let options = RunOptions {
        check_only: matches.get_flag("check"),
        trace: matches.get_flag("trace"),
        json: matches.get_flag("json"),
    };

    if let Some(file_path) = matches.get_one::<String>("file") {
        run_file(file_path, &context, options);
    }
}

fn run_file(path: &str, context: &EvaluationContext, options: RunOptions) {
    let source = read_source(path);
    if !jiki::run(&source, Some(path), context, options) {
        process::exit(1);
    }
}

fn load_features(path: &str) -> LanguageFeatures {
    let json = read_source(path);
    match LanguageFeatures::from_json(&json) {
        Ok(features) => features,
        Err(e) => {
            eprintln!("Error: invalid language features in '{}': {}", path, e);
            process::exit(1);
        }
    }
}

fn read_source(path: &str) -> String {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        process::exit(1);
    }

    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}
