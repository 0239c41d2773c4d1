//! Command-line interface for hilite
//! This binary tokenizes source text with a registered grammar and prints the classified
//! spans in one of the serialization formats.
//!
//! Usage:
//!   hilite `<path>` --language `<name>` [--format `<format>`]   - Tokenize a file (`-` for stdin)
//!   hilite --list-languages                                    - List registered grammars
//!   hilite --list-formats                                      - List output formats

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use hilite_config::{HiliteConfig, Loader};
use hilite_core::{FormatRegistry, GrammarRegistry, TokenizerOptions, MAX_DEPTH_LIMIT};
use log::{debug, info};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code for `--strict` runs whose input did not tokenize cleanly.
const EXIT_NOT_CLEAN: u8 = 2;

fn cli() -> Command {
    Command::new("hilite")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tokenize source text for syntax highlighting")
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .help("File to tokenize, or - for stdin")
                .required_unless_present_any(["list-languages", "list-formats"])
                .index(1),
        )
        .arg(
            Arg::new("language")
                .long("language")
                .short('l')
                .help("Grammar name or alias (e.g., 'cocosql')")
                .required_unless_present_any(["list-languages", "list-formats"]),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format (default from config: tag)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (default: ./hilite.toml when present)"),
        )
        .arg(
            Arg::new("grammar")
                .long("grammar")
                .short('g')
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Append)
                .help("Extra grammar file (YAML, or JSON by extension); repeatable"),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .value_parser(value_parser!(usize))
                .help("Maximum nesting of scopes and embedded languages (at most 256)"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Exit with status 2 when the input is incomplete or contains illegal text")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log more (-v debug, -vv trace)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("list-languages")
                .long("list-languages")
                .help("List registered grammars and their aliases")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available output formats")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    match run(&matches) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let config = load_config(matches)?;
    init_logging(&config, matches.get_count("verbose"));

    if matches.get_flag("list-formats") {
        handle_list_formats_command();
        return Ok(ExitCode::SUCCESS);
    }

    let registry = load_grammars(&config, matches)?;

    if matches.get_flag("list-languages") {
        handle_list_languages_command(&registry);
        return Ok(ExitCode::SUCCESS);
    }

    let path = matches
        .get_one::<String>("path")
        .context("missing input path")?;
    let language = matches
        .get_one::<String>("language")
        .context("missing --language")?;
    handle_tokenize_command(&config, &registry, path, language, matches.get_flag("strict"))
}

/// Defaults, then `--config` (required to exist) or `./hilite.toml` (optional), then flags.
fn load_config(matches: &ArgMatches) -> Result<HiliteConfig> {
    let mut loader = Loader::discover(matches.get_one::<PathBuf>("config"));
    if let Some(format) = matches.get_one::<String>("format") {
        loader = loader.set_override("output.format", format.as_str())?;
    }
    if let Some(depth) = matches.get_one::<usize>("max-depth") {
        let depth = i64::try_from(*depth).context("--max-depth is too large")?;
        loader = loader.set_override("tokenizer.max_depth", depth)?;
    }
    let config = loader.build().context("failed to load configuration")?;
    if config.tokenizer.max_depth > MAX_DEPTH_LIMIT {
        bail!(
            "tokenizer.max_depth is {}, the limit is {MAX_DEPTH_LIMIT}",
            config.tokenizer.max_depth
        );
    }
    Ok(config)
}

/// `RUST_LOG` wins; otherwise `-v` flags, then `logging.level`.
fn init_logging(config: &HiliteConfig, verbosity: u8) {
    let level = match verbosity {
        0 => config.logging.level.as_filter(),
        1 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn load_grammars(config: &HiliteConfig, matches: &ArgMatches) -> Result<GrammarRegistry> {
    let mut registry =
        GrammarRegistry::with_builtins().context("failed to load bundled grammars")?;

    let extra = config
        .grammars
        .paths
        .iter()
        .chain(matches.get_many::<PathBuf>("grammar").into_iter().flatten());
    for path in extra {
        let grammar = registry
            .load_file(path)
            .with_context(|| format!("failed to load grammar {}", path.display()))?;
        info!("loaded grammar '{}' from {}", grammar.name(), path.display());
    }
    registry.validate()?;
    Ok(registry)
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
    }
}

/// Handle the tokenize command
fn handle_tokenize_command(
    config: &HiliteConfig,
    registry: &GrammarRegistry,
    path: &str,
    language: &str,
    strict: bool,
) -> Result<ExitCode> {
    let formats = FormatRegistry::with_defaults();
    let format = config.output.format.as_str();
    if !formats.has(format) {
        bail!(
            "unknown format '{format}' (available: {})",
            formats.list_formats().join(", ")
        );
    }

    let text = read_input(path)?;
    let options = TokenizerOptions {
        max_depth: config.tokenizer.max_depth,
    };
    let mut highlight = registry
        .tokenize_with(language, &text, options)
        .with_context(|| format!("available languages: {}", registry.names().join(", ")))?;
    debug!(
        "{} tokens, relevance {}",
        highlight.tokens.len(),
        highlight.relevance
    );

    let clean = !highlight.incomplete && !highlight.illegal;
    if !config.tokenizer.include_plain {
        highlight = highlight.without_plain();
    }

    let output = formats.serialize(&highlight, format)?;
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }

    if strict && !clean {
        eprintln!(
            "{path}: {}",
            if highlight.incomplete {
                "input ends inside an open construct"
            } else {
                "input contains illegal text"
            }
        );
        return Ok(ExitCode::from(EXIT_NOT_CLEAN));
    }
    Ok(ExitCode::SUCCESS)
}

/// Handle the list-languages command
fn handle_list_languages_command(registry: &GrammarRegistry) {
    println!("Available languages:\n");

    let mut grammars: Vec<_> = registry.iter().collect();
    grammars.sort_by_key(|g| g.name().to_lowercase());
    for grammar in grammars {
        println!("  {}", grammar.name());
        let aliases: Vec<_> = grammar
            .aliases()
            .iter()
            .filter(|a| !a.eq_ignore_ascii_case(grammar.name()))
            .map(|a| a.as_str())
            .collect();
        if !aliases.is_empty() {
            println!("    aliases: {}", aliases.join(", "));
        }
        if let Some(category) = grammar.category() {
            println!("    category: {category}");
        }
        println!();
    }
}

/// Handle the list-formats command
fn handle_list_formats_command() {
    let formats = FormatRegistry::with_defaults();
    println!("Available formats:\n");

    for (name, description) in formats.describe() {
        println!("  {name}");
        println!("    {description}");
        println!();
    }
}
