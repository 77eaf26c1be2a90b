// Finch: front end for the Finch language

use std::fs;
use std::io;
use std::process;

use finch::config::{Config, USAGE};
use finch::diagnostic::TerminalEmitter;
use finch::frontend::check_and_emit;
use finch::parser::dump::dump_module;

/// Install a tracing subscriber, but only when RUST_LOG asks for one.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() {
    init_tracing();

    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    if config.show_help {
        println!("{}", USAGE);
        return;
    }

    // from_args guarantees an input unless --help was given
    let Some(path) = config.input.clone() else {
        eprintln!("{}", USAGE);
        process::exit(1);
    };
    let filename = path.display().to_string();

    let source = if filename == "-" {
        io::read_to_string(io::stdin())
    } else {
        fs::read_to_string(&path)
    };
    let source = match source {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", filename, e);
            process::exit(1);
        }
    };

    let mut emitter = TerminalEmitter::stderr(config.color);
    match check_and_emit(&filename, &source, &config, &mut emitter) {
        Some(checked) => {
            if config.dump_tree {
                print!("{}", dump_module(&checked.module));
            }
            eprintln!(
                "{}: ok ({} functions, {} types)",
                filename,
                checked.module.functions.len(),
                checked.module.types.len()
            );
        }
        None => {
            eprintln!("{}: failed", filename);
            process::exit(1);
        }
    }
}
