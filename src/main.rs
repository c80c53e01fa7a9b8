#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;
extern crate env_logger;
extern crate monoid_segtree;
extern crate thiserror;

mod config;
mod script;

use crate::config::{Config, MonoidKind};
use crate::script::{ScriptError, ScriptValue};
use monoid_segtree::{Max, Min, Sum, Xor};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process;

fn run_with<V: ScriptValue>(config: &Config) -> Result<(), ScriptError> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    let interpreter = match &config.input_path {
        Some(path) => {
            trace!("reading script from {}", path);
            let file = File::open(path)?;
            script::run::<V, _, _>(BufReader::new(file), &mut out)?
        }
        None => {
            let stdin = io::stdin();
            script::run::<V, _, _>(stdin.lock(), &mut out)?
        }
    };

    if config.dump {
        match interpreter.tree() {
            Some(tree) => write!(out, "{}", tree.display())?,
            None => warn!("Nothing to dump"),
        }
    }

    out.flush()?;
    Ok(())
}

fn main() {
    env_logger::init();

    let matches = config::app().get_matches();
    let config = Config::from_matches(&matches);
    trace!("{:?}", config);

    let result = match config.monoid {
        MonoidKind::Sum => run_with::<Sum<i64>>(&config),
        MonoidKind::Min => run_with::<Min<i64>>(&config),
        MonoidKind::Max => run_with::<Max<i64>>(&config),
        MonoidKind::Xor => run_with::<Xor<i64>>(&config),
    };

    if let Err(err) = result {
        error!("{}", err);
        process::exit(1);
    }
}
