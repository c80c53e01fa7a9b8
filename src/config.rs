//! Defines data structures of command line arguments.

/// Which monoid the script's values are aggregated with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonoidKind {
    Sum,
    Min,
    Max,
    Xor,
}

impl MonoidKind {
    pub const NAMES: &'static [&'static str] = &["sum", "min", "max", "xor"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sum" => Some(MonoidKind::Sum),
            "min" => Some(MonoidKind::Min),
            "max" => Some(MonoidKind::Max),
            "xor" => Some(MonoidKind::Xor),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub input_path: Option<String>,
    pub monoid: MonoidKind,
    pub dump: bool,
}

/// Builds CLI app metadata, especially command line arguments format.
pub fn app() -> clap::App<'static, 'static> {
    let settings = {
        use clap::AppSettings::*;
        [GlobalVersion]
    };
    clap::App::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .settings(&settings)
        .arg(
            clap::Arg::with_name("monoid")
                .long("monoid")
                .short("m")
                .takes_value(true)
                .number_of_values(1)
                .possible_values(MonoidKind::NAMES)
                .default_value("sum")
                .help("Monoid to aggregate values with"),
        )
        .arg(
            clap::Arg::with_name("dump")
                .long("dump")
                .help("Print every tree level after the script finishes"),
        )
        .arg(
            clap::Arg::with_name("input")
                .takes_value(true)
                .help("Script file (defaults to stdin)"),
        )
}

impl Config {
    pub fn from_matches(gm: &clap::ArgMatches) -> Self {
        let monoid = match gm.value_of("monoid") {
            None => MonoidKind::Sum,
            Some(name) => MonoidKind::from_name(name).unwrap_or_else(|| {
                error!("unknown monoid {:?}", name);
                MonoidKind::Sum
            }),
        };

        let input_path = gm.value_of("input").map(|s| s.to_owned());

        let dump = gm.is_present("dump");

        Config {
            input_path,
            monoid,
            dump,
        }
    }
}
