use std::path::PathBuf;

use clap::Parser;

use crate::vector::VectorChordModule;

/// Type-check SQL files written against the VectorChord dialect
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "vchord")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// SQL files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Dialect modules to layer over the base grammar, lowest first
    #[arg(
        short,
        long = "module",
        value_delimiter = ',',
        default_value = VectorChordModule::NAME,
        env = "VCHORD_MODULES"
    )]
    pub modules: Vec<String>,

    /// Layer every linked module, in name order
    #[arg(short, long)]
    pub all_modules: bool,

    /// Print the report as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl Config {
    pub fn from_args() -> Self {
        Config::parse()
    }

    /// Module names to load, `None` meaning all of them
    pub fn enabled_modules(&self) -> Option<&[String]> {
        if self.all_modules {
            None
        } else {
            Some(&self.modules)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            files: Vec::new(),
            modules: vec![VectorChordModule::NAME.to_string()],
            all_modules: false,
            json: false,
        }
    }
}
