//! Command line of the `receiver` binary.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Debug, Parser)]
#[command(name = "receiver")]
#[command(about = "Receive Kafka GCN messages and process these", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short = 'c', long = "configfile", default_value = "config.toml")]
    pub configfile: PathBuf,

    /// Verbosity level, repeat to increase verbosity
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Test message to process instead of polling the broker
    #[arg(short = 't', long = "test_message")]
    pub test_message: Option<String>,

    /// Topic the test message is attributed to; the format is sniffed when absent
    #[arg(long = "test_topic", requires = "test_message")]
    pub test_topic: Option<String>,
}
