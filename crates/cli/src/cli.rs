use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// A JSON object of word readings to read kanji with.
    #[arg(short, long, global = true)]
    pub dictionary: Option<PathBuf>,
    /// The path to the ichiran-cli binary to read kanji with.
    #[arg(short, long, global = true, env = "ICHIRAN_CLI_PATH")]
    pub ichiran: Option<PathBuf>,
    /// The API key for the AI oracle.
    #[arg(long, global = true, env = "KASHI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// The model the AI oracle should use.
    #[arg(long, global = true, env = "KASHI_MODEL")]
    pub model: Option<String>,
    /// The base URL of the AI oracle.
    #[arg(
        long,
        global = true,
        env = "KASHI_ORACLE_URL",
        default_value = crate::oracle::DEFAULT_URL
    )]
    pub oracle_url: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parses lyrics and prints every line with its readings.
    Parse {
        /// The path to the lyrics.
        file: PathBuf,
        /// Lets the AI oracle refine the result.
        #[arg(short, long)]
        ai: bool,
        /// Prints the whole result as JSON.
        #[arg(short, long)]
        json: bool,
    },
    /// Prints the kanji of the lyrics as a quiz with multiple-choice answers.
    Quiz {
        /// The path to the lyrics.
        file: PathBuf,
        /// The maximum number of questions.
        #[arg(short, long)]
        limit: Option<usize>,
        /// Starts with the hardest kanji.
        #[arg(long)]
        hard: bool,
        /// The number of answers per question, including the correct one.
        #[arg(short, long, default_value_t = kashi::quiz::DEFAULT_OPTION_COUNT)]
        options: usize,
        /// Kanji to leave out of the quiz.
        #[arg(short, long)]
        exclude: Vec<String>,
    },
    /// Prints token statistics for the lyrics.
    Stats {
        /// The path to the lyrics.
        file: PathBuf,
        /// Prints the statistics as JSON.
        #[arg(short, long)]
        json: bool,
    },
    /// Asks the AI oracle about a kanji in the lyrics.
    Lookup {
        /// The path to the lyrics.
        file: PathBuf,
        /// The text of the token to look up, the first match is used.
        text: String,
    },
}
