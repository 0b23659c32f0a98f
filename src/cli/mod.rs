use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gist",
    about = "Video Gist - Summarize YouTube videos from their captions with a generative model",
    version,
    long_about = "Fetches the English captions of a YouTube video and asks a Google Generative Language model for either a Markdown comparison table or a short gist. Follow-up questions are answered from the transcript alone."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./config.yaml or the user config dir)
    #[arg(short, long, global = true, value_name = "FILE", env = "VIDEO_GIST_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize a YouTube video
    Summarize {
        /// YouTube URL (watch, youtu.be, embed or /v/ link)
        #[arg(value_name = "URL")]
        url: String,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: OutputFormat,
    },

    /// Ask a single question about a video's transcript
    Ask {
        /// YouTube URL
        #[arg(value_name = "URL")]
        url: String,

        /// The question to answer from the transcript
        #[arg(value_name = "QUESTION")]
        question: String,
    },

    /// Start an interactive session: paste URLs, then ask questions
    Interactive,

    /// Print the video identifier extracted from a URL
    VideoId {
        /// YouTube URL
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Show or create the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Markdown with a video block
    Markdown,
    /// JSON report
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// One line typed into the interactive session
#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand<'a> {
    /// A URL to summarize
    Submit(&'a str),
    /// `:ask <question>`
    Ask(&'a str),
    /// `:transcript`
    ShowTranscript,
    /// `:help`
    Help,
    /// `:quit` / `:q` / `:exit`
    Quit,
    /// Blank line
    Empty,
    /// An unknown `:` command
    Unknown(&'a str),
}

impl<'a> ReplCommand<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }

        let Some(command) = line.strip_prefix(':') else {
            return ReplCommand::Submit(line);
        };

        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map(|(name, rest)| (name, rest.trim()))
            .unwrap_or((command, ""));

        match name {
            "ask" | "a" if !rest.is_empty() => ReplCommand::Ask(rest),
            "transcript" | "t" => ReplCommand::ShowTranscript,
            "help" | "h" => ReplCommand::Help,
            "quit" | "q" | "exit" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line),
        }
    }
}

pub const REPL_HELP: &str = "\
Paste a YouTube URL to summarize it. Commands:
  :ask <question>   ask about the current video
  :transcript       print the current transcript
  :help             show this help
  :quit             leave the session";
