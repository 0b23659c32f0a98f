use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Instrument;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_gist::cli::{Cli, Commands, ReplCommand, REPL_HELP};
use video_gist::output::{self, SummaryReport};
use video_gist::{extract_video_id, utils, Config, Pipeline, Session, SubmitOutcome};

const BUSY_MESSAGE: &str = "Fetching transcript and generating summary...";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "video_gist=debug" } else { "video_gist=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Summarize { url, output, format } => {
            let pipeline = Pipeline::from_config(&config)?;
            let mut session = Session::new();

            let started = Instant::now();
            let progress = output::spinner(cli.quiet, BUSY_MESSAGE);
            let outcome = session.submit(&url, &pipeline).await;
            progress.finish_and_clear();

            match outcome {
                SubmitOutcome::Completed => {
                    tracing::info!("Finished in {}", utils::format_duration(started.elapsed().as_secs_f64()));
                    if let (Some(transcript), Some(summary)) = (session.transcript(), session.summary()) {
                        let report = SummaryReport::new(&url, transcript, summary);
                        match output {
                            Some(path) => {
                                output::save_to_file(&report, &path, &format).await?;
                                println!("Summary saved to: {}", path.display());
                            }
                            None => output::print_to_console(&report, &format)?,
                        }
                    }
                }
                SubmitOutcome::Failed(err) => {
                    output::print_error(&err.user_message());
                    std::process::exit(1);
                }
                SubmitOutcome::Unchanged => anyhow::bail!("No URL given"),
            }
        }
        Commands::Ask { url, question } => {
            let pipeline = Pipeline::from_config(&config)?;
            let progress = output::spinner(cli.quiet, "Fetching transcript and answering...");

            let result = async {
                pipeline.ensure_credentials()?;
                let transcript = pipeline.fetch_transcript(&url).await?;
                pipeline.answer_question(&transcript, &question, "").await
            }
            .await;
            progress.finish_and_clear();

            match result {
                Ok(answer) => println!("{}", answer.trim()),
                Err(err) => {
                    output::print_error(&err.user_message());
                    std::process::exit(1);
                }
            }
        }
        Commands::Interactive => {
            let pipeline = Pipeline::from_config(&config)?;
            run_interactive(&pipeline, cli.quiet).await?;
        }
        Commands::VideoId { url } => match extract_video_id(&url) {
            Some(id) => println!("{}", id),
            None => {
                output::print_error(&format!("No YouTube video id found in: {}", url));
                std::process::exit(1);
            }
        },
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                let path = match cli.config {
                    Some(path) => path,
                    None => Config::config_path()?,
                };
                println!("Configuration file: {}", path.display());
                println!("Edit it to change the model, caption languages or retry policy.");
            }
        }
    }

    Ok(())
}

/// Read URLs and `:` commands from stdin until `:quit` or EOF
async fn run_interactive(pipeline: &Pipeline, quiet: bool) -> Result<()> {
    let mut session = Session::new();
    let span = tracing::info_span!("session", id = %session.id());

    async move {
        let mut history = String::new();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("{}", REPL_HELP);
        prompt()?;

        while let Some(line) = lines.next_line().await? {
            match ReplCommand::parse(&line) {
                ReplCommand::Quit => break,
                ReplCommand::Empty => {}
                ReplCommand::Help => println!("{}", REPL_HELP),
                ReplCommand::Unknown(command) => {
                    output::print_error(&format!("Unknown command: {} (try :help)", command))
                }
                ReplCommand::ShowTranscript => match session.transcript() {
                    Some(transcript) => println!("{}", transcript),
                    None => output::print_error("No transcript loaded yet; paste a YouTube URL first."),
                },
                ReplCommand::Submit(url) => {
                    let progress = output::spinner(quiet, BUSY_MESSAGE);
                    let outcome = session.submit(url, pipeline).await;
                    progress.finish_and_clear();

                    match outcome {
                        SubmitOutcome::Completed => history.clear(),
                        SubmitOutcome::Unchanged => {}
                        SubmitOutcome::Failed(err) => output::print_error(&err.user_message()),
                    }

                    if let (Some(last_url), Some(summary)) = (session.last_url(), session.summary()) {
                        if last_url == url {
                            output::print_video_header(last_url);
                            println!("{}\n", summary.as_str().trim());
                        }
                    }
                }
                ReplCommand::Ask(question) => {
                    let progress = output::spinner(quiet, "Thinking...");
                    let result = session.ask(question, &history, pipeline).await;
                    progress.finish_and_clear();

                    match result {
                        Ok(answer) => {
                            println!("{}\n", answer.trim());
                            utils::append_chat_turn(&mut history, question, &answer);
                        }
                        Err(err) => output::print_error(&err.user_message()),
                    }
                }
            }
            prompt()?;
        }

        Ok(())
    }
    .instrument(span)
    .await
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}
