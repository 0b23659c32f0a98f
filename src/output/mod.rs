use crate::Result;
use chrono::{DateTime, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use crate::cli::OutputFormat;
use crate::extractors::{extract_video_id, Transcript, VideoId};
use crate::summarize::Summary;

/// Everything shown for one processed video
#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    pub url: &'a str,
    pub video_id: Option<VideoId>,
    pub summary: &'a str,
    pub transcript_chars: usize,
    pub transcript_truncated: bool,
    pub generated_at: DateTime<Utc>,
}

impl<'a> SummaryReport<'a> {
    pub fn new(url: &'a str, transcript: &Transcript, summary: &'a Summary) -> Self {
        Self {
            url,
            video_id: extract_video_id(url),
            summary: summary.as_str(),
            transcript_chars: transcript.char_count(),
            transcript_truncated: transcript.is_truncated(),
            generated_at: Utc::now(),
        }
    }
}

/// Render the report as Markdown: a video block followed by the model output
pub fn format_as_markdown(report: &SummaryReport) -> String {
    let mut out = String::from("## Video Content\n\n");
    out.push_str(&format!("<{}>\n\n", report.url));

    if let Some(id) = &report.video_id {
        out.push_str(&format!("[![thumbnail]({})]({})\n\n", id.thumbnail_url(), id.watch_url()));
    }

    if report.transcript_truncated {
        out.push_str("_Transcript was truncated before summarizing._\n\n");
    }

    out.push_str(report.summary.trim());
    out.push('\n');
    out
}

/// Render the report as pretty JSON
pub fn format_as_json(report: &SummaryReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn render(report: &SummaryReport, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(format_as_markdown(report)),
        OutputFormat::Json => format_as_json(report),
    }
}

/// Save summary report to file
pub async fn save_to_file(report: &SummaryReport<'_>, path: &Path, format: &OutputFormat) -> Result<()> {
    let content = render(report, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print summary report to console
pub fn print_to_console(report: &SummaryReport, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Markdown => {
            print_video_header(report.url);
            if report.transcript_truncated {
                println!("{}", style("(transcript truncated before summarizing)").dim());
            }
            println!("{}", report.summary.trim());
        }
        OutputFormat::Json => println!("{}", format_as_json(report)?),
    }
    Ok(())
}

/// Stand-in for the embedded player: the URL plus watch and thumbnail links
pub fn print_video_header(url: &str) {
    println!("{}", style("Video Content").bold().underlined());
    println!("  {}", url);
    if let Some(id) = extract_video_id(url) {
        println!("  {} {}", style("Watch:").dim(), id.watch_url());
        println!("  {} {}", style("Thumbnail:").dim(), id.thumbnail_url());
    }
    println!();
}

/// Print a user-facing error line to stderr
pub fn print_error(message: &str) {
    eprintln!("{}", style(message).red().bold());
}

/// Busy indicator shown while a submission is in flight
pub fn spinner(quiet: bool, message: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message(message.to_string());
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report<'a>(url: &'a str, summary: &'a Summary, transcript: &Transcript) -> SummaryReport<'a> {
        SummaryReport::new(url, transcript, summary)
    }

    #[test]
    fn test_markdown_has_video_block_and_summary() {
        let transcript = Transcript::from("words".to_string());
        let summary = Summary::from("| A | B |\n|---|---|\n".to_string());
        let markdown = format_as_markdown(&report("https://youtu.be/abc123", &summary, &transcript));

        assert!(markdown.starts_with("## Video Content\n\n<https://youtu.be/abc123>\n\n"));
        assert!(markdown.contains("https://img.youtube.com/vi/abc123/hqdefault.jpg"));
        assert!(markdown.ends_with("| A | B |\n|---|---|\n"));
        assert!(!markdown.contains("truncated"));
    }

    #[test]
    fn test_json_report_fields() {
        let transcript = Transcript::from("four".to_string());
        let summary = Summary::from("The gist.".to_string());
        let json = format_as_json(&report("https://www.youtube.com/watch?v=xyz789", &summary, &transcript)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["video_id"], "xyz789");
        assert_eq!(value["summary"], "The gist.");
        assert_eq!(value["transcript_chars"], 4);
        assert_eq!(value["transcript_truncated"], false);
        assert!(value["generated_at"].is_string());
    }

    #[tokio::test]
    async fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");
        let transcript = Transcript::from("words".to_string());
        let summary = Summary::from("The gist.".to_string());

        save_to_file(&report("https://youtu.be/abc123", &summary, &transcript), &path, &OutputFormat::Markdown)
            .await
            .unwrap();

        let written = fs_err::read_to_string(&path).unwrap();
        assert!(written.contains("The gist."));
    }
}
