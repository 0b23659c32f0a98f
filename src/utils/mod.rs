/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Append one question/answer exchange to a plain-text chat history
pub fn append_chat_turn(history: &mut String, question: &str, answer: &str) {
    if !history.is_empty() {
        history.push('\n');
    }
    history.push_str("User: ");
    history.push_str(question.trim());
    history.push_str("\nAssistant: ");
    history.push_str(answer.trim());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(3661.0), "1h 1m 1s");
    }

    #[test]
    fn test_append_chat_turn() {
        let mut history = String::new();
        append_chat_turn(&mut history, "Who? ", " Alice.\n");
        append_chat_turn(&mut history, "Why?", "Because.");
        assert_eq!(history, "User: Who?\nAssistant: Alice.\nUser: Why?\nAssistant: Because.");
    }
}
