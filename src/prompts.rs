//! Prompt templates sent to the model.

/// Build the summary prompt: a comparison table or a single gist paragraph.
pub fn build_summary_prompt(transcript: &str) -> String {
    format!(
        "You are a helpful assistant that summarizes YouTube videos.\n\
Here is the transcript of a video:\n\
\n\
\"{transcript}\"\n\
\n\
Analyze the content to determine if this is a COMPARISON video or a SINGLE TOPIC video.\n\
\n\
CRITICAL INSTRUCTION: Analyze the video type.\n\
- IF it is a COMPARISON video: Output ONLY a Markdown comparison table (rows=features, cols=items).\n\
- IF it is a SINGLE TOPIC video: Output ONLY a concise \"Gist\" paragraph of the main message.\n\
\n\
Do NOT output any labels like \"If COMPARISON\" or \"Analysis\". Just output the Table or the Text.\n"
    )
}

/// Build the question-answering prompt. `chat_history` may be empty.
pub fn build_question_prompt(transcript: &str, question: &str, chat_history: &str) -> String {
    format!(
        "You are a helpful assistant. You have been provided with the transcript of a video.\n\
\n\
Video Transcript:\n\
\"{transcript}\"\n\
\n\
Chat History:\n\
{chat_history}\n\
\n\
User Question: {question}\n\
\n\
Answer the user's question based strictly on the video content provided above.\n"
    )
}
