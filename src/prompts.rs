//! Prompt used by the vision-LLM OCR engine.
//!
//! Downstream parsing splits each line on whitespace into cells, so the
//! model is asked for raw reading-order lines and nothing else: no Markdown,
//! no commentary, no pipes.

/// System prompt for transcribing one scanned page into plain text lines.
pub const OCR_SYSTEM_PROMPT: &str = r#"You are an OCR engine. Transcribe every line of text visible in the page image.

Rules:
1. Output plain text only, one visual line of the page per output line, top to bottom.
2. Keep the words of a table row on one line, in left-to-right order, separated by single spaces.
3. Do not add Markdown, table pipes, bullet markers, code fences, or explanations.
4. Do not translate, correct, or summarise. Reproduce numbers and punctuation exactly.
5. If the page contains no legible text, output nothing."#;
