//! Plain-text rendering for the terminal.

use std::fmt::Write;

use archive_chat::HistoryPage;
use archive_client::{ContractPage, ContractRecord, OcrStatusReport, SearchPage};
use archive_core::{ChatMessage, ChatRole, DocumentGroup, FeedbackValue};

/// Replace search-engine highlight tags with brackets.
pub fn terminal_text(text: &str) -> String {
    text.replace("<em>", "[").replace("</em>", "]")
}

pub fn welcome() -> &'static str {
    "Ask a question about your contracts. /help lists commands."
}

pub fn help() -> &'static str {
    "\
  <question>        ask
  /new              start a new conversation
  /history [page]   list stored sessions
  /open <n|id>      open a session from the last listing or by id
  /delete <n|id>    delete a session
  /good <n>         rate the n-th answer helpful
  /bad <n>          rate the n-th answer not helpful
  /doc <n>          show document group n of the last answer
  /hit <n>          highlight hit n of the shown document
  /quit             leave"
}

/// A chat message with its document groups, numbered from 1.
pub fn message(message: &ChatMessage, feedback: Option<FeedbackValue>) -> String {
    let mut out = String::new();
    let who = match message.role {
        ChatRole::User => "you",
        ChatRole::Assistant => "archive",
    };
    let _ = writeln!(
        out,
        "[{}] {}: {}",
        message.timestamp.format("%H:%M"),
        who,
        message.text
    );

    if let Some(groups) = message.document_groups.as_ref().filter(|g| !g.is_empty()) {
        for (i, group) in groups.iter().enumerate() {
            let _ = writeln!(out, "  {}", group_line(i + 1, group));
        }
    }
    if let Some(value) = feedback {
        let _ = writeln!(out, "  (rated {})", value.as_str());
    }
    out
}

fn group_line(number: usize, group: &DocumentGroup) -> String {
    let mut line = format!("[{}] {}", number, display_or(&group.file_name, "(unnamed)"));
    if !group.contract_name.is_empty() {
        let _ = write!(line, "  {}", group.contract_name);
    }
    if !group.contract_number.is_empty() {
        let _ = write!(line, " ({})", group.contract_number);
    }
    let _ = write!(
        line,
        "  relevance {:.2}, {} hit{}",
        group.total_relevance,
        group.hits.len(),
        if group.hits.len() == 1 { "" } else { "s" }
    );
    line
}

/// Hits of one document, the highlighted one marked with `>`.
pub fn document(group: &DocumentGroup, highlight: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", display_or(&group.file_name, "(unnamed)"));
    if let Some(id) = group.contract_id {
        let _ = writeln!(out, "  contract #{}  {}", id, group.contract_name);
    }
    for (i, hit) in group.hits.iter().enumerate() {
        let marker = if i == highlight { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{} {}. [{:.2}] {}",
            marker,
            i + 1,
            hit.relevance_score,
            terminal_text(hit.display_text())
        );
    }
    out
}

pub fn sessions(page: &HistoryPage) -> String {
    if page.sessions.is_empty() {
        return "No stored sessions.\n".to_string();
    }
    let mut out = String::new();
    for (i, s) in page.sessions.iter().enumerate() {
        let title = s.title.as_deref().unwrap_or(&s.first_message);
        let _ = writeln!(
            out,
            "{:>3}. {}  {}  ({} messages, {})",
            i + 1,
            s.session_id,
            display_or(title, "(untitled)"),
            s.message_count,
            s.created_at.as_deref().unwrap_or("-")
        );
    }
    let _ = writeln!(out, "page {} ({} sessions total)", page.page, page.total);
    out
}

pub fn contracts(page: &ContractPage) -> String {
    let mut out = String::new();
    for c in &page.contracts {
        let _ = writeln!(
            out,
            "{:>5}  {:<12} {:<30} ocr:{}",
            c.id, c.contract_number, c.contract_name, c.ocr_status
        );
    }
    let _ = writeln!(out, "page {} of {} contracts", page.page, page.total);
    out
}

pub fn contract(c: &ContractRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {} ({})", c.id, c.contract_name, c.contract_number);
    let _ = writeln!(out, "  file:     {}", c.file_name);
    if let Some(ref t) = c.contract_type {
        let _ = writeln!(out, "  type:     {}", t);
    }
    if let Some(ref uploaded) = c.upload_time {
        let _ = writeln!(out, "  uploaded: {}", uploaded);
    }
    let _ = writeln!(
        out,
        "  ocr: {}  content: {}  vector: {}  index: {}",
        c.ocr_status, c.content_status, c.vector_status, c.elasticsearch_sync_status
    );
    out
}

/// OCR status, including the raw backend error of a failed run.
pub fn ocr_status(report: &OcrStatusReport) -> String {
    let mut out = format!(
        "contract #{}  ocr: {}  content: {}  vector: {}\n",
        report.contract_id, report.ocr_status, report.content_status, report.vector_status
    );
    if let Some(ref error) = report.ocr_error {
        let _ = writeln!(out, "  error: {}", error);
    }
    out
}

pub fn search(page: &SearchPage) -> String {
    let mut out = String::new();
    for (i, doc) in page.documents.iter().enumerate() {
        let score = doc
            .similarity
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "{:>3}. [{}] {} ({})", i + 1, score, doc.title, doc.id);
        for h in &doc.highlights {
            let _ = writeln!(out, "       {}", terminal_text(h));
        }
    }
    let _ = writeln!(
        out,
        "{} result(s) for \"{}\" in {:.2}s",
        page.total, page.query, page.search_time
    );
    out
}

fn display_or<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.trim().is_empty() {
        fallback
    } else {
        text
    }
}
