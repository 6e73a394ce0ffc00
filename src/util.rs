use once_cell::sync::Lazy;
use regex::Regex;

static BOOK_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_-]").unwrap());
static FILE_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9._-]").unwrap());

/// Replaces every character outside `[a-zA-Z0-9_-]` with `_`, one for one.
pub fn sanitize_book_id(book_id: &str) -> String {
    BOOK_ID_RE.replace_all(book_id, "_").into_owned()
}

// только последний компонент пути; None если ничего не осталось
pub fn sanitize_file_name(file_name: &str) -> Option<String> {
    let cleaned = FILE_NAME_RE.replace_all(file_name, "_");
    // '/' уже заменён, но basename оставляем как в исходном контракте
    let base = cleaned.rsplit(['/', '\\']).next().unwrap_or("");
    if base.is_empty() || base.chars().all(|c| c == '.') {
        return None;
    }
    Some(base.to_string())
}

pub fn mask_secret(secret: &str) -> String {
    format!("<{} chars>", secret.chars().count())
}
