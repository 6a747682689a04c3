//! File names of saved videos.

use regex_lite::Regex;

/// Characters that are unsafe in file names plus ASCII and full-width
/// punctuation.
const FORBIDDEN_PATTERN: &str = r#"[<>:"/\\|?*\[\].,!;，。！？；：]"#;

/// Reduces a prompt to a short, file-name-safe slice.
///
/// Forbidden characters are removed, whitespace runs become `_`, leading and
/// trailing `_` are trimmed and at most `max_chars` characters are kept.
pub fn sanitize_prompt(prompt: &str, max_chars: usize) -> String {
    let cleaned = match Regex::new(FORBIDDEN_PATTERN).ok() {
        Some(re) => re.replace_all(prompt, "").into_owned(),
        None => prompt.to_string(),
    };

    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    joined
        .trim_matches('_')
        .chars()
        .take(max_chars)
        .collect::<String>()
        .trim_end_matches('_')
        .to_string()
}

/// `{seq}_{slice}.{ext}`, or `{seq}.{ext}` when nothing of the prompt survives.
pub fn artifact_file_name(sequence: u32, prompt: &str, max_chars: usize, extension: &str) -> String {
    let slice = sanitize_prompt(prompt, max_chars);
    if slice.is_empty() {
        format!("{}.{}", sequence, extension)
    } else {
        format!("{}_{}.{}", sequence, slice, extension)
    }
}
