//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Number of blank markers in a question text.
/// A blank is a run of two or more underscores ("____").
pub fn count_blanks(text: &str) -> usize {
  let mut count = 0;
  let mut run = 0usize;
  for ch in text.chars().chain(std::iter::once(' ')) {
    if ch == '_' {
      run += 1;
    } else {
      if run >= 2 { count += 1; }
      run = 0;
    }
  }
  count
}

/// Log-safe truncation for large strings, cut on a char boundary.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
  match s.char_indices().nth(max_chars) {
    None => s.to_string(),
    Some((cut, _)) => format!("{}… ({} bytes total)", &s[..cut], s.len()),
  }
}
