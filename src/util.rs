//! Small string helpers used across modules.

/// Escape the five HTML-significant characters.
/// Stored names and descriptions are always escaped before validation.
pub fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#x27;"),
      c => out.push(c),
    }
  }
  out
}

/// Replace every run of two or more spaces with a single one.
pub fn collapse_spaces(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut prev_space = false;
  for ch in s.chars() {
    if ch == ' ' {
      if !prev_space {
        out.push(ch);
      }
      prev_space = true;
    } else {
      out.push(ch);
      prev_space = false;
    }
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}
