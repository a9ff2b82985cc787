//! Small utility helpers used across modules.

/// Very small string templating.
/// Replaces `{key}` placeholders for the provided keys in a single pass, so
/// substituted values are never re-scanned. Unknown `{...}` stays verbatim,
/// which keeps literal JSON braces in prompts intact.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let after = &rest[open + 1..];
    let value = after
      .find('}')
      .and_then(|close| pairs.iter().find(|(k, _)| *k == &after[..close]).map(|(_, v)| (close, *v)));
    match value {
      Some((close, v)) => {
        out.push_str(v);
        rest = &after[close + 1..];
      }
      None => {
        out.push('{');
        rest = after;
      }
    }
  }
  out.push_str(rest);
  out
}

/// Log-safe truncation for large strings (counts chars, not bytes).
pub fn trunc_for_log(s: &str, max: usize) -> String {
  match s.char_indices().nth(max) {
    Some((cut, _)) => format!("{}...", &s[..cut]),
    None => s.to_string(),
  }
}
