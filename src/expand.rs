//! History references: `!!`, `!N` and `!-N`.

use crate::error::ShellError;
use crate::history::HistoryLog;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// `!!`, or `!` with an optionally negative decimal event number.
static EVENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!(?:!|(-)?([0-9]+))").expect("event pattern is valid"));

/// Replace every history reference in `line` with the entry it designates.
///
/// References are resolved left to right against `history`, which is never
/// modified. Substituted text is not scanned again. Any `!` that does not
/// start a valid reference fails with [`ShellError::EventNotFound`], and so
/// does a reference outside the log.
pub fn expand_history(line: &str, history: &HistoryLog) -> Result<String, ShellError> {
    let mut expanded = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(bang) = rest.find('!') {
        expanded.push_str(&rest[..bang]);
        let tail = &rest[bang..];

        let Some(caps) = EVENT.captures(tail) else {
            let word_end = tail.find(char::is_whitespace).unwrap_or(tail.len());
            return Err(ShellError::EventNotFound(tail[..word_end].to_string()));
        };

        let reference = &caps[0];
        let entry = resolve_event(&caps, history)
            .ok_or_else(|| ShellError::EventNotFound(reference.to_string()))?;
        expanded.push_str(entry);
        rest = &tail[reference.len()..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

fn resolve_event<'h>(caps: &Captures<'_>, history: &'h HistoryLog) -> Option<&'h str> {
    let Some(number) = caps.get(2) else {
        return history.last();
    };
    let n = isize::try_from(number.as_str().parse::<usize>().ok()?).ok()?;
    if n == 0 {
        return None;
    }
    if caps.get(1).is_some() {
        history.get(-n)
    } else {
        history.get(n - 1)
    }
}
