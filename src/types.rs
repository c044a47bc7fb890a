use colored::Colorize;
use serde::Serialize;
use strsim::jaro_winkler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFmt {
    Text,
    Json,
}

/// Prints `payload` as pretty JSON when `--json` was given, otherwise runs
/// the colorful text renderer.
pub fn emit<T: Serialize>(fmt: OutputFmt, payload: &T, pretty: impl FnOnce()) {
    match fmt {
        OutputFmt::Json => match serde_json::to_string_pretty(payload) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("{} failed to serialize output: {}", "error:".red().bold(), e),
        },
        OutputFmt::Text => pretty(),
    }
}

/// Return the closest candidate for `input`
/// if similarity ≥ 0.80 *and* clearly better than the runner-up.
/// Otherwise return `None` (no suggestion shown).
pub fn best_name_suggestion<'a>(input: &str, candidates: &'a [String]) -> Option<&'a str> {
    let inp = input.to_ascii_lowercase();
    if inp.trim().is_empty() || candidates.is_empty() {
        return None;
    }

    // Collect (candidate, score) pairs, highest score first.
    let mut scores: Vec<(&'a str, f64)> = candidates
        .iter()
        .map(|c| (c.as_str(), jaro_winkler(&inp, &c.to_ascii_lowercase())))
        .collect();
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

    let (best, best_score) = scores[0];
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    // Tune these two constants to taste.
    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    if best_score >= MIN_SCORE && best_score - second_score >= GAP {
        Some(best)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["push-pull-legs".into(), "upper-lower".into(), "full-body".into()]
    }

    #[test]
    fn close_typo_gets_a_suggestion() {
        assert_eq!(
            best_name_suggestion("push-pul-legs", &names()),
            Some("push-pull-legs")
        );
    }

    #[test]
    fn distant_input_gets_nothing() {
        assert_eq!(best_name_suggestion("zzzzzz", &names()), None);
        assert_eq!(best_name_suggestion("  ", &names()), None);
        assert_eq!(best_name_suggestion("upper", &[]), None);
    }
}
