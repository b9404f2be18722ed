//! Relocation of a previously recorded source line in a changed file.
//!
//! Challenges record the text and number of their target line at creation.
//! Later edits shift or duplicate lines, so evaluation must find where the
//! recorded line lives now. The fallback by absolute line-number distance
//! is a deliberately approximate heuristic; ties resolve to the first
//! minimum in document order.

use crate::coverage::report::SourceLine;

/// Find the current element for a recorded line among `candidates`.
///
/// Preference order: the exact text-and-number pairing, then a unique line
/// with the same text, then the same-text line numerically nearest to the
/// recorded number. `None` means the target is no longer trackable and the
/// owning challenge must degrade to unsolvable, never guess.
pub fn relocate<'a>(
    original_text: &str,
    original_number: usize,
    candidates: &[&'a SourceLine],
) -> Option<&'a SourceLine> {
    let matching: Vec<&SourceLine> = candidates
        .iter()
        .copied()
        .filter(|line| line.text == original_text)
        .collect();

    if let Some(exact) = matching.iter().find(|line| line.number == original_number) {
        return Some(exact);
    }
    if matching.len() == 1 {
        return Some(matching[0]);
    }

    let mut nearest: Option<&SourceLine> = None;
    let mut best_distance = usize::MAX;
    for line in matching {
        let distance = line.number.abs_diff(original_number);
        if distance < best_distance {
            best_distance = distance;
            nearest = Some(line);
        }
    }
    nearest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::report::LineStatus;

    fn line(number: usize, text: &str) -> SourceLine {
        SourceLine {
            number,
            status: LineStatus::Missed,
            text: text.to_string(),
            title: None,
        }
    }

    #[test]
    fn exact_pairing_wins() {
        let lines = [line(3, "return x;"), line(7, "return x;")];
        let refs: Vec<&SourceLine> = lines.iter().collect();
        assert_eq!(relocate("return x;", 7, &refs).unwrap().number, 7);
    }

    #[test]
    fn unique_text_match_survives_a_shift() {
        let lines = [line(12, "let y = 0;"), line(19, "return x;")];
        let refs: Vec<&SourceLine> = lines.iter().collect();
        assert_eq!(relocate("return x;", 17, &refs).unwrap().number, 19);
    }

    #[test]
    fn ambiguity_resolves_to_nearest_first_minimum() {
        let lines = [line(4, "break;"), line(10, "break;"), line(16, "break;")];
        let refs: Vec<&SourceLine> = lines.iter().collect();
        // Distance 3 both ways; the first minimum in document order wins.
        assert_eq!(relocate("break;", 7, &refs).unwrap().number, 4);
        assert_eq!(relocate("break;", 15, &refs).unwrap().number, 16);
    }

    #[test]
    fn absent_text_is_not_trackable() {
        let lines = [line(4, "break;")];
        let refs: Vec<&SourceLine> = lines.iter().collect();
        assert!(relocate("continue;", 4, &refs).is_none());
        assert!(relocate("break;", 1, &Vec::new()).is_none());
    }
}
