//! Selector renaming for `auto_rename`

const DIRECTION_WORDS: &[(&str, &str)] = &[
    ("left", "right"),
    ("Left", "Right"),
    ("LEFT", "RIGHT"),
    ("ltr", "rtl"),
    ("Ltr", "Rtl"),
    ("LTR", "RTL"),
];

/// Swaps paired words inside selectors in a single pass, so `left` and
/// `right` trade places instead of both ending up as one of them.
#[derive(Debug, Clone)]
pub(crate) struct Renamer {
    /// Both directions of every pair, longest search text first
    swaps: Vec<(String, String)>,
}

impl Renamer {
    pub(crate) fn new(string_map: &[(String, String)]) -> Self {
        let mut swaps = Vec::new();
        let builtin = DIRECTION_WORDS
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()));
        for (a, b) in builtin.chain(string_map.iter().cloned()) {
            if a.is_empty() || b.is_empty() || a == b {
                continue;
            }
            swaps.push((b.clone(), a.clone()));
            swaps.push((a, b));
        }
        swaps.sort_by(|x, y| y.0.len().cmp(&x.0.len()));
        Self { swaps }
    }

    /// The renamed selector, or `None` when no word matched.
    ///
    /// A word only matches when it is not glued to other letters:
    /// `.pull-left` matches, `.leftover` does not.
    pub(crate) fn rename(&self, selector: &str) -> Option<String> {
        let mut out = String::with_capacity(selector.len());
        let mut changed = false;
        let mut idx = 0;
        while let Some(c) = selector[idx..].chars().next() {
            if !letter_before(selector, idx) {
                let rest = &selector[idx..];
                let hit = self.swaps.iter().find(|(from, _)| {
                    rest.starts_with(from.as_str()) && !letter_at(selector, idx + from.len())
                });
                if let Some((from, to)) = hit {
                    out.push_str(to);
                    idx += from.len();
                    changed = true;
                    continue;
                }
            }
            out.push(c);
            idx += c.len_utf8();
        }
        changed.then_some(out)
    }
}

fn letter_before(text: &str, idx: usize) -> bool {
    text[..idx]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_alphabetic())
}

fn letter_at(text: &str, idx: usize) -> bool {
    text[idx..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_words() {
        let renamer = Renamer::new(&[]);
        assert_eq!(
            renamer.rename(".pull-left > .ltr").as_deref(),
            Some(".pull-right > .rtl")
        );
        assert_eq!(
            renamer.rename(".left, .right").as_deref(),
            Some(".right, .left")
        );
        assert_eq!(renamer.rename("[dir=LTR] .Left").as_deref(), Some("[dir=RTL] .Right"));
        assert_eq!(renamer.rename(".leftover, .bright"), None);
    }

    #[test]
    fn test_string_map() {
        let map = vec![("prev".to_string(), "next".to_string())];
        let renamer = Renamer::new(&map);
        assert_eq!(
            renamer.rename(".prev-btn, .next").as_deref(),
            Some(".next-btn, .prev")
        );
    }
}
