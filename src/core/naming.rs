//! Name generation.
//!
//! Turns a source file name into a candidate output name. Rules are applied
//! in a fixed order: sequential numbering, added string, search edit, then
//! the extension.

use crate::models::item::Category;
use crate::models::rules::{AddPosition, RuleSet, SearchAction};
use crate::utils::fs::{join_name, split_name};
use std::cmp::Ordering;

/// One piece of a natural sort key.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Number(&'a str),
    Text(String),
}

fn segments(s: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;
    for (idx, ch) in s.char_indices() {
        let digit = ch.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != digit => {
                out.push(segment(&s[start..idx], prev));
                start = idx;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }
    if let Some(prev) = in_digits {
        out.push(segment(&s[start..], prev));
    }
    out
}

fn segment(s: &str, digits: bool) -> Segment<'_> {
    if digits {
        let trimmed = s.trim_start_matches('0');
        Segment::Number(if trimmed.is_empty() { "0" } else { trimmed })
    } else {
        Segment::Text(s.to_lowercase())
    }
}

fn cmp_segment(a: &Segment<'_>, b: &Segment<'_>) -> Ordering {
    match (a, b) {
        // Digit runs of any length compare by value without overflowing.
        (Segment::Number(x), Segment::Number(y)) => x.len().cmp(&y.len()).then_with(|| x.cmp(y)),
        (Segment::Text(x), Segment::Text(y)) => x.cmp(y),
        (Segment::Number(_), Segment::Text(_)) => Ordering::Less,
        (Segment::Text(_), Segment::Number(_)) => Ordering::Greater,
    }
}

/// Compare two strings in natural order.
///
/// Digit runs compare as integers and text compares case-insensitively.
/// Ties fall back to plain byte order so the ordering is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let sa = segments(a);
    let sb = segments(b);
    for (x, y) in sa.iter().zip(sb.iter()) {
        let ord = cmp_segment(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    sa.len().cmp(&sb.len()).then_with(|| a.cmp(b))
}

/// Candidate base name and extension for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateName {
    pub base: String,
    pub extension: Option<String>,
}

impl CandidateName {
    pub fn file_name(&self) -> String {
        join_name(&self.base, self.extension.as_deref())
    }
}

/// Produce the candidate name for a file.
///
/// `ordinal` is the zero-based position of the item among items of the same
/// category in its destination-folder group, in natural order of source
/// paths. It is ignored when numbering is disabled for `category`.
pub fn generate_name(
    file_name: &str,
    category: Category,
    ordinal: u64,
    rules: &RuleSet,
) -> CandidateName {
    let (base, ext) = split_name(file_name);
    let mut base = base.to_string();

    if let Some(rule) = rules.numbering.for_category(category) {
        let counter = rule.start.saturating_add(ordinal);
        base = format!("{}{:0width$}", rule.prefix, counter, width = rule.digits);
    }

    if let Some(add) = rules.add.as_ref().filter(|a| !a.text.is_empty()) {
        base = match add.position {
            AddPosition::Prefix => format!("{}{}", add.text, base),
            AddPosition::Suffix => format!("{}{}", base, add.text),
        };
    }

    if let Some(search) = rules.search.as_ref().filter(|s| !s.pattern.is_empty()) {
        base = match &search.action {
            SearchAction::Delete => base.replace(&search.pattern, ""),
            SearchAction::Replace(with) => base.replace(&search.pattern, with),
        };
    }

    let extension = rules
        .target_extension()
        .or_else(|| ext.map(|e| e.to_lowercase()));

    CandidateName { base, extension }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rules::{AddRule, NumberingRule, SearchRule};

    fn numbered(prefix: &str, digits: usize, start: u64) -> RuleSet {
        let mut rules = RuleSet::default();
        rules.numbering.image = Some(NumberingRule {
            prefix: prefix.to_string(),
            digits,
            start,
        });
        rules
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("a2.jpg", "a10.jpg"), Ordering::Less);
        assert_eq!(natural_cmp("a10.jpg", "a1.jpg"), Ordering::Greater);
        assert_eq!(natural_cmp("A1", "a2"), Ordering::Less);
        assert_eq!(natural_cmp("img007", "img7"), Ordering::Less);
        assert_eq!(natural_cmp("x", "x"), Ordering::Equal);
        assert_eq!(
            natural_cmp("f99999999999999999999999", "f100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn test_natural_sort_list() {
        let mut names = vec!["a10.jpg", "a2.jpg", "a1.jpg", "B1.jpg"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["a1.jpg", "a2.jpg", "a10.jpg", "B1.jpg"]);
    }

    #[test]
    fn test_empty_rules_keep_name() {
        let name = generate_name("Holiday.JPG", Category::Image, 0, &RuleSet::default());
        assert_eq!(name.file_name(), "Holiday.jpg");
    }

    #[test]
    fn test_numbering() {
        let rules = numbered("p", 3, 1);
        assert_eq!(
            generate_name("a10.jpg", Category::Image, 2, &rules).file_name(),
            "p003.jpg"
        );
        // Videos are not numbered by an image rule.
        assert_eq!(
            generate_name("clip.mp4", Category::Video, 0, &rules).file_name(),
            "clip.mp4"
        );
    }

    #[test]
    fn test_add_then_search() {
        let mut rules = numbered("img", 2, 5);
        rules.add = Some(AddRule {
            text: "_trip".to_string(),
            position: AddPosition::Suffix,
        });
        rules.search = Some(SearchRule {
            pattern: "img".to_string(),
            action: SearchAction::Replace("pic".to_string()),
        });
        assert_eq!(
            generate_name("x.png", Category::Image, 0, &rules).file_name(),
            "pic05_trip.png"
        );
    }

    #[test]
    fn test_search_delete_and_prefix() {
        let mut rules = RuleSet::default();
        rules.add = Some(AddRule {
            text: "2024_".to_string(),
            position: AddPosition::Prefix,
        });
        rules.search = Some(SearchRule {
            pattern: " copy".to_string(),
            action: SearchAction::Delete,
        });
        assert_eq!(
            generate_name("cat copy copy.txt", Category::Other, 0, &rules).file_name(),
            "2024_cat.txt"
        );
    }

    #[test]
    fn test_target_format_override() {
        let mut rules = RuleSet::default();
        rules.target_format = Some("WEBP".to_string());
        assert_eq!(
            generate_name("a.PNG", Category::Image, 0, &rules).file_name(),
            "a.webp"
        );
        assert_eq!(
            generate_name("noext", Category::Other, 0, &rules).file_name(),
            "noext.webp"
        );
    }
}
