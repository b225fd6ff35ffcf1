//! Path segment slugs.

use std::collections::HashSet;

/// Segment used when a name has no sluggable characters.
pub const EMPTY_SLUG: &str = "untitled";

/// Turn a display name into a lowercase ASCII path segment.
///
/// Common accented Latin letters are transliterated, every other run of
/// non-alphanumeric characters collapses to a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        let mapped = match c {
            'a'..='z' | '0'..='9' => None,
            _ => match transliterate(c) {
                "" => {
                    pending_dash = true;
                    continue;
                }
                latin => Some(latin),
            },
        };
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        match mapped {
            Some(latin) => slug.push_str(latin),
            None => slug.push(c),
        }
    }

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

pub(crate) fn transliterate(c: char) -> &'static str {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'ł' | 'ľ' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ß' => "ss",
        'ś' | 'š' | 'ş' => "s",
        'ť' | 'ţ' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => "",
    }
}

/// Hands out paths that are unique within one batch of generated folders.
///
/// The first folder to claim a path keeps it; later siblings with the same
/// slug get `-1`, `-2`, and so on.
#[derive(Debug, Default)]
pub struct PathAllocator {
    taken: HashSet<String>,
}

impl PathAllocator {
    /// Create an allocator with nothing claimed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the first free variant of `path`.
    pub fn claim(&mut self, path: String) -> String {
        if self.taken.insert(path.clone()) {
            return path;
        }
        let mut suffix = 1u32;
        loop {
            let candidate = format!("{path}-{suffix}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Q1 Reports"), "q1-reports");
        assert_eq!(slugify("  Legal & Compliance  "), "legal-compliance");
        assert_eq!(slugify("Finance"), "finance");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("Übersicht Größe"), "ubersicht-grosse");
        assert_eq!(slugify("Café Société"), "cafe-societe");
    }

    #[test]
    fn test_slugify_empty_becomes_untitled() {
        assert_eq!(slugify(""), "untitled");
        assert_eq!(slugify("***"), "untitled");
        assert_eq!(slugify("日本"), "untitled");
    }

    #[test]
    fn test_allocator_suffixes_duplicates() {
        let mut paths = PathAllocator::new();
        assert_eq!(paths.claim("/reports".to_string()), "/reports");
        assert_eq!(paths.claim("/reports".to_string()), "/reports-1");
        assert_eq!(paths.claim("/reports".to_string()), "/reports-2");
        assert_eq!(paths.claim("/legal".to_string()), "/legal");
    }
}
