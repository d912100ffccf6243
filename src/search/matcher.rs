//! Keyword matchers used as filter predicates

use std::cell::RefCell;

use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use serde::{Deserialize, Serialize};

thread_local! {
    // The matcher keeps scratch memory; one per scanning thread
    static FUZZY_MATCHER: RefCell<Matcher> = RefCell::new(Matcher::new(Config::DEFAULT));
}

/// How a keyword is compared with candidate text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Substring,
    Fuzzy,
}

enum Kind {
    Substring { needle: String, ignore_case: bool },
    Fuzzy { pattern: Pattern, buf: Vec<char> },
}

/// Matches candidate strings against one keyword
pub struct KeywordMatcher {
    kind: Kind,
}

impl KeywordMatcher {
    pub fn new(keyword: &str, mode: MatchMode, ignore_case: bool) -> Self {
        let kind = match mode {
            MatchMode::Substring => Kind::Substring {
                needle: if ignore_case {
                    keyword.to_lowercase()
                } else {
                    keyword.to_string()
                },
                ignore_case,
            },
            MatchMode::Fuzzy => {
                let case = if ignore_case {
                    CaseMatching::Ignore
                } else {
                    CaseMatching::Respect
                };
                Kind::Fuzzy {
                    pattern: Pattern::parse(keyword, case, Normalization::Smart),
                    buf: Vec::new(),
                }
            }
        };
        Self { kind }
    }

    pub fn substring(keyword: &str) -> Self {
        Self::new(keyword, MatchMode::Substring, true)
    }

    pub fn fuzzy(keyword: &str) -> Self {
        Self::new(keyword, MatchMode::Fuzzy, true)
    }

    pub fn matches(&mut self, haystack: &str) -> bool {
        match &mut self.kind {
            Kind::Substring {
                needle,
                ignore_case,
            } => {
                if *ignore_case {
                    haystack.to_lowercase().contains(needle.as_str())
                } else {
                    haystack.contains(needle.as_str())
                }
            }
            Kind::Fuzzy { pattern, buf } => FUZZY_MATCHER.with(|matcher| {
                let mut matcher = matcher.borrow_mut();
                pattern
                    .score(Utf32Str::new(haystack, buf), &mut matcher)
                    .is_some()
            }),
        }
    }
}
