//! Window classification by name and title.
//!
//! Two independent rule lists exist: windows matching the *tiling* list are
//! never registered at all, windows matching the *decoration* list are
//! tiled normally but their title bar is never touched.
//!
//! Patterns are regular expressions anchored at the start of the string
//! only (a pattern `term` matches `terminal`); add `$` to anchor the end.

use log::debug;
use regex::Regex;
use serde::Deserialize;

/// Whether `re` matches at the very beginning of `s`.
fn matches_at_start(re: &Regex, s: &str) -> bool {
    re.find(s).is_some_and(|m| m.start() == 0)
}

/// On-disk shape of an [`IgnoreRule`].
#[derive(Debug, Clone, Deserialize)]
pub struct IgnoreRuleSpec {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub negate_title: bool,
}

/// A name pattern plus an optional (possibly negated) title pattern.
///
/// * no title pattern: any window whose name matches is covered
/// * `negate_title == false`: the title must match as well
/// * `negate_title == true`: the title must *not* match
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "IgnoreRuleSpec")]
pub struct IgnoreRule {
    name: Regex,
    title: Option<Regex>,
    negate_title: bool,
}

impl TryFrom<IgnoreRuleSpec> for IgnoreRule {
    type Error = regex::Error;

    fn try_from(spec: IgnoreRuleSpec) -> Result<Self, Self::Error> {
        IgnoreRule::new(&spec.name, spec.title.as_deref(), spec.negate_title)
    }
}

impl IgnoreRule {
    pub fn new(name: &str, title: Option<&str>, negate_title: bool) -> Result<Self, regex::Error> {
        Ok(Self {
            name: Regex::new(name)?,
            title: title.map(Regex::new).transpose()?,
            negate_title,
        })
    }

    /// Test the rule.  `title` is only called when the name matched and a
    /// title pattern exists, so callers can fetch titles lazily.
    pub fn matches(&self, name: &str, title: impl FnOnce() -> String) -> bool {
        if !matches_at_start(&self.name, name) {
            return false;
        }
        match &self.title {
            None => {
                debug!(
                    "name {:?} matches {:?}, title irrelevant",
                    name,
                    self.name.as_str()
                );
                true
            }
            Some(pattern) => {
                let title = title();
                let hit = matches_at_start(pattern, &title) != self.negate_title;
                if hit {
                    debug!(
                        "name {:?} matches {:?}, title {:?} {} {:?}",
                        name,
                        self.name.as_str(),
                        title,
                        if self.negate_title { "does not match" } else { "matches" },
                        pattern.as_str()
                    );
                }
                hit
            }
        }
    }
}

/// An ordered list of [`IgnoreRule`]s; a window is covered if any rule
/// matches.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<IgnoreRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<IgnoreRule>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule covers the window.  The title is fetched at most
    /// once, and only if some rule needs it.
    pub fn matches(&self, name: &str, title: impl FnOnce() -> String) -> bool {
        let mut fetch = Some(title);
        let mut cached: Option<String> = None;
        self.rules.iter().any(|rule| {
            rule.matches(name, || {
                cached
                    .get_or_insert_with(|| fetch.take().map(|f| f()).unwrap_or_default())
                    .clone()
            })
        })
    }
}

/// Plain name patterns (e.g. applications whose tiling is delayed).
#[derive(Debug, Clone, Default)]
pub struct NamePatterns {
    patterns: Vec<Regex>,
}

impl NamePatterns {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|re| matches_at_start(re, name))
    }
}

impl<'de> Deserialize<'de> for NamePatterns {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: Vec<String> = Vec::deserialize(deserializer)?;
        let patterns = raw
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()
            .map_err(serde::de::Error::custom)?;
        Ok(Self { patterns })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, title: Option<&str>, negate: bool) -> IgnoreRule {
        IgnoreRule::new(name, title, negate).unwrap()
    }

    #[test]
    fn name_only_rule_ignores_title() {
        let r = rule("^Gimp", None, false);
        assert!(r.matches("Gimp-2.10", || panic!("title must not be fetched")));
        assert!(!r.matches("Inkscape", || "x".into()));
    }

    #[test]
    fn title_must_match() {
        let r = rule("^firefox$", Some("^Library$"), false);
        assert!(r.matches("firefox", || "Library".into()));
        assert!(!r.matches("firefox", || "Mozilla Firefox".into()));
    }

    #[test]
    fn negated_title_must_not_match() {
        let r = rule("^foo$", Some("^bar$"), true);
        assert!(r.matches("foo", || "anything else".into()));
        assert!(!r.matches("foo", || "bar".into()));
        assert!(!r.matches("food", || "anything".into()));
    }

    #[test]
    fn patterns_anchor_at_start_only() {
        let r = rule("term", None, false);
        assert!(r.matches("terminal", String::new));
        assert!(!r.matches("xterm", String::new));
    }

    #[test]
    fn rule_set_fetches_title_once() {
        let set = RuleSet::new(vec![
            rule("^a$", Some("^x$"), false),
            rule("^a$", Some("^y$"), false),
        ]);
        let mut calls = 0;
        let hit = set.matches("a", || {
            calls += 1;
            "y".to_string()
        });
        assert!(hit);
        assert_eq!(calls, 1);
    }

    #[test]
    fn empty_rule_set_matches_nothing() {
        let set = RuleSet::default();
        assert!(set.is_empty());
        assert!(!set.matches("anything", String::new));
    }

    #[test]
    fn deserialize_rules() {
        let json = r#"[
            {"name": "^Xfce4-panel$"},
            {"name": "^Thunderbird$", "title": "^Write:", "negate_title": true}
        ]"#;
        let set: RuleSet = serde_json::from_str(json).unwrap();
        assert!(set.matches("Xfce4-panel", String::new));
        assert!(set.matches("Thunderbird", || "Inbox".into()));
        assert!(!set.matches("Thunderbird", || "Write: hello".into()));
    }

    #[test]
    fn bad_regex_is_a_deserialize_error() {
        let json = r#"[{"name": "("}]"#;
        assert!(serde_json::from_str::<RuleSet>(json).is_err());
    }

    #[test]
    fn name_patterns() {
        let p: NamePatterns = serde_json::from_str(r#"["^Vivaldi", "^Code$"]"#).unwrap();
        assert!(p.matches("Vivaldi-stable"));
        assert!(p.matches("Code"));
        assert!(!p.matches("Codex"));
    }
}
