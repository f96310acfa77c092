// Moderation filter for recorded terms
// Rule sets are swappable; the service only sees the `ModerationFilter` trait

use regex::{RegexSet, RegexSetBuilder};
use serde::Serialize;
use tracing::warn;

/// Lexical category a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationCategory {
    Political,
    Violence,
    Adult,
    Gambling,
    Narcotics,
    Profanity,
}

impl ModerationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Political => "political",
            Self::Violence => "violence",
            Self::Adult => "adult",
            Self::Gambling => "gambling",
            Self::Narcotics => "narcotics",
            Self::Profanity => "profanity",
        }
    }
}

/// Policy gate consulted before a term is recorded
pub trait ModerationFilter: Send + Sync {
    /// Category of the first rule `term` violates, if any
    fn check(&self, term: &str) -> Option<ModerationCategory>;

    fn is_forbidden(&self, term: &str) -> bool {
        self.check(term).is_some()
    }
}

/// Any `Fn(&str) -> bool` works as a filter; matches report as profanity
impl<F> ModerationFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn check(&self, term: &str) -> Option<ModerationCategory> {
        if self(term) {
            Some(ModerationCategory::Profanity)
        } else {
            None
        }
    }
}

/// Filter that accepts everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ModerationFilter for AllowAll {
    fn check(&self, _term: &str) -> Option<ModerationCategory> {
        None
    }
}

/// A single pattern rule
#[derive(Debug, Clone)]
pub struct ModerationRule {
    pub category: ModerationCategory,
    pub pattern: String,
}

impl ModerationRule {
    pub fn new(category: ModerationCategory, pattern: impl Into<String>) -> Self {
        ModerationRule {
            category,
            pattern: pattern.into(),
        }
    }
}

/// Case-insensitive regex rule set
#[derive(Debug, Clone)]
pub struct PatternFilter {
    set: RegexSet,
    categories: Vec<ModerationCategory>,
}

impl PatternFilter {
    /// Compile `rules` into one case-insensitive set
    pub fn new(rules: &[ModerationRule]) -> Result<Self, regex::Error> {
        let set = RegexSetBuilder::new(rules.iter().map(|rule| rule.pattern.as_str()))
            .case_insensitive(true)
            .build()?;
        Ok(PatternFilter {
            set,
            categories: rules.iter().map(|rule| rule.category).collect(),
        })
    }

    /// Filter built from [`default_rules`]
    pub fn with_default_rules() -> Self {
        match PatternFilter::new(&default_rules()) {
            Ok(filter) => filter,
            Err(err) => {
                warn!(error = %err, "built-in moderation rules failed to compile, moderation is disabled");
                PatternFilter {
                    set: RegexSet::empty(),
                    categories: Vec::new(),
                }
            }
        }
    }

    pub fn rule_count(&self) -> usize {
        self.categories.len()
    }
}

impl Default for PatternFilter {
    fn default() -> Self {
        PatternFilter::with_default_rules()
    }
}

impl ModerationFilter for PatternFilter {
    fn check(&self, term: &str) -> Option<ModerationCategory> {
        self.set
            .matches(term)
            .iter()
            .next()
            .and_then(|idx| self.categories.get(idx).copied())
    }
}

/// Built-in rule set
pub fn default_rules() -> Vec<ModerationRule> {
    use ModerationCategory::*;

    vec![
        ModerationRule::new(Political, r"(?:falun\s*gong|tiananmen\s+massacre|六四事件|法轮功)"),
        ModerationRule::new(Political, r"(?:overthrow\s+the\s+government|颠覆政权)"),
        ModerationRule::new(Violence, r"(?:how\s+to\s+(?:kill|murder)|bomb\s*making|mass\s+shooting)"),
        ModerationRule::new(Violence, r"(?:terroris[tm]|beheading|杀人|恐怖袭击|爆炸物)"),
        ModerationRule::new(Adult, r"(?:\bporn|\bxxx\b|\bnsfw\b|\bhentai\b|色情|成人视频)"),
        ModerationRule::new(Gambling, r"(?:online\s+casino|sports\s*betting|\bbaccarat\b|赌博|博彩|六合彩)"),
        ModerationRule::new(Narcotics, r"(?:\bcocaine\b|\bheroin\b|\bmeth(?:amphetamine)?\b|\bfentanyl\b|毒品|冰毒|大麻)"),
        ModerationRule::new(Profanity, r"\b(?:fuck\w*|shit\w*|bitch\w*|cunt\w*|asshole\w*)"),
        ModerationRule::new(Profanity, r"(?:傻逼|他妈的|操你)"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_compile() {
        let filter = PatternFilter::new(&default_rules()).unwrap();
        assert_eq!(filter.rule_count(), default_rules().len());
        // The default filter must never be the empty fallback
        assert_eq!(PatternFilter::with_default_rules().rule_count(), default_rules().len());
    }

    #[test]
    fn test_blocks_each_category() {
        let filter = PatternFilter::default();
        assert_eq!(filter.check("Falun Gong history"), Some(ModerationCategory::Political));
        assert_eq!(filter.check("bomb making guide"), Some(ModerationCategory::Violence));
        assert_eq!(filter.check("free porn"), Some(ModerationCategory::Adult));
        assert_eq!(filter.check("best online casino"), Some(ModerationCategory::Gambling));
        assert_eq!(filter.check("buy cocaine"), Some(ModerationCategory::Narcotics));
        assert_eq!(filter.check("what the fuck"), Some(ModerationCategory::Profanity));
        assert_eq!(filter.check("网上赌博"), Some(ModerationCategory::Gambling));
    }

    #[test]
    fn test_case_insensitive() {
        let filter = PatternFilter::default();
        assert!(filter.is_forbidden("ONLINE CASINO"));
        assert!(filter.is_forbidden("Heroin"));
    }

    #[test]
    fn test_allows_ordinary_terms() {
        let filter = PatternFilter::default();
        for term in ["movie-x", "rust borrow checker", "methods of science", "Scunthorpe", "assassin's creed"] {
            assert!(!filter.is_forbidden(term), "{term} should be allowed");
        }
    }

    #[test]
    fn test_custom_rules_replace_defaults() {
        let filter = PatternFilter::new(&[ModerationRule::new(ModerationCategory::Gambling, "lottery")]).unwrap();
        assert!(filter.is_forbidden("Lottery results"));
        assert!(!filter.is_forbidden("online casino"));
    }

    #[test]
    fn test_invalid_rule_is_an_error() {
        assert!(PatternFilter::new(&[ModerationRule::new(ModerationCategory::Adult, "(unclosed")]).is_err());
    }

    #[test]
    fn test_closure_filter() {
        let filter = |term: &str| term.contains("spoiler");
        assert!(filter.is_forbidden("ending spoiler"));
        assert!(!AllowAll.is_forbidden("ending spoiler"));
    }
}
