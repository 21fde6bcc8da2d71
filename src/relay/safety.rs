//! Denylist content filter.
//!
//! A fixed, ordered list of patterns is matched against lowercased text. The
//! first match decides the verdict; there is no scoring. The filter runs on
//! the user message before the model is called and again on the model reply.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Reply returned when the user message trips the filter.
pub const INPUT_REFUSAL: &str = "I can't help with that. If you're feeling unsafe or thinking about harming yourself, please contact a trusted person in your life or local emergency services.";

/// Reply returned in place of a model answer that trips the filter.
pub const OUTPUT_REFUSAL: &str = "I can't assist with that topic. If you need urgent help, please contact local services or someone you trust.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyCategory {
    SelfHarm,
    Violence,
    Weapons,
    IllicitDrugs,
    ChildExploitation,
    Fraud,
}

impl fmt::Display for SafetyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SelfHarm => "self_harm",
            Self::Violence => "violence",
            Self::Weapons => "weapons",
            Self::IllicitDrugs => "illicit_drugs",
            Self::ChildExploitation => "child_exploitation",
            Self::Fraud => "fraud",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Refused {
        category: SafetyCategory,
        pattern: &'static str,
    },
}

struct SafetyRule {
    category: SafetyCategory,
    pattern: &'static str,
    regex: Regex,
}

const DENYLIST: &[(SafetyCategory, &str)] = &[
    (SafetyCategory::Violence, r"how to kill"),
    (SafetyCategory::Weapons, r"how to make a bomb"),
    (SafetyCategory::Weapons, r"build a bomb"),
    (SafetyCategory::Weapons, r"detonate"),
    (SafetyCategory::SelfHarm, r"suicide"),
    (SafetyCategory::SelfHarm, r"how to die"),
    (SafetyCategory::SelfHarm, r"i want to die"),
    (SafetyCategory::SelfHarm, r"hang myself"),
    (SafetyCategory::SelfHarm, r"kill myself"),
    (SafetyCategory::Violence, r"harm (someone|others)"),
    (SafetyCategory::Violence, r"hurt (someone|others)"),
    (SafetyCategory::Weapons, r"manufacture.*weapon"),
    (SafetyCategory::Weapons, r"assemble.*gun"),
    (SafetyCategory::IllicitDrugs, r"illicit drug"),
    (SafetyCategory::IllicitDrugs, r"produce meth"),
    (SafetyCategory::ChildExploitation, r"child sexual"),
    (SafetyCategory::ChildExploitation, r"sexual.*minor"),
    (SafetyCategory::ChildExploitation, r"\bpedophile\b"),
    (SafetyCategory::Fraud, r"steal credit card"),
    (SafetyCategory::Fraud, r"carding"),
    (SafetyCategory::Weapons, r"explosives instruction"),
    (SafetyCategory::Fraud, r"bypass (security|captcha)"),
];

static RULES: Lazy<Vec<SafetyRule>> = Lazy::new(|| {
    DENYLIST
        .iter()
        .map(|&(category, pattern)| SafetyRule {
            category,
            pattern,
            regex: Regex::new(pattern).expect("Valid regex pattern"),
        })
        .collect()
});

/// Checks `text` against the denylist. Matching is case-insensitive.
pub fn classify(text: &str) -> Verdict {
    let lower = text.to_lowercase();

    RULES
        .iter()
        .find(|rule| rule.regex.is_match(&lower))
        .map_or(Verdict::Clean, |rule| Verdict::Refused {
            category: rule.category,
            pattern: rule.pattern,
        })
}
