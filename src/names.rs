//! Depositor names from payment-gateway particulars.
//!
//! Particulars look like `MPAYUPITRTR509218316187GOVIND RAMSBINXXX94`: a
//! payment-system tag, one or two reference numbers, a truncated customer
//! name, then the remitter's bank code. Each trigger tag has its own
//! strict-to-loose pattern list; a generic tier catches everything else.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::models::UNKNOWN_CUSTOMER;

const BANK_CODES: &str = "SBIN|PUNB|BARB|JIOPXXX|UCBA|IBKL|XXX";

/// Tokens that are part of the reference, never part of a name.
const RESERVED: &[&str] = &[
    "UPITRTR", "TRTR", "MPAY", "UPI", "TRANSFER", "NEFT", "RTGS", "XXX", "SBIN", "PUNB", "BARB",
    "UCBA", "IBKL", "JIOPXXX",
];

pub struct NameRule {
    /// Tag that must occur in the particulars; `None` always applies.
    pub trigger: Option<&'static str>,
    /// Tried in order, most specific first.
    pub patterns: Vec<Regex>,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

static RULES: Lazy<Vec<NameRule>> = Lazy::new(|| {
    let bank = BANK_CODES;
    let mut rules = vec![
        NameRule {
            trigger: Some("MPAY"),
            patterns: vec![
                compile(&format!(
                    r"(?i)MPAY(?:UPITRTR|UPI|TRTR)?\d+\s+\d+\s+([A-Z][A-Z\s]+?)(?:{bank})"
                )),
                compile(&format!(
                    r"(?i)MPAY\w*\d+\s+\d*\s*([A-Z][A-Z\s]{{2,20}}?)(?:{bank}|\d|$)"
                )),
                compile(r"(?i)MPAY(?:UPITRTR|UPI|TRTR)?.*?\d+.*?([A-Z][A-Z\s]{3,20}?)(?:[A-Z]{3,4}XXX|\d|$)"),
            ],
        },
        NameRule {
            trigger: Some("UPI"),
            patterns: vec![
                compile(&format!(
                    r"(?i)UPI(?:TRTR)?\d+\s+\d+\s+([A-Z][A-Z\s]+?)(?:{bank})"
                )),
                compile(&format!(
                    r"(?i)UPI\w*\d+\s+\d*\s*([A-Z][A-Z\s]{{3,20}}?)(?:{bank}|\d|$)"
                )),
            ],
        },
    ];
    for tag in ["TRANSFER", "NEFT", "RTGS"] {
        rules.push(NameRule {
            trigger: Some(tag),
            patterns: vec![
                compile(&format!(r"(?i){tag}.*?\d+([A-Z][A-Z\s]+?)(?:{bank})")),
                compile(&format!(
                    r"(?i){tag}.*?([A-Z][A-Z\s]{{2,20}}?)(?:[A-Z]{{3,4}}XXX|\d|$)"
                )),
            ],
        });
    }
    rules.push(NameRule {
        trigger: None,
        patterns: vec![
            compile(r"(?i)([A-Z][A-Z\s]{2,20}?)(?:[A-Z]{3,4}XXX|\d|$)"),
            compile(r"([A-Z][A-Z\s]{2,20})"),
        ],
    });
    rules
});

static BANK_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:SBIN|PUNB|BARB|UCBA|IBKL|JIOPXXX)XX$").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// The ordered rule table, built on first use.
pub fn rules() -> &'static [NameRule] {
    &RULES
}

/// Extract the depositor name from raw particulars, or "Unknown Customer".
pub fn extract_name(particulars: &str) -> String {
    let upper = particulars.to_uppercase();
    for rule in rules() {
        if let Some(trigger) = rule.trigger {
            if !upper.contains(trigger) {
                continue;
            }
        }
        for pattern in &rule.patterns {
            for caps in pattern.captures_iter(particulars) {
                let Some(m) = caps.get(1) else { continue };
                if let Some(name) = clean_candidate(m.as_str()) {
                    trace!(trigger = ?rule.trigger, %name, "depositor matched");
                    return name;
                }
            }
        }
    }
    UNKNOWN_CUSTOMER.to_string()
}

/// Collapse whitespace, strip a glued-on bank code, and reject non-names.
fn clean_candidate(raw: &str) -> Option<String> {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    let name = BANK_SUFFIX.replace(&collapsed, "").trim().to_string();
    if name.chars().count() <= 2
        || name.chars().all(|c| c.is_ascii_digit())
        || is_reserved(&name)
    {
        return None;
    }
    Some(name)
}

// Also catches glued tags such as "MPAYTRTR" or "MPAYUPITRTR".
fn is_reserved(name: &str) -> bool {
    let compact: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    !compact.is_empty() && composed_of_reserved(&compact)
}

fn composed_of_reserved(s: &str) -> bool {
    s.is_empty()
        || RESERVED
            .iter()
            .any(|t| s.strip_prefix(t).is_some_and(composed_of_reserved))
}
