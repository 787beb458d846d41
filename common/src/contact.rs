// Contact-name discovery from free-form job description text.

use crate::models::ContactConfidence;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const SIGNATURE_PATTERNS: &[&str] = &[
    r"(?i)(?:thanks|thank you|regards|best|cheers|sincerely|warm regards|best regards|kind regards),?\s+([A-Z][a-z]+)",
    r"(?i)(?:thanks|thank you|regards|best|cheers|sincerely|warm regards|best regards|kind regards)\s*[-\x{2013}\x{2014}]\s*([A-Z][a-z]+)",
];

const INTRO_PATTERNS: &[&str] = &[
    r"(?i)(?:my name is|i'm|i am|this is)\s+([A-Z][a-z]+)",
];

const LAST_LINE_PATTERN: &str = r"^[-\x{2013}\x{2014}]?\s*([A-Z][a-z]+)\s*$";

fn excluded_names() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        [
            "Upwork",
            "Thanks",
            "Thank",
            "Regards",
            "Best",
            "Cheers",
            "Sincerely",
            "Please",
            "Hello",
            "Looking",
            "Required",
            "Skills",
            "Requirements",
            "About",
            "Description",
            "Budget",
            "Fixed",
            "Hourly",
            "Experience",
            "Project",
            "Client",
        ]
        .into_iter()
        .collect()
    })
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("contact discovery pattern is a compile-time constant")
}

fn candidate_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    if name.len() >= 2 && !excluded_names().contains(name) {
        let mut chars = name.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => return None,
        };
        Some(capitalized)
    } else {
        None
    }
}

pub struct ContactDiscovery {
    pub contact_name: Option<String>,
    pub contact_confidence: ContactConfidence,
}

/// Scan a job description for a contact name, in priority order: signature
/// patterns, then introduction patterns, then a lone capitalized token on
/// one of the last five non-empty lines.
pub fn discover_contact_name(description: &str) -> ContactDiscovery {
    let text = description.trim();
    if text.is_empty() {
        return ContactDiscovery {
            contact_name: None,
            contact_confidence: ContactConfidence::Low,
        };
    }

    for pattern in SIGNATURE_PATTERNS {
        if let Some(caps) = compile(pattern).captures(text) {
            if let Some(name) = candidate_name(&caps[1]) {
                return ContactDiscovery {
                    contact_name: Some(name),
                    contact_confidence: ContactConfidence::High,
                };
            }
        }
    }

    for pattern in INTRO_PATTERNS {
        if let Some(caps) = compile(pattern).captures(text) {
            if let Some(name) = candidate_name(&caps[1]) {
                return ContactDiscovery {
                    contact_name: Some(name),
                    contact_confidence: ContactConfidence::High,
                };
            }
        }
    }

    let last_line_re = compile(LAST_LINE_PATTERN);
    let lines: Vec<&str> = text.lines().collect();
    let tail_start = lines.len().saturating_sub(5);
    for line in lines[tail_start..].iter().rev() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = last_line_re.captures(line) {
            if let Some(name) = candidate_name(&caps[1]) {
                return ContactDiscovery {
                    contact_name: Some(name),
                    contact_confidence: ContactConfidence::Medium,
                };
            }
        }
    }

    ContactDiscovery {
        contact_name: None,
        contact_confidence: ContactConfidence::Low,
    }
}

/// `⊥ → "Hey"`; `(name, high) → "Hey <name>"`;
/// `(name, medium|low) → "Hey <name> (if I have the right person)"`.
pub fn format_greeting(contact_name: Option<&str>, confidence: Option<ContactConfidence>) -> String {
    let Some(name) = contact_name else {
        return "Hey".to_string();
    };
    match confidence {
        Some(ContactConfidence::High) => format!("Hey {name}"),
        _ => format!("Hey {name} (if I have the right person)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_pattern_yields_high_confidence() {
        let result = discover_contact_name("Looking for help.\n\nThanks, John");
        assert_eq!(result.contact_name, Some("John".to_string()));
        assert_eq!(result.contact_confidence, ContactConfidence::High);
    }

    #[test]
    fn introduction_pattern_yields_high_confidence() {
        let result = discover_contact_name("My name is Sarah and I run a small agency.");
        assert_eq!(result.contact_name, Some("Sarah".to_string()));
        assert_eq!(result.contact_confidence, ContactConfidence::High);
    }

    #[test]
    fn lone_name_on_trailing_line_yields_medium_confidence() {
        let result = discover_contact_name("We need a developer for a quick project.\n\nMaria");
        assert_eq!(result.contact_name, Some("Maria".to_string()));
        assert_eq!(result.contact_confidence, ContactConfidence::Medium);
    }

    #[test]
    fn excluded_tokens_are_never_returned() {
        let result = discover_contact_name("Thanks, Upwork");
        assert_eq!(result.contact_name, None);
    }

    #[test]
    fn no_match_yields_low_confidence_and_no_name() {
        let result = discover_contact_name("We need a full-stack developer with React experience.");
        assert_eq!(result.contact_name, None);
        assert_eq!(result.contact_confidence, ContactConfidence::Low);
    }

    #[test]
    fn greeting_formats_per_confidence_level() {
        assert_eq!(format_greeting(None, None), "Hey");
        assert_eq!(
            format_greeting(Some("John"), Some(ContactConfidence::High)),
            "Hey John"
        );
        assert_eq!(
            format_greeting(Some("John"), Some(ContactConfidence::Medium)),
            "Hey John (if I have the right person)"
        );
    }
}
