//! Connection rules and their compact text encodings.
//!
//! A rule is directed: it lets connection `conn1` of an already placed
//! `part1` receive connection `conn2` of a new `part2`. Symmetric vocabularies
//! need one rule per direction.
//!
//! Text forms:
//! - rule: `"P1|C1_P2|C2"`
//! - sequence step: `"P1|C1_P2|C2>ID1_ID2"`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::RuleGeneratorOptions;
use crate::error::RuleParseError;
use crate::part::Part;

fn default_active() -> bool {
    true
}

/// Joins connection `conn1` of `part1` to connection `conn2` of `part2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub part1: String,
    pub conn1: usize,
    pub part2: String,
    pub conn2: usize,
    /// Carried for round-tripping; growth does not consult it.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Rule {
    /// Rule from its two endpoints.
    pub fn new(part1: impl Into<String>, conn1: usize, part2: impl Into<String>, conn2: usize) -> Self {
        Self {
            part1: part1.into(),
            conn1,
            part2: part2.into(),
            conn2,
            active: true,
        }
    }

    /// True when this rule joins exactly these two connections.
    pub fn licenses(&self, part1: &str, conn1: usize, part2: &str, conn2: usize) -> bool {
        self.part1 == part1 && self.conn1 == conn1 && self.part2 == part2 && self.conn2 == conn2
    }
}

fn parse_conn(text: &str, value: &str) -> Result<usize, RuleParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| RuleParseError::InvalidConnection {
            text: text.to_string(),
            value: value.to_string(),
        })
}

impl FromStr for Rule {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RuleParseError::Malformed { text: s.to_string() };
        let (part1, rest) = s.split_once('|').ok_or_else(malformed)?;
        let (conn1, rest) = rest.split_once('_').ok_or_else(malformed)?;
        let (part2, conn2) = rest.rsplit_once('|').ok_or_else(malformed)?;
        let (part1, part2) = (part1.trim(), part2.trim());
        if part1.is_empty() || part2.is_empty() {
            return Err(malformed());
        }
        Ok(Rule::new(part1, parse_conn(s, conn1)?, part2, parse_conn(s, conn2)?))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}_{}|{}", self.part1, self.conn1, self.part2, self.conn2)
    }
}

/// One step of a replayable aggregation: join `rule`, then label the anchor
/// `id1` and the new part `id2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStep {
    pub rule: Rule,
    pub id1: String,
    pub id2: String,
}

impl FromStr for SequenceStep {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RuleParseError::Malformed { text: s.to_string() };
        let (rule, ids) = s.split_once('>').ok_or_else(malformed)?;
        let (id1, id2) = ids.split_once('_').ok_or_else(malformed)?;
        let (id1, id2) = (id1.trim(), id2.trim());
        if id1.is_empty() || id2.is_empty() {
            return Err(malformed());
        }
        Ok(SequenceStep {
            rule: rule.parse()?,
            id1: id1.to_string(),
            id2: id2.to_string(),
        })
    }
}

impl fmt::Display for SequenceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}_{}", self.rule, self.id1, self.id2)
    }
}

/// Parse a grammar entry `"A>B"` into a directed connection-type pair.
pub fn parse_grammar_pair(text: &str) -> Result<(String, String), RuleParseError> {
    let (a, b) = text
        .split_once('>')
        .map(|(a, b)| (a.trim(), b.trim()))
        .filter(|(a, b)| !a.is_empty() && !b.is_empty())
        .ok_or_else(|| RuleParseError::Malformed {
            text: text.to_string(),
        })?;
    Ok((a.to_string(), b.to_string()))
}

/// Build every rule allowed by connection types.
///
/// Without a grammar, connections of equal type join. With a grammar, a
/// connection of type `A` receives one of type `B` only for listed `A>B`.
pub fn generate_rules<'a>(
    parts: impl IntoIterator<Item = &'a Part> + Clone,
    options: &RuleGeneratorOptions,
) -> Vec<Rule> {
    let joins = |a: &str, b: &str| {
        if options.grammar.is_empty() {
            a == b
        } else {
            options.grammar.iter().any(|(ga, gb)| ga == a && gb == b)
        }
    };

    let mut rules = Vec::new();
    for p1 in parts.clone() {
        for p2 in parts.clone() {
            if !options.self_part && p1.name == p2.name {
                continue;
            }
            for c1 in &p1.connections {
                for c2 in &p2.connections {
                    if joins(&c1.kind, &c2.kind) {
                        rules.push(Rule::new(p1.name.as_str(), c1.id, p2.name.as_str(), c2.id));
                    }
                }
            }
        }
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rule() {
        let rule: Rule = "Brick|0_Beam|3".parse().unwrap();
        assert_eq!(rule, Rule::new("Brick", 0, "Beam", 3));
        assert_eq!(rule.to_string(), "Brick|0_Beam|3");
    }

    #[test]
    fn test_parse_rule_with_underscore_in_second_name() {
        let rule: Rule = "A|1_long_name|2".parse().unwrap();
        assert_eq!(rule.part2, "long_name");
        assert_eq!(rule.conn2, 2);
    }

    #[test]
    fn test_malformed_rules() {
        assert!(matches!(
            "no separators".parse::<Rule>(),
            Err(RuleParseError::Malformed { .. })
        ));
        assert!(matches!(
            "A|x_B|0".parse::<Rule>(),
            Err(RuleParseError::InvalidConnection { .. })
        ));
        assert!("|0_B|1".parse::<Rule>().is_err());
    }

    #[test]
    fn test_parse_sequence_step() {
        let step: SequenceStep = "A|0_B|1>0_7".parse().unwrap();
        assert_eq!(step.rule, Rule::new("A", 0, "B", 1));
        assert_eq!(step.id1, "0");
        assert_eq!(step.id2, "7");
        assert_eq!(step.to_string(), "A|0_B|1>0_7");
        assert!("A|0_B|1".parse::<SequenceStep>().is_err());
        assert!("A|0_B|1>3".parse::<SequenceStep>().is_err());
    }

    #[test]
    fn test_grammar_pair() {
        assert_eq!(parse_grammar_pair(" a > b ").unwrap(), ("a".into(), "b".into()));
        assert!(parse_grammar_pair("ab").is_err());
    }

    #[test]
    fn test_licenses() {
        let rule = Rule::new("A", 0, "B", 1);
        assert!(rule.licenses("A", 0, "B", 1));
        assert!(!rule.licenses("B", 1, "A", 0));
    }
}
