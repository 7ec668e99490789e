//! # BIO Tags for Annotated Exports
//!
//! Parses the raw tag column of a WebAnno CoNLL export. Tags follow the
//! BIO (Begin-Inside-Outside) scheme over an open set of entity classes,
//! plus two pseudo-classes that bound the retained part of a document.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConllError;

/// Pseudo-class opening the retention window.
pub const START_LABEL: &str = "START";
/// Pseudo-class closing the retention window.
pub const END_LABEL: &str = "END";

/// The class part of a `B-`/`I-` tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// `START` boundary marker.
    Start,
    /// `END` boundary marker.
    End,
    /// A real entity class such as `GOODS`, `ASSET` or `SERVICE`.
    Entity(String),
}

impl Label {
    /// Whether this label is one of the boundary pseudo-classes.
    pub fn is_boundary(&self) -> bool {
        matches!(self, Label::Start | Label::End)
    }

    /// The entity class name, if this is a real entity.
    pub fn entity(&self) -> Option<&str> {
        match self {
            Label::Entity(name) => Some(name),
            _ => None,
        }
    }

    fn from_class(class: &str) -> Self {
        match class {
            START_LABEL => Label::Start,
            END_LABEL => Label::End,
            other => Label::Entity(other.to_string()),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Start => f.write_str(START_LABEL),
            Label::End => f.write_str(END_LABEL),
            Label::Entity(name) => f.write_str(name),
        }
    }
}

/// A parsed tag value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BioTag {
    /// `O`: token outside any span.
    Outside,
    /// `B-<LABEL>`: token opening a span.
    Begin(Label),
    /// `I-<LABEL>`: token continuing a span.
    Inside(Label),
}

impl BioTag {
    /// Class part of a `B-`/`I-` tag, `None` for `O`.
    pub fn label(&self) -> Option<&Label> {
        match self {
            BioTag::Outside => None,
            BioTag::Begin(label) | BioTag::Inside(label) => Some(label),
        }
    }

    /// Whether this tag marks a real entity (not `O`, not a boundary).
    pub fn is_entity(&self) -> bool {
        self.label().is_some_and(|label| !label.is_boundary())
    }
}

impl FromStr for BioTag {
    type Err = ConllError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw == "O" {
            return Ok(BioTag::Outside);
        }
        let (prefix, class) = raw
            .split_once('-')
            .ok_or_else(|| ConllError::UnknownTag(raw.to_string()))?;
        if class.is_empty() {
            return Err(ConllError::UnknownTag(raw.to_string()));
        }
        match prefix {
            "B" => Ok(BioTag::Begin(Label::from_class(class))),
            "I" => Ok(BioTag::Inside(Label::from_class(class))),
            _ => Err(ConllError::UnknownTag(raw.to_string())),
        }
    }
}

impl fmt::Display for BioTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BioTag::Outside => f.write_str("O"),
            BioTag::Begin(label) => write!(f, "B-{label}"),
            BioTag::Inside(label) => write!(f, "I-{label}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_outside() {
        assert_eq!("O".parse::<BioTag>().unwrap(), BioTag::Outside);
    }

    #[test]
    fn test_parse_entity_tags() {
        assert_eq!(
            "B-GOODS".parse::<BioTag>().unwrap(),
            BioTag::Begin(Label::Entity("GOODS".into()))
        );
        assert_eq!(
            "I-SERVICE".parse::<BioTag>().unwrap(),
            BioTag::Inside(Label::Entity("SERVICE".into()))
        );
    }

    #[test]
    fn test_parse_boundaries() {
        assert_eq!("B-START".parse::<BioTag>().unwrap(), BioTag::Begin(Label::Start));
        assert_eq!("B-END".parse::<BioTag>().unwrap(), BioTag::Begin(Label::End));
        assert!(!BioTag::Begin(Label::Start).is_entity());
    }

    #[test]
    fn test_class_keeps_inner_dashes() {
        let tag: BioTag = "B-NON-CURRENT".parse().unwrap();
        assert_eq!(tag.label().and_then(Label::entity), Some("NON-CURRENT"));
    }

    #[test]
    fn test_rejects_unknown() {
        for raw in ["X-GOODS", "B-", "GOODS", "", "o"] {
            assert!(
                matches!(raw.parse::<BioTag>(), Err(ConllError::UnknownTag(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_matches_source_form() {
        for raw in ["O", "B-ASSET", "I-ASSET", "B-START", "B-END"] {
            assert_eq!(raw.parse::<BioTag>().unwrap().to_string(), raw);
        }
    }
}
