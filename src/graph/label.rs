//! Attribute labels (spec §3.1): every node and edge carries a mapping
//! from attribute key to attribute value.

use std::collections::BTreeMap;

use num_rational::Rational32;

use crate::concepts::{Accidental, BarlineStyle, Clef, DiatonicPitch, Letter, Pitch, Placement, StemDirectionConcept};

/// One attribute value. Spec §3.1: "tagged concept token ... rational
/// number, integer, string, or boolean."
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Concept(ConceptValue),
    Rational(Rational32),
    Integer(i64),
    Text(String),
    Bool(bool),
}

/// A concept token, closed over the vocabulary in [`crate::concepts`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConceptValue {
    Pitch(Pitch),
    DiatonicPitch(DiatonicPitch),
    Letter(Letter),
    Accidental(Accidental),
    Clef(Clef),
    Placement(Placement),
    BarlineStyle(BarlineStyle),
    StemDirection(StemDirectionConcept),
}

impl From<ConceptValue> for AttributeValue {
    fn from(c: ConceptValue) -> Self {
        AttributeValue::Concept(c)
    }
}

impl From<Rational32> for AttributeValue {
    fn from(r: Rational32) -> Self {
        AttributeValue::Rational(r)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

/// An attribute map. `BTreeMap` so graph-XML export is deterministic
/// (spec §6.1's "lossless round-trip" is easiest to test when
/// serialization is stable).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Label(BTreeMap<String, AttributeValue>);

impl Label {
    pub fn new() -> Self {
        Label(BTreeMap::new())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    pub fn get_concept(&self, key: &str) -> Option<ConceptValue> {
        match self.0.get(key) {
            Some(AttributeValue::Concept(c)) => Some(*c),
            _ => None,
        }
    }

    pub fn get_rational(&self, key: &str) -> Option<Rational32> {
        match self.0.get(key) {
            Some(AttributeValue::Rational(r)) => Some(*r),
            _ => None,
        }
    }

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        match self.0.get(key) {
            Some(AttributeValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(AttributeValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key) {
            Some(AttributeValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }
}
