//! Construction and recognition of the "simple" rank features:
//! `attribute(name)`, `constant(name)` and `query(name)`.
//!
//! Everything here is pure; malformed input yields `None`, never an error.

use std::sync::LazyLock;

use rankdef_core::utils::{is_identifier, unquote};
use regex_automata::Input;
use regex_automata::dfa::Automaton;
use regex_automata::dfa::dense;

use super::Reference;
use crate::Result;
use crate::expr::{parser, quote_string};

static PLAIN_ARGUMENT: LazyLock<dense::DFA<Vec<u32>>> = LazyLock::new(|| {
    dense::DFA::new(r"^[A-Za-z0-9_][A-Za-z0-9_-]*$").expect("feature argument pattern is valid")
});

fn is_plain(argument: &str) -> bool {
    matches!(PLAIN_ARGUMENT.try_search_fwd(&Input::new(argument)), Ok(Some(_)))
}

fn is_quoted(argument: &str) -> bool {
    argument.len() >= 2 && argument.starts_with('"') && argument.ends_with('"')
}

pub(crate) fn needs_quoting(argument: &str) -> bool {
    !is_plain(argument)
}

/// Wrap `argument` in double quotes unless it is a plain word
/// (`[A-Za-z0-9_][A-Za-z0-9_-]*`) or already quoted.
pub fn quote_if_necessary(argument: &str) -> String {
    if is_plain(argument) || is_quoted(argument) {
        argument.to_owned()
    } else {
        quote_string(argument)
    }
}

/// Parse `name(argument)` or `name(argument).output`; surrounding quotes
/// on the argument are removed.
pub fn parse_simple(text: &str) -> Option<Reference> {
    let text = text.trim();
    let open = text.find('(')?;
    let close = text.rfind(')')?;
    if close < open {
        return None;
    }
    let name = text[..open].trim();
    if !is_identifier(name) {
        return None;
    }
    let argument = unquote(text[open + 1..close].trim());
    let output = match &text[close + 1..] {
        "" => None,
        rest => match rest.strip_prefix('.') {
            Some(output) if !output.is_empty() => Some(output.to_owned()),
            _ => return None,
        },
    };
    Some(Reference::simple(name, argument).with_output(output))
}

/// The unquoted argument of a simple feature written as text.
pub fn argument_of(text: &str) -> Option<String> {
    parse_simple(text).and_then(|reference| reference.simple_argument().map(str::to_owned))
}

pub fn is_attribute_feature(reference: &Reference) -> bool {
    reference.name() == "attribute" && reference.is_simple()
}

pub fn is_constant_feature(reference: &Reference) -> bool {
    reference.name() == "constant" && reference.is_simple()
}

pub fn is_query_feature(reference: &Reference) -> bool {
    reference.name() == "query" && reference.is_simple()
}

pub fn is_simple_feature(reference: &Reference) -> bool {
    is_attribute_feature(reference) || is_constant_feature(reference) || is_query_feature(reference)
}

pub fn as_attribute_feature(name: &str) -> Reference {
    Reference::simple("attribute", name)
}

pub fn as_constant_feature(name: &str) -> Reference {
    Reference::simple("constant", name)
}

pub fn as_query_feature(name: &str) -> Reference {
    Reference::simple("query", name)
}

/// An ordered list of feature references, as written in summary-features,
/// match-features and rank-features declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureList(Vec<Reference>);

impl FeatureList {
    /// Parse references separated by whitespace and/or commas.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self(parser::parse_feature_list(text)?))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reference> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for FeatureList {
    type Item = Reference;
    type IntoIter = std::vec::IntoIter<Reference>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FeatureList {
    type Item = &'a Reference;
    type IntoIter = std::slice::Iter<'a, Reference>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
