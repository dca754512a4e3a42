//! RDF terms as seen by the dictionary
//!
//! A term's identity is its canonical N-Triples encoding (the `Display`
//! output, produced by oxigraph), which is also what identifiers are minted
//! from.

use std::fmt;

use oxigraph::model::{BlankNode, GraphName, Literal, NamedNode, Quad, Term as OxTerm};
use serde::{Deserialize, Serialize};

use crate::core::vocab::xsd;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// IRI, stored without angle brackets
    Iri(String),
    /// Blank node label, stored without the `_:` prefix
    BlankNode(String),
    /// Literal with an optional datatype IRI or language tag
    Literal { value: String, datatype: Option<String>, language: Option<String> },
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn blank_node(label: impl Into<String>) -> Self {
        Term::BlankNode(label.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal { value: value.into(), datatype: None, language: None }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        let datatype = datatype.into();
        // xsd:string is the implicit datatype of plain literals
        let datatype = if datatype == xsd::STRING { None } else { Some(datatype) };
        Term::Literal { value: value.into(), datatype, language: None }
    }

    pub fn language_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: Some(language.into().to_ascii_lowercase()),
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }

    /// Validating conversion to an oxigraph term
    ///
    /// Fails with [`Error::InvalidTerm`] for IRIs, blank node labels or
    /// language tags that are not well formed.
    pub fn to_oxigraph(&self) -> Result<OxTerm> {
        let invalid = |e: &dyn fmt::Display| Error::InvalidTerm(format!("{}: {}", self, e));
        match self {
            Term::Iri(iri) => Ok(NamedNode::new(iri.as_str()).map_err(|e| invalid(&e))?.into()),
            Term::BlankNode(label) => {
                Ok(BlankNode::new(label.as_str()).map_err(|e| invalid(&e))?.into())
            }
            Term::Literal { value, datatype, language } => {
                let literal = match (language, datatype) {
                    (Some(language), _) => {
                        Literal::new_language_tagged_literal(value.as_str(), language.as_str())
                            .map_err(|e| invalid(&e))?
                    }
                    (None, Some(datatype)) => Literal::new_typed_literal(
                        value.as_str(),
                        NamedNode::new(datatype.as_str()).map_err(|e| invalid(&e))?,
                    ),
                    (None, None) => Literal::new_simple_literal(value.as_str()),
                };
                Ok(literal.into())
            }
        }
    }

    fn to_oxigraph_unchecked(&self) -> OxTerm {
        match self {
            Term::Iri(iri) => NamedNode::new_unchecked(iri.as_str()).into(),
            Term::BlankNode(label) => BlankNode::new_unchecked(label.as_str()).into(),
            Term::Literal { value, datatype, language } => {
                let literal = match (language, datatype) {
                    (Some(language), _) => Literal::new_language_tagged_literal_unchecked(
                        value.as_str(),
                        language.as_str(),
                    ),
                    (None, Some(datatype)) => Literal::new_typed_literal(
                        value.as_str(),
                        NamedNode::new_unchecked(datatype.as_str()),
                    ),
                    (None, None) => Literal::new_simple_literal(value.as_str()),
                };
                literal.into()
            }
        }
    }
}

/// Canonical N-Triples form, as printed by oxigraph
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_oxigraph_unchecked(), f)
    }
}

impl TryFrom<OxTerm> for Term {
    type Error = Error;

    fn try_from(term: OxTerm) -> Result<Self> {
        match term {
            OxTerm::NamedNode(node) => Ok(Term::Iri(node.as_str().to_string())),
            OxTerm::BlankNode(node) => Ok(Term::BlankNode(node.as_str().to_string())),
            OxTerm::Literal(literal) => {
                if let Some(language) = literal.language() {
                    Ok(Term::language_literal(literal.value(), language))
                } else {
                    Ok(Term::typed_literal(literal.value(), literal.datatype().as_str()))
                }
            }
            #[allow(unreachable_patterns)]
            other => Err(Error::InvalidTerm(format!("unsupported term kind: {}", other))),
        }
    }
}

/// Split an oxigraph quad into dictionary terms
///
/// Quads in the default graph become three-term triples, others carry the
/// graph name as the fourth (context) term.
pub fn terms_from_quad(quad: &Quad) -> Result<Vec<Term>> {
    let mut terms = vec![
        Term::try_from(OxTerm::from(quad.subject.clone()))?,
        Term::try_from(OxTerm::from(quad.predicate.clone()))?,
        Term::try_from(quad.object.clone())?,
    ];
    match &quad.graph_name {
        GraphName::NamedNode(node) => terms.push(Term::iri(node.as_str())),
        GraphName::BlankNode(node) => terms.push(Term::blank_node(node.as_str())),
        GraphName::DefaultGraph => {}
    }
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ntriples_encoding() {
        assert_eq!(Term::iri("http://example.org/a").to_string(), "<http://example.org/a>");
        assert_eq!(Term::blank_node("b0").to_string(), "_:b0");
        assert_eq!(Term::literal("say \"hi\"").to_string(), "\"say \\\"hi\\\"\"");
        assert_eq!(Term::language_literal("chat", "FR").to_string(), "\"chat\"@fr");
        assert_eq!(
            Term::typed_literal("42", xsd::INTEGER).to_string(),
            "\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
    }

    #[test]
    fn test_encoding_matches_oxigraph() {
        let terms = [
            Term::iri("http://example.org/caf\u{e9}"),
            Term::blank_node("b0"),
            Term::literal("tab\there\u{1}"),
            Term::language_literal("chat", "fr"),
            Term::typed_literal("2024-01-01T00:00:00Z", xsd::DATE_TIME),
        ];
        for term in &terms {
            assert_eq!(term.to_string(), term.to_oxigraph().unwrap().to_string());
        }
        assert_eq!(Term::literal("a\tb\u{1}").to_string(), "\"a\\tb\\u0001\"");
    }

    #[test]
    fn test_malformed_terms_are_rejected() {
        for term in [
            Term::iri("http://example.org/has space"),
            Term::iri("http://example.org/<a>"),
            Term::iri("not an iri"),
            Term::blank_node("has space"),
            Term::language_literal("x", "not a tag"),
            Term::typed_literal("1", "bad datatype"),
        ] {
            assert!(matches!(term.to_oxigraph(), Err(Error::InvalidTerm(_))), "{:?}", term);
        }
    }

    #[test]
    fn test_xsd_string_is_plain() {
        assert_eq!(Term::typed_literal("x", xsd::STRING), Term::literal("x"));
    }

    #[test]
    fn test_from_oxigraph_term() {
        let node = NamedNode::new("http://example.org/alice").unwrap();
        assert_eq!(Term::try_from(OxTerm::from(node)).unwrap(), Term::iri("http://example.org/alice"));

        let literal = Literal::new_simple_literal("30");
        assert_eq!(Term::try_from(OxTerm::from(literal)).unwrap(), Term::literal("30"));

        let tagged = Literal::new_language_tagged_literal("hello", "en").unwrap();
        assert_eq!(
            Term::try_from(OxTerm::from(tagged)).unwrap(),
            Term::language_literal("hello", "en")
        );
    }

    #[test]
    fn test_terms_from_quad() {
        let alice = NamedNode::new("http://example.org/alice").unwrap();
        let knows = NamedNode::new("http://example.org/knows").unwrap();
        let bob = NamedNode::new("http://example.org/bob").unwrap();
        let graph = NamedNode::new("http://example.org/graph1").unwrap();

        let triple = Quad::new(alice.clone(), knows.clone(), bob.clone(), GraphName::DefaultGraph);
        assert_eq!(terms_from_quad(&triple).unwrap().len(), 3);

        let quad = Quad::new(alice, knows, bob, graph);
        let terms = terms_from_quad(&quad).unwrap();
        assert_eq!(terms.len(), 4);
        assert_eq!(terms[3], Term::iri("http://example.org/graph1"));
    }
}
