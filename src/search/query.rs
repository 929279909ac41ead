//! Search query building and compilation

use crate::config::{SearchSettings, StrategyKind};
use crate::search::error::{SearchError, SearchResult};
use crate::search::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tantivy::query::{BooleanQuery, BoostQuery, DisjunctionMaxQuery, EmptyQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, Searcher, Term};

/// Upper bound on dictionary terms a single fuzzy token may expand to
pub const MAX_EXPANSIONS: usize = 100;

/// Largest edit distance the fuzzy matcher accepts
pub const MAX_FUZZINESS: i64 = 2;

/// A field and the weight its matches carry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightedField {
    pub name: String,
    pub weight: f32,
}

/// Structured full-text query, independent of the index it runs against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryDescriptor {
    /// Best-field match of the text across weighted fields
    MultiMatch {
        text: String,
        fields: Vec<WeightedField>,
    },

    /// Fuzzy match of the text on a single field
    Match {
        text: String,
        field: String,
        fuzziness: u8,
        max_expansions: usize,
    },
}

impl QueryDescriptor {
    /// Normalized query text
    pub fn text(&self) -> &str {
        match self {
            QueryDescriptor::MultiMatch { text, .. } | QueryDescriptor::Match { text, .. } => text,
        }
    }

    /// Weight applied to matches in `field`, if the query targets it
    pub fn weight_of(&self, field: &str) -> Option<f32> {
        match self {
            QueryDescriptor::MultiMatch { fields, .. } => {
                fields.iter().find(|f| f.name == field).map(|f| f.weight)
            }
            QueryDescriptor::Match { field: target, .. } => (target == field).then_some(1.0),
        }
    }

    /// Names of the targeted fields
    pub fn fields(&self) -> Vec<&str> {
        match self {
            QueryDescriptor::MultiMatch { fields, .. } => fields.iter().map(|f| f.name.as_str()).collect(),
            QueryDescriptor::Match { field, .. } => vec![field.as_str()],
        }
    }
}

/// Build a two-field query where `primary` matches weigh `boost` times `secondary` ones
pub fn build_multi_field_query(
    text: &str,
    fields: (&str, &str),
    boost: i64,
) -> SearchResult<QueryDescriptor> {
    let (primary, secondary) = fields;

    if boost <= 0 {
        return Err(SearchError::InvalidConfiguration(format!(
            "boost must be a positive integer, got {}",
            boost
        )));
    }
    if primary.is_empty() || secondary.is_empty() {
        return Err(SearchError::InvalidConfiguration(
            "multi-field queries need two non-empty field names".to_string(),
        ));
    }
    if primary == secondary {
        return Err(SearchError::InvalidConfiguration(format!(
            "multi-field queries need two distinct fields, got '{}' twice",
            primary
        )));
    }

    Ok(QueryDescriptor::MultiMatch {
        text: normalize(text),
        fields: vec![
            WeightedField {
                name: primary.to_string(),
                weight: boost as f32,
            },
            WeightedField {
                name: secondary.to_string(),
                weight: 1.0,
            },
        ],
    })
}

/// Build a single-field query tolerating `fuzziness` edits per term
pub fn build_single_field_query(
    text: &str,
    field: &str,
    fuzziness: i64,
) -> SearchResult<QueryDescriptor> {
    if !(0..=MAX_FUZZINESS).contains(&fuzziness) {
        return Err(SearchError::InvalidConfiguration(format!(
            "fuzziness must be between 0 and {}, got {}",
            MAX_FUZZINESS, fuzziness
        )));
    }
    if field.is_empty() {
        return Err(SearchError::InvalidConfiguration(
            "single-field queries need a non-empty field name".to_string(),
        ));
    }

    Ok(QueryDescriptor::Match {
        text: normalize(text),
        field: field.to_string(),
        fuzziness: fuzziness as u8,
        max_expansions: MAX_EXPANSIONS,
    })
}

/// Query variant chosen by configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStrategy {
    MultiField {
        primary: String,
        secondary: String,
        boost: i64,
    },
    SingleField {
        field: String,
        fuzziness: i64,
    },
}

impl QueryStrategy {
    /// Select and check the strategy described by the search settings
    pub fn from_settings(settings: &SearchSettings) -> SearchResult<Self> {
        let strategy = match settings.strategy {
            StrategyKind::MultiField => QueryStrategy::MultiField {
                primary: settings.primary_field.clone(),
                secondary: settings.secondary_field.clone(),
                boost: settings.boost,
            },
            StrategyKind::SingleField => QueryStrategy::SingleField {
                field: settings.primary_field.clone(),
                fuzziness: settings.fuzziness,
            },
        };

        // Surface bad settings at construction rather than on the first search
        strategy.build("")?;
        Ok(strategy)
    }

    /// Build the descriptor for `text`
    pub fn build(&self, text: &str) -> SearchResult<QueryDescriptor> {
        match self {
            QueryStrategy::MultiField {
                primary,
                secondary,
                boost,
            } => build_multi_field_query(text, (primary, secondary), *boost),
            QueryStrategy::SingleField { field, fuzziness } => {
                build_single_field_query(text, field, *fuzziness)
            }
        }
    }
}

/// Compiles descriptors into Tantivy queries against an opened index
pub struct QueryCompiler<'a> {
    index: &'a Index,
    searcher: &'a Searcher,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(index: &'a Index, searcher: &'a Searcher) -> Self {
        Self { index, searcher }
    }

    /// Build a Tantivy query from a descriptor
    pub fn compile(&self, descriptor: &QueryDescriptor) -> SearchResult<Box<dyn Query>> {
        match descriptor {
            QueryDescriptor::MultiMatch { text, fields } => self.compile_multi_match(text, fields),
            QueryDescriptor::Match {
                text,
                field,
                fuzziness,
                max_expansions,
            } => self.compile_fuzzy_match(text, field, *fuzziness, *max_expansions),
        }
    }

    fn compile_multi_match(
        &self,
        text: &str,
        fields: &[WeightedField],
    ) -> SearchResult<Box<dyn Query>> {
        let mut per_field: Vec<Box<dyn Query>> = Vec::new();

        for weighted in fields {
            let field = self.field(&weighted.name)?;
            let tokens = self.analyze(field, text)?;
            if tokens.is_empty() {
                continue;
            }

            let clauses: Vec<(Occur, Box<dyn Query>)> = tokens
                .iter()
                .map(|token| (Occur::Should, term_query(field, token)))
                .collect();

            per_field.push(Box::new(BoostQuery::new(
                Box::new(BooleanQuery::new(clauses)),
                weighted.weight,
            )));
        }

        if per_field.is_empty() {
            return Ok(Box::new(EmptyQuery));
        }

        // Best field wins, as with a multi_match best_fields query
        Ok(Box::new(DisjunctionMaxQuery::new(per_field)))
    }

    fn compile_fuzzy_match(
        &self,
        text: &str,
        field_name: &str,
        fuzziness: u8,
        max_expansions: usize,
    ) -> SearchResult<Box<dyn Query>> {
        let field = self.field(field_name)?;
        let tokens = self.analyze(field, text)?;

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for token in &tokens {
            let variants = self.expand(field, token, fuzziness as usize, max_expansions)?;
            if variants.is_empty() {
                continue;
            }
            let variant_clauses: Vec<(Occur, Box<dyn Query>)> = variants
                .iter()
                .map(|variant| (Occur::Should, term_query(field, variant)))
                .collect();
            clauses.push((Occur::Should, Box::new(BooleanQuery::new(variant_clauses))));
        }

        if clauses.is_empty() {
            return Ok(Box::new(EmptyQuery));
        }

        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    fn field(&self, name: &str) -> SearchResult<Field> {
        self.index.schema().get_field(name).map_err(|_| {
            SearchError::InvalidConfiguration(format!("field '{}' is not searchable", name))
        })
    }

    /// Run `text` through the analyzer the field was indexed with
    fn analyze(&self, field: Field, text: &str) -> SearchResult<Vec<String>> {
        let mut analyzer = self.index.tokenizer_for_field(field)?;
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while let Some(token) = stream.next() {
            tokens.push(token.text.clone());
        }
        Ok(tokens)
    }

    /// Dictionary terms within `distance` edits of `token`, closest first, capped at `max_expansions`
    fn expand(
        &self,
        field: Field,
        token: &str,
        distance: usize,
        max_expansions: usize,
    ) -> SearchResult<Vec<String>> {
        let mut candidates: BTreeSet<(usize, String)> = BTreeSet::new();

        for segment_reader in self.searcher.segment_readers() {
            let inverted_index = segment_reader.inverted_index(field)?;
            let mut stream = inverted_index.terms().stream()?;
            while stream.advance() {
                let Ok(term) = std::str::from_utf8(stream.key()) else {
                    continue;
                };
                if let Some(d) = bounded_edit_distance(token, term, distance) {
                    candidates.insert((d, term.to_string()));
                }
            }
        }

        let mut variants: Vec<String> = Vec::new();
        for (_, term) in candidates {
            if variants.len() >= max_expansions {
                break;
            }
            if !variants.contains(&term) {
                variants.push(term);
            }
        }
        Ok(variants)
    }
}

fn term_query(field: Field, text: &str) -> Box<dyn Query> {
    Box::new(TermQuery::new(
        Term::from_field_text(field, text),
        IndexRecordOption::WithFreqs,
    ))
}

/// Optimal string alignment distance between `a` and `b`, or `None` when it exceeds `max`
pub(crate) fn bounded_edit_distance(a: &str, b: &str, max: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len().abs_diff(b.len()) > max {
        return None;
    }

    let width = b.len() + 1;
    let mut rows = vec![vec![0usize; width]; a.len() + 1];
    for (i, row) in rows.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..width {
        rows[0][j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (rows[i - 1][j] + 1)
                .min(rows[i][j - 1] + 1)
                .min(rows[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(rows[i - 2][j - 2] + 1);
            }
            rows[i][j] = best;
        }
    }

    let distance = rows[a.len()][b.len()];
    (distance <= max).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_weight_is_boost_times_secondary() {
        let query = build_multi_field_query("x", ("title", "description"), 2).unwrap();

        let primary = query.weight_of("title").unwrap();
        let secondary = query.weight_of("description").unwrap();
        assert_eq!(primary, 2.0 * secondary);
        assert_eq!(query.fields(), vec!["title", "description"]);
    }

    #[test]
    fn test_non_positive_boost_is_rejected() {
        for boost in [0, -1, -10] {
            let err = build_multi_field_query("x", ("title", "description"), boost).unwrap_err();
            assert!(matches!(err, SearchError::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn test_multi_field_text_is_normalized() {
        let query = build_multi_field_query("vendédor", ("title", "description"), 2).unwrap();
        assert_eq!(query.text(), "vendedor");
    }

    #[test]
    fn test_duplicate_fields_are_rejected() {
        let err = build_multi_field_query("x", ("title", "title"), 2).unwrap_err();
        assert!(matches!(err, SearchError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_single_field_query() {
        let query = build_single_field_query("Sellérs", "description", 1).unwrap();
        match query {
            QueryDescriptor::Match {
                text,
                field,
                fuzziness,
                max_expansions,
            } => {
                assert_eq!(text, "Sellers");
                assert_eq!(field, "description");
                assert_eq!(fuzziness, 1);
                assert_eq!(max_expansions, MAX_EXPANSIONS);
            }
            other => panic!("unexpected descriptor {:?}", other),
        }
    }

    #[test]
    fn test_fuzziness_out_of_range() {
        assert!(matches!(
            build_single_field_query("x", "title", -1),
            Err(SearchError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            build_single_field_query("x", "title", 3),
            Err(SearchError::InvalidConfiguration(_))
        ));
        assert!(build_single_field_query("x", "title", 0).is_ok());
    }

    #[test]
    fn test_strategy_from_settings() {
        let mut settings = SearchSettings::default();
        let strategy = QueryStrategy::from_settings(&settings).unwrap();
        assert!(matches!(strategy, QueryStrategy::MultiField { boost: 2, .. }));

        settings.strategy = StrategyKind::SingleField;
        let strategy = QueryStrategy::from_settings(&settings).unwrap();
        let descriptor = strategy.build("orders").unwrap();
        assert_eq!(descriptor.fields(), vec!["title"]);

        settings.strategy = StrategyKind::MultiField;
        settings.boost = 0;
        assert!(QueryStrategy::from_settings(&settings).is_err());
    }

    #[test]
    fn test_descriptor_serializes_with_kind_tag() {
        let query = build_multi_field_query("top sellers", ("title", "description"), 3).unwrap();
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["kind"], "multi_match");
        assert_eq!(json["fields"][0]["weight"], 3.0);
    }

    #[test]
    fn test_bounded_edit_distance() {
        assert_eq!(bounded_edit_distance("seller", "seller", 2), Some(0));
        assert_eq!(bounded_edit_distance("seler", "seller", 2), Some(1));
        assert_eq!(bounded_edit_distance("sellre", "seller", 1), Some(1));
        assert_eq!(bounded_edit_distance("order", "seller", 2), None);
        assert_eq!(bounded_edit_distance("a", "abcd", 2), None);
    }
}
