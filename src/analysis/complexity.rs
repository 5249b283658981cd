//! Structural complexity scoring.
//!
//! Each function-like unit scores `1 + decision points`; a file scores the sum
//! over its units. Decision points are attributed to the innermost enclosing
//! unit, so code at module level never contributes.

use super::grammar::{branch_rules, tree_sitter_language, BranchRules};
use crate::domain::{Language, SourceFile, UnitComplexity};
use crate::error::ParseFailure;
use std::collections::HashMap;
use std::sync::Arc;
use tree_sitter::{Node, Parser};

/// Capability to split source text into scored units.
///
/// Implemented per language; the selection policy only ever sees the scores.
pub trait UnitParser: Send + Sync {
    fn parse_units(&self, content: &str) -> Result<Vec<UnitComplexity>, ParseFailure>;
}

/// Aggregate complexity of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplexityScore {
    pub total: u32,
    pub units: Vec<UnitComplexity>,
}

impl ComplexityScore {
    pub fn from_units(units: Vec<UnitComplexity>) -> Self {
        let total = units.iter().map(|u| u.complexity).sum();
        Self { total, units }
    }
}

/// Tree-sitter backed unit parser for one bundled grammar.
pub struct TreeSitterUnitParser {
    language: Language,
    rules: &'static BranchRules,
}

impl TreeSitterUnitParser {
    pub fn new(language: Language) -> Option<Self> {
        tree_sitter_language(language)?;
        let rules = branch_rules(language)?;
        Some(Self { language, rules })
    }
}

impl UnitParser for TreeSitterUnitParser {
    fn parse_units(&self, content: &str) -> Result<Vec<UnitComplexity>, ParseFailure> {
        let grammar =
            tree_sitter_language(self.language).ok_or(ParseFailure::Grammar(self.language))?;
        let mut parser = Parser::new();
        parser.set_language(&grammar).map_err(|_| ParseFailure::Grammar(self.language))?;

        let tree = parser.parse(content, None).ok_or(ParseFailure::NoTree)?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(ParseFailure::Syntax { line: first_error_line(root) });
        }
        Ok(score_units(root, content.as_bytes(), self.rules))
    }
}

/// Scores files with the unit parser registered for their language.
#[derive(Clone)]
pub struct ComplexityAnalyzer {
    parsers: HashMap<Language, Arc<dyn UnitParser>>,
}

impl Default for ComplexityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplexityAnalyzer {
    /// Analyzer with a tree-sitter parser for every bundled grammar.
    pub fn new() -> Self {
        let mut parsers: HashMap<Language, Arc<dyn UnitParser>> = HashMap::new();
        for &language in crate::domain::analyzable_languages() {
            if let Some(parser) = TreeSitterUnitParser::new(language) {
                parsers.insert(language, Arc::new(parser));
            }
        }
        Self { parsers }
    }

    /// Register or replace the parser for a language.
    pub fn with_parser(mut self, language: Language, parser: impl UnitParser + 'static) -> Self {
        self.parsers.insert(language, Arc::new(parser));
        self
    }

    pub fn supports(&self, language: Language) -> bool {
        self.parsers.contains_key(&language)
    }

    pub fn analyze(&self, file: &SourceFile) -> Result<ComplexityScore, ParseFailure> {
        let parser = self
            .parsers
            .get(&file.language)
            .ok_or(ParseFailure::UnsupportedLanguage(file.language))?;
        parser.parse_units(&file.content).map(ComplexityScore::from_units)
    }
}

fn score_units(root: Node, source: &[u8], rules: &BranchRules) -> Vec<UnitComplexity> {
    let mut units: Vec<UnitComplexity> = Vec::new();
    let mut stack: Vec<(Node, Option<usize>)> = vec![(root, None)];

    while let Some((node, enclosing)) = stack.pop() {
        let mut owner = enclosing;
        if node.is_named() {
            if rules.units.contains(&node.kind()) {
                units.push(UnitComplexity {
                    name: unit_name(node, source),
                    start_line: node.start_position().row + 1,
                    complexity: 1,
                });
                owner = Some(units.len() - 1);
            } else if let Some(idx) = enclosing {
                units[idx].complexity += decision_points(node, rules);
            }
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        // Reverse so units are discovered in source order.
        for child in children.into_iter().rev() {
            stack.push((child, owner));
        }
    }

    units
}

fn decision_points(node: Node, rules: &BranchRules) -> u32 {
    let kind = node.kind();
    if rules.decisions.contains(&kind) || rules.boolean_nodes.contains(&kind) {
        return 1;
    }
    if rules.binary_expression == Some(kind) {
        let short_circuit = node
            .child_by_field_name("operator")
            .map(|op| rules.boolean_operators.contains(&op.kind()))
            .unwrap_or(false);
        return u32::from(short_circuit);
    }
    if rules.arms.contains(&kind) && has_earlier_arm(node, rules.arms) {
        return 1;
    }
    0
}

fn has_earlier_arm(node: Node, arms: &[&str]) -> bool {
    let mut sibling = node.prev_named_sibling();
    while let Some(prev) = sibling {
        if arms.contains(&prev.kind()) {
            return true;
        }
        sibling = prev.prev_named_sibling();
    }
    false
}

fn unit_name(node: Node, source: &[u8]) -> String {
    node.child_by_field_name("name")
        .and_then(|n| n.utf8_text(source).ok())
        .map(str::to_string)
        .unwrap_or_else(|| "<anonymous>".to_string())
}

fn first_error_line(root: Node) -> usize {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return node.start_position().row + 1;
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    root.start_position().row + 1
}
