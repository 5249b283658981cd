//! Tree-sitter grammars and per-language complexity rules

use crate::domain::Language;
use tree_sitter::Language as TsLanguage;

/// Node kinds that drive complexity counting for one grammar.
pub struct BranchRules {
    /// Function-like units that receive their own score.
    pub units: &'static [&'static str],
    /// Conditionals, loops and exception handlers: +1 each.
    pub decisions: &'static [&'static str],
    /// Nodes that are short-circuit operators by kind alone: +1 each.
    pub boolean_nodes: &'static [&'static str],
    /// Binary expression kind whose `operator` field may be short-circuiting.
    pub binary_expression: Option<&'static str>,
    pub boolean_operators: &'static [&'static str],
    /// Match/switch arms: every arm after the first among its siblings is +1.
    pub arms: &'static [&'static str],
}

const PYTHON_RULES: BranchRules = BranchRules {
    units: &["function_definition"],
    decisions: &[
        "if_statement",
        "elif_clause",
        "conditional_expression",
        "for_statement",
        "while_statement",
        "for_in_clause",
        "if_clause",
        "except_clause",
        "except_group_clause",
    ],
    boolean_nodes: &["boolean_operator"],
    binary_expression: None,
    boolean_operators: &[],
    arms: &["case_clause"],
};

const RUST_RULES: BranchRules = BranchRules {
    units: &["function_item"],
    decisions: &[
        "if_expression",
        "while_expression",
        "loop_expression",
        "for_expression",
        "try_expression",
    ],
    boolean_nodes: &[],
    binary_expression: Some("binary_expression"),
    boolean_operators: &["&&", "||"],
    arms: &["match_arm"],
};

const JS_RULES: BranchRules = BranchRules {
    units: &[
        "function_declaration",
        "function_expression",
        "generator_function_declaration",
        "generator_function",
        "arrow_function",
        "method_definition",
    ],
    decisions: &[
        "if_statement",
        "for_statement",
        "for_in_statement",
        "while_statement",
        "do_statement",
        "catch_clause",
        "ternary_expression",
    ],
    boolean_nodes: &[],
    binary_expression: Some("binary_expression"),
    boolean_operators: &["&&", "||", "??"],
    arms: &["switch_case", "switch_default"],
};

const GO_RULES: BranchRules = BranchRules {
    units: &["function_declaration", "method_declaration", "func_literal"],
    decisions: &["if_statement", "for_statement"],
    boolean_nodes: &[],
    binary_expression: Some("binary_expression"),
    boolean_operators: &["&&", "||"],
    arms: &["expression_case", "type_case", "default_case", "communication_case"],
};

pub fn supported_tree_sitter_languages() -> &'static [&'static str] {
    &["python", "rust", "javascript", "typescript", "tsx", "go"]
}

/// Grammar for a language, if one is bundled.
pub fn tree_sitter_language(language: Language) -> Option<TsLanguage> {
    let grammar = match language {
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Language::Go => tree_sitter_go::LANGUAGE.into(),
        _ => return None,
    };
    Some(grammar)
}

pub fn branch_rules(language: Language) -> Option<&'static BranchRules> {
    match language {
        Language::Python => Some(&PYTHON_RULES),
        Language::Rust => Some(&RUST_RULES),
        Language::JavaScript | Language::TypeScript | Language::Tsx => Some(&JS_RULES),
        Language::Go => Some(&GO_RULES),
        _ => None,
    }
}
