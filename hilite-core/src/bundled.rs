//! Grammars shipped inside the library.
//!
//! The YAML sources live in `grammars/` and are embedded at build time, so the data a
//! grammar author edits is exactly what [GrammarRegistry::with_builtins] loads.
//!
//! [GrammarRegistry::with_builtins]: crate::grammar::GrammarRegistry::with_builtins

pub const COCOSQL: &str = include_str!("../grammars/cocosql.yaml");
pub const COCOSQL_OLD: &str = include_str!("../grammars/cocosql-old.yaml");

/// (file name, YAML source) of every bundled grammar, in registration order.
pub const GRAMMARS: &[(&str, &str)] = &[
    ("cocosql.yaml", COCOSQL),
    ("cocosql-old.yaml", COCOSQL_OLD),
];
