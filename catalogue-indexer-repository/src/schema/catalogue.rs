//! Schema of the module catalogue index.

use super::{
    Analysis, CustomAnalyzer, FieldMapping, IndexSchema, IndexSettings, TokenFilter, Tokenizer,
};

/// The name of the search index.
pub const DEFAULT_INDEX_NAME: &str = "modules";

/// Field holding the module code, used as the document id.
pub const MODULE_CODE_FIELD: &str = "moduleCode";

/// Field holding the free-form module attributes.
pub const ATTRIBUTES_FIELD: &str = "attributes";

/// Derived field listing the keys of [`ATTRIBUTES_FIELD`].
pub const ATTRIBUTE_LIST_FIELD: &str = "moduleAttributeList";

/// Analyzer producing a level string from a module code, i.e.
/// "CNS1010SX" => "1000", "CS2030" => "2000".
pub const LEVEL_ANALYZER: &str = "level_analyzer";

const FIRST_DIGIT_TOKENIZER: &str = "first_digit_tokenizer";
const FIRST_TOKEN_LIMIT_FILTER: &str = "first_token_limit_filter";
const THOUSANDIZER_FILTER: &str = "thousandizer_filter";

/// The engine's own `max_result_window` default.
pub const DEFAULT_MAX_RESULT_WINDOW: u64 = 10_000;

/// Spare room added to the catalogue size when sizing the result window.
pub const DEFAULT_RESULT_WINDOW_HEADROOM: usize = 5_000;

/// Analysis section declaring [`LEVEL_ANALYZER`].
///
/// The tokenizer splits a code into its non-zero digits, the limit filter
/// keeps the first one, and the replace filter appends three zeros to it.
/// A code without a non-zero digit yields no tokens.
pub fn level_analysis() -> Analysis {
    Analysis::new()
        .with_tokenizer(
            FIRST_DIGIT_TOKENIZER,
            Tokenizer::SimplePattern {
                pattern: "[1-9]{1}".to_string(),
            },
        )
        .with_filter(
            FIRST_TOKEN_LIMIT_FILTER,
            TokenFilter::Limit { max_token_count: 1 },
        )
        .with_filter(
            THOUSANDIZER_FILTER,
            TokenFilter::PatternReplace {
                pattern: "(\\d+)".to_string(),
                replacement: "$1000".to_string(),
            },
        )
        .with_analyzer(
            LEVEL_ANALYZER,
            CustomAnalyzer::new(FIRST_DIGIT_TOKENIZER)
                .with_filter(FIRST_TOKEN_LIMIT_FILTER)
                .with_filter(THOUSANDIZER_FILTER),
        )
}

/// Schema of the module catalogue index.
///
/// - `moduleCode` is full-text searchable, with a `keyword` sub-field for
///   exact matches and a `level` sub-field analyzed by [`LEVEL_ANALYZER`]
///   (`fielddata` enabled so the frontend can aggregate on it).
/// - `moduleCredit` is a short integer, `workload` is text.
/// - Every other field is mapped dynamically.
pub fn module_index_schema(index_name: &str, max_result_window: u64) -> IndexSchema {
    IndexSchema::new(index_name)
        .with_settings(IndexSettings::default().with_max_result_window(max_result_window))
        .with_analysis(level_analysis())
        .with_field("workload", FieldMapping::text())
        .with_field("moduleCredit", FieldMapping::short())
        .with_field(
            MODULE_CODE_FIELD,
            FieldMapping::text()
                .with_sub_field("keyword", FieldMapping::keyword().with_ignore_above(10))
                .with_sub_field(
                    "level",
                    FieldMapping::text()
                        .with_analyzer(LEVEL_ANALYZER)
                        .with_fielddata(true),
                ),
        )
}

/// Size the result window so one unpaginated query can return the whole
/// catalogue.
///
/// The catalogue size plus `headroom` is rounded up to the next multiple of
/// the engine default, and never goes below that default.
pub fn result_window(catalogue_size: usize, headroom: usize) -> u64 {
    let needed = catalogue_size.saturating_add(headroom) as u64;
    needed
        .div_ceil(DEFAULT_MAX_RESULT_WINDOW)
        .saturating_mul(DEFAULT_MAX_RESULT_WINDOW)
        .max(DEFAULT_MAX_RESULT_WINDOW)
}
