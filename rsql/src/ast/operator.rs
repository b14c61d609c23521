use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Display;
use std::hash::{Hash, Hasher};

use crate::errors::{ErrorKind, RsqlError, RsqlResult};

static SYMBOL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(=[a-zA-Z]*=|[><]=?|!=)$").expect("comparison symbol pattern is valid")
});

/// Returns `true` if `symbol` has the lexical shape of a comparison symbol:
/// `=[a-zA-Z]*=`, `<`, `<=`, `>`, `>=` or `!=`.
#[inline]
pub fn is_valid_symbol(symbol: &str) -> bool {
    SYMBOL_PATTERN.is_match(symbol)
}

/// A comparison operator of the RSQL language.
///
/// An operator has a primary symbol, any number of alternate symbols, and a
/// `multi_value` flag telling whether its right hand side is a parenthesised
/// list (`=in=(a,b)`) or a single literal. Two operators are equal when their
/// primary symbols are equal.
///
/// # Examples
///
/// ```rust
/// use rsql::ast::ComparisonOperator;
///
/// let between = ComparisonOperator::new(&["=bt=", "=between="], true).unwrap();
/// assert_eq!(between.symbol(), "=bt=");
/// assert!(between.is_multi_value());
///
/// assert!(ComparisonOperator::new(&["=1="], false).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct ComparisonOperator {
    symbols: Vec<String>,
    multi_value: bool,
}

impl ComparisonOperator {
    /// Creates an operator from its symbols, the first one being the primary symbol.
    ///
    /// # Errors
    ///
    /// Fails with [ErrorKind::InvalidArgument] if no symbol is given or any symbol
    /// does not match the comparison symbol pattern.
    pub fn new(symbols: &[&str], multi_value: bool) -> RsqlResult<Self> {
        if symbols.is_empty() {
            log::error!("Comparison operator requires at least one symbol");
            return Err(RsqlError::new(
                "Comparison operator requires at least one symbol",
                ErrorKind::InvalidArgument,
            ));
        }

        for symbol in symbols {
            if !is_valid_symbol(symbol) {
                log::error!("Invalid comparison operator symbol: {}", symbol);
                return Err(RsqlError::new(
                    &format!(
                        "Symbol '{}' must match =[a-zA-Z]*= or [><]=? or !=",
                        symbol
                    ),
                    ErrorKind::InvalidArgument,
                ));
            }
        }

        Ok(ComparisonOperator::of(symbols, multi_value))
    }

    /// Creates a single-value operator with one symbol.
    pub fn single(symbol: &str) -> RsqlResult<Self> {
        ComparisonOperator::new(&[symbol], false)
    }

    // Symbols of built-in operators are known to be valid.
    pub(crate) fn of(symbols: &[&str], multi_value: bool) -> Self {
        ComparisonOperator {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            multi_value,
        }
    }

    /// Returns the primary symbol.
    #[inline]
    pub fn symbol(&self) -> &str {
        &self.symbols[0]
    }

    /// Returns all symbols, the primary one first.
    #[inline]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    #[inline]
    pub fn is_multi_value(&self) -> bool {
        self.multi_value
    }

    /// Returns `true` if `symbol` is the primary or an alternate symbol.
    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }
}

impl PartialEq for ComparisonOperator {
    fn eq(&self, other: &Self) -> bool {
        self.symbol() == other.symbol()
    }
}

impl Eq for ComparisonOperator {}

impl Hash for ComparisonOperator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol().hash(state);
    }
}

impl Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// `==`
pub fn equal() -> ComparisonOperator {
    ComparisonOperator::of(&["=="], false)
}

/// `!=`
pub fn not_equal() -> ComparisonOperator {
    ComparisonOperator::of(&["!="], false)
}

/// `=gt=` or `>`
pub fn greater_than() -> ComparisonOperator {
    ComparisonOperator::of(&["=gt=", ">"], false)
}

/// `=ge=` or `>=`
pub fn greater_than_or_equal() -> ComparisonOperator {
    ComparisonOperator::of(&["=ge=", ">="], false)
}

/// `=lt=` or `<`
pub fn less_than() -> ComparisonOperator {
    ComparisonOperator::of(&["=lt=", "<"], false)
}

/// `=le=` or `<=`
pub fn less_than_or_equal() -> ComparisonOperator {
    ComparisonOperator::of(&["=le=", "<="], false)
}

/// `=in=`, multi-value
pub fn is_in() -> ComparisonOperator {
    ComparisonOperator::of(&["=in="], true)
}

/// `=out=`, multi-value
pub fn not_in() -> ComparisonOperator {
    ComparisonOperator::of(&["=out="], true)
}

/// `=isnull=`, `=null=` or `=na=`
pub fn is_null() -> ComparisonOperator {
    ComparisonOperator::of(&["=isnull=", "=null=", "=na="], false)
}

/// `=notnull=`, `=nn=` or `=nonnull=`
pub fn not_null() -> ComparisonOperator {
    ComparisonOperator::of(&["=notnull=", "=nn=", "=nonnull="], false)
}

/// `=like=` or `=ke=`
pub fn like() -> ComparisonOperator {
    ComparisonOperator::of(&["=like=", "=ke="], false)
}

/// `=notlike=` or `=nk=`
pub fn not_like() -> ComparisonOperator {
    ComparisonOperator::of(&["=notlike=", "=nk="], false)
}

/// `=icase=` or `=ic=`
pub fn ignore_case() -> ComparisonOperator {
    ComparisonOperator::of(&["=icase=", "=ic="], false)
}

/// `=ilike=` or `=ik=`
pub fn ignore_case_like() -> ComparisonOperator {
    ComparisonOperator::of(&["=ilike=", "=ik="], false)
}

/// `=inotlike=` or `=ni=`
pub fn ignore_case_not_like() -> ComparisonOperator {
    ComparisonOperator::of(&["=inotlike=", "=ni="], false)
}

/// `=bt=`, multi-value with two arguments
pub fn between() -> ComparisonOperator {
    ComparisonOperator::of(&["=bt="], true)
}

/// `=nb=`, multi-value with two arguments
pub fn not_between() -> ComparisonOperator {
    ComparisonOperator::of(&["=nb="], true)
}

/// The operators every parser understands unless configured otherwise.
pub fn default_operators() -> Vec<ComparisonOperator> {
    vec![
        equal(),
        not_equal(),
        greater_than(),
        greater_than_or_equal(),
        less_than(),
        less_than_or_equal(),
        is_in(),
        not_in(),
    ]
}

/// Null checks, pattern matching, case-insensitive equality and ranges.
///
/// These are not registered by default; register them on an
/// [OperatorRegistry](super::OperatorRegistry) to enable them.
pub fn extended_operators() -> Vec<ComparisonOperator> {
    vec![
        is_null(),
        not_null(),
        like(),
        not_like(),
        ignore_case(),
        ignore_case_like(),
        ignore_case_not_like(),
        between(),
        not_between(),
    ]
}
