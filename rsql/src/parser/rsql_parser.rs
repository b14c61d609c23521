use super::lexer::{Lexer, Token, TokenKind};
use crate::ast::{LogicalOperator, Node, NodesFactory, OperatorRegistry};
use crate::errors::{ErrorKind, RsqlError, RsqlResult};

/// Default maximum nesting depth of parenthesised groups.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Recursive-descent parser for RSQL text.
///
/// The parser itself only holds a read-only [NodesFactory]; every call to
/// [RsqlParser::parse] builds its own parse state, so a single parser can be
/// shared across threads.
///
/// # Grammar
///
/// ```text
/// input      = or, EOF
/// or         = and, { "," , and }
/// and        = constraint, { ";" , constraint }
/// constraint = group | comparison
/// group      = "(", or, ")"
/// comparison = selector, operator, arguments
/// arguments  = "(", value, { ",", value }, ")" | value
/// value      = unreserved-string | quoted-string
/// ```
///
/// # Examples
///
/// ```rust
/// use rsql::parser::RsqlParser;
///
/// let parser = RsqlParser::new();
/// let node = parser.parse("name==john;age=gt=30").unwrap();
/// assert_eq!(node.to_string(), "(name==john;age=gt=30)");
/// ```
#[derive(Clone)]
pub struct RsqlParser {
    factory: NodesFactory,
    max_depth: usize,
}

impl RsqlParser {
    /// Creates a parser over the default operators.
    pub fn new() -> Self {
        RsqlParser::with_factory(NodesFactory::default())
    }

    /// Creates a parser that only accepts the operators in `operators`.
    pub fn with_operators(operators: OperatorRegistry) -> Self {
        RsqlParser::with_factory(NodesFactory::new(operators))
    }

    pub fn with_factory(factory: NodesFactory) -> Self {
        RsqlParser {
            factory,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the maximum nesting depth of groups.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn factory(&self) -> &NodesFactory {
        &self.factory
    }

    /// Parses `input` into an AST.
    ///
    /// # Errors
    ///
    /// * [ErrorKind::LexicalError] on an illegal character
    /// * [ErrorKind::SyntaxError] when the tokens do not match the grammar
    /// * [ErrorKind::UnknownOperator] on an unregistered comparison symbol
    /// * [ErrorKind::InvalidArgument] when a single-value operator gets a list
    pub fn parse(&self, input: &str) -> RsqlResult<Node> {
        log::debug!("Parsing RSQL expression: {}", input);
        let mut context = ParseContext::new(&self.factory, input, self.max_depth)?;
        let node = context.parse_or()?;
        context.expect_eof()?;
        Ok(node)
    }
}

impl Default for RsqlParser {
    fn default() -> Self {
        RsqlParser::new()
    }
}

struct ParseContext<'a> {
    factory: &'a NodesFactory,
    lexer: Lexer<'a>,
    current: Token,
    last: Option<Token>,
    depth: usize,
    max_depth: usize,
}

impl<'a> ParseContext<'a> {
    fn new(factory: &'a NodesFactory, input: &'a str, max_depth: usize) -> RsqlResult<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(ParseContext {
            factory,
            lexer,
            current,
            last: None,
            depth: 0,
            max_depth,
        })
    }

    fn advance(&mut self) -> RsqlResult<Token> {
        let next = self.lexer.next_token()?;
        let consumed = std::mem::replace(&mut self.current, next);
        self.last = Some(consumed.clone());
        Ok(consumed)
    }

    fn parse_or(&mut self) -> RsqlResult<Node> {
        let mut children = vec![self.parse_and()?];
        while self.current.kind() == &TokenKind::Or {
            self.advance()?;
            children.push(self.parse_and()?);
        }
        self.factory.create_logical_node(LogicalOperator::Or, children)
    }

    fn parse_and(&mut self) -> RsqlResult<Node> {
        let mut children = vec![self.parse_constraint()?];
        while self.current.kind() == &TokenKind::And {
            self.advance()?;
            children.push(self.parse_constraint()?);
        }
        self.factory.create_logical_node(LogicalOperator::And, children)
    }

    fn parse_constraint(&mut self) -> RsqlResult<Node> {
        if self.current.kind() != &TokenKind::LParen {
            return self.parse_comparison();
        }

        if self.depth >= self.max_depth {
            log::error!("Maximum nesting depth {} exceeded", self.max_depth);
            return Err(self.syntax_error(&[&format!("at most {} nested groups", self.max_depth)]));
        }

        self.advance()?;
        self.depth += 1;
        let node = self.parse_or()?;
        self.depth -= 1;

        match self.current.kind() {
            TokenKind::RParen => {
                self.advance()?;
                Ok(node)
            }
            _ => Err(self.syntax_error(&["')'", "';'", "','"])),
        }
    }

    fn parse_comparison(&mut self) -> RsqlResult<Node> {
        let selector = match self.current.kind() {
            TokenKind::Unreserved(text) => text.clone(),
            _ => return Err(self.syntax_error(&["selector", "'('"])),
        };
        self.advance()?;

        let symbol = match self.current.kind() {
            TokenKind::Operator(symbol) => symbol.clone(),
            _ => return Err(self.syntax_error(&["comparison operator"])),
        };
        self.advance()?;

        let arguments = self.parse_arguments()?;
        self.factory
            .create_comparison_node(&symbol, &selector, arguments)
    }

    fn parse_arguments(&mut self) -> RsqlResult<Vec<String>> {
        if self.current.kind() != &TokenKind::LParen {
            return Ok(vec![self.parse_value()?]);
        }

        self.advance()?;
        let mut values = vec![self.parse_value()?];
        loop {
            match self.current.kind() {
                TokenKind::Or => {
                    self.advance()?;
                    values.push(self.parse_value()?);
                }
                TokenKind::RParen => {
                    self.advance()?;
                    return Ok(values);
                }
                _ => return Err(self.syntax_error(&["','", "')'"])),
            }
        }
    }

    fn parse_value(&mut self) -> RsqlResult<String> {
        match self.current.kind() {
            TokenKind::Unreserved(text) | TokenKind::Quoted(text) => {
                let value = text.clone();
                self.advance()?;
                Ok(value)
            }
            _ => Err(self.syntax_error(&["argument"])),
        }
    }

    fn expect_eof(&self) -> RsqlResult<()> {
        if self.current.is_eof() {
            Ok(())
        } else {
            Err(self.syntax_error(&["';'", "','", "<EOF>"]))
        }
    }

    fn syntax_error(&self, expected: &[&str]) -> RsqlError {
        let found = self.current.kind().describe();
        let last_token = self.last.as_ref().map(|t| t.kind().describe());
        let message = format!(
            "Encountered {} at line {}, column {}. Was expecting one of: {}",
            found,
            self.current.line(),
            self.current.column(),
            expected.join(", ")
        );
        log::error!("{}", message);
        RsqlError::new(
            &message,
            ErrorKind::SyntaxError {
                expected: expected.iter().map(|e| e.to_string()).collect(),
                found,
                last_token,
                line: self.current.line(),
                column: self.current.column(),
            },
        )
    }
}
