//! Lexer and recursive-descent parser for `mkninja.build` scripts.

use core::iter::Peekable;
use core::str::Chars;

mod error;

pub use error::{ParseError, ParseErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    String(String),
    Integer(i64),
    Boolean(bool),
    Array(Vec<Expr>),
    Dict(Vec<(String, Expr)>),
    Identifier(String),
    FunctionCall(String, Vec<Expr>, Vec<(String, Expr)>), // name, args, kwargs in source order
    MethodCall(Box<Expr>, String, Vec<Expr>, Vec<(String, Expr)>), // object, method, args, kwargs
    BinaryOp(Box<Expr>, BinaryOperator, Box<Expr>),
    UnaryOp(UnaryOperator, Box<Expr>),
    Subscript(Box<Expr>, Box<Expr>),
    TernaryOp(Box<Expr>, Box<Expr>, Box<Expr>), // condition ? true_val : false_val
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    In,
    NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Not,
    Minus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assignment(String, Expr),
    AddAssignment(String, Expr),
    Expression(Expr),
    If(
        Expr,
        Vec<Statement>,
        Vec<(Expr, Vec<Statement>)>,
        Option<Vec<Statement>>,
    ), // condition, then, elif_branches, else
    Foreach(Vec<String>, Expr, Vec<Statement>),
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    String(String),
    Integer(i64),
    True,
    False,

    // Identifiers and Keywords
    Identifier(String),
    If,
    Elif,
    Else,
    Endif,
    Foreach,
    Endforeach,
    Break,
    Continue,
    And,
    Or,
    Not,
    In,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,
    AddAssign,
    Question,
    Colon,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,

    // Special
    Newline,
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        let symbol = match self {
            Token::String(s) => return format!("string {s:?}"),
            Token::Integer(i) => return format!("integer {i}"),
            Token::Identifier(name) => return format!("identifier '{name}'"),
            Token::Newline => return "end of line".into(),
            Token::Eof => return "end of file".into(),
            Token::True => "true",
            Token::False => "false",
            Token::If => "if",
            Token::Elif => "elif",
            Token::Else => "else",
            Token::Endif => "endif",
            Token::Foreach => "foreach",
            Token::Endforeach => "endforeach",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::In => "in",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Eq => "==",
            Token::Ne => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::Assign => "=",
            Token::AddAssign => "+=",
            Token::Question => "?",
            Token::Colon => ":",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::LeftBracket => "[",
            Token::RightBracket => "]",
            Token::LeftBrace => "{",
            Token::RightBrace => "}",
            Token::Comma => ",",
            Token::Dot => ".",
        };
        format!("'{symbol}'")
    }
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    // newlines inside (), [] and {} do not end a statement
    depth: usize,
    tokens: Vec<Token>,
    lines: Vec<usize>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            depth: 0,
            tokens: Vec::new(),
            lines: Vec::new(),
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n)
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn push(&mut self, token: Token, line: usize) {
        self.tokens.push(token);
        self.lines.push(line);
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.line, kind)
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r') = self.peek_char() {
            self.next_char();
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                break;
            }
            self.next_char();
        }
    }

    fn read_string(&mut self, quote: char) -> Result<String, ParseError> {
        let mut string = String::new();
        loop {
            match self.next_char() {
                None | Some('\n') => return Err(self.error(ParseErrorKind::UnterminatedString)),
                Some('\\') => match self.next_char() {
                    Some('n') => string.push('\n'),
                    Some('t') => string.push('\t'),
                    Some('r') => string.push('\r'),
                    Some('0') => string.push('\0'),
                    Some(ch @ ('\\' | '\'' | '"')) => string.push(ch),
                    Some(ch) => {
                        string.push('\\');
                        string.push(ch);
                    }
                    None => return Err(self.error(ParseErrorKind::UnterminatedString)),
                },
                Some(ch) if ch == quote => return Ok(string),
                Some(ch) => string.push(ch),
            }
        }
    }

    fn read_multiline_string(&mut self, quote: char) -> Result<String, ParseError> {
        let mut string = String::new();
        let mut consecutive_quotes = 0;

        while let Some(ch) = self.next_char() {
            if ch == quote {
                consecutive_quotes += 1;
                if consecutive_quotes == 3 {
                    return Ok(string);
                }
                continue;
            }
            for _ in 0..consecutive_quotes {
                string.push(quote);
            }
            consecutive_quotes = 0;
            string.push(ch);
        }

        Err(self.error(ParseErrorKind::UnterminatedString))
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(ch) = self.peek_char() {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                break;
            }
            ident.push(ch);
            self.next_char();
        }
        ident
    }

    fn read_number(&mut self) -> Result<i64, ParseError> {
        let mut num_str = String::new();
        while let Some(ch) = self.peek_char() {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                break;
            }
            if ch != '_' {
                num_str.push(ch);
            }
            self.next_char();
        }
        num_str
            .parse()
            .map_err(|_| self.error(ParseErrorKind::InvalidInteger(num_str)))
    }

    fn tokenize(mut self) -> Result<(Vec<Token>, Vec<usize>), ParseError> {
        loop {
            self.skip_whitespace();
            let line = self.line;

            let Some(ch) = self.peek_char() else {
                self.push(Token::Eof, line);
                break;
            };

            let token = match ch {
                '\n' => {
                    self.next_char();
                    let at_line_start = matches!(self.tokens.last(), None | Some(Token::Newline));
                    if self.depth == 0 && !at_line_start {
                        self.push(Token::Newline, line);
                    }
                    continue;
                }
                '#' => {
                    self.skip_comment();
                    continue;
                }
                '\\' if self.peek_ahead(1) == Some('\n') => {
                    // explicit line continuation
                    self.next_char();
                    self.next_char();
                    continue;
                }
                '\'' | '"' => {
                    self.next_char();
                    if self.peek_char() == Some(ch) && self.peek_ahead(1) == Some(ch) {
                        self.next_char();
                        self.next_char();
                        Token::String(self.read_multiline_string(ch)?)
                    } else {
                        Token::String(self.read_string(ch)?)
                    }
                }
                '0'..='9' => Token::Integer(self.read_number()?),
                'a'..='z' | 'A'..='Z' | '_' => {
                    let ident = self.read_identifier();
                    match ident.as_str() {
                        "true" => Token::True,
                        "false" => Token::False,
                        "if" => Token::If,
                        "elif" => Token::Elif,
                        "else" => Token::Else,
                        "endif" => Token::Endif,
                        "foreach" => Token::Foreach,
                        "endforeach" => Token::Endforeach,
                        "break" => Token::Break,
                        "continue" => Token::Continue,
                        "and" => Token::And,
                        "or" => Token::Or,
                        "not" => Token::Not,
                        "in" => Token::In,
                        _ => Token::Identifier(ident),
                    }
                }
                _ => {
                    self.next_char();
                    let followed_by_eq = self.peek_char() == Some('=');
                    let token = match ch {
                        '+' if followed_by_eq => Token::AddAssign,
                        '=' if followed_by_eq => Token::Eq,
                        '!' if followed_by_eq => Token::Ne,
                        '<' if followed_by_eq => Token::Le,
                        '>' if followed_by_eq => Token::Ge,
                        '+' => Token::Plus,
                        '-' => Token::Minus,
                        '*' => Token::Star,
                        '/' => Token::Slash,
                        '%' => Token::Percent,
                        '=' => Token::Assign,
                        '<' => Token::Lt,
                        '>' => Token::Gt,
                        '?' => Token::Question,
                        ':' => Token::Colon,
                        ',' => Token::Comma,
                        '.' => Token::Dot,
                        '(' | '[' | '{' => {
                            self.depth += 1;
                            match ch {
                                '(' => Token::LeftParen,
                                '[' => Token::LeftBracket,
                                _ => Token::LeftBrace,
                            }
                        }
                        ')' | ']' | '}' => {
                            self.depth = self.depth.saturating_sub(1);
                            match ch {
                                ')' => Token::RightParen,
                                ']' => Token::RightBracket,
                                _ => Token::RightBrace,
                            }
                        }
                        _ => return Err(self.error(ParseErrorKind::UnexpectedCharacter(ch))),
                    };
                    if matches!(token, Token::AddAssign | Token::Eq | Token::Ne | Token::Le | Token::Ge) {
                        self.next_char();
                    }
                    token
                }
            };
            self.push(token, line);
        }

        Ok((self.tokens, self.lines))
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    lines: Vec<usize>,
    pos: usize,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let (tokens, lines) = Lexer::new(input).tokenize()?;
        Ok(Parser {
            tokens,
            lines,
            pos: 0,
        })
    }

    pub fn parse(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        self.skip_newlines();
        while !self.check(&Token::Eof) {
            statements.push(self.statement()?);
            self.skip_newlines();
        }
        Ok(statements)
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        let statement = match self.peek() {
            Token::If => return self.if_statement(),
            Token::Foreach => return self.foreach_statement(),
            Token::Break => {
                self.advance();
                Statement::Break
            }
            Token::Continue => {
                self.advance();
                Statement::Continue
            }
            _ => {
                let expr = self.expression()?;
                match expr {
                    Expr::Identifier(name) if self.match_token(&Token::Assign) => {
                        Statement::Assignment(name, self.expression()?)
                    }
                    Expr::Identifier(name) if self.match_token(&Token::AddAssign) => {
                        Statement::AddAssignment(name, self.expression()?)
                    }
                    expr => Statement::Expression(expr),
                }
            }
        };
        self.expect_statement_end()?;
        Ok(statement)
    }

    /// Statements up to (not including) one of `end`.
    fn block(&mut self, end: &[Token], expected: &'static str) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        loop {
            self.skip_newlines();
            if end.iter().any(|token| self.check(token)) {
                return Ok(statements);
            }
            if self.check(&Token::Eof) {
                return Err(self.unexpected(expected));
            }
            statements.push(self.statement()?);
        }
    }

    fn if_statement(&mut self) -> Result<Statement, ParseError> {
        const BRANCH_END: &[Token] = &[Token::Elif, Token::Else, Token::Endif];

        self.expect(&Token::If, "'if'")?;
        let condition = self.expression()?;
        self.expect_statement_end()?;
        let then_branch = self.block(BRANCH_END, "'endif'")?;

        let mut elif_branches = Vec::new();
        while self.match_token(&Token::Elif) {
            let elif_condition = self.expression()?;
            self.expect_statement_end()?;
            let elif_body = self.block(BRANCH_END, "'endif'")?;
            elif_branches.push((elif_condition, elif_body));
        }

        let else_branch = if self.match_token(&Token::Else) {
            self.expect_statement_end()?;
            Some(self.block(&[Token::Endif], "'endif'")?)
        } else {
            None
        };

        self.expect(&Token::Endif, "'endif'")?;
        self.expect_statement_end()?;
        Ok(Statement::If(
            condition,
            then_branch,
            elif_branches,
            else_branch,
        ))
    }

    fn foreach_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect(&Token::Foreach, "'foreach'")?;
        let mut vars = vec![self.identifier()?];
        if self.match_token(&Token::Comma) {
            vars.push(self.identifier()?);
        }
        self.expect(&Token::Colon, "':'")?;
        let iterable = self.expression()?;
        self.expect_statement_end()?;

        let body = self.block(&[Token::Endforeach], "'endforeach'")?;
        self.expect(&Token::Endforeach, "'endforeach'")?;
        self.expect_statement_end()?;
        Ok(Statement::Foreach(vars, iterable, body))
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.ternary()
    }

    fn ternary(&mut self) -> Result<Expr, ParseError> {
        let expr = self.logical_or()?;

        if self.match_token(&Token::Question) {
            let true_val = self.expression()?;
            self.expect(&Token::Colon, "':'")?;
            let false_val = self.expression()?;
            return Ok(Expr::TernaryOp(
                Box::new(expr),
                Box::new(true_val),
                Box::new(false_val),
            ));
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.logical_and()?;

        while self.match_token(&Token::Or) {
            let right = self.logical_and()?;
            left = Expr::BinaryOp(Box::new(left), BinaryOperator::Or, Box::new(right));
        }

        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.in_expr()?;

        while self.match_token(&Token::And) {
            let right = self.in_expr()?;
            left = Expr::BinaryOp(Box::new(left), BinaryOperator::And, Box::new(right));
        }

        Ok(left)
    }

    fn in_expr(&mut self) -> Result<Expr, ParseError> {
        let left = self.equality()?;

        let op = if self.match_token(&Token::In) {
            BinaryOperator::In
        } else if self.check(&Token::Not) && matches!(self.peek_at(1), Token::In) {
            self.advance();
            self.advance();
            BinaryOperator::NotIn
        } else {
            return Ok(left);
        };

        let right = self.equality()?;
        Ok(Expr::BinaryOp(Box::new(left), op, Box::new(right)))
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.comparison()?;

        loop {
            let op = match self.peek() {
                Token::Eq => BinaryOperator::Eq,
                Token::Ne => BinaryOperator::Ne,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.comparison()?;
            left = Expr::BinaryOp(Box::new(left), op, Box::new(right));
        }
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.addition()?;

        loop {
            let op = match self.peek() {
                Token::Lt => BinaryOperator::Lt,
                Token::Le => BinaryOperator::Le,
                Token::Gt => BinaryOperator::Gt,
                Token::Ge => BinaryOperator::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.addition()?;
            left = Expr::BinaryOp(Box::new(left), op, Box::new(right));
        }
    }

    fn addition(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.multiplication()?;

        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.multiplication()?;
            left = Expr::BinaryOp(Box::new(left), op, Box::new(right));
        }
    }

    fn multiplication(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;

        loop {
            let op = match self.peek() {
                Token::Star => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                Token::Percent => BinaryOperator::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = Expr::BinaryOp(Box::new(left), op, Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&Token::Not) {
            let expr = self.unary()?;
            return Ok(Expr::UnaryOp(UnaryOperator::Not, Box::new(expr)));
        }

        if self.match_token(&Token::Minus) {
            let expr = self.unary()?;
            return Ok(Expr::UnaryOp(UnaryOperator::Minus, Box::new(expr)));
        }

        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;

        loop {
            match self.peek() {
                Token::LeftParen => {
                    let Expr::Identifier(name) = expr else {
                        return Err(self.unexpected("end of expression"));
                    };
                    self.advance();
                    let (args, kwargs) = self.arguments()?;
                    self.expect(&Token::RightParen, "')'")?;
                    expr = Expr::FunctionCall(name, args, kwargs);
                }
                Token::LeftBracket => {
                    self.advance();
                    let index = self.expression()?;
                    self.expect(&Token::RightBracket, "']'")?;
                    expr = Expr::Subscript(Box::new(expr), Box::new(index));
                }
                Token::Dot => {
                    self.advance();
                    let method = self.identifier()?;
                    // without parentheses this is an attribute read
                    let (args, kwargs) = if self.match_token(&Token::LeftParen) {
                        let arguments = self.arguments()?;
                        self.expect(&Token::RightParen, "')'")?;
                        arguments
                    } else {
                        (Vec::new(), Vec::new())
                    };
                    expr = Expr::MethodCall(Box::new(expr), method, args, kwargs);
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let expr = match self.peek() {
            Token::String(s) => Expr::String(s.clone()),
            Token::Integer(i) => Expr::Integer(*i),
            Token::True => Expr::Boolean(true),
            Token::False => Expr::Boolean(false),
            Token::Identifier(name) => Expr::Identifier(name.clone()),
            Token::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(&Token::RightParen, "')'")?;
                return Ok(expr);
            }
            Token::LeftBracket => {
                self.advance();
                let elements = self.array_elements()?;
                self.expect(&Token::RightBracket, "']'")?;
                return Ok(Expr::Array(elements));
            }
            Token::LeftBrace => {
                self.advance();
                let dict = self.dict_elements()?;
                self.expect(&Token::RightBrace, "'}'")?;
                return Ok(Expr::Dict(dict));
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        Ok(expr)
    }

    fn array_elements(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut elements = Vec::new();

        while !self.check(&Token::RightBracket) {
            elements.push(self.expression()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        Ok(elements)
    }

    fn dict_elements(&mut self) -> Result<Vec<(String, Expr)>, ParseError> {
        let mut dict = Vec::new();

        while !self.check(&Token::RightBrace) {
            // string keys, or identifiers as shorthand
            let key = match self.peek() {
                Token::String(s) | Token::Identifier(s) => s.clone(),
                _ => return Err(self.unexpected("a dictionary key")),
            };
            self.advance();
            self.expect(&Token::Colon, "':'")?;
            dict.push((key, self.expression()?));

            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        Ok(dict)
    }

    fn arguments(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), ParseError> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();

        while !self.check(&Token::RightParen) {
            let line = self.line();
            if let (Token::Identifier(name), Token::Colon) = (self.peek(), self.peek_at(1)) {
                let name = name.clone();
                self.advance();
                self.advance();
                if kwargs.iter().any(|(seen, _)| *seen == name) {
                    return Err(ParseError::new(line, ParseErrorKind::DuplicateKeyword(name)));
                }
                let value = self.expression()?;
                kwargs.push((name, value));
            } else {
                if !kwargs.is_empty() {
                    return Err(ParseError::new(line, ParseErrorKind::PositionalAfterKeyword));
                }
                args.push(self.expression()?);
            }

            if !self.match_token(&Token::Comma) {
                break;
            }
        }

        Ok((args, kwargs))
    }

    // Helper methods
    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &Token {
        // the token stream always ends with Eof
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    fn line(&self) -> usize {
        let last = self.lines.len() - 1;
        self.lines[self.pos.min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        core::mem::discriminant(self.peek()) == core::mem::discriminant(token)
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> Result<(), ParseError> {
        if self.match_token(token) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_statement_end(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Token::Newline => {
                self.advance();
                Ok(())
            }
            Token::Eof => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&Token::Newline) {
            self.advance();
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::new(
            self.line(),
            ParseErrorKind::UnexpectedToken {
                found: self.peek().describe(),
                expected,
            },
        )
    }
}

pub fn parse_script(content: &str) -> Result<Vec<Statement>, ParseError> {
    Parser::new(content)?.parse()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn string(s: &str) -> Expr {
        Expr::String(s.into())
    }

    #[test]
    fn test_dict_with_comments() {
        let input = r#"
aliases = {
    # first
    'arm64' : 'aarch64',
    # second
    crisv32 : 'cris',
}
"#;
        let statements = parse_script(input).unwrap();
        assert_eq!(
            statements,
            vec![Statement::Assignment(
                "aliases".into(),
                Expr::Dict(vec![
                    ("arm64".into(), string("aarch64")),
                    ("crisv32".into(), string("cris")),
                ])
            )]
        );
    }

    #[test]
    fn test_call_spanning_lines() {
        let input = r#"
t = add_target(
    command: 'echo hi > out.txt',
    outputs: [
        'out.txt',
    ],
)
"#;
        let statements = parse_script(input).unwrap();
        let [Statement::Assignment(name, Expr::FunctionCall(func, args, kwargs))] =
            statements.as_slice()
        else {
            panic!("unexpected parse: {statements:?}");
        };
        assert_eq!(name, "t");
        assert_eq!(func, "add_target");
        assert!(args.is_empty());
        assert_eq!(
            kwargs,
            &[
                ("command".to_string(), string("echo hi > out.txt")),
                ("outputs".to_string(), Expr::Array(vec![string("out.txt")])),
            ]
        );
    }

    #[test]
    fn test_multiline_string() {
        let input = "msg = '''\nfirst \"line\"\n  second ''line\n'''\n";
        let statements = parse_script(input).unwrap();
        assert_eq!(
            statements,
            vec![Statement::Assignment(
                "msg".into(),
                string("\nfirst \"line\"\n  second ''line\n")
            )]
        );
    }

    #[test]
    fn test_control_flow() {
        let input = r#"
foreach name : ['a', 'b']
  if name == 'a'
    continue
  elif name not in ['c']
    message(name)
  else
    break
  endif
endforeach
"#;
        let statements = parse_script(input).unwrap();
        let [Statement::Foreach(vars, _, body)] = statements.as_slice() else {
            panic!("unexpected parse: {statements:?}");
        };
        assert_eq!(vars, &["name".to_string()]);
        let [Statement::If(_, then_branch, elifs, Some(else_branch))] = body.as_slice() else {
            panic!("unexpected body: {body:?}");
        };
        assert_eq!(then_branch, &[Statement::Continue]);
        assert!(matches!(
            elifs[0].0,
            Expr::BinaryOp(_, BinaryOperator::NotIn, _)
        ));
        assert_eq!(else_branch, &[Statement::Break]);
    }

    #[test]
    fn test_method_and_attribute() {
        let statements = parse_script("x = t.OUT\ny = SRC.split('/')[-1]\n").unwrap();
        assert_eq!(
            statements[0],
            Statement::Assignment(
                "x".into(),
                Expr::MethodCall(
                    Box::new(Expr::Identifier("t".into())),
                    "OUT".into(),
                    vec![],
                    vec![]
                )
            )
        );
        assert!(matches!(
            &statements[1],
            Statement::Assignment(_, Expr::Subscript(_, index))
                if **index == Expr::UnaryOp(UnaryOperator::Minus, Box::new(Expr::Integer(1)))
        ));
    }

    #[test]
    fn test_precedence() {
        let statements = parse_script("x = 1 + 2 * 3 == 7 and not false\n").unwrap();
        let Statement::Assignment(_, Expr::BinaryOp(left, BinaryOperator::And, _)) = &statements[0]
        else {
            panic!("unexpected parse: {statements:?}");
        };
        assert!(matches!(**left, Expr::BinaryOp(_, BinaryOperator::Eq, _)));
    }

    #[test]
    fn test_errors_report_line() {
        let err = parse_script("a = 1\nb = (2\n\nc = 3\n").unwrap_err();
        assert_eq!(err.line, 4);

        let err = parse_script("x = 'open\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);

        let err = parse_script("if true\nmessage('x')\n").unwrap_err();
        assert!(err.to_string().contains("expected 'endif'"));

        let err = parse_script("f(a: 1, 2)").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::PositionalAfterKeyword);

        let err = parse_script("f(a: 1, a: 2)").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicateKeyword("a".into()));

        let err = parse_script("x = 1 y = 2").unwrap_err();
        assert_eq!(err.line, 1);
    }
}
