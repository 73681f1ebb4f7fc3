use crate::ast::*;
use crate::lexer::{self, LexError, Token};

pub struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("Parse error at token {position}: {message}")]
pub struct ParseError {
    pub code: &'static str,
    pub position: usize,
    pub span: Span,
    pub message: String,
}

/// Anything that stops source text from becoming a [`Program`].
#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

type Result<T> = std::result::Result<T, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<(Token, Span)>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| *s)
            .or_else(|| self.tokens.last().map(|(_, s)| Span { start: s.end, end: s.end }))
            .unwrap_or(Span::UNKNOWN)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<Span> {
        match self.peek() {
            Some(tok) if tok == expected => {
                let span = self.peek_span();
                self.pos += 1;
                Ok(span)
            }
            Some(tok) => Err(self.error("DRD-P003", format!("expected {:?}, got {:?}", expected, tok))),
            None => Err(self.error("DRD-P004", format!("expected {:?}, got EOF", expected))),
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(name)
            }
            Some(tok) => Err(self.error("DRD-P005", format!("expected identifier, got {:?}", tok))),
            None => Err(self.error("DRD-P006", "expected identifier, got EOF".into())),
        }
    }

    fn error(&self, code: &'static str, message: String) -> ParseError {
        ParseError {
            code,
            position: self.pos,
            span: self.peek_span(),
            message,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    // ---- Top-level parsing ----

    /// Function definitions are hoisted out of the statement stream.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut program = Program::default();
        while !self.at_end() {
            if self.peek() == Some(&Token::Def) {
                program.functions.push(self.parse_function()?);
            } else {
                program.statements.push(self.parse_stmt()?);
            }
        }
        Ok(program)
    }

    /// `def name(a, b) { stmt* }`
    fn parse_function(&mut self) -> Result<Function> {
        let start = self.expect(&Token::Def)?;
        let name = self.expect_ident()?;
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                params.push(self.expect_ident()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::RParen)?;
        }
        self.expect(&Token::LBrace)?;
        let mut body = Vec::new();
        while !matches!(self.peek(), Some(Token::RBrace) | None) {
            if self.peek() == Some(&Token::Def) {
                return Err(self.error("DRD-P007", format!("function '{}': nested function definitions are not allowed", name)));
            }
            body.push(self.parse_stmt()?);
        }
        let end = self.expect(&Token::RBrace)?;
        Ok(Function { name, params, body, span: start.merge(end) })
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let stmt = match self.peek() {
            Some(Token::Var) => {
                self.pos += 1;
                let mut names = vec![self.expect_ident()?];
                while self.eat(&Token::Comma) {
                    names.push(self.expect_ident()?);
                }
                Stmt::Declare { names }
            }
            Some(Token::Return) => {
                self.pos += 1;
                Stmt::Return(self.parse_expr()?)
            }
            Some(Token::Ident(_)) => {
                let name = self.expect_ident()?;
                match self.peek() {
                    Some(Token::Assign) => {
                        self.pos += 1;
                        Stmt::Assign { name, value: self.parse_expr()? }
                    }
                    Some(Token::Derive) => {
                        self.pos += 1;
                        Stmt::Derive { name, value: self.parse_expr()? }
                    }
                    Some(Token::LParen) => {
                        let args = self.parse_args(Token::LParen, Token::RParen)?;
                        Stmt::Call { function: name, args }
                    }
                    Some(tok) => {
                        return Err(self.error(
                            "DRD-P008",
                            format!("expected '=', '<-' or '(' after '{}', got {:?}", name, tok),
                        ));
                    }
                    None => return Err(self.error("DRD-P004", format!("unexpected EOF after '{}'", name))),
                }
            }
            Some(tok) => return Err(self.error("DRD-P001", format!("expected statement, got {:?}", tok))),
            None => return Err(self.error("DRD-P002", "expected statement, got EOF".into())),
        };
        self.expect(&Token::Semi)?;
        Ok(stmt)
    }

    // ---- Expressions ----

    /// `term (('+' | '-') term)*`
    fn parse_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Subtract,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::BinOp { op, left: Box::new(left), right: Box::new(right) };
        }
    }

    /// `unary (('*' | '/') unary)*`
    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Multiply,
                Some(Token::Slash) => BinOp::Divide,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::BinOp { op, left: Box::new(left), right: Box::new(right) };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Negate(Box::new(self.parse_unary()?)));
        }
        let mut expr = self.parse_primary()?;
        while self.eat(&Token::LBracket) {
            let index = self.parse_expr()?;
            self.expect(&Token::RBracket)?;
            expr = Expr::Index { object: Box::new(expr), index: Box::new(index) };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek().cloned() {
            Some(Token::Int(n)) => {
                self.pos += 1;
                Ok(Expr::Integer(n))
            }
            Some(Token::Str(s)) => {
                self.pos += 1;
                Ok(Expr::Str(s))
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                if self.peek() == Some(&Token::LParen) {
                    let args = self.parse_args(Token::LParen, Token::RParen)?;
                    Ok(Expr::Call { function: name, args })
                } else {
                    Ok(Expr::Ref(name))
                }
            }
            Some(Token::Signal(kind)) => {
                self.pos += 1;
                let args = self.parse_args(Token::LParen, Token::RParen)?;
                Ok(Expr::Signal { kind, args })
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            Some(Token::LBracket) => {
                let items = self.parse_args(Token::LBracket, Token::RBracket)?;
                Ok(Expr::Array(items))
            }
            Some(Token::LBrace) => self.parse_hash(),
            Some(tok) => Err(self.error("DRD-P009", format!("expected expression, got {:?}", tok))),
            None => Err(self.error("DRD-P010", "expected expression, got EOF".into())),
        }
    }

    /// `open [expr (',' expr)*] close`
    fn parse_args(&mut self, open: Token, close: Token) -> Result<Vec<Expr>> {
        self.expect(&open)?;
        let mut items = Vec::new();
        if self.eat(&close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expr()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&close)?;
        Ok(items)
    }

    /// `{k: v, ...}`
    fn parse_hash(&mut self) -> Result<Expr> {
        self.expect(&Token::LBrace)?;
        let mut entries = Vec::new();
        if self.eat(&Token::RBrace) {
            return Ok(Expr::Hash(entries));
        }
        loop {
            let key = self.parse_expr()?;
            self.expect(&Token::Colon)?;
            let value = self.parse_expr()?;
            entries.push((key, value));
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBrace)?;
        Ok(Expr::Hash(entries))
    }
}

pub fn parse(tokens: Vec<(Token, Span)>) -> Result<Program> {
    let mut parser = Parser::new(tokens);
    parser.parse_program()
}

/// Lex and parse in one step, keeping the source on the program for diagnostics.
pub fn parse_source(source: &str) -> std::result::Result<Program, SyntaxError> {
    let tokens = lexer::lex(source)?
        .into_iter()
        .map(|(t, r)| (t, Span { start: r.start, end: r.end }))
        .collect();
    let mut program = parse(tokens)?;
    program.source = Some(source.to_string());
    Ok(program)
}
