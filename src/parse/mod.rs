pub mod ast;

use std::rc::Rc;
use crate::{
    error::{ParseError, Where},
    lex::{self, Token, TokenKind},
    util::{ensure_sufficient_stack, ident, Ident},
};

pub use self::ast::{
    BinaryOp,
    Expr,
    FuncDecl,
    Literal,
    LogicalOp,
    Node,
    Stmt,
    UnaryOp,
};

/// Most arguments a call may pass, and most parameters a function may declare.
pub const MAX_ARITY: usize = 8;

/// Parses a whole program. Parsing stops at the first error.
pub fn parse(tokens: &[Token]) -> Result<Vec<Stmt>, ParseError> {
    let mut parser = Parser::new(tokens)?;
    let mut program = Vec::new();
    while !parser.at_end() {
        program.push(parser.declaration()?);
    }
    tracing::trace!(count = program.len(), "parsed statements");
    Ok(program)
}

/// Parses a lone expression, optionally followed by a `;`.
pub fn parse_expr(tokens: &[Token]) -> Result<Node<Expr>, ParseError> {
    let mut parser = Parser::new(tokens)?;
    let expr = parser.expression()?;
    parser.eat(TokenKind::Semicolon);
    if !parser.at_end() {
        return Err(parser.error_at_current("expect end of expression"));
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Result<Self, ParseError> {
        match tokens.last() {
            Some(last) if last.is_eof() => Ok(Self {
                tokens,
                current: 0,
            }),
            // Token streams from the scanner always end in EOF.
            _ => Err(ParseError {
                location: Where::AtEnd,
                line: tokens.last().map(|t| t.line).unwrap_or_default(),
                message: "token stream has no end marker".into(),
            }),
        }
    }

    fn peek(&self) -> &'a Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &'a Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn at_end(&self) -> bool {
        self.peek().is_eof()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &'a Token {
        if !self.at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if !self.at_end() && self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_any(&mut self, kinds: &[TokenKind]) -> Option<&'a Token> {
        if kinds.iter().any(|k| !self.at_end() && self.check(*k)) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, msg: &str) -> Result<&'a Token, ParseError> {
        if !self.at_end() && self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(msg))
        }
    }

    fn expect_ident(&mut self, msg: &str) -> Result<Ident, ParseError> {
        self.expect(TokenKind::Ident, msg).map(|t| ident(&t.lexeme))
    }

    fn error_at(token: &Token, msg: &str) -> ParseError {
        ParseError {
            location: if token.is_eof() { Where::AtEnd } else { Where::At(token.lexeme.clone()) },
            line: token.line,
            message: msg.to_owned(),
        }
    }

    fn error_at_current(&self, msg: &str) -> ParseError {
        Self::error_at(self.peek(), msg)
    }

    fn declaration(&mut self) -> Result<Stmt, ParseError> {
        ensure_sufficient_stack(|| self.declaration_inner())
    }

    fn declaration_inner(&mut self) -> Result<Stmt, ParseError> {
        if self.eat(TokenKind::Var) {
            self.var_decl()
        } else if self.eat(TokenKind::Func) {
            self.func_decl()
        } else {
            self.statement()
        }
    }

    fn var_decl(&mut self) -> Result<Stmt, ParseError> {
        let name = self.expect_ident("expect variable name")?;
        let init = if self.eat(TokenKind::Eq) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "expect ';' after variable declaration")?;
        Ok(Stmt::Var(name, init))
    }

    fn func_decl(&mut self) -> Result<Stmt, ParseError> {
        let name = self.expect_ident("expect function name")?;
        self.expect(TokenKind::LParen, "expect '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            params.push(self.expect_ident("expect parameter name")?);
            while self.eat(TokenKind::Comma) {
                if params.len() >= MAX_ARITY {
                    return Err(Self::error_at(self.previous(), "cannot have more than 8 parameters"));
                }
                params.push(self.expect_ident("expect parameter name")?);
            }
        }
        self.expect(TokenKind::RParen, "expect ')' after parameters")?;

        self.expect(TokenKind::LBrace, "expect '{' before function body")?;
        let body = self.block()?;

        Ok(Stmt::Func(Rc::new(FuncDecl {
            name,
            params,
            body,
        })))
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.eat(TokenKind::Print) {
            let value = self.expression()?;
            self.expect(TokenKind::Semicolon, "expect ';' after value")?;
            Ok(Stmt::Print(value))
        } else if self.eat(TokenKind::LBrace) {
            Ok(Stmt::Block(self.block()?))
        } else if self.eat(TokenKind::If) {
            self.if_stmt()
        } else if self.eat(TokenKind::While) {
            self.while_stmt()
        } else if self.eat(TokenKind::For) {
            self.for_stmt()
        } else if self.eat(TokenKind::Return) {
            self.return_stmt()
        } else {
            let expr = self.expression()?;
            self.expect(TokenKind::Semicolon, "expect ';' after expression")?;
            Ok(Stmt::Expr(expr))
        }
    }

    /// Statements up to the closing `}`. The opening brace is already consumed.
    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            stmts.push(self.declaration()?);
        }
        self.expect(TokenKind::RBrace, "expect '}' after block")?;
        Ok(stmts)
    }

    fn if_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::LParen, "expect '(' after 'if'")?;
        let cond = self.expression()?;
        self.expect(TokenKind::RParen, "expect ')' after if condition")?;

        let then = Box::new(self.statement()?);
        let otherwise = if self.eat(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If(cond, then, otherwise))
    }

    fn while_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::LParen, "expect '(' after 'while'")?;
        let cond = self.expression()?;
        self.expect(TokenKind::RParen, "expect ')' after condition")?;
        let body = self.statement()?;
        Ok(Stmt::While(cond, Box::new(body)))
    }

    // for (init; cond; incr) body  =>  { init; while (cond) { body; incr; } }
    fn for_stmt(&mut self) -> Result<Stmt, ParseError> {
        let for_line = self.previous().line;
        self.expect(TokenKind::LParen, "expect '(' after 'for'")?;

        let init = if self.eat(TokenKind::Semicolon) {
            None
        } else if self.eat(TokenKind::Var) {
            Some(self.var_decl()?)
        } else {
            let expr = self.expression()?;
            self.expect(TokenKind::Semicolon, "expect ';' after loop initializer")?;
            Some(Stmt::Expr(expr))
        };

        let cond = if self.check(TokenKind::Semicolon) {
            Node::new(Expr::Literal(Literal::Bool(true)), for_line)
        } else {
            self.expression()?
        };
        self.expect(TokenKind::Semicolon, "expect ';' after loop condition")?;

        let incr = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(TokenKind::RParen, "expect ')' after for clauses")?;

        let mut body = vec![self.statement()?];
        body.extend(incr.map(Stmt::Expr));
        let looped = Stmt::While(cond, Box::new(Stmt::Block(body)));

        Ok(match init {
            Some(init) => Stmt::Block(vec![init, looped]),
            None => looped,
        })
    }

    fn return_stmt(&mut self) -> Result<Stmt, ParseError> {
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(TokenKind::Semicolon, "expect ';' after return value")?;
        Ok(Stmt::Return(value))
    }

    fn expression(&mut self) -> Result<Node<Expr>, ParseError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Node<Expr>, ParseError> {
        let target = self.or()?;

        if self.eat(TokenKind::Eq) {
            let equals = self.previous();
            let value = self.assignment()?;
            return match &*target {
                Expr::Var(name) => Ok(Node::new(Expr::Assign(*name, value), target.line())),
                _ => Err(Self::error_at(equals, "invalid assignment target")),
            };
        }

        Ok(target)
    }

    fn or(&mut self) -> Result<Node<Expr>, ParseError> {
        let mut expr = self.and()?;
        while let Some(op) = self.eat_any(&[TokenKind::Or]) {
            let rhs = self.and()?;
            let line = op.line;
            expr = Node::new(Expr::Logical(Node::new(LogicalOp::Or, line), expr, rhs), line);
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<Node<Expr>, ParseError> {
        let mut expr = self.equality()?;
        while let Some(op) = self.eat_any(&[TokenKind::And]) {
            let rhs = self.equality()?;
            let line = op.line;
            expr = Node::new(Expr::Logical(Node::new(LogicalOp::And, line), expr, rhs), line);
        }
        Ok(expr)
    }

    /// One left-associative precedence level.
    fn binary_level(
        &mut self,
        ops: &[(TokenKind, BinaryOp)],
        next: fn(&mut Self) -> Result<Node<Expr>, ParseError>,
    ) -> Result<Node<Expr>, ParseError> {
        let mut expr = next(self)?;
        while let Some(&(_, op)) = ops.iter().find(|(kind, _)| !self.at_end() && self.check(*kind)) {
            let line = self.advance().line;
            let rhs = next(self)?;
            expr = Node::new(Expr::Binary(Node::new(op, line), expr, rhs), line);
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Node<Expr>, ParseError> {
        self.binary_level(
            &[(TokenKind::BangEq, BinaryOp::NotEq), (TokenKind::EqEq, BinaryOp::Eq)],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Node<Expr>, ParseError> {
        self.binary_level(
            &[
                (TokenKind::Greater, BinaryOp::Greater),
                (TokenKind::GreaterEq, BinaryOp::GreaterEq),
                (TokenKind::Less, BinaryOp::Less),
                (TokenKind::LessEq, BinaryOp::LessEq),
            ],
            Self::addition,
        )
    }

    fn addition(&mut self) -> Result<Node<Expr>, ParseError> {
        self.binary_level(
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
            Self::multiplication,
        )
    }

    fn multiplication(&mut self) -> Result<Node<Expr>, ParseError> {
        self.binary_level(
            &[(TokenKind::Star, BinaryOp::Mul), (TokenKind::Slash, BinaryOp::Div)],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Node<Expr>, ParseError> {
        ensure_sufficient_stack(|| self.unary_inner())
    }

    fn unary_inner(&mut self) -> Result<Node<Expr>, ParseError> {
        if let Some(op) = self.eat_any(&[TokenKind::Bang, TokenKind::Minus]) {
            let line = op.line;
            let op = if op.kind == TokenKind::Bang { UnaryOp::Not } else { UnaryOp::Neg };
            let operand = self.unary()?;
            return Ok(Node::new(Expr::Unary(Node::new(op, line), operand), line));
        }
        self.call()
    }

    fn call(&mut self) -> Result<Node<Expr>, ParseError> {
        let mut expr = self.primary()?;
        while self.eat(TokenKind::LParen) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Node<Expr>) -> Result<Node<Expr>, ParseError> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            args.push(self.expression()?);
            while self.eat(TokenKind::Comma) {
                if args.len() >= MAX_ARITY {
                    return Err(Self::error_at(self.previous(), "cannot have more than 8 arguments"));
                }
                args.push(self.expression()?);
            }
        }
        let paren = self.expect(TokenKind::RParen, "expect ')' after arguments")?;
        Ok(Node::new(Expr::Call(callee, args), paren.line))
    }

    fn primary(&mut self) -> Result<Node<Expr>, ParseError> {
        ensure_sufficient_stack(|| self.primary_inner())
    }

    fn primary_inner(&mut self) -> Result<Node<Expr>, ParseError> {
        let token = self.peek();
        let line = token.line;
        let expr = match token.kind {
            TokenKind::False => Expr::Literal(Literal::Bool(false)),
            TokenKind::True => Expr::Literal(Literal::Bool(true)),
            TokenKind::Nil => Expr::Literal(Literal::Nil),
            TokenKind::Number | TokenKind::String => match &token.literal {
                Some(lex::Literal::Number(x)) => Expr::Literal(Literal::Number(*x)),
                Some(lex::Literal::Str(s)) => Expr::Literal(Literal::String(s.clone())),
                None => return Err(self.error_at_current("literal token without a value")),
            },
            TokenKind::Ident => Expr::Var(ident(&token.lexeme)),
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "expect ')' after expression")?;
                return Ok(Node::new(Expr::Grouping(inner), line));
            },
            _ => return Err(self.error_at_current("expect expression")),
        };
        self.advance();
        Ok(Node::new(expr, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::{lex::scan, util::Line};

    fn program(src: &str) -> Vec<String> {
        parse(&scan(src).unwrap())
            .unwrap()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn expr(src: &str) -> String {
        parse_expr(&scan(src).unwrap()).unwrap().to_string()
    }

    fn error(src: &str) -> ParseError {
        parse(&scan(src).unwrap()).unwrap_err()
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(expr("1 + 2 * 3 - 4"), "(- (+ 1 (* 2 3)) 4)");
        assert_eq!(expr("-123 * (45.67)"), "(* (- 123) (group 45.67))");
        assert_eq!(expr("!!true"), "(! (! true))");
        assert_eq!(expr("1 < 2 == 3 >= 4"), "(== (< 1 2) (>= 3 4))");
        assert_eq!(expr("a or b and c"), "(or a (and b c))");
        assert_eq!(expr("a = b = 3"), "(= a (= b 3))");
        assert_eq!(expr("f(1)(2, x)"), "(call (call f 1) 2 x)");
        assert_eq!(expr("8 / 4 / 2;"), "(/ (/ 8 4) 2)");
    }

    #[test]
    fn statements() {
        assert_eq!(program("var a; var b = \"s\"; print a; a;"), vec![
            "(var a)",
            "(var b \"s\")",
            "(print a)",
            "(expr a)",
        ]);
        assert_eq!(
            program("if (a) print 1; else { print 2; }"),
            vec!["(if a (print 1) (block (print 2)))"],
        );
        assert_eq!(
            program("func add(a, b) { return a + b; } func nop() { return; }"),
            vec!["(func add (a b) (return (+ a b)))", "(func nop () (return))"],
        );
    }

    #[test]
    fn for_desugars_to_while() {
        assert_eq!(
            program("for (var i = 0; i < 3; i = i + 1) print i;"),
            vec!["(block (var i 0) (while (< i 3) (block (print i) (expr (= i (+ i 1))))))"],
        );
        assert_eq!(program("for (;;) print 1;"), vec!["(while true (block (print 1)))"]);
        assert_eq!(program("for (x = 0; ; ) {}"), vec!["(block (expr (= x 0)) (while true (block (block))))"]);
    }

    #[test]
    fn invalid_assignment_target() {
        let err = error("1 + a = 3;");
        assert_eq!(err.message, "invalid assignment target");
        assert_eq!(err.location, Where::At("=".into()));
    }

    #[test]
    fn missing_semicolon_is_at_end() {
        let err = error("print 1");
        assert_eq!(err.location, Where::AtEnd);
        assert_eq!(err.to_string(), "[line 1] parse error at end: expect ';' after value");
    }

    #[test]
    fn arity_cap() {
        assert!(parse(&scan("func f(a, b, c, d, e, g, h, i) {}").unwrap()).is_ok());
        let err = error("func f(a, b, c, d, e, g, h, i, j) {}");
        assert_eq!(err.message, "cannot have more than 8 parameters");
        assert_eq!(err.location, Where::At(",".into()));

        assert!(parse(&scan("f(1, 2, 3, 4, 5, 6, 7, 8);").unwrap()).is_ok());
        let err = error("f(1, 2, 3, 4, 5, 6, 7, 8, 9);");
        assert_eq!(err.message, "cannot have more than 8 arguments");
        assert_eq!(err.location, Where::At(",".into()));
    }

    #[test]
    fn reserved_words_have_no_expression_form() {
        let err = error("print this;");
        assert_eq!(err.message, "expect expression");
        assert_eq!(err.location, Where::At("this".into()));
    }

    #[test]
    fn first_error_aborts() {
        let err = error("print ;\nprint );");
        assert_eq!(err.line, Line::from(1));
    }

    #[test]
    fn lone_expression_must_consume_input() {
        assert!(parse_expr(&scan("1 2").unwrap()).is_err());
        assert!(parse(&scan("1 + 2").unwrap()).is_err());
        assert_eq!(expr("1 + 2"), "(+ 1 2)");
    }

    #[test]
    fn nodes_carry_lines() {
        let expr = parse_expr(&scan("a\n+\nb").unwrap()).unwrap();
        assert_eq!(expr.line(), Line::from(2));
    }
}
