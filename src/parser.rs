use crate::ast::{AssignTarget, BinaryOp, Expr, FStringPart, NodeType, Stmt, UnaryOp};
use crate::error::{error_context, ErrorContext, Location, SyntaxError, SyntaxErrorType};
use crate::features::LanguageFeatures;
use crate::lexer::{Lexer, Token, TokenType};
use std::rc::Rc;

/// Scans and parses `source`, stopping at the first error.
pub fn parse(source: &str, features: &LanguageFeatures) -> Result<Vec<Stmt>, SyntaxError> {
    let tokens = Lexer::new(source).scan_tokens()?;
    Parser::new(tokens, features).parse()
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    features: LanguageFeatures,
    loop_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, features: &LanguageFeatures) -> Self {
        Self {
            tokens,
            current: 0,
            features: features.clone(),
            loop_depth: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        tracing::debug!(statements = statements.len(), "parsed program");
        Ok(statements)
    }

    /// Parses the whole program, skipping to the next statement after each error.
    pub fn parse_all(&mut self) -> (Vec<Stmt>, Vec<SyntaxError>) {
        let mut statements = Vec::new();
        let mut errors = Vec::new();

        while !self.is_at_end() {
            // Leftover dedents from a block abandoned during recovery.
            if self.match_types(&[TokenType::Dedent]) {
                continue;
            }
            match self.declaration() {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    tracing::debug!(error = %error, "recovering from syntax error");
                    errors.push(error);
                    self.synchronize();
                }
            }
        }

        (statements, errors)
    }

    fn synchronize(&mut self) {
        self.loop_depth = 0;
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::Newline {
                return;
            }

            match self.peek().token_type {
                TokenType::Def
                | TokenType::If
                | TokenType::While
                | TokenType::For
                | TokenType::Return => return,
                _ => {}
            }

            self.advance();
        }
    }

    fn declaration(&mut self) -> Result<Stmt, SyntaxError> {
        if self.check(&TokenType::Indent) {
            return Err(self.error_at_current(SyntaxErrorType::UnexpectedIndentation));
        }
        if self.match_types(&[TokenType::Def]) {
            return self.function_declaration();
        }
        self.statement()
    }

    fn statement(&mut self) -> Result<Stmt, SyntaxError> {
        if self.match_types(&[TokenType::If]) {
            let keyword = self.previous().clone();
            self.if_statement(keyword)
        } else if self.match_types(&[TokenType::For]) {
            self.for_statement()
        } else if self.match_types(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_types(&[TokenType::Return]) {
            self.return_statement()
        } else if self.match_types(&[TokenType::Break]) {
            self.loop_control(NodeType::BreakStatement)
        } else if self.match_types(&[TokenType::Continue]) {
            self.loop_control(NodeType::ContinueStatement)
        } else if self.is_assignment_ahead() {
            self.assignment()
        } else {
            self.expression_statement()
        }
    }

    /// `name =`, `name[...] =` or `name[...][...] =` starts an assignment.
    fn is_assignment_ahead(&self) -> bool {
        let token_at = |i: usize| self.tokens.get(i).map(|t| t.token_type);

        let mut i = self.current;
        if token_at(i) != Some(TokenType::Identifier) {
            return false;
        }
        i += 1;

        while token_at(i) == Some(TokenType::LeftBracket) {
            let mut depth = 0usize;
            loop {
                match token_at(i) {
                    Some(TokenType::LeftBracket) => depth += 1,
                    Some(TokenType::RightBracket) => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    Some(TokenType::Newline) | Some(TokenType::Eof) | None => return false,
                    _ => {}
                }
                i += 1;
            }
            i += 1;
        }

        token_at(i) == Some(TokenType::Equal)
    }

    fn block(&mut self) -> Result<Stmt, SyntaxError> {
        let (statements, location) = self.block_body()?;
        Ok(Stmt::Block {
            statements,
            location,
        })
    }

    fn block_body(&mut self) -> Result<(Vec<Stmt>, Location), SyntaxError> {
        let start = self.peek().location;
        self.check_node_allowed(NodeType::BlockStatement, start)?;

        if !self.match_types(&[TokenType::Newline]) {
            return Err(self.error_at_current(SyntaxErrorType::MissingIndent));
        }
        self.consume(TokenType::Indent, SyntaxErrorType::MissingIndent)?;

        let mut statements = Vec::new();
        while !self.check(&TokenType::Dedent) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        self.consume(TokenType::Dedent, SyntaxErrorType::MissingDedent)?;

        let location = match (statements.first(), statements.last()) {
            (Some(first), Some(last)) => Location::between(first.location(), last.location()),
            _ => start,
        };
        Ok((statements, location))
    }

    fn loop_body(&mut self) -> Result<Stmt, SyntaxError> {
        self.loop_depth += 1;
        let body = self.block();
        self.loop_depth -= 1;
        body
    }

    fn if_statement(&mut self, keyword: Token) -> Result<Stmt, SyntaxError> {
        self.check_node_allowed(NodeType::IfStatement, keyword.location)?;

        let condition = self.expression()?;
        let colon = self.consume_with(
            TokenType::Colon,
            SyntaxErrorType::MissingColon,
            error_context([("after", "if condition".to_string())]),
        )?;
        let then_branch = Box::new(self.block()?);

        let else_branch = if self.match_types(&[TokenType::Elif]) {
            let elif = self.previous().clone();
            Some(Box::new(self.if_statement(elif)?))
        } else if self.match_types(&[TokenType::Else]) {
            self.consume_with(
                TokenType::Colon,
                SyntaxErrorType::MissingColon,
                error_context([("after", "else".to_string())]),
            )?;
            Some(Box::new(self.block()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            location: Location::between(keyword.location, colon.location),
        })
    }

    fn for_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let keyword = self.previous().clone();
        self.check_node_allowed(NodeType::ForInStatement, keyword.location)?;

        let variable = self.consume(TokenType::Identifier, SyntaxErrorType::MissingIdentifier)?;
        self.consume(TokenType::In, SyntaxErrorType::MissingIn)?;
        let iterable = self.expression()?;
        let colon = self.consume_with(
            TokenType::Colon,
            SyntaxErrorType::MissingColon,
            error_context([("after", "for loop".to_string())]),
        )?;
        let body = Box::new(self.loop_body()?);

        Ok(Stmt::ForIn {
            variable: variable.lexeme,
            iterable,
            body,
            location: Location::between(keyword.location, colon.location),
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let keyword = self.previous().clone();
        self.check_node_allowed(NodeType::WhileStatement, keyword.location)?;

        let condition = self.expression()?;
        let colon = self.consume_with(
            TokenType::Colon,
            SyntaxErrorType::MissingColon,
            error_context([("after", "while condition".to_string())]),
        )?;
        let body = Box::new(self.loop_body()?);

        Ok(Stmt::While {
            condition,
            body,
            location: Location::between(keyword.location, colon.location),
        })
    }

    fn function_declaration(&mut self) -> Result<Stmt, SyntaxError> {
        let keyword = self.previous().clone();
        self.check_node_allowed(NodeType::FunctionDeclaration, keyword.location)?;

        let name = self
            .consume(TokenType::Identifier, SyntaxErrorType::MissingFunctionName)?
            .lexeme;
        self.consume_with(
            TokenType::LeftParen,
            SyntaxErrorType::MissingLeftParenthesisAfterFunctionName,
            error_context([("function", name.clone())]),
        )?;

        let mut parameters: Vec<String> = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                let parameter =
                    self.consume(TokenType::Identifier, SyntaxErrorType::MissingParameterName)?;
                if parameters.contains(&parameter.lexeme) {
                    return Err(SyntaxError::new(
                        SyntaxErrorType::DuplicateParameterName,
                        parameter.location,
                        error_context([("parameter", parameter.lexeme)]),
                    ));
                }
                parameters.push(parameter.lexeme);

                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume(
            TokenType::RightParen,
            SyntaxErrorType::MissingRightParenthesisAfterParameters,
        )?;
        let colon = self.consume(
            TokenType::Colon,
            SyntaxErrorType::MissingColonAfterFunctionSignature,
        )?;

        // A loop around the definition does not make `break` valid inside it.
        let enclosing_loops = std::mem::take(&mut self.loop_depth);
        let body = self.block_body();
        self.loop_depth = enclosing_loops;
        let (body, _) = body?;

        Ok(Stmt::FunctionDeclaration {
            name,
            parameters,
            body: Rc::new(body),
            location: Location::between(keyword.location, colon.location),
        })
    }

    fn return_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let keyword = self.previous().clone();
        self.check_node_allowed(NodeType::ReturnStatement, keyword.location)?;

        let value = if self.at_statement_end() {
            None
        } else {
            Some(self.expression()?)
        };
        let location = match &value {
            Some(value) => Location::between(keyword.location, value.location()),
            None => keyword.location,
        };
        self.end_of_statement()?;

        Ok(Stmt::Return { value, location })
    }

    fn loop_control(&mut self, node_type: NodeType) -> Result<Stmt, SyntaxError> {
        let location = self.previous().location;
        self.check_node_allowed(node_type, location)?;

        if self.loop_depth == 0 {
            let error_type = if node_type == NodeType::BreakStatement {
                SyntaxErrorType::BreakOutsideLoop
            } else {
                SyntaxErrorType::ContinueOutsideLoop
            };
            return Err(SyntaxError::bare(error_type, location));
        }
        self.end_of_statement()?;

        Ok(if node_type == NodeType::BreakStatement {
            Stmt::Break { location }
        } else {
            Stmt::Continue { location }
        })
    }

    fn assignment(&mut self) -> Result<Stmt, SyntaxError> {
        let name = self.advance().clone();
        self.check_node_allowed(NodeType::AssignmentStatement, name.location)?;

        let target = if self.check(&TokenType::LeftBracket) {
            self.check_node_allowed(NodeType::IdentifierExpression, name.location)?;
            let mut object = Expr::Identifier {
                name: name.lexeme.clone(),
                location: name.location,
            };
            let (mut index, mut close) = self.subscript_index()?;
            while self.check(&TokenType::LeftBracket) {
                object = Expr::Subscript {
                    location: Location::between(object.location(), close),
                    object: Box::new(object),
                    index: Box::new(index),
                };
                (index, close) = self.subscript_index()?;
            }
            AssignTarget::Subscript {
                object: Box::new(object),
                index: Box::new(index),
            }
        } else {
            AssignTarget::Name(name.lexeme.clone())
        };

        self.consume(TokenType::Equal, SyntaxErrorType::MissingEqual)?;
        let value = self.expression()?;
        let location = Location::between(name.location, value.location());
        self.end_of_statement()?;

        Ok(Stmt::Assignment {
            target,
            value,
            location,
        })
    }

    /// Parses `[ index ]`, returning the index and the location of `]`.
    fn subscript_index(&mut self) -> Result<(Expr, Location), SyntaxError> {
        let open = self.advance().location;
        self.check_node_allowed(NodeType::SubscriptExpression, open)?;
        let index = self.expression()?;
        let close = self.consume(TokenType::RightBracket, SyntaxErrorType::MissingRightBracket)?;
        Ok((index, close.location))
    }

    fn expression_statement(&mut self) -> Result<Stmt, SyntaxError> {
        self.check_node_allowed(NodeType::ExpressionStatement, self.peek().location)?;

        let expr = self.expression()?;
        if self.check(&TokenType::Equal) {
            return Err(SyntaxError::bare(
                SyntaxErrorType::InvalidAssignmentTarget,
                expr.location(),
            ));
        }
        let location = expr.location();
        self.end_of_statement()?;

        Ok(Stmt::Expression { expr, location })
    }

    fn at_statement_end(&self) -> bool {
        self.check(&TokenType::Newline) || self.check(&TokenType::Dedent) || self.is_at_end()
    }

    fn end_of_statement(&mut self) -> Result<(), SyntaxError> {
        if self.match_types(&[TokenType::Newline]) || self.at_statement_end() {
            return Ok(());
        }
        let token = self.peek();
        Err(SyntaxError::new(
            SyntaxErrorType::UnexpectedTokenAfterStatement,
            token.location,
            error_context([("lexeme", token.lexeme.clone())]),
        ))
    }

    fn expression(&mut self) -> Result<Expr, SyntaxError> {
        self.or()
    }

    /// One left-associative precedence level.
    fn binary_level(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> Result<Expr, SyntaxError>,
    ) -> Result<Expr, SyntaxError> {
        let mut expr = operand(self)?;

        while self.match_types(operators) {
            let operator = self.previous().clone();
            self.check_node_allowed(NodeType::BinaryExpression, operator.location)?;
            let right = operand(self)?;
            expr = Expr::Binary {
                location: Location::between(expr.location(), right.location()),
                left: Box::new(expr),
                operator: binary_op(operator.token_type),
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, SyntaxError> {
        self.binary_level(&[TokenType::Or], Self::and)
    }

    fn and(&mut self) -> Result<Expr, SyntaxError> {
        self.binary_level(&[TokenType::And], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr, SyntaxError> {
        self.binary_level(&[TokenType::EqualEqual, TokenType::BangEqual], Self::comparison)
    }

    fn comparison(&mut self) -> Result<Expr, SyntaxError> {
        self.binary_level(
            &[
                TokenType::Greater,
                TokenType::GreaterEqual,
                TokenType::Less,
                TokenType::LessEqual,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr, SyntaxError> {
        self.binary_level(&[TokenType::Minus, TokenType::Plus], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr, SyntaxError> {
        self.binary_level(
            &[
                TokenType::Slash,
                TokenType::SlashSlash,
                TokenType::Star,
                TokenType::Percent,
            ],
            Self::power,
        )
    }

    fn power(&mut self) -> Result<Expr, SyntaxError> {
        let expr = self.unary()?;

        if self.match_types(&[TokenType::StarStar]) {
            let operator = self.previous().location;
            self.check_node_allowed(NodeType::BinaryExpression, operator)?;
            // Right-associative
            let right = self.power()?;
            return Ok(Expr::Binary {
                location: Location::between(expr.location(), right.location()),
                left: Box::new(expr),
                operator: BinaryOp::Power,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        if self.match_types(&[TokenType::Not, TokenType::Minus]) {
            let operator = self.previous().clone();
            self.check_node_allowed(NodeType::UnaryExpression, operator.location)?;
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                operator: if operator.token_type == TokenType::Not {
                    UnaryOp::Not
                } else {
                    UnaryOp::Negate
                },
                location: Location::between(operator.location, operand.location()),
                operand: Box::new(operand),
            });
        }

        self.postfix()
    }

    /// Chains of `[index]`, `(args)` and `.name` after a primary expression.
    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.primary()?;

        loop {
            if self.check(&TokenType::LeftBracket) {
                let (index, close) = self.subscript_index()?;
                expr = Expr::Subscript {
                    location: Location::between(expr.location(), close),
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.match_types(&[TokenType::LeftParen]) {
                self.check_node_allowed(NodeType::CallExpression, self.previous().location)?;
                expr = self.finish_call(expr)?;
            } else if self.match_types(&[TokenType::Dot]) {
                self.check_node_allowed(NodeType::AttributeExpression, self.previous().location)?;
                let attribute =
                    self.consume(TokenType::Identifier, SyntaxErrorType::MissingAttributeName)?;
                expr = Expr::Attribute {
                    location: Location::between(expr.location(), attribute.location),
                    object: Box::new(expr),
                    name: attribute.lexeme,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, SyntaxError> {
        let mut arguments = Vec::new();

        if !self.check(&TokenType::RightParen) {
            loop {
                arguments.push(self.expression()?);
                if !self.match_types(&[TokenType::Comma]) || self.check(&TokenType::RightParen) {
                    break;
                }
            }
        }

        let function = match &callee {
            Expr::Identifier { name, .. } | Expr::Attribute { name, .. } => name.clone(),
            _ => "function".to_string(),
        };
        let close = self.consume_with(
            TokenType::RightParen,
            SyntaxErrorType::MissingRightParenthesisAfterFunctionCall,
            error_context([("function", function)]),
        )?;

        Ok(Expr::Call {
            location: Location::between(callee.location(), close.location),
            callee: Box::new(callee),
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let literal = match self.peek().token_type {
            TokenType::False
            | TokenType::True
            | TokenType::None
            | TokenType::Integer
            | TokenType::Float
            | TokenType::String => self.peek().literal.clone(),
            _ => None,
        };
        if let Some(value) = literal {
            let location = self.advance().location;
            self.check_node_allowed(NodeType::LiteralExpression, location)?;
            return Ok(Expr::Literal { value, location });
        }

        if self.match_types(&[TokenType::Identifier]) {
            let token = self.previous().clone();
            self.check_node_allowed(NodeType::IdentifierExpression, token.location)?;
            return Ok(Expr::Identifier {
                name: token.lexeme,
                location: token.location,
            });
        }

        if self.match_types(&[TokenType::LeftParen]) {
            let open = self.previous().location;
            self.check_node_allowed(NodeType::GroupingExpression, open)?;
            let inner = self.expression()?;
            let close = self.consume(TokenType::RightParen, SyntaxErrorType::MissingRightParen)?;
            return Ok(Expr::Grouping {
                inner: Box::new(inner),
                location: Location::between(open, close.location),
            });
        }

        if self.match_types(&[TokenType::LeftBracket]) {
            return self.list_literal();
        }

        if self.match_types(&[TokenType::FStringStart]) {
            return self.fstring();
        }

        let token = self.peek();
        Err(SyntaxError::new(
            SyntaxErrorType::MissingExpression,
            token.location,
            error_context([("lexeme", describe_token(token))]),
        ))
    }

    fn list_literal(&mut self) -> Result<Expr, SyntaxError> {
        let open = self.previous().location;
        self.check_node_allowed(NodeType::ListExpression, open)?;

        let mut elements = Vec::new();
        if !self.check(&TokenType::RightBracket) {
            loop {
                elements.push(self.expression()?);
                if !self.match_types(&[TokenType::Comma]) || self.check(&TokenType::RightBracket) {
                    break;
                }
            }
        }

        let close = self.consume(TokenType::RightBracket, SyntaxErrorType::MissingRightBracket)?;
        Ok(Expr::List {
            elements,
            location: Location::between(open, close.location),
        })
    }

    fn fstring(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.previous().location;
        self.check_node_allowed(NodeType::FStringExpression, start)?;

        let mut parts = Vec::new();
        loop {
            if self.match_types(&[TokenType::FStringText]) {
                parts.push(FStringPart::Text(self.previous().lexeme.clone()));
            } else if self.match_types(&[TokenType::LeftBrace]) {
                let expr = self.expression()?;
                self.consume(
                    TokenType::RightBrace,
                    SyntaxErrorType::MissingRightBraceInFString,
                )?;
                parts.push(FStringPart::Expr(expr));
            } else if self.match_types(&[TokenType::FStringEnd]) {
                break;
            } else {
                return Err(self.error_at_current(SyntaxErrorType::GenericSyntaxError));
            }
        }

        Ok(Expr::FString {
            parts,
            location: Location::between(start, self.previous().location),
        })
    }

    fn check_node_allowed(&self, node_type: NodeType, location: Location) -> Result<(), SyntaxError> {
        if self.features.is_node_allowed(node_type) {
            return Ok(());
        }
        Err(SyntaxError::new(
            SyntaxErrorType::NodeNotAllowed(node_type),
            location,
            error_context([("nodeType", node_type.name().to_string())]),
        ))
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        self.peek().token_type == *token_type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume(&mut self, token_type: TokenType, error_type: SyntaxErrorType) -> Result<Token, SyntaxError> {
        self.consume_with(token_type, error_type, ErrorContext::new())
    }

    fn consume_with(
        &mut self,
        token_type: TokenType,
        error_type: SyntaxErrorType,
        context: ErrorContext,
    ) -> Result<Token, SyntaxError> {
        if self.check(&token_type) {
            return Ok(self.advance().clone());
        }
        Err(SyntaxError::new(error_type, self.peek().location, context))
    }

    fn error_at_current(&self, error_type: SyntaxErrorType) -> SyntaxError {
        let token = self.peek();
        SyntaxError::new(
            error_type,
            token.location,
            error_context([("lexeme", describe_token(token))]),
        )
    }
}

fn binary_op(token_type: TokenType) -> BinaryOp {
    match token_type {
        TokenType::Plus => BinaryOp::Add,
        TokenType::Minus => BinaryOp::Subtract,
        TokenType::Star => BinaryOp::Multiply,
        TokenType::Slash => BinaryOp::Divide,
        TokenType::SlashSlash => BinaryOp::FloorDivide,
        TokenType::Percent => BinaryOp::Modulo,
        TokenType::StarStar => BinaryOp::Power,
        TokenType::EqualEqual => BinaryOp::Equal,
        TokenType::BangEqual => BinaryOp::NotEqual,
        TokenType::Less => BinaryOp::Less,
        TokenType::LessEqual => BinaryOp::LessEqual,
        TokenType::Greater => BinaryOp::Greater,
        TokenType::GreaterEqual => BinaryOp::GreaterEqual,
        TokenType::And => BinaryOp::And,
        _ => BinaryOp::Or,
    }
}

fn describe_token(token: &Token) -> String {
    match token.token_type {
        TokenType::Newline => "end of line".to_string(),
        TokenType::Eof => "end of file".to_string(),
        TokenType::Indent => "indentation".to_string(),
        TokenType::Dedent => "end of block".to_string(),
        _ => token.lexeme.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn parse_default(source: &str) -> Vec<Stmt> {
        parse(source, &LanguageFeatures::default()).expect("source should parse")
    }

    fn only_expr(source: &str) -> Expr {
        match parse_default(source).remove(0) {
            Stmt::Expression { expr, .. } => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn power_is_right_associative() {
        let Expr::Binary { operator, right, .. } = only_expr("2 ** 3 ** 2") else {
            panic!("expected binary expression");
        };
        assert_eq!(operator, BinaryOp::Power);
        assert!(matches!(*right, Expr::Binary { operator: BinaryOp::Power, .. }));
    }

    #[test]
    fn factor_binds_tighter_than_term() {
        let Expr::Binary { operator, right, .. } = only_expr("1 + 2 * 3") else {
            panic!("expected binary expression");
        };
        assert_eq!(operator, BinaryOp::Add);
        assert!(matches!(*right, Expr::Binary { operator: BinaryOp::Multiply, .. }));
    }

    #[test]
    fn postfix_operations_chain() {
        let expr = only_expr("grid[0][1].upper()");
        let Expr::Call { callee, arguments, .. } = expr else {
            panic!("expected call");
        };
        assert!(arguments.is_empty());
        let Expr::Attribute { object, name, .. } = *callee else {
            panic!("expected attribute");
        };
        assert_eq!(name, "upper");
        assert!(matches!(*object, Expr::Subscript { .. }));
    }

    #[test]
    fn subscript_assignment_targets_the_last_index() {
        let statements = parse_default("grid[0][1] = 5");
        let Stmt::Assignment { target, .. } = &statements[0] else {
            panic!("expected assignment");
        };
        let AssignTarget::Subscript { object, index } = target else {
            panic!("expected subscript target");
        };
        assert!(matches!(**object, Expr::Subscript { .. }));
        assert!(matches!(**index, Expr::Literal { value: Value::Int(1), .. }));
    }

    #[test]
    fn elif_becomes_nested_if() {
        let statements = parse_default("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
        let Stmt::If { else_branch, .. } = &statements[0] else {
            panic!("expected if");
        };
        let nested = else_branch.as_deref().expect("elif branch");
        let Stmt::If { else_branch, .. } = nested else {
            panic!("expected nested if");
        };
        assert!(matches!(else_branch.as_deref(), Some(Stmt::Block { .. })));
    }

    #[test]
    fn function_body_is_shared_statement_list() {
        let statements = parse_default("def add(a, b):\n    return a + b\n");
        let Stmt::FunctionDeclaration { name, parameters, body, .. } = &statements[0] else {
            panic!("expected function declaration");
        };
        assert_eq!(name, "add");
        assert_eq!(parameters, &vec!["a".to_string(), "b".to_string()]);
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn parse_all_reports_every_broken_statement() {
        let tokens = Lexer::new("x = 1 +\ny = 2\nif y\n    z = 1\n")
            .scan_tokens()
            .unwrap();
        let (statements, errors) = Parser::new(tokens, &LanguageFeatures::default()).parse_all();
        let types: Vec<_> = errors.iter().map(|e| e.error_type).collect();
        assert_eq!(
            types,
            vec![
                SyntaxErrorType::MissingExpression,
                SyntaxErrorType::MissingColon,
                SyntaxErrorType::UnexpectedIndentation
            ]
        );
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn compound_statement_location_covers_header() {
        let source = "while x < 3:\n    x = x + 1\n";
        let statements = parse_default(source);
        assert_eq!(statements[0].location().to_code(source), "while x < 3:");
    }
}
