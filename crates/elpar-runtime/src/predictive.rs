//! Table-driven predictive (LL(1)) parser.

use crate::{
    definition::PredictiveTable,
    parser::{read_token, ParseError},
    token::{TokenKind, TokenSource},
    tree::{NodeID, SyntaxTree},
};

/// A pushdown parser that expands nonterminals according to a predictive table.
#[derive(Debug)]
pub struct PredictiveParser<TDef>
where
    TDef: PredictiveTable,
{
    definition: TDef,
}

impl<TDef> PredictiveParser<TDef>
where
    TDef: PredictiveTable,
{
    pub fn new(definition: TDef) -> Self {
        Self { definition }
    }

    /// Parse the whole token stream and return its syntax tree.
    ///
    /// The parse succeeds only when the stack empties exactly at the end of
    /// input. Newline tokens that cannot be used at the current position are
    /// skipped.
    pub fn parse<S>(&self, mut tokens: S) -> Result<SyntaxTree<TDef::Symbol>, ParseError<S::Error>>
    where
        S: TokenSource,
    {
        let def = &self.definition;

        let mut tree = SyntaxTree::new();
        let root = tree.add_node(def.start_symbol());
        tree.set_root(root);

        let mut token = read_token(&mut tokens)?;
        let mut error = ParseError::InvalidSyntax {
            position: token.position,
        };

        let mut stack: Vec<(TDef::Symbol, NodeID)> = vec![(def.start_symbol(), root)];
        while let Some(&(top, node)) = stack.last() {
            if def.is_terminal(top) && def.matches(top, &token) {
                stack.pop();
                if !def.is_epsilon(top) {
                    let next = read_token(&mut tokens)?;
                    tree.set_token(node, std::mem::replace(&mut token, next));
                }
                continue;
            }

            if !def.is_terminal(top) {
                let lookahead = match def.terminal(&token) {
                    Some(lookahead) => lookahead,
                    None => {
                        error = ParseError::InvalidToken {
                            text: token.text.clone(),
                            position: token.position,
                        };
                        break;
                    }
                };

                if let Some((_production, right)) = def.predict(top, lookahead) {
                    stack.pop();
                    let children: Vec<NodeID> =
                        right.iter().map(|symbol| tree.add_node(*symbol)).collect();
                    stack.extend(right.iter().copied().zip(children.iter().copied()).rev());
                    tree.set_children(node, children);
                    continue;
                }
            }

            if token.kind == TokenKind::Newline {
                token = read_token(&mut tokens)?;
                continue;
            }

            error = ParseError::UnexpectedToken {
                text: token.to_string(),
                position: token.position,
            };
            break;
        }

        if stack.is_empty() && token.kind == TokenKind::EndOfFile {
            return Ok(tree);
        }

        if let ParseError::InvalidSyntax { ref mut position } = error {
            *position = token.position;
        }
        tracing::error!("{}", error);
        Err(error)
    }
}
