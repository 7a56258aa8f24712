//! Syntax trees produced by the parse drivers.

use crate::token::Token;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeID(usize);

#[derive(Debug, Clone)]
pub struct Node<TSym> {
    pub symbol: TSym,
    pub token: Option<Token>,
    pub children: Vec<NodeID>,
}

/// An arena of syntax nodes.
#[derive(Debug, Clone)]
pub struct SyntaxTree<TSym> {
    nodes: Vec<Node<TSym>>,
    root: Option<NodeID>,
}

impl<TSym> Default for SyntaxTree<TSym> {
    fn default() -> Self {
        Self {
            nodes: vec![],
            root: None,
        }
    }
}

impl<TSym> SyntaxTree<TSym> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, symbol: TSym) -> NodeID {
        let id = NodeID(self.nodes.len());
        self.nodes.push(Node {
            symbol,
            token: None,
            children: vec![],
        });
        id
    }

    pub fn set_token(&mut self, id: NodeID, token: Token) {
        self.nodes[id.0].token = Some(token);
    }

    pub fn set_children(&mut self, id: NodeID, children: Vec<NodeID>) {
        self.nodes[id.0].children = children;
    }

    pub fn set_root(&mut self, id: NodeID) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeID> {
        self.root
    }

    pub fn node(&self, id: NodeID) -> &Node<TSym> {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Return the tokens attached to the leaves, from left to right.
    pub fn leaves(&self) -> Vec<&Token> {
        let mut leaves = vec![];
        if let Some(root) = self.root {
            self.collect_leaves(root, &mut leaves);
        }
        leaves
    }

    fn collect_leaves<'t>(&'t self, id: NodeID, leaves: &mut Vec<&'t Token>) {
        let node = self.node(id);
        leaves.extend(node.token.as_ref());
        for child in &node.children {
            self.collect_leaves(*child, leaves);
        }
    }
}

impl<TSym: fmt::Display> fmt::Display for SyntaxTree<TSym> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = match self.root {
            Some(root) => vec![(root, 0)],
            None => return Ok(()),
        };
        while let Some((id, depth)) = pending.pop() {
            let node = self.node(id);
            write!(f, "{:width$}{}", "", node.symbol, width = depth * 2)?;
            if let Some(token) = &node.token {
                write!(f, " '{}'", token)?;
            }
            writeln!(f)?;
            pending.extend(node.children.iter().rev().map(|child| (*child, depth + 1)));
        }
        Ok(())
    }
}
