use std::fmt;

use crate::grid::GridPos;

#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
	Define(String, Literal), // directive name and value
	Map(Vec<String>),
	Block(Vec<GridPos>),
	Hero(GridPos),
	Npc(NpcDecl),
	Node(NodeDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
	Number(i64),
	Bool(bool),
	Str(String),
	Ident(String),
}

impl fmt::Display for Literal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Literal::Number(n) => write!(f, "{n}"),
			Literal::Bool(b) => write!(f, "{b}"),
			Literal::Str(s) => write!(f, "{s:?}"),
			Literal::Ident(s) => write!(f, "{s}"),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct NpcDecl {
	pub name: String,
	pub at: GridPos,
	pub dialogue: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeDecl {
	pub id: String,
	pub body: Vec<NodeStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeStatement {
	Speaker(String),
	Text(String),
	Choice(ChoiceDecl),
	Next(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceDecl {
	pub text: String,
	pub target: String,
}
