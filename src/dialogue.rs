//! Branching dialogue: a read-only node graph plus the session state machine
//! (`Inactive -> Active(node) -> Inactive`) the UI drives.
//!
//! The engine never touches movement. Callers gate hero input on
//! [`DialogueEngine::is_active`].

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Choice {
	pub text: String,
	pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueNode {
	#[serde(default)]
	pub speaker: String,
	pub text: String,
	#[serde(default)]
	pub choices: Vec<Choice>,
	#[serde(default)]
	pub auto_next: Option<String>,
}

impl DialogueNode {
	pub fn is_terminal(&self) -> bool {
		self.choices.is_empty() && self.auto_next.is_none()
	}
}

#[derive(Debug, Error)]
pub enum DialogueError {
	#[error("malformed dialogue document: {0}")]
	Json(#[from] serde_json::Error),
	#[error("dialogue node '{0}' is defined twice")]
	DuplicateNode(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct DialogueGraph {
	nodes: IndexMap<String, DialogueNode>,
}

impl DialogueGraph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses a JSON object mapping node ids to nodes:
	/// `{"a": {"speaker": "NPC", "text": "Hi", "choices": [{"text": "Bye", "target": "b"}], "autoNext": "c"}}`
	pub fn from_json(src: &str) -> Result<Self, DialogueError> {
		let graph: DialogueGraph = serde_json::from_str(src)?;
		for (from, target) in graph.dangling_targets() {
			warn!("dialogue node '{from}' points at missing node '{target}'");
		}
		Ok(graph)
	}

	/// Chains `(speaker, text)` lines with `auto_next`, ids `{prefix}0..`.
	pub fn linear<S, T>(prefix: &str, lines: impl IntoIterator<Item = (S, T)>) -> Self
	where
		S: Into<String>,
		T: Into<String>,
	{
		let lines: Vec<(String, String)> = lines.into_iter().map(|(s, t)| (s.into(), t.into())).collect();
		let count = lines.len();
		let nodes = lines
			.into_iter()
			.enumerate()
			.map(|(i, (speaker, text))| {
				let auto_next = (i + 1 < count).then(|| format!("{prefix}{}", i + 1));
				(
					format!("{prefix}{i}"),
					DialogueNode {
						speaker,
						text,
						choices: Vec::new(),
						auto_next,
					},
				)
			})
			.collect();
		Self { nodes }
	}

	pub fn insert(&mut self, id: impl Into<String>, node: DialogueNode) -> Result<(), DialogueError> {
		let id = id.into();
		if self.nodes.contains_key(&id) {
			return Err(DialogueError::DuplicateNode(id));
		}
		self.nodes.insert(id, node);
		Ok(())
	}

	pub fn get(&self, id: &str) -> Option<&DialogueNode> {
		self.nodes.get(id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.nodes.contains_key(id)
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn ids(&self) -> impl Iterator<Item = &str> {
		self.nodes.keys().map(String::as_str)
	}

	/// `(from, target)` pairs whose target is not in the graph. Following one
	/// ends the session, so these are diagnostics rather than errors.
	pub fn dangling_targets(&self) -> Vec<(String, String)> {
		let mut dangling = Vec::new();
		for (id, node) in &self.nodes {
			let targets = node.choices.iter().map(|c| &c.target).chain(node.auto_next.as_ref());
			for target in targets {
				if !self.nodes.contains_key(target) {
					dangling.push((id.clone(), target.clone()));
				}
			}
		}
		dangling
	}
}

// ---------------------------------------------------------------------------
// What the UI shows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
	Choices(Vec<String>),
	Continue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView {
	pub id: String,
	pub speaker: String,
	pub text: String,
	pub prompt: Prompt,
}

impl NodeView {
	fn new(id: &str, node: &DialogueNode) -> Self {
		let prompt = if node.choices.is_empty() {
			Prompt::Continue
		} else {
			Prompt::Choices(node.choices.iter().map(|c| c.text.clone()).collect())
		};
		Self {
			id: id.to_string(),
			speaker: node.speaker.clone(),
			text: node.text.clone(),
			prompt,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Step {
	Show(NodeView),
	Ended,
	Ignored,
}

// ---------------------------------------------------------------------------
// Session state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DialogueEngine {
	graph: DialogueGraph,
	current: Option<String>,
	closed: usize,
}

impl DialogueEngine {
	pub fn new(graph: DialogueGraph) -> Self {
		Self {
			graph,
			current: None,
			closed: 0,
		}
	}

	pub fn graph(&self) -> &DialogueGraph {
		&self.graph
	}

	pub fn is_active(&self) -> bool {
		self.current.is_some()
	}

	pub fn current(&self) -> Option<&str> {
		self.current.as_deref()
	}

	pub fn view(&self) -> Option<NodeView> {
		let id = self.current.as_deref()?;
		self.graph.get(id).map(|node| NodeView::new(id, node))
	}

	/// Shows `node_id`, replacing any session in progress. Nothing is shown
	/// when the id is unknown.
	pub fn start(&mut self, node_id: &str) -> Option<NodeView> {
		let Some(node) = self.graph.get(node_id) else {
			warn!("dialogue node '{node_id}' not found, nothing to start");
			return None;
		};
		if let Some(previous) = self.current.as_deref() {
			debug!("dialogue restarted at '{node_id}' (was at '{previous}')");
		}
		info!("dialogue started at '{node_id}'");
		let view = NodeView::new(node_id, node);
		self.current = Some(node_id.to_string());
		Some(view)
	}

	pub fn choose(&mut self, index: usize) -> Step {
		let Some(node) = self.current_node() else {
			return Step::Ignored;
		};
		if node.choices.is_empty() {
			debug!("choose({index}) on a node without choices");
			return Step::Ignored;
		}
		let Some(choice) = node.choices.get(index) else {
			warn!("choice {index} out of range, node has {}", node.choices.len());
			return Step::Ignored;
		};
		let target = choice.target.clone();
		self.go_to(&target)
	}

	/// The "continue" gesture: follows `auto_next` or ends the session.
	pub fn advance(&mut self) -> Step {
		let Some(node) = self.current_node() else {
			return Step::Ignored;
		};
		if !node.choices.is_empty() {
			debug!("advance on a node that expects a choice");
			return Step::Ignored;
		}
		match node.auto_next.clone() {
			Some(target) => self.go_to(&target),
			None => {
				self.end();
				Step::Ended
			},
		}
	}

	/// Force-closes the session. Returns whether one was open.
	pub fn end(&mut self) -> bool {
		match self.current.take() {
			Some(id) => {
				info!("dialogue ended at '{id}'");
				self.closed += 1;
				true
			},
			None => false,
		}
	}

	/// Number of sessions closed since the last call.
	pub fn take_closed(&mut self) -> usize {
		std::mem::take(&mut self.closed)
	}

	fn current_node(&self) -> Option<&DialogueNode> {
		self.graph.get(self.current.as_deref()?)
	}

	fn go_to(&mut self, target: &str) -> Step {
		match self.graph.get(target) {
			Some(node) => {
				let view = NodeView::new(target, node);
				self.current = Some(target.to_string());
				Step::Show(view)
			},
			None => {
				warn!("dialogue node '{target}' not found, ending dialogue");
				self.end();
				Step::Ended
			},
		}
	}
}
