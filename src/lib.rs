pub mod actor;
pub mod ast;
pub mod config;
pub mod dialogue;
pub mod grid;
pub mod pathfinder;
pub mod preprocessor;
pub mod proximity;
pub mod scene;
pub mod timer;
pub mod tween;
mod web;

use anyhow::{Context, Result, anyhow};
use ast::{ChoiceDecl, Literal, NodeDecl, NodeStatement, NpcDecl, TopLevel};
use grid::GridPos;
use log::{debug, error, info};
use pest::{
	Parser,
	iterators::{Pair, Pairs},
};
use preprocessor::preprocess;
use scene::Scene;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::Response;


#[derive(pest_derive::Parser)]
#[grammar = "grammar.pest"]
struct SceneParser;

fn next_pair<'i>(inner: &mut Pairs<'i, Rule>, what: &str) -> Result<Pair<'i, Rule>> {
	inner.next().ok_or_else(|| anyhow!("missing {}", what))
}

fn unescape(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut chars = raw.chars();
	while let Some(c) = chars.next() {
		if c != '\\' {
			out.push(c);
			continue;
		}
		match chars.next() {
			Some('n') => out.push('\n'),
			Some('t') => out.push('\t'),
			Some(other) => out.push(other),
			None => {},
		}
	}
	out
}

fn parse_string(pair: Pair<Rule>) -> String {
	unescape(pair.into_inner().next().map(|p| p.as_str()).unwrap_or_default())
}

fn parse_number(pair: Pair<Rule>) -> Result<i64> {
	pair.as_str().parse().with_context(|| format!("invalid number '{}'", pair.as_str()))
}

fn parse_position(pair: Pair<Rule>) -> Result<GridPos> {
	let mut inner = pair.into_inner();
	let x = parse_number(next_pair(&mut inner, "x coordinate")?)?;
	let y = parse_number(next_pair(&mut inner, "y coordinate")?)?;
	Ok(GridPos::new(
		i32::try_from(x).context("x coordinate out of range")?,
		i32::try_from(y).context("y coordinate out of range")?,
	))
}

fn parse_literal(pair: Pair<Rule>) -> Result<Literal> {
	Ok(match pair.as_rule() {
		Rule::number => Literal::Number(parse_number(pair)?),
		Rule::boolean => Literal::Bool(pair.as_str() == "true"),
		Rule::string => Literal::Str(parse_string(pair)),
		Rule::identifier => Literal::Ident(pair.as_str().to_string()),
		other => return Err(anyhow!("Unexpected literal '{:?}'", other)),
	})
}

fn parse_node(pair: Pair<Rule>) -> Result<NodeDecl> {
	let mut inner = pair.into_inner();
	let id = next_pair(&mut inner, "node id")?.as_str().to_string();
	let mut body = Vec::new();
	for stmt_pair in inner {
		let rule = stmt_pair.as_rule();
		let mut parts = stmt_pair.into_inner();
		let statement = match rule {
			Rule::speaker_stmt => NodeStatement::Speaker(parse_string(next_pair(&mut parts, "speaker")?)),
			Rule::text_stmt => NodeStatement::Text(parse_string(next_pair(&mut parts, "text")?)),
			Rule::choice_stmt => {
				let text = parse_string(next_pair(&mut parts, "choice text")?);
				let target = next_pair(&mut parts, "choice target")?.as_str().to_string();
				NodeStatement::Choice(ChoiceDecl { text, target })
			},
			Rule::next_stmt => NodeStatement::Next(next_pair(&mut parts, "next node")?.as_str().to_string()),
			other => return Err(anyhow!("Unexpected statement '{:?}' in node {}", other, id)),
		};
		body.push(statement);
	}
	Ok(NodeDecl { id, body })
}

fn parse_item(pair: Pair<Rule>) -> Result<TopLevel> {
	let rule = pair.as_rule();
	if rule == Rule::node_def {
		return parse_node(pair).map(TopLevel::Node);
	}
	let mut inner = pair.into_inner();
	Ok(match rule {
		Rule::map_def => TopLevel::Map(inner.map(parse_string).collect()),
		Rule::block_def => TopLevel::Block(inner.map(parse_position).collect::<Result<_>>()?),
		Rule::hero_def => TopLevel::Hero(parse_position(next_pair(&mut inner, "hero position")?)?),
		Rule::npc_def => {
			let name = next_pair(&mut inner, "npc name")?.as_str().to_string();
			let at = parse_position(next_pair(&mut inner, "npc position")?)?;
			let dialogue = inner.next().map(|p| p.as_str().to_string());
			TopLevel::Npc(NpcDecl { name, at, dialogue })
		},
		other => return Err(anyhow!("Unexpected item '{:?}'", other)),
	})
}


pub fn parse_str(input: &str) -> Result<Vec<TopLevel>> {
	let pairs = SceneParser::parse(Rule::file, input)?;
	let mut ast_nodes = Vec::new();

	for pair in pairs {
		if pair.as_rule() == Rule::file {
			for inner_pair in pair.into_inner() {
				match inner_pair.as_rule() {
					Rule::directive => {
						let mut inner = inner_pair.into_inner();
						let name = next_pair(&mut inner, "define name")?.as_str().to_string();
						let value = parse_literal(next_pair(&mut inner, "define value")?)?;
						ast_nodes.push(TopLevel::Define(name, value));
					},
					Rule::item => {
						for item_pair in inner_pair.into_inner() {
							let line = item_pair.as_span().start_pos().line_col().0;
							ast_nodes.push(parse_item(item_pair).with_context(|| format!("on line {}", line))?);
						}
					},
					Rule::EOI => {},
					_ => {},
				}
			}
		}
	}

	Ok(ast_nodes)
}

/// Preprocess, parse and build a scene. `load` resolves `#include`s.
pub fn load_scene<F>(filename: &str, src: &str, load: F) -> Result<Scene>
where
	F: FnMut(&str) -> Result<String>,
{
	// Phase 1: preprocess includes.
	let flattened = preprocess(filename, src, load)?;
	debug!("Preprocessed content length: {} chars", flattened.len());

	// Phase 2: parse.
	let ast_nodes = match parse_str(&flattened) {
		Ok(ast) => ast,
		Err(e) => {
			error!("Parse error: {}", e);
			error!("Preprocessed content preview:");
			for (i, line) in flattened.lines().enumerate().take(50) {
				error!("{:3}: {}", i + 1, line);
			}
			return Err(e.context(format!("Failed to parse {}", filename)));
		},
	};
	debug!("Parsed successfully! {} top-level items", ast_nodes.len());

	// Phase 3: build the scene.
	scene::build(&ast_nodes).with_context(|| format!("Invalid scene {}", filename))
}


pub async fn load_scene_raw() -> Result<String, JsValue> {
	let resp_value = JsFuture::from(web::window()?.fetch_with_str("/scene.scn")).await?;

	let resp: Response = resp_value.dyn_into()?;
	if !resp.ok() {
		return Err(JsValue::from_str(&format!("fetching scene failed with status {}", resp.status())));
	}
	let text = JsFuture::from(resp.text()?).await?;
	text.as_string().ok_or_else(|| JsValue::from_str("scene body is not text"))
}


#[wasm_bindgen]
pub fn start() {
	set_panic_hook();
	init_logging();
	info!("Starting tilewalk...");
	spawn_local(async {
		match load_scene_raw().await {
			Ok(source) => {
				handle_scene(&source)
					.map_err(|e| error!("Scene handling error: {:#}", e))
					.unwrap_or(());
			},
			Err(err) => error!("Failed to load scene: {:?}", err),
		}
	});
}


fn handle_scene(source: &str) -> Result<()> {
	let scene = load_scene("scene.scn", source, |name| Err(anyhow!("#include \"{}\" is not available in the browser", name)))?;
	web::run(scene).map_err(|e| anyhow!("Failed to start web host: {:?}", e))
}


pub fn set_panic_hook() {
	// When the `console_error_panic_hook` feature is enabled, we can call the
	// `set_panic_hook` function at least once during initialization, and then
	// we will get better error messages if our code ever panics.
	//
	// For more details see
	// https://github.com/rustwasm/console_error_panic_hook#readme
	#[cfg(feature = "console_error_panic_hook")]
	console_error_panic_hook::set_once();
}

pub fn init_logging() {
	#[cfg(target_arch = "wasm32")]
	{
		if console_log::init_with_level(log::Level::Debug).is_err() {
			web_sys::console::warn_1(&"logger already initialised".into());
		}
	}

	#[cfg(not(target_arch = "wasm32"))]
	{
		env_logger::Builder::new()
			.filter_level(log::LevelFilter::Info)
			.parse_default_env()
			.init();
	}
}
