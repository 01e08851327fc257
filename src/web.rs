//! Browser host: DOM elements for the board, the actors, the dialogue panel
//! and the debug overlay, driven by `requestAnimationFrame`.

use std::{cell::RefCell, rc::Rc};

use log::{debug, error, warn};
use wasm_bindgen::{JsCast, prelude::*};
use web_sys::{Document, Element, HtmlElement, KeyboardEvent, MouseEvent, Node};

use crate::{
	dialogue::{NodeView, Prompt, Step},
	grid::WorldPos,
	scene::{Scene, SceneEvent},
};

/// Longest frame fed into the scene; a backgrounded tab resumes with one
/// large gap otherwise.
const MAX_FRAME_MS: f64 = 250.0;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

pub(crate) fn window() -> Result<web_sys::Window, JsValue> {
	web_sys::window().ok_or_else(|| JsValue::from_str("no global `window` exists"))
}

fn request_animation_frame(f: &Closure<dyn FnMut(f64)>) {
	let registered = window().and_then(|w| w.request_animation_frame(f.as_ref().unchecked_ref()));
	if let Err(err) = registered {
		error!("requestAnimationFrame failed: {:?}", err);
	}
}

fn ensure_element(document: &Document, parent: &Node, id: &str, class: &str) -> Result<HtmlElement, JsValue> {
	if let Some(el) = document.get_element_by_id(id) {
		return el.dyn_into().map_err(JsValue::from);
	}
	let el = document.create_element("div")?;
	el.set_id(id);
	el.set_class_name(class);
	parent.append_child(&el)?;
	el.dyn_into().map_err(JsValue::from)
}

fn place(el: &HtmlElement, pos: WorldPos, tile_size: f32) -> Result<(), JsValue> {
	let style = el.style();
	style.set_property("position", "absolute")?;
	style.set_property("left", &format!("{}px", pos.x - tile_size / 2.0))?;
	style.set_property("top", &format!("{}px", pos.y - tile_size / 2.0))?;
	style.set_property("width", &format!("{}px", tile_size))?;
	style.set_property("height", &format!("{}px", tile_size))
}

struct WebHost {
	scene: Scene,
	document: Document,
	board: HtmlElement,
	hero: HtmlElement,
	npcs: Vec<HtmlElement>,
	dialogue: HtmlElement,
	debug: HtmlElement,
	last_frame: Option<f64>,
}

impl WebHost {
	fn new(document: Document, scene: Scene) -> Result<Self, JsValue> {
		let body: Node = document.body().ok_or_else(|| JsValue::from_str("document has no body"))?.into();
		let board = ensure_element(&document, &body, "board", "board")?;
		let tile = scene.grid().tile_size();
		{
			let style = board.style();
			style.set_property("position", "relative")?;
			style.set_property("width", &format!("{}px", scene.grid().width() as f32 * tile))?;
			style.set_property("height", &format!("{}px", scene.grid().height() as f32 * tile))?;
		}

		for cell in scene.grid().blocked_cells() {
			let el = ensure_element(&document, &board, &format!("block-{}-{}", cell.x, cell.y), "blocked")?;
			place(&el, scene.grid().to_world(cell), tile)?;
		}

		let hero = ensure_element(&document, &board, "hero", "hero")?;
		let npcs = scene
			.npcs()
			.iter()
			.map(|npc| {
				let el = ensure_element(&document, &board, &format!("npc-{}", npc.name()), "npc")?;
				el.set_title(npc.name());
				place(&el, scene.grid().to_world(npc.grid_pos()), tile)?;
				Ok(el)
			})
			.collect::<Result<Vec<_>, JsValue>>()?;
		let dialogue = ensure_element(&document, &body, "dialogue", "dialogue")?;
		let debug = ensure_element(&document, &body, "debug", "debug")?;

		let host = Self {
			scene,
			document,
			board,
			hero,
			npcs,
			dialogue,
			debug,
			last_frame: None,
		};
		host.render_dialogue(None)?;
		host.render_actors()?;
		Ok(host)
	}

	fn on_pointer_down(&mut self, event: &MouseEvent) {
		if let Some(target) = event.target().and_then(|t| t.dyn_into::<Node>().ok()) {
			if self.dialogue.contains(Some(&target)) {
				return;
			}
		}
		let rect = self.board.get_bounding_client_rect();
		let x = event.client_x() as f64 - rect.left();
		let y = event.client_y() as f64 - rect.top();
		if let Err(err) = self.scene.pointer_down(x as f32, y as f32) {
			debug!("click ignored: {err}");
		}
	}

	fn on_key_down(&mut self, event: &KeyboardEvent) {
		if event.key() == "Escape" && self.scene.end_dialogue() {
			self.show_step(Step::Ended);
		}
	}

	fn on_dialogue_click(&mut self, event: &MouseEvent) {
		let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
			return;
		};
		let step = if let Some(index) = target.get_attribute("data-choice").and_then(|i| i.parse().ok()) {
			self.scene.choose(index)
		} else {
			match target.get_attribute("data-action").as_deref() {
				Some("continue") => self.scene.advance(),
				Some("close") => {
					self.scene.end_dialogue();
					Step::Ended
				},
				_ => return,
			}
		};
		self.show_step(step);
	}

	fn show_step(&self, step: Step) {
		let rendered = match step {
			Step::Show(view) => self.render_dialogue(Some(&view)),
			Step::Ended => self.render_dialogue(None),
			Step::Ignored => Ok(()),
		};
		if let Err(err) = rendered {
			error!("rendering dialogue failed: {:?}", err);
		}
	}

	fn frame(&mut self, timestamp: f64) -> Result<(), JsValue> {
		let dt = self.last_frame.map_or(0.0, |last| (timestamp - last).clamp(0.0, MAX_FRAME_MS));
		self.last_frame = Some(timestamp);

		for event in self.scene.tick(dt) {
			match event {
				SceneEvent::DialogueShown(view) => self.render_dialogue(Some(&view))?,
				SceneEvent::DialogueEnded => self.render_dialogue(None)?,
				SceneEvent::MoveRejected(err) => warn!("{err}"),
				_ => {},
			}
		}

		self.render_actors()?;
		self.debug.set_inner_text(&self.scene.status().to_string());
		Ok(())
	}

	fn render_actors(&self) -> Result<(), JsValue> {
		let tile = self.scene.grid().tile_size();
		place(&self.hero, self.scene.hero().world_pos(), tile)?;
		for (el, npc) in self.npcs.iter().zip(self.scene.npcs()) {
			el.style().set_property("opacity", &npc.alpha().to_string())?;
		}
		Ok(())
	}

	fn render_dialogue(&self, view: Option<&NodeView>) -> Result<(), JsValue> {
		self.dialogue.set_inner_html("");
		let Some(view) = view else {
			return self.dialogue.style().set_property("display", "none");
		};
		self.dialogue.style().set_property("display", "block")?;

		let speaker = self.document.create_element("div")?;
		speaker.set_class_name("speaker");
		speaker.set_text_content(Some(&view.speaker));
		self.dialogue.append_child(&speaker)?;

		let text = self.document.create_element("p")?;
		text.set_class_name("text");
		text.set_text_content(Some(&view.text));
		self.dialogue.append_child(&text)?;

		match &view.prompt {
			Prompt::Choices(choices) => {
				for (i, choice) in choices.iter().enumerate() {
					self.button(choice, "data-choice", &i.to_string())?;
				}
			},
			Prompt::Continue => self.button("Continue", "data-action", "continue")?,
		}
		self.button("\u{2715}", "data-action", "close")
	}

	fn button(&self, label: &str, attr: &str, value: &str) -> Result<(), JsValue> {
		let button = self.document.create_element("button")?;
		button.set_text_content(Some(label));
		button.set_attribute(attr, value)?;
		self.dialogue.append_child(&button)?;
		Ok(())
	}
}

/// Builds the DOM for `scene`, wires input and starts the frame loop.
pub fn run(scene: Scene) -> Result<(), JsValue> {
	let document = window()?.document().ok_or_else(|| JsValue::from_str("window has no document"))?;
	let host = Rc::new(RefCell::new(WebHost::new(document.clone(), scene)?));

	{
		let host = host.clone();
		let closure = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
			host.borrow_mut().on_pointer_down(&event);
		});
		document.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
		closure.forget();
	}

	{
		let host = host.clone();
		let closure = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
			host.borrow_mut().on_key_down(&event);
		});
		document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
		closure.forget();
	}

	{
		let panel = host.borrow().dialogue.clone();
		let host = host.clone();
		let closure = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
			host.borrow_mut().on_dialogue_click(&event);
		});
		panel.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
		closure.forget();
	}

	let f: FrameCallback = Rc::new(RefCell::new(None));
	let g = f.clone();
	*g.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
		if let Err(err) = host.borrow_mut().frame(timestamp) {
			error!("frame failed: {:?}", err);
		}
		if let Some(callback) = f.borrow().as_ref() {
			request_animation_frame(callback);
		}
	}));
	if let Some(callback) = g.borrow().as_ref() {
		request_animation_frame(callback);
	}

	Ok(())
}
