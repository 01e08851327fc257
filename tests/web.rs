//! Browser smoke tests, run with `wasm-pack test --headless --chrome`.
#![cfg(target_arch = "wasm32")]

use tilewalk::{grid::GridPos, scene::SceneEvent};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const SCENE: &str = include_str!("../scene.scn");

#[wasm_bindgen_test]
fn bundled_scene_loads_in_the_browser() {
	let scene = tilewalk::load_scene("scene.scn", SCENE, |_| Err(anyhow::anyhow!("no includes"))).expect("bundled scene");
	assert_eq!(scene.grid().width(), 10);
	assert_eq!(scene.hero().grid_pos(), GridPos::new(1, 1));
}

#[wasm_bindgen_test]
fn scene_ticks_without_a_host() {
	let mut scene = tilewalk::load_scene("scene.scn", SCENE, |_| Err(anyhow::anyhow!("no includes"))).expect("bundled scene");
	scene.walk_to(GridPos::new(5, 5)).expect("walkable");
	let events: Vec<_> = (0..200).flat_map(|_| scene.tick(16.0)).collect();
	assert!(events.contains(&SceneEvent::Arrived(GridPos::new(5, 5))));
	assert!(events.contains(&SceneEvent::TriggerArmed(0)));
	assert!(events.iter().any(|e| matches!(e, SceneEvent::DialogueShown(v) if v.text == "Hello!")));
}
