use std::{
	env, fs,
	io::{self, BufRead, Write},
	path::Path,
};

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info};
use tilewalk::{
	dialogue::{NodeView, Prompt, Step},
	grid::GridPos,
	scene::{Scene, SceneEvent},
};

/// Simulated frame length for the terminal host.
const FRAME_MS: f64 = 16.0;
/// Upper bound on frames spent waiting for a walk to finish.
const MAX_WALK_FRAMES: usize = 10_000;

const HELP: &str = "\
commands:
  goto X Y     walk to a cell
  click X Y    click at a screen position
  wait MS      let time pass
  choose N     pick dialogue option N (1-based)
  continue     advance the dialogue
  end          close the dialogue
  status       print the debug overlay
  map          draw the grid
  help         show this text
  quit";

#[derive(Debug, Clone, PartialEq)]
enum Command {
	Goto(GridPos),
	Click(f32, f32),
	Wait(f64),
	Choose(usize),
	Continue,
	End,
	Status,
	Map,
	Help,
	Quit,
}

fn arg<T: std::str::FromStr>(args: &[&str], i: usize, what: &str) -> Result<T> {
	let raw = args.get(i).ok_or_else(|| anyhow!("missing {}", what))?;
	raw.parse().map_err(|_| anyhow!("invalid {} '{}'", what, raw))
}

fn parse_command(line: &str) -> Result<Option<Command>> {
	let words: Vec<&str> = line.split_whitespace().collect();
	let Some((&name, args)) = words.split_first() else {
		return Ok(None);
	};
	let command = match name {
		"goto" | "g" => Command::Goto(GridPos::new(arg(args, 0, "x")?, arg(args, 1, "y")?)),
		"click" => Command::Click(arg(args, 0, "x")?, arg(args, 1, "y")?),
		"wait" | "w" => {
			let ms: f64 = arg(args, 0, "duration")?;
			if !ms.is_finite() || ms < 0.0 {
				bail!("duration must be a non-negative number of milliseconds");
			}
			Command::Wait(ms)
		},
		"choose" | "c" => {
			let n: usize = arg(args, 0, "choice")?;
			Command::Choose(n.checked_sub(1).ok_or_else(|| anyhow!("choices start at 1"))?)
		},
		"continue" | "next" | "n" => Command::Continue,
		"end" => Command::End,
		"status" | "s" => Command::Status,
		"map" | "m" => Command::Map,
		"help" | "?" => Command::Help,
		"quit" | "exit" | "q" => Command::Quit,
		other => bail!("unknown command '{}', try 'help'", other),
	};
	Ok(Some(command))
}

fn render_map(scene: &Scene) -> String {
	let grid = scene.grid();
	let hero = scene.hero().current_cell(grid);
	let mut out = String::new();
	for y in 0..grid.height() {
		for x in 0..grid.width() {
			let pos = GridPos::new(x, y);
			let c = if pos == hero {
				'@'
			} else if let Some((_, npc)) = scene.npc_at(pos) {
				npc.name().chars().next().unwrap_or('N')
			} else if grid.is_walkable(pos) {
				'.'
			} else {
				'#'
			};
			out.push(c);
		}
		out.push('\n');
	}
	out
}

fn render_view(view: &NodeView) -> String {
	let mut out = format!("{}: {}", view.speaker, view.text);
	match &view.prompt {
		Prompt::Choices(choices) => {
			for (i, choice) in choices.iter().enumerate() {
				out.push_str(&format!("\n  {}) {}", i + 1, choice));
			}
		},
		Prompt::Continue => out.push_str("\n  [continue]"),
	}
	out
}

fn describe(scene: &Scene, event: &SceneEvent) -> Option<String> {
	let npc_name = |id: usize| scene.npcs().get(id).map(|n| n.name().to_string()).unwrap_or_default();
	match event {
		SceneEvent::PathFound { id, steps } => {
			debug!("{id}: {steps} steps");
			None
		},
		SceneEvent::MoveRejected(err) => Some(format!("can't go there: {}", err)),
		SceneEvent::Arrived(cell) => Some(format!("arrived at {}", cell)),
		SceneEvent::TriggerArmed(id) => Some(format!("{} noticed you", npc_name(*id))),
		SceneEvent::TriggerCancelled(id) => Some(format!("{} lost interest", npc_name(*id))),
		SceneEvent::DialogueShown(view) => Some(render_view(view)),
		SceneEvent::DialogueEnded => Some("(dialogue closed)".to_string()),
	}
}

fn run_frames(scene: &mut Scene, frames: usize, out: &mut impl Write) -> Result<()> {
	for _ in 0..frames {
		for event in scene.tick(FRAME_MS) {
			if let Some(line) = describe(scene, &event) {
				writeln!(out, "{}", line)?;
			}
		}
	}
	Ok(())
}

fn walk(scene: &mut Scene, result: Result<impl std::fmt::Display, impl std::fmt::Display>, out: &mut impl Write) -> Result<()> {
	if let Err(err) = result {
		writeln!(out, "can't go there: {}", err)?;
		return Ok(());
	}
	for _ in 0..MAX_WALK_FRAMES {
		run_frames(scene, 1, out)?;
		if !scene.is_path_pending() && scene.hero().can_start_new_movement() {
			return Ok(());
		}
	}
	bail!("hero did not stop within {} frames", MAX_WALK_FRAMES)
}

fn show_step(step: Step, out: &mut impl Write) -> Result<()> {
	match step {
		Step::Show(view) => writeln!(out, "{}", render_view(&view))?,
		Step::Ended => writeln!(out, "(dialogue closed)")?,
		Step::Ignored => writeln!(out, "nothing happens")?,
	}
	Ok(())
}

/// Applies one command. Returns `false` when the session should end.
fn execute(scene: &mut Scene, command: Command, out: &mut impl Write) -> Result<bool> {
	match command {
		Command::Goto(cell) => {
			let result = scene.walk_to(cell);
			walk(scene, result, out)?;
		},
		Command::Click(x, y) => {
			let result = scene.pointer_down(x, y);
			walk(scene, result, out)?;
		},
		Command::Wait(ms) => run_frames(scene, (ms / FRAME_MS).ceil() as usize, out)?,
		Command::Choose(index) => {
			let step = scene.choose(index);
			show_step(step, out)?;
		},
		Command::Continue => {
			let step = scene.advance();
			show_step(step, out)?;
		},
		Command::End => {
			if !scene.end_dialogue() {
				writeln!(out, "no dialogue is open")?;
			}
		},
		Command::Status => writeln!(out, "{}", scene.status())?,
		Command::Map => write!(out, "{}", render_map(scene))?,
		Command::Help => writeln!(out, "{}", HELP)?,
		Command::Quit => return Ok(false),
	}
	Ok(true)
}

fn main() -> Result<()> {
	tilewalk::init_logging();
	let filename = env::args().nth(1).context("Usage: tilewalk <scene.scn>")?;
	let entry = Path::new(&filename);
	let src = fs::read_to_string(entry).with_context(|| format!("Failed to read {}", entry.display()))?;
	let base = entry.parent().map(Path::to_path_buf).unwrap_or_default();

	let mut scene = tilewalk::load_scene(&filename, &src, |name| {
		let path = base.join(name);
		fs::read_to_string(&path).with_context(|| format!("Failed to read included file: {}", path.display()))
	})?;
	info!("loaded {}", filename);

	let stdin = io::stdin();
	let mut out = io::stdout().lock();
	write!(out, "{}", render_map(&scene))?;
	writeln!(out, "type 'help' for commands")?;
	loop {
		write!(out, "> ")?;
		out.flush()?;
		let mut line = String::new();
		if stdin.lock().read_line(&mut line)? == 0 {
			break;
		}
		let command = match parse_command(&line) {
			Ok(Some(command)) => command,
			Ok(None) => continue,
			Err(err) => {
				writeln!(out, "{}", err)?;
				continue;
			},
		};
		if !execute(&mut scene, command, &mut out)? {
			break;
		}
	}
	Ok(())
}


#[cfg(test)]
mod tests {
	use super::*;

	fn scene() -> Scene {
		let src = "map { \"......\", \"..#...\", \"......\" }\nhero at (0, 0);\nnpc Guide at (4, 0) -> hi;\nnode hi { speaker = \"Guide\"; text = \"Hello!\"; choice \"Bye\" -> bye; }\nnode bye { speaker = \"Guide\"; text = \"Have a great day!\"; }\n";
		tilewalk::load_scene("test.scn", src, |_| Err(anyhow!("no includes"))).expect("valid scene")
	}

	fn run(scene: &mut Scene, line: &str) -> String {
		let command = parse_command(line).expect("valid command").expect("not blank");
		let mut out = Vec::new();
		assert!(execute(scene, command, &mut out).expect("command runs"));
		String::from_utf8(out).expect("utf8")
	}

	#[test]
	fn commands_parse() {
		assert_eq!(parse_command("goto 3 4").unwrap(), Some(Command::Goto(GridPos::new(3, 4))));
		assert_eq!(parse_command("  click 10.5 20 ").unwrap(), Some(Command::Click(10.5, 20.0)));
		assert_eq!(parse_command("choose 1").unwrap(), Some(Command::Choose(0)));
		assert_eq!(parse_command("wait 1000").unwrap(), Some(Command::Wait(1000.0)));
		assert_eq!(parse_command("q").unwrap(), Some(Command::Quit));
		assert_eq!(parse_command("   ").unwrap(), None);
	}

	#[test]
	fn bad_commands_are_errors() {
		assert!(parse_command("goto 3").is_err());
		assert!(parse_command("goto a b").is_err());
		assert!(parse_command("choose 0").is_err());
		assert!(parse_command("wait -5").is_err());
		assert!(parse_command("dance").is_err());
	}

	#[test]
	fn map_marks_hero_npcs_and_walls() {
		let scene = scene();
		assert_eq!(render_map(&scene), "@...G.\n..#...\n......\n");
	}

	#[test]
	fn walking_up_to_an_npc_opens_the_dialogue() {
		let mut scene = scene();
		let out = run(&mut scene, "goto 3 0");
		assert!(out.contains("arrived at (3, 0)"));
		assert!(out.contains("Guide noticed you"));

		let out = run(&mut scene, "wait 1100");
		assert!(out.contains("Guide: Hello!\n  1) Bye"));

		let out = run(&mut scene, "goto 0 0");
		assert!(out.contains("a dialogue is in progress"));

		let out = run(&mut scene, "choose 1");
		assert!(out.contains("Have a great day!"));
		let out = run(&mut scene, "continue");
		assert_eq!(out, "(dialogue closed)\n");
		let out = run(&mut scene, "end");
		assert_eq!(out, "no dialogue is open\n");
	}

	#[test]
	fn status_prints_the_overlay() {
		let mut scene = scene();
		let out = run(&mut scene, "status");
		assert_eq!(out, "Current Grid Position: (0, 0)\nWorld Position: (32, 32)\nMoving: No\n");
	}
}
