//! Maze Quiz entry point
//!
//! Line-driven terminal driver: loads settings, the map and a question
//! source, then feeds commands from stdin to the level.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use maze_quiz::consts::SIM_DT;
use maze_quiz::sim::{LevelController, LevelEvent, TickInput, load_map, tick};
use maze_quiz::{FallbackSource, QuestionSource, QuestionStore, Settings};

/// Ticks per walk command when no count is given (a quarter second)
const DEFAULT_WALK_TICKS: u32 = 15;

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
enum Command {
    /// Hold a direction for some ticks, then release
    Walk { dir: char, ticks: u32 },
    /// Let time pass with no keys held
    Wait { ticks: u32 },
    /// One-based choice
    Answer(usize),
    Abandon,
    Pause,
    Restart,
    Status,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?.to_ascii_lowercase();
    let count = parts.next().and_then(|n| n.parse::<u32>().ok());
    let cmd = match head.as_str() {
        "w" | "a" | "s" | "d" => Command::Walk {
            dir: head.chars().next()?,
            ticks: count.unwrap_or(DEFAULT_WALK_TICKS),
        },
        "." | "wait" => Command::Wait {
            ticks: count.unwrap_or(60),
        },
        "x" => Command::Abandon,
        "p" => Command::Pause,
        "r" => Command::Restart,
        "?" => Command::Status,
        "h" | "help" => Command::Help,
        "q" | "quit" => Command::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 => Command::Answer(n),
            _ => return None,
        },
    };
    Some(cmd)
}

fn walk_input(dir: char) -> TickInput {
    TickInput {
        up: dir == 'w',
        down: dir == 's',
        left: dir == 'a',
        right: dir == 'd',
        pause: false,
    }
}

/// Pick the configured store, or the fallback bank if it cannot be opened
fn open_source(settings: &Settings) -> Box<dyn QuestionSource> {
    let Some(path) = &settings.question_bank else {
        return Box::new(FallbackSource);
    };
    match QuestionStore::open(path, settings.shuffle_seed) {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("{e}; using fallback puzzles");
            Box::new(FallbackSource)
        }
    }
}

/// ASCII view of the level: `@` player, `?` unanswered door
fn render(level: &LevelController) -> String {
    let map = level.map();
    let player = level.actor().tile(map);
    let mut out = String::new();
    for r in 0..map.rows() as i32 {
        for c in 0..map.cols() as i32 {
            let door = level
                .doors()
                .iter()
                .any(|d| !d.is_consumed() && d.tile() == (r, c));
            let ch = if (r, c) == player {
                '@'
            } else if door {
                '?'
            } else {
                map.tile_at(r, c).as_char()
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

fn print_events(level: &mut LevelController) -> bool {
    let mut complete = false;
    for event in level.drain_events() {
        match event {
            LevelEvent::DoorActivated { puzzle, .. } => {
                println!("[{}] {} ({}s)", puzzle.subject(), puzzle.prompt(), puzzle.time_limit());
                for (i, choice) in puzzle.choices().iter().enumerate() {
                    println!("  {}) {choice}", i + 1);
                }
            }
            LevelEvent::CountdownTick { remaining, .. } => {
                if remaining <= 3 || remaining % 5 == 0 {
                    println!("  {remaining}s left");
                }
            }
            LevelEvent::DoorResolved { outcome, .. } => println!("Door closed: {outcome:?}"),
            LevelEvent::DoorConsumed { .. } => {}
            LevelEvent::ExitUnlocked => println!("The exit is open!"),
            LevelEvent::ExitLocked => println!("The exit is locked until every door is answered."),
            LevelEvent::LevelComplete(_) => {
                println!("You escaped the maze!");
                complete = true;
            }
            LevelEvent::Paused => println!("Paused"),
            LevelEvent::Resumed => println!("Resumed"),
            LevelEvent::Restarted => println!("Level restarted"),
        }
    }
    complete
}

const HELP: &str = "\
w/a/s/d [ticks]  walk
. [ticks]        wait
1-4              answer the open question
x                close the question (counts as wrong)
p                pause / resume
r                restart
?                show the map and score
q                quit";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("settings.json"));
    let settings = Settings::load(&settings_path);

    let map = load_map(&settings).context("loading map")?;
    let source = open_source(&settings);
    let mut level =
        LevelController::load(map, source.as_ref(), &settings).context("loading level")?;
    level.subscribe_score(|s| {
        println!("Score: {} | answered {}", s.marks, s.answered);
    });

    println!("{HELP}\n");
    print!("{}", render(&level));

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let Some(cmd) = parse_command(&line) else {
            println!("Unknown command, h for help");
            continue;
        };
        match cmd {
            Command::Walk { dir, ticks } => {
                let input = walk_input(dir);
                for _ in 0..ticks {
                    tick(&mut level, &input, SIM_DT);
                }
                tick(&mut level, &TickInput::default(), SIM_DT);
            }
            Command::Wait { ticks } => {
                for _ in 0..ticks {
                    tick(&mut level, &TickInput::default(), SIM_DT);
                }
            }
            Command::Answer(n) => match level.active_door() {
                Some(ticket) => {
                    let choice = n - 1;
                    let id = level.doors()[ticket.door].puzzle().id().to_string();
                    if level.submit_answer(ticket, choice) {
                        log::debug!(
                            "Source check for {id} choice {choice}: {}",
                            source.validate_answer(&id, choice)
                        );
                    }
                }
                None => println!("No question is open"),
            },
            Command::Abandon => match level.active_door() {
                Some(ticket) => {
                    level.abandon_puzzle(ticket);
                }
                None => println!("No question is open"),
            },
            Command::Pause => level.toggle_pause(),
            Command::Restart => level.restart(),
            Command::Status => {
                print!("{}", render(&level));
                println!("{}", level.progress());
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
        if print_events(&mut level) {
            break;
        }
        std::io::stdout().flush().context("flushing stdout")?;
    }

    println!("{}", serde_json::to_string_pretty(&level.summary())?);
    Ok(())
}
