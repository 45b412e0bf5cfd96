//! # Bubble Pop CLI
//!
//! Command-line interface for playing Bubble Pop interactively or running
//! headless simulations with configurable policies.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use bubble_pop_core::solver::{find_best_move, largest_region_move};
use bubble_pop_core::{
    clearable_regions, Color, GameConfig, Outcome, PopResult, Pos, RejectReason, Session,
    SessionState, TickResult,
};
use clap::{Parser, ValueEnum};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Parser, Debug)]
#[command(name = "bubble-pop")]
#[command(author, version, about = "Play Bubble Pop in the terminal or run simulations")]
struct Args {
    /// Run in interactive mode (default if no other mode specified)
    #[arg(short, long)]
    interactive: bool,

    /// Number of episodes to run in headless mode
    #[arg(short, long)]
    episodes: Option<u32>,

    /// Random seed for deterministic runs
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Board rows
    #[arg(long, default_value = "8")]
    rows: usize,

    /// Board columns
    #[arg(long, default_value = "8")]
    cols: usize,

    /// Number of bubble colors (1-6)
    #[arg(long, default_value = "6")]
    colors: usize,

    /// Smallest group that can be popped
    #[arg(long, default_value = "3")]
    min_group: usize,

    /// Score needed per level (0 = single level, no progression)
    #[arg(long, default_value = "1000")]
    level_step: u64,

    /// Maximum pops per episode in headless mode (0 = unlimited)
    #[arg(short, long, default_value = "10000")]
    max_steps: u32,

    /// Seconds taken off the clock per pop in headless mode
    #[arg(long, default_value = "1")]
    seconds_per_pop: u32,

    /// Lookahead depth for the solver policy and the interactive hint
    #[arg(long, default_value = "3")]
    depth: usize,

    /// Policy for headless mode
    #[arg(short, long, value_enum, default_value = "random")]
    policy: Policy,

    /// Show board after each pop in headless mode and enable debug logging
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Random poppable region
    Random,
    /// Largest poppable region
    Greedy,
    /// Lookahead advisor
    Solver,
}

impl Args {
    fn config(&self) -> Result<GameConfig> {
        if self.colors == 0 || self.colors > Color::ALL.len() {
            bail!("--colors must be between 1 and {}", Color::ALL.len());
        }
        let config = GameConfig {
            rows: self.rows,
            cols: self.cols,
            palette: Color::ALL[..self.colors].to_vec(),
            min_group_size: self.min_group,
            level_score_step: (self.level_step > 0).then_some(self.level_step),
            ..GameConfig::default()
        };
        config.validate().context("invalid game options")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = args.config()?;
    if let Some(episodes) = args.episodes {
        run_headless(&args, &config, episodes)
    } else {
        run_interactive(&args, config)
    }
}

// =============================================================================
// Interactive mode
// =============================================================================

const HEADER: &str = "=== Bubble Pop ===";
const CONTROLS: &str =
    "Controls: WASD or Arrow Keys to move | Enter/Space to pop | H hint | R restart | Q quit\n";

/// Run interactive mode where the user plays with the keyboard.
fn run_interactive(args: &Args, config: GameConfig) -> Result<()> {
    // Raw mode with a short read timeout so the clock keeps ticking
    enable_raw_mode();
    let result = play(args, config);
    disable_raw_mode();
    println!("\nGoodbye!");
    result
}

fn play(args: &Args, config: GameConfig) -> Result<()> {
    let mut seed = args.seed;
    let mut session = Session::new(config, seed)?;
    session.start()?;

    let mut cursor = Pos::new(0, 0);
    let mut message = String::new();
    let mut last_tick = Instant::now();
    let mut stdin = io::stdin();
    let mut buffer = [0u8; 3];

    draw(&session, cursor, &message)?;

    loop {
        // Read input (returns 0 bytes when the read times out)
        let bytes_read = stdin.read(&mut buffer).unwrap_or(0);

        if session.is_running() && last_tick.elapsed() >= Duration::from_secs(1) {
            let elapsed = last_tick.elapsed().as_secs() as u32;
            last_tick += Duration::from_secs(u64::from(elapsed));
            if let TickResult::SessionEnded { outcome } = session.advance(elapsed)? {
                message = end_message(&session, outcome);
            }
            draw(&session, cursor, &message)?;
        }

        if bytes_read == 0 {
            continue;
        }

        match parse_input(&buffer[..bytes_read]) {
            InputAction::Move(dr, dc) => {
                cursor = move_cursor(&session, cursor, dr, dc);
            }
            InputAction::Pop => {
                if session.is_running() {
                    message = pop_message(&mut session, cursor)?;
                }
            }
            InputAction::Hint => match session.hint(args.depth) {
                Some(pos) => {
                    cursor = pos;
                    message = format!("  Try {}", pos);
                }
                None => message = "  No hint available".into(),
            },
            InputAction::Restart => {
                seed = seed.wrapping_add(1);
                session.reset(seed);
                session.start()?;
                last_tick = Instant::now();
                message.clear();
            }
            InputAction::Quit => return Ok(()),
            InputAction::None => continue,
        }
        draw(&session, cursor, &message)?;
    }
}

fn pop_message(session: &mut Session, cursor: Pos) -> Result<String> {
    let message = match session.select(cursor)? {
        PopResult::Rejected(RejectReason::TooSmall { required, .. }) => {
            format!("  Select {} or more matching bubbles to pop", required)
        }
        PopResult::Rejected(RejectReason::EmptyCell) => "  Nothing to pop there".into(),
        PopResult::Applied(pop) => {
            if pop.level_changed {
                format!("  +{} points! Level {}!", pop.score_delta, session.level())
            } else {
                format!("  +{} points!", pop.score_delta)
            }
        }
        PopResult::SessionEnded { outcome, pop } => {
            format!("  +{} points!\n{}", pop.score_delta, end_message(session, outcome))
        }
    };
    Ok(message)
}

fn end_message(session: &Session, outcome: Outcome) -> String {
    let headline = match outcome {
        Outcome::Won => format!(
            "  *** Congrats! Board cleared at level {} ***",
            session.level()
        ),
        Outcome::Lost => "  *** TIME'S UP ***".to_string(),
    };
    format!(
        "\n{}\n  Final Score: {}\n\n  Press R to restart or Q to quit",
        headline,
        session.score()
    )
}

fn move_cursor(session: &Session, cursor: Pos, dr: isize, dc: isize) -> Pos {
    let config = session.config();
    let row = cursor.row.saturating_add_signed(dr).min(config.rows - 1);
    let col = cursor.col.saturating_add_signed(dc).min(config.cols - 1);
    Pos::new(row, col)
}

fn draw(session: &Session, cursor: Pos, message: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    write!(out, "\x1b[2J\x1b[H")?; // Clear screen
    writeln!(out, "{}", HEADER)?;
    writeln!(out, "{}", CONTROLS)?;
    writeln!(
        out,
        "Score: {}  Level: {}  Time: {}",
        session.score(),
        session.level(),
        session.time_remaining()
    )?;
    if let Some(grid) = session.grid() {
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let pos = Pos::new(row, col);
                let symbol = grid.get(pos)?.map_or('.', Color::symbol);
                if pos == cursor {
                    write!(out, "[{}]", symbol)?;
                } else {
                    write!(out, " {} ", symbol)?;
                }
            }
            writeln!(out)?;
        }
    }
    if session.state() != SessionState::Running && message.is_empty() {
        writeln!(out, "\n  Press R to restart or Q to quit")?;
    }
    writeln!(out, "{}", message)?;
    out.flush()?;
    Ok(())
}

enum InputAction {
    Move(isize, isize),
    Pop,
    Hint,
    Restart,
    Quit,
    None,
}

fn parse_input(bytes: &[u8]) -> InputAction {
    match bytes {
        // Arrow keys (escape sequences)
        [27, 91, 65] => InputAction::Move(-1, 0), // Up arrow
        [27, 91, 66] => InputAction::Move(1, 0),  // Down arrow
        [27, 91, 67] => InputAction::Move(0, 1),  // Right arrow
        [27, 91, 68] => InputAction::Move(0, -1), // Left arrow

        // WASD keys
        [b'w'] | [b'W'] => InputAction::Move(-1, 0),
        [b's'] | [b'S'] => InputAction::Move(1, 0),
        [b'a'] | [b'A'] => InputAction::Move(0, -1),
        [b'd'] | [b'D'] => InputAction::Move(0, 1),

        // Pop the bubble under the cursor
        [b'\r'] | [b'\n'] | [b' '] => InputAction::Pop,

        // Control keys
        [b'h'] | [b'H'] => InputAction::Hint,
        [b'q'] | [b'Q'] | [3] | [27] => InputAction::Quit, // q, Q, Ctrl+C, Esc
        [b'r'] | [b'R'] => InputAction::Restart,

        _ => InputAction::None,
    }
}

// =============================================================================
// Headless mode
// =============================================================================

struct EpisodeStats {
    score: u64,
    level: u32,
    pops: u32,
    outcome: Option<Outcome>,
}

/// Run headless simulation mode.
fn run_headless(args: &Args, config: &GameConfig, episodes: u32) -> Result<()> {
    if episodes == 0 {
        bail!("--episodes must be at least 1");
    }

    log::info!(
        "running {} episodes with the {:?} policy from seed {}",
        episodes,
        args.policy,
        args.seed
    );

    // Use a separate RNG for action selection
    let mut action_rng = SmallRng::seed_from_u64(args.seed.wrapping_add(1000));
    let mut results = Vec::with_capacity(episodes as usize);

    for episode in 0..episodes {
        let episode_seed = args.seed.wrapping_add(u64::from(episode));
        let stats = run_episode(args, config, episode_seed, &mut action_rng)?;

        if args.verbose {
            println!(
                "Episode {}: Score={}, Level={}, Pops={}, Outcome={:?}",
                episode + 1,
                stats.score,
                stats.level,
                stats.pops,
                stats.outcome
            );
        }
        results.push(stats);
    }

    print_summary(args, episodes, &results);
    Ok(())
}

fn run_episode(
    args: &Args,
    config: &GameConfig,
    seed: u64,
    action_rng: &mut SmallRng,
) -> Result<EpisodeStats> {
    let mut session = Session::new(config.clone(), seed)?;
    session.start()?;
    let mut pops = 0;

    while session.is_running() && (args.max_steps == 0 || pops < args.max_steps) {
        let Some(pos) = select_action(args, &session, action_rng) else {
            // Nothing to pop: let the clock run out
            session.advance(session.time_remaining())?;
            break;
        };

        let result = session.select(pos)?;
        if matches!(result, PopResult::Rejected(_)) {
            bail!("policy {:?} chose an unpoppable cell {}", args.policy, pos);
        }
        pops += 1;

        if args.verbose {
            println!("Pop {}: {}", pops, pos);
            print!("{}", session);
        }

        if session.is_running() {
            session.advance(args.seconds_per_pop)?;
        }
    }

    let outcome = match session.state() {
        SessionState::Ended(outcome) => Some(outcome),
        _ => None,
    };
    log::debug!(
        "seed {} finished after {} pops: {}",
        seed,
        pops,
        session.state()
    );
    Ok(EpisodeStats {
        score: session.score(),
        level: session.level(),
        pops,
        outcome,
    })
}

/// Pick the next cell to pop according to the policy.
fn select_action(args: &Args, session: &Session, rng: &mut SmallRng) -> Option<Pos> {
    let grid = session.grid()?;
    let min_group = session.config().min_group_size;
    match args.policy {
        Policy::Random => {
            let regions = clearable_regions(grid, min_group);
            if regions.is_empty() {
                return None;
            }
            let region = &regions[rng.gen_range(0..regions.len())];
            region.iter().next().copied()
        }
        Policy::Greedy => largest_region_move(grid, min_group),
        Policy::Solver => find_best_move(grid, min_group, args.depth),
    }
}

fn print_summary(args: &Args, episodes: u32, results: &[EpisodeStats]) {
    let total_score: u64 = results.iter().map(|r| r.score).sum();
    let avg_score = total_score as f64 / f64::from(episodes);
    let avg_pops =
        results.iter().map(|r| u64::from(r.pops)).sum::<u64>() as f64 / f64::from(episodes);

    let mut scores: Vec<u64> = results.iter().map(|r| r.score).collect();
    scores.sort_unstable();
    let mid = scores.len() / 2;
    let median_score = if scores.len() % 2 == 0 {
        (scores[mid - 1] + scores[mid]) as f64 / 2.0
    } else {
        scores[mid] as f64
    };

    let won = results
        .iter()
        .filter(|r| r.outcome == Some(Outcome::Won))
        .count();
    let lost = results
        .iter()
        .filter(|r| r.outcome == Some(Outcome::Lost))
        .count();

    // Count level distribution
    let mut level_counts: BTreeMap<u32, u32> = BTreeMap::new();
    for result in results {
        *level_counts.entry(result.level).or_insert(0) += 1;
    }

    // Output results in parseable format
    println!("=== Simulation Results ===");
    println!("episodes={}", episodes);
    println!("policy={:?}", args.policy);
    println!("seed={}", args.seed);
    println!("board={}x{}", args.rows, args.cols);
    println!("colors={}", args.colors);
    println!("max_steps={}", args.max_steps);
    println!("avg_score={:.2}", avg_score);
    println!("median_score={:.2}", median_score);
    println!("min_score={}", scores.first().copied().unwrap_or(0));
    println!("max_score={}", scores.last().copied().unwrap_or(0));
    println!("avg_pops={:.2}", avg_pops);
    println!("won={}", won);
    println!("lost={}", lost);

    let distribution: Vec<String> = level_counts
        .iter()
        .map(|(level, count)| format!("{}:{}", level, count))
        .collect();
    println!("level_distribution={}", distribution.join(","));
}

// =============================================================================
// Terminal handling
// =============================================================================

// Platform-specific terminal raw mode handling
#[cfg(unix)]
fn enable_raw_mode() {
    use std::os::unix::io::AsRawFd;
    unsafe {
        let fd = io::stdin().as_raw_fd();
        let mut termios: libc::termios = std::mem::zeroed();
        libc::tcgetattr(fd, &mut termios);
        termios.c_lflag &= !(libc::ICANON | libc::ECHO);
        // Return after at most 100ms without input so the timer can tick
        termios.c_cc[libc::VMIN] = 0;
        termios.c_cc[libc::VTIME] = 1;
        libc::tcsetattr(fd, libc::TCSANOW, &termios);
    }
}

#[cfg(unix)]
fn disable_raw_mode() {
    use std::os::unix::io::AsRawFd;
    unsafe {
        let fd = io::stdin().as_raw_fd();
        let mut termios: libc::termios = std::mem::zeroed();
        libc::tcgetattr(fd, &mut termios);
        termios.c_lflag |= libc::ICANON | libc::ECHO;
        termios.c_cc[libc::VMIN] = 1;
        termios.c_cc[libc::VTIME] = 0;
        libc::tcsetattr(fd, libc::TCSANOW, &termios);
    }
}

#[cfg(not(unix))]
fn enable_raw_mode() {
    // On non-Unix systems, just continue without raw mode
    // Interactive mode will require Enter after each key
}

#[cfg(not(unix))]
fn disable_raw_mode() {}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["bubble-pop"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_default_args_build_default_config() {
        let config = args(&[]).config().unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_config_flags() {
        let config = args(&["--rows", "5", "--colors", "3", "--level-step", "0"])
            .config()
            .unwrap();
        assert_eq!(config.rows, 5);
        assert_eq!(config.palette, vec![Color::Red, Color::Green, Color::Blue]);
        assert_eq!(config.level_score_step, None);
    }

    #[test]
    fn test_bad_colors_rejected() {
        assert!(args(&["--colors", "0"]).config().is_err());
        assert!(args(&["--colors", "7"]).config().is_err());
        assert!(args(&["--rows", "0"]).config().is_err());
    }

    #[test]
    fn test_parse_input() {
        assert!(matches!(parse_input(&[27, 91, 65]), InputAction::Move(-1, 0)));
        assert!(matches!(parse_input(b"d"), InputAction::Move(0, 1)));
        assert!(matches!(parse_input(b" "), InputAction::Pop));
        assert!(matches!(parse_input(b"\r"), InputAction::Pop));
        assert!(matches!(parse_input(b"h"), InputAction::Hint));
        assert!(matches!(parse_input(b"Q"), InputAction::Quit));
        assert!(matches!(parse_input(b"x"), InputAction::None));
    }

    #[test]
    fn test_cursor_stays_on_board() {
        let session = Session::with_seed(1);
        assert_eq!(move_cursor(&session, Pos::new(0, 0), -1, -1), Pos::new(0, 0));
        assert_eq!(move_cursor(&session, Pos::new(7, 7), 1, 1), Pos::new(7, 7));
        assert_eq!(move_cursor(&session, Pos::new(3, 3), 1, -1), Pos::new(4, 2));
    }

    #[test]
    fn test_headless_episode_ends() {
        let args = args(&["--episodes", "1", "--policy", "greedy"]);
        let config = args.config().unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let stats = run_episode(&args, &config, 5, &mut rng).unwrap();
        assert!(stats.outcome.is_some());
        assert!(stats.pops > 0);
    }
}
