//! Sample command for inspecting a single user's events.
//!
//! Writes one user's sorted rows to a text file so the open/close pattern can
//! be read by eye.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rand::Rng;
use rand::seq::SliceRandom;
use tw_core::{Event, LoadedEvents, load_file};

use crate::Config;

const HEADERS: [&str; 4] = ["timestamp", "event", "open_type", "user_id"];

#[derive(Debug, Args)]
pub struct SampleArgs {
    /// Usage log to read (defaults to the configured `input_path`).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// User to dump. A random user is picked when omitted.
    #[arg(short, long)]
    pub user: Option<i64>,

    /// File to write (defaults to the configured `sample_path`).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Picks the requested user, or a random one.
pub fn pick_user<R: Rng + ?Sized>(
    loaded: &LoadedEvents,
    requested: Option<i64>,
    rng: &mut R,
) -> Result<i64> {
    match requested {
        Some(user_id) if loaded.user_events(user_id).is_empty() => {
            anyhow::bail!("user {user_id} has no events")
        }
        Some(user_id) => Ok(user_id),
        None => loaded
            .user_ids()
            .choose(rng)
            .copied()
            .context("usage log has no events to sample"),
    }
}

/// Formats events as a right-aligned table with a header row.
pub fn format_user_table(events: &[Event]) -> String {
    let rows: Vec<[String; 4]> = events
        .iter()
        .map(|e| {
            [
                e.timestamp.to_string(),
                e.kind.to_string(),
                e.raw_open_type.clone(),
                e.user_id.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut output = String::new();
    let header = HEADERS.map(str::to_string);
    for row in std::iter::once(&header).chain(&rows) {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:>width$}"))
            .collect();
        writeln!(output, "{}", line.join(" ")).unwrap();
    }
    output
}

/// Runs the sample command, returning the user and file written.
pub fn run(args: &SampleArgs, config: &Config) -> Result<(i64, PathBuf)> {
    let input = args.input.as_ref().unwrap_or(&config.input_path);
    let loaded =
        load_file(input).with_context(|| format!("failed to load {}", input.display()))?;

    let user_id = pick_user(&loaded, args.user, &mut rand::thread_rng())?;
    let output = args.output.clone().unwrap_or_else(|| config.sample_path.clone());

    std::fs::write(&output, format_user_table(loaded.user_events(user_id)))
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::debug!(user_id, path = ?output, "wrote user sample");

    Ok((user_id, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tw_core::load_events;

    const LOG: &str = "\
1700000000450,closed,,12
1700000000100,opened,manual,12
5,opened,auto,3
1700000002000,opened,shortcut,12
";

    #[test]
    fn test_user_table() {
        let loaded = load_events(LOG.as_bytes()).unwrap();

        let output = format_user_table(loaded.user_events(12));
        assert_snapshot!(output);
    }

    #[test]
    fn test_user_table_empty_has_header_only() {
        assert_eq!(format_user_table(&[]), "timestamp event open_type user_id\n");
    }

    #[test]
    fn test_pick_requested_user() {
        let loaded = load_events(LOG.as_bytes()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(pick_user(&loaded, Some(3), &mut rng).unwrap(), 3);
        assert!(pick_user(&loaded, Some(99), &mut rng).is_err());
    }

    #[test]
    fn test_pick_random_user_is_known() {
        let loaded = load_events(LOG.as_bytes()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..10 {
            let user = pick_user(&loaded, None, &mut rng).unwrap();
            assert!(user == 3 || user == 12);
        }
    }

    #[test]
    fn test_pick_from_empty_log_errors() {
        let mut rng = StdRng::seed_from_u64(7);

        assert!(pick_user(&LoadedEvents::default(), None, &mut rng).is_err());
    }

    #[test]
    fn test_run_writes_sample_file() {
        let temp = tempfile::tempdir().unwrap();
        let input = temp.path().join("log.csv");
        std::fs::write(&input, LOG).unwrap();
        let config = Config {
            input_path: input,
            sample_path: temp.path().join("user_sample.txt"),
            ..Config::default()
        };
        let args = SampleArgs {
            input: None,
            user: Some(3),
            output: None,
        };

        let (user, path) = run(&args, &config).unwrap();

        assert_eq!(user, 3);
        assert_eq!(path, config.sample_path);
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(written.ends_with("5 opened      auto       3\n"));
    }
}
