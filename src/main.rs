use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::SplitWhitespace;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};

use redwood::{NodeColor, Redwood};

/// Interactive explorer for a red-black tree of integers.
#[derive(Debug, Parser)]
#[clap(name = "redwood", version)]
struct Opts {
    /// File to preload: one line of comma-separated integers.
    #[clap(short, long)]
    file: Option<PathBuf>,

    /// Logging verbosity (-v info, -vv debug, -vvv trace).
    #[clap(short, long, parse(from_occurrences))]
    verbose: usize,
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    stderrlog::new()
        .module(module_path!())
        .verbosity(opts.verbose)
        .init()
        .context("failed to set up logging")?;

    let mut tree = Redwood::new();

    if let Some(path) = &opts.file {
        let loaded = load_file(&mut tree, path)?;
        info!("loaded {} numbers from {}", loaded, path.display());
        render(&tree);
    }

    repl(&mut tree)
}

fn repl(tree: &mut Redwood<i64>) -> Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();

    println!("commands: add, remove, find, print, load, clear, help, quit");

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            return Ok(());
        }

        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };

        let outcome = match command.to_ascii_lowercase().as_str() {
            "add" => add(tree, words),
            "remove" => remove(tree, words),
            "find" => find(tree, words),
            "print" => {
                render(tree);
                Ok(())
            }
            "load" => load(tree, words),
            "clear" => {
                tree.clear();
                println!("The tree is now empty.");
                Ok(())
            }
            "help" => {
                print_help();
                Ok(())
            }
            "quit" | "exit" => return Ok(()),
            other => {
                warn!("unknown command: {other}");
                print_help();
                Ok(())
            }
        };

        if let Err(err) = outcome {
            eprintln!("error: {err:#}");
        }
    }
}

fn add(tree: &mut Redwood<i64>, words: SplitWhitespace<'_>) -> Result<()> {
    let mut changed = false;

    for word in words {
        let key = parse_key(word)?;
        if tree.insert(key) {
            debug!("inserted {key}");
            changed = true;
        } else {
            println!("{key} is already in the tree");
        }
    }

    if changed {
        render(tree);
    }

    Ok(())
}

fn remove(tree: &mut Redwood<i64>, words: SplitWhitespace<'_>) -> Result<()> {
    for word in words {
        let key = parse_key(word)?;
        if tree.remove(&key) {
            debug!("removed {key}");
        } else {
            println!("{key} is not in the tree");
        }
    }

    render(tree);

    Ok(())
}

fn find(tree: &Redwood<i64>, mut words: SplitWhitespace<'_>) -> Result<()> {
    let word = words.next().context("usage: find <number>")?;
    let key = parse_key(word)?;

    if tree.contains(&key) {
        println!("{key} is in the tree");
    } else {
        println!("{key} is not in the tree");
    }

    Ok(())
}

fn load(tree: &mut Redwood<i64>, mut words: SplitWhitespace<'_>) -> Result<()> {
    let path = words.next().context("usage: load <file>")?;
    let loaded = load_file(tree, Path::new(path))?;

    info!("loaded {loaded} numbers");
    render(tree);

    Ok(())
}

/// Bulk ingestion: the first line of the file holds the numbers, separated
/// by commas. Keys already present are skipped, not errors.
fn load_file(tree: &mut Redwood<i64>, path: &Path) -> Result<usize> {
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let numbers = parse_number_list(text.lines().next().unwrap_or(""))?;

    let mut loaded = 0;
    for key in numbers {
        if tree.insert(key) {
            loaded += 1;
        } else {
            debug!("skipping duplicate {key}");
        }
    }

    Ok(loaded)
}

fn parse_number_list(line: &str) -> Result<Vec<i64>> {
    line.split(',')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(parse_key)
        .collect()
}

fn parse_key(word: &str) -> Result<i64> {
    word.parse()
        .with_context(|| format!("not a number: {word:?}"))
}

/// Draws the tree lying on its side: right subtree on top, one node per
/// line, one tab per depth level, the key suffixed with its color.
fn render(tree: &Redwood<i64>) {
    if tree.is_empty() {
        println!("(empty tree)");
        return;
    }

    for (key, color, depth) in tree.visual_iter() {
        let tag = match color {
            NodeColor::Red => 'R',
            NodeColor::Black => 'B',
        };
        println!("{}{key}{tag}", "\t".repeat(depth));
    }
}

fn print_help() {
    println!("add <n>...     insert numbers and print the tree");
    println!("remove <n>...  delete numbers and print the tree");
    println!("find <n>       report whether a number is present");
    println!("print          print the tree (right subtree on top)");
    println!("load <file>    insert a comma-separated list from a file");
    println!("clear          empty the tree");
    println!("quit           leave");
}
