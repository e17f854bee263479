use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{arg, value_parser, ArgMatches, Command};
use walkdir::WalkDir;

use mygrep_compiler::{compile, parse};
use mygrep_runtime::{matcher, CompiledRegex};

fn main() -> ExitCode {
    env_logger::init();

    // clap reports its own usage failures and exits with code 2.
    let args = command().get_matches();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn command() -> Command {
    Command::new("mygrep")
        .about("Searches lines of input for matches of a regular expression")
        .arg(arg!(-E <PATTERN> "The pattern to search for"))
        .arg(arg!(-r --recursive "Recurse into directories, prefixing output with the file path"))
        .arg(arg!(-d --debug "Print the compiled automaton before matching"))
        .arg(
            arg!([PATH] ... "Files or directories to search; standard input when omitted")
                .value_parser(value_parser!(PathBuf)),
        )
}

/// Returns whether any line matched. Matching lines are printed as a side
/// effect, prefixed with their path for multi-file and recursive runs.
fn run(args: &ArgMatches) -> anyhow::Result<bool> {
    let pattern = args.get_one::<String>("PATTERN").unwrap();
    let recursive = args.get_flag("recursive");
    let paths: Vec<PathBuf> = args
        .get_many::<PathBuf>("PATH")
        .map(|paths| paths.cloned().collect())
        .unwrap_or_default();

    let re = parse(pattern)
        .context("invalid pattern")
        .and_then(|tree| compile(tree).map_err(anyhow::Error::msg))?;

    if args.get_flag("debug") {
        println!("{}", re);
    }

    if recursive {
        if paths.is_empty() {
            anyhow::bail!("usage: mygrep -r -E <PATTERN> <PATH> [<PATH> ...]");
        }

        let mut found = false;
        for path in &paths {
            found |= grep_path(path, &re)?;
        }
        return Ok(found);
    }

    if !paths.is_empty() {
        let prefix = paths.len() > 1;
        let mut found = false;
        for path in &paths {
            found |= grep_file(path, &re, prefix)?;
        }
        return Ok(found);
    }

    // with no paths the whole of standard input is matched as one buffer.
    let mut input = Vec::new();
    io::stdin()
        .lock()
        .read_to_end(&mut input)
        .context("read standard input")?;

    Ok(matcher::matches(&input, &re))
}

/// Walks a path recursively, scanning every regular file beneath it.
fn grep_path(path: &Path, re: &CompiledRegex) -> anyhow::Result<bool> {
    let mut found = false;

    for entry in WalkDir::new(path) {
        let entry = entry.with_context(|| format!("walk path `{}`", path.display()))?;
        if entry.file_type().is_file() {
            found |= grep_file(entry.path(), re, true)?;
        }
    }

    Ok(found)
}

/// Scans a file line by line, printing every matching line. Lines are raw
/// byte sequences split on newlines; output is lossily utf-8 for display.
fn grep_file(path: &Path, re: &CompiledRegex, prefix: bool) -> anyhow::Result<bool> {
    let file =
        File::open(path).with_context(|| format!("open file `{}`", path.display()))?;
    let reader = BufReader::with_capacity(64 * 1024, file);

    let mut found = false;
    for line in reader.split(b'\n') {
        let line = line.with_context(|| format!("read file `{}`", path.display()))?;

        if matcher::matches(&line, re) {
            found = true;
            let text = String::from_utf8_lossy(&line);
            if prefix {
                println!("{}:{}", path.display(), text);
            } else {
                println!("{}", text);
            }
        }
    }

    Ok(found)
}
