//! MonDot command-line runtime.
//!
//! Usage:
//!   mondot <scripts-dir>               Watch the directory, hot-swapping on change
//!   mondot <scripts-dir> --test        Run every UTest handler once and exit
//!   mondot <scripts-dir> --benchmark   Time every UBenchmark handler and exit
//!   mondot <scripts-dir> --production  Single scan, run Finalize handlers, exit

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use colored::Colorize;
use log::info;
use mondot::Engine;

const USAGE: &str = "\
Usage: mondot <scripts-dir> [--test | --benchmark | --production]

Arguments:
  <scripts-dir>  Directory scanned recursively for .mdot/.mondot/.mon scripts

Options:
  --test        Run UTest handlers; exit 2 when any fails
  --benchmark   Run UBenchmark handlers and report elapsed times
  --production  Perform one scan, run Finalize handlers, then exit
  -h, --help    Print this help message

Without a mode flag the runtime watches the directory and hot-swaps
modules as script files change. Press Enter to exit watch mode.";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Watch,
    Test,
    Benchmark,
    Production,
}

enum Action {
    Run(PathBuf, Mode),
    Help,
}

fn parse_args() -> Result<Action, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        return Ok(Action::Help);
    }

    let mut dir = None;
    let mut mode = Mode::Watch;
    for arg in &args {
        match arg.as_str() {
            "--test" => mode = Mode::Test,
            "--benchmark" => mode = Mode::Benchmark,
            "--production" => mode = Mode::Production,
            flag if flag.starts_with('-') => {
                return Err(format!("unknown option `{}`\n\n{}", flag, USAGE));
            }
            path if dir.is_none() => dir = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument `{}`\n\n{}", extra, USAGE)),
        }
    }

    match dir {
        Some(dir) => Ok(Action::Run(dir, mode)),
        None => Err(USAGE.to_string()),
    }
}

fn run(dir: PathBuf, mode: Mode) -> Result<ExitCode, String> {
    if !dir.is_dir() {
        return Err(format!("`{}` is not a directory", dir.display()));
    }

    let engine = Engine::new();
    let mut watcher = engine.watcher(&dir).map_err(|e| e.to_string())?;
    watcher.initial_scan();

    match mode {
        Mode::Test => {
            let report = engine.driver().run_tests();
            println!(
                "UTest: total={} succeeded={} failed={}",
                report.total, report.succeeded, report.failed
            );
            Ok(ExitCode::from(report.exit_code()))
        }
        Mode::Benchmark => {
            println!("Benchmarks:");
            for result in engine.driver().run_benchmarks() {
                println!("  {}: {:.3} ms", result.module, result.elapsed_ms);
            }
            Ok(ExitCode::SUCCESS)
        }
        Mode::Production => {
            engine.driver().finalize_all();
            Ok(ExitCode::SUCCESS)
        }
        Mode::Watch => {
            let stop = watcher.stop_flag();
            let handle = watcher.spawn();
            println!(
                "{} {} - press Enter to exit",
                "watching".green().bold(),
                dir.display()
            );

            // Block this thread on stdin; the watcher polls in the
            // background until we raise the stop flag or a Finalize
            // handler does.
            let mut line = String::new();
            let _ = std::io::stdin().lock().read_line(&mut line);

            stop.store(true, Ordering::Release);
            let _ = handle.join();
            engine.driver().finalize_all();
            info!("exiting watch mode");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    match parse_args() {
        Ok(Action::Help) => {
            println!("{USAGE}");
            ExitCode::SUCCESS
        }
        Ok(Action::Run(dir, mode)) => match run(dir, mode) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
