use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use glob::Pattern;
use log::{debug, error, info};
use mondot_core::HostManifest;
use mondot_lang::{compile_unit, parse_program};
use mondot_vm::{HostDispatch, Module};
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::driver::Driver;
use crate::error::LoadError;

/// Polling directory watcher: compiles every matching script on the
/// initial scan, then republishes files whose modification timestamp
/// changes. Detection is by timestamp only; the poll interval comes
/// from [`ScanConfig`].
pub struct Watcher<H> {
    driver: Arc<Driver<H>>,
    manifest: HostManifest,
    root: PathBuf,
    config: ScanConfig,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    tracked: HashMap<PathBuf, SystemTime>,
    stop: Arc<AtomicBool>,
}

impl<H: HostDispatch + 'static> Watcher<H> {
    pub fn new(
        driver: Arc<Driver<H>>,
        manifest: HostManifest,
        root: impl Into<PathBuf>,
        config: ScanConfig,
    ) -> Result<Self, LoadError> {
        let include = compile_patterns(&config.include)?;
        let exclude = compile_patterns(&config.exclude)?;
        Ok(Self {
            driver,
            manifest,
            root: root.into(),
            config,
            include,
            exclude,
            tracked: HashMap::new(),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shared flag that stops the watch loop; the binary hands it to
    /// the thread blocked on stdin.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Whether a path inside the root is a script per the configured
    /// include/exclude patterns.
    fn is_script(&self, path: &Path) -> bool {
        let Ok(rel) = path.strip_prefix(&self.root) else {
            return false;
        };
        // Forward slashes so the globs behave the same on every
        // platform.
        let rel = rel.to_string_lossy().replace('\\', "/");
        self.include.iter().any(|p| p.matches(&rel))
            && !self.exclude.iter().any(|p| p.matches(&rel))
    }

    /// Current set of script files and their modification times.
    /// Sorted for deterministic publication order.
    fn scan(&self) -> Vec<(PathBuf, SystemTime)> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("scan: skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.is_script(entry.path()) {
                continue;
            }
            let modified = match entry.metadata().ok().and_then(|m| m.modified().ok()) {
                Some(t) => t,
                None => continue,
            };
            files.push((entry.into_path(), modified));
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }

    /// Compile a script file and publish every unit it declares.
    /// Returns the number of modules published. A parse failure drops
    /// the whole file; a compile failure drops that unit, keeping its
    /// previously published version.
    pub fn load_file(&self, path: &Path) -> Result<usize, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.to_owned(),
            source: e,
        })?;
        let program = parse_program(&source).map_err(|e| LoadError::Parse {
            path: path.to_owned(),
            source: e,
        })?;

        let mut published = 0;
        let mut first_failure = None;
        for unit in &program.units {
            match compile_unit(unit, &self.manifest) {
                Ok(bytecode) => {
                    debug!("compiled unit `{}`:\n{}", unit.name, bytecode.disassemble());
                    self.driver.publish(Arc::new(Module::new(bytecode)));
                    published += 1;
                }
                Err(e) => {
                    if first_failure.is_none() {
                        first_failure = Some(LoadError::Compile {
                            path: path.to_owned(),
                            source: e,
                        });
                    }
                }
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(published),
        }
    }

    /// Recursive scan of the whole tree, compiling and publishing
    /// every script. Load failures are reported and skipped.
    pub fn initial_scan(&mut self) {
        for (path, modified) in self.scan() {
            self.tracked.insert(path.clone(), modified);
            if let Err(e) = self.load_file(&path) {
                error!("{}", e);
            }
        }
        info!(
            "initial scan of {} loaded {} script file(s)",
            self.root.display(),
            self.tracked.len()
        );
    }

    /// One watch tick: discover new files, recompile changed ones,
    /// forget removed ones.
    pub fn poll_once(&mut self) {
        let current = self.scan();
        for (path, modified) in &current {
            match self.tracked.get(path) {
                None => {
                    debug!("new script discovered: {}", path.display());
                    self.tracked.insert(path.clone(), *modified);
                    if let Err(e) = self.load_file(path) {
                        error!("{}", e);
                    }
                }
                Some(prior) if prior != modified => {
                    debug!("change detected in {}", path.display());
                    self.tracked.insert(path.clone(), *modified);
                    if let Err(e) = self.load_file(path) {
                        error!("{}", e);
                    }
                }
                Some(_) => {}
            }
        }

        let live: HashSet<&PathBuf> = current.iter().map(|(p, _)| p).collect();
        self.tracked.retain(|path, _| {
            let keep = live.contains(path);
            if !keep {
                debug!("script removed: {}", path.display());
            }
            keep
        });
    }

    /// Watch loop: poll on the configured interval until the stop
    /// flag is raised or a `Finalize` handler requests a stop. Each
    /// tick ends with a reclamation sweep.
    pub fn run(&mut self) {
        while !self.stop.load(Ordering::Acquire) {
            std::thread::sleep(self.config.poll_interval());
            self.poll_once();

            if self.driver.finalize_all() {
                info!("Finalize requested stop; stopping watcher");
                self.stop.store(true, Ordering::Release);
                break;
            }

            self.driver.manager().tick_reclaim();
        }
    }

    /// Run the watch loop on a background thread.
    pub fn spawn(mut self) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || self.run())
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, LoadError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| LoadError::Pattern {
                pattern: p.clone(),
                source: e,
            })
        })
        .collect()
}
