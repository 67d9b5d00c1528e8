#![allow(dead_code)]

use async_trait::async_trait;
use splitdock::domain::ports::{Invocation, ProcessOutput, ProcessRunner};
use splitdock::Result;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const SPLIT_EXE: &str = "fake-sdsplit";
pub const DOCK_EXE: &str = "fake-rbdock";

#[derive(Debug, Clone)]
pub struct CallRecord {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub started: Instant,
    pub finished: Instant,
}

impl CallRecord {
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        let pos = self.args.iter().position(|a| a == flag)?;
        self.args.get(pos + 1).map(String::as_str)
    }
}

/// Stands in for both external executables.
///
/// The split side really splits `$$$$`-terminated records into
/// `<root><N>.sd` files; the dock side copies the chunk to `<-o>.sd`.
#[derive(Default)]
pub struct FakeRunner {
    pub split_exit_code: Option<i32>,
    pub failing_chunks: HashSet<u64>,
    pub silent_chunks: HashSet<u64>,
    pub dock_delays: HashMap<u64, Duration>,
    pub default_delay: Duration,
    calls: Mutex<Vec<CallRecord>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_split(mut self, exit_code: i32) -> Self {
        self.split_exit_code = Some(exit_code);
        self
    }

    pub fn failing_chunk(mut self, sequence_index: u64) -> Self {
        self.failing_chunks.insert(sequence_index);
        self
    }

    /// Exits 0 without writing the output file.
    pub fn silent_chunk(mut self, sequence_index: u64) -> Self {
        self.silent_chunks.insert(sequence_index);
        self
    }

    pub fn delay(mut self, sequence_index: u64, delay: Duration) -> Self {
        self.dock_delays.insert(sequence_index, delay);
        self
    }

    pub fn default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().unwrap().clone()
    }

    pub fn dock_calls(&self) -> Vec<CallRecord> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == Path::new(DOCK_EXE))
            .collect()
    }

    pub fn split_calls(&self) -> Vec<CallRecord> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == Path::new(SPLIT_EXE))
            .collect()
    }

    fn split(&self, args: &[String]) -> ProcessOutput {
        if let Some(code) = self.split_exit_code {
            return ProcessOutput {
                exit_code: Some(code),
                stdout: String::new(),
                stderr: "sdsplit: cannot open input".to_string(),
            };
        }

        let chunk_size: usize = args[0].trim_start_matches('-').parse().unwrap();
        let root = args[1].strip_prefix("-o ").unwrap().to_string();
        let content = std::fs::read_to_string(&args[2]).unwrap();

        let records = split_records(&content);
        for (i, group) in records.chunks(chunk_size).enumerate() {
            std::fs::write(format!("{}{}.sd", root, i + 1), group.concat()).unwrap();
        }
        ProcessOutput {
            exit_code: Some(0),
            ..Default::default()
        }
    }

    async fn dock(&self, args: &[String]) -> ProcessOutput {
        let input = value_after(args, "-i");
        let output_base = value_after(args, "-o");
        let index = chunk_number(&input);

        let delay = self
            .dock_delays
            .get(&index)
            .copied()
            .unwrap_or(self.default_delay);
        tokio::time::sleep(delay).await;

        if self.failing_chunks.contains(&index) {
            return ProcessOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: format!("RBT_FILE_PARSE_ERROR in chunk {}", index),
            };
        }
        if !self.silent_chunks.contains(&index) {
            std::fs::copy(&input, format!("{}.sd", output_base)).unwrap();
        }
        ProcessOutput {
            exit_code: Some(0),
            stdout: format!("docked {}", input),
            stderr: String::new(),
        }
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        let started = Instant::now();
        let output = if invocation.program == Path::new(SPLIT_EXE) {
            self.split(&invocation.args)
        } else if invocation.program == Path::new(DOCK_EXE) {
            self.dock(&invocation.args).await
        } else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such program: {}", invocation.program.display()),
            )
            .into());
        };

        self.calls.lock().unwrap().push(CallRecord {
            program: invocation.program.clone(),
            args: invocation.args.clone(),
            started,
            finished: Instant::now(),
        });
        Ok(output)
    }
}

fn value_after(args: &[String], flag: &str) -> String {
    let pos = args.iter().position(|a| a == flag).unwrap();
    args[pos + 1].clone()
}

/// `.../tmp_12.sd` -> 12
pub fn chunk_number(path: &str) -> u64 {
    let stem = Path::new(path).file_stem().unwrap().to_string_lossy();
    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().unwrap()
}

fn split_records(content: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current = String::new();
    for line in content.lines() {
        current.push_str(line);
        current.push('\n');
        if line.trim_end() == "$$$$" {
            records.push(std::mem::take(&mut current));
        }
    }
    records
}

/// Writes an SD-like library with `count` records.
pub fn write_library(path: &Path, count: usize) {
    let mut content = String::new();
    for i in 1..=count {
        content.push_str(&format!(
            "LIG{}\n  fake\n\n  0  0  0  0  0  0  0  0  0  0999 V2000\nM  END\n$$$$\n",
            i
        ));
    }
    std::fs::write(path, content).unwrap();
}

pub fn tools() -> splitdock::ToolPaths {
    splitdock::ToolPaths {
        split_executable: PathBuf::from(SPLIT_EXE),
        dock_executable: PathBuf::from(DOCK_EXE),
    }
}
