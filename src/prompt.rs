//! Interactive operator prompts
//!
//! All console input flows through one channel fed by a single stdin
//! reader thread. The same channel doubles as the cancellation signal
//! during streaming (any line the operator types cancels the run), so
//! nothing else may read stdin directly.

use crate::config::{AxisSelection, GraphMode, OutputFormat};
use crate::error::{DaqError, Result};
use crate::protocol::cell::is_integer_str;
use crossbeam_channel::{unbounded, Receiver};
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Characters Excel forbids in a sheet name
const SHEET_NAME_FORBIDDEN: &[char] = &['/', '\\', '?', '*', ':', '[', ']'];

/// Longest sheet name Excel accepts
const SHEET_NAME_MAX: usize = 31;

/// Spawn the stdin reader thread and return the receiving side.
///
/// Call once per process; every prompt and the streaming cancellation
/// listener share clones of this receiver.
pub fn stdin_channel() -> Receiver<String> {
    let (tx, rx) = unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Validated-input prompts over the shared stdin channel
pub struct Console {
    rx: Receiver<String>,
}

impl Console {
    pub fn new(rx: Receiver<String>) -> Self {
        Self { rx }
    }

    /// A clone of the input channel, for the streaming cancellation pacer
    pub fn input_channel(&self) -> Receiver<String> {
        self.rx.clone()
    }

    /// Print `prompt` and read one line
    pub fn line(&self, prompt: &str) -> Result<String> {
        print!("{}", prompt);
        let _ = std::io::stdout().flush();
        self.rx
            .recv()
            .map_err(|_| DaqError::Source("console input closed".to_string()))
    }

    /// Yes/no question, repeated until the answer starts with y or n
    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        loop {
            let answer = self.line(&format!("{} [y/n]: ", prompt))?;
            match answer.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
                Some('y') => return Ok(true),
                Some('n') => return Ok(false),
                _ => println!("Please answer y or n."),
            }
        }
    }

    /// Integer input with optional inclusive bounds, repeated until valid
    pub fn int_in_range(
        &self,
        prompt: &str,
        min: Option<i64>,
        max: Option<i64>,
    ) -> Result<i64> {
        loop {
            let answer = self.line(prompt)?;
            let trimmed = answer.trim();
            if !is_integer_str(trimmed) {
                println!("Please enter a whole number.");
                continue;
            }
            // is_integer_str accepts forms like "7.0"; go through f64
            let value = match trimmed.parse::<f64>() {
                Ok(v) => v as i64,
                Err(_) => continue,
            };
            if min.is_some_and(|m| value < m) || max.is_some_and(|m| value > m) {
                println!(
                    "Please enter a number between {} and {}.",
                    min.map_or("-inf".to_string(), |m| m.to_string()),
                    max.map_or("inf".to_string(), |m| m.to_string()),
                );
                continue;
            }
            return Ok(value);
        }
    }

    /// Pick a serial port from the enumerated list
    pub fn pick_port(&self, ports: &[String]) -> Result<String> {
        if ports.is_empty() {
            return Err(DaqError::Source("no serial ports found".to_string()));
        }
        println!("Available ports:");
        for (i, name) in ports.iter().enumerate() {
            println!("  [{}] {}", i, name);
        }
        let index = self.int_in_range(
            &format!("Select port [0-{}]: ", ports.len() - 1),
            Some(0),
            Some(ports.len() as i64 - 1),
        )?;
        Ok(ports[index as usize].clone())
    }

    /// Choose the output form
    pub fn output_format(&self) -> Result<OutputFormat> {
        let tabular = self.confirm("Write an Excel workbook (otherwise CSV)?")?;
        Ok(if tabular {
            OutputFormat::Workbook
        } else {
            OutputFormat::Csv
        })
    }

    /// Ask for an output path, appending the format's extension when
    /// missing, creating parent directories, and resolving collisions
    /// with an existing file by overwrite consent or a different name
    pub fn output_path(&self, format: OutputFormat) -> Result<PathBuf> {
        loop {
            let name = self.line("Output file name: ")?;
            let name = name.trim();
            if name.is_empty() {
                println!("Please enter a file name.");
                continue;
            }
            let path = ensure_extension(name, format.extension());
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            if path.exists() && !self.confirm(&format!("{:?} exists. Overwrite?", path))? {
                continue;
            }
            return Ok(path);
        }
    }

    /// Ask for a new sheet name, enforcing the Excel naming rules and
    /// uniqueness against the pages already in the workbook
    pub fn sheet_name(&self, existing: &[String]) -> Result<String> {
        loop {
            let name = self.line("Sheet name: ")?;
            let name = name.trim();
            match validate_sheet_name(name, existing) {
                Ok(()) => return Ok(name.to_string()),
                Err(reason) => println!("{}", reason),
            }
        }
    }

    /// Choose how (and whether) to chart the run
    pub fn graph_mode(&self, tabular: bool) -> Result<GraphMode> {
        if self.confirm("Chart the data live while streaming?")? {
            return Ok(GraphMode::Live);
        }
        if tabular && self.confirm("Embed a chart in the output file?")? {
            return Ok(GraphMode::FileOnly);
        }
        Ok(GraphMode::Off)
    }

    /// Choose which two header columns feed the chart
    pub fn axis_selection(&self, header: &[String]) -> Result<AxisSelection> {
        println!("Columns:");
        for (i, name) in header.iter().enumerate() {
            println!("  [{}] {}", i, name);
        }
        let max = header.len() as i64 - 1;
        let x = self.int_in_range("x-axis column: ", Some(0), Some(max))?;
        let y = self.int_in_range("y-axis column: ", Some(0), Some(max))?;
        Ok(AxisSelection {
            x: x as usize,
            y: y as usize,
        })
    }

    /// Whether to chart anyway when the measured cadence is too fast,
    /// by flooring the sample delay at one millisecond
    pub fn accept_delay_floor(&self) -> Result<bool> {
        self.confirm("Sample delay measured as 0; chart with a 1 ms floor anyway?")
    }
}

/// What to do after a run ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Close the output and exit
    Stop,
    /// Stream again onto a new page of the same file
    NewPage,
    /// Stream again into a new file
    NewFile,
}

impl Console {
    /// The after-run choice. Flat files have no pages, so "again" always
    /// means a new file for them.
    pub fn continuation(&self, paginated: bool) -> Result<Continuation> {
        if !self.confirm("Stream again?")? {
            return Ok(Continuation::Stop);
        }
        if paginated && self.confirm("Same file, new sheet (otherwise a new file)?")? {
            return Ok(Continuation::NewPage);
        }
        Ok(Continuation::NewFile)
    }
}

/// Append `ext` (with dot) unless the name already ends with it
pub fn ensure_extension(name: &str, ext: &str) -> PathBuf {
    if name.to_ascii_lowercase().ends_with(&ext.to_ascii_lowercase()) {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{}{}", name, ext))
    }
}

/// Check a candidate sheet name against the Excel naming rules and the
/// names already taken in this workbook
pub fn validate_sheet_name(name: &str, existing: &[String]) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("Sheet names cannot be empty.".to_string());
    }
    if name.len() > SHEET_NAME_MAX {
        return Err(format!(
            "Sheet names are limited to {} characters.",
            SHEET_NAME_MAX
        ));
    }
    if name.eq_ignore_ascii_case("history") {
        return Err("'History' is reserved by Excel.".to_string());
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err("Sheet names cannot start or end with an apostrophe.".to_string());
    }
    if let Some(c) = name.chars().find(|c| SHEET_NAME_FORBIDDEN.contains(c)) {
        return Err(format!("Sheet names cannot contain '{}'.", c));
    }
    if existing.iter().any(|e| e.eq_ignore_ascii_case(name)) {
        return Err(format!("A sheet named '{}' already exists.", name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn console_with(lines: &[&str]) -> Console {
        let (tx, rx) = unbounded();
        for line in lines {
            tx.send(line.to_string()).unwrap();
        }
        // Keep the sender alive past this function so recv sees the
        // queued lines rather than a disconnect
        std::mem::forget(tx);
        Console::new(rx)
    }

    #[test]
    fn test_confirm_retries_until_valid() {
        let console = console_with(&["maybe", "", "Yes"]);
        assert!(console.confirm("go?").unwrap());

        let console = console_with(&["no"]);
        assert!(!console.confirm("go?").unwrap());
    }

    #[test]
    fn test_int_in_range_rejects_out_of_bounds() {
        let console = console_with(&["abc", "99", "-1", "3"]);
        assert_eq!(
            console.int_in_range("n: ", Some(0), Some(5)).unwrap(),
            3
        );
    }

    #[test]
    fn test_int_accepts_whole_floats() {
        let console = console_with(&["4.0"]);
        assert_eq!(console.int_in_range("n: ", None, None).unwrap(), 4);
    }

    #[test]
    fn test_pick_port() {
        let ports = vec!["/dev/ttyUSB0".to_string(), "/dev/ttyACM0".to_string()];
        let console = console_with(&["1"]);
        assert_eq!(console.pick_port(&ports).unwrap(), "/dev/ttyACM0");
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let (tx, rx) = unbounded::<String>();
        drop(tx);
        let console = Console::new(rx);
        assert!(console.line("? ").is_err());
    }

    #[test]
    fn test_continuation_choices() {
        let console = console_with(&["n"]);
        assert_eq!(console.continuation(true).unwrap(), Continuation::Stop);

        let console = console_with(&["y", "y"]);
        assert_eq!(console.continuation(true).unwrap(), Continuation::NewPage);

        let console = console_with(&["y", "n"]);
        assert_eq!(console.continuation(true).unwrap(), Continuation::NewFile);

        // Flat output never offers a new page
        let console = console_with(&["y"]);
        assert_eq!(console.continuation(false).unwrap(), Continuation::NewFile);
    }

    #[test]
    fn test_ensure_extension() {
        assert_eq!(ensure_extension("run", ".csv"), PathBuf::from("run.csv"));
        assert_eq!(ensure_extension("run.csv", ".csv"), PathBuf::from("run.csv"));
        assert_eq!(
            ensure_extension("Run.XLSX", ".xlsx"),
            PathBuf::from("Run.XLSX")
        );
    }

    #[test]
    fn test_validate_sheet_name() {
        let existing = vec!["Trial_1".to_string()];

        assert!(validate_sheet_name("Trial_2", &existing).is_ok());
        assert!(validate_sheet_name("", &existing).is_err());
        assert!(validate_sheet_name(&"x".repeat(32), &existing).is_err());
        assert!(validate_sheet_name(&"x".repeat(31), &existing).is_ok());
        assert!(validate_sheet_name("History", &existing).is_err());
        assert!(validate_sheet_name("'quoted", &existing).is_err());
        assert!(validate_sheet_name("quoted'", &existing).is_err());
        assert!(validate_sheet_name("a/b", &existing).is_err());
        assert!(validate_sheet_name("a[b]", &existing).is_err());
        assert!(validate_sheet_name("trial_1", &existing).is_err());
    }
}
