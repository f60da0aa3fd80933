use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::SinkError;
use crate::press::{PressOutcome, PressTracker};
use crate::sink::ArtifactSink;
use crate::timestamps::{parse_antidelay, process_timestamps};

/// Key that starts the save gesture: tap to quick save, hold to open the dialog.
pub const SAVE_KEY: char = 's';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    SaveDialog,
    Browse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogField {
    Location,
    Antidelay,
}

pub struct App {
    pub signals_text: String,          // Text buffer the markers are extracted from
    pub input_path: Option<PathBuf>,   // File the buffer was loaded from, if any
    pub scroll: u16,                   // First visible line of the buffer
    pub mode: Mode,
    pub location_input: String,        // Destination path field
    pub antidelay_input: String,       // Free-text offset field
    pub focus: DialogField,
    pub browse_entries: Vec<PathBuf>,  // Candidate files while browsing
    pub browse_idx: Option<usize>,
    pub status_message: String,
    pub press: PressTracker,
    sink: Box<dyn ArtifactSink>,
}

impl App {
    pub fn new(
        signals_text: String,
        input_path: Option<PathBuf>,
        config: &Config,
        sink: Box<dyn ArtifactSink>,
    ) -> App {
        let status_message = format!(
            "Tap '{}' to save, hold it for {}s to edit destination and antidelay. Sink: {}",
            SAVE_KEY,
            config.long_press.as_secs_f64(),
            sink.name()
        );
        App {
            signals_text,
            input_path,
            scroll: 0,
            mode: Mode::Normal,
            location_input: config.location.clone(),
            antidelay_input: config.antidelay.clone(),
            focus: DialogField::Location,
            browse_entries: Vec::new(),
            browse_idx: None,
            status_message,
            press: PressTracker::new(config.long_press, config.release_gap),
            sink,
        }
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.name()
    }

    /// Markers as they would be saved with the current antidelay input.
    pub fn preview(&self) -> Vec<String> {
        process_timestamps(&self.signals_text, parse_antidelay(&self.antidelay_input))
    }

    pub fn reload(&mut self) -> Result<()> {
        if let Some(path) = &self.input_path {
            self.signals_text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            self.scroll = 0;
            self.status_message = format!("Reloaded {}", path.display());
            info!("reloaded signals from {}", path.display());
        } else {
            self.status_message = "No input file to reload".to_string();
        }
        Ok(())
    }

    // Timer event from the event loop; may fire a long press
    pub fn tick(&mut self, now: Instant) {
        if let Some(outcome) = self.press.tick(now) {
            self.dispatch(outcome);
        }
    }

    pub fn focus_lost(&mut self) {
        if self.press.is_pressed() {
            info!("save key gesture cancelled");
        }
        self.press.cancel();
    }

    fn dispatch(&mut self, outcome: PressOutcome) {
        match outcome {
            PressOutcome::LongPress => {
                info!("long press detected, opening save dialog");
                self.open_save_dialog();
            }
            PressOutcome::ShortPress => {
                info!("short press detected, quick save");
                self.quick_save();
            }
        }
    }

    /// Handles one key event. Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        // The held save key keeps feeding the gesture, whatever mode it opened.
        if key.code == KeyCode::Char(SAVE_KEY) && (self.press.is_pressed() || self.mode == Mode::Normal) {
            match key.kind {
                KeyEventKind::Press | KeyEventKind::Repeat => self.press.press(now),
                KeyEventKind::Release => {
                    if let Some(outcome) = self.press.release(now) {
                        self.dispatch(outcome);
                    }
                }
            }
            return false;
        }
        if key.kind == KeyEventKind::Release {
            return false;
        }

        match self.mode {
            Mode::Normal => return self.handle_normal_key(key),
            Mode::SaveDialog => self.handle_dialog_key(key),
            Mode::Browse => self.handle_browse_key(key),
        }
        false
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('r') => {
                if let Err(e) = self.reload() {
                    error!("reload failed: {:#}", e);
                    self.status_message = format!("Error: {:#}", e);
                }
            }
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll = self.scroll.saturating_add(1).min(self.max_scroll()),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10).min(self.max_scroll()),
            _ => {}
        }
        false
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.cancel_save_dialog(),
            KeyCode::Enter => {
                self.submit_save_dialog();
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus = match self.focus {
                    DialogField::Location => DialogField::Antidelay,
                    DialogField::Antidelay => DialogField::Location,
                };
            }
            KeyCode::F(2) => self.open_browser(),
            KeyCode::Char('o') if key.modifiers.contains(KeyModifiers::CONTROL) => self.open_browser(),
            KeyCode::Backspace => {
                self.focused_input().pop();
            }
            KeyCode::Char(c) => self.focused_input().push(c),
            _ => {}
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::SaveDialog;
                self.status_message = "Browse cancelled".to_string();
            }
            KeyCode::Enter => self.pick_browsed_file(),
            KeyCode::Up => {
                self.browse_idx = match self.browse_idx {
                    Some(i) if i > 0 => Some(i - 1),
                    Some(i) => Some(i),
                    None if !self.browse_entries.is_empty() => Some(0),
                    None => None,
                };
            }
            KeyCode::Down => {
                self.browse_idx = match self.browse_idx {
                    Some(i) if i + 1 < self.browse_entries.len() => Some(i + 1),
                    Some(i) => Some(i),
                    None if !self.browse_entries.is_empty() => Some(0),
                    None => None,
                };
            }
            _ => {}
        }
    }

    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            DialogField::Location => &mut self.location_input,
            DialogField::Antidelay => &mut self.antidelay_input,
        }
    }

    fn max_scroll(&self) -> u16 {
        let lines = self.signals_text.lines().count();
        u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX)
    }

    pub fn open_save_dialog(&mut self) {
        self.mode = Mode::SaveDialog;
        self.focus = DialogField::Location;
        self.status_message =
            "Enter: save | Tab: switch field | F2/Ctrl+O: browse | Esc: cancel".to_string();
    }

    pub fn cancel_save_dialog(&mut self) {
        info!("save dialog cancelled");
        self.mode = Mode::Normal;
        self.status_message = "Save cancelled".to_string();
    }

    fn save(&self) -> Result<(PathBuf, usize), SinkError> {
        let antidelay_seconds = parse_antidelay(&self.antidelay_input);
        let timestamps = process_timestamps(&self.signals_text, antidelay_seconds);
        info!(
            "saving {} timestamps to {:?} via {} sink (antidelay {}s)",
            timestamps.len(),
            self.location_input,
            self.sink.name(),
            antidelay_seconds
        );
        let path = self.sink.write(&self.location_input, &timestamps.join("\n"))?;
        Ok((path, timestamps.len()))
    }

    /// Saves with the dialog's values. The dialog only closes on success so
    /// the user can fix the destination and retry.
    pub fn submit_save_dialog(&mut self) -> bool {
        match self.save() {
            Ok((path, count)) => {
                self.mode = Mode::Normal;
                self.status_message = format!("Saved {} timestamps to {}", count, path.display());
                true
            }
            Err(e) => {
                error!("error saving timestamps: {}", e);
                self.status_message = format!("Error: {}", e);
                false
            }
        }
    }

    pub fn quick_save(&mut self) {
        match self.save() {
            Ok((path, count)) => {
                self.status_message = format!("Saved {} timestamps to {}", count, path.display());
            }
            Err(e) => {
                error!("error saving timestamps: {}", e);
                self.status_message = format!("Error: {} (hold '{}' to change destination)", e, SAVE_KEY);
            }
        }
    }

    /// Lists `.txt` files next to the current destination.
    pub fn open_browser(&mut self) {
        let dir = browse_dir(&self.location_input);
        self.browse_entries = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "txt"))
            .map(|e| e.path().to_path_buf())
            .collect();

        if self.browse_entries.is_empty() {
            warn!("no .txt files found in {}", dir.display());
            self.status_message = format!("No .txt files in {}", dir.display());
            return;
        }
        self.browse_idx = Some(0);
        self.mode = Mode::Browse;
        self.status_message = format!(
            "{} files in {} | Enter: pick | Esc: back",
            self.browse_entries.len(),
            dir.display()
        );
    }

    // Only the display name goes into the destination field, the file is not read
    fn pick_browsed_file(&mut self) {
        let picked = self
            .browse_idx
            .and_then(|i| self.browse_entries.get(i))
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned());
        if let Some(name) = picked {
            info!("file selected: {}", name);
            self.location_input = name;
            self.status_message = format!("Destination set to {}", self.location_input);
        }
        self.mode = Mode::SaveDialog;
        self.focus = DialogField::Location;
    }
}

fn browse_dir(location: &str) -> PathBuf {
    let location = location.trim();
    if location.is_empty() {
        return PathBuf::from(".");
    }
    let path = Path::new(location);
    if location.ends_with('/') || path.is_dir() {
        return path.to_path_buf();
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
