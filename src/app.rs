//! Line-driven editing front end.
//!
//! Each input line is either a key chord (`Shift+S`, `ArrowRight`, ...) routed
//! through the hotkey table, or a word command (`add`, `drag`, `show`, ...).
//! While a rename prompt is open the next line is taken as the new title.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::catalog::{CatalogError, JsonCatalog};
use crate::core::compress::CompressError;
use crate::core::config::{AppConfig, ConfigError};
use crate::core::library::{Library, LibraryError};
use crate::core::pdf::PdfBackend;
use crate::core::publish::{PublishError, PublishReport, PublishRequest, Publisher};
use crate::core::store::{build_store, StoreError};
use crate::hotkeys::{handle_hotkey, HotkeyContext, HotkeyResult, KeyChord};
use crate::state::{CommandOutcome, EditSession, ResizeEdge};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Compress(#[from] CompressError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn usage(message: impl Into<String>) -> AppError {
    AppError::Usage(message.into())
}

/// What the driver should do after a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Output(String),
    Silent,
    Publish,
    Quit,
}

/// Run a publish request with the configured catalog and store.
pub async fn publish_request<B: PdfBackend + Clone>(
    config: &AppConfig,
    backend: B,
    request: &PublishRequest,
) -> Result<PublishReport, AppError> {
    let catalog = JsonCatalog::open(&config.catalog_path)?;
    let store = build_store(&config.store)?;
    let mut publisher = Publisher::new(backend, catalog, store, &config.output_root)
        .with_upload_delay(Duration::from_millis(config.upload_delay_ms));
    Ok(publisher.publish(request).await?)
}

pub fn describe_report(report: &PublishReport) -> String {
    format!(
        "published {}: {} uploaded, {} unchanged, {} conflicts (manifest {})",
        report.resource_id,
        report.uploaded.len(),
        report.skipped.len(),
        report.conflicts.len(),
        report.manifest_path.display()
    )
}

pub struct App<B> {
    config: AppConfig,
    library: Library,
    backend: B,
    session: EditSession,
    pending_rename: Option<Uuid>,
}

impl<B: PdfBackend + Clone> App<B> {
    pub fn new(config: AppConfig, backend: B, subject: impl Into<String>) -> Self {
        let session = EditSession::new(subject, config.history_limit);
        Self {
            library: Library::from_config(&config),
            config,
            backend,
            session,
            pending_rename: None,
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    fn hotkey_context(&self) -> HotkeyContext {
        HotkeyContext {
            has_active_section: self.session.active_section().is_some(),
            input_focused: self.pending_rename.is_some(),
        }
    }

    pub fn handle_line(&mut self, line: &str) -> Result<Step, AppError> {
        if self.pending_rename.is_some() {
            return Ok(self.finish_rename(line.trim()));
        }

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Step::Silent);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word {
            "quit" | "exit" => Ok(Step::Quit),
            "publish" => Ok(Step::Publish),
            "show" => Ok(Step::Output(self.render_timeline())),
            "preview" => Ok(Step::Output(self.render_preview())),
            "library" => {
                let pdfs = self.library.list_extracted_pdfs(self.session.subject())?;
                Ok(Step::Output(pdfs.join("\n")))
            }
            "add" => self.add(rest),
            "title" => {
                self.session.set_resource_title(rest);
                Ok(Step::Output(format!("resource title: {}", rest)))
            }
            "rename" => {
                if rest.is_empty() {
                    return Err(usage("usage: rename <title>"));
                }
                match self.session.rename_active(rest) {
                    Ok(_) => Ok(Step::Output(self.render_preview())),
                    Err(_) => Ok(Step::Silent),
                }
            }
            "seek" => {
                let page = rest
                    .parse::<u32>()
                    .map_err(|_| usage("usage: seek <page>"))?;
                self.session.seek(page);
                Ok(Step::Output(self.render_preview()))
            }
            "drag" => self.drag(rest),
            "export" => {
                if rest.is_empty() {
                    return Err(usage("usage: export <file>"));
                }
                let path = self.export(Path::new(rest))?;
                Ok(Step::Output(format!("wrote {}", path.display())))
            }
            _ => self.handle_chord(line),
        }
    }

    fn handle_chord(&mut self, text: &str) -> Result<Step, AppError> {
        let chord =
            KeyChord::parse(text).ok_or_else(|| usage(format!("unknown command: {}", text)))?;
        match handle_hotkey(chord, &self.hotkey_context()) {
            HotkeyResult::Action(command) => match self.session.execute(command) {
                CommandOutcome::Applied => Ok(Step::Output(self.render_preview())),
                CommandOutcome::NoOp => Ok(Step::Silent),
                CommandOutcome::PromptRename {
                    section_id,
                    current_title,
                } => {
                    self.pending_rename = Some(section_id);
                    Ok(Step::Output(format!(
                        "new title for \"{}\" (empty line cancels):",
                        current_title
                    )))
                }
            },
            HotkeyResult::NoMatch | HotkeyResult::Suppressed => Ok(Step::Silent),
        }
    }

    fn finish_rename(&mut self, title: &str) -> Step {
        let Some(section_id) = self.pending_rename.take() else {
            return Step::Silent;
        };
        if title.is_empty() {
            return Step::Output("rename cancelled".to_string());
        }
        match self.session.rename_active(title) {
            Ok(renamed) if renamed == section_id => Step::Output(self.render_preview()),
            _ => Step::Silent,
        }
    }

    fn add(&mut self, pdf: &str) -> Result<Step, AppError> {
        if pdf.is_empty() {
            return Err(usage("usage: add <compressed pdf>"));
        }
        let page_count = self
            .library
            .page_count(&self.backend, self.session.subject(), pdf)?;
        let page_count = u32::try_from(page_count).map_err(|_| usage("document too large"))?;
        if page_count == 0 {
            return Err(usage(format!("{} has no pages", pdf)));
        }
        self.session.add_section(pdf, page_count);
        Ok(Step::Output(format!("added {} ({} pages)", pdf, page_count)))
    }

    /// `drag <left|right> <section-index> <px>...`: one full resize gesture.
    fn drag(&mut self, args: &str) -> Result<Step, AppError> {
        const USAGE: &str = "usage: drag <left|right> <section-index> <px>...";
        let mut parts = args.split_whitespace();
        let edge = parts
            .next()
            .and_then(ResizeEdge::parse)
            .ok_or_else(|| usage(USAGE))?;
        let index: usize = parts
            .next()
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| usage(USAGE))?;
        let offsets = parts
            .map(|value| value.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| usage(USAGE))?;

        let section_id = self
            .session
            .timeline()
            .sections()
            .get(index)
            .map(|section| section.id)
            .ok_or_else(|| usage(format!("no section at index {}", index)))?;

        if self.session.begin_resize(section_id, edge).is_err() {
            return Ok(Step::Silent);
        }
        for offset in offsets {
            self.session.resize_pointer_move(offset);
        }
        if self.session.end_resize() {
            Ok(Step::Output(self.render_timeline()))
        } else {
            Ok(Step::Output("resize: no change".to_string()))
        }
    }

    /// Write the session as a publish request file.
    pub fn export(&self, path: &Path) -> Result<PathBuf, AppError> {
        let request = PublishRequest::from_session(&self.session);
        let json = serde_json::to_string_pretty(&request)?;
        std::fs::write(path, json).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(path.to_path_buf())
    }

    pub async fn publish(&mut self) -> Result<PublishReport, AppError> {
        let request = PublishRequest::from_session(&self.session);
        publish_request(&self.config, self.backend.clone(), &request).await
    }

    pub fn render_timeline(&self) -> String {
        let timeline = self.session.timeline();
        let title = match self.session.resource_title() {
            "" => "(untitled resource)",
            title => title,
        };
        let mut lines = vec![format!(
            "{} [{}] sections: {} pages: {} zoom: {}px/page cursor: {} undo: {}",
            title,
            self.session.subject(),
            timeline.len(),
            timeline.total_pages(),
            self.session.zoom(),
            self.session.cursor(),
            self.session.history_len()
        )];
        if timeline.is_empty() {
            lines.push("  (empty, use: add <compressed pdf>)".to_string());
        }
        let active = self.session.active_section().map(|section| section.id);
        for (index, section) in timeline.sections().iter().enumerate() {
            let marker = if Some(section.id) == active { '>' } else { ' ' };
            lines.push(format!(
                "{} {:>2} {:<24} {} p{}-{} @{}+{}",
                marker,
                index,
                section.display_title(),
                section.source_document,
                section.source_start_page,
                section.source_end_page,
                section.timeline_position,
                section.timeline_duration
            ));
        }
        lines.join("\n")
    }

    /// Cursor position, the source page under it and the file to preview.
    pub fn render_preview(&self) -> String {
        let cursor = self.session.cursor();
        match self.session.cursor_info() {
            Some(info) => format!(
                "page {}: \"{}\" source page {} of {} ({})",
                cursor,
                info.section.display_title(),
                info.source_page,
                info.section.source_document,
                self.config
                    .preview_path(self.session.subject(), &info.section.source_document)
                    .display()
            ),
            None => format!("page {}: no section", cursor),
        }
    }

    /// Drive the session from `input` until EOF or `quit`.
    pub async fn run<R: BufRead, W: Write>(
        &mut self,
        input: R,
        mut output: W,
    ) -> Result<(), AppError> {
        let io_err = |source| AppError::Io {
            path: PathBuf::from("<stdout>"),
            source,
        };
        for line in input.lines() {
            let line = line.map_err(|source| AppError::Io {
                path: PathBuf::from("<stdin>"),
                source,
            })?;
            match self.handle_line(&line) {
                Ok(Step::Output(text)) => writeln!(output, "{}", text).map_err(io_err)?,
                Ok(Step::Silent) => {}
                Ok(Step::Quit) => break,
                Ok(Step::Publish) => match self.publish().await {
                    Ok(report) => {
                        info!(resource = %report.resource_id, "session published");
                        writeln!(output, "{}", describe_report(&report)).map_err(io_err)?;
                    }
                    Err(err) => {
                        warn!(%err, "publish failed");
                        writeln!(output, "error: {}", err).map_err(io_err)?;
                    }
                },
                Err(err) => writeln!(output, "error: {}", err).map_err(io_err)?,
            }
        }
        output.flush().map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StoreConfig;
    use crate::core::pdf::{blank_pdf, LopdfBackend};

    fn app(sources: &[(&str, usize)]) -> (tempfile::TempDir, App<LopdfBackend>) {
        let dir = tempfile::tempdir().unwrap();
        let subject_dir = dir.path().join("output/CS101");
        std::fs::create_dir_all(&subject_dir).unwrap();
        for (name, pages) in sources {
            std::fs::write(subject_dir.join(name), blank_pdf(*pages)).unwrap();
        }
        let config = AppConfig {
            input_root: dir.path().join("input"),
            output_root: dir.path().join("output"),
            catalog_path: dir.path().join("catalog.json"),
            upload_delay_ms: 0,
            store: StoreConfig::Directory {
                root: dir.path().join("store"),
                base_url: Some("https://cdn.example".to_string()),
            },
            ..AppConfig::default()
        };
        (dir, App::new(config, LopdfBackend, "CS101"))
    }

    fn feed(app: &mut App<LopdfBackend>, lines: &[&str]) {
        for line in lines {
            app.handle_line(line).unwrap();
        }
    }

    #[test]
    fn test_split_then_delete_from_keyboard() {
        let (_dir, mut app) = app(&[("compressed-book.pdf", 10)]);
        feed(
            &mut app,
            &[
                "add compressed-book.pdf",
                "ArrowRight",
                "ArrowRight",
                "ArrowRight",
                "ArrowRight",
                "Shift+S",
            ],
        );
        let sections = app.session().timeline().sections();
        assert_eq!(sections.len(), 2);
        assert_eq!((sections[1].source_start_page, sections[1].timeline_position), (5, 4));

        feed(&mut app, &["ArrowLeft", "Delete"]);
        let sections = app.session().timeline().sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].timeline_position, 0);
        assert_eq!(sections[0].timeline_duration, 6);

        feed(&mut app, &["Shift+U"]);
        assert_eq!(app.session().timeline().len(), 2);
    }

    #[test]
    fn test_rename_prompt_takes_next_line() {
        let (_dir, mut app) = app(&[("compressed-book.pdf", 3)]);
        feed(&mut app, &["add compressed-book.pdf"]);

        let step = app.handle_line("Shift+R").unwrap();
        assert!(matches!(step, Step::Output(text) if text.contains("Untitled Section")));
        // The chord text is consumed as the title while the prompt is open.
        app.handle_line("Shift+S").unwrap();
        assert_eq!(app.session().timeline().sections()[0].title, "Shift+S");
        assert_eq!(app.session().timeline().len(), 1);

        feed(&mut app, &["Shift+R", ""]);
        assert_eq!(app.session().timeline().sections()[0].title, "Shift+S");
    }

    #[test]
    fn test_drag_right_edge_shrinks_section() {
        let (_dir, mut app) = app(&[("compressed-book.pdf", 10)]);
        feed(&mut app, &["add compressed-book.pdf", "add compressed-book.pdf"]);
        let history = app.session().history_len();

        // 30px per page: the pointer ends at 210px, page 7.
        let step = app.handle_line("drag right 0 270 240 210").unwrap();
        assert!(matches!(step, Step::Output(_)));
        let sections = app.session().timeline().sections();
        assert_eq!(sections[0].source_end_page, 7);
        assert_eq!(sections[1].timeline_position, 7);
        assert_eq!(app.session().history_len(), history + 1);
    }

    #[test]
    fn test_bad_commands_are_usage_errors() {
        let (_dir, mut app) = app(&[]);
        assert!(matches!(app.handle_line("drag up 0 10"), Err(AppError::Usage(_))));
        assert!(matches!(app.handle_line("frobnicate"), Err(AppError::Usage(_))));
        assert!(matches!(app.handle_line("add missing.pdf"), Err(AppError::Library(_))));
        assert_eq!(app.handle_line("Delete").unwrap(), Step::Silent);
        assert_eq!(app.handle_line("quit").unwrap(), Step::Quit);
    }

    #[test]
    fn test_show_lists_sections_and_undo_depth() {
        let (_dir, mut app) = app(&[("compressed-book.pdf", 4)]);
        let empty = app.render_timeline();
        assert!(empty.starts_with("(untitled resource) [CS101] sections: 0 pages: 0"));
        assert!(empty.contains("(empty, use: add <compressed pdf>)"));

        feed(&mut app, &["add compressed-book.pdf"]);
        let shown = app.render_timeline();
        assert!(shown.contains("undo: 1"));
        assert!(!shown.contains("(empty"));
        assert!(shown.lines().nth(1).unwrap().starts_with(">  0 Untitled Section"));
    }

    #[test]
    fn test_export_writes_request() {
        let (dir, mut app) = app(&[("compressed-book.pdf", 4)]);
        feed(&mut app, &["title Intro to Graphics", "add compressed-book.pdf"]);
        let path = dir.path().join("request.json");
        app.export(&path).unwrap();

        let request: PublishRequest =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(request.resource_title, "Intro to Graphics");
        assert_eq!(request.sections[0].end_page, 4);
    }

    #[test]
    fn test_preview_names_source_page() {
        let (_dir, mut app) = app(&[("compressed-book.pdf", 4)]);
        feed(&mut app, &["add compressed-book.pdf", "seek 2"]);
        let preview = app.render_preview();
        assert!(preview.starts_with("page 2: \"Untitled Section\" source page 3"));
        assert!(preview.ends_with("compressed-book.pdf)"));
    }

    #[tokio::test]
    async fn test_script_run_publishes() {
        let (dir, mut app) = app(&[("compressed-book.pdf", 6)]);
        let script = "title Notes\nadd compressed-book.pdf\nseek 3\nShift+S\npublish\nquit\nshow\n";
        let mut output = Vec::new();
        app.run(script.as_bytes(), &mut output).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("published notes: 2 uploaded"));
        assert!(!output.contains("sections: 2 pages"));
        assert!(dir
            .path()
            .join("store/resources/CS101/notes/sections")
            .is_dir());
    }
}
