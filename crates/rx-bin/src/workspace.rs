//! An opened document bound to a live matcher session.

use anyhow::{Context, Result};
use core_history::TextState;
use core_matcher::{MatcherSession, MatcherSnapshot, SessionOptions};
use core_model::{DocumentId, PatternDocument, PatternRepository};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::commands::{Command, HELP};
use crate::report;

/// What the caller should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue(String),
    Quit,
}

pub struct Workspace {
    session: MatcherSession,
    repository: Arc<dyn PatternRepository>,
    document: DocumentId,
    path: Option<PathBuf>,
}

impl Workspace {
    /// Store `doc` in `repository` and load it into a fresh session.
    /// Must be called from within a Tokio runtime.
    pub fn open(
        doc: PatternDocument,
        path: Option<PathBuf>,
        options: SessionOptions,
        repository: Arc<dyn PatternRepository>,
    ) -> Self {
        let stored = repository.save(doc);
        let document = stored.id.unwrap_or(DocumentId(0));
        let mut session = MatcherSession::new(options);
        session.load(&stored.pattern, stored.test_cases);
        info!(target: "runtime", %document, title = stored.title.as_str(), "document_opened");
        Self {
            session,
            repository,
            document,
            path,
        }
    }

    pub fn session(&self) -> &MatcherSession {
        &self.session
    }

    pub fn document_id(&self) -> DocumentId {
        self.document
    }

    /// Wait for every outstanding verdict.
    pub async fn settled(&self) -> MatcherSnapshot {
        self.session.settled().await
    }

    /// Push the live pattern and cases into the repository; returns the stored copy.
    pub fn sync(&self) -> Result<PatternDocument> {
        let pattern = self.session.pattern_text();
        let cases = self.session.test_cases();
        let stored = self.repository.update(self.document, &mut |doc: &mut PatternDocument| {
            doc.pattern = pattern.clone();
            doc.test_cases = cases.clone();
        })?;
        Ok(stored)
    }

    pub fn save(&mut self, path: Option<PathBuf>) -> Result<PathBuf> {
        let target = path
            .or_else(|| self.path.clone())
            .context("no file to save to; pass a path")?;
        let mut doc = self.sync()?;
        // The repository key is session-local; files never carry it.
        doc.id = None;
        doc.write_to(&target)
            .with_context(|| format!("saving {}", target.display()))?;
        info!(target: "runtime", file = %target.display(), "document_saved");
        self.path = Some(target.clone());
        Ok(target)
    }

    fn case_at(&self, index: usize) -> Option<Uuid> {
        let cases = self.session.test_cases();
        cases.get(index.checked_sub(1)?).map(|case| case.uuid)
    }

    /// Apply one command; mutations wait for their verdicts before reporting.
    pub async fn execute(&mut self, command: Command) -> Result<Step> {
        debug!(target: "runtime", command = command.name(), "command");
        let note = match command {
            Command::Quit => return Ok(Step::Quit),
            Command::Help => return Ok(Step::Continue(HELP.to_string())),
            Command::List => None,
            Command::Save(path) => {
                let saved = self.save(path)?;
                return Ok(Step::Continue(format!("saved {}", saved.display())));
            }
            Command::Pattern(text) => {
                self.session.set_pattern(TextState::with_caret_at_end(text));
                None
            }
            Command::Undo => match self.session.undo() {
                Some(_) => None,
                None => Some("nothing to undo".to_string()),
            },
            Command::Redo => match self.session.redo() {
                Some(_) => None,
                None => Some("nothing to redo".to_string()),
            },
            Command::Add { mode, text } => {
                self.session.add_test_case("", text, mode);
                None
            }
            Command::Text { index, text } => match self.case_at(index) {
                Some(uuid) => {
                    self.session.set_test_case_text(uuid, text);
                    None
                }
                None => Some(no_such_case(index)),
            },
            Command::Mode { index, mode } => match self.case_at(index) {
                Some(uuid) => {
                    self.session.set_test_case_mode(uuid, mode);
                    None
                }
                None => Some(no_such_case(index)),
            },
            Command::Title { index, title } => match self.case_at(index) {
                Some(uuid) => {
                    self.session.set_test_case_title(uuid, title);
                    None
                }
                None => Some(no_such_case(index)),
            },
            Command::Dup(index) => match self.case_at(index) {
                Some(uuid) => {
                    self.session.duplicate_test_case(uuid);
                    None
                }
                None => Some(no_such_case(index)),
            },
            Command::Rm(index) => match self.case_at(index) {
                Some(uuid) => {
                    self.session.remove_test_case(uuid);
                    None
                }
                None => Some(no_such_case(index)),
            },
        };
        if let Some(note) = note {
            return Ok(Step::Continue(note));
        }
        let snapshot = self.settled().await;
        Ok(Step::Continue(report::render(&snapshot).trim_end().to_string()))
    }

    pub async fn shutdown(self) {
        self.session.shutdown().await;
    }
}

fn no_such_case(index: usize) -> String {
    format!("no test case {index}")
}
