// src/workspace.rs

use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};
use std::{
    cell::{Cell, RefCell},
    path::Path,
    rc::Rc,
};
use tracing::{debug, error, info, warn};

use crate::{
    assistant,
    error::{Result, WorkspaceError},
    export::{self, CsvExport},
    history::{HistoryBuffer, HistoryEntry, TrendPoint},
    ingest::{self, RowTable},
    predict::{self, PredictionRecord, PredictionService},
    search::{self, BatchCursor, SearchResults},
    session::{CurrentUser, SessionStore},
    status::StatusReport,
};

/// Why a prediction run did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing uploaded
    Empty,
    /// Another run is still in flight
    Busy,
}

/// Where the installed predictions came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionSource {
    Service,
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Skipped(SkipReason),
    Completed {
        source: PredictionSource,
        count: usize,
    },
    /// A new upload replaced the rows while the run was in flight; its result was dropped.
    Superseded,
}

/// Clears the busy flag however the run ends.
struct BusyGuard<'a>(&'a Cell<bool>);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// In-memory state of one operator session.
///
/// Single-threaded by construction: state sits behind `Cell`/`RefCell`,
/// so a run can be awaited while other calls keep reading the previous
/// snapshot. Rows and predictions are swapped as whole `Rc`s, which
/// makes every install atomic from a reader's point of view.
pub struct Workspace<S> {
    service: S,
    user: CurrentUser,
    rows: RefCell<Rc<RowTable>>,
    predictions: RefCell<Rc<[PredictionRecord]>>,
    history: RefCell<HistoryBuffer>,
    cursor: Cell<BatchCursor>,
    busy: Cell<bool>,
    alert: RefCell<Option<String>>,
    rng: RefCell<StdRng>,
}

impl<S: PredictionService> Workspace<S> {
    pub fn new(service: S, user: CurrentUser) -> Self {
        Self::with_rng(service, user, StdRng::from_entropy())
    }

    /// Workspace whose fallback values come from `rng`.
    pub fn with_rng(service: S, user: CurrentUser, rng: StdRng) -> Self {
        Self {
            service,
            user,
            rows: RefCell::new(Rc::new(RowTable::default())),
            predictions: RefCell::new(Rc::from(Vec::new())),
            history: RefCell::new(HistoryBuffer::new()),
            cursor: Cell::new(BatchCursor::default()),
            busy: Cell::new(false),
            alert: RefCell::new(None),
            rng: RefCell::new(rng),
        }
    }

    /// Open for whoever the session store says is signed in.
    pub fn for_session<T: SessionStore + ?Sized>(service: S, session: &T) -> Result<Self> {
        let user = session.load()?.ok_or(WorkspaceError::NotSignedIn)?;
        info!(email = %user.email, "workspace opened");
        Ok(Self::new(service, user))
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    // ─── ingestion ──────────────────────────────────────────────────

    /// Validate and parse an upload, then replace the current rows.
    /// A rejected upload leaves everything as it was.
    pub fn ingest_text(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        text: &str,
    ) -> Result<usize> {
        ingest::ensure_csv(file_name, content_type)?;
        let table = ingest::parse_csv_text(text);
        Ok(self.install_rows(table))
    }

    pub async fn ingest_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let table = ingest::read_csv_file(path).await?;
        Ok(self.install_rows(table))
    }

    /// Drop the current upload, as if an empty file had been loaded.
    pub fn remove_upload(&self) {
        self.install_rows(RowTable::default());
    }

    fn install_rows(&self, table: RowTable) -> usize {
        let count = table.len();
        *self.rows.borrow_mut() = Rc::new(table);
        *self.predictions.borrow_mut() = Rc::from(Vec::new());
        self.update_cursor(|c, _| c.clear());
        info!(rows = count, "upload installed");
        count
    }

    pub fn rows(&self) -> Rc<RowTable> {
        Rc::clone(&*self.rows.borrow())
    }

    // ─── prediction ─────────────────────────────────────────────────

    /// Send every row to the service and install the answer.
    ///
    /// Any failure is turned into synthetic predictions after recording a
    /// one-time alert, so a completed run always leaves one prediction per
    /// row. A second call while a run is in flight is ignored.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn run_prediction(&self) -> RunOutcome {
        let rows = self.rows();
        if rows.is_empty() {
            debug!("no rows loaded; run skipped");
            return RunOutcome::Skipped(SkipReason::Empty);
        }
        if self.busy.replace(true) {
            debug!("run already in flight; ignored");
            return RunOutcome::Skipped(SkipReason::Busy);
        }
        let _busy = BusyGuard(&self.busy);

        let answer = match self.service.predict(&rows).await {
            Ok(predicted) => predict::map_predictions(predicted, rows.len(), Utc::now()),
            Err(err) => Err(err),
        };

        let mut alert = None;
        let (records, source) = match answer {
            Ok(records) => (records, PredictionSource::Service),
            Err(err) => {
                if err.is_prediction_failure() {
                    warn!(error = %err, "prediction failed; generating fallback values");
                } else {
                    error!(error = %err, "prediction service misbehaved; generating fallback values");
                }
                alert = Some(format!("Prediction failed: {}", err));
                let records = predict::synthesize(
                    rows.rows(),
                    &mut *self.rng.borrow_mut(),
                    Utc::now(),
                );
                (
                    records,
                    PredictionSource::Fallback {
                        reason: err.to_string(),
                    },
                )
            }
        };

        if !Rc::ptr_eq(&rows, &*self.rows.borrow()) {
            warn!("upload replaced during run; discarding predictions");
            return RunOutcome::Superseded;
        }

        if alert.is_some() {
            *self.alert.borrow_mut() = alert;
        }
        let count = records.len();
        self.history.borrow_mut().append(&records);
        *self.predictions.borrow_mut() = Rc::from(records);
        self.update_cursor(|c, len| c.reset(len));
        info!(count, ?source, "predictions installed");

        RunOutcome::Completed { source, count }
    }

    /// Snapshot of the current predictions; never a mix of two runs.
    pub fn predictions(&self) -> Rc<[PredictionRecord]> {
        Rc::clone(&*self.predictions.borrow())
    }

    /// Pending failure message, handed out once.
    pub fn take_alert(&self) -> Option<String> {
        self.alert.borrow_mut().take()
    }

    // ─── cursor & search ────────────────────────────────────────────

    fn update_cursor<R>(&self, f: impl FnOnce(&mut BatchCursor, usize) -> R) -> Option<usize> {
        let len = self.predictions.borrow().len();
        let mut cursor = self.cursor.get();
        f(&mut cursor, len);
        self.cursor.set(cursor);
        cursor.get()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor.get().get()
    }

    pub fn select(&self, index: usize) -> Option<usize> {
        self.update_cursor(|c, len| c.select(index, len))
    }

    pub fn next(&self) -> Option<usize> {
        self.update_cursor(|c, len| c.next(len))
    }

    pub fn previous(&self) -> Option<usize> {
        self.update_cursor(|c, len| c.previous(len))
    }

    /// Prediction under the cursor.
    pub fn current(&self) -> Option<PredictionRecord> {
        let index = self.cursor()?;
        self.predictions.borrow().get(index).cloned()
    }

    pub fn current_status(&self) -> Option<StatusReport> {
        self.current().as_ref().map(StatusReport::from)
    }

    /// Filter the uploaded rows by batch label.
    pub fn search(&self, term: &str) -> SearchResults {
        search::search(self.rows().rows(), term)
    }

    /// Answer from the assistant panel. The question itself is not inspected.
    pub fn ask(&self, question: &str) -> &'static str {
        debug!(chars = question.len(), "assistant asked");
        assistant::reply(&mut *self.rng.borrow_mut())
    }

    // ─── history & export ───────────────────────────────────────────

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.borrow().iter().cloned().collect()
    }

    pub fn trend(&self) -> Vec<TrendPoint> {
        self.history.borrow().trend_points()
    }

    pub fn export_rows(&self) -> Option<CsvExport> {
        export::export_rows(&self.rows(), Utc::now().date_naive())
    }

    pub fn export_history(&self) -> Option<CsvExport> {
        export::export_history(&self.history.borrow(), Utc::now().date_naive())
    }
}
