//! CV Processor — the polling orchestrator.
//!
//! Flow per cycle: list watch-folder PDFs → drop names already in the archive →
//! for each new file: extract text → extract 12 fields → append row → move to archive.
//!
//! A document is only "done" once both the append and the move succeed. If the
//! move fails after the append, the row stays and the file is picked up again
//! next cycle under a new serial number. Nothing compensates for that.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, error, info};

use crate::errors::AppError;
use crate::extraction::FieldExtractor;
use crate::pdf_text::DocumentReader;
use crate::spreadsheet::SpreadsheetStore;

/// Filesystem layout and polling cadence.
#[derive(Debug, Clone)]
pub struct ProcessorPaths {
    pub cv_folder: PathBuf,
    pub archive_folder: PathBuf,
    pub interval: Duration,
}

/// What one polling cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    NoFiles,
    NothingNew,
    Processed(Vec<ProcessedCv>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedCv {
    pub file_name: String,
    pub serial_no: u64,
}

pub struct CvProcessor {
    paths: ProcessorPaths,
    store: SpreadsheetStore,
    reader: Arc<dyn DocumentReader>,
    extractor: FieldExtractor,
    /// Fixed for the life of the process; handed to every extraction.
    today: NaiveDate,
}

impl CvProcessor {
    pub fn new(
        paths: ProcessorPaths,
        store: SpreadsheetStore,
        reader: Arc<dyn DocumentReader>,
        extractor: FieldExtractor,
        today: NaiveDate,
    ) -> Self {
        Self {
            paths,
            store,
            reader,
            extractor,
            today,
        }
    }

    /// Creates missing directories and the output table. Safe to repeat.
    pub async fn initialize(&self) -> Result<(), AppError> {
        for dir in [&self.paths.cv_folder, &self.paths.archive_folder] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| AppError::io(dir, e))?;
        }
        if let Some(parent) = self.store.path().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::io(parent, e))?;
            }
        }
        self.store.initialize()?;
        Ok(())
    }

    /// Polls until `shutdown` resolves or a cycle fails.
    ///
    /// `shutdown` is only observed between cycles, while sleeping; a batch
    /// that has started always runs to completion or to its first error.
    pub async fn run<F>(&self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()>,
    {
        info!("CV Processor is now running");
        tokio::pin!(shutdown);

        loop {
            if let CycleOutcome::Processed(done) = self.process_new_cvs().await? {
                for cv in &done {
                    debug!("Recorded {} as Sr No {}", cv.file_name, cv.serial_no);
                }
                info!("Batch complete: {} CV(s) recorded", done.len());
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping CV Processor");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.paths.interval) => {}
            }
        }
    }

    /// Runs one polling cycle.
    pub async fn process_new_cvs(&self) -> Result<CycleOutcome, AppError> {
        let files = list_pdfs(&self.paths.cv_folder).await?;
        if files.is_empty() {
            info!("No CV files found");
            return Ok(CycleOutcome::NoFiles);
        }

        let archived = list_names(&self.paths.archive_folder).await?;
        let new_files = select_new(files, &archived);
        if new_files.is_empty() {
            info!("No new CVs found");
            return Ok(CycleOutcome::NothingNew);
        }

        let first_serial = self.store.next_serial()?;
        let mut processed = Vec::with_capacity(new_files.len());

        for (serial_no, file_name) in (first_serial..).zip(new_files) {
            self.process_one(&file_name, serial_no).await?;
            processed.push(ProcessedCv {
                file_name,
                serial_no,
            });
        }

        Ok(CycleOutcome::Processed(processed))
    }

    async fn process_one(&self, file_name: &str, serial_no: u64) -> Result<(), AppError> {
        let source = self.paths.cv_folder.join(file_name);
        info!("Processing: {}", file_name);

        let reader = Arc::clone(&self.reader);
        let path = source.clone();
        let text = tokio::task::spawn_blocking(move || reader.extract_text(&path)).await??;

        let record = self.extractor.extract_record(&text, self.today).await?;
        self.store.append(&record, serial_no)?;

        let target = self.paths.archive_folder.join(file_name);
        if let Err(e) = move_file(&source, &target).await {
            error!(
                "Row {} was appended but {} could not be archived; it will be processed again",
                serial_no, file_name
            );
            return Err(e);
        }
        info!("Archived: {}", file_name);
        Ok(())
    }
}

/// Names in `files` that are absent from `archived`, order preserved.
pub fn select_new(files: Vec<String>, archived: &HashSet<String>) -> Vec<String> {
    files
        .into_iter()
        .filter(|name| !archived.contains(name))
        .collect()
}

/// Regular files ending in `.pdf` (any case), sorted by name.
async fn list_pdfs(dir: &Path) -> Result<Vec<String>, AppError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AppError::io(dir, e))?;
    let mut names = Vec::new();

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::io(dir, e))?
    {
        let file_type = entry.file_type().await.map_err(|e| AppError::io(dir, e))?;
        if !file_type.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name.to_lowercase().ends_with(".pdf") {
                names.push(name.to_string());
            }
        }
    }

    names.sort();
    Ok(names)
}

/// Every entry name in `dir`.
async fn list_names(dir: &Path) -> Result<HashSet<String>, AppError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AppError::io(dir, e))?;
    let mut names = HashSet::new();

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::io(dir, e))?
    {
        names.insert(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Rename, falling back to copy + remove when the rename fails (e.g. across devices).
async fn move_file(source: &Path, target: &Path) -> Result<(), AppError> {
    if tokio::fs::rename(source, target).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(source, target)
        .await
        .map_err(|e| AppError::io(target, e))?;
    tokio::fs::remove_file(source)
        .await
        .map_err(|e| AppError::io(source, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::fields::Field;
    use crate::extraction::PromptStyle;
    use crate::llm_client::{LanguageModel, LlmError, Prompt};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Reads files as UTF-8 instead of parsing PDF.
    struct PlainTextReader;

    impl DocumentReader for PlainTextReader {
        fn extract_text(&self, path: &Path) -> Result<String, AppError> {
            std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))
        }
    }

    /// Swaps the archive directory for a plain file once the cycle has listed it,
    /// so the move into it cannot succeed.
    struct ArchiveBreakingReader {
        archive: PathBuf,
    }

    impl DocumentReader for ArchiveBreakingReader {
        fn extract_text(&self, path: &Path) -> Result<String, AppError> {
            std::fs::remove_dir_all(&self.archive).unwrap();
            std::fs::write(&self.archive, "not a directory").unwrap();
            PlainTextReader.extract_text(path)
        }
    }

    /// Echoes the resume body back for the name field, "n/a" for the rest.
    #[derive(Default)]
    struct EchoModel {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl LanguageModel for EchoModel {
        async fn infer(&self, prompt: &Prompt) -> Result<String, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LlmError::Api {
                    status: 500,
                    message: "model crashed".to_string(),
                });
            }
            let Prompt::Chat { user, .. } = prompt else {
                return Ok("n/a".to_string());
            };
            if n % 12 == 0 {
                let body = user
                    .trim_start_matches("Resume For the Candidate Name : ")
                    .split("\n\n")
                    .next()
                    .unwrap_or_default();
                return Ok(body.to_string());
            }
            Ok("n/a".to_string())
        }
    }

    struct Fixture {
        _dir: TempDir,
        cvs: PathBuf,
        archive: PathBuf,
        output: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        Fixture {
            cvs: root.join("cvs"),
            archive: root.join("archive"),
            output: root.join("out").join("output.csv"),
            _dir: dir,
        }
    }

    fn processor(fx: &Fixture, model: Arc<dyn LanguageModel>) -> CvProcessor {
        CvProcessor::new(
            ProcessorPaths {
                cv_folder: fx.cvs.clone(),
                archive_folder: fx.archive.clone(),
                interval: Duration::from_secs(30),
            },
            SpreadsheetStore::new(&fx.output),
            Arc::new(PlainTextReader),
            FieldExtractor::new(model, PromptStyle::Chat, 19_600),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
    }

    #[test]
    fn test_select_new_excludes_archived_names() {
        let archived: HashSet<String> = ["a.pdf".to_string(), "c.pdf".to_string()].into();
        let files = vec!["a.pdf".into(), "b.pdf".into(), "c.pdf".into(), "d.pdf".into()];

        assert_eq!(select_new(files, &archived), vec!["b.pdf", "d.pdf"]);
    }

    #[tokio::test]
    async fn test_initialize_creates_layout_and_is_idempotent() {
        let fx = fixture();
        let p = processor(&fx, Arc::new(EchoModel::default()));

        p.initialize().await.unwrap();
        p.store.append(&Default::default(), 1).unwrap();
        p.initialize().await.unwrap();

        assert!(fx.cvs.is_dir());
        assert!(fx.archive.is_dir());
        assert_eq!(p.store.load().unwrap().rows.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_watch_folder_is_a_noop() {
        let fx = fixture();
        let p = processor(&fx, Arc::new(EchoModel::default()));
        p.initialize().await.unwrap();

        assert_eq!(p.process_new_cvs().await.unwrap(), CycleOutcome::NoFiles);
    }

    #[tokio::test]
    async fn test_only_unarchived_file_is_processed() {
        let fx = fixture();
        let model = Arc::new(EchoModel::default());
        let p = processor(&fx, model.clone());
        p.initialize().await.unwrap();

        let mut existing = crate::extraction::ExtractionRecord::default();
        existing.insert(Field::NameAndCnic, "Earlier Candidate".to_string());
        p.store.append(&existing, 1).unwrap();

        std::fs::write(fx.cvs.join("a.pdf"), "Amina").unwrap();
        std::fs::write(fx.cvs.join("b.pdf"), "Bilal").unwrap();
        std::fs::write(fx.archive.join("a.pdf"), "archived copy").unwrap();

        let outcome = p.process_new_cvs().await.unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Processed(vec![ProcessedCv {
                file_name: "b.pdf".to_string(),
                serial_no: 2,
            }])
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 12);

        let table = p.store.load().unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][0], "2");
        assert_eq!(table.rows[1][1], "Bilal");

        assert!(!fx.cvs.join("b.pdf").exists());
        assert!(fx.archive.join("b.pdf").exists());
        assert_eq!(
            std::fs::read_to_string(fx.archive.join("a.pdf")).unwrap(),
            "archived copy"
        );
        assert!(fx.cvs.join("a.pdf").exists());
    }

    #[tokio::test]
    async fn test_serials_increase_by_one_within_a_batch() {
        let fx = fixture();
        let p = processor(&fx, Arc::new(EchoModel::default()));
        p.initialize().await.unwrap();
        for name in ["c.pdf", "a.pdf", "b.PDF", "notes.txt"] {
            std::fs::write(fx.cvs.join(name), name).unwrap();
        }

        let CycleOutcome::Processed(done) = p.process_new_cvs().await.unwrap() else {
            panic!("expected files to be processed");
        };

        let serials: Vec<u64> = done.iter().map(|d| d.serial_no).collect();
        let names: Vec<&str> = done.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(serials, vec![1, 2, 3]);
        assert_eq!(names, vec!["a.pdf", "b.PDF", "c.pdf"]);
        assert!(fx.cvs.join("notes.txt").exists());

        assert_eq!(p.process_new_cvs().await.unwrap(), CycleOutcome::NoFiles);
    }

    #[tokio::test]
    async fn test_archived_duplicate_in_watch_folder_is_skipped() {
        let fx = fixture();
        let p = processor(&fx, Arc::new(EchoModel::default()));
        p.initialize().await.unwrap();
        std::fs::write(fx.cvs.join("a.pdf"), "Amina").unwrap();
        std::fs::write(fx.archive.join("a.pdf"), "Amina").unwrap();

        assert_eq!(p.process_new_cvs().await.unwrap(), CycleOutcome::NothingNew);
        assert!(p.store.load().unwrap().rows.is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_stops_before_append_and_move() {
        let fx = fixture();
        let model = Arc::new(EchoModel {
            fail: true,
            ..Default::default()
        });
        let p = processor(&fx, model);
        p.initialize().await.unwrap();
        std::fs::write(fx.cvs.join("a.pdf"), "Amina").unwrap();

        let err = p.process_new_cvs().await.unwrap_err();

        assert!(matches!(err, AppError::Llm(LlmError::Api { status: 500, .. })));
        assert!(p.store.load().unwrap().rows.is_empty());
        assert!(fx.cvs.join("a.pdf").exists());
    }

    #[tokio::test]
    async fn test_move_failure_leaves_row_appended() {
        let fx = fixture();
        let mut p = processor(&fx, Arc::new(EchoModel::default()));
        p.reader = Arc::new(ArchiveBreakingReader {
            archive: fx.archive.clone(),
        });
        p.initialize().await.unwrap();
        std::fs::write(fx.cvs.join("a.pdf"), "Amina").unwrap();

        assert!(p.process_new_cvs().await.is_err());
        assert_eq!(p.store.load().unwrap().rows.len(), 1);
        assert!(fx.cvs.join("a.pdf").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_each_interval_until_shutdown() {
        let fx = fixture();
        let model = Arc::new(EchoModel::default());
        let p = processor(&fx, model.clone());
        p.initialize().await.unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let cvs = fx.cvs.clone();
        let feeder = async move {
            tokio::time::sleep(Duration::from_secs(45)).await;
            std::fs::write(cvs.join("late.pdf"), "Late Arrival").unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            tx.send(()).unwrap();
        };

        let (result, ()) = tokio::join!(
            p.run(async {
                rx.await.ok();
            }),
            feeder
        );

        result.unwrap();
        assert!(fx.archive.join("late.pdf").exists());
        assert_eq!(model.calls.load(Ordering::SeqCst), 12);
        let table = p.store.load().unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][1], "Late Arrival");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_first_cycle_error() {
        let fx = fixture();
        let p = processor(
            &fx,
            Arc::new(EchoModel {
                fail: true,
                ..Default::default()
            }),
        );
        p.initialize().await.unwrap();
        std::fs::write(fx.cvs.join("a.pdf"), "Amina").unwrap();

        let result = p.run(std::future::pending()).await;

        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
