//! Integration tests for restruct
//!
//! These tests drive whole sessions through the public service API and the
//! command line, against real temporary directories.
//!
//! Test categories:
//! 1. Scanning and analysis
//! 2. Planning
//! 3. Preview
//! 4. Apply, dry run and cleanup
//! 5. Session lifecycle and persistence
//! 6. Configuration and the command line

use clap::Parser;
use restruct::cli::{Cli, run_cli};
use restruct::{
    Action, AppConfig, Error, InstructionStatus, SessionService, SessionStatus, SessionStore,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary directory to reorganize plus a service operating on it.
struct TestFixture {
    temp_dir: TempDir,
    service: SessionService,
}

impl TestFixture {
    fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    fn with_config(config: AppConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let service = SessionService::new(config, SessionStore::in_memory())
            .expect("Failed to build service");
        TestFixture { temp_dir, service }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file, and any missing parent directories.
    fn create_file(&self, name: &str, content: &[u8]) {
        let file_path = self.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    fn create_files(&self, names: &[&str]) {
        for name in names {
            self.create_file(name, name.as_bytes());
        }
    }

    fn session(&mut self, recursive: bool) -> Uuid {
        let path = self.path().to_path_buf();
        self.service
            .create_session(&path, Some(recursive))
            .expect("Failed to create session")
            .id
    }

    fn planned_session(&mut self, recursive: bool) -> Uuid {
        let id = self.session(recursive);
        self.service
            .process(id, Some("META"), Some("BY_TYPE"))
            .expect("Failed to plan session");
        id
    }

    fn status(&self, id: Uuid) -> SessionStatus {
        self.service.get_session(id).unwrap().session.status
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_dir(),
            "Directory should exist: {}",
            path.display()
        );
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    /// Every file and directory under the fixture, relative and sorted.
    fn snapshot(&self) -> Vec<PathBuf> {
        let mut entries = Vec::new();
        Self::walk_dir(self.path(), self.path(), &mut entries);
        entries.sort();
        entries
    }

    fn walk_dir(root: &Path, dir: &Path, entries: &mut Vec<PathBuf>) {
        if let Ok(read) = fs::read_dir(dir) {
            for entry in read.flatten() {
                let path = entry.path();
                entries.push(path.strip_prefix(root).unwrap().to_path_buf());
                if path.is_dir() {
                    Self::walk_dir(root, &path, entries);
                }
            }
        }
    }
}

const PNG_HEADER: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
];

// ============================================================================
// Test Suite 1: Scanning and Analysis
// ============================================================================

#[test]
fn test_non_recursive_analysis_sees_immediate_files_only() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt", "sub/c.pdf", "sub/deeper/d.mp3"]);
    let id = fixture.session(false);

    let summary = fixture.service.analyze(id, Some("META")).unwrap();
    assert_eq!(summary.files_analyzed, 2);

    let record = fixture.service.get_session(id).unwrap();
    let names: Vec<_> = record.descriptors.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "b.txt"]);
    assert_eq!(record.session.status, SessionStatus::Analyzed);
}

#[test]
fn test_recursive_analysis_sees_whole_subtree() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "sub/c.pdf", "sub/deeper/d.mp3"]);
    let id = fixture.session(true);

    let summary = fixture.service.analyze(id, Some("STRUCT")).unwrap();
    assert_eq!(summary.files_analyzed, 3);
    assert_eq!(summary.description_examples.len(), 3);
    assert!(
        summary
            .description_examples
            .iter()
            .any(|e| e.starts_with("d.mp3 structure: extension=mp3"))
    );
}

#[test]
fn test_duplicates_share_hash_but_stay_distinct() {
    let mut fixture = TestFixture::new();
    fixture.create_file("one.txt", b"same bytes");
    fixture.create_file("two.txt", b"same bytes");
    let id = fixture.session(false);
    fixture.service.analyze(id, None).unwrap();

    let record = fixture.service.get_session(id).unwrap();
    assert_eq!(record.descriptors.len(), 2);
    assert_eq!(record.descriptors[0].file_hash, record.descriptors[1].file_hash);
    assert!(record.descriptors[0].file_hash.is_some());
}

#[test]
fn test_extensionless_file_is_sniffed() {
    let mut fixture = TestFixture::new();
    fixture.create_file("picture", PNG_HEADER);
    fixture.create_file("notes", b"just words");
    let id = fixture.planned_session(false);

    let record = fixture.service.get_session(id).unwrap();
    let types: Vec<_> = record
        .descriptors
        .iter()
        .map(|d| (d.filename.as_str(), d.file_type.as_str()))
        .collect();
    assert!(types.contains(&("picture", "png")));
    assert!(types.contains(&("notes", "unknown")));

    fixture.service.apply(id, false, None).unwrap();
    fixture.assert_file_exists("Images/picture");
    fixture.assert_file_exists("Other/notes");
}

#[test]
fn test_disabled_and_unknown_methods_fail_the_whole_operation() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    let id = fixture.session(false);

    assert!(matches!(
        fixture.service.analyze(id, Some("SEMANTIC")),
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        fixture.service.analyze(id, Some("MAGIC")),
        Err(Error::Configuration(_))
    ));
    assert_eq!(fixture.status(id), SessionStatus::New);
}

#[test]
fn test_missing_directory_is_fatal() {
    let mut fixture = TestFixture::new();
    let missing = fixture.path().join("nope");
    assert!(matches!(
        fixture.service.create_session(&missing, None),
        Err(Error::InvalidDirectory { .. })
    ));
}

// ============================================================================
// Test Suite 2: Planning
// ============================================================================

#[test]
fn test_by_type_scenario_plan() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt", "c.unknownext"]);
    let id = fixture.planned_session(false);

    let record = fixture.service.get_session(id).unwrap();
    let base = fixture.path();
    let actions: Vec<_> = record.instructions.iter().map(|i| i.action.clone()).collect();
    assert_eq!(
        actions,
        vec![
            Action::CreateDir {
                path: PathBuf::from("Images")
            },
            Action::CreateDir {
                path: PathBuf::from("Documents/Text")
            },
            Action::CreateDir {
                path: PathBuf::from("Other")
            },
            Action::MoveFile {
                src: base.join("a.jpg"),
                dst: PathBuf::from("Images")
            },
            Action::MoveFile {
                src: base.join("b.txt"),
                dst: PathBuf::from("Documents/Text")
            },
            Action::MoveFile {
                src: base.join("c.unknownext"),
                dst: PathBuf::from("Other")
            },
        ]
    );
    assert!(
        record
            .instructions
            .iter()
            .all(|i| i.status == InstructionStatus::Pending)
    );
    assert_eq!(record.session.actions_total, 6);
    assert_eq!(record.session.files_total, 3);
}

#[test]
fn test_plan_is_deterministic_across_sessions() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["z.png", "m.doc", "a.jpg", "q.docx", "x.mp3"]);
    let first = fixture.planned_session(false);
    let second = fixture.planned_session(false);

    let actions = |id| -> Vec<Action> {
        fixture
            .service
            .get_session(id)
            .unwrap()
            .instructions
            .iter()
            .map(|i| i.action.clone())
            .collect()
    };
    assert_eq!(actions(first), actions(second));
}

#[test]
fn test_replanning_does_not_duplicate_instructions() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt"]);
    let id = fixture.planned_session(false);

    let again = fixture.service.plan(id, Some("CRITERIA")).unwrap();
    assert!(again.already_planned);
    assert_eq!(again.actions_created, 4);
    assert_eq!(fixture.service.get_session(id).unwrap().instructions.len(), 4);
    assert_eq!(
        fixture
            .service
            .get_session(id)
            .unwrap()
            .session
            .struct_algorithm
            .as_deref(),
        Some("BY_TYPE")
    );
}

#[test]
fn test_reprocessing_a_planned_session_is_acknowledged() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt"]);
    let id = fixture.planned_session(false);
    fixture.create_files(&["c.pdf"]);

    let again = fixture.service.process(id, None, None).unwrap();
    assert!(again.already_planned);
    assert_eq!(again.files_analyzed, 2);
    assert_eq!(again.actions_created, 4);
    assert_eq!(fixture.status(id), SessionStatus::Planned);
    assert_eq!(fixture.service.get_session(id).unwrap().instructions.len(), 4);
}

#[test]
fn test_plan_without_analysis_is_rejected() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    let id = fixture.session(false);
    assert!(matches!(
        fixture.service.plan(id, None),
        Err(Error::InvalidTransition { .. })
    ));
}

#[test]
fn test_cluster_is_not_implemented_and_commits_nothing() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    let id = fixture.session(false);

    assert!(matches!(
        fixture.service.process(id, Some("META"), Some("CLUSTER")),
        Err(Error::NotImplemented(_))
    ));
    let record = fixture.service.get_session(id).unwrap();
    assert_eq!(record.session.status, SessionStatus::New);
    assert!(record.descriptors.is_empty());
    assert!(record.instructions.is_empty());
}

#[test]
fn test_criteria_groups_by_mime_type() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.png", "c.txt"]);
    let id = fixture.session(false);
    fixture
        .service
        .process(id, Some("TYPE"), Some("CRITERIA"))
        .unwrap();
    fixture.service.apply(id, false, None).unwrap();

    fixture.assert_file_exists("image/jpeg/a.jpg");
    fixture.assert_file_exists("image/png/b.png");
    fixture.assert_file_exists("text/plain/c.txt");
}

// ============================================================================
// Test Suite 3: Preview
// ============================================================================

#[test]
fn test_preview_is_idempotent_and_side_effect_free() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt"]);
    let id = fixture.planned_session(false);
    let before = fixture.snapshot();

    let first = fixture.service.preview(id).unwrap();
    let second = fixture.service.preview(id).unwrap();
    assert_eq!(first, second);
    assert_eq!(fixture.snapshot(), before);
    assert_eq!(fixture.status(id), SessionStatus::Planned);

    let json = serde_json::to_value(&first).unwrap();
    let expected = format!("move from {}", fixture.path().join("a.jpg").display());
    assert_eq!(json["Images"]["a.jpg"], serde_json::Value::String(expected));
    assert!(json["Documents"]["Text"]["b.txt"].is_string());
}

// ============================================================================
// Test Suite 4: Apply, Dry Run and Cleanup
// ============================================================================

#[test]
fn test_apply_scenario_reports_six_applied() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt", "c.unknownext"]);
    let id = fixture.planned_session(false);

    let summary = fixture.service.apply(id, false, None).unwrap();
    assert_eq!(summary.applied, 6);
    assert_eq!(summary.failed, 0);
    assert_eq!(fixture.status(id), SessionStatus::Done);

    for (from, to) in [
        ("a.jpg", "Images/a.jpg"),
        ("b.txt", "Documents/Text/b.txt"),
        ("c.unknownext", "Other/c.unknownext"),
    ] {
        fixture.assert_file_exists(to);
        fixture.assert_not_exists(from);
    }
    assert_eq!(fixture.service.progress(id).unwrap().percent, 100);
}

#[test]
fn test_apply_preserves_content() {
    let mut fixture = TestFixture::new();
    fixture.create_file("report.pdf", b"%PDF-1.4 body");
    let id = fixture.planned_session(false);
    fixture.service.apply(id, false, None).unwrap();

    let content = fs::read(fixture.path().join("Documents/PDF/report.pdf")).unwrap();
    assert_eq!(content, b"%PDF-1.4 body");
}

#[test]
fn test_source_deleted_before_apply() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt", "c.unknownext"]);
    let id = fixture.planned_session(false);
    fs::remove_file(fixture.path().join("b.txt")).unwrap();

    let summary = fixture.service.apply(id, false, None).unwrap();
    assert_eq!(summary.applied, 5);
    assert_eq!(summary.failed, 1);
    assert_eq!(fixture.status(id), SessionStatus::Failed);

    let record = fixture.service.get_session(id).unwrap();
    for instruction in &record.instructions {
        let is_b = matches!(&instruction.action, Action::MoveFile { src, .. } if src.ends_with("b.txt"));
        if is_b {
            assert_eq!(instruction.status, InstructionStatus::Failed);
            assert!(
                instruction
                    .error
                    .as_deref()
                    .unwrap()
                    .contains("source does not exist")
            );
        } else {
            assert_eq!(instruction.status, InstructionStatus::Applied);
        }
        assert!(instruction.applied_at.is_some());
    }
    fixture.assert_file_exists("Images/a.jpg");
    fixture.assert_file_exists("Other/c.unknownext");

    // Failed instructions count as resolved.
    assert_eq!(fixture.service.progress(id).unwrap().percent, 100);
}

#[test]
fn test_dry_run_changes_nothing() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt", "c.unknownext"]);
    let id = fixture.planned_session(false);
    let before = fixture.snapshot();

    let summary = fixture.service.apply(id, true, None).unwrap();
    assert!(summary.dry_run);
    assert_eq!(summary.applied, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped, 6);

    assert_eq!(fixture.snapshot(), before);
    assert_eq!(fixture.status(id), SessionStatus::Planned);
    assert!(
        fixture
            .service
            .get_session(id)
            .unwrap()
            .instructions
            .iter()
            .all(|i| i.status == InstructionStatus::Pending)
    );

    // The real apply still works afterwards.
    let summary = fixture.service.apply(id, false, None).unwrap();
    assert_eq!(summary.applied, 6);
}

#[test]
fn test_existing_destination_is_never_overwritten() {
    let mut fixture = TestFixture::new();
    fixture.create_file("a.jpg", b"incoming");
    let id = fixture.planned_session(false);
    fixture.create_file("Images/a.jpg", b"already here");

    let summary = fixture.service.apply(id, false, None).unwrap();
    assert_eq!(summary.failed, 1);
    assert!(summary.errors[0].error.contains("destination already exists"));
    assert_eq!(
        fs::read(fixture.path().join("Images/a.jpg")).unwrap(),
        b"already here"
    );
    fixture.assert_file_exists("a.jpg");
}

#[test]
fn test_cleanup_removes_emptied_dirs_but_never_the_base() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&[
        "photos/2023/summer/beach.jpg",
        "photos/2023/winter.png",
        "docs/letter.docx",
        "docs/keep/readme.md",
    ]);
    let id = fixture.planned_session(true);
    // Not part of the plan, so "mixed" must survive.
    fixture.create_file("mixed/late.jpg", b"late");
    fs::create_dir_all(fixture.path().join("untouched/empty")).unwrap();

    let summary = fixture.service.apply(id, false, None).unwrap();
    assert_eq!(summary.failed, 0);

    fixture.assert_not_exists("photos");
    fixture.assert_not_exists("docs/keep");
    fixture.assert_not_exists("docs");
    fixture.assert_dir_exists("mixed");
    fixture.assert_dir_exists("untouched/empty");
    fixture.assert_dir_exists("Images");
    assert!(fixture.path().exists());
    assert!(
        summary
            .removed_dirs
            .iter()
            .all(|d| d.starts_with(fixture.path()) && d != fixture.path())
    );
}

#[test]
fn test_same_name_in_different_dirs_is_renamed() {
    let mut fixture = TestFixture::new();
    fixture.create_file("a/photo.jpg", b"first");
    fixture.create_file("b/photo.jpg", b"second");
    let id = fixture.planned_session(true);

    let summary = fixture.service.apply(id, false, None).unwrap();
    assert_eq!(summary.failed, 0);
    assert_eq!(fs::read(fixture.path().join("Images/photo.jpg")).unwrap(), b"first");
    assert_eq!(
        fs::read(fixture.path().join("Images/photo_1.jpg")).unwrap(),
        b"second"
    );
}

#[test]
fn test_apply_twice_is_rejected() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    let id = fixture.planned_session(false);
    fixture.service.apply(id, false, None).unwrap();

    assert!(matches!(
        fixture.service.apply(id, false, None),
        Err(Error::InvalidTransition { .. })
    ));
}

#[test]
fn test_file_already_in_place_is_not_displaced() {
    let mut fixture = TestFixture::new();
    fixture.create_file("A/a.jpg", b"incoming");
    fixture.create_file("Images/a.jpg", b"resident");
    let id = fixture.planned_session(true);

    let summary = fixture.service.apply(id, false, None).unwrap();
    assert_eq!(summary.failed, 0);
    assert_eq!(fixture.status(id), SessionStatus::Done);
    assert_eq!(fs::read(fixture.path().join("Images/a.jpg")).unwrap(), b"resident");
    assert_eq!(fs::read(fixture.path().join("Images/a_1.jpg")).unwrap(), b"incoming");
    fixture.assert_not_exists("A");

    // Organizing the result again changes nothing and still succeeds.
    let before = fixture.snapshot();
    let again = fixture.planned_session(true);
    let summary = fixture.service.apply(again, false, None).unwrap();
    assert_eq!(summary.failed, 0);
    assert_eq!(fixture.status(again), SessionStatus::Done);
    assert_eq!(fixture.snapshot(), before);
}

// ============================================================================
// Test Suite 5: Session Lifecycle and Persistence
// ============================================================================

#[test]
fn test_delete_session_cascades() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    let id = fixture.planned_session(false);

    fixture.service.delete_session(id).unwrap();
    assert!(matches!(
        fixture.service.get_session(id),
        Err(Error::NotFound(_))
    ));
    assert!(fixture.service.list_sessions().is_empty());
    fixture.assert_file_exists("a.jpg");
}

#[test]
fn test_sessions_survive_reopening_the_store() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt"]);
    let state = TempDir::new().expect("Failed to create temp directory");
    let store_path = state.path().join("sessions.json");

    let id = {
        let store = SessionStore::open(&store_path).unwrap();
        let mut service = SessionService::new(AppConfig::default(), store).unwrap();
        let session = service.create_session(fixture.path(), Some(false)).unwrap();
        service.process(session.id, None, None).unwrap();
        session.id
    };

    let store = SessionStore::open(&store_path).unwrap();
    let mut service = SessionService::new(AppConfig::default(), store).unwrap();
    let record = service.get_session(id).unwrap();
    assert_eq!(record.session.status, SessionStatus::Planned);
    assert_eq!(record.instructions.len(), 4);

    service.apply(id, false, None).unwrap();
    fixture.assert_file_exists("Images/a.jpg");

    let reopened = SessionStore::open(&store_path).unwrap();
    assert_eq!(reopened.get(id).unwrap().session.status, SessionStatus::Done);
}

#[test]
fn test_progress_before_and_after() {
    let mut fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    let id = fixture.session(false);

    let progress = fixture.service.progress(id).unwrap();
    assert_eq!((progress.percent, progress.status), (0, SessionStatus::New));

    fixture.service.process(id, None, None).unwrap();
    assert_eq!(fixture.service.progress(id).unwrap().percent, 0);

    fixture.service.apply(id, false, None).unwrap();
    assert_eq!(fixture.service.progress(id).unwrap().percent, 100);
}

// ============================================================================
// Test Suite 6: Configuration and the Command Line
// ============================================================================

#[test]
fn test_config_filters_and_defaults() {
    let config = AppConfig::from_toml(
        r#"
[defaults]
struct_algorithm = "CRITERIA"
recursive = false

[filters.exclude]
extensions = ["bak"]
filenames = [".DS_Store"]

[registry]
criteria_field = "file_type"
"#,
    )
    .unwrap();
    let mut fixture = TestFixture::with_config(config);
    fixture.create_files(&["a.jpg", "old.bak", ".DS_Store", "sub/b.jpg"]);

    let path = fixture.path().to_path_buf();
    let id = fixture.service.create_session(&path, None).unwrap().id;
    let plan = fixture.service.process(id, None, None).unwrap();
    assert_eq!(plan.files_analyzed, 1);
    fixture.service.apply(id, false, None).unwrap();

    fixture.assert_file_exists("jpg/a.jpg");
    fixture.assert_file_exists("old.bak");
    fixture.assert_file_exists(".DS_Store");
    fixture.assert_file_exists("sub/b.jpg");
}

#[test]
fn test_cli_organize_end_to_end() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt", "c.unknownext"]);
    let state = TempDir::new().expect("Failed to create temp directory");
    let store_path = state.path().join("sessions.json");
    let config_path = state.path().join("config.toml");
    fs::write(&config_path, "[defaults]\nrecursive = false\n").unwrap();

    let cli = Cli::parse_from([
        "restruct",
        "--config",
        config_path.to_str().unwrap(),
        "--store",
        store_path.to_str().unwrap(),
        "--json",
        "organize",
        fixture.path().to_str().unwrap(),
    ]);
    run_cli(cli).unwrap();

    fixture.assert_file_exists("Images/a.jpg");
    fixture.assert_file_exists("Documents/Text/b.txt");
    fixture.assert_file_exists("Other/c.unknownext");

    let store = SessionStore::open(&store_path).unwrap();
    let sessions = store.list();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status, SessionStatus::Done);
}

#[test]
fn test_cli_dry_run_leaves_plan_pending() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    let state = TempDir::new().expect("Failed to create temp directory");
    let store_path = state.path().join("sessions.json");
    let config_path = state.path().join("config.toml");
    fs::write(&config_path, "").unwrap();

    let args = |extra: &[&str]| {
        let mut args = vec![
            "restruct".to_string(),
            "--config".to_string(),
            config_path.display().to_string(),
            "--store".to_string(),
            store_path.display().to_string(),
            "--json".to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        Cli::parse_from(args)
    };

    run_cli(args(&["organize", fixture.path().to_str().unwrap(), "--dry-run"])).unwrap();
    fixture.assert_file_exists("a.jpg");

    let id = SessionStore::open(&store_path).unwrap().list()[0].id;
    let store = SessionStore::open(&store_path).unwrap();
    assert_eq!(store.get(id).unwrap().session.status, SessionStatus::Planned);

    run_cli(args(&["apply", &id.to_string()])).unwrap();
    fixture.assert_file_exists("Images/a.jpg");
}

#[test]
fn test_cli_reports_missing_session() {
    let state = TempDir::new().expect("Failed to create temp directory");
    let store_path = state.path().join("sessions.json");
    let config_path = state.path().join("config.toml");
    fs::write(&config_path, "").unwrap();

    let cli = Cli::parse_from([
        "restruct",
        "--config",
        config_path.to_str().unwrap(),
        "--store",
        store_path.to_str().unwrap(),
        "show",
        &Uuid::new_v4().to_string(),
    ]);
    assert!(matches!(run_cli(cli), Err(Error::NotFound(_))));
}

#[test]
fn test_cli_leaves_its_own_files_in_place() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    let config_path = fixture.path().join(".restructrc.toml");
    let store_path = fixture.path().join(".restruct_sessions.json");
    fs::write(&config_path, "[defaults]\nrecursive = true\n").unwrap();

    let cli = Cli::parse_from([
        "restruct",
        "--config",
        config_path.to_str().unwrap(),
        "--store",
        store_path.to_str().unwrap(),
        "--json",
        "organize",
        fixture.path().to_str().unwrap(),
    ]);
    run_cli(cli).unwrap();

    fixture.assert_file_exists("Images/a.jpg");
    fixture.assert_file_exists(".restructrc.toml");
    fixture.assert_file_exists(".restruct_sessions.json");
    fixture.assert_not_exists("Other");
    fixture.assert_not_exists("Config");

    let store = SessionStore::open(&store_path).unwrap();
    let record = store.get(store.list()[0].id).unwrap();
    assert_eq!(record.session.files_total, 1);
    assert_eq!(record.session.status, SessionStatus::Done);
}

#[test]
fn test_cli_lists_directory_entries() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "sub/b.txt"]);
    let state = TempDir::new().expect("Failed to create temp directory");
    let store_path = state.path().join("sessions.json");
    let config_path = state.path().join("config.toml");
    fs::write(&config_path, "").unwrap();

    let ls = |directory: &Path| {
        Cli::parse_from([
            "restruct",
            "--config",
            config_path.to_str().unwrap(),
            "--store",
            store_path.to_str().unwrap(),
            "--json",
            "ls",
            directory.to_str().unwrap(),
        ])
    };

    run_cli(ls(fixture.path())).unwrap();
    assert!(matches!(
        run_cli(ls(&fixture.path().join("missing"))),
        Err(Error::InvalidDirectory { .. })
    ));
    fixture.assert_file_exists("a.jpg");
    fixture.assert_file_exists("sub/b.txt");
}
