#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde_json::{json, Value};
    use std::fs::{self, File};
    use std::io::{Read, Write};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};
    use tomo::libs::analytics::{Analytics, AnalyticsSink, ImportError};
    use tomo::libs::backup::{Backup, RestoreError, AUTO_BACKUP_FILE_NAME};
    use tomo::libs::config::{
        Settings, SettingsHandle, AUTO_BACKUP, SKIN_ID, TEXT_COLOR, TEXT_OUTLINE_ENABLED, TEXT_OUTLINE_WIDTH, WORK_MINUTES,
    };
    use tomo::libs::data_storage::DataStorage;
    use tomo::libs::skin::Skin;
    use zip::write::SimpleFileOptions;
    use zip::{ZipArchive, ZipWriter};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0, 0, 0, 13];
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes
    }

    fn evening() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(20, 0, 0).unwrap()
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }

    fn entry_names(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        names
    }

    /// Records every import instead of applying it.
    #[derive(Default)]
    struct RecordingSink {
        imported: Vec<Value>,
    }

    impl AnalyticsSink for RecordingSink {
        fn import_data(&mut self, data: &Value) -> Result<(), ImportError> {
            self.imported.push(data.clone());
            Ok(())
        }
    }

    struct Profile {
        storage: DataStorage,
        settings: SettingsHandle,
    }

    impl Profile {
        fn new(base: PathBuf) -> Self {
            let storage = DataStorage::with_base(base);
            let settings = Settings::load(storage.config_path());
            settings.save().unwrap();
            Profile {
                storage,
                settings: settings.into_handle(),
            }
        }

        fn backup(&self) -> Backup {
            Backup::new(self.settings.clone(), self.storage.clone())
        }

        fn saved_settings(&self) -> Settings {
            Settings::load(self.storage.config_path())
        }
    }

    /// A source profile with statistics, custom visual settings and an
    /// animated skin, plus an empty target profile to restore into.
    struct BackupTestContext {
        temp_dir: TempDir,
        source: Profile,
        target: Profile,
    }

    impl TestContext for BackupTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let source = Profile::new(temp_dir.path().join("source"));
            let target = Profile::new(temp_dir.path().join("target"));

            let mut analytics = Analytics::load(source.storage.stats_path());
            analytics.accrue_work_seconds(1500, evening());
            analytics.increment_session();

            let skin_dir = source.storage.skins_dir().join("pixel");
            fs::create_dir_all(skin_dir.join("sub")).unwrap();
            fs::write(skin_dir.join("skin_001.png"), png(256, 256)).unwrap();
            fs::write(skin_dir.join("skin_002.png"), png(256, 256)).unwrap();
            fs::write(skin_dir.join("skin.json"), r#"{"name":"Pixel"}"#).unwrap();
            fs::write(skin_dir.join("notes.txt"), "not part of the skin").unwrap();
            fs::write(skin_dir.join("sub").join("tray.ico"), [0u8, 0, 1, 0]).unwrap();

            {
                let mut settings = source.settings.lock();
                settings.set(SKIN_ID, "pixel");
                settings.set(TEXT_COLOR, "#FF0000");
                settings.set(TEXT_OUTLINE_ENABLED, true);
                settings.set(WORK_MINUTES, 40);
                settings.save().unwrap();
            }

            BackupTestContext {
                temp_dir,
                source,
                target,
            }
        }
    }

    impl BackupTestContext {
        fn archive_path(&self, name: &str) -> PathBuf {
            self.temp_dir.path().join(name)
        }
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_archive_contains_state_and_filtered_skin(ctx: &mut BackupTestContext) {
        let path = ctx.source.backup().create_archive(&ctx.archive_path("full.zip")).unwrap();

        assert_eq!(
            entry_names(&path),
            vec![
                "config.json",
                "skin_backup/pixel/skin.json",
                "skin_backup/pixel/skin_001.png",
                "skin_backup/pixel/skin_002.png",
                "skin_backup/pixel/sub/tray.ico",
                "stats.json",
            ]
        );
        assert!(ctx.source.storage.backups_dir().is_dir());

        let mut archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let mut stats = String::new();
        archive.by_name("stats.json").unwrap().read_to_string(&mut stats).unwrap();
        let stats: Value = serde_json::from_str(&stats).unwrap();
        assert_eq!(stats["total_focus_seconds"], json!(1500));
        assert_eq!(stats["bucket_seconds"]["evening"], json!(1500));
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_archive_skips_missing_sources(ctx: &mut BackupTestContext) {
        let path = ctx.target.backup().create_archive(&ctx.archive_path("empty.zip")).unwrap();
        assert_eq!(entry_names(&path), vec!["config.json"]);
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_archive_resolves_absolute_skin_path(ctx: &mut BackupTestContext) {
        let external = ctx.temp_dir.path().join("external").join("retro");
        fs::create_dir_all(&external).unwrap();
        fs::write(external.join("skin.png"), png(256, 256)).unwrap();
        ctx.source.settings.lock().set(SKIN_ID, external.to_string_lossy().into_owned());

        let path = ctx.source.backup().create_archive(&ctx.archive_path("external.zip")).unwrap();
        assert!(entry_names(&path).contains(&"skin_backup/retro/skin.png".to_string()));
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_manual_backup_is_timestamped(ctx: &mut BackupTestContext) {
        let path = ctx.source.backup().manual_backup().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        assert_eq!(path.parent().unwrap(), ctx.source.storage.backups_dir());
        assert!(name.starts_with("backup_"));
        assert!(name.ends_with(".zip"));
        assert_eq!(name.len(), "backup_20240301_201500.zip".len());
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_auto_backup_follows_setting(ctx: &mut BackupTestContext) {
        let backup = ctx.source.backup();
        assert!(!backup.is_auto_backup_enabled());
        assert_eq!(backup.auto_backup().unwrap(), None);

        backup.set_auto_backup_enabled(true).unwrap();
        assert!(ctx.source.saved_settings().get_bool(AUTO_BACKUP, false));

        let path = backup.auto_backup().unwrap().unwrap();
        assert_eq!(path, ctx.source.storage.backups_dir().join(AUTO_BACKUP_FILE_NAME));
        assert!(path.exists());
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_list_backups_newest_first(ctx: &mut BackupTestContext) {
        let backup = ctx.source.backup();
        assert!(backup.list_backups().unwrap().is_empty());

        let dir = backup.backup_dir();
        backup.create_archive(&dir.join("backup_a.zip")).unwrap();
        backup.create_archive(&dir.join("backup_b.zip")).unwrap();
        fs::write(dir.join("readme.txt"), "ignored").unwrap();

        let names: Vec<String> = backup.list_backups().unwrap().into_iter().map(|entry| entry.name).collect();
        assert_eq!(names, vec!["backup_b.zip", "backup_a.zip"]);
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_restore_round_trip(ctx: &mut BackupTestContext) {
        let path = ctx.source.backup().create_archive(&ctx.archive_path("full.zip")).unwrap();
        let mut analytics = Analytics::load(ctx.target.storage.stats_path());

        let report = ctx.target.backup().restore_archive(&path, &mut analytics).unwrap();
        assert!(report.settings_merged);
        assert_eq!(report.skin.as_deref(), Some("pixel"));
        assert_eq!(report.skin_files, 4);

        assert_eq!(analytics.state().total_focus_seconds, 1500);
        assert_eq!(analytics.state().total_focus_sessions, 1);
        assert_eq!(Analytics::load(ctx.target.storage.stats_path()).state(), analytics.state());

        let saved = ctx.target.saved_settings();
        assert_eq!(saved.get_str(TEXT_COLOR, ""), "#FF0000");
        assert!(saved.get_bool(TEXT_OUTLINE_ENABLED, false));
        assert_eq!(saved.get_i64(TEXT_OUTLINE_WIDTH, 0), 2);
        assert_eq!(saved.get_i64(WORK_MINUTES, 0), 25);
        assert_eq!(saved.get_str(SKIN_ID, ""), "pixel");

        let skins = ctx.target.storage.skins_dir();
        assert!(skins.join("pixel").join("sub").join("tray.ico").is_file());
        assert!(!skins.join("pixel").join("notes.txt").exists());
        let skin = Skin::load(&skins, "pixel").unwrap();
        assert!(skin.animated);
        assert_eq!(skin.frames.len(), 2);
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_restore_without_stats_changes_nothing(ctx: &mut BackupTestContext) {
        let path = ctx.archive_path("no_stats.zip");
        let config = json!({ "textColor": "#00FF00" }).to_string();
        write_zip(&path, &[("config.json", config.as_bytes()), ("skin_backup/pixel/skin.png", png(256, 256).as_slice())]);

        let before = fs::read_to_string(ctx.target.storage.config_path()).unwrap();
        let mut sink = RecordingSink::default();
        let result = ctx.target.backup().restore_archive(&path, &mut sink);

        assert!(matches!(result, Err(RestoreError::MissingData)));
        assert!(sink.imported.is_empty());
        assert_eq!(fs::read_to_string(ctx.target.storage.config_path()).unwrap(), before);
        assert!(!ctx.target.storage.skins_dir().exists());
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_restore_missing_archive(ctx: &mut BackupTestContext) {
        let mut sink = RecordingSink::default();
        let result = ctx.target.backup().restore_archive(&ctx.archive_path("nowhere.zip"), &mut sink);
        assert!(matches!(result, Err(RestoreError::NotFound(_))));
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_restore_rejects_non_zip_file(ctx: &mut BackupTestContext) {
        let path = ctx.archive_path("plain.zip");
        fs::write(&path, "definitely not a zip").unwrap();
        let mut sink = RecordingSink::default();
        let result = ctx.target.backup().restore_archive(&path, &mut sink);
        assert!(matches!(result, Err(RestoreError::Archive(_))));
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_restore_corrupt_stats(ctx: &mut BackupTestContext) {
        let path = ctx.archive_path("corrupt.zip");
        write_zip(&path, &[("stats.json", b"{ total_focus_seconds: ".as_slice())]);
        let mut sink = RecordingSink::default();
        let result = ctx.target.backup().restore_archive(&path, &mut sink);
        assert!(matches!(result, Err(RestoreError::CorruptData(_))));
        assert!(sink.imported.is_empty());
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_restore_format_mismatch_keeps_analytics(ctx: &mut BackupTestContext) {
        let path = ctx.archive_path("mismatch.zip");
        let stats = json!({ "total_focus_seconds": 10, "total_focus_sessions": 1 }).to_string();
        write_zip(&path, &[("stats.json", stats.as_bytes())]);

        let mut analytics = Analytics::load(ctx.source.storage.stats_path());
        let before = analytics.state().clone();
        let result = ctx.target.backup().restore_archive(&path, &mut analytics);

        assert!(matches!(
            result,
            Err(RestoreError::FormatMismatch(ImportError::MissingField("bucket_seconds")))
        ));
        assert_eq!(analytics.state(), &before);
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_restore_tolerates_malformed_config(ctx: &mut BackupTestContext) {
        let path = ctx.archive_path("bad_config.zip");
        let stats = json!({
            "total_focus_seconds": 0,
            "total_focus_sessions": 0,
            "bucket_seconds": { "midnight": 0, "morning": 0, "afternoon": 0, "evening": 0 }
        })
        .to_string();
        write_zip(&path, &[("stats.json", stats.as_bytes()), ("config.json", b"[not, json".as_slice())]);

        let mut sink = RecordingSink::default();
        let report = ctx.target.backup().restore_archive(&path, &mut sink).unwrap();
        assert!(!report.settings_merged);
        assert_eq!(report.skin, None);
        assert_eq!(sink.imported.len(), 1);
    }

    #[test_context(BackupTestContext)]
    #[test]
    fn test_skin_failure_keeps_imported_stats(ctx: &mut BackupTestContext) {
        let path = ctx.archive_path("blocked_skin.zip");
        let stats = json!({
            "total_focus_seconds": 900,
            "total_focus_sessions": 3,
            "bucket_seconds": { "midnight": 0, "morning": 900, "afternoon": 0, "evening": 0 }
        })
        .to_string();
        let frame = png(256, 256);
        write_zip(&path, &[("stats.json", stats.as_bytes()), ("skin_backup/x/skin.png", frame.as_slice())]);
        fs::write(ctx.target.storage.skins_dir(), "not a directory").unwrap();

        let mut analytics = Analytics::load(ctx.target.storage.stats_path());
        let result = ctx.target.backup().restore_archive(&path, &mut analytics);

        assert!(matches!(result, Err(RestoreError::Io(_))));
        assert_eq!(analytics.state().total_focus_seconds, 900);
        assert_eq!(analytics.state().total_focus_sessions, 3);
        assert_eq!(analytics.state().bucket_seconds.morning, 900);

        let saved: Value = serde_json::from_str(&fs::read_to_string(ctx.target.storage.stats_path()).unwrap()).unwrap();
        assert_eq!(saved["total_focus_seconds"], json!(900));
        assert_eq!(saved["bucket_seconds"]["morning"], json!(900));
        assert_ne!(ctx.target.saved_settings().get_str(SKIN_ID, ""), "x");
    }
}
