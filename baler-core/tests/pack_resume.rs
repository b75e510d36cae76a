use baler_core::archive::ArchiveWriter;
use baler_core::archive::tarball::TarAppender;
use baler_core::error::BalerError;
use baler_core::manifest::progress::ProgressManifest;
use baler_core::policy::RetryPolicy;
use baler_core::{PackOptions, pack};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::Path;
use std::time::Duration;

fn build_tree(root: &Path) {
    fs::create_dir_all(root.join("nested/deep")).unwrap();
    fs::write(root.join("a.txt"), b"alpha").unwrap();
    fs::write(root.join("b.bin"), vec![0u8; 8192]).unwrap();
    fs::write(root.join("nested/deep/c.txt"), b"gamma").unwrap();
}

fn gz_entries(path: &Path) -> Vec<String> {
    let gz = GzDecoder::new(File::open(path).unwrap());
    let mut ar = tar::Archive::new(gz);
    let mut names: Vec<String> = ar
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().display().to_string())
        .collect();
    names.sort();
    names
}

fn quick_retry() -> PackOptions {
    PackOptions {
        retry: RetryPolicy {
            max_attempts: 2,
            backoff: Duration::ZERO,
        },
        ..Default::default()
    }
}

/// Fake a run killed between two appends: one file in the tar and in
/// the manifest, then some garbage past the recorded length.
fn interrupt_after_first_file(src: &Path, dest: &Path) {
    let first = src.join("a.txt");
    let mut w = TarAppender::open(dest, None).unwrap();
    w.append(&first, Path::new("a.txt")).unwrap();
    let good = w.written_len().unwrap();
    let mut m = ProgressManifest::load_or_new(dest).unwrap();
    m.record(&first.canonicalize().unwrap(), good).unwrap();
    drop(w); // leaves an end marker past `good`, like a crash would leave junk
}

#[test]
fn interrupted_pack_resumes_without_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    build_tree(&src);
    let dest = dir.path().join("backup.tar");
    interrupt_after_first_file(&src, &dest);

    let res = pack(&src, &dest, &quick_retry(), None).unwrap();
    assert_eq!(res.skipped, 1);
    assert_eq!(res.appended, 2);
    assert_eq!(res.file_count, 3);
    assert!(res.failed.is_empty());

    assert_eq!(
        gz_entries(&res.final_path),
        vec!["a.txt", "b.bin", "nested/deep/c.txt"]
    );
    assert!(!dest.exists());
    assert!(!ProgressManifest::path_for(&dest).exists());
}

#[test]
fn repacking_an_unchanged_tree_keeps_one_entry_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    build_tree(&src);
    let dest = dir.path().join("backup.tar");

    pack(&src, &dest, &quick_retry(), None).unwrap();
    let res = pack(&src, &dest, &quick_retry(), None).unwrap();
    assert_eq!(res.file_count, 3);
    assert_eq!(gz_entries(&res.final_path).len(), 3);
}

#[test]
fn manifest_for_a_missing_archive_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    build_tree(&src);
    let dest = dir.path().join("backup.tar");

    let mut m = ProgressManifest::load_or_new(&dest).unwrap();
    m.record(Path::new("/gone/file.txt"), 512).unwrap();

    let err = pack(&src, &dest, &quick_retry(), None).unwrap_err();
    assert!(matches!(err, BalerError::Io(_)));
    // the manifest is kept for inspection
    assert!(ProgressManifest::path_for(&dest).exists());
}

#[test]
fn journal_ahead_of_the_archive_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    build_tree(&src);
    let dest = dir.path().join("backup.tar");
    interrupt_after_first_file(&src, &dest);

    // shrink the tar below the recorded length, as outside interference would
    let f = fs::OpenOptions::new().write(true).open(&dest).unwrap();
    f.set_len(100).unwrap();
    drop(f);

    let err = pack(&src, &dest, &quick_retry(), None).unwrap_err();
    assert!(matches!(err, BalerError::Io(_)));
    // no resume happened and the manifest is kept for inspection
    assert!(ProgressManifest::path_for(&dest).exists());
    assert_eq!(fs::metadata(&dest).unwrap().len(), 100);
}

#[test]
fn leftover_manifest_after_a_finished_job_is_cleaned_up() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    build_tree(&src);
    let dest = dir.path().join("backup.tar");
    let final_path = dir.path().join("backup.tar.gz");

    let mut m = ProgressManifest::load_or_new(&dest).unwrap();
    m.record(Path::new("/data/a.txt"), 1024).unwrap();
    fs::write(&final_path, b"already compressed").unwrap();

    let res = pack(&src, &dest, &quick_retry(), None).unwrap();
    assert_eq!(res.appended, 0);
    assert_eq!(res.skipped, 1);
    assert_eq!(res.file_count, 1);
    assert!(!ProgressManifest::path_for(&dest).exists());
    // the finished artifact is left alone
    assert_eq!(fs::read(&final_path).unwrap(), b"already compressed");
}

#[test]
fn archive_inside_the_source_is_not_packed_into_itself() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    build_tree(&src);
    let dest = src.join("backup.tar");
    interrupt_after_first_file(&src, &dest);

    let res = pack(&src, &dest, &quick_retry(), None).unwrap();
    assert_eq!(res.file_count, 3);
    assert_eq!(
        gz_entries(&res.final_path),
        vec!["a.txt", "b.bin", "nested/deep/c.txt"]
    );
}

#[test]
fn empty_directory_packs_to_an_empty_archive() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    let dest = dir.path().join("backup.tar");

    let res = pack(&src, &dest, &quick_retry(), None).unwrap();
    assert_eq!(res.file_count, 0);
    assert!(gz_entries(&res.final_path).is_empty());
}
