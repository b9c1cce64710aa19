//! Sorting a batch end to end into a real zip and reading it back.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::{Cursor, Read};
use std::sync::Arc;

use face_sort_adapters::{FsImageSource, ZipArchiveEncoder};
use face_sort_core::{ImageClassifier, ImageSource, Outcome, Session, ARCHIVE_FILE_NAME};
use face_sort_test_support::{ScriptedClassifier, SyntheticImageBuilder};
use zip::ZipArchive;

fn sorted_zip(classifier: ScriptedClassifier, batch: Vec<face_sort_core::ImageItem>) -> Vec<u8> {
    let mut session = Session::new(Arc::new(ZipArchiveEncoder::new()));
    session
        .initialize(|| Ok(Arc::new(classifier) as Arc<dyn ImageClassifier>))
        .unwrap();
    session.submit(batch).unwrap();
    session.process(&()).unwrap();

    let archive = session.download().unwrap();
    assert_eq!(archive.file_name(), ARCHIVE_FILE_NAME);
    archive.bytes().to_vec()
}

fn file_names(bytes: Vec<u8>) -> Vec<String> {
    let mut zip = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    (0..zip.len())
        .map(|i| zip.by_index(i).expect("entry").name().to_string())
        .filter(|name| !name.ends_with('/'))
        .collect()
}

#[test]
fn test_groups_become_folders() {
    let classifier = ScriptedClassifier::new()
        .with("a.png", Outcome::Male)
        .with("b.png", Outcome::Female);
    let bytes = sorted_zip(
        classifier,
        SyntheticImageBuilder::batch(&["a.png", "b.png", "c.png"]),
    );

    assert_eq!(
        file_names(bytes),
        ["Boys/a.png", "Girls/b.png", "Unsorted/c.png"]
    );
}

#[test]
fn test_empty_groups_are_omitted() {
    let classifier = ScriptedClassifier::new().with("a.png", Outcome::Female);
    let bytes = sorted_zip(classifier, SyntheticImageBuilder::batch(&["a.png"]));

    let zip = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    let names: Vec<&str> = zip.file_names().collect();
    assert!(names.iter().all(|n| n.starts_with("Girls/")), "{names:?}");
}

#[test]
fn test_entries_hold_original_bytes() {
    let original = SyntheticImageBuilder::png("a.png");
    let expected = original.bytes().unwrap().to_vec();
    let classifier = ScriptedClassifier::new().with("a.png", Outcome::Male);
    let bytes = sorted_zip(classifier, vec![original]);

    let mut zip = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    let mut content = Vec::new();
    zip.by_name("Boys/a.png")
        .expect("entry")
        .read_to_end(&mut content)
        .expect("read");
    assert_eq!(content, expected);
}

#[test]
fn test_identical_batches_produce_identical_zips() {
    let run = || {
        sorted_zip(
            ScriptedClassifier::new().with("a.png", Outcome::Male),
            SyntheticImageBuilder::batch(&["a.png", "b.png"]),
        )
    };
    assert_eq!(run(), run());
}

#[test]
fn test_files_from_disk_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let png = SyntheticImageBuilder::png_bytes(8, 8);
    std::fs::write(dir.path().join("x.png"), &png).expect("write");
    std::fs::write(dir.path().join("readme.txt"), b"skip me").expect("write");

    let source = FsImageSource::new(vec![dir.path().to_path_buf()], false);
    let batch = source.items().collect();
    let bytes = sorted_zip(ScriptedClassifier::new(), batch);

    assert_eq!(file_names(bytes), ["Unsorted/x.png"]);
}
