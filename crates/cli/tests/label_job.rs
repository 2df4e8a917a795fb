//! Runs the label job over a small Switchboard transcript for every
//! partition.

use std::path::{Path, PathBuf};

use corpusprep::LabelJob;
use corpusprep_config::Settings;
use corpusprep_features::npy;
use corpusprep_labels::{Partition, SymbolTable};

const TRANSCRIPT: &str = "\
sw02001A-ms98-a-0001 0.000000 0.977625 [silence]
sw02001A-ms98-a-0002 0.977625 11.561375 hi um yeah i'd like to talk about how you dress for work and
sw02001A-ms98-a-0003 11.561375 13.650000 well,_[laughter-um]_yeah
sw02001A-ms98-a-0004 13.650000 15.000000 [laughter]
sw02001B-ms98-a-0001 0.000000 2.000000 {yuppiedom} [it'n/isn't] -[an]y
";

fn settings(root: &Path, partition: &str) -> Settings {
    Settings {
        corpus: Some("switchboard".to_string()),
        map_dir: root.join("mapping_files"),
        output_dir: root.join("dataset").join(partition),
        ..Settings::default()
    }
}

fn transcript(root: &Path) -> PathBuf {
    let path = root.join("sw02001-trans.text");
    std::fs::write(&path, TRANSCRIPT).unwrap();
    path
}

#[test]
fn test_train_builds_table_and_writes_indices() {
    let dir = tempfile::tempdir().unwrap();
    let input = transcript(dir.path());

    let job = LabelJob::from_settings(&settings(dir.path(), "train"), Partition::Train).unwrap();
    let summary = job.run(&[&input]).unwrap();
    assert_eq!(summary.utterances, 5);
    assert_eq!(summary.kept, 3);
    assert_eq!(summary.dropped, 2);
    assert_eq!(summary.label_type, "character");

    let table_path = dir.path().join("mapping_files/ctc/character_to_num.txt");
    assert_eq!(summary.table_path, table_path);
    let table = SymbolTable::load(&table_path).unwrap();
    assert_eq!(summary.vocabulary, Some(table.len()));

    let out = dir.path().join("dataset/train");
    assert!(!out.join("sw02001A/sw02001A_0001.npy").exists());
    assert!(!out.join("sw02001A/sw02001A_0004.npy").exists());

    let indices = npy::read_indices(out.join("sw02001A/sw02001A_0003.npy")).unwrap();
    let indices: Vec<usize> = indices.into_iter().map(|i| i as usize).collect();
    assert_eq!(table.decode(&indices).unwrap().concat(), "_well_L_um_yeah_");
    assert!(out.join("sw02001B/sw02001B_0001.npy").exists());
}

#[test]
fn test_dev_reuses_train_table() {
    let dir = tempfile::tempdir().unwrap();
    let input = transcript(dir.path());

    LabelJob::from_settings(&settings(dir.path(), "train"), Partition::Train)
        .unwrap()
        .run(&[&input])
        .unwrap();
    let table_path = dir.path().join("mapping_files/ctc/character_to_num.txt");
    let before = std::fs::read_to_string(&table_path).unwrap();

    let summary = LabelJob::from_settings(&settings(dir.path(), "dev"), Partition::Dev)
        .unwrap()
        .run(&[&input])
        .unwrap();
    assert_eq!(summary.kept, 3);
    assert_eq!(std::fs::read_to_string(&table_path).unwrap(), before);

    let train = npy::read_indices(dir.path().join("dataset/train/sw02001A/sw02001A_0002.npy"));
    let dev = npy::read_indices(dir.path().join("dataset/dev/sw02001A/sw02001A_0002.npy"));
    assert_eq!(train.unwrap(), dev.unwrap());
}

#[test]
fn test_dev_without_table_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = transcript(dir.path());

    let err = LabelJob::from_settings(&settings(dir.path(), "dev"), Partition::Dev)
        .unwrap()
        .run(&[&input])
        .unwrap_err();
    assert!(format!("{err:#}").contains("train partition"));
    assert!(!dir.path().join("dataset/dev").exists());
}

#[test]
fn test_test_partition_keeps_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = transcript(dir.path());

    let summary = LabelJob::from_settings(&settings(dir.path(), "test"), Partition::Test)
        .unwrap()
        .run(&[&input])
        .unwrap();
    assert_eq!(summary.vocabulary, None);

    let text = npy::read_text(dir.path().join("dataset/test/sw02001A/sw02001A_0003.npy")).unwrap();
    assert_eq!(text, "_well_L_um_yeah_");
    assert!(!dir.path().join("mapping_files").exists());
}

#[test]
fn test_selectors_are_checked_up_front() {
    let dir = tempfile::tempdir().unwrap();

    let mut bad_model = settings(dir.path(), "train");
    bad_model.model = "transducer".to_string();
    assert!(LabelJob::from_settings(&bad_model, Partition::Train).is_err());

    let mut no_corpus = settings(dir.path(), "train");
    no_corpus.corpus = None;
    assert!(LabelJob::from_settings(&no_corpus, Partition::Train).is_err());

    // kana is a CSJ label type
    let mut mismatched = settings(dir.path(), "train");
    mismatched.label_type = Some("kana".to_string());
    let job = LabelJob::from_settings(&mismatched, Partition::Train).unwrap();
    let input = transcript(dir.path());
    assert!(job.run(&[&input]).is_err());
    assert!(!dir.path().join("dataset").exists());
}

#[test]
fn test_attention_table_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut attention = settings(dir.path(), "train");
    attention.model = "attention".to_string();
    attention.label_type = Some("character_capital_divide".to_string());

    let job = LabelJob::from_settings(&attention, Partition::Train).unwrap();
    assert_eq!(
        job.table_path(),
        dir.path().join("mapping_files/attention/character_capital_divide_to_num.txt")
    );
    let summary = job.run(&[transcript(dir.path())]).unwrap();
    assert_eq!(summary.kept, 3);

    let table = SymbolTable::load(job.table_path()).unwrap();
    assert!(table.contains("<") && table.contains(">"));
}
