//! In-place patching, backups and restore

mod common;

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use common::{
    FORMAT_RGBA32, NodeSpec, ObjectSpec, TextureSpec, bundle, pattern, serialized_file, write,
    write_mixed_assets,
};
use unitex::Error;
use unitex::backup::{BackupState, BackupStore};
use unitex::codec::{self, CodecRegistry};
use unitex::container::Container;
use unitex::formats::bundle::read_bundle;
use unitex::patch::PatchWriter;
use unitex::texture::{DataSource, resolve};

#[test]
fn test_uncompressed_round_trip_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let path = write_mixed_assets(dir.path());
    let original = fs::read(&path).unwrap();
    let original_stream = fs::read(dir.path().join("sharedassets0.assets.resS")).unwrap();
    let registry = CodecRegistry::default();

    let mut container = Container::open(&path).unwrap();
    for name in ["Logo", "Background"] {
        let record = resolve(&container, name).unwrap().clone();
        let stored = container.texture_bytes(&record).unwrap();
        let image = codec::decode(&container, &record, &registry).unwrap();
        let encoded = codec::encode(&image, &record, &registry).unwrap();
        assert_eq!(encoded, stored, "{name}");
        PatchWriter::new().commit(&mut container, record.id, &encoded).unwrap();
    }

    assert_eq!(fs::read(&path).unwrap(), original);
    assert_eq!(
        fs::read(dir.path().join("sharedassets0.assets.resS")).unwrap(),
        original_stream
    );
}

#[test]
fn test_commit_updates_file_and_container() {
    let dir = TempDir::new().unwrap();
    let path = write_mixed_assets(dir.path());
    let mut container = Container::open(&path).unwrap();

    let logo = resolve(&container, "Logo").unwrap().clone();
    let replacement = vec![0x5A; logo.location.len];
    PatchWriter::new().commit(&mut container, logo.id, &replacement).unwrap();

    assert_eq!(container.texture_bytes(&logo).unwrap(), replacement);
    let reopened = Container::open(&path).unwrap();
    let record = resolve(&reopened, "Logo").unwrap();
    assert_eq!(record, &logo);
    assert_eq!(reopened.texture_bytes(record).unwrap(), replacement);

    // the streamed texture and the other object are untouched
    let background = resolve(&reopened, "Background").unwrap();
    assert_eq!(
        reopened.texture_bytes(background).unwrap(),
        pattern(8 * 8 * 3, 11)
    );
}

#[test]
fn test_commit_to_companion_stream() {
    let dir = TempDir::new().unwrap();
    let path = write_mixed_assets(dir.path());
    let assets_before = fs::read(&path).unwrap();
    let mut container = Container::open(&path).unwrap();

    let background = resolve(&container, "Background").unwrap().clone();
    let replacement = vec![0x11; background.location.len];
    PatchWriter::new()
        .commit(&mut container, background.id, &replacement)
        .unwrap();

    assert_eq!(fs::read(&path).unwrap(), assets_before);
    let stream = fs::read(dir.path().join("sharedassets0.assets.resS")).unwrap();
    assert_eq!(&stream[32..32 + replacement.len()], &replacement[..]);
    assert_eq!(&stream[..32], &pattern(32, 200)[..]);
    assert_eq!(container.texture_bytes(&background).unwrap(), replacement);
}

#[test]
fn test_dropped_stage_leaves_everything_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = write_mixed_assets(dir.path());
    let before = fs::read(&path).unwrap();
    let container = Container::open(&path).unwrap();
    let logo = resolve(&container, "Logo").unwrap().clone();

    let staged = PatchWriter::new()
        .stage(&container, logo.id, &vec![0; logo.location.len])
        .unwrap();
    assert_eq!(staged.target(), path.as_path());
    drop(staged);

    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(container.texture_bytes(&logo).unwrap(), pattern(64, 3));
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 2, "{leftovers:?}");
}

#[test]
fn test_size_mismatch_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_mixed_assets(dir.path());
    let before = fs::read(&path).unwrap();
    let store = BackupStore::open(dir.path().join("backups")).unwrap();
    let mut container = Container::open(&path).unwrap();
    let logo = resolve(&container, "Logo").unwrap().clone();

    let result = PatchWriter::with_backups(&store).commit(&mut container, logo.id, &[0; 10]);
    match result {
        Err(Error::SizeMismatch { expected, actual, .. }) => {
            assert_eq!((expected, actual), (64, 10));
        }
        other => panic!("expected SizeMismatch, got {other:?}"),
    }
    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(store.state(&path), BackupState::NoBackup);
}

#[test]
fn test_backup_taken_once_before_first_edit() {
    let dir = TempDir::new().unwrap();
    let path = write_mixed_assets(dir.path());
    let pristine = fs::read(&path).unwrap();
    let store = BackupStore::open(dir.path().join("backups")).unwrap();
    let writer = PatchWriter::with_backups(&store);
    let mut container = Container::open(&path).unwrap();
    let logo = resolve(&container, "Logo").unwrap().clone();

    assert_eq!(store.state(&path), BackupState::NoBackup);
    writer.commit(&mut container, logo.id, &vec![1; 64]).unwrap();
    assert_eq!(store.state(&path), BackupState::BackedUp);

    let entry = store.entry(&path).unwrap().unwrap();
    assert_eq!(fs::read(entry.backup_path()).unwrap(), pristine);

    writer.commit(&mut container, logo.id, &vec![2; 64]).unwrap();
    let again = store.entry(&path).unwrap().unwrap();
    assert_eq!(again.created, entry.created);
    assert_eq!(fs::read(again.backup_path()).unwrap(), pristine);
    assert_eq!(again.companions.len(), 1);
}

#[test]
fn test_restore_is_idempotent_and_covers_companions() {
    let dir = TempDir::new().unwrap();
    let path = write_mixed_assets(dir.path());
    let stream_path = dir.path().join("sharedassets0.assets.resS");
    let pristine = fs::read(&path).unwrap();
    let pristine_stream = fs::read(&stream_path).unwrap();

    let store = BackupStore::open(dir.path().join("backups")).unwrap();
    let writer = PatchWriter::with_backups(&store);
    let mut container = Container::open(&path).unwrap();
    for name in ["Logo", "Background"] {
        let record = resolve(&container, name).unwrap().clone();
        writer
            .commit(&mut container, record.id, &vec![0xEE; record.location.len])
            .unwrap();
    }
    assert_ne!(fs::read(&path).unwrap(), pristine);
    assert_ne!(fs::read(&stream_path).unwrap(), pristine_stream);

    store.restore(&path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), pristine);
    assert_eq!(fs::read(&stream_path).unwrap(), pristine_stream);

    store.restore(&path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), pristine);
    assert_eq!(fs::read(&stream_path).unwrap(), pristine_stream);
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn test_restore_with_lost_companion_copy_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_mixed_assets(dir.path());
    let stream_path = dir.path().join("sharedassets0.assets.resS");

    let store = BackupStore::open(dir.path().join("backups")).unwrap();
    let writer = PatchWriter::with_backups(&store);
    let mut container = Container::open(&path).unwrap();
    for name in ["Logo", "Background"] {
        let record = resolve(&container, name).unwrap().clone();
        writer
            .commit(&mut container, record.id, &vec![0x5A; record.location.len])
            .unwrap();
    }
    let edited = fs::read(&path).unwrap();
    let edited_stream = fs::read(&stream_path).unwrap();

    let entry = store.entry(&path).unwrap().unwrap();
    assert_eq!(entry.companions.len(), 1);
    fs::remove_file(entry.companion_path(&entry.companions[0])).unwrap();

    assert!(matches!(
        store.restore(&path),
        Err(Error::InvalidBackupDirectory { .. })
    ));
    assert_eq!(fs::read(&path).unwrap(), edited);
    assert_eq!(fs::read(&stream_path).unwrap(), edited_stream);
}

#[test]
fn test_restore_without_backup_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_mixed_assets(dir.path());
    let before = fs::read(&path).unwrap();
    let store = BackupStore::open(dir.path().join("backups")).unwrap();

    assert!(matches!(store.restore(&path), Err(Error::NoBackup { .. })));
    assert_eq!(fs::read(&path).unwrap(), before);
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_bundle_patch_keeps_untouched_blocks() {
    let dir = TempDir::new().unwrap();
    let objects = [
        ObjectSpec::Texture(TextureSpec::inline(1, "First", 16, 16, FORMAT_RGBA32, pattern(1024, 1))),
        ObjectSpec::Texture(TextureSpec::inline(2, "Second", 16, 16, FORMAT_RGBA32, pattern(1024, 2))),
    ];
    let nodes = [NodeSpec {
        path: "CAB-feed".to_string(),
        bytes: serialized_file(&objects),
        serialized: true,
    }];
    let path = write(dir.path(), "level.bundle", &bundle(&nodes, 128));
    let original = fs::read(&path).unwrap();
    let (before, _) = read_bundle(&original).unwrap();

    let mut container = Container::open(&path).unwrap();
    let second = resolve(&container, "Second").unwrap().clone();
    assert_eq!(second.location.source, DataSource::Main);
    let replacement = vec![0xC3; second.location.len];
    PatchWriter::new()
        .commit(&mut container, second.id, &replacement)
        .unwrap();

    let patched = fs::read(&path).unwrap();
    let (after, stream) = read_bundle(&patched).unwrap();
    let start = second.location.offset as usize;
    assert_eq!(&stream[start..start + replacement.len()], &replacement[..]);

    let dirty = start..start + replacement.len();
    let raw = |bytes: &[u8], offset: u64, len: u32| bytes[offset as usize..(offset + u64::from(len)) as usize].to_vec();
    let mut untouched = 0;
    for ((old, new), range) in before.blocks.iter().zip(&after.blocks).zip(before.block_ranges()) {
        if range.end <= dirty.start || range.start >= dirty.end {
            assert_eq!(
                raw(&patched, new.file_offset, new.compressed_size),
                raw(&original, old.file_offset, old.compressed_size)
            );
            untouched += 1;
        }
    }
    assert!(untouched > 0);

    let reopened = Container::open(&path).unwrap();
    let first = resolve(&reopened, "First").unwrap();
    assert_eq!(reopened.texture_bytes(first).unwrap(), pattern(1024, 1));
    assert_eq!(reopened.texture_bytes(resolve(&reopened, "Second").unwrap()).unwrap(), replacement);
}
