//! CLI commands for pristine backups

use std::path::Path;

use crate::backup::{BackupState, BackupStore};
use crate::cli::progress::{REWIND, SPARKLE};
use crate::config::Settings;
use crate::container::Container;
use crate::patch::PatchWriter;
use crate::pipeline::restore_texture;
use crate::texture::resolve;

/// Open the backup store from a CLI override or the settings file.
pub(super) fn open_store(backup_dir: Option<&Path>) -> anyhow::Result<BackupStore> {
    let dir = match backup_dir {
        Some(dir) => dir.to_path_buf(),
        None => Settings::load()?.backup_dir(),
    };
    Ok(BackupStore::open(dir)?)
}

/// Back up a container (and its companion streams) now
pub fn backup(path: &Path, backup_dir: Option<&Path>) -> anyhow::Result<()> {
    let store = open_store(backup_dir)?;
    let companions = Container::open(path)?.companion_files();

    if store.state(path) == BackupState::BackedUp {
        println!("Backup already exists for {}; keeping the pristine copy", path.display());
    }
    store.backup_with_companions(path, &companions)?;
    println!("{}Backed up {} to {}", SPARKLE, path.display(), store.root().display());
    Ok(())
}

/// Restore a container, or a single texture of it, from its backup
pub fn restore(path: &Path, texture: Option<&str>, backup_dir: Option<&Path>) -> anyhow::Result<()> {
    let store = open_store(backup_dir)?;
    let Some(query) = texture else {
        store.restore(path)?;
        println!("{}Restored {}", REWIND, path.display());
        return Ok(());
    };

    let mut container = Container::open(path)?;
    let record = resolve(&container, query)?.clone();
    restore_texture(&mut container, record.id, &store, &PatchWriter::with_backups(&store))?;
    println!(
        "{}Restored '{}' in {}",
        REWIND,
        record.display_name(),
        path.display()
    );
    Ok(())
}

/// List all backups in the store
pub fn list(backup_dir: Option<&Path>) -> anyhow::Result<()> {
    let store = open_store(backup_dir)?;
    let entries = store.list()?;

    if entries.is_empty() {
        println!("No backups in: {}", store.root().display());
        return Ok(());
    }

    println!("Backups in {}:", store.root().display());
    for entry in &entries {
        println!(
            "  {}  {:>12} bytes  {}",
            entry.created.format("%Y-%m-%d %H:%M:%S"),
            entry.size,
            entry.original.display()
        );
        for companion in &entry.companions {
            println!("  {:>19}  + {}", "", companion.original.display());
        }
    }
    Ok(())
}
