//! Command execution implementations

use super::Commands;
use super::{backups, discover, inspect, textures};

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::List {
                container,
                unreadable,
            } => inspect::list(container, *unreadable),
            Commands::Info { container } => inspect::info(container),
            Commands::Export {
                container,
                texture,
                output,
                strip_alpha,
            } => textures::export(container, texture, output, *strip_alpha),
            Commands::ExportAll {
                container,
                destination,
                format,
                strip_alpha,
                quiet,
            } => textures::export_all(container, destination, *format, *strip_alpha, *quiet),
            Commands::Replace {
                container,
                texture,
                image,
                backup_dir,
                no_backup,
            } => textures::replace(container, texture, image, backup_dir.as_deref(), *no_backup),
            Commands::Backup {
                container,
                backup_dir,
            } => backups::backup(container, backup_dir.as_deref()),
            Commands::Restore {
                container,
                texture,
                backup_dir,
            } => backups::restore(container, texture.as_deref(), backup_dir.as_deref()),
            Commands::Backups { backup_dir } => backups::list(backup_dir.as_deref()),
            Commands::Discover { dir } => discover::find(dir),
        }
    }
}
