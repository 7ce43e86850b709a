use clap::Subcommand;
use std::path::PathBuf;

use crate::export::ExportFormat;

pub mod backups;
pub mod discover;
mod execute;
pub mod inspect;
pub mod textures;

#[derive(Subcommand)]
pub enum Commands {
    /// List the textures in a container
    List {
        /// .assets or .bundle file
        container: PathBuf,

        /// Also list Texture2D objects that could not be read
        #[arg(long)]
        unreadable: bool,
    },

    /// Show container structure and texture statistics
    Info {
        /// .assets or .bundle file
        container: PathBuf,
    },

    /// Export one texture to PNG or TGA (by output extension)
    Export {
        /// .assets or .bundle file
        container: PathBuf,

        /// Path id, FILE:PATH_ID, or texture name
        texture: String,

        /// Output image file
        output: PathBuf,

        /// Drop the alpha channel from PNG output
        #[arg(long)]
        strip_alpha: bool,
    },

    /// Export every texture in a container
    ExportAll {
        /// .assets or .bundle file
        container: PathBuf,

        /// Output directory
        destination: PathBuf,

        /// Output format (png, tga); defaults to the settings file
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Drop the alpha channel from PNG output
        #[arg(long)]
        strip_alpha: bool,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Replace a texture with an image file, in place
    Replace {
        /// .assets or .bundle file
        container: PathBuf,

        /// Path id, FILE:PATH_ID, or texture name
        texture: String,

        /// Replacement image (PNG, TGA, JPEG or BMP)
        image: PathBuf,

        /// Backup directory (overrides the settings file)
        #[arg(long, conflicts_with = "no_backup")]
        backup_dir: Option<PathBuf>,

        /// Do not take a pristine backup before writing
        #[arg(long)]
        no_backup: bool,
    },

    /// Take a pristine backup of a container now
    Backup {
        /// .assets or .bundle file
        container: PathBuf,

        /// Backup directory (overrides the settings file)
        #[arg(long)]
        backup_dir: Option<PathBuf>,
    },

    /// Restore a container, or one of its textures, from the pristine backup
    Restore {
        /// .assets or .bundle file
        container: PathBuf,

        /// Restore only this texture (path id, file:path_id or name)
        #[arg(short, long)]
        texture: Option<String>,

        /// Backup directory (overrides the settings file)
        #[arg(long)]
        backup_dir: Option<PathBuf>,
    },

    /// List backed-up containers
    Backups {
        /// Backup directory (overrides the settings file)
        #[arg(long)]
        backup_dir: Option<PathBuf>,
    },

    /// Find container files under a game directory
    Discover {
        /// Directory to scan
        dir: PathBuf,
    },
}
