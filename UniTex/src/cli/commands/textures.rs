//! CLI commands for texture export and replacement

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{DISK, GEAR, LOOKING_GLASS, PICTURE, print_done, print_step, simple_bar};
use crate::codec::CodecRegistry;
use crate::config::Settings;
use crate::container::Container;
use crate::export::ExportFormat;
use crate::patch::PatchWriter;
use crate::pipeline;

use super::backups::open_store;

/// Export one texture
pub fn export(container: &Path, texture: &str, output: &Path, strip_alpha: bool) -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let container = Container::open(container)?;
    let registry = CodecRegistry::default();

    let id = pipeline::export_texture(
        &container,
        texture,
        output,
        strip_alpha || settings.strip_alpha,
        &registry,
    )?;
    println!("Exported texture {id} to {}", output.display());
    Ok(())
}

/// Export every texture of a container
pub fn export_all(
    container: &Path,
    dest: &Path,
    format: Option<ExportFormat>,
    strip_alpha: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let format = format.unwrap_or(settings.export_format);
    let strip_alpha = strip_alpha || settings.strip_alpha;
    let start = Instant::now();

    if !quiet {
        print_step(1, 2, LOOKING_GLASS, &format!("Reading {}...", container.display()));
    }
    let container = Container::open(container)?;
    let registry = CodecRegistry::default();
    let total = crate::texture::list_textures(&container).len();

    if total == 0 {
        println!("No textures found");
        return Ok(());
    }

    if !quiet {
        print_step(2, 2, PICTURE, &format!("Exporting {total} textures as {format}..."));
    }
    let pb = if quiet {
        indicatif::ProgressBar::hidden()
    } else {
        simple_bar(total as u64, "Exporting")
    };

    let result = pipeline::export_all(&container, dest, format, strip_alpha, &registry, |progress| {
        pb.set_position(progress.current as u64);
        pb.set_message(progress.name.clone());
    })?;
    pb.finish_and_clear();

    for line in result.results.iter().filter(|r| r.starts_with("Failed")) {
        eprintln!("  {line}");
    }
    println!(
        "{} exported, {} failed -> {}",
        result.success_count,
        result.fail_count,
        dest.display()
    );
    if !quiet {
        print_done(start.elapsed());
    }
    Ok(())
}

/// Replace a texture in place
pub fn replace(
    container: &Path,
    texture: &str,
    image: &Path,
    backup_dir: Option<&Path>,
    no_backup: bool,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let store = if no_backup { None } else { Some(open_store(backup_dir)?) };
    let writer = store.as_ref().map_or_else(PatchWriter::new, PatchWriter::with_backups);
    let registry = CodecRegistry::default();

    print_step(1, 3, LOOKING_GLASS, &format!("Reading {}...", container.display()));
    let mut container = Container::open(container)?;

    print_step(2, 3, GEAR, &format!("Encoding {}...", image.display()));
    let outcome = pipeline::replace_texture(&mut container, texture, image, &writer, &registry)?;

    print_step(
        3,
        3,
        DISK,
        &format!("Wrote '{}' ({} bytes) to {}", outcome.name, outcome.bytes, container.path().display()),
    );
    if outcome.resized() {
        println!(
            "  Resized {}x{} -> {}x{}",
            outcome.source_size.0, outcome.source_size.1, outcome.target_size.0, outcome.target_size.1
        );
    }
    if let Some(store) = &store {
        println!("  Pristine backup in {}", store.root().display());
    }
    print_done(start.elapsed());
    Ok(())
}
