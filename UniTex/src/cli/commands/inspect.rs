//! CLI commands for inspecting containers

use std::collections::BTreeMap;
use std::path::Path;

use crate::container::{CompanionLocation, Container};
use crate::texture::{list_textures, unreadable_textures};

/// List the textures in a container
pub fn list(path: &Path, unreadable: bool) -> anyhow::Result<()> {
    let container = Container::open(path)?;
    let textures = list_textures(&container);

    if textures.is_empty() {
        println!("No textures found in: {}", path.display());
    } else {
        println!("{:>14}  {:>11}  {:<12}  {:>4}  {:>10}  Name", "Id", "Size", "Format", "Mips", "Bytes");
        for record in &textures {
            println!(
                "{:>14}  {:>11}  {:<12}  {:>4}  {:>10}  {}{}",
                record.id.to_string(),
                format!("{}x{}", record.width, record.height),
                record.format.to_string(),
                record.mip_count,
                record.location.len,
                record.name,
                if record.is_external() { "  [external]" } else { "" }
            );
        }
        println!();
        println!("{} textures", textures.len());
    }

    if unreadable {
        let failed = unreadable_textures(&container);
        if !failed.is_empty() {
            println!();
            println!("Unreadable Texture2D objects:");
            for (id, name, reason) in failed {
                println!("  {id:>12}  {name}: {reason}");
            }
        }
    }

    Ok(())
}

/// Show container structure and texture statistics
pub fn info(path: &Path) -> anyhow::Result<()> {
    let container = Container::open(path)?;
    let textures = list_textures(&container);

    println!("Container: {}", path.display());
    println!();
    println!("Kind: {}", container.kind());
    match container.unity_version() {
        Some(version) => println!("Unity version: {version}"),
        None => println!("Unity version: unknown"),
    }

    if let Some(archive) = container.bundle() {
        println!(
            "Bundle: UnityFS v{}, {} blocks, {} nodes, {} bytes decompressed",
            archive.header.version,
            archive.blocks.len(),
            archive.nodes.len(),
            archive.stream_len()
        );
    }

    println!();
    println!("Serialized files:");
    for entry in container.files() {
        println!("  {} (format {})", entry.name, entry.file.header.version);
    }

    if !container.companions().is_empty() {
        println!();
        println!("Companion streams:");
        for companion in container.companions() {
            let location = match &companion.location {
                CompanionLocation::File(file) => file.display().to_string(),
                CompanionLocation::BundleNode { .. } => "bundle node".to_string(),
            };
            println!("  {} ({} bytes, {location})", companion.name, companion.len);
        }
    }

    println!();
    println!("Objects: {}", container.object_count());
    println!("Textures: {}", textures.len());
    let unreadable = unreadable_textures(&container).len();
    if unreadable > 0 {
        println!("Unreadable textures: {unreadable}");
    }

    let mut by_format: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for record in &textures {
        let (count, bytes) = by_format.entry(record.format.to_string()).or_insert((0, 0));
        *count += 1;
        *bytes += record.location.len;
    }
    if !by_format.is_empty() {
        println!();
        println!("Textures by format:");
        for (format, (count, bytes)) in by_format {
            println!("  {format:<12} {count:>6}  {bytes:>12} bytes");
        }
    }

    Ok(())
}
