//! CLI command for container discovery

use std::path::Path;

use crate::discovery::find_containers;

/// Find all container files in a directory
pub fn find(dir: &Path) -> anyhow::Result<()> {
    let containers = find_containers(dir);

    if containers.is_empty() {
        println!("No containers found in: {}", dir.display());
    } else {
        println!("Found {} containers:", containers.len());
        for path in &containers {
            // Show relative path if possible
            let display = path.strip_prefix(dir).unwrap_or(path.as_path()).display();
            println!("  {display}");
        }
    }

    Ok(())
}
