//! First-run interactive setup.
//!
//! Validates the sync root, creates the export/import directories, discovers
//! notebooks from the newest export archive, and prompts for the set of
//! notebooks the agent may access. Prompts go to stderr so the flow works
//! even when stdout is wired to an MCP client.

use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::config::{AccessConfig, BridgeConfig};
use crate::sync::archive::{extract_archive, find_latest_archive, scratch_dir};

pub fn run_setup(config: &BridgeConfig) -> Result<()> {
    let sync_root = config.resolved_sync_root()?;
    if !sync_root.is_dir() {
        bail!(
            "sync root {} does not exist or is not a directory",
            sync_root.display()
        );
    }

    let export_dir = config.export_dir()?;
    let import_dir = config.import_dir()?;
    std::fs::create_dir_all(&export_dir).context("failed to create export directory")?;
    std::fs::create_dir_all(&import_dir).context("failed to create import directory")?;

    eprintln!("\n=== notebridge — first run setup ===\n");
    eprintln!("Sync folder: {}", sync_root.display());
    eprintln!("  export/ and import/ subdirectories ready.\n");

    let notebooks = discover_notebooks(&export_dir)?;

    let enabled = if notebooks.is_empty() {
        eprintln!(
            "No export archive found.\n\n\
             Export your notes from the note app as a Markdown zip and save it to:\n  {}\n\
             Then re-run `notebridge setup` to pick notebooks, or grant access later\n\
             with the configure_notebook_access tool.\n",
            export_dir.display()
        );
        Vec::new()
    } else {
        eprintln!("Discovered notebooks:");
        for (i, name) in notebooks.iter().enumerate() {
            eprintln!("  {}. {name}", i + 1);
        }
        let answer = prompt(
            "\nEnter notebook numbers to grant agent access (comma-separated, or \"all\"): ",
        )?;
        let chosen = choose_notebooks(&notebooks, &answer);
        eprintln!(
            "\nEnabled notebooks: {}",
            if chosen.is_empty() {
                "(none)".to_string()
            } else {
                chosen.join(", ")
            }
        );
        chosen
    };

    let mut access = AccessConfig::load(&sync_root)?;
    access.enabled_notebooks = enabled;
    access.first_run_complete = true;
    access.save(&sync_root)?;

    eprintln!(
        "\n=== MCP client wiring ===\n\n\
         stdio:  notebridge serve\n\
         http:   notebridge serve-http   (http://{}:{}/mcp)\n\n\
         Config saved to {}\n",
        config.server.host,
        config.server.port,
        sync_root.join(crate::config::ACCESS_CONFIG_FILE).display()
    );

    Ok(())
}

/// Extract the newest archive (if any) and collect first-level directory
/// names as notebooks. Root-level notes fall into the sentinel group.
fn discover_notebooks(export_dir: &Path) -> Result<Vec<String>> {
    let Some(zip_path) = find_latest_archive(export_dir)? else {
        return Ok(Vec::new());
    };
    eprintln!(
        "Found export: {}",
        zip_path.file_name().unwrap_or_default().to_string_lossy()
    );

    let files = match extract_archive(&zip_path, export_dir) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Warning: could not read export archive: {e:#}");
            return Ok(Vec::new());
        }
    };

    let root = scratch_dir(export_dir);
    let mut names = BTreeSet::new();
    for file in files {
        let Ok(relative) = file.strip_prefix(&root) else {
            continue;
        };
        match relative.components().next() {
            Some(first) if relative.components().count() > 1 => {
                names.insert(first.as_os_str().to_string_lossy().into_owned());
            }
            _ => {
                names.insert(crate::notes::types::DEFAULT_NOTEBOOK.to_string());
            }
        }
    }
    Ok(names.into_iter().collect())
}

/// Interpret the prompt answer: `all`, or 1-based comma-separated indices.
fn choose_notebooks(notebooks: &[String], answer: &str) -> Vec<String> {
    if answer.trim().eq_ignore_ascii_case("all") {
        return notebooks.to_vec();
    }
    answer
        .split(',')
        .filter_map(|s| s.trim().parse::<usize>().ok())
        .filter_map(|i| i.checked_sub(1))
        .filter_map(|i| notebooks.get(i).cloned())
        .collect()
}

fn prompt(question: &str) -> Result<String> {
    eprint!("{question}");
    std::io::stderr().flush().ok();
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choose_all_selects_everything() {
        let notebooks = vec!["a".to_string(), "b".to_string()];
        assert_eq!(choose_notebooks(&notebooks, "ALL"), notebooks);
    }

    #[test]
    fn choose_by_indices_skips_invalid() {
        let notebooks = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(
            choose_notebooks(&notebooks, "1, 3, 9, junk, 0"),
            vec!["a".to_string(), "c".to_string()]
        );
        assert!(choose_notebooks(&notebooks, "").is_empty());
    }
}
