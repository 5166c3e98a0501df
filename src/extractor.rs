//! Archive extraction for node binaries
//!
//! Extracts the daemon, CLI, and transaction tool from the release archive
//! into the flat binaries directory and sanity-checks the installed daemon.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::settings::CoreSettings;

/// Extract the three node executables from the release archive
pub fn extract_core(settings: &CoreSettings, archive_path: &Path) -> Result<(), String> {
    log::info!("Extracting node binaries from {}", archive_path.display());

    fs::create_dir_all(&settings.bin_dir)
        .map_err(|e| format!("Failed to create binaries directory: {}", e))?;

    let archive_name = archive_path
        .file_name()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let wanted: Vec<(String, PathBuf)> = settings
        .executables()
        .iter()
        .map(|exe| (settings.archive_bin_path(exe), settings.bin_dir.join(exe)))
        .collect();

    if archive_name.ends_with(".tar.gz") || archive_name.ends_with(".tgz") {
        extract_from_tar_gz(archive_path, &wanted)?;
    } else if archive_name.ends_with(".zip") {
        extract_from_zip(archive_path, &wanted)?;
    } else {
        return Err(format!("Unknown archive format: {}", archive_name));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        for (_, dest) in &wanted {
            let mut perms = fs::metadata(dest)
                .map_err(|e| format!("Failed to get file permissions: {}", e))?
                .permissions();
            perms.set_mode(0o755);
            fs::set_permissions(dest, perms)
                .map_err(|e| format!("Failed to set executable permission: {}", e))?;
        }
    }

    log::info!("Node binaries extracted to {}", settings.bin_dir.display());
    Ok(())
}

/// Extract the wanted entries from a tar.gz archive in a single pass
fn extract_from_tar_gz(archive_path: &Path, wanted: &[(String, PathBuf)]) -> Result<(), String> {
    let file = File::open(archive_path).map_err(|e| format!("Failed to open archive: {}", e))?;

    let gz = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(gz);

    let mut remaining: Vec<&(String, PathBuf)> = wanted.iter().collect();

    let entries = archive
        .entries()
        .map_err(|e| format!("Failed to read tar archive: {}", e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| format!("Failed to read tar entry: {}", e))?;

        let path = entry
            .path()
            .map_err(|e| format!("Failed to get entry path: {}", e))?
            .to_string_lossy()
            .to_string();

        if let Some(pos) = remaining.iter().position(|(name, _)| *name == path) {
            let (_, dest) = remaining.remove(pos);
            write_entry(&mut entry, dest)?;

            if remaining.is_empty() {
                return Ok(());
            }
        }
    }

    Err(format!(
        "Executables not found in archive: {}",
        remaining
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

/// Extract the wanted entries from a zip archive
fn extract_from_zip(archive_path: &Path, wanted: &[(String, PathBuf)]) -> Result<(), String> {
    let file = File::open(archive_path).map_err(|e| format!("Failed to open archive: {}", e))?;

    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| format!("Failed to read ZIP archive: {}", e))?;

    for (name, dest) in wanted {
        let mut entry = archive
            .by_name(name)
            .map_err(|_| format!("{} not found in archive", name))?;
        write_entry(&mut entry, dest)?;
    }

    Ok(())
}

fn write_entry<R: io::Read>(entry: &mut R, dest: &Path) -> Result<(), String> {
    let mut outfile = File::create(dest)
        .map_err(|e| format!("Failed to create {}: {}", dest.display(), e))?;

    io::copy(entry, &mut outfile).map_err(|e| format!("Failed to extract file: {}", e))?;

    log::info!("Extracted {}", dest.display());
    Ok(())
}

/// Check the installed daemon reports the expected version
pub fn verify_installed_version(settings: &CoreSettings) -> Result<String, String> {
    let daemon_path = settings.daemon_path();

    let output = Command::new(&daemon_path)
        .arg("--version")
        .output()
        .map_err(|e| format!("Failed to run {}: {}", daemon_path.display(), e))?;

    if !output.status.success() {
        return Err(format!(
            "{} --version exited with {}: {}",
            settings.daemon_name,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version_line = stdout.lines().next().unwrap_or("").to_string();
    log::info!("{} --version: {}", settings.daemon_name, version_line);

    if !version_line.contains(&settings.version) {
        return Err(format!(
            "Installed daemon reports \"{}\", expected version {}",
            version_line, settings.version
        ));
    }

    Ok(version_line)
}

/// Download is assumed done; extract the archive and verify the daemon
pub fn install_core(settings: &CoreSettings, archive_path: &Path) -> Result<(), String> {
    extract_core(settings, archive_path)?;
    verify_installed_version(settings)?;
    Ok(())
}
