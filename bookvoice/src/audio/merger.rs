//! Audio file merging using FFmpeg.

use crate::pipeline::{AUDIO_EXT, SectionAudioGroup};
use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn ffmpeg_command() -> Command {
    Command::new("ffmpeg")
}

/// Check if FFmpeg is available on this system.
pub fn is_ffmpeg_available() -> bool {
    ffmpeg_command()
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Concatenate multiple audio files into one.
///
/// Uses FFmpeg's concat demuxer for lossless concatenation of same-format
/// files; a single input is copied byte-for-byte instead.
pub fn concatenate_audio_files(audio_files: &[&Path], output_path: &Path) -> Result<()> {
    if audio_files.is_empty() {
        anyhow::bail!("No audio files provided");
    }

    if audio_files.len() == 1 {
        // Just copy the single file
        fs::copy(audio_files[0], output_path)?;
        return Ok(());
    }

    // Create a temporary file list for ffmpeg
    let temp_dir = TempDir::new()?;
    let list_file = temp_dir.path().join("concat_list.txt");

    let mut list_content = String::new();
    for path in audio_files {
        // Escape single quotes in path
        let path_str = path.to_string_lossy().replace('\'', "'\\''");
        list_content.push_str(&format!("file '{}'\n", path_str));
    }
    fs::write(&list_file, &list_content)?;

    let output = ffmpeg_command()
        .args(["-y", "-hide_banner", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
        .arg(&list_file)
        .args(["-c", "copy"])
        .arg(output_path)
        .output()
        .context("Failed to run ffmpeg concat")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("ffmpeg concat failed: {}", stderr);
    }

    Ok(())
}

/// Collect a group's existing chunk files in chunk index order.
///
/// The insertion order is not trusted; units are re-sorted here. A missing
/// file is a warning, not an error, so one deleted chunk can't take down the
/// whole section.
fn collect_chunk_files(group: &SectionAudioGroup) -> Vec<PathBuf> {
    let mut units: Vec<_> = group.units.iter().collect();
    units.sort_by_key(|u| u.chunk_index);

    let mut files = Vec::new();
    for unit in units {
        if unit.output_path.exists() {
            files.push(unit.output_path.clone());
        } else {
            warn!(
                "chunk file not found, skipping: {}",
                unit.output_path.display()
            );
        }
    }
    files
}

/// Merge each section's chunk files into one artifact under `output_dir`.
///
/// Single-chunk sections are copied without re-encoding. FFmpeg must be
/// available up front; when it isn't, the error names `work_dir` since the
/// un-merged chunk files remain there.
pub fn merge_groups(
    groups: &[SectionAudioGroup],
    output_dir: &Path,
    work_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if !is_ffmpeg_available() {
        anyhow::bail!(
            "FFmpeg not found. Unable to merge chunked audio files.\n\
             Un-merged audio files can be found at {}",
            work_dir.display()
        );
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let mut outputs = Vec::new();

    for group in groups {
        if group.units.is_empty() {
            continue;
        }

        let output_path = output_dir.join(format!("{}.{}", group.file_basename, AUDIO_EXT));
        let files = collect_chunk_files(group);

        if files.is_empty() {
            warn!(
                "no audio files available for section '{}', skipping",
                group.file_basename
            );
            continue;
        }

        let file_refs: Vec<&Path> = files.iter().map(|p| p.as_path()).collect();
        concatenate_audio_files(&file_refs, &output_path)
            .with_context(|| format!("Failed to merge section '{}'", group.file_basename))?;

        outputs.push(output_path);
    }

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SynthesisUnit;

    fn unit(group_dir: &Path, basename: &str, chunk_index: usize, name: &str) -> SynthesisUnit {
        SynthesisUnit {
            section_index: 0,
            chunk_index,
            file_basename: basename.to_string(),
            output_path: group_dir.join(name),
        }
    }

    #[test]
    fn test_collect_chunk_files_resorts_by_index() {
        let dir = TempDir::new().unwrap();
        for name in ["a_pt00.mp3", "a_pt01.mp3", "a_pt02.mp3"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        // appended out of order on purpose
        let mut group = SectionAudioGroup::new("a".to_string());
        group.units.push(unit(dir.path(), "a", 2, "a_pt02.mp3"));
        group.units.push(unit(dir.path(), "a", 0, "a_pt00.mp3"));
        group.units.push(unit(dir.path(), "a", 1, "a_pt01.mp3"));

        let files = collect_chunk_files(&group);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_pt00.mp3", "a_pt01.mp3", "a_pt02.mp3"]);
    }

    #[test]
    fn test_collect_chunk_files_skips_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a_pt00.mp3"), b"x").unwrap();
        fs::write(dir.path().join("a_pt02.mp3"), b"x").unwrap();

        let mut group = SectionAudioGroup::new("a".to_string());
        group.units.push(unit(dir.path(), "a", 0, "a_pt00.mp3"));
        group.units.push(unit(dir.path(), "a", 1, "a_pt01.mp3")); // never written
        group.units.push(unit(dir.path(), "a", 2, "a_pt02.mp3"));

        let files = collect_chunk_files(&group);
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_concatenate_single_file_is_byte_identical_copy() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("only.mp3");
        let output = dir.path().join("out.mp3");
        fs::write(&input, b"unique audio bytes").unwrap();

        concatenate_audio_files(&[&input], &output).unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"unique audio bytes");
    }

    #[test]
    fn test_concatenate_no_files_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(concatenate_audio_files(&[], &dir.path().join("out.mp3")).is_err());
    }

    #[test]
    fn test_merge_groups_single_chunk_sections() {
        if !is_ffmpeg_available() {
            return;
        }

        let work_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();

        fs::write(work_dir.path().join("01_intro.mp3"), b"intro audio").unwrap();

        let mut group = SectionAudioGroup::new("01_intro".to_string());
        group
            .units
            .push(unit(work_dir.path(), "01_intro", 0, "01_intro.mp3"));

        let empty = SectionAudioGroup::new("02_blank".to_string());

        let outputs =
            merge_groups(&[group, empty], output_dir.path(), work_dir.path()).unwrap();

        // the empty group is skipped, the single chunk is copied unchanged
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0], output_dir.path().join("01_intro.mp3"));
        assert_eq!(fs::read(&outputs[0]).unwrap(), b"intro audio");
    }
}
