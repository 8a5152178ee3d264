//! Pipeline orchestration: section-by-section, chunk-by-chunk synthesis with
//! file-existence resumability.
//!
//! The filesystem is the checkpoint store. Every chunk has a deterministic
//! filename inside the run's working directory; a chunk whose file already
//! exists is skipped, so re-invoking an interrupted run only redoes missing
//! work.

use crate::section::{self, Section};
use crate::text::Chunk;
use crate::text::chunker;
use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use speech_client::{SpeechProvider, text_to_ssml};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Audio file extension produced by all supported services.
pub const AUDIO_EXT: &str = "mp3";

/// Fixed pause between consecutive synthesis calls, to stay under provider
/// rate limits.
pub const SYNTHESIS_DELAY: Duration = Duration::from_secs(1);

/// Maximum length of the slug portion of a section basename.
const SLUG_MAX: usize = 30;

/// Bookkeeping record for one materialized chunk audio file.
#[derive(Debug, Clone)]
pub struct SynthesisUnit {
    /// The section this chunk belongs to
    pub section_index: usize,
    /// The chunk index within the section
    pub chunk_index: usize,
    /// Basename shared by all chunks of the section
    pub file_basename: String,
    /// Path of the chunk audio file
    pub output_path: PathBuf,
}

/// All chunk records of one section, in synthesis order.
#[derive(Debug, Clone)]
pub struct SectionAudioGroup {
    /// Basename shared by the section's chunk files and its merged artifact
    pub file_basename: String,
    /// Chunk records in increasing chunk index order
    pub units: Vec<SynthesisUnit>,
}

impl SectionAudioGroup {
    /// Create an empty group for a section.
    pub fn new(file_basename: String) -> Self {
        Self {
            file_basename,
            units: Vec::new(),
        }
    }
}

/// Options controlling a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Split sections at H1 and H2 headings instead of H1 only
    pub split_at_subheadings: bool,
    /// Send SSML instead of plain text to the service
    pub ssml: bool,
    /// Maximum characters per synthesis request
    pub max_chunk_size: usize,
    /// Pause between consecutive synthesis calls
    pub call_delay: Duration,
    /// Show a progress bar
    pub progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            split_at_subheadings: false,
            ssml: false,
            max_chunk_size: chunker::DEFAULT_MAX_CHUNK,
            call_delay: SYNTHESIS_DELAY,
            progress: false,
        }
    }
}

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Sanitize a section title into a filename-safe slug.
fn slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    WHITESPACE_RUN
        .replace_all(stripped.trim(), "_")
        .into_owned()
}

/// Derive the basename shared by all of a section's files.
///
/// `ordinal` is 1-based; the slug is length-bounded so long chapter titles
/// stay manageable as filenames.
pub fn section_basename(title: &str, ordinal: usize) -> String {
    let slug: String = slug(title).chars().take(SLUG_MAX).collect();
    format!("{:02}_{}", ordinal, slug)
}

/// Derive a chunk's filename. Single-chunk sections use the bare basename;
/// multi-chunk sections get a part suffix.
pub fn chunk_file_name(basename: &str, chunk_index: usize, chunk_count: usize) -> String {
    if chunk_count == 1 {
        format!("{}.{}", basename, AUDIO_EXT)
    } else {
        format!("{}_pt{:02}.{}", basename, chunk_index, AUDIO_EXT)
    }
}

/// Create (or, when resuming, reuse) the working directory for chunk audio.
///
/// Fresh directories get a time-derived run id so concurrent invocations
/// against the same output directory can't collide. With `resume` set, the
/// most recent leftover working directory is picked up instead, which is
/// what lets an interrupted run skip its completed chunks.
pub fn create_work_dir(output_dir: &Path, resume: bool) -> Result<PathBuf> {
    if resume {
        if let Some(existing) = find_latest_work_dir(output_dir)? {
            info!("resuming in working directory: {}", existing.display());
            return Ok(existing);
        }
    }

    let run_id = Utc::now().format("%Y%m%d_%H%M%S").to_string();
    let mut candidate = output_dir.join(format!("temp_{}", run_id));
    let mut attempt = 1;
    while candidate.exists() {
        attempt += 1;
        candidate = output_dir.join(format!("temp_{}_{}", run_id, attempt));
    }

    fs::create_dir_all(&candidate)
        .with_context(|| format!("Failed to create working directory {}", candidate.display()))?;
    Ok(candidate)
}

/// Find the most recent `temp_*` working directory under `output_dir`.
fn find_latest_work_dir(output_dir: &Path) -> Result<Option<PathBuf>> {
    if !output_dir.exists() {
        return Ok(None);
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_work_dir = path.is_dir()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("temp_"))
                .unwrap_or(false);
        if is_work_dir {
            candidates.push(path);
        }
    }

    // run ids are timestamps, so lexicographic order is chronological
    candidates.sort();
    Ok(candidates.pop())
}

/// Convert a document into per-chunk audio files under `work_dir`.
///
/// Sections are processed in document order, chunks in index order. Chunk
/// files that already exist are skipped without a synthesis call. A failed
/// synthesis call aborts the run; completed files are left in place for the
/// next invocation to pick up.
pub async fn run_pipeline(
    document: &str,
    provider: &dyn SpeechProvider,
    work_dir: &Path,
    options: &PipelineOptions,
) -> Result<Vec<SectionAudioGroup>> {
    if options.ssml && !provider.supports_ssml() {
        anyhow::bail!(
            "{} does not accept SSML input; drop --ssml or pick another service",
            provider.name()
        );
    }

    let sections = section::split_into_sections(document, options.split_at_subheadings)
        .context("Failed to split document into sections")?;

    // Chunk everything up front so the total is known before synthesis
    let chunked: Vec<(&Section, Vec<Chunk>)> = sections
        .iter()
        .map(|s| (s, chunker::chunk_section(&s.content, options.max_chunk_size)))
        .collect();
    let total: usize = chunked.iter().map(|(_, chunks)| chunks.len()).sum();

    let progress = if options.progress {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut groups = Vec::new();

    for (section, chunks) in &chunked {
        let basename = section_basename(&section.title, section.order + 1);
        let mut group = SectionAudioGroup::new(basename.clone());
        let chunk_count = chunks.len();

        for chunk in chunks {
            let file_name = chunk_file_name(&basename, chunk.index, chunk_count);
            let output_path = work_dir.join(&file_name);

            if output_path.exists() {
                info!("skipping existing chunk file: {}", output_path.display());
            } else {
                if let Some(pb) = &progress {
                    pb.set_message(basename.clone());
                }

                let audio = if options.ssml {
                    let ssml = text_to_ssml(provider.voice(), &chunk.text);
                    provider.synthesize_ssml(&ssml).await
                } else {
                    provider.synthesize(&chunk.text).await
                }
                .with_context(|| {
                    format!(
                        "Synthesis failed for section {} \"{}\", chunk {}",
                        section.order, section.title, chunk.index
                    )
                })?;

                fs::write(&output_path, &audio)
                    .with_context(|| format!("Failed to write {}", output_path.display()))?;
                info!("created chunk file: {}", output_path.display());

                tokio::time::sleep(options.call_delay).await;
            }

            group.units.push(SynthesisUnit {
                section_index: section.order,
                chunk_index: chunk.index,
                file_basename: basename.clone(),
                output_path,
            });

            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }

        groups.push(group);
    }

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    Ok(groups)
}
