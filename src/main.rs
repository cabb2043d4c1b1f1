//! xfbin CLI - Command-line tool for unpacking and repacking XFBIN containers.
//!
//! `unpack` writes every chunk of a container to its own file, one directory
//! per page, with a `page.json` side-car describing the page's index slice and
//! references. `repack` reads those directories back into a container.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use xfbin::{ChunkData, ChunkId, ChunkIdentity, ChunkKind, ChunkRegistry, Page, Xfbin};

const PAGE_JSON: &str = "page.json";

/// xfbin - XFBIN chunk container tool
#[derive(Parser)]
#[command(name = "xfbin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log every file written or read
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the chunks of an XFBIN file
    Unpack {
        /// Path to the XFBIN file
        #[arg(env = "INPUT_XFBIN")]
        input: PathBuf,

        /// Output directory (defaults to the input's name)
        #[arg(env = "OUTPUT_FOLDER")]
        output: Option<PathBuf>,

        /// Overwrite old extracted files without prompting
        #[arg(short, long)]
        force_overwrite: bool,

        /// Write embedded NTP3/NDP3 data for textures and models (disables repacking)
        #[arg(short = 'd', long)]
        file_data_only: bool,

        /// Sort chunks by type instead of page (disables repacking)
        #[arg(short, long)]
        sort_types: bool,

        /// Do not write page.json for extracted pages (disables repacking)
        #[arg(short = 'j', long)]
        no_json: bool,
    },

    /// Build an XFBIN file from an unpacked directory
    Repack {
        /// Directory written by `unpack`
        input: PathBuf,

        /// Output XFBIN file (defaults to the directory's name)
        output: Option<PathBuf>,

        /// Overwrite an existing output file without prompting
        #[arg(short, long)]
        force_overwrite: bool,
    },
}

/// The side-car written next to a page's chunk files.
#[derive(Serialize, Deserialize)]
struct PageJson {
    #[serde(rename = "Chunk Maps")]
    chunk_maps: Vec<ChunkIdentity>,
    #[serde(rename = "Chunk References")]
    chunk_references: Vec<ReferenceJson>,
    #[serde(rename = "Chunks")]
    chunks: Vec<ChunkJson>,
}

#[derive(Serialize, Deserialize)]
struct ReferenceJson {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Chunk")]
    chunk: ChunkIdentity,
}

#[derive(Serialize, Deserialize)]
struct ChunkJson {
    #[serde(rename = "File Name")]
    file_name: String,
    #[serde(rename = "Chunk")]
    chunk: ChunkIdentity,
}

struct UnpackOptions {
    file_data_only: bool,
    sort_types: bool,
    no_json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    println!("xfbin {}\n", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Unpack {
            input,
            output,
            force_overwrite,
            file_data_only,
            sort_types,
            no_json,
        } => {
            let options = UnpackOptions {
                file_data_only,
                sort_types,
                // Raw sub-format files cannot be repacked, so the side-car is pointless.
                no_json: no_json || file_data_only,
            };
            cmd_unpack(&input, output, force_overwrite, &options)?;
        }
        Commands::Repack {
            input,
            output,
            force_overwrite,
        } => {
            cmd_repack(&input, output, force_overwrite)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Ask before replacing existing output. Returns false when the user declines.
fn confirm_overwrite(path: &Path, force: bool) -> Result<bool> {
    if !path.exists() || force {
        return Ok(true);
    }

    println!("Overwrite existing files? (Y/N)");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// The input's file name up to its first dot.
fn default_stem(input: &Path) -> String {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.split('.').next().unwrap_or_default().to_owned()
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn cmd_unpack(
    input: &Path,
    output: Option<PathBuf>,
    force_overwrite: bool,
    options: &UnpackOptions,
) -> Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(default_stem(input)));

    if output.exists() {
        if !confirm_overwrite(&output, force_overwrite)? {
            println!("Aborting.");
            return Ok(());
        }
        println!("Removing old directory: {}", output.display());
        fs::remove_dir_all(&output)
            .with_context(|| format!("Failed to remove {}", output.display()))?;
    }
    fs::create_dir_all(&output)?;

    let start = Instant::now();
    let data = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let (xfbin, report) = Xfbin::decode_with_report(&data, &ChunkRegistry::standard())
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    info!(
        "Loaded {} pages in {:?}",
        xfbin.pages.len(),
        start.elapsed()
    );
    if !report.is_clean() {
        warn!(
            "{} chunks could not be decoded and are kept as raw bytes",
            report.failures.len()
        );
    }

    if options.sort_types {
        unpack_by_type(&xfbin, &output, options)?;
    } else {
        unpack_by_page(&xfbin, &output, options)?;
    }

    println!("Done!");
    Ok(())
}

/// File name for an extracted chunk.
fn chunk_file_name(chunk: &ChunkIdentity, kind: ChunkKind, file_data_only: bool) -> String {
    let extension = kind.extension();
    if file_data_only && extension != ".bin" {
        format!("{}{extension}", chunk.name)
    } else {
        format!("{}.{}", chunk.name, chunk.short_type_name().to_lowercase())
    }
}

/// Bytes written for an extracted chunk: the record payload, or the embedded
/// NTP3/NDP3 file when only file data is wanted.
fn chunk_bytes(xfbin: &Xfbin, page: &Page, id: ChunkId, file_data_only: bool) -> Result<Vec<u8>> {
    if file_data_only {
        match &xfbin.chunk(id)?.data {
            Some(ChunkData::Texture(texture)) => return Ok(texture.nut.to_bytes()?),
            Some(ChunkData::Model(model)) => return Ok(model.nud.to_bytes()?),
            _ => {}
        }
    }
    Ok(xfbin.encode_chunk_payload(page, id)?)
}

fn write_chunk(
    xfbin: &Xfbin,
    page: &Page,
    id: ChunkId,
    dir: &Path,
    options: &UnpackOptions,
    pb: &ProgressBar,
) -> Result<String> {
    let chunk = xfbin.chunk(id)?;
    let file_name = chunk_file_name(&chunk.identity, chunk.kind(), options.file_data_only);
    let path = dir.join(&file_name);

    debug!("Writing {} ...", path.display());
    let bytes = chunk_bytes(xfbin, page, id, options.file_data_only)
        .with_context(|| format!("Failed to encode {}", chunk.identity))?;
    fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;

    pb.inc(1);
    Ok(file_name)
}

fn unpack_by_page(xfbin: &Xfbin, output: &Path, options: &UnpackOptions) -> Result<()> {
    let pages: Vec<Page> = xfbin
        .pages
        .iter()
        .map(|page| {
            let mut page = page.clone();
            page.cleanup(xfbin.arena());
            page
        })
        .collect();

    let pb = progress_bar(pages.iter().map(Page::len).sum())?;
    for (index, page) in pages.iter().enumerate() {
        let main_chunk = match page.chunks_by_kind(xfbin.arena(), ChunkKind::Clump).first() {
            Some(&clump) => clump,
            None => match page.chunks.last() {
                Some(&last) => last,
                None => {
                    pb.println(format!(
                        "Page {index} does not contain chunks and will be skipped."
                    ));
                    continue;
                }
            },
        };

        let main = &xfbin.chunk(main_chunk)?.identity;
        let page_dir = output.join(format!("[{index:03}] {} ({})", main.name, main.type_name));
        fs::create_dir_all(&page_dir)?;

        let mut chunks = Vec::with_capacity(page.len());
        for id in page.iter() {
            let file_name = write_chunk(xfbin, page, id, &page_dir, options, &pb)?;
            chunks.push(ChunkJson {
                file_name,
                chunk: xfbin.chunk(id)?.identity.clone(),
            });
        }

        if !options.no_json {
            let page_json = PageJson {
                chunk_maps: page
                    .initial_chunks
                    .iter()
                    .map(|&id| Ok(xfbin.chunk(id)?.identity.clone()))
                    .collect::<Result<_>>()?,
                chunk_references: page
                    .references
                    .iter()
                    .map(|reference| {
                        Ok(ReferenceJson {
                            name: reference.name.clone(),
                            chunk: xfbin.chunk(reference.chunk)?.identity.clone(),
                        })
                    })
                    .collect::<Result<_>>()?,
                chunks,
            };
            let json = serde_json::to_string_pretty(&page_json)?;
            fs::write(page_dir.join(PAGE_JSON), json)?;
        }
    }

    pb.finish_with_message("Done");
    Ok(())
}

fn unpack_by_type(xfbin: &Xfbin, output: &Path, options: &UnpackOptions) -> Result<()> {
    let chunks_by_type = xfbin.type_chunk_map();
    let pb = progress_bar(chunks_by_type.values().map(Vec::len).sum())?;

    for (kind, ids) in &chunks_by_type {
        let type_dir = output.join(kind.tag().trim_start_matches("Chunk"));
        fs::create_dir_all(&type_dir)?;

        for &id in ids {
            let Some(page) = xfbin.chunk_page(id).map(|index| &xfbin.pages[index]) else {
                continue;
            };
            write_chunk(xfbin, page, id, &type_dir, options, &pb)?;
        }
    }

    pb.finish_with_message("Done");
    Ok(())
}

/// Page directories in name order, which is page order for unpacked output.
fn page_dirs(input: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(input).with_context(|| format!("Failed to read {}", input.display()))? {
        let path = entry?.path();
        if path.join(PAGE_JSON).is_file() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn cmd_repack(input: &Path, output: Option<PathBuf>, force_overwrite: bool) -> Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.xfbin", default_stem(input))));
    if !confirm_overwrite(&output, force_overwrite)? {
        println!("Aborting.");
        return Ok(());
    }

    let dirs = page_dirs(input)?;
    if dirs.is_empty() {
        anyhow::bail!("No page directories with {PAGE_JSON} found in {}", input.display());
    }

    let registry = ChunkRegistry::standard();
    let mut xfbin = Xfbin::new();
    let pb = progress_bar(dirs.len())?;

    for dir in &dirs {
        let json_path = dir.join(PAGE_JSON);
        let json = fs::read_to_string(&json_path)
            .with_context(|| format!("Failed to read {}", json_path.display()))?;
        let page_json: PageJson = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", json_path.display()))?;

        let references: Vec<(String, ChunkIdentity)> = page_json
            .chunk_references
            .into_iter()
            .map(|reference| (reference.name, reference.chunk))
            .collect();

        let mut chunks = Vec::with_capacity(page_json.chunks.len());
        for chunk in page_json.chunks {
            let path = dir.join(&chunk.file_name);
            debug!("Reading {} ...", path.display());
            let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            chunks.push((chunk.chunk, bytes));
        }

        xfbin
            .import_page(&registry, &page_json.chunk_maps, &references, &chunks)
            .with_context(|| format!("Failed to import {}", dir.display()))?;
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    let start = Instant::now();
    let bytes = xfbin.encode().context("Failed to encode XFBIN")?;
    fs::write(&output, &bytes).with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        "Wrote {} pages ({} bytes) to {} in {:?}",
        xfbin.pages.len(),
        bytes.len(),
        output.display(),
        start.elapsed()
    );

    println!("Done!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stem() {
        assert_eq!(default_stem(Path::new("data/1nrtbod1.xfbin")), "1nrtbod1");
        assert_eq!(default_stem(Path::new("spc/1nrt.anm.xfbin")), "1nrt");
    }

    #[test]
    fn test_chunk_file_name() {
        let texture = ChunkIdentity::new("nuccChunkTexture", "c/1nrt/tex/1nrt.nut", "1nrtbod1");
        assert_eq!(
            chunk_file_name(&texture, ChunkKind::Texture, false),
            "1nrtbod1.texture"
        );
        assert_eq!(chunk_file_name(&texture, ChunkKind::Texture, true), "1nrtbod1.nut");

        let binary = ChunkIdentity::new("nuccChunkBinary", "", "prm");
        assert_eq!(chunk_file_name(&binary, ChunkKind::Binary, true), "prm.binary");
    }

    #[test]
    fn test_page_json_keys() {
        let page = PageJson {
            chunk_maps: vec![ChunkIdentity::null()],
            chunk_references: vec![ReferenceJson {
                name: "bone".to_owned(),
                chunk: ChunkIdentity::new("nuccChunkCoord", "c/1nrt.max", "root"),
            }],
            chunks: vec![ChunkJson {
                file_name: "root.coord".to_owned(),
                chunk: ChunkIdentity::new("nuccChunkCoord", "c/1nrt.max", "root"),
            }],
        };

        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["Chunk Maps"][0]["Type"], "nuccChunkNull");
        assert_eq!(value["Chunk References"][0]["Name"], "bone");
        assert_eq!(value["Chunks"][0]["File Name"], "root.coord");
        assert_eq!(value["Chunks"][0]["Chunk"]["Path"], "c/1nrt.max");

        let back: PageJson = serde_json::from_value(value).unwrap();
        assert_eq!(back.chunks[0].chunk.name, "root");
    }
}
