use crate::error::CliError;
use crate::util::{
    canonicalize_cli_path, existing_cli_path, find_all_files, for_each_entry, relative_key,
    Throughput,
};
use argh::FromArgs;
use bytesize::ByteSize;
use futures::executor::block_on;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};
use texture_ingest_api::{
    CompressionExtension, ExtensionSet, FileSource, IngestConfig, RegisteredTextures,
    SchedulerConfig, StaticSource, TextureIngest, TranscoderModuleFactory, TranscoderSource,
};
use tracing::{debug, info};

#[derive(FromArgs, Debug)]
/// Decode every texture in a directory and write each mip level as a raw file
#[argh(subcommand, name = "transcode")]
pub struct TranscodeCmd {
    /// input directory path
    #[argh(option, from_str_fn(existing_cli_path))]
    pub input: PathBuf,

    /// output directory path
    #[argh(option, from_str_fn(canonicalize_cli_path))]
    pub output: PathBuf,

    /// comma-separated compression extensions the target GPU supports
    /// (s3tc, s3tc_srgb, etc, etc1, pvrtc, atc, astc or none) [default: s3tc]
    #[argh(option, default = "ExtensionSet::empty().with(CompressionExtension::S3tc)", from_str_fn(parse_extensions))]
    pub extensions: ExtensionSet,

    /// number of transcode worker threads, 0 transcodes on the calling thread
    /// [default: available cores, at most 4]
    #[argh(option)]
    pub workers: Option<usize>,

    /// file handed to the transcoder on initialization
    #[argh(option)]
    pub transcoder: Option<PathBuf>,

    /// also decode KTX key/value metadata
    #[argh(switch)]
    pub metadata: bool,
}

/// Parses `s3tc,etc1`-style lists; `none` selects no extension.
pub fn parse_extensions(value: &str) -> Result<ExtensionSet, String> {
    let mut set = ExtensionSet::empty();
    for name in value.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        if name.eq_ignore_ascii_case("none") {
            continue;
        }
        let extension = CompressionExtension::from_name(name)
            .ok_or_else(|| format!("Unknown compression extension: {name}"))?;
        set.insert(extension);
    }
    Ok(set)
}

pub fn handle_transcode_command(cmd: TranscodeCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut entries = Vec::new();
    find_all_files(&cmd.input, &mut entries)?;

    if entries.is_empty() {
        println!("No files found in input directory.");
        return Ok(());
    }

    let scheduler = match cmd.workers {
        Some(workers) => SchedulerConfig::default().with_worker_count(workers),
        None => SchedulerConfig::default(),
    };
    let config = IngestConfig::default().with_scheduler(scheduler);
    let config = config.with_ktx_options(config.ktx.with_key_value_data(cmd.metadata));
    let source: Arc<dyn TranscoderSource> = match &cmd.transcoder {
        Some(path) => Arc::new(FileSource::new(path.clone())),
        None => Arc::new(StaticSource::new(BUILTIN_TRANSCODER_PAYLOAD)),
    };
    let ingest = TextureIngest::new(config, transcoder_factory(), source);

    let profile = ingest.capabilities(&cmd.extensions);
    info!(
        with_alpha = ?profile.default_format_with_alpha,
        no_alpha = ?profile.default_format_no_alpha,
        fallback_required = profile.fallback_required,
        "Transcode targets"
    );

    let start = Instant::now();
    let bytes_read = AtomicU64::new(0);
    let bytes_written = AtomicU64::new(0);

    let succeeded = for_each_entry(&entries, |entry| {
        let path = entry.path();
        let data = fs::read(&path)?;
        bytes_read.fetch_add(data.len() as u64, Ordering::Relaxed);

        let written = transcode_file(
            &ingest,
            &path,
            data,
            &cmd.input,
            &cmd.output,
            &cmd.extensions,
        )?;
        bytes_written.fetch_add(written, Ordering::Relaxed);
        Ok(())
    });

    let elapsed = start.elapsed();
    let total_read = bytes_read.load(Ordering::Relaxed);
    println!("\n=== Transcode Complete ===");
    println!("Files: {succeeded}/{}", entries.len());
    println!("Time taken: {elapsed:.2?}");
    println!("Data read: {}", ByteSize(total_read));
    println!(
        "Data written: {}",
        ByteSize(bytes_written.load(Ordering::Relaxed))
    );
    println!("Throughput: {}", Throughput::measure(total_read, elapsed));

    Ok(())
}

/// Loads one file through `ingest` and writes its levels below `output_dir`.
///
/// Level `n` of the resource keyed `k` lands in `{output_dir}/{k}.mip{n}.bin`. Returns the
/// number of bytes written.
pub fn transcode_file(
    ingest: &TextureIngest,
    path: &Path,
    data: Vec<u8>,
    input_dir: &Path,
    output_dir: &Path,
    extensions: &ExtensionSet,
) -> Result<u64, CliError> {
    let key = relative_key(path, input_dir);
    let textures = block_on(ingest.load(&key, data, extensions)).map_err(|source| {
        CliError::Ingest {
            path: path.to_path_buf(),
            source,
        }
    })?;
    write_levels(&textures, output_dir)
}

fn write_levels(textures: &RegisteredTextures, output_dir: &Path) -> Result<u64, CliError> {
    let mut written = 0;
    for resource in textures.resources() {
        for level in &resource.levels {
            let target = output_dir.join(format!(
                "{}.mip{}.bin",
                resource.cache_key, level.level_index
            ));
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, &level.bytes)?;
            written += level.bytes.len() as u64;
        }
        debug!(
            key = resource.cache_key.as_str(),
            format = ?resource.format,
            levels = resource.levels.len(),
            "Wrote texture"
        );
    }
    Ok(written)
}

/// Handed to the built-in transcoder, which only checks that a payload is present.
const BUILTIN_TRANSCODER_PAYLOAD: &[u8] = b"basis-universal";

#[cfg(feature = "basis-universal")]
fn transcoder_factory() -> Arc<dyn TranscoderModuleFactory> {
    Arc::new(texture_ingest_api::NativeTranscoder)
}

#[cfg(not(feature = "basis-universal"))]
fn transcoder_factory() -> Arc<dyn TranscoderModuleFactory> {
    Arc::new(UnavailableTranscoder)
}

/// Stands in for the native transcoder in builds without it. KTX and DDS files still load.
#[cfg(not(feature = "basis-universal"))]
struct UnavailableTranscoder;

#[cfg(not(feature = "basis-universal"))]
impl TranscoderModuleFactory for UnavailableTranscoder {
    fn instantiate(
        &self,
        _payload: &[u8],
    ) -> Result<Box<dyn texture_ingest_basis::TranscoderModule>, texture_ingest_basis::NativeError>
    {
        Err(texture_ingest_basis::NativeError::new(
            "built without the `basis-universal` feature",
        ))
    }
}
