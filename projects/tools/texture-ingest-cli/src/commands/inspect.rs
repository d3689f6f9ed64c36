use crate::error::CliError;
use crate::util::{existing_cli_path, find_all_files, for_each_entry, relative_key, Throughput};
use argh::FromArgs;
use bytesize::ByteSize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};
use texture_ingest_api::ContainerKind;
use texture_ingest_common::{FormatError, ParsedContainer};
use texture_ingest_dds::parse_dds;
use texture_ingest_ktx::{parse_ktx_with_options, KtxParseOptions};

#[derive(FromArgs, Debug)]
/// Print the format, images and mip levels of every texture in a directory
#[argh(subcommand, name = "inspect")]
pub struct InspectCmd {
    /// input directory path
    #[argh(option, from_str_fn(existing_cli_path))]
    pub input: PathBuf,

    /// also print KTX key/value metadata
    #[argh(switch)]
    pub metadata: bool,
}

pub fn handle_inspect_command(cmd: InspectCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut entries = Vec::new();
    find_all_files(&cmd.input, &mut entries)?;

    if entries.is_empty() {
        println!("No files found in input directory.");
        return Ok(());
    }

    let options = KtxParseOptions::default().with_key_value_data(cmd.metadata);
    let start = Instant::now();
    let bytes_processed = AtomicU64::new(0);

    let succeeded = for_each_entry(&entries, |entry| {
        let path = entry.path();
        let data = fs::read(&path)?;
        bytes_processed.fetch_add(data.len() as u64, Ordering::Relaxed);

        let key = relative_key(&path, &cmd.input);
        println!("{}", describe_file(&path, &key, &data, options)?);
        Ok(())
    });

    let elapsed = start.elapsed();
    let total_bytes = bytes_processed.load(Ordering::Relaxed);
    println!("\n=== Inspect Complete ===");
    println!("Files: {succeeded}/{}", entries.len());
    println!("Time taken: {elapsed:.2?}");
    println!("Data processed: {}", ByteSize(total_bytes));
    println!("Throughput: {}", Throughput::measure(total_bytes, elapsed));

    Ok(())
}

/// One report block for a texture file.
pub fn describe_file(
    path: &Path,
    key: &str,
    data: &[u8],
    options: KtxParseOptions,
) -> Result<String, CliError> {
    let kind = ContainerKind::detect(key, data)
        .ok_or_else(|| CliError::UnknownContainer(path.to_path_buf()))?;

    let format_error = |source: FormatError| CliError::Format {
        path: path.to_path_buf(),
        source,
    };
    let parsed = match kind {
        ContainerKind::Ktx => parse_ktx_with_options(data, options).map_err(format_error)?,
        ContainerKind::Dds => parse_dds(data).map_err(format_error)?,
        // Basis payloads are opaque until transcoded.
        ContainerKind::Basis => {
            return Ok(format!("{key}: Basis, {}", ByteSize(data.len() as u64)));
        }
    };

    Ok(describe_container(key, kind, data.len(), &parsed))
}

fn describe_container(
    key: &str,
    kind: ContainerKind,
    file_len: usize,
    parsed: &ParsedContainer,
) -> String {
    let mut report = format!(
        "{key}: {kind:?} {:?}, {} image(s), {}",
        parsed.format,
        parsed.images.len(),
        ByteSize(file_len as u64)
    );
    for image in &parsed.images {
        report.push_str(&format!(
            "\n  image {}: {}x{}, {} level(s), {}",
            image.image_index,
            image.width,
            image.height,
            image.level_count(),
            ByteSize(image.byte_len() as u64)
        ));
    }
    if let Some(metadata) = &parsed.key_value_data {
        for (name, value) in metadata.iter() {
            match metadata.get_str(name) {
                Some(text) => report.push_str(&format!("\n  {name} = {text}")),
                None => report.push_str(&format!("\n  {name} = <{} bytes>", value.len())),
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_fixtures::{dxt1_dds, rgba8_ktx};

    #[test]
    fn describes_dds_images() {
        let report = describe_file(
            Path::new("stone.dds"),
            "stone.dds",
            &dxt1_dds(16),
            KtxParseOptions::default(),
        )
        .unwrap();
        assert!(report.starts_with("stone.dds: Dds"));
        assert!(report.contains("image 0: 16x16, 1 level(s)"));
    }

    #[test]
    fn describes_ktx_metadata_when_requested() {
        let data = rgba8_ktx(4, &[("KTXorientation", &b"S=r,T=d\0"[..])]);
        let options = KtxParseOptions::default().with_key_value_data(true);

        let report = describe_file(Path::new("a.ktx"), "a.ktx", &data, options).unwrap();
        assert!(report.contains("image 0: 4x4, 1 level(s)"));
        assert!(report.contains("KTXorientation = S=r,T=d"));
    }

    #[test]
    fn basis_files_report_size_only() {
        let report = describe_file(
            Path::new("foo.basis"),
            "foo.basis",
            b"sB\0\0",
            KtxParseOptions::default(),
        )
        .unwrap();
        assert_eq!(report, format!("foo.basis: Basis, {}", ByteSize(4)));
    }

    #[test]
    fn unknown_files_are_errors() {
        let result = describe_file(
            Path::new("notes.txt"),
            "notes.txt",
            b"hello",
            KtxParseOptions::default(),
        );
        assert!(matches!(result, Err(CliError::UnknownContainer(_))));
    }
}
