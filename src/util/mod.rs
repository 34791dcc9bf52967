use anyhow::Context;
use indicatif::ProgressStyle;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Shared styling for the scoring progress bar
pub fn get_progress_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {bar:40.green/white} {pos}/{len} pairs; ETA: {eta_precise}")
        .unwrap()
        .progress_chars("##-")
}

/// Saves a serializable struct to pretty-printed JSON.
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - user provided path to write to
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> anyhow::Result<()> {
    let file = File::create(out_filename)
        .with_context(|| format!("Error while creating {out_filename:?}:"))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .with_context(|| format!("Error while serializing {out_filename:?}:"))?;
    writer.flush()
        .with_context(|| format!("Error while flushing output to {out_filename:?}:"))?;
    Ok(())
}
