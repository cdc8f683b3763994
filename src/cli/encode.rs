//! `encode`: one file through the encode worker.

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    cli::EncodeArgs,
    encode::{BuiltinLoader, EncodeRequest, ImageData, ImageFormat, spawn_worker},
    log,
    utils::mime,
};

/// Used when neither `--format` nor an output extension names one.
const DEFAULT_FORMAT: &str = mime::types::WEBP;

pub fn run(args: &EncodeArgs) -> Result<()> {
    let format = target_format(args);
    let output = output_path(args, &format);

    let pixels = image::open(&args.input)
        .with_context(|| format!("failed to decode {}", args.input.display()))?
        .to_rgba8();
    let (width, height) = pixels.dimensions();
    let request = EncodeRequest::new(
        args.input.display().to_string(),
        ImageData::new(width, height, pixels.into_raw()),
        format,
        args.quality,
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let response = runtime.block_on(async move {
        let (worker, mut responses) = spawn_worker(Arc::new(BuiltinLoader));
        worker.post(request);
        let response = responses.recv().await;
        worker.terminate();
        response
    });

    let buffer = response
        .ok_or_else(|| anyhow!("encode worker stopped without responding"))?
        .into_result()
        .map_err(|e| anyhow!(e))?;

    fs::write(&output, &buffer)
        .with_context(|| format!("failed to write {}", output.display()))?;
    log!("encode"; "{} -> {} ({} bytes)", args.input.display(), output.display(), buffer.len());
    Ok(())
}

fn target_format(args: &EncodeArgs) -> String {
    if let Some(format) = &args.format {
        return format.clone();
    }
    args.output
        .as_deref()
        .map(mime::from_path)
        .filter(|m| ImageFormat::from_mime(m).is_some())
        .unwrap_or(DEFAULT_FORMAT)
        .to_string()
}

fn output_path(args: &EncodeArgs, format: &str) -> PathBuf {
    args.output.clone().unwrap_or_else(|| {
        let ext = ImageFormat::from_mime(format).map_or("bin", ImageFormat::extension);
        args.input.with_extension(ext)
    })
}
