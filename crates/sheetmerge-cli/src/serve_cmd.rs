use sheetmerge::MergeOptions;

use crate::server::{ServerConfig, serve};

pub fn run(config: ServerConfig) -> Result<(), i32> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| {
        eprintln!("Error: failed to start async runtime: {e}");
        1
    })?;

    runtime.block_on(serve(config)).map_err(|e| {
        tracing::error!(error = %format!("{e:#}"), "server stopped");
        eprintln!("Error: {e:#}");
        1
    })
}

/// Merge options for requests that do not pick an output format.
pub fn default_options(
    layout: sheetmerge::LayoutSettings,
    output: sheetmerge::OutputFormat,
) -> MergeOptions {
    MergeOptions {
        layout,
        output,
        ..MergeOptions::default()
    }
}
