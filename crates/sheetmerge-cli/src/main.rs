mod cli;
mod layout_cmd;
mod merge_cmd;
mod page_range;
mod serve_cmd;
mod server;
mod shared;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            host,
            port,
            template,
            max_upload_mb,
            output,
            layout,
            debug,
        } => {
            shared::init_tracing(if debug { "debug" } else { "info" });
            let config = server::ServerConfig {
                host,
                port,
                options: serve_cmd::default_options(layout.settings(), output),
                ..server::ServerConfig::new(template)
            }
            .with_max_upload_mb(max_upload_mb);
            serve_cmd::run(config)
        }
        Commands::Merge {
            ref template,
            ref excel,
            ref pdfs,
            ref output,
            zip,
            layout,
        } => {
            shared::init_tracing("warn");
            merge_cmd::run(
                template,
                excel,
                pdfs,
                output.as_deref(),
                zip,
                layout.settings(),
            )
        }
        Commands::Layout {
            ref file,
            ref pages,
            format,
            x_tolerance,
            layout,
        } => {
            shared::init_tracing("warn");
            layout_cmd::run(
                file,
                pages.as_deref(),
                format,
                x_tolerance,
                &layout.settings(),
            )
        }
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
