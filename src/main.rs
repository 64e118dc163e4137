use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use tracing::{error, info};

use top_ips::render::{render_text, RenderOptions};
use top_ips::utils::{setup_logging, validate_args};
use top_ips::{build_view, AggregateOptions, Args, DirStore};

fn run(args: &Args) -> Result<()> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "top_ips", data_dir = ?args.data_dir, "Building top IP report");

    let store = DirStore::new(&args.data_dir);
    let options = AggregateOptions {
        workers: args.workers,
    };
    let view = build_view(
        &store,
        args.start_date.as_deref(),
        args.end_date.as_deref(),
        &options,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        let text = render_text(
            &view,
            &RenderOptions {
                top: args.top,
                links: args.links,
            },
        )?;
        print!("{}", text);
    }

    info!(
        action = "complete",
        component = "top_ips",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Report completed"
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    validate_args(&args)?;

    if let Err(e) = run(&args) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
