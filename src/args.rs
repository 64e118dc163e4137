use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "top-ips",
    about = "Merge daily top-IP reports over a date range and rank them per prefix",
    version,
    long_about = None
)]
pub struct Args {
    /// Directory holding the YYYY-MM-DD.json reports
    #[arg(short, long, default_value = "/var/www/top_ips/data")]
    pub data_dir: PathBuf,

    /// First day of the range (YYYY-MM-DD); defaults to the earliest report
    #[arg(short, long)]
    pub start_date: Option<String>,

    /// Last day of the range (YYYY-MM-DD); defaults to the latest report
    #[arg(short, long)]
    pub end_date: Option<String>,

    /// Number of top IPs to display per prefix
    #[arg(short, long)]
    pub top: Option<usize>,

    /// Print the merged view as JSON
    #[arg(long)]
    pub json: bool,

    /// Show Whois, VirusTotal and Shodan links for each IP
    #[arg(long)]
    pub links: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of worker threads for loading reports
    #[arg(short, long)]
    pub workers: Option<usize>,
}
