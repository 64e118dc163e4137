use anyhow::{anyhow, Result};
use std::fmt::Write;
use url::Url;

use crate::aggregate::AggregatedEntry;
use crate::report::ReportView;
use crate::utils::format_number;

const WHOIS_BASE: &str = "https://whois.com/whois/";
const VIRUSTOTAL_BASE: &str = "https://www.virustotal.com/gui/ip-address/";
const SHODAN_BASE: &str = "https://www.shodan.io/search";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupLinks {
    pub whois: Url,
    pub virustotal: Url,
    pub shodan: Url,
}

fn with_segment(base: &str, segment: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("{} cannot take path segments", base))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

/// External lookup pages for an IP, with the IP percent-encoded.
pub fn lookup_links(ip: &str) -> Result<LookupLinks> {
    let mut shodan = Url::parse(SHODAN_BASE)?;
    shodan.query_pairs_mut().append_pair("query", ip);

    Ok(LookupLinks {
        whois: with_segment(WHOIS_BASE, ip)?,
        virustotal: with_segment(VIRUSTOTAL_BASE, ip)?,
        shodan,
    })
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Rows printed per prefix; all rows when `None`.
    pub top: Option<usize>,
    pub links: bool,
}

fn write_row(out: &mut String, entry: &AggregatedEntry, links: bool) -> Result<()> {
    writeln!(
        out,
        "{:<40} {:>9} {:<8} {:<30} {}",
        entry.ip,
        format_number(entry.count),
        entry.country,
        entry.netname,
        entry.description
    )?;

    if links {
        let links = lookup_links(&entry.ip)?;
        writeln!(out, "    whois: {}", links.whois)?;
        writeln!(out, "    virustotal: {}", links.virustotal)?;
        writeln!(out, "    shodan: {}", links.shodan)?;
    }
    Ok(())
}

pub fn render_text(view: &ReportView, options: &RenderOptions) -> Result<String> {
    let mut out = String::new();

    match (view.dates.first(), view.dates.last()) {
        (Some(first), Some(last)) => writeln!(
            out,
            "Available reports: {} ({} to {})",
            format_number(view.dates.len() as u64),
            first,
            last
        )?,
        _ => writeln!(out, "No reports available.")?,
    }

    let (results, start, end) = match (&view.results, view.start_date, view.end_date) {
        (Some(results), Some(start), Some(end)) => (results, start, end),
        _ => return Ok(out),
    };

    writeln!(out, "\n--- Top IPs from {} to {} ---", start, end)?;

    if results.is_empty() {
        writeln!(out, "No data for the selected range.")?;
        return Ok(out);
    }

    for (prefix, entries) in results.iter() {
        let shown = options.top.map_or(entries.len(), |top| top.min(entries.len()));
        writeln!(
            out,
            "\n=== {} ({} of {} IPs) ===",
            prefix,
            format_number(shown as u64),
            format_number(entries.len() as u64)
        )?;
        writeln!(
            out,
            "{:<40} {:>9} {:<8} {:<30} {}",
            "IP Address", "Count", "Country", "Netname", "Description"
        )?;
        writeln!(out, "{}", "-".repeat(100))?;

        for entry in entries.iter().take(shown) {
            write_row(&mut out, entry, options.links)?;
        }
    }

    Ok(out)
}
