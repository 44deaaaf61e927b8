use std::fmt::Write;
use crate::utils::stats::ContigStats;


/// What the report needs to know about one stored assembly.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub library_name: String,
    pub workspace_name: String,
    pub assembly_name: String,
    pub stats: ContigStats,
}


/// Builds the plain-text run summary, one block per assembly.
pub fn report_text(entries: &[ReportEntry]) -> String {
    let mut report = String::new();
    for entry in entries {
        // writes to a String cannot fail
        let _ = write_entry(&mut report, entry);
    }
    report
}

fn write_entry(report: &mut String, entry: &ReportEntry) -> std::fmt::Result {
    writeln!(report, "MEGAHIT run for Read Library: {}", entry.library_name)?;
    writeln!(report, "-------------------------------------------------------------")?;
    writeln!(report)?;
    writeln!(report, "ContigSet saved to: {}/{}", entry.workspace_name, entry.assembly_name)?;
    writeln!(report, "Assembled into {} contigs.", entry.stats.num_contigs)?;
    if entry.stats.num_contigs == 0 {
        writeln!(report)?;
        return Ok(());
    }
    writeln!(report, "Avg Length: {:.1} bp.", entry.stats.mean_length)?;
    writeln!(report, "N50: {} bp.", entry.stats.n50)?;
    writeln!(report, "Contig Length Distribution (# of contigs -- min to max basepairs):")?;
    for bin in &entry.stats.histogram {
        writeln!(report, "   {}\t--\t{:.1} to {:.1} bp", bin.count, bin.lo, bin.hi)?;
    }
    writeln!(report)
}
