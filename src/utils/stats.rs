//! Contig length summaries for the run report.


/// Helper function to compute Nx (e.g., N50, N75)
///
/// # Arguments
///
/// - `lengths`: Contig lengths, sorted longest first.
/// - `fraction`: The threshold i.e. the '50' in N50.
///
/// # Returns
///
/// The Nx length.
pub fn compute_nx(lengths: &[u64], fraction: f64) -> u64 {
    let total: u64 = lengths.iter().sum();
    let target = (total as f64 * fraction).ceil() as u64;
    let mut cumsum = 0;
    for &len in lengths {
        cumsum += len;
        if cumsum >= target {
            return len;
        }
    }
    0
}


#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub count: usize,
    pub lo: f64,
    pub hi: f64,
}

/// Equal-width histogram over `[min, max]`, last bin closed.
///
/// When every value is equal the range is widened by half a unit each way,
/// so a single-length assembly still gets `bins` well-formed edges.
pub fn length_histogram(lengths: &[usize], bins: usize) -> Vec<HistogramBin> {
    if lengths.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut lo = *lengths.iter().min().unwrap_or(&0) as f64;
    let mut hi = *lengths.iter().max().unwrap_or(&0) as f64;
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &len in lengths {
        let idx = (((len as f64 - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            count,
            lo: lo + width * i as f64,
            hi: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
        })
        .collect()
}


#[derive(Debug, Clone, PartialEq)]
pub struct ContigStats {
    pub num_contigs: usize,
    pub total_length: usize,
    pub mean_length: f64,
    pub n50: usize,
    pub histogram: Vec<HistogramBin>,
}

impl ContigStats {
    pub fn from_lengths(lengths: &[usize], bins: usize) -> Self {
        let num_contigs = lengths.len();
        let total_length: usize = lengths.iter().sum();
        let mean_length = if num_contigs > 0 {
            total_length as f64 / num_contigs as f64
        } else {
            0.0
        };

        let mut sorted: Vec<u64> = lengths.iter().map(|&len| len as u64).collect();
        sorted.sort_by(|a, b| b.cmp(a));
        let n50 = compute_nx(&sorted, 0.5) as usize;

        ContigStats {
            num_contigs,
            total_length,
            mean_length,
            n50,
            histogram: length_histogram(lengths, bins),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts_sum_to_total() {
        let lengths = vec![200, 250, 300, 1000, 1500, 2200, 2200, 5000];
        let hist = length_histogram(&lengths, 10);
        assert_eq!(hist.len(), 10);
        assert_eq!(hist.iter().map(|b| b.count).sum::<usize>(), lengths.len());
        assert_eq!(hist[0].lo, 200.0);
        assert_eq!(hist[9].hi, 5000.0);
        // max lands in the closed last bin
        assert!(hist[9].count >= 1);
    }

    #[test]
    fn test_histogram_single_value() {
        let hist = length_histogram(&[500, 500, 500], 10);
        assert_eq!(hist.iter().map(|b| b.count).sum::<usize>(), 3);
        assert_eq!(hist[0].lo, 499.5);
        assert_eq!(hist[9].hi, 500.5);
        assert_eq!(hist[5].count, 3);
    }

    #[test]
    fn test_histogram_empty() {
        assert!(length_histogram(&[], 10).is_empty());
    }

    #[test]
    fn test_contig_stats() {
        let stats = ContigStats::from_lengths(&[100, 400, 300, 200], 10);
        assert_eq!(stats.num_contigs, 4);
        assert_eq!(stats.total_length, 1000);
        assert_eq!(stats.mean_length, 250.0);
        assert_eq!(stats.n50, 300);
    }

    #[test]
    fn test_compute_nx() {
        assert_eq!(compute_nx(&[50, 30, 20], 0.5), 50);
        assert_eq!(compute_nx(&[50, 30, 20], 0.75), 30);
        assert_eq!(compute_nx(&[], 0.5), 0);
    }
}
