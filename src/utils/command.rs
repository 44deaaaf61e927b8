//! megahit argument building and version probing.

use std::path::Path;
use anyhow::{anyhow, Result};
use crate::config::defs::MEGAHIT_TAG;


pub mod megahit {
    use std::path::Path;
    use anyhow::anyhow;
    use log::debug;
    use tokio::process::Command;
    use crate::config::params::MegahitParams;

    /// Tool options forwarded to megahit. Every field is optional; zero, empty
    /// or missing values produce no flag.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct MegahitConfig {
        pub preset: Option<String>,
        pub min_count: Option<i64>,
        pub k_min: Option<i64>,
        pub k_max: Option<i64>,
        pub k_step: Option<i64>,
        pub k_list: Option<Vec<i64>>,
        pub min_contig_len: Option<i64>,
        pub threads: Option<usize>,
    }

    impl MegahitConfig {
        pub fn from_params(params: &MegahitParams, threads: Option<usize>) -> Self {
            let kmer = params.kmer_params.clone().unwrap_or_default();
            MegahitConfig {
                preset: params.megahit_parameter_preset.clone(),
                min_count: kmer.min_count,
                k_min: kmer.k_min,
                k_max: kmer.k_max,
                k_step: kmer.k_step,
                k_list: kmer.k_list,
                min_contig_len: params.min_contig_len,
                threads,
            }
        }
    }

    fn push_nonzero(args_vec: &mut Vec<String>, flag: &str, value: Option<i64>) {
        if let Some(v) = value.filter(|&v| v != 0) {
            args_vec.push(flag.to_string());
            args_vec.push(v.to_string());
        }
    }

    pub async fn megahit_presence_check(bin: &Path) -> anyhow::Result<String> {
        let output = Command::new(bin)
            .arg("--version")
            .output()
            .await
            .map_err(|e| anyhow!("Failed to spawn {}: {}. Is megahit installed?", bin.display(), e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout
            .lines()
            .next()
            .ok_or_else(|| anyhow!("No output from megahit --version"))?;
        // "MEGAHIT v1.2.9"
        let version = first_line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| anyhow!("Invalid megahit --version output: {}", first_line))?
            .trim_start_matches('v')
            .to_string();
        if version.is_empty() {
            return Err(anyhow!("Empty version number in megahit --version output: {}", first_line));
        }
        Ok(version)
    }

    /// Builds megahit's argument list for one paired-end run.
    ///
    /// An explicit k-mer list replaces min/max/step. A preset is always passed
    /// first so explicit k-mer flags can override it.
    pub fn arg_generator(config: &MegahitConfig, fwd: &Path, rev: &Path, out_dir: &Path) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("-1".to_string());
        args_vec.push(fwd.to_string_lossy().to_string());
        args_vec.push("-2".to_string());
        args_vec.push(rev.to_string_lossy().to_string());

        if let Some(preset) = config.preset.as_deref().filter(|p| !p.is_empty()) {
            args_vec.push("--presets".to_string());
            args_vec.push(preset.to_string());
        }

        push_nonzero(&mut args_vec, "--min-count", config.min_count);

        let k_list = config.k_list.as_ref().filter(|list| !list.is_empty());
        match k_list {
            Some(list) => {
                let joined: Vec<String> = list.iter().map(|k| k.to_string()).collect();
                args_vec.push("--k-list".to_string());
                args_vec.push(joined.join(","));
            }
            None => {
                push_nonzero(&mut args_vec, "--k-min", config.k_min);
                push_nonzero(&mut args_vec, "--k-max", config.k_max);
                push_nonzero(&mut args_vec, "--k-step", config.k_step);
            }
        }

        push_nonzero(&mut args_vec, "--min-contig-len", config.min_contig_len);

        if let Some(threads) = config.threads.filter(|&t| t > 0) {
            args_vec.push("--num-cpu-threads".to_string());
            args_vec.push(threads.to_string());
        }

        args_vec.push("-o".to_string());
        args_vec.push(out_dir.to_string_lossy().to_string());

        debug!("megahit args: {:?}", args_vec);
        args_vec
    }
}


pub async fn check_version(tool: &str, bin: &Path) -> Result<String> {
    let version = match tool {
        MEGAHIT_TAG => megahit::megahit_presence_check(bin).await,
        _ => return Err(anyhow!("Unknown tool: {}", tool)),
    };
    Ok(version?)
}
