use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "megahit-sets", version, about = "Assemble paired-end reads libraries or reads sets with MEGAHIT")]
pub struct Arguments {

    #[arg(short, long, help = "run_megahit, exec_megahit or status")]
    pub module: String,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,

    #[arg(short = 'p', long = "params", help = "JSON request parameters; '-' reads stdin")]
    pub params: Option<String>,

    #[arg(long, default_value = "scratch")]
    pub scratch: String,

    #[arg(long, default_value_t = false, help = "Stage megahit runs under --local-scratch and move results back to --scratch")]
    pub mac_test_mode: bool,

    #[arg(long, default_value = "/kb/module/local_scratch")]
    pub local_scratch: String,

    #[arg(long, default_value = "megahit")]
    pub megahit_bin: String,

    #[arg(long, default_value = "workspace", help = "Root directory of the local object store")]
    pub workspace_dir: String,

    #[arg(short = 't', long)]
    pub threads: Option<usize>,
}
