use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "yieldscope", bin_name = "yieldscope", version, about)]
pub struct Cli {
    /// JSON-RPC endpoint, takes precedence over the configured one
    #[arg(long, global = true, env = "YIELDSCOPE_RPC")]
    pub rpc: Option<String>,

    /// Print machine readable JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconstruct the yield history of every staking position an account holds
    #[command(alias = "a")]
    Analyze {
        address: String,

        /// Days to look back, defaults to the configured lookback
        #[arg(short, long)]
        days: Option<u32>,

        /// Analyze these staking tokens instead of discovering the held ones
        #[arg(long = "asset")]
        assets: Vec<String>,
    },

    /// Base fee statistics over the last mined blocks
    Gas,

    /// USD prices of the watch list tokens
    Prices,

    /// Native and watch list token balances of an account
    Balances { address: String },

    /// Show or change the stored configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the configuration files and their contents
    Show,

    /// Store the JSON-RPC endpoint used when --rpc is not passed
    SetRpc { url: String },
}
