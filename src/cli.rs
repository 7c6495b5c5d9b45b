use clap::{Parser, Subcommand};

use crate::config::CliOverrides;

#[derive(Parser)]
#[command(
    name = "scrape-search",
    version,
    about = "Search products through a scraping API from the command line"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL (e.g., http://localhost:5001/api); overrides --env
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Which API to talk to: local or deployed (default: local)
    #[arg(long = "env", global = true)]
    pub environment: Option<String>,

    /// Request timeout in seconds (default: 30)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Currency symbol printed before prices (default: R$)
    #[arg(long, global = true)]
    pub currency: Option<String>,

    /// Check each product image and show a placeholder for broken ones
    #[arg(long, global = true)]
    pub check_images: bool,

    /// Print view states as JSON instead of Markdown
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose logging
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one search and print the outcome
    Search {
        /// Search term (e.g., "notebook", "usb hub")
        keyword: String,

        /// Max number of products to return, 1-50 (default: 20)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=50))]
        limit: Option<u32>,
    },

    /// Interactive session: type keywords, `:retry`, `:limit N`, `:quit`
    Shell {
        /// Starting product limit, 1-50 (default: 20)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=50))]
        limit: Option<u32>,
    },

    /// Check whether the API is reachable
    Health,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            api_base: self.api_base.clone(),
            environment: self.environment.clone(),
            timeout_secs: self.timeout,
            currency: self.currency.clone(),
            check_images: self.check_images,
            json: self.json,
        }
    }
}
