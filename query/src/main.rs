use anyhow::{Context, Result};
use clap::Parser;
use query::{HtmlPage, LoadedIndex, QueryRunner, RunnerConfig, DEFAULT_TARGET_ID};
use search_core::persist::DEFAULT_GLOBAL_NAME;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "query", about = "Answer one search against a built index artifact")]
struct Args {
    /// Index artifact written by `indexer build`
    #[arg(long, default_value = "./search-index.js")]
    index: PathBuf,
    /// Global variable the artifact assigns
    #[arg(long, env = "SEARCH_INDEX_GLOBAL", default_value = DEFAULT_GLOBAL_NAME)]
    global_name: String,
    /// Page URL or query string carrying `q`
    #[arg(long, conflicts_with = "q")]
    url: Option<String>,
    /// Search term, as if passed in `q`
    #[arg(long)]
    q: Option<String>,
    /// HTML page to render into; prints the bare fragment when omitted
    #[arg(long)]
    page: Option<PathBuf>,
    /// Id of the element receiving the result list
    #[arg(long, default_value = DEFAULT_TARGET_ID)]
    target: String,
    #[arg(long, default_value = "/advisories/")]
    href_prefix: String,
    #[arg(long, default_value = ".html")]
    href_suffix: String,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let index = LoadedIndex::load(&args.index, &args.global_name)?;
    tracing::debug!(num_docs = index.num_docs(), "index loaded");
    let config = RunnerConfig { target_id: args.target, href_prefix: args.href_prefix, href_suffix: args.href_suffix };
    let runner = QueryRunner::new(index, config);

    let location = match (args.url, args.q) {
        (Some(url), _) => url,
        (None, Some(q)) => format!("?{}", url::form_urlencoded::Serializer::new(String::new()).append_pair("q", &q).finish()),
        (None, None) => String::new(),
    };

    match args.page {
        Some(path) => {
            let source = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            let mut page = HtmlPage::new(source);
            runner.run(&location, &mut page)?;
            println!("{}", page.into_string());
        }
        None => {
            let outcome = runner.run(&location, &mut FragmentOnly)?;
            println!("{}", outcome.fragment);
        }
    }
    Ok(())
}

/// Page that accepts any target and keeps nothing; the fragment comes back in the outcome.
struct FragmentOnly;

impl query::Page for FragmentOnly {
    fn set_inner_html(&mut self, _element_id: &str, _html: &str) -> Result<(), query::QueryError> {
        Ok(())
    }
}
