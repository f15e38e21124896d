//! tasks-state-graph - color a DOT task graph by the state of its GitHub issues.

use clap::Parser;
use colored::Colorize;
use issuegraph::{
    AnnotateOptions, Config, DotDocument, DuplicatePolicy, GitHubClient, IssueFilter, StateFilter,
    github_token, list_issues, logging, reconcile,
};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::process;
use tracing::info;

#[derive(Parser)]
#[command(name = "tasks-state-graph")]
#[command(about = "Color the nodes of a DOT task graph by the state of their GitHub issues")]
#[command(version)]
struct Cli {
    /// The path to the input dot file
    #[arg(long, default_value = "promcon_tasks.dot")]
    dotfile_in: PathBuf,

    /// The path to the output dot file
    #[arg(long, default_value = "promcon_tasks_colored.dot")]
    dotfile_out: PathBuf,

    /// The GitHub org which contains the issues [default: prometheus]
    #[arg(long)]
    github_org: Option<String>,

    /// The repo within the GitHub org which contains the issues [default: promcon]
    #[arg(long)]
    github_repo: Option<String>,

    /// The label by which to select issues, repeatable [default: promcon-2019]
    #[arg(long)]
    github_label: Vec<String>,

    /// Raw query parameters for the issue listing, e.g. "labels=a,b&milestone=3"
    #[arg(long)]
    query: Option<String>,

    /// Issue state to select: all, open, closed [default: all]
    #[arg(long)]
    state: Option<StateFilter>,

    /// Issues requested per page [default: 100]
    #[arg(long)]
    per_page: Option<u32>,

    /// Fill color for nodes whose issue is open [default: coral]
    #[arg(long)]
    open_color: Option<String>,

    /// Fill color for nodes whose issue is closed [default: chartreuse]
    #[arg(long)]
    closed_color: Option<String>,

    /// Fill color for nodes without an issue; unset leaves them untouched
    #[arg(long)]
    unmatched_color: Option<String>,

    /// What to do when several issues carry the same node ID: keep-last, keep-first, error
    #[arg(long)]
    on_duplicate: Option<DuplicatePolicy>,

    /// GitHub API base URL [default: https://api.github.com]
    #[arg(long)]
    api_url: Option<String>,

    /// Config file [default: ./issuegraph.yaml if present]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn fail(detail: impl Display) -> ! {
    eprintln!("{}", format!("Error: {}", detail).red());
    process::exit(1);
}

fn load_config(cli: &Cli) -> Config {
    let cwd = env::current_dir().unwrap_or_else(|e| fail(e));
    let mut config = Config::discover(cli.config.as_deref(), &cwd).unwrap_or_else(|e| fail(e));

    if let Some(owner) = &cli.github_org {
        config.github.owner = owner.clone();
    }
    if let Some(repo) = &cli.github_repo {
        config.github.repo = repo.clone();
    }
    if !cli.github_label.is_empty() {
        config.github.labels = cli.github_label.clone();
    }
    if let Some(query) = &cli.query {
        config.github.query = Some(query.clone());
    }
    if let Some(state) = cli.state {
        config.github.state = state;
    }
    if let Some(per_page) = cli.per_page {
        config.github.per_page = per_page;
    }
    if let Some(url) = &cli.api_url {
        config.github.api_url = url.clone();
    }
    if let Some(color) = &cli.open_color {
        config.colors.open = color.clone();
    }
    if let Some(color) = &cli.closed_color {
        config.colors.closed = color.clone();
    }
    if let Some(color) = &cli.unmatched_color {
        config.colors.unmatched = Some(color.clone());
    }
    if let Some(policy) = cli.on_duplicate {
        config.duplicates = policy;
    }

    config.validate().unwrap_or_else(|e| fail(e));
    config
}

fn build_filter(config: &Config) -> IssueFilter {
    let mut filter = IssueFilter {
        labels: config.github.labels.clone(),
        state: config.github.state,
        extra: Vec::new(),
    };
    if let Some(query) = &config.github.query {
        filter.extend_with_query(query).unwrap_or_else(|e| fail(e));
    }
    filter
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = load_config(&cli);
    let filter = build_filter(&config);

    let mut doc = DotDocument::load(&cli.dotfile_in).unwrap_or_else(|e| fail(e));

    let token = github_token().unwrap_or_else(|e| fail(e));
    let client = GitHubClient::new(&config.github.api_url, &token).unwrap_or_else(|e| fail(e));
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fail(format!("Failed to create runtime: {}", e)));

    let repo = config.repo_ref();
    info!(repo = %repo, "Fetching issues from GitHub");
    let issues = rt
        .block_on(list_issues(&client, &repo, &filter, config.github.per_page))
        .unwrap_or_else(|e| fail(format!("Error fetching issues from GitHub: {}", e)));
    println!("{}", format!("Found {} issue(s) in {}", issues.len(), repo).dimmed());

    let options = AnnotateOptions {
        colors: config.colors.clone(),
        duplicates: config.duplicates,
    };
    let report = reconcile(&mut doc, &issues, &options).unwrap_or_else(|e| fail(e));

    doc.save(&cli.dotfile_out).unwrap_or_else(|e| fail(e));

    println!(
        "{}",
        format!(
            "Annotated {} node(s), {} without an issue",
            report.annotated.len(),
            report.unmatched.len()
        )
        .green()
    );
    if !report.skipped_issues.is_empty() {
        println!(
            "{}",
            format!(
                "Skipped {} issue(s) without a node-id marker",
                report.skipped_issues.len()
            )
            .yellow()
        );
    }
    if !report.duplicates.is_empty() {
        println!(
            "{}",
            format!(
                "Node IDs claimed by more than one issue: {}",
                report.duplicates.join(", ")
            )
            .yellow()
        );
    }
    println!(
        "{}",
        format!("Wrote {}", cli.dotfile_out.display()).dimmed()
    );
}
