//! generate-issues - create a GitHub issue for every node of a DOT task graph.

use clap::Parser;
use colored::Colorize;
use issuegraph::{
    Config, DotDocument, GitHubClient, create_issues, github_token, logging, plan_issues,
};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "generate-issues")]
#[command(about = "Create a GitHub issue for every node of a DOT task graph")]
#[command(version)]
struct Cli {
    /// The path to the dot file containing the issues to create
    #[arg(long, default_value = "promcon_tasks.dot")]
    dotfile: PathBuf,

    /// The GitHub org which contains the issues [default: prometheus]
    #[arg(long)]
    github_org: Option<String>,

    /// The repo within the GitHub org which contains the issues [default: promcon]
    #[arg(long)]
    github_repo: Option<String>,

    /// Label attached to every created issue, repeatable [default: promcon-2019]
    #[arg(long)]
    github_label: Vec<String>,

    /// Node attribute used as the issue title [default: label]
    #[arg(long)]
    title_attribute: Option<String>,

    /// GitHub API base URL [default: https://api.github.com]
    #[arg(long)]
    api_url: Option<String>,

    /// Config file [default: ./issuegraph.yaml if present]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Validate the graph and print the issues without creating them
    #[arg(long)]
    dry_run: bool,

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
    if let Some(attr) = &cli.title_attribute {
        config.title_attribute = attr.clone();
    }
    if let Some(url) = &cli.api_url {
        config.github.api_url = url.clone();
    }

    config.validate().unwrap_or_else(|e| fail(e));
    config.require_labels().unwrap_or_else(|e| fail(e));
    config
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = load_config(&cli);

    let doc = DotDocument::load(&cli.dotfile).unwrap_or_else(|e| fail(e));

    // Every node must have a title before anything is created.
    let planned = plan_issues(&doc, &config.title_attribute, &config.github.labels)
        .unwrap_or_else(|e| fail(e));
    let repo = config.repo_ref();

    if cli.dry_run {
        println!(
            "{}",
            format!("Would create {} issue(s) in {}:", planned.len(), repo).bold()
        );
        for (node, issue) in &planned {
            println!("  {} {} {}", node.cyan(), issue.title, issue.body.dimmed());
        }
        return;
    }

    let token = github_token().unwrap_or_else(|e| fail(e));
    let client = GitHubClient::new(&config.github.api_url, &token).unwrap_or_else(|e| fail(e));
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fail(format!("Failed to create runtime: {}", e)));

    match rt.block_on(create_issues(&client, &repo, &planned)) {
        Ok(created) => {
            for issue in &created {
                println!("  {} {}", format!("#{}", issue.number).cyan(), issue.html_url);
            }
            println!(
                "{}",
                format!("Created {} issue(s) in {}", created.len(), repo).green()
            );
        }
        Err(e) => fail(e),
    }
}
