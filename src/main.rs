//! refguard command line
//!
//! Answers protected ref access questions against a project policy file.

use clap::{Parser, Subcommand};
use refguard::{
    access_control::{
        AccessRequest, Actor, GroupId, ProtectedAction, ProtectedRefRegistry, RefKind, RoleTier,
    },
    config::{AppConfig, LogFormat, load_config},
    output::{OutputFormat, render_decision, render_protection, render_specs},
};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Protected branch and tag access evaluation
#[derive(Parser, Debug)]
#[command(name = "refguard")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "REFGUARD_CONFIG", global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "REFGUARD_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether an actor may push, merge or unprotect a ref
    Check {
        /// Ref name
        #[arg(long = "ref")]
        ref_name: String,

        /// Action (push, merge, unprotect)
        #[arg(long)]
        action: ProtectedAction,

        /// Actor user id
        #[arg(long)]
        user: u64,

        /// Actor's maximum role in the project
        #[arg(long, default_value = "no_access")]
        role: RoleTier,

        /// Actor is an instance administrator
        #[arg(long)]
        admin: bool,

        /// Group the actor belongs to (repeatable)
        #[arg(long = "group")]
        groups: Vec<GroupId>,

        /// Deploy key the actor authenticates with
        #[arg(long)]
        deploy_key: Option<u64>,

        /// Treat the ref as a tag
        #[arg(long)]
        tag: bool,
    },

    /// Report whether refs are protected
    Protected {
        /// Ref names
        #[arg(required = true)]
        refs: Vec<String>,

        /// Treat the refs as tags
        #[arg(long)]
        tag: bool,
    },

    /// List protected refs
    List {
        /// Case-insensitive name filter
        #[arg(long)]
        search: Option<String>,

        /// Only list tags (branches otherwise)
        #[arg(long)]
        tag: bool,
    },
}

fn ref_kind(tag: bool) -> RefKind {
    if tag { RefKind::Tag } else { RefKind::Branch }
}

fn init_logging(config: &AppConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn run(args: Args, config: AppConfig) -> anyhow::Result<ExitCode> {
    let project = config.snapshot();
    let evaluator = config.evaluator();
    debug!(
        specs = project.specs.len(),
        extensions = ?evaluator.extension_names(),
        "Loaded project policy"
    );

    match args.command {
        Command::Check {
            ref_name,
            action,
            user,
            role,
            admin,
            groups,
            deploy_key,
            tag,
        } => {
            let mut actor = Actor::new(user, role).with_groups(groups);
            actor.admin = admin;
            actor.deploy_key = deploy_key;

            let request = AccessRequest::new(&actor, action, &ref_name, ref_kind(tag));
            let decision = evaluator.evaluate(&request, &project);
            info!(%decision, "Evaluated access");
            println!("{}", render_decision(args.output, &request, &decision));

            Ok(if decision.is_allowed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Protected { refs, tag } => {
            let registry = ProtectedRefRegistry::new(&project.specs);
            let kind = ref_kind(tag);
            let results: Vec<(String, bool)> = refs
                .into_iter()
                .map(|name| {
                    let protected = registry.is_protected(&name, kind, &project.state);
                    (name, protected)
                })
                .collect();
            println!("{}", render_protection(args.output, &results));
            Ok(ExitCode::SUCCESS)
        }
        Command::List { search, tag } => {
            let registry = ProtectedRefRegistry::new(&project.specs);
            let kind = ref_kind(tag);
            let specs: Vec<_> = match search.as_deref() {
                Some(query) => registry.by_name(query),
                None => registry.specs().iter().collect(),
            }
            .into_iter()
            .filter(|spec| spec.kind == kind)
            .collect();
            println!("{}", render_specs(args.output, &specs));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("refguard: {}", e);
            return Ok(ExitCode::from(2));
        }
    };

    init_logging(&config, args.log_level.as_deref());

    run(args, config).inspect_err(|e| error!(error = %e, "Command failed"))
}
