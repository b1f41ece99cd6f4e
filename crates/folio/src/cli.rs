//! Clap derive structures for the `folio` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// folio -- admin client for a personal portfolio site
#[derive(Debug, Parser)]
#[command(
    name = "folio",
    version,
    about = "Manage portfolio projects and blog posts from the command line",
    long_about = "Admin client for a personal portfolio backend.\n\n\
        Reads are public; creating, editing, and deleting projects or blog\n\
        posts requires logging in first (folio login).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "FOLIO_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL including any path prefix (overrides profile)
    #[arg(long, short = 'u', env = "FOLIO_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FOLIO_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "FOLIO_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "FOLIO_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the auth token for this profile
    Login(LoginArgs),

    /// Forget the stored auth token
    Logout,

    /// Create a new account on the backend
    Register(RegisterArgs),

    /// Show the active profile and login state
    Status,

    /// Manage portfolio projects
    #[command(alias = "proj", alias = "p")]
    Projects(ProjectsArgs),

    /// Manage blog posts
    #[command(alias = "post", alias = "blog")]
    Posts(PostsArgs),

    /// View registered users
    Users(UsersArgs),

    /// Render the admin dashboard (both collections plus notices)
    #[command(alias = "dash")]
    Dashboard,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Username (defaults to the profile's, then FOLIO_USERNAME, then a prompt)
    #[arg(long)]
    pub username: Option<String>,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Username for the new account
    pub username: String,
}

// ── Projects ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProjectsArgs {
    #[command(subcommand)]
    pub command: ProjectsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProjectsCommand {
    /// List all projects
    #[command(alias = "ls")]
    List,

    /// Show one project
    Get {
        /// Project ID
        id: i64,
    },

    /// Add a project
    #[command(alias = "create")]
    Add {
        /// Project name
        #[arg(long)]
        name: String,

        /// Description (HTML allowed)
        #[arg(long)]
        description: String,

        /// Technology tag (repeatable)
        #[arg(long = "tech", short = 't')]
        technologies: Vec<String>,

        /// Live site URL
        #[arg(long)]
        live_url: Option<String>,

        /// Source repository URL
        #[arg(long)]
        repo_url: Option<String>,
    },

    /// Edit a project (only the given fields change)
    #[command(alias = "update")]
    Edit {
        /// Project ID
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Replace the technology tags (repeatable)
        #[arg(long = "tech", short = 't')]
        technologies: Option<Vec<String>>,

        #[arg(long, conflicts_with = "clear_live_url")]
        live_url: Option<String>,

        /// Remove the live site URL
        #[arg(long)]
        clear_live_url: bool,

        #[arg(long, conflicts_with = "clear_repo_url")]
        repo_url: Option<String>,

        /// Remove the repository URL
        #[arg(long)]
        clear_repo_url: bool,
    },

    /// Delete a project
    #[command(alias = "rm")]
    Delete {
        /// Project ID
        id: i64,
    },
}

// ── Blog posts ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub command: PostsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PostsCommand {
    /// List all blog posts
    #[command(alias = "ls")]
    List,

    /// Show one blog post
    Get {
        /// Post ID
        id: i64,
    },

    /// Publish a blog post
    #[command(alias = "create")]
    Add {
        #[arg(long)]
        title: String,

        /// Post body (HTML allowed); conflicts with --content-file
        #[arg(long, required_unless_present = "content_file")]
        content: Option<String>,

        /// Read the post body from a file
        #[arg(long, conflicts_with = "content")]
        content_file: Option<std::path::PathBuf>,

        /// Author identifier
        #[arg(long)]
        author: Option<String>,
    },

    /// Edit a blog post (only the given fields change)
    #[command(alias = "update")]
    Edit {
        /// Post ID
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,

        #[arg(long)]
        content_file: Option<std::path::PathBuf>,

        #[arg(long)]
        author: Option<String>,
    },

    /// Delete a blog post
    #[command(alias = "rm")]
    Delete {
        /// Post ID
        id: i64,
    },
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List users
    #[command(alias = "ls")]
    List,

    /// Show one user
    Get {
        /// User ID
        id: i64,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Show the resolved configuration
    Show,

    /// Set a profile value
    Set {
        /// Key (api_url, username, token_store, insecure, timeout, ca_cert)
        key: String,
        /// Value
        value: String,
    },

    /// List profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store the login password in the system keyring (uses --profile)
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
