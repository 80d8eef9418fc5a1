//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand, ValueHint};

/// Manage community signups and private messages
#[derive(Parser, Debug)]
#[command(name = "bpcli")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Data file (overrides config)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub data_file: Option<PathBuf>,

    /// Config file (replaces the global config file)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage pending signups
    Signup {
        #[command(subcommand)]
        command: SignupCommands,
    },

    /// Manage private messages
    Message {
        #[command(subcommand)]
        command: MessageCommands,
    },

    /// Inspect settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Output shaping shared by listing and display commands.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format: table, json, csv, yaml, ids, count
    #[arg(long, default_value = "table")]
    pub format: String,

    /// Comma-separated list of fields to show
    #[arg(long)]
    pub fields: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SignupCommands {
    /// Add a pending signup
    Add {
        /// Login of the future account
        #[arg(long)]
        user_login: String,
        /// Email of the future account
        #[arg(long)]
        user_email: String,
        /// Activation key (generated when omitted)
        #[arg(long)]
        activation_key: Option<String>,
        /// Print only the signup id
        #[arg(long)]
        porcelain: bool,
    },

    /// Show a signup by id, email or login
    Get {
        /// Signup id, email or login
        identifier: String,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Delete signups
    Delete {
        /// Signup ids, emails or logins
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Activate a signup, creating the account
    Activate {
        /// Activation key of the pending signup
        activation_key: String,
    },

    /// Resend the activation email
    Resend {
        /// Signup id
        id: u64,
        /// Email the signup was made with
        email: String,
        /// Activation key of the signup
        activation_key: String,
    },

    /// List pending signups
    List {
        #[command(flatten)]
        output: OutputArgs,
        /// Maximum number of signups
        #[arg(long)]
        number: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
pub enum MessageCommands {
    /// Create a message
    #[command(visible_alias = "add")]
    Create {
        /// Sender: user id or login
        #[arg(long)]
        from: String,
        /// Recipient: user id or login
        #[arg(long)]
        to: String,
        /// Subject (default: "Message Subject")
        #[arg(long)]
        subject: Option<String>,
        /// Content (default: random text)
        #[arg(long)]
        content: Option<String>,
        /// Reply into an existing thread
        #[arg(long)]
        thread_id: Option<u64>,
        /// Send date, YYYY-MM-DD HH:MM:SS (default: now)
        #[arg(long)]
        date_sent: Option<String>,
        /// Suppress all output
        #[arg(
            long,
            action = ArgAction::Set,
            num_args = 0..=1,
            default_value = "false",
            default_missing_value = "true",
            value_parser = BoolishValueParser::new()
        )]
        silent: bool,
        /// Print only the thread id
        #[arg(long)]
        porcelain: bool,
    },

    /// Delete threads on behalf of a user
    #[command(visible_alias = "remove")]
    Delete {
        /// Thread ids
        #[arg(required = true, num_args = 1..)]
        thread_ids: Vec<u64>,
        /// User id or login deleting the threads
        #[arg(long)]
        user_id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show a message
    #[command(visible_alias = "see")]
    Get {
        /// Message id
        message_id: u64,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List a user's messages
    List {
        /// User id or login
        #[arg(long)]
        user_id: Option<String>,
        /// Box: sentbox, inbox or notices
        #[arg(long = "box", default_value = "sentbox")]
        mailbox: String,
        /// Type: all, read or unread
        #[arg(long = "type", default_value = "all")]
        kind: String,
        /// Only messages whose subject or content contain this text
        #[arg(long)]
        search: Option<String>,
        /// Maximum number of messages (default from config: 10)
        #[arg(long)]
        count: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Generate random messages between existing users
    Generate {
        /// Put all messages into this thread
        #[arg(long)]
        thread_id: Option<u64>,
        /// Number of messages (default from config: 20)
        #[arg(long)]
        count: Option<usize>,
    },

    /// Star a message
    #[command(group(ArgGroup::new("target").required(true).args(["message_id", "thread_id"])))]
    Star {
        /// Message to star
        #[arg(long)]
        message_id: Option<u64>,
        /// Star the first message of this thread
        #[arg(long)]
        thread_id: Option<u64>,
        /// User id or login
        #[arg(long)]
        user_id: String,
    },

    /// Unstar a message
    #[command(group(ArgGroup::new("target").required(true).args(["message_id", "thread_id"])))]
    Unstar {
        /// Message to unstar
        #[arg(long)]
        message_id: Option<u64>,
        /// Unstar every message of this thread
        #[arg(long)]
        thread_id: Option<u64>,
        /// User id or login
        #[arg(long)]
        user_id: String,
    },

    /// Send a sitewide notice
    #[command(visible_aliases = ["send_notice", "send-notice"])]
    Send {
        /// Subject (default: "Notice Subject")
        #[arg(long)]
        subject: Option<String>,
        /// Content (default: random text)
        #[arg(long)]
        content: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config and data paths
    Path,
}
