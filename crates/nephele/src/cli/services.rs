//! Service subcommands

use clap::Subcommand;

/// EC2 instance commands
#[derive(Subcommand, Debug)]
pub enum Ec2Commands {
    /// List instances (terminated instances are skipped)
    #[command(visible_alias = "ls")]
    #[command(after_help = "FILTER KEYS:
    az      availability zone
    id      instance id
    name    Name tag
    state   instance state (running, stopped, ...)
    type    instance type

Values match as case-insensitive substrings, so name=web also matches 'Web-01'.

EXAMPLES:
    nephele ec2 list --filter name=web --filter state=running
    nephele ec2 list --filter-file filters.json

A filter file is a JSON array:
    [{\"Name\": \"state\", \"Values\": [\"running\", \"pending\"]}]
")]
    List {
        /// Filter as key=value (repeatable)
        #[arg(long = "filter", short = 'f', value_name = "KEY=VALUE")]
        filters: Vec<String>,

        /// JSON file with additional filters
        #[arg(long, value_name = "FILE")]
        filter_file: Option<String>,
    },

    /// Start instances
    Start {
        /// Instance ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Check permissions without starting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Stop instances
    Stop {
        /// Instance ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Check permissions without stopping anything
        #[arg(long)]
        dry_run: bool,
    },
}

/// Lambda function commands
#[derive(Subcommand, Debug)]
pub enum LambdaCommands {
    /// List functions
    #[command(visible_alias = "ls")]
    List,

    /// Invoke a function synchronously and print its response
    Invoke {
        /// Function name or ARN
        name: String,
    },
}

/// RDS commands
#[derive(Subcommand, Debug)]
pub enum RdsCommands {
    /// List database instances
    #[command(visible_alias = "ls")]
    List,
}

/// S3 commands
#[derive(Subcommand, Debug)]
pub enum S3Commands {
    /// List buckets
    #[command(visible_alias = "ls")]
    List,

    /// List objects in a bucket, one page at a time
    #[command(after_help = "EXAMPLES:
    nephele s3 objects app-logs --prefix 2024/ --max-keys 100

    # Fetch the next page
    nephele s3 objects app-logs --prefix 2024/ --continuation-token <token>
")]
    Objects {
        /// Bucket name
        bucket: String,

        /// Only list keys starting with this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Maximum number of keys to return (1-1000)
        #[arg(long, default_value_t = 1000)]
        max_keys: i32,

        /// Token from a previous truncated listing
        #[arg(long)]
        continuation_token: Option<String>,
    },

    /// Download an object to a local file
    #[command(visible_alias = "get")]
    Download {
        /// Bucket name
        bucket: String,

        /// Object key
        key: String,

        /// Destination path (defaults to the last segment of the key)
        #[arg(long, short = 'f')]
        file: Option<String>,
    },
}
