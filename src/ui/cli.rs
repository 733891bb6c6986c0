use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "freight-chat",
    about = "Follow and reply to a shipment conversation from the terminal",
    author,
    version
)]
pub struct Cli {
    /// Conversation to open.
    #[arg(long, env = "FREIGHT_CHAT_CONVERSATION")]
    pub conversation: String,

    /// Id of the signed-in user.
    #[arg(long, env = "FREIGHT_CHAT_USER")]
    pub user: String,

    /// Overrides the API base URL from the settings file.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Settings file (defaults to the XDG config location).
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Number of most recent messages to print on each refresh.
    #[arg(long, default_value_t = 20)]
    pub tail: usize,
}
