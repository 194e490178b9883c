use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "streamcast", version, about = "Rebroadcast a local video to YouTube Live")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides `server.host`).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides `server.port`).
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory holding the videos offered for streaming.
    #[arg(long)]
    pub media_dir: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StreamArgs {
    /// Video file, absolute or relative to the media directory.
    #[arg(long)]
    pub source: Option<String>,

    /// YouTube stream key.
    #[arg(long)]
    pub key: Option<String>,

    /// Scale to 720x1280 for vertical (shorts) output.
    #[arg(long)]
    pub vertical: bool,

    #[arg(long)]
    pub media_dir: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct VideosArgs {
    #[arg(long)]
    pub media_dir: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the web control panel (default).
    Serve(ServeArgs),
    /// Stream one file in the foreground until it ends or Ctrl+C.
    Stream(StreamArgs),
    /// List local videos that can be streamed.
    Videos(VideosArgs),
    /// Kill every encoder process on this host, whoever started it.
    KillEncoders,
}
