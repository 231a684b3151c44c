use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "zipfs")]
#[command(version)]
#[command(about = "Browse a ZIP archive as a read-only virtual filesystem", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipfs asset.zip                     list the archive root\n  \
  zipfs -l asset.zip                  walk and list the whole tree\n  \
  zipfs asset.zip /css/site.css       print one file to stdout\n  \
  zipfs -s asset.zip /img /img/a.png  stat paths instead of printing them\n  \
  zipfs -l https://example.com/a.zip  browse a remote ZIP over Range requests\n\n\
If FILE does not exist, zipfs falls back to an archive appended to its own\n\
executable (cat asset.zip >> zipfs).")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Virtual filesystem paths to print or stat (absolute, e.g. /index.html)
    #[arg(value_name = "PATHS")]
    pub paths: Vec<String>,

    /// Walk the whole tree from / and list every path
    #[arg(short = 'l')]
    pub list: bool,

    /// Verbose listing (size, mode, date, per entry)
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Stat the given paths instead of printing file contents
    #[arg(short = 's')]
    pub stat: bool,

    /// Quiet mode: no separators between multiple files
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }
}
