use crate::{
    constants::*,
    utils::util::Result,
};
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| env!("CARGO_PKG_VERSION").to_string());

#[derive(Parser, Debug)]
#[command(name="gvx",
          version=&**FULL_VERSION,
          about="Multi-sample small-variant merger",
          long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Merge(MergeArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Merge(_) => "merge",
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["sites", "sites_list"]),
))]
#[command(arg_required_else_help(true))]
pub struct MergeArgs {
    /// Site table files to merge (JSON, optionally gzip-compressed)
    #[arg(
        long = "sites",
        value_name = "SITES",
        num_args = 1..,
        value_parser = check_file_exists
    )]
    pub sites: Option<Vec<PathBuf>>,

    /// File containing paths of site tables to merge (one per line)
    #[arg(
        long = "sites-list",
        value_name = "SITES_LIST",
        value_parser = check_file_exists
    )]
    pub sites_list: Option<PathBuf>,

    /// Write genotyping output to a file [default: standard output]
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        value_parser = check_prefix_path
    )]
    pub output: Option<String>,

    /// Number of threads to use
    #[arg(
        short = '@',
        value_name = "THREADS",
        default_value = "1",
        value_parser = threads_in_range
    )]
    pub num_threads: usize,

    /// Number of sites handed to a worker at a time
    #[arg(
        long = "block-size",
        value_name = "BLOCK_SIZE",
        default_value_t = DEFAULT_BLOCK_SIZE,
        value_parser = block_size_in_range,
        help_heading = "Advanced"
    )]
    pub block_size: usize,

    /// Demote reference prefix-invariant violations to warnings
    #[arg(long = "permissive-ref", help_heading = "Advanced")]
    pub permissive_ref: bool,

    /// Write a TSV dump of merged sites and their remapped fields
    #[arg(long = "dump-merged", value_name = "FILE", help_heading = "Advanced")]
    pub dump_merged: Option<PathBuf>,
}

/// Initializes the verbosity level for logging based on the command-line
/// arguments: Info by default, Debug at -v, Trace at -vv and beyond.
pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.module_path().unwrap_or("unknown_module"),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse::<usize>()
        .map_err(|_| crate::gvx_error!("`{}` is not a valid thread number", s))?;
    if thread == 0 {
        return Err(crate::gvx_error!("Number of threads must be >= 1"));
    }
    Ok(thread)
}

fn block_size_in_range(s: &str) -> Result<usize> {
    let block_size: usize = s
        .parse::<usize>()
        .map_err(|_| crate::gvx_error!("`{}` is not a valid block size", s))?;
    if block_size == 0 {
        return Err(crate::gvx_error!("Block size must be >= 1"));
    }
    Ok(block_size)
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        return Err(crate::gvx_error!("File does not exist: {}", path.display()));
    }
    Ok(path.to_path_buf())
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(crate::gvx_error!(
                "Path does not exist: {}",
                parent_dir.display()
            ));
        }
    }
    Ok(s.to_string())
}

impl MergeArgs {
    pub fn process_site_paths(&self) -> Result<Vec<PathBuf>> {
        match (&self.sites, &self.sites_list) {
            (Some(sites), None) => Ok(sites.clone()),
            (None, Some(list_path)) => Self::read_site_paths_from_file(list_path),
            _ => unreachable!("Either --sites or --sites-list is provided, never both"),
        }
    }

    fn read_site_paths_from_file(path: &Path) -> Result<Vec<PathBuf>> {
        let file = File::open(path).map_err(|e| {
            crate::gvx_error!("Failed to open site list file {}: {}", path.display(), e)
        })?;
        let reader = BufReader::new(file);

        let mut paths = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| crate::gvx_error!("Error reading line {}: {}", line_num + 1, e))?;
            let trimmed = line.trim();
            // Skip empty or comment lines
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let path = PathBuf::from(trimmed);
            if !path.exists() {
                Err(crate::gvx_error!(
                    "Site table does not exist: {}",
                    path.display()
                ))?;
            }
            paths.push(path);
        }

        if paths.is_empty() {
            Err(crate::gvx_error!("No site table paths found in the input file"))?;
        }

        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, time::SystemTime};

    #[test]
    fn site_list_files_skip_comments_and_blanks() {
        let tmp = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let table = tmp.join(format!("gvx_test_cli_table_{nanos}.json"));
        fs::write(&table, "{}").unwrap();
        let list = tmp.join(format!("gvx_test_cli_list_{nanos}.txt"));
        fs::write(&list, format!("# comment\n\n{}\n", table.to_str().unwrap())).unwrap();

        let args = MergeArgs {
            sites: None,
            sites_list: Some(list.clone()),
            output: None,
            num_threads: 1,
            block_size: DEFAULT_BLOCK_SIZE,
            permissive_ref: false,
            dump_merged: None,
        };
        let paths = args.process_site_paths().unwrap();
        fs::remove_file(&list).ok();
        fs::remove_file(&table).ok();
        assert_eq!(paths, vec![table]);
    }

    #[test]
    fn thread_and_block_size_validators_reject_zero() {
        assert!(threads_in_range("0").is_err());
        assert!(threads_in_range("4").is_ok());
        assert!(block_size_in_range("0").is_err());
        assert!(block_size_in_range("128").is_ok());
    }
}
