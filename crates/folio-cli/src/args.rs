// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command line definition.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};

use folio_core::EncryptionMethod;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Merge and split PDF documents and images")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Combine pages of several documents and images into one PDF
    Merge(MergeArgs),
    /// Write every selected page to its own PDF
    Split(SplitArgs),
}

/// Options shared by both commands.
#[derive(Args, Clone)]
pub struct CommonArgs {
    /// Input files, each optionally followed by `@` and a page list such as
    /// `report.pdf@1-3,5`
    #[arg(required = true, value_name = "INPUT[@PAGES]")]
    pub inputs: Vec<InputSpec>,

    /// JSON file with open and save options
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Rotate every selected page clockwise by this many degrees
    #[arg(long, value_name = "DEG", allow_hyphen_values = true)]
    pub rotate: Option<i32>,

    /// Document title
    #[arg(long)]
    pub title: Option<String>,

    /// Document author
    #[arg(long)]
    pub author: Option<String>,

    /// Encrypt the output with this owner password
    #[arg(long)]
    pub owner_password: Option<String>,

    /// Password required to open the output
    #[arg(long, requires = "owner_password")]
    pub user_password: Option<String>,

    /// Encryption method
    #[arg(long, value_enum, default_value = "standard128")]
    pub method: Method,
}

#[derive(Args, Clone)]
pub struct MergeArgs {
    /// Output PDF
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Embed a file into the output (repeatable)
    #[arg(long = "attach", value_name = "FILE")]
    pub attachments: Vec<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Clone)]
pub struct SplitArgs {
    /// Directory receiving one PDF per page
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    Standard40,
    Standard128,
    Aes128,
    Aes256,
    Aes256r6,
}

impl From<Method> for EncryptionMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Standard40 => EncryptionMethod::Standard40,
            Method::Standard128 => EncryptionMethod::Standard128,
            Method::Aes128 => EncryptionMethod::Aes128,
            Method::Aes256 => EncryptionMethod::Aes256,
            Method::Aes256r6 => EncryptionMethod::Aes256r6,
        }
    }
}

/// An input path plus the pages to take from it (all pages when `None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub path: PathBuf,
    pub pages: Option<Vec<u32>>,
}

impl FromStr for InputSpec {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        // Only a trailing `@` followed by digits, dashes and commas is a
        // selector; anything else is part of the file name.
        if let Some((path, list)) = raw.rsplit_once('@')
            && !path.is_empty()
            && is_page_list(list)
        {
            return Ok(Self {
                path: PathBuf::from(path),
                pages: Some(parse_pages(list)?),
            });
        }
        if raw.is_empty() {
            return Err("empty input".into());
        }
        Ok(Self {
            path: PathBuf::from(raw),
            pages: None,
        })
    }
}

/// Most pages one input list may select.
pub const MAX_PAGES: usize = 100_000;

/// Parse `1-3,5,2` into `[1, 2, 3, 5, 2]`. Order and repeats are kept;
/// `4-2` counts down. Lists selecting more than [`MAX_PAGES`] pages are
/// refused before anything is allocated for them.
pub fn parse_pages(list: &str) -> Result<Vec<u32>, String> {
    let mut pages = Vec::new();
    for part in list.split(',') {
        let part = part.trim();
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (page_number(a)?, page_number(b)?),
            None => {
                let n = page_number(part)?;
                (n, n)
            }
        };
        let span = start.abs_diff(end) as usize + 1;
        if pages.len() + span > MAX_PAGES {
            return Err(format!("'{list}' selects more than {MAX_PAGES} pages"));
        }
        if start <= end {
            pages.extend(start..=end);
        } else {
            pages.extend((end..=start).rev());
        }
    }
    Ok(pages)
}

fn is_page_list(raw: &str) -> bool {
    raw.bytes().any(|b| b.is_ascii_digit())
        && raw
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b',' | b' '))
}

fn page_number(raw: &str) -> Result<u32, String> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err("page numbers start at 1".into()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{raw}' is not a page number")),
    }
}
