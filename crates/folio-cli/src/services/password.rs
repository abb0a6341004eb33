// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Password prompts on the terminal.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Mutex;

use folio_core::codec::PasswordQuery;

/// Asks for passwords on stderr and reads them from a line source (stdin in
/// the binary). An empty line or end of input declines.
pub struct PromptPassword<R> {
    input: Mutex<R>,
}

impl<R: BufRead> PromptPassword<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

impl<R: BufRead> PasswordQuery for PromptPassword<R> {
    fn password(&self, path: &Path, retry: bool) -> Option<String> {
        let mut stderr = std::io::stderr();
        let prompt = if retry { "Wrong password. Password" } else { "Password" };
        let _ = write!(stderr, "{prompt} for {} (empty to cancel): ", path.display());
        let _ = stderr.flush();

        let mut line = String::new();
        let mut input = self.input.lock().ok()?;
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let answer = line.trim_end_matches(['\r', '\n']);
                (!answer.is_empty()).then(|| answer.to_string())
            }
        }
    }
}
