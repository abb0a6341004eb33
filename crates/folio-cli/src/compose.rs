// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Turning parsed arguments into a composer with pages, attachments,
// metadata and encryption queued, then saving it.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{info, instrument};

use folio_core::codec::PasswordQuery;
use folio_core::error::{FolioError, Result};
use folio_core::{Angle, Attachment, Encryption, Metadata, Page, Permission, SaveOption};
use folio_document::{DocumentReader, LopdfCodec};
use folio_engine::{Composer, Merger, Splitter, Strategy};

use crate::args::{CommonArgs, InputSpec, MergeArgs, SplitArgs};

/// Merge the inputs of `args`; returns the written file.
#[instrument(skip_all, fields(output = %args.output.display(), inputs = args.common.inputs.len()))]
pub fn merge(args: &MergeArgs, query: &dyn PasswordQuery) -> Result<PathBuf> {
    let mut merger = Merger::new(LopdfCodec::new());
    prepare(&mut merger, &args.common, query)?;
    let attachments = args
        .attachments
        .iter()
        .map(Attachment::from_path)
        .collect::<Result<Vec<_>>>()?;
    merger.add_attachments(attachments);
    merger.save(&args.output)?;
    info!("Merge finished");
    Ok(args.output.clone())
}

/// Split the inputs of `args`; returns every written file in page order.
#[instrument(skip_all, fields(output = %args.output.display(), inputs = args.common.inputs.len()))]
pub fn split(args: &SplitArgs, query: &dyn PasswordQuery) -> Result<Vec<PathBuf>> {
    let mut splitter = Splitter::new(LopdfCodec::new());
    prepare(&mut splitter, &args.common, query)?;
    splitter.save(&args.output)?;
    info!(files = splitter.results().len(), "Split finished");
    Ok(splitter.results().to_vec())
}

/// Open every input and queue its selected pages, plus metadata and
/// encryption. Composers are reset if anything fails.
fn prepare<S: Strategy>(
    composer: &mut Composer<LopdfCodec, S>,
    args: &CommonArgs,
    query: &dyn PasswordQuery,
) -> Result<()> {
    let options = match &args.config {
        Some(path) => SaveOption::load(path)?,
        None => SaveOption::default(),
    };
    let rotation = args.rotate.map(Angle::new).transpose()?;

    let queued = queue_inputs(composer, &args.inputs, &options, rotation, query);
    if let Err(err) = queued {
        composer.reset();
        return Err(err);
    }

    composer.set_options(options);
    composer.set_metadata(metadata(args));
    composer.set_encryption(encryption(args));
    Ok(())
}

fn queue_inputs<S: Strategy>(
    composer: &mut Composer<LopdfCodec, S>,
    inputs: &[InputSpec],
    options: &SaveOption,
    rotation: Option<Angle>,
    query: &dyn PasswordQuery,
) -> Result<()> {
    for input in inputs {
        let opened = DocumentReader::open(&input.path, "", &options.open, query)?;
        let mut pages = select(&opened.pages, input)?;
        if let Some(angle) = rotation {
            pages.iter_mut().for_each(|page| page.rotate(angle));
        }
        composer.add_pages_with_source(pages, opened.source);
    }
    Ok(())
}

/// Pages of `input` in the requested order.
fn select(pages: &[Page], input: &InputSpec) -> Result<Vec<Page>> {
    let Some(numbers) = &input.pages else {
        return Ok(pages.to_vec());
    };
    numbers
        .iter()
        .map(|&number| {
            (number as usize)
                .checked_sub(1)
                .and_then(|index| pages.get(index))
                .cloned()
                .ok_or_else(|| FolioError::InvalidPage {
                    path: input.path.clone(),
                    number,
                    count: pages.len() as u32,
                })
        })
        .collect()
}

fn metadata(args: &CommonArgs) -> Metadata {
    let now = Utc::now();
    Metadata {
        title: args.title.clone().unwrap_or_default(),
        author: args.author.clone().unwrap_or_default(),
        created: Some(now),
        modified: Some(now),
        ..Metadata::default()
    }
}

fn encryption(args: &CommonArgs) -> Encryption {
    match &args.owner_password {
        Some(owner) => Encryption {
            enabled: true,
            method: args.method.into(),
            owner_password: owner.clone(),
            user_password: args.user_password.clone().unwrap_or_default(),
            open_with_password: args.user_password.is_some(),
            permission: Permission::ALL,
        },
        None => Encryption::default(),
    }
}
