//! Surgical rewrite of a header's contributor block.
//!
//! Only the `// Definitions by:` block changes; every byte before it and
//! from the `// Definitions:` line onward is kept as-is. Any mismatch
//! between the header text and that layout is a [`PatchError`], never a
//! silent skip.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex_lite::{NoExpand, Regex};
use tracing::{debug, info};

use crate::collector::SourceTree;
use crate::errors::PatchError;
use crate::header::parser::{CONTRIBUTORS_LABEL, DEFINITIONS_LABEL};
use crate::header::{Contributor, GhostSet, Header};

const GITHUB_PROFILE: &str = "https://github.com/";

fn sole_contributor_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?mi)^// Definitions by:[^\r\n]*").expect("contributor line pattern is valid")
    })
}

/// Replace `text[start..end]` with `replacement`.
pub fn replace_span(
    text: &str,
    start: usize,
    end: usize,
    replacement: &str,
) -> Result<String, PatchError> {
    if end < start {
        return Err(PatchError::OutOfOrder { start, end });
    }
    let (Some(before), Some(after)) = (text.get(..start), text.get(end..)) else {
        return Err(PatchError::InvalidSpan { start, end });
    };
    let mut out = String::with_capacity(before.len() + replacement.len() + after.len());
    out.push_str(before);
    out.push_str(replacement);
    out.push_str(after);
    Ok(out)
}

/// Generic attribution used when nobody is left to credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub url: String,
}

impl Default for Placeholder {
    fn default() -> Self {
        Self {
            name: "DefinitelyTyped".into(),
            url: "https://github.com/DefinitelyTyped".into(),
        }
    }
}

impl Placeholder {
    fn line(&self) -> String {
        format!("{} {} <{}>", CONTRIBUTORS_LABEL, self.name, self.url)
    }
}

/// What [`Patcher::patch`] did to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// No contributor is a ghost.
    Clean,
    /// Ghosts were found but the rewritten text equals the original.
    Unchanged,
    /// The file was rewritten without these logins.
    Patched { removed: Vec<String> },
}

/// Rewrites contributor blocks to drop ghost accounts.
#[derive(Debug, Clone, Default)]
pub struct Patcher {
    placeholder: Placeholder,
}

impl Patcher {
    pub fn new(placeholder: Placeholder) -> Self {
        Self { placeholder }
    }

    /// Compute the patched text for `header`, without touching any file.
    ///
    /// Returns `Ok(None)` when there is nothing to change.
    pub fn patch_text(&self, header: &Header, ghosts: &GhostSet) -> Result<Option<String>, PatchError> {
        if !header.has_ghost(ghosts) {
            return Ok(None);
        }
        let patched = if header.contributors.len() == 1 {
            self.replace_sole_contributor(&header.raw)?
        } else {
            self.rebuild_block(header, ghosts)?
        };
        Ok((patched != header.raw).then_some(patched))
    }

    /// Patch the file at `path` through `tree`, writing only on change.
    pub fn patch(
        &self,
        tree: &dyn SourceTree,
        path: &Path,
        header: &Header,
        ghosts: &GhostSet,
    ) -> Result<PatchOutcome, PatchError> {
        if !header.has_ghost(ghosts) {
            return Ok(PatchOutcome::Clean);
        }
        info!(path = %path.display(), "found deleted accounts, patching");
        let Some(patched) = self.patch_text(header, ghosts)? else {
            debug!(path = %path.display(), "patched text identical, not writing");
            return Ok(PatchOutcome::Unchanged);
        };
        tree.write(path, &patched).map_err(|source| PatchError::Write {
            path: PathBuf::from(path),
            source,
        })?;
        Ok(PatchOutcome::Patched {
            removed: removed_logins(header, ghosts),
        })
    }

    fn replace_sole_contributor(&self, text: &str) -> Result<String, PatchError> {
        let line = self.placeholder.line();
        let patched = sole_contributor_line().replace(text, NoExpand(&line));
        if patched == text {
            return Err(PatchError::SubstitutionUnchanged);
        }
        Ok(patched.into_owned())
    }

    fn rebuild_block(&self, header: &Header, ghosts: &GhostSet) -> Result<String, PatchError> {
        let survivors: Vec<&Contributor> = header
            .contributors
            .iter()
            .filter(|c| !c.is_ghost(ghosts))
            .collect();
        if survivors.len() == header.contributors.len() {
            return Err(PatchError::NothingRemoved);
        }

        let text = &header.raw;
        let start = text.find(CONTRIBUTORS_LABEL).ok_or(PatchError::LabelNotFound)?;
        let end = text.find(DEFINITIONS_LABEL).ok_or(PatchError::DefinitionsNotFound)?;
        let eol = if text.contains("\r\n") { "\r\n" } else { "\n" };

        let block = if survivors.is_empty() {
            format!("{}{}", self.placeholder.line(), eol)
        } else {
            format_block(&survivors, eol)
        };
        replace_span(text, start, end, &block)
    }
}

/// One line per contributor, continuation lines aligned under the first name.
fn format_block(contributors: &[&Contributor], eol: &str) -> String {
    let indent = format!("//{}", " ".repeat(CONTRIBUTORS_LABEL.len() - 2));
    let mut block = String::new();
    for (i, contributor) in contributors.iter().enumerate() {
        let prefix = if i == 0 { CONTRIBUTORS_LABEL } else { indent.as_str() };
        block.push_str(prefix);
        block.push(' ');
        block.push_str(&format_contributor(contributor));
        block.push_str(eol);
    }
    block
}

fn format_contributor(contributor: &Contributor) -> String {
    match (&contributor.github_username, &contributor.url) {
        (Some(login), _) => format!("{} <{}{}>", contributor.name, GITHUB_PROFILE, login),
        (None, Some(url)) => format!("{} <{}>", contributor.name, url),
        (None, None) => contributor.name.clone(),
    }
}

fn removed_logins(header: &Header, ghosts: &GhostSet) -> Vec<String> {
    header
        .contributors
        .iter()
        .filter(|c| c.is_ghost(ghosts))
        .filter_map(|c| c.github_username.clone())
        .collect()
}
