//! Parser for the `// Type definitions for ...` comment header.

use tracing::debug;

use super::{Contributor, Header};
use crate::errors::HeaderParseError;

pub const TITLE_LABEL: &str = "// Type definitions for";
pub const PROJECT_LABEL: &str = "// Project:";
pub const CONTRIBUTORS_LABEL: &str = "// Definitions by:";
pub const DEFINITIONS_LABEL: &str = "// Definitions:";
pub const TYPESCRIPT_LABEL: &str = "// TypeScript Version:";

const GITHUB_PREFIXES: [&str; 2] = ["https://github.com/", "http://github.com/"];

/// Parse the contributor header at the top of `text`.
///
/// Only the leading run of `//` comment lines is examined. The returned
/// [`Header`] keeps the whole of `text` in `raw`.
pub fn parse_header(text: &str) -> Result<Header, HeaderParseError> {
    let body = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = body
        .lines()
        .take_while(|line| line.starts_with("//"))
        .collect();

    let title = lines
        .first()
        .and_then(|line| line.strip_prefix(TITLE_LABEL))
        .map(str::trim)
        .filter(|rest| !rest.is_empty())
        .ok_or(HeaderParseError::MissingTitle)?;
    let (library_name, library_version) = split_title(title);

    let mut projects = Vec::new();
    let mut contributors = Vec::new();
    let mut typescript_version = None;
    let mut contributors_at = None;
    let mut definitions_at = None;

    let mut i = 1;
    while i < lines.len() {
        let line = lines[i];
        if let Some(rest) = line.strip_prefix(PROJECT_LABEL) {
            projects.extend(
                rest.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
            );
        } else if let Some(rest) = line.strip_prefix(CONTRIBUTORS_LABEL) {
            contributors_at.get_or_insert(i);
            contributors.extend(parse_contributor_line(rest)?);
            while let Some(next) = lines.get(i + 1).and_then(|l| continuation(l)) {
                contributors.extend(parse_contributor_line(next)?);
                i += 1;
            }
        } else if line.starts_with(DEFINITIONS_LABEL) {
            definitions_at.get_or_insert(i);
        } else if let Some(rest) = line.strip_prefix(TYPESCRIPT_LABEL) {
            typescript_version = Some(rest.trim().to_string());
        }
        i += 1;
    }

    let contributors_at = contributors_at.ok_or(HeaderParseError::MissingContributors)?;
    let definitions_at = definitions_at.ok_or(HeaderParseError::MissingDefinitionsUrl)?;
    if definitions_at < contributors_at {
        return Err(HeaderParseError::OutOfOrder);
    }
    if contributors.is_empty() {
        return Err(HeaderParseError::MissingContributors);
    }

    debug!(
        library = %library_name,
        contributors = contributors.len(),
        "parsed header"
    );
    Ok(Header {
        library_name,
        library_version,
        projects,
        contributors,
        typescript_version,
        raw: text.to_string(),
    })
}

/// Continuation lines of the contributor block are indented comment lines
/// (`//` followed by at least two spaces), unlike the `// Label:` lines.
fn continuation(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("//")?;
    if rest.starts_with("  ") && !rest.trim().is_empty() {
        Some(rest)
    } else {
        None
    }
}

fn split_title(title: &str) -> (String, Option<String>) {
    match title.rsplit_once(' ') {
        Some((name, version)) if version.starts_with(|c: char| c.is_ascii_digit()) => {
            (name.trim().to_string(), Some(version.to_string()))
        }
        _ => (title.to_string(), None),
    }
}

/// A line may carry several `Name <url>` entries separated by commas.
fn parse_contributor_line(line: &str) -> Result<Vec<Contributor>, HeaderParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    let mut rest = line;
    while let Some(pos) = rest.find(">,") {
        entries.push(&rest[..=pos]);
        rest = &rest[pos + 2..];
    }
    entries.push(rest);
    entries
        .into_iter()
        .map(|entry| parse_contributor(entry.trim()))
        .collect()
}

fn parse_contributor(entry: &str) -> Result<Contributor, HeaderParseError> {
    let Some(open) = entry.find('<') else {
        if entry.contains('>') {
            return Err(HeaderParseError::MalformedContributor(entry.to_string()));
        }
        return Ok(Contributor {
            name: entry.to_string(),
            url: None,
            github_username: None,
        });
    };
    let name = entry[..open].trim();
    let url = entry[open + 1..]
        .strip_suffix('>')
        .map(str::trim)
        .filter(|url| !url.is_empty() && !url.contains(['<', '>']));
    match url {
        Some(url) if !name.is_empty() => Ok(Contributor {
            name: name.to_string(),
            github_username: github_login(url),
            url: Some(url.to_string()),
        }),
        _ => Err(HeaderParseError::MalformedContributor(entry.to_string())),
    }
}

fn github_login(url: &str) -> Option<String> {
    let path = GITHUB_PREFIXES
        .iter()
        .find_map(|prefix| url.strip_prefix(prefix))?
        .trim_end_matches('/');
    if path.is_empty() || path.contains('/') {
        return None;
    }
    Some(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "// Type definitions for left-pad 1.2\n\
// Project: https://github.com/stevemao/left-pad, https://left-pad.io\n\
// Definitions by: Alice Anders <https://github.com/alice>\n\
//                 Bob <https://github.com/GhostUser>\n\
//                 Carol <https://carol.example.com>\n\
// Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped\n\
// TypeScript Version: 2.8\n\
\n\
export function leftPad(s: string, n: number): string;\n";

    #[test]
    fn test_parse_full_header() {
        let header = parse_header(SAMPLE).unwrap();
        assert_eq!(header.library_name, "left-pad");
        assert_eq!(header.library_version.as_deref(), Some("1.2"));
        assert_eq!(
            header.projects,
            vec!["https://github.com/stevemao/left-pad", "https://left-pad.io"]
        );
        assert_eq!(header.typescript_version.as_deref(), Some("2.8"));
        assert_eq!(header.raw, SAMPLE);

        let names: Vec<&str> = header.contributors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alice Anders", "Bob", "Carol"]);
        assert_eq!(
            header.contributors[1].github_username.as_deref(),
            Some("GhostUser")
        );
        assert_eq!(header.contributors[2].github_username, None);
        assert_eq!(
            header.contributors[2].url.as_deref(),
            Some("https://carol.example.com")
        );
    }

    #[test]
    fn test_comma_separated_contributors() {
        let text = "// Type definitions for foo\n\
// Definitions by: A <https://github.com/a>, B <https://github.com/b/>\n\
// Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped\n";
        let header = parse_header(text).unwrap();
        assert_eq!(header.library_version, None);
        let logins: Vec<_> = header
            .contributors
            .iter()
            .map(|c| c.github_username.clone().unwrap())
            .collect();
        assert_eq!(logins, vec!["a", "b"]);
    }

    #[test]
    fn test_bom_and_crlf_accepted() {
        let text = "\u{feff}// Type definitions for foo 2.0\r\n\
// Definitions by: A <https://github.com/a>\r\n\
// Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped\r\n";
        let header = parse_header(text).unwrap();
        assert_eq!(header.contributors.len(), 1);
        assert_eq!(header.contributors[0].url.as_deref(), Some("https://github.com/a"));
    }

    #[test]
    fn test_rejects_missing_title() {
        let text = "// Definitions by: A <https://github.com/a>\n// Definitions: x\n";
        assert_eq!(parse_header(text), Err(HeaderParseError::MissingTitle));
    }

    #[test]
    fn test_rejects_missing_definitions() {
        let text = "// Type definitions for foo\n// Definitions by: A <https://github.com/a>\n";
        assert_eq!(
            parse_header(text),
            Err(HeaderParseError::MissingDefinitionsUrl)
        );
    }

    #[test]
    fn test_rejects_reordered_labels() {
        let text = "// Type definitions for foo\n\
// Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped\n\
// Definitions by: A <https://github.com/a>\n";
        assert_eq!(parse_header(text), Err(HeaderParseError::OutOfOrder));
    }

    #[test]
    fn test_rejects_malformed_contributor() {
        let text = "// Type definitions for foo\n\
// Definitions by: A <https://github.com/a\n\
// Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped\n";
        assert!(matches!(
            parse_header(text),
            Err(HeaderParseError::MalformedContributor(_))
        ));
    }

    #[test]
    fn test_header_ends_at_first_non_comment_line() {
        let text = "// Type definitions for foo\n\
// Definitions by: A <https://github.com/a>\n\
\n\
// Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped\n";
        assert_eq!(
            parse_header(text),
            Err(HeaderParseError::MissingDefinitionsUrl)
        );
    }

    #[test]
    fn test_github_login_extraction() {
        assert_eq!(github_login("https://github.com/alice"), Some("alice".into()));
        assert_eq!(github_login("http://github.com/alice/"), Some("alice".into()));
        assert_eq!(github_login("https://github.com/org/repo"), None);
        assert_eq!(github_login("https://gitlab.com/alice"), None);
    }
}
