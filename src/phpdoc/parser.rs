//! Doc-block Parser
//!
//! Parses PHPDoc comments into tagged sections. Only the tags the type
//! inferrer consumes get structured fields (`@param`, `@return`, `@var`);
//! everything else is kept as a bare tag with its description.
//!
//! ## Recognized formats
//!
//! - `@param Type $name description`
//! - `@param $name description` (untyped)
//! - `@return Type description`
//! - `@var Type description` / `@var Type $name description`

use regex::Regex;
use std::sync::LazyLock;

use super::types::{DocBlock, DocTag};

/// `@param Type $name description` — groups: 1=type, 2=name, 3=description
static PARAM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@param\s+([^\s$]\S*)\s+\$(\w+)\s*(.*)$").expect("Invalid param regex")
});

/// `@param $name description` — groups: 1=name, 2=description
static PARAM_UNTYPED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@param\s+\$(\w+)\s*(.*)$").expect("Invalid param regex"));

/// `@return Type description` — groups: 1=type, 2=description
static RETURN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@return\s+(\S+)\s*(.*)$").expect("Invalid return regex"));

/// `@var Type [$name] description` — groups: 1=type, 2=name?, 3=description
static VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@var\s+(\S+)(?:\s+\$(\w+))?\s*(.*)$").expect("Invalid var regex")
});

/// `@tag rest` — groups: 1=tag, 2=rest
static OTHER_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z][\w-]*)\s*(.*)$").expect("Invalid tag regex"));

impl DocBlock {
    /// Parses the raw text of a `/** ... */` comment. Total: malformed
    /// input yields an empty block.
    pub fn parse(raw: &str) -> DocBlock {
        let mut block = DocBlock::default();
        let mut summary_lines: Vec<&str> = Vec::new();
        let mut in_summary = true;

        for line in strip_comment_markers(raw) {
            if line.starts_with('@') {
                in_summary = false;
                block.tags.push(parse_tag(line));
                continue;
            }
            if in_summary {
                if line.is_empty() && !summary_lines.is_empty() {
                    in_summary = false;
                    continue;
                }
                if !line.is_empty() {
                    summary_lines.push(line);
                }
            } else if let Some(last) = block.tags.last_mut() {
                // Continuation line of the previous tag's description.
                if !line.is_empty() {
                    if !last.description.is_empty() {
                        last.description.push(' ');
                    }
                    last.description.push_str(line);
                }
            }
        }

        if !summary_lines.is_empty() {
            block.summary = Some(summary_lines.join(" "));
        }
        block
    }
}

/// Removes `/**`, `*/` and the leading ` * ` of each line.
fn strip_comment_markers(raw: &str) -> impl Iterator<Item = &str> {
    let body = raw
        .trim()
        .trim_start_matches("/**")
        .trim_end_matches("*/");
    body.lines().map(|line| {
        let line = line.trim();
        line.strip_prefix('*').map(str::trim).unwrap_or(line)
    })
}

fn parse_tag(line: &str) -> DocTag {
    if let Some(caps) = PARAM_REGEX.captures(line) {
        return DocTag {
            name: "param".to_string(),
            var_name: Some(caps[2].to_string()),
            type_string: Some(caps[1].to_string()),
            description: caps[3].trim().to_string(),
        };
    }
    if let Some(caps) = PARAM_UNTYPED_REGEX.captures(line) {
        return DocTag {
            name: "param".to_string(),
            var_name: Some(caps[1].to_string()),
            type_string: None,
            description: caps[2].trim().to_string(),
        };
    }
    if let Some(caps) = RETURN_REGEX.captures(line) {
        return DocTag {
            name: "return".to_string(),
            var_name: None,
            type_string: Some(caps[1].to_string()),
            description: caps[2].trim().to_string(),
        };
    }
    if let Some(caps) = VAR_REGEX.captures(line) {
        return DocTag {
            name: "var".to_string(),
            var_name: caps.get(2).map(|m| m.as_str().to_string()),
            type_string: Some(caps[1].to_string()),
            description: caps[3].trim().to_string(),
        };
    }
    if let Some(caps) = OTHER_TAG_REGEX.captures(line) {
        return DocTag {
            name: caps[1].to_string(),
            var_name: None,
            type_string: None,
            description: caps[2].trim().to_string(),
        };
    }
    DocTag {
        name: String::new(),
        var_name: None,
        type_string: None,
        description: line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_and_tags() {
        let block = DocBlock::parse(
            "/**\n * Frobnicates the widget.\n *\n * Longer text ignored.\n * @param int $count How many.\n * @return string\n */",
        );
        assert_eq!(block.summary.as_deref(), Some("Frobnicates the widget."));
        assert_eq!(block.tags.len(), 2);

        let param = block.param_tag("count").unwrap();
        assert_eq!(param.type_string.as_deref(), Some("int"));
        assert_eq!(param.description, "How many.");

        let ret = block.return_tag().unwrap();
        assert_eq!(ret.type_string.as_deref(), Some("string"));
    }

    #[test]
    fn test_param_without_type() {
        let block = DocBlock::parse("/** @param $x the thing */");
        let param = block.param_tag("x").unwrap();
        assert_eq!(param.type_string, None);
        assert_eq!(param.description, "the thing");
    }

    #[test]
    fn test_var_with_and_without_name() {
        let block = DocBlock::parse("/** @var Foo[] $items */");
        let var = block.var_tag().unwrap();
        assert_eq!(var.type_string.as_deref(), Some("Foo[]"));
        assert_eq!(var.var_name.as_deref(), Some("items"));

        let block = DocBlock::parse("/** @var int|string */");
        let var = block.var_tag().unwrap();
        assert_eq!(var.type_string.as_deref(), Some("int|string"));
        assert_eq!(var.var_name, None);
    }

    #[test]
    fn test_single_line_block() {
        let block = DocBlock::parse("/** Returns the session. */");
        assert_eq!(block.summary.as_deref(), Some("Returns the session."));
        assert!(block.tags.is_empty());
    }

    #[test]
    fn test_unknown_tags_kept_by_name() {
        let block = DocBlock::parse("/** @deprecated use frob() instead */");
        let tag = block.tags_named("deprecated").next().unwrap();
        assert_eq!(tag.description, "use frob() instead");
    }

    #[test]
    fn test_multiple_params_selected_by_name() {
        let block =
            DocBlock::parse("/**\n * @param int $a\n * @param string $b\n */");
        assert_eq!(
            block.param_tag("b").unwrap().type_string.as_deref(),
            Some("string")
        );
        assert!(block.param_tag("missing").is_none());
    }
}
