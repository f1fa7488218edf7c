use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::MappingError;
use crate::util::text::hyphenate;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("name"));
static STATE_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("state"));

fn field_regex(key: &str) -> Regex {
    match Regex::new(&format!(r"\b{key}=(.*?)(?:,[A-Za-z]+=|,\.\.\.|\]|$)")) {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprint {
    pub name: String,
    pub closed: bool,
}

impl Sprint {
    /// The sprint name with whitespace replaced by hyphens.
    pub fn label(&self) -> String {
        hyphenate(&self.name)
    }
}

/// Reads `name` and `state` out of a Jira Server sprint dump such as
/// `Sprint@14b1c359[id=1,state=CLOSED,name=Sprint 1,goal=,...]`. A value runs
/// until the next `,key=` pair or the closing bracket, so names may contain
/// commas.
pub fn parse_sprint_info(raw: &str) -> Result<Sprint, MappingError> {
    let name = capture(&NAME_RE, raw).ok_or_else(|| MappingError::MalformedSprint {
        field: "name",
        raw: raw.to_string(),
    })?;
    let state = capture(&STATE_RE, raw).ok_or_else(|| MappingError::MalformedSprint {
        field: "state",
        raw: raw.to_string(),
    })?;
    Ok(Sprint {
        name: name.to_string(),
        closed: state.eq_ignore_ascii_case("CLOSED"),
    })
}

fn capture<'a>(re: &Regex, raw: &'a str) -> Option<&'a str> {
    re.captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

pub fn parse_sprint_value(value: &Value) -> Result<Sprint, MappingError> {
    match value {
        Value::String(raw) => parse_sprint_info(raw),
        Value::Object(obj) => {
            let field = |key: &'static str| {
                obj.get(key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| MappingError::MalformedSprint {
                        field: key,
                        raw: value.to_string(),
                    })
            };
            Ok(Sprint {
                name: field("name")?.trim().to_string(),
                closed: field("state")?.eq_ignore_ascii_case("closed"),
            })
        }
        other => Err(MappingError::MalformedSprint {
            field: "name",
            raw: other.to_string(),
        }),
    }
}
