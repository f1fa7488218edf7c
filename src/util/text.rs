use regex::Regex;
use std::sync::LazyLock;

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"\[~([^\]]+?)\]") {
    Ok(re) => re,
    Err(_) => unreachable!("static regex pattern"),
});

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"\s") {
    Ok(re) => re,
    Err(_) => unreachable!("static regex pattern"),
});

/// Rewrite Jira mentions (`[~christian]`) into Clubhouse mentions
/// (`@christian-acme`).
pub fn rewrite_mentions(text: &str, user_suffix: &str) -> String {
    MENTION_RE
        .replace_all(text, |caps: &regex::Captures| {
            format!("@{}{}", &caps[1], user_suffix)
        })
        .into_owned()
}

/// Labels cannot carry whitespace; every whitespace char becomes a hyphen.
pub fn hyphenate(name: &str) -> String {
    WHITESPACE_RE.replace_all(name, "-").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_every_mention() {
        let text = "ping [~christian] and [~anna.b], thanks";
        assert_eq!(
            rewrite_mentions(text, "-acme"),
            "ping @christian-acme and @anna.b-acme, thanks"
        );
    }

    #[test]
    fn leaves_plain_brackets_alone() {
        assert_eq!(rewrite_mentions("[link] [~] x", "-acme"), "[link] [~] x");
    }

    #[test]
    fn hyphenates_all_whitespace() {
        assert_eq!(hyphenate("Sprint 8"), "Sprint-8");
        assert_eq!(hyphenate("Team A\tSprint  2"), "Team-A-Sprint--2");
    }
}
