pub mod clubhouse;
pub mod jira;
