use std::collections::{HashMap, HashSet};

use crate::model::clubhouse::{EntityId, LinkVerb, Story};
use crate::model::jira::{Issue, LinkType};

/// Clubhouse allows one link per story pair, so links between the same two
/// issues share a key whatever their direction or type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupeKey(String, String);

impl DedupeKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            DedupeKey(a.to_string(), b.to_string())
        } else {
            DedupeKey(b.to_string(), a.to_string())
        }
    }
}

/// A link to create: `inward_key` becomes the subject, `outward_key` the object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    pub link_type: LinkType,
    pub inward_key: String,
    pub outward_key: String,
}

impl LinkRequest {
    pub fn verb(&self) -> LinkVerb {
        verb_for(self.link_type)
    }

    pub fn dedupe_key(&self) -> DedupeKey {
        DedupeKey::new(&self.inward_key, &self.outward_key)
    }
}

pub fn verb_for(link_type: LinkType) -> LinkVerb {
    match link_type {
        LinkType::Blocks => LinkVerb::Blocks,
        LinkType::Duplicate => LinkVerb::Duplicates,
        LinkType::Cloners | LinkType::Relates | LinkType::Other => LinkVerb::RelatesTo,
    }
}

#[derive(Debug)]
struct PartialLink {
    link_type: LinkType,
    inward_key: Option<String>,
    outward_key: Option<String>,
}

/// Compute the links still missing on the destination.
///
/// `known` holds the keys of links that already exist; every emitted request
/// registers its key there as well, so no pair is ever requested twice.
pub fn reconcile<'a>(
    issues: impl IntoIterator<Item = &'a Issue>,
    known: &mut HashSet<DedupeKey>,
) -> Vec<LinkRequest> {
    let mut partial: HashMap<String, PartialLink> = HashMap::new();
    let mut requests = Vec::new();

    for issue in issues {
        for half in &issue.fields.issuelinks {
            let link = partial
                .entry(half.id.clone())
                .or_insert_with(|| PartialLink {
                    link_type: LinkType::from_name(&half.link_type.name),
                    inward_key: None,
                    outward_key: None,
                });
            if let Some(inward) = &half.inward_issue {
                link.inward_key = Some(inward.key.clone());
            }
            if let Some(outward) = &half.outward_issue {
                link.outward_key = Some(outward.key.clone());
            }

            if link.inward_key.is_some() && link.outward_key.is_some() {
                if let Some(PartialLink {
                    link_type,
                    inward_key: Some(inward_key),
                    outward_key: Some(outward_key),
                }) = partial.remove(&half.id)
                {
                    register(
                        LinkRequest {
                            link_type,
                            inward_key,
                            outward_key,
                        },
                        known,
                        &mut requests,
                    );
                }
            }
        }

        // Clubhouse has no sub-tasks; a sub-task simply relates to its parent.
        if let Some(parent) = &issue.fields.parent {
            register(
                LinkRequest {
                    link_type: LinkType::Relates,
                    inward_key: issue.key.clone(),
                    outward_key: parent.key.clone(),
                },
                known,
                &mut requests,
            );
        }
    }

    requests
}

fn register(request: LinkRequest, known: &mut HashSet<DedupeKey>, out: &mut Vec<LinkRequest>) {
    if known.insert(request.dedupe_key()) {
        out.push(request);
    }
}

/// Keys of the links already present among `stories` (keyed by Jira key).
/// Links touching a story that is not in the table are ignored.
pub fn existing_link_keys(stories: &HashMap<String, Story>) -> HashSet<DedupeKey> {
    let key_by_id: HashMap<EntityId, &str> = stories
        .iter()
        .map(|(key, story)| (story.id, key.as_str()))
        .collect();

    stories
        .values()
        .flat_map(|story| story.story_links.iter())
        .filter_map(|link| {
            let subject = key_by_id.get(&link.subject_id)?;
            let object = key_by_id.get(&link.object_id)?;
            Some(DedupeKey::new(subject, object))
        })
        .collect()
}
