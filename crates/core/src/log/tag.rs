// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cached tag combinations.
//!
//! Every distinct, ordered tag sequence is interned as one [`TagNode`] in a
//! tree rooted at the empty sequence. Extending a node by a tag returns the
//! same `Arc` on every call, so hot call sites never rebuild tag lists.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct TagNode {
    tags: Vec<String>,
    children: Mutex<HashMap<String, Arc<TagNode>>>,
}

impl TagNode {
    pub fn root() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Node for this sequence plus `tag`; a tag already present is a no-op
    pub fn child(self: &Arc<Self>, tag: &str) -> Arc<TagNode> {
        if self.contains(tag) {
            return Arc::clone(self);
        }

        let mut children = self.children.lock().unwrap_or_else(PoisonError::into_inner);
        let node = children.entry(tag.to_string()).or_insert_with(|| {
            let mut tags = self.tags.clone();
            tags.push(tag.to_string());
            Arc::new(TagNode {
                tags,
                children: Mutex::default(),
            })
        });
        Arc::clone(node)
    }
}

#[cfg(test)]
#[path = "tag_tests.rs"]
mod tests;
