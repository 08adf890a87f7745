//! Classification buckets and the cross-bucket identity index.
//!
//! A URL lives in at most one bucket. The [`SeenSet`] is the single source of
//! truth for that and is passed explicitly to every merge.

use std::collections::HashSet;

use dealscout_shared::{BucketTag, Profile, ProfileHit};
use serde::Serialize;

// ---------------------------------------------------------------------------
// SeenSet
// ---------------------------------------------------------------------------

/// Every profile URL encountered during a run, across both buckets.
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    urls: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Record a URL. Returns `false` if it was already seen.
    pub fn insert(&mut self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    /// Move an identity from `old` to `new`. Returns `false` (and changes
    /// nothing) if `new` already belongs to another profile.
    pub fn rekey(&mut self, old: &str, new: &str) -> bool {
        if old == new {
            return true;
        }
        if self.urls.contains(new) {
            return false;
        }
        self.urls.remove(old);
        self.urls.insert(new.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Bucket
// ---------------------------------------------------------------------------

/// Insertion-ordered profiles for one classification tag.
#[derive(Debug, Clone, Serialize)]
pub struct Bucket {
    tag: BucketTag,
    profiles: Vec<Profile>,
}

impl Bucket {
    pub fn new(tag: BucketTag) -> Self {
        Self {
            tag,
            profiles: Vec::new(),
        }
    }

    pub fn tag(&self) -> BucketTag {
        self.tag
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn contains(&self, url: &str) -> bool {
        self.profiles.iter().any(|p| p.url == url)
    }

    /// Add every hit whose URL has not been seen anywhere in the run.
    /// Returns how many were added.
    pub fn merge(&mut self, hits: Vec<ProfileHit>, seen: &mut SeenSet) -> usize {
        let before = self.profiles.len();
        for hit in hits {
            if seen.insert(&hit.url) {
                self.profiles.push(Profile::from_hit(hit, self.tag));
            }
        }
        self.profiles.len() - before
    }

    /// Take the profiles out for in-place rewriting; pair with
    /// [`Bucket::restore`].
    pub(crate) fn take(&mut self) -> Vec<Profile> {
        std::mem::take(&mut self.profiles)
    }

    pub(crate) fn restore(&mut self, profiles: Vec<Profile>) {
        debug_assert!(profiles.iter().all(|p| p.bucket == self.tag));
        self.profiles = profiles;
    }

    pub fn into_profiles(self) -> Vec<Profile> {
        self.profiles
    }
}
