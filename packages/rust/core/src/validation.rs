//! Apply link validation to a bucket while keeping the seen set consistent.

use async_trait::async_trait;
use dealscout_linkcheck::LinkValidator;
use dealscout_shared::{Profile, ValidationOutcome};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::bucket::{Bucket, SeenSet};

/// Anything that can judge a profile link.
#[async_trait]
pub trait ProfileValidator: Send + Sync {
    async fn validate(&self, profile: &Profile, company: &str) -> ValidationOutcome;
}

#[async_trait]
impl ProfileValidator for LinkValidator {
    async fn validate(&self, profile: &Profile, company: &str) -> ValidationOutcome {
        LinkValidator::validate(self, profile, company).await
    }
}

/// Used when validation is disabled: every link is reported valid.
pub struct SkipValidation;

#[async_trait]
impl ProfileValidator for SkipValidation {
    async fn validate(&self, _profile: &Profile, _company: &str) -> ValidationOutcome {
        ValidationOutcome::Valid
    }
}

/// Verdict for one URL as it was before validation.
#[derive(Debug, Clone, Serialize)]
pub struct UrlVerdict {
    pub url: String,
    pub outcome: ValidationOutcome,
    /// Repair landed on a profile already in the run.
    pub duplicate: bool,
}

/// Counts and per-URL verdicts for one or more buckets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationSummary {
    pub valid: usize,
    pub repaired: usize,
    pub removed: usize,
    pub kept_unverified: usize,
    pub duplicates: usize,
    pub verdicts: Vec<UrlVerdict>,
}

impl ValidationSummary {
    pub fn absorb(&mut self, other: ValidationSummary) {
        self.valid += other.valid;
        self.repaired += other.repaired;
        self.removed += other.removed;
        self.kept_unverified += other.kept_unverified;
        self.duplicates += other.duplicates;
        self.verdicts.extend(other.verdicts);
    }
}

/// Validate every profile in `bucket`, rewriting repaired URLs and dropping
/// removed ones. A repair that collides with a URL already in `seen` drops
/// the profile instead.
#[instrument(skip_all, fields(bucket = %bucket.tag(), profiles = bucket.len()))]
pub async fn validate_bucket(
    bucket: &mut Bucket,
    validator: &dyn ProfileValidator,
    company: &str,
    seen: &mut SeenSet,
) -> ValidationSummary {
    let mut summary = ValidationSummary::default();
    let mut kept = Vec::with_capacity(bucket.len());

    for mut profile in bucket.take() {
        let outcome = validator.validate(&profile, company).await;
        let original = profile.url.clone();
        let mut duplicate = false;

        match &outcome {
            ValidationOutcome::Valid => {
                summary.valid += 1;
                kept.push(profile);
            }
            ValidationOutcome::KeptUnverified => {
                summary.kept_unverified += 1;
                kept.push(profile);
            }
            ValidationOutcome::Removed => summary.removed += 1,
            ValidationOutcome::Repaired(new_url) => {
                if seen.rekey(&profile.url, new_url) {
                    summary.repaired += 1;
                    profile.url = new_url.clone();
                    kept.push(profile);
                } else {
                    debug!(old = %profile.url, new = %new_url, "repair collides with existing profile, dropping");
                    summary.duplicates += 1;
                    duplicate = true;
                }
            }
        }

        summary.verdicts.push(UrlVerdict {
            url: original,
            outcome,
            duplicate,
        });
    }

    bucket.restore(kept);
    info!(
        valid = summary.valid,
        repaired = summary.repaired,
        removed = summary.removed,
        kept_unverified = summary.kept_unverified,
        duplicates = summary.duplicates,
        "bucket validated"
    );
    summary
}
