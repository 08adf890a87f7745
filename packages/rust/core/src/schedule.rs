//! Declarative search passes and the scheduler that drives them.
//!
//! Passes run strictly in order. A conditional pass looks at its bucket's
//! size once, right before it would run; later passes never re-trigger
//! earlier ones.

use dealscout_providers::ProfileSearch;
use dealscout_shared::{BucketTag, ProfileHit};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::bucket::{Bucket, SeenSet};

// ---------------------------------------------------------------------------
// Pass definition
// ---------------------------------------------------------------------------

/// Which backend a pass uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Keyword,
    Grounded,
}

/// When a pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Always,
    /// Run only while the target bucket holds fewer than `n` profiles.
    BelowSize(usize),
}

impl Trigger {
    pub fn should_run(&self, bucket_size: usize) -> bool {
        match self {
            Self::Always => true,
            Self::BelowSize(n) => bucket_size < *n,
        }
    }
}

/// One scheduled unit of search work.
#[derive(Debug, Clone)]
pub struct Pass {
    pub name: &'static str,
    pub provider: ProviderKind,
    /// Full query strings for keyword passes, role keywords for grounded ones.
    pub queries: Vec<String>,
    pub bucket: BucketTag,
    pub trigger: Trigger,
}

/// Senior marketing titles.
const MARKETING_SENIOR: &[&str] = &[
    "CMO",
    "Chief Marketing Officer",
    "VP Marketing",
    "Vice President Marketing",
    "Head of Marketing",
    "Director Marketing",
];

/// Marketing operations and revenue operations.
const MARKETING_OPS: &[&str] = &[
    "Marketing Operations",
    "Revenue Operations",
    "RevOps",
    "Demand Generation",
    "ABM",
];

/// Secondary marketing titles swept by the grounded backend.
const MARKETING_SECONDARY: &[&str] = &[
    "Digital Marketing",
    "Growth Marketing",
    "Product Marketing",
    "Content Marketing",
    "Brand Marketing",
    "Field Marketing",
];

/// C-suite and founders.
const LEADERSHIP_CORE: &[&str] = &["CEO", "Founder", "Co-Founder", "President"];

/// Remaining C-suite titles.
const LEADERSHIP_CSUITE: &[&str] = &["CFO", "COO", "CRO", "CTO", "Chief Customer Officer"];

/// Sales and revenue leadership.
const LEADERSHIP_SALES: &[&str] = &[
    "VP Sales",
    "SVP Sales",
    "Head of Sales",
    "VP Revenue",
    "Director of Sales",
];

/// Restricted-domain keyword query for one title.
pub fn keyword_query(company: &str, title: &str, host: &str) -> String {
    if title.contains(' ') {
        format!("site:{host}/in \"{company}\" \"{title}\"")
    } else {
        format!("site:{host}/in \"{company}\" {title}")
    }
}

/// The fixed six-pass plan: three marketing passes, then three leadership
/// passes, escalating to the grounded backend while a bucket is short.
pub fn standard_passes(company: &str, host: &str, min_bucket_size: usize) -> Vec<Pass> {
    let keyword = |titles: &[&str]| -> Vec<String> {
        titles.iter().map(|t| keyword_query(company, t, host)).collect()
    };
    let roles = |titles: &[&str]| -> Vec<String> { titles.iter().map(|t| t.to_string()).collect() };

    vec![
        Pass {
            name: "marketing-senior",
            provider: ProviderKind::Keyword,
            queries: keyword(MARKETING_SENIOR),
            bucket: BucketTag::Marketing,
            trigger: Trigger::Always,
        },
        Pass {
            name: "marketing-ops",
            provider: ProviderKind::Keyword,
            queries: keyword(MARKETING_OPS),
            bucket: BucketTag::Marketing,
            trigger: Trigger::Always,
        },
        Pass {
            name: "marketing-secondary",
            provider: ProviderKind::Grounded,
            queries: roles(MARKETING_SECONDARY),
            bucket: BucketTag::Marketing,
            trigger: Trigger::BelowSize(min_bucket_size),
        },
        Pass {
            name: "leadership-core",
            provider: ProviderKind::Keyword,
            queries: keyword(LEADERSHIP_CORE),
            bucket: BucketTag::Leadership,
            trigger: Trigger::Always,
        },
        Pass {
            name: "leadership-csuite",
            provider: ProviderKind::Grounded,
            queries: roles(LEADERSHIP_CSUITE),
            bucket: BucketTag::Leadership,
            trigger: Trigger::BelowSize(min_bucket_size),
        },
        Pass {
            name: "leadership-sales",
            provider: ProviderKind::Grounded,
            queries: roles(LEADERSHIP_SALES),
            bucket: BucketTag::Leadership,
            trigger: Trigger::BelowSize(min_bucket_size),
        },
    ]
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Backends available to the scheduler for one run.
pub struct Providers<'a> {
    /// Optional: without it keyword passes run empty.
    pub keyword: Option<&'a dyn ProfileSearch>,
    pub grounded: &'a dyn ProfileSearch,
}

impl<'a> Providers<'a> {
    pub fn get(&self, kind: ProviderKind) -> Option<&'a dyn ProfileSearch> {
        match kind {
            ProviderKind::Keyword => self.keyword,
            ProviderKind::Grounded => Some(self.grounded),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// What happened in one pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub name: String,
    pub bucket: BucketTag,
    pub provider: ProviderKind,
    pub executed: bool,
    /// Hits returned by the provider.
    pub returned: usize,
    /// Hits that were new to the run.
    pub added: usize,
}

/// Both buckets plus the identity index they share.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub marketing: Bucket,
    pub leadership: Bucket,
    pub seen: SeenSet,
    pub passes: Vec<PassReport>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self {
            marketing: Bucket::new(BucketTag::Marketing),
            leadership: Bucket::new(BucketTag::Leadership),
            seen: SeenSet::new(),
            passes: Vec::new(),
        }
    }

    pub fn bucket(&self, tag: BucketTag) -> &Bucket {
        match tag {
            BucketTag::Marketing => &self.marketing,
            BucketTag::Leadership => &self.leadership,
        }
    }

    /// Merge hits into the tagged bucket through the shared seen set.
    pub fn merge(&mut self, tag: BucketTag, hits: Vec<ProfileHit>) -> usize {
        let bucket = match tag {
            BucketTag::Marketing => &mut self.marketing,
            BucketTag::Leadership => &mut self.leadership,
        };
        bucket.merge(hits, &mut self.seen)
    }

    pub fn total(&self) -> usize {
        self.marketing.len() + self.leadership.len()
    }
}

impl Default for Aggregate {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Run every pass in order and collect the results.
///
/// Provider errors are logged and count as an empty pass.
#[instrument(skip_all, fields(passes = passes.len()))]
pub async fn run_passes(
    passes: &[Pass],
    providers: &Providers<'_>,
    on_pass: &mut (dyn FnMut(&PassReport) + Send),
) -> Aggregate {
    let mut aggregate = Aggregate::new();

    for pass in passes {
        let size = aggregate.bucket(pass.bucket).len();
        let mut report = PassReport {
            name: pass.name.to_string(),
            bucket: pass.bucket,
            provider: pass.provider,
            executed: false,
            returned: 0,
            added: 0,
        };

        if !pass.trigger.should_run(size) {
            info!(pass = pass.name, bucket = %pass.bucket, size, "bucket full, skipping pass");
            on_pass(&report);
            aggregate.passes.push(report);
            continue;
        }

        let Some(provider) = providers.get(pass.provider) else {
            warn!(pass = pass.name, "provider not configured, pass yields nothing");
            on_pass(&report);
            aggregate.passes.push(report);
            continue;
        };

        report.executed = true;
        let hits = match provider.search(&pass.queries).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(pass = pass.name, provider = provider.name(), error = %e, "pass failed, treating as empty");
                Vec::new()
            }
        };

        report.returned = hits.len();
        report.added = aggregate.merge(pass.bucket, hits);

        info!(
            pass = pass.name,
            bucket = %pass.bucket,
            returned = report.returned,
            added = report.added,
            bucket_size = aggregate.bucket(pass.bucket).len(),
            "pass complete"
        );
        on_pass(&report);
        aggregate.passes.push(report);
    }

    aggregate
}
