//! End-to-end contact discovery: passes → validation → layout or fallback →
//! champion.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use dealscout_linkcheck::LinkValidator;
use dealscout_providers::{
    GeminiClient, GenerationRequest, GroundedSearch, KeywordSearchClient, ProfileSearch,
    TextGenerator, prompts, strip_markdown,
};
use dealscout_shared::{
    ApiKeys, AppConfig, ContactLink, DealScoutError, PipelineConfig, Profile, ProfileUrlPattern,
    Result,
};

use crate::champion::{self, Champion, names_match};
use crate::render::{contact_name, links_from_text, render_buckets};
use crate::schedule::{Aggregate, PassReport, Providers, run_passes, standard_passes};
use crate::validation::{ProfileValidator, SkipValidation, ValidationSummary, validate_bucket};

/// Shown when no strategy produced any contact.
pub const MANUAL_RESEARCH_NOTICE: &str =
    "No LinkedIn contacts found via search. Manual research recommended.";

/// Input for one run.
#[derive(Debug, Clone)]
pub struct ContactRequest {
    pub company: String,
    /// Named target contact to surface first.
    pub champion: Option<String>,
}

/// Which strategy produced the report text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Two ranked sections built from the buckets.
    Bucketed,
    /// One broad grounded search-and-format call.
    GroundedSweep,
    /// Fixed notice; nothing usable was found.
    ManualResearch,
}

/// Strategies tried in order until one yields output.
const STRATEGIES: [ReportMode; 3] = [
    ReportMode::Bucketed,
    ReportMode::GroundedSweep,
    ReportMode::ManualResearch,
];

/// Everything the formatter needs.
#[derive(Debug, Clone, Serialize)]
pub struct ContactReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub company: String,
    pub mode: ReportMode,
    pub text: String,
    /// Name → URL in output order.
    pub links: Vec<ContactLink>,
    pub champion: Option<Champion>,
    /// Validated bucket contents; empty unless `mode` is bucketed.
    pub marketing: Vec<Profile>,
    pub leadership: Vec<Profile>,
    pub passes: Vec<PassReport>,
    pub validation: ValidationSummary,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each scheduled pass, executed or skipped.
    fn pass_finished(&self, report: &PassReport);
    /// Called when the pipeline completes.
    fn done(&self, report: &ContactReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn pass_finished(&self, _report: &PassReport) {}
    fn done(&self, _report: &ContactReport) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Owns the backends for a run; reusable across companies.
pub struct ContactPipeline {
    config: PipelineConfig,
    pattern: ProfileUrlPattern,
    generator: Arc<dyn TextGenerator>,
    keyword: Option<Arc<dyn ProfileSearch>>,
    validator: Arc<dyn ProfileValidator>,
}

impl ContactPipeline {
    /// Pipeline with only the grounded backend and validation off.
    pub fn new(config: PipelineConfig, generator: Arc<dyn TextGenerator>) -> Result<Self> {
        let pattern = ProfileUrlPattern::new(&config.profile_host)?;
        Ok(Self {
            config,
            pattern,
            generator,
            keyword: None,
            validator: Arc::new(SkipValidation),
        })
    }

    pub fn with_keyword_search(mut self, keyword: Arc<dyn ProfileSearch>) -> Self {
        self.keyword = Some(keyword);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn ProfileValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Build the production backends from config and resolved keys.
    pub fn from_config(app: &AppConfig, config: PipelineConfig, keys: &ApiKeys) -> Result<Self> {
        let generator = Arc::new(GeminiClient::new(&app.grounded_search, keys.grounded.clone())?);
        let mut pipeline = Self::new(config, generator)?;

        if let Some(key) = &keys.keyword {
            let client =
                KeywordSearchClient::new(&app.keyword_search, key.clone(), pipeline.pattern.clone())?;
            pipeline = pipeline.with_keyword_search(Arc::new(client));
        }

        if pipeline.config.validate_links {
            let validator = LinkValidator::new(&app.validation, pipeline.pattern.clone())?;
            pipeline = pipeline.with_validator(Arc::new(validator));
        }

        Ok(pipeline)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run discovery for one company.
    ///
    /// Provider failures degrade the result rather than failing the run; only
    /// an unusable request is an error.
    #[instrument(skip_all, fields(company = %request.company))]
    pub async fn run(
        &self,
        request: &ContactRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<ContactReport> {
        let company = request.company.trim();
        if company.is_empty() {
            return Err(DealScoutError::validation("company name is empty"));
        }

        let start = Instant::now();
        let run_id = Uuid::now_v7();
        info!(%run_id, "starting contact discovery");

        // --- Phase 1: Search passes ---
        progress.phase("Searching");
        let grounded = GroundedSearch::new(self.generator.clone(), company, self.pattern.clone());
        let providers = Providers {
            keyword: self.keyword.as_deref(),
            grounded: &grounded,
        };
        let passes = standard_passes(company, self.pattern.host(), self.config.min_bucket_size);
        let Aggregate {
            mut marketing,
            mut leadership,
            mut seen,
            passes: pass_reports,
        } = run_passes(&passes, &providers, &mut |r| progress.pass_finished(r)).await;

        // --- Phase 2: Link validation ---
        progress.phase("Validating links");
        let mut validation =
            validate_bucket(&mut marketing, self.validator.as_ref(), company, &mut seen).await;
        validation.absorb(
            validate_bucket(&mut leadership, self.validator.as_ref(), company, &mut seen).await,
        );

        let marketing = marketing.into_profiles();
        let leadership = leadership.into_profiles();
        let total = marketing.len() + leadership.len();
        info!(
            marketing = marketing.len(),
            leadership = leadership.len(),
            "validated profiles"
        );

        // --- Phase 3: Layout or fallback ---
        progress.phase("Formatting contacts");
        let mut outcome = None;
        for strategy in STRATEGIES {
            let attempt = match strategy {
                ReportMode::Bucketed if total >= self.config.min_total_profiles => {
                    Some(render_buckets(&marketing, &leadership))
                }
                ReportMode::Bucketed => {
                    info!(
                        total,
                        min = self.config.min_total_profiles,
                        "too few profiles, falling back"
                    );
                    None
                }
                ReportMode::GroundedSweep => self.grounded_sweep(company).await,
                ReportMode::ManualResearch => Some((MANUAL_RESEARCH_NOTICE.to_string(), Vec::new())),
            };
            if let Some(result) = attempt {
                outcome = Some((strategy, result));
                break;
            }
        }
        let (mode, (mut text, mut links)) = outcome.unwrap_or((
            ReportMode::ManualResearch,
            (MANUAL_RESEARCH_NOTICE.to_string(), Vec::new()),
        ));
        let (mut marketing, mut leadership) = if mode == ReportMode::Bucketed {
            (marketing, leadership)
        } else {
            (Vec::new(), Vec::new())
        };

        // --- Phase 4: Champion ---
        let champion = match request.champion.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                progress.phase("Resolving champion");
                let champion =
                    champion::lookup(self.generator.as_ref(), &self.pattern, name, company).await;
                text = champion::deduplicate(&text, &self.pattern, champion.url.as_deref(), name);
                let is_champion = |entry_name: &str, entry_url: &str| {
                    champion.url.as_deref() == Some(entry_url) || names_match(entry_name, name)
                };
                links.retain(|l| !is_champion(&l.name, &l.url));
                marketing.retain(|p| !is_champion(&contact_name(p), &p.url));
                leadership.retain(|p| !is_champion(&contact_name(p), &p.url));

                text = if text.is_empty() {
                    champion.text.clone()
                } else {
                    format!("{}\n\n{text}", champion.text)
                };
                if let Some(url) = &champion.url {
                    links.insert(
                        0,
                        ContactLink {
                            name: name.to_string(),
                            url: url.clone(),
                        },
                    );
                }
                Some(champion)
            }
            _ => None,
        };

        let report = ContactReport {
            run_id,
            generated_at: Utc::now(),
            company: company.to_string(),
            mode,
            text,
            links,
            champion,
            marketing,
            leadership,
            passes: pass_reports,
            validation,
        };

        info!(
            mode = ?report.mode,
            contacts = report.links.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "contact discovery complete"
        );
        progress.done(&report);
        Ok(report)
    }

    /// One broad search-and-format call. `None` when the backend fails or
    /// the answer names no profile.
    async fn grounded_sweep(&self, company: &str) -> Option<(String, Vec<ContactLink>)> {
        let prompt = prompts::full_sweep(company, self.pattern.host());
        let answer = match self
            .generator
            .generate(&GenerationRequest::grounded(prompt))
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "grounded sweep failed");
                return None;
            }
        };

        let text = strip_markdown(&answer);
        let links = links_from_text(&text, &self.pattern);
        if links.is_empty() {
            info!("grounded sweep named no profiles");
            return None;
        }
        Some((text, links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CHAMPION_MARKER, MARKETING_HEADER, SECTION_DIVIDER};
    use async_trait::async_trait;
    use dealscout_shared::{ProfileHit, ValidationOutcome};
    use std::collections::HashMap;

    // ---- fakes -----------------------------------------------------------

    /// Answers with the first entry whose needle occurs in the prompt.
    struct ScriptedGenerator(Vec<(&'static str, String)>);

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            Ok(self
                .0
                .iter()
                .find(|(needle, _)| request.prompt.contains(needle))
                .map(|(_, answer)| answer.clone())
                .unwrap_or_default())
        }
    }

    /// Returns hits for every query containing a needle.
    struct NeedleSearch(Vec<(&'static str, Vec<ProfileHit>)>);

    #[async_trait]
    impl ProfileSearch for NeedleSearch {
        fn name(&self) -> &str {
            "needle"
        }

        async fn search(&self, queries: &[String]) -> Result<Vec<ProfileHit>> {
            Ok(queries
                .iter()
                .flat_map(|q| {
                    self.0
                        .iter()
                        .filter(|(needle, _)| q.ends_with(needle))
                        .flat_map(|(_, hits)| hits.clone())
                })
                .collect())
        }
    }

    struct TableValidator(HashMap<String, ValidationOutcome>);

    #[async_trait]
    impl ProfileValidator for TableValidator {
        async fn validate(&self, profile: &Profile, _company: &str) -> ValidationOutcome {
            self.0
                .get(&profile.url)
                .cloned()
                .unwrap_or(ValidationOutcome::Valid)
        }
    }

    // ---- helpers ---------------------------------------------------------

    const CHAMPION_PROMPT: &str = "Return exactly one contact";
    const SWEEP_PROMPT: &str = "three groups";
    const CSUITE_PROMPT: &str = "- CFO";

    fn config() -> PipelineConfig {
        PipelineConfig {
            min_bucket_size: 5,
            min_total_profiles: 3,
            profile_host: "linkedin.com".into(),
            validate_links: false,
        }
    }

    fn url(slug: &str) -> String {
        format!("https://www.linkedin.com/in/{slug}")
    }

    fn hit(title: &str, slug: &str) -> ProfileHit {
        ProfileHit {
            url: url(slug),
            title: title.into(),
            snippet: String::new(),
            query: "q".into(),
        }
    }

    fn request(champion: Option<&str>) -> ContactRequest {
        ContactRequest {
            company: "Acme".into(),
            champion: champion.map(str::to_string),
        }
    }

    fn standard_keyword() -> NeedleSearch {
        NeedleSearch(vec![
            (
                " CMO",
                vec![
                    hit("Jane Smith - CMO - Acme", "janesmith"),
                    hit("Mo Park - Director Marketing - Acme", "mopark"),
                    hit("Lu Tan - Marketing Manager", "lutan"),
                ],
            ),
            (
                " CEO",
                vec![
                    hit("Al Ray - CEO - Acme", "alray"),
                    hit("Mo Park - Director Marketing - Acme", "mopark"),
                ],
            ),
        ])
    }

    fn csuite_answer() -> String {
        format!("Cy Dee\nTitle: CFO at Acme\nLinkedIn: {}", url("cydee"))
    }

    async fn run(pipeline: ContactPipeline, champion: Option<&str>) -> ContactReport {
        pipeline.run(&request(champion), &SilentProgress).await.unwrap()
    }

    // ---- tests -----------------------------------------------------------

    #[tokio::test]
    async fn bucketed_report_keeps_buckets_disjoint() {
        let generator = Arc::new(ScriptedGenerator(vec![(CSUITE_PROMPT, csuite_answer())]));
        let pipeline = ContactPipeline::new(config(), generator)
            .unwrap()
            .with_keyword_search(Arc::new(standard_keyword()));

        let report = run(pipeline, None).await;

        assert_eq!(report.mode, ReportMode::Bucketed);
        assert_eq!(report.marketing.len(), 3);
        assert_eq!(report.leadership.len(), 2);
        for p in &report.leadership {
            assert!(report.marketing.iter().all(|m| m.url != p.url));
        }

        let raw: usize = report.passes.iter().map(|p| p.returned).sum();
        assert_eq!(raw, 6);
        assert!(report.marketing.len() + report.leadership.len() < raw);

        assert!(report.text.starts_with(MARKETING_HEADER));
        let divider = report.text.find(SECTION_DIVIDER).unwrap();
        assert!(report.text[divider..].contains("Al Ray"));
        assert_eq!(report.links.len(), 5);
        assert_eq!(report.links[0].name, "Jane Smith");
    }

    #[tokio::test]
    async fn too_few_profiles_switch_to_sweep() {
        let keyword = NeedleSearch(vec![
            (" CMO", vec![hit("Jane Smith - CMO", "janesmith")]),
            (" CEO", vec![hit("Al Ray - CEO", "alray")]),
        ]);
        let sweep = format!(
            "**Ann Lee**\nTitle: CEO\nLinkedIn: {}\n\nBo Chen\nTitle: CMO\nLinkedIn: {}",
            url("annlee"),
            url("bochen")
        );
        let generator = Arc::new(ScriptedGenerator(vec![(SWEEP_PROMPT, sweep)]));
        let pipeline = ContactPipeline::new(config(), generator)
            .unwrap()
            .with_keyword_search(Arc::new(keyword));

        let report = run(pipeline, None).await;

        assert_eq!(report.mode, ReportMode::GroundedSweep);
        assert!(!report.text.contains(MARKETING_HEADER));
        assert!(!report.text.contains("**"));
        assert!(report.marketing.is_empty() && report.leadership.is_empty());
        let names: Vec<&str> = report.links.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Ann Lee", "Bo Chen"]);
    }

    #[tokio::test]
    async fn empty_sweep_falls_through_to_notice() {
        let generator = Arc::new(ScriptedGenerator(vec![]));
        let pipeline = ContactPipeline::new(config(), generator).unwrap();

        let report = run(pipeline, None).await;

        assert_eq!(report.mode, ReportMode::ManualResearch);
        assert_eq!(report.text, MANUAL_RESEARCH_NOTICE);
        assert!(report.links.is_empty());
        // keyword passes ran empty, grounded escalations all executed
        assert_eq!(report.passes.iter().filter(|p| p.executed).count(), 3);
    }

    #[tokio::test]
    async fn resolved_champion_replaces_listing_entry() {
        let champion_answer = format!(
            "Jane Smith\nTitle: Chief Marketing Officer at Acme\nLinkedIn: {}",
            url("janesmith")
        );
        let generator = Arc::new(ScriptedGenerator(vec![
            (CHAMPION_PROMPT, champion_answer),
            (CSUITE_PROMPT, csuite_answer()),
        ]));
        let pipeline = ContactPipeline::new(config(), generator)
            .unwrap()
            .with_keyword_search(Arc::new(standard_keyword()));

        let report = run(pipeline, Some("Jane Smith")).await;

        assert!(report.text.starts_with("[CHAMPION] Jane Smith\nTitle: Chief Marketing Officer"));
        assert_eq!(report.text.matches(&url("janesmith")).count(), 1);
        assert_eq!(report.text.matches(CHAMPION_MARKER).count(), 1);
        assert_eq!(report.links[0].url, url("janesmith"));
        assert_eq!(report.links.iter().filter(|l| l.name == "Jane Smith").count(), 1);
        assert!(report.champion.as_ref().unwrap().is_resolved());
        // the champion is reported once, not again in its bucket
        assert_eq!(report.marketing.len(), 2);
        assert!(report.marketing.iter().all(|p| p.url != url("janesmith")));
        assert!(report.leadership.iter().all(|p| p.url != url("janesmith")));
    }

    #[tokio::test]
    async fn unresolved_champion_gets_placeholder() {
        let generator = Arc::new(ScriptedGenerator(vec![(CSUITE_PROMPT, csuite_answer())]));
        let pipeline = ContactPipeline::new(config(), generator)
            .unwrap()
            .with_keyword_search(Arc::new(standard_keyword()));

        let report = run(pipeline, Some("Jane Smith")).await;

        assert!(report.text.starts_with(
            "[CHAMPION] Jane Smith\nTitle: Verify on profile\nLinkedIn: Search manually\n\n=== MARKETING ==="
        ));
        assert_eq!(report.text.matches(CHAMPION_MARKER).count(), 1);
        // name-only dedup still removes the listing entry
        assert!(!report.text.contains(&url("janesmith")));
        assert!(report.links.iter().all(|l| l.url != url("janesmith")));
        assert!(report.marketing.iter().all(|p| p.url != url("janesmith")));
    }

    #[tokio::test]
    async fn repaired_link_reaches_report() {
        let broken = url("jos%C3%83-garcia");
        let fixed = url("jose-garcia");
        let keyword = NeedleSearch(vec![
            (
                " CMO",
                vec![
                    ProfileHit {
                        url: broken.clone(),
                        title: "José García - CMO".into(),
                        snippet: String::new(),
                        query: "q".into(),
                    },
                    hit("Mo Park - Director Marketing", "mopark"),
                ],
            ),
            (" CEO", vec![hit("Al Ray - CEO", "alray")]),
        ]);
        let validator = TableValidator(HashMap::from([(
            broken.clone(),
            ValidationOutcome::Repaired(fixed.clone()),
        )]));
        let pipeline = ContactPipeline::new(config(), Arc::new(ScriptedGenerator(vec![])))
            .unwrap()
            .with_keyword_search(Arc::new(keyword))
            .with_validator(Arc::new(validator));

        let report = run(pipeline, None).await;

        assert_eq!(report.mode, ReportMode::Bucketed);
        assert_eq!(report.marketing[0].url, fixed);
        assert!(report.text.contains(&fixed));
        assert!(!report.text.contains(&broken));
        assert_eq!(report.validation.repaired, 1);
    }

    #[tokio::test]
    async fn removed_links_below_minimum_switch_to_sweep() {
        let sweep = format!("Ann Lee\nTitle: CEO\nLinkedIn: {}", url("annlee"));
        let generator = Arc::new(ScriptedGenerator(vec![(SWEEP_PROMPT, sweep)]));
        let validator = TableValidator(HashMap::from([
            (url("janesmith"), ValidationOutcome::Removed),
            (url("lutan"), ValidationOutcome::Removed),
        ]));
        let pipeline = ContactPipeline::new(config(), generator)
            .unwrap()
            .with_keyword_search(Arc::new(standard_keyword()))
            .with_validator(Arc::new(validator));

        let report = run(pipeline, None).await;

        // four distinct profiles were found, two survive validation
        assert_eq!(report.validation.removed, 2);
        assert_eq!(report.mode, ReportMode::GroundedSweep);
        assert!(!report.text.contains(MARKETING_HEADER));
        assert!(report.marketing.is_empty() && report.leadership.is_empty());
        assert_eq!(report.links.len(), 1);
        assert_eq!(report.links[0].url, url("annlee"));
    }

    #[tokio::test]
    async fn blank_company_rejected() {
        let pipeline = ContactPipeline::new(config(), Arc::new(ScriptedGenerator(vec![]))).unwrap();
        let err = pipeline
            .run(
                &ContactRequest {
                    company: "  ".into(),
                    champion: None,
                },
                &SilentProgress,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DealScoutError::Validation { .. }));
    }

    #[tokio::test]
    async fn report_serializes_for_json_output() {
        let generator = Arc::new(ScriptedGenerator(vec![(CSUITE_PROMPT, csuite_answer())]));
        let pipeline = ContactPipeline::new(config(), generator)
            .unwrap()
            .with_keyword_search(Arc::new(standard_keyword()));

        let report = run(pipeline, None).await;
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["mode"], "bucketed");
        assert_eq!(json["company"], "Acme");
        assert_eq!(json["passes"].as_array().unwrap().len(), 6);
        assert_eq!(json["marketing"][0]["bucket"], "MARKETING");
        assert_eq!(json["validation"]["verdicts"][0]["outcome"]["verdict"], "valid");
    }
}
