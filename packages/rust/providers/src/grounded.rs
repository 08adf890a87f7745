//! Grounded-search adapter: one batched generative request per pass.

use std::sync::Arc;

use async_trait::async_trait;
use dealscout_shared::{ProfileHit, ProfileUrlPattern, Result};
use tracing::{info, instrument};

use crate::parser::parse_profile_mentions;
use crate::prompts;
use crate::{GenerationRequest, ProfileSearch, TextGenerator};

/// Sweeps a company for several role keywords in a single grounded request
/// and parses profile mentions out of the answer.
pub struct GroundedSearch {
    generator: Arc<dyn TextGenerator>,
    company: String,
    pattern: ProfileUrlPattern,
}

impl GroundedSearch {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        company: impl Into<String>,
        pattern: ProfileUrlPattern,
    ) -> Self {
        Self {
            generator,
            company: company.into(),
            pattern,
        }
    }
}

#[async_trait]
impl ProfileSearch for GroundedSearch {
    fn name(&self) -> &str {
        "grounded"
    }

    /// `queries` are role keywords; they are batched into one request.
    #[instrument(skip_all, fields(provider = "grounded", company = %self.company, roles = queries.len()))]
    async fn search(&self, queries: &[String]) -> Result<Vec<ProfileHit>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = prompts::role_sweep(&self.company, queries, self.pattern.host());
        let text = self
            .generator
            .generate(&GenerationRequest::grounded(prompt).with_temperature(0.7))
            .await?;

        let hits = parse_profile_mentions(&text, &self.pattern, &queries.join(", "));
        info!(profiles = hits.len(), backend = self.generator.name(), "grounded search finished");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records prompts and replays a canned answer.
    struct CannedGenerator {
        answer: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            assert!(request.grounded);
            self.prompts.lock().unwrap().push(request.prompt.clone());
            Ok(self.answer.clone())
        }
    }

    #[tokio::test]
    async fn batches_roles_into_one_request() {
        let generator = Arc::new(CannedGenerator {
            answer: "Ann Lee\nTitle: CFO at Acme\nLinkedIn: https://www.linkedin.com/in/annlee\n\n\
                     Bo Chen\nTitle: COO at Acme\nLinkedIn: https://www.linkedin.com/in/bochen"
                .into(),
            prompts: Mutex::new(Vec::new()),
        });
        let search = GroundedSearch::new(generator.clone(), "Acme", ProfileUrlPattern::default());

        let hits = search
            .search(&["CFO".to_string(), "COO".to_string()])
            .await
            .unwrap();

        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Ann Lee - CFO at Acme");
        assert_eq!(hits[1].url, "https://www.linkedin.com/in/bochen");
        assert_eq!(hits[1].query, "CFO, COO");
    }

    #[tokio::test]
    async fn empty_role_list_skips_backend() {
        let generator = Arc::new(CannedGenerator {
            answer: String::new(),
            prompts: Mutex::new(Vec::new()),
        });
        let search = GroundedSearch::new(generator.clone(), "Acme", ProfileUrlPattern::default());

        assert!(search.search(&[]).await.unwrap().is_empty());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }
}
