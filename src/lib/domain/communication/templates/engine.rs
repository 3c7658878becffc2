//! Template loading, caching and rendering

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use chrono::Utc;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, instrument};

use crate::domain::communication::errors::EmailError;

use super::{
    source::TemplateSource,
    template::{RenderedEmailContent, TemplateContent, TemplateId, TemplateValidation},
};

lazy_static! {
    static ref PLACEHOLDER_REGEX: Regex =
        Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("placeholder regex is valid");
}

/// How long a loaded template stays fresh
pub const DEFAULT_TEMPLATE_TTL: Duration = Duration::from_secs(60 * 60);

struct CachedTemplate {
    content: TemplateContent,
    loaded_at: Instant,
}

/// Snapshot of the template cache
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCacheStatistics {
    /// Fresh entries currently cached
    pub cached_templates: usize,

    /// Loads served from the cache
    pub hits: u64,

    /// Loads that went to the source
    pub misses: u64,

    /// Cache TTL in seconds
    pub ttl_seconds: u64,

    /// Templates currently cached
    pub templates: Vec<TemplateId>,
}

/// Loads templates through a TTL cache and renders them
pub struct TemplateEngine {
    source: Box<dyn TemplateSource>,
    ttl: Duration,
    cache: Mutex<HashMap<TemplateId, CachedTemplate>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TemplateEngine {
    /// Creates an engine over `source` with the given cache TTL
    pub fn new(source: impl TemplateSource, ttl: Duration) -> Self {
        Self {
            source: Box::new(source),
            ttl,
            cache: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the template content, from the cache while it is fresh.
    ///
    /// The cache lock is held across the fetch, so concurrent misses for the
    /// same template reach the source once.
    #[instrument(skip(self))]
    pub async fn load_template(&self, id: TemplateId) -> Result<TemplateContent, EmailError> {
        let mut cache = self.cache.lock().await;

        if let Some(entry) = cache.get(&id) {
            if entry.loaded_at.elapsed() < self.ttl {
                debug!("template cache hit");
                self.hits.fetch_add(1, Ordering::Relaxed);

                return Ok(entry.content.clone());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);

        let content = self.source.fetch(id).await.map_err(|err| match err {
            EmailError::TemplateRenderFailed(_) => err,
            other => EmailError::TemplateRenderFailed(format!("could not load {id}: {other}")),
        })?;

        debug!("template loaded from source");

        cache.insert(
            id,
            CachedTemplate {
                content: content.clone(),
                loaded_at: Instant::now(),
            },
        );

        Ok(content)
    }

    /// Substitutes `variables` into `content`.
    ///
    /// Fails with [`EmailError::TemplateVariableMissing`] if the template names
    /// a variable that was not supplied. Placeholders are only read from the
    /// template text, never from substituted values.
    pub fn render_template(
        &self,
        content: &TemplateContent,
        variables: &BTreeMap<String, String>,
    ) -> Result<RenderedEmailContent, EmailError> {
        let subject = substitute(&content.subject, variables, false)?;
        let html_body = substitute(&content.html_body, variables, true)?;
        let text_body = substitute(&content.text_body, variables, false)?;

        let html_body = if html_body.trim().is_empty() {
            html_body
        } else {
            css_inline::inline(&html_body)?
        };

        Ok(RenderedEmailContent {
            subject: subject.trim().to_string(),
            html_body,
            text_body,
            rendered_at: Utc::now(),
        })
    }

    /// Loads and renders in one step
    pub async fn render(
        &self,
        id: TemplateId,
        variables: &BTreeMap<String, String>,
    ) -> Result<RenderedEmailContent, EmailError> {
        let content = self.load_template(id).await?;

        self.render_template(&content, variables)
    }

    /// Compares supplied data with the template's required variables
    pub fn validate_template_data(
        &self,
        id: TemplateId,
        data: &BTreeMap<String, String>,
    ) -> TemplateValidation {
        let required = id.required_variables();

        let missing_variables: Vec<String> = required
            .iter()
            .filter(|name| !data.contains_key(**name))
            .map(|name| name.to_string())
            .collect();

        let unused_variables: Vec<String> = data
            .keys()
            .filter(|key| !required.contains(&key.as_str()))
            .cloned()
            .collect();

        TemplateValidation {
            is_valid: missing_variables.is_empty(),
            missing_variables,
            unused_variables,
        }
    }

    /// Drops every cached template
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();

        debug!("template cache cleared");
    }

    /// Cache counters and fresh entries
    pub async fn cache_statistics(&self) -> TemplateCacheStatistics {
        let cache = self.cache.lock().await;

        let mut templates: Vec<TemplateId> = cache
            .iter()
            .filter(|(_, entry)| entry.loaded_at.elapsed() < self.ttl)
            .map(|(id, _)| *id)
            .collect();
        templates.sort();

        TemplateCacheStatistics {
            cached_templates: templates.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ttl_seconds: self.ttl.as_secs(),
            templates,
        }
    }
}

impl fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("source", &"TemplateSource")
            .field("ttl", &self.ttl)
            .finish()
    }
}

fn substitute(
    template: &str,
    variables: &BTreeMap<String, String>,
    html: bool,
) -> Result<String, EmailError> {
    let mut missing: Option<String> = None;

    let rendered = PLACEHOLDER_REGEX.replace_all(template, |captures: &Captures| {
        let name = captures[1].trim();

        match variables.get(name) {
            Some(value) if html => escape_html(value),
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(EmailError::TemplateVariableMissing(name)),
        None => Ok(rendered.into_owned()),
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }

    escaped
}
