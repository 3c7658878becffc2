//! Email templates

mod engine;
mod source;
mod template;

pub use engine::{TemplateCacheStatistics, TemplateEngine, DEFAULT_TEMPLATE_TTL};
pub use source::{BuiltinTemplates, TemplateSource};
pub use template::{
    EmailTemplate, RenderedEmailContent, TemplateContent, TemplateId, TemplateValidation,
};

#[cfg(test)]
pub use source::MockTemplateSource;
