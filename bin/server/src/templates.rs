//! HTML pages rendered by the gateway.
//!
//! Two pages exist: the login page and the invalid-domain page. Each can be
//! overridden by a file of the same name in the configured templates
//! directory; otherwise the built-in version is used. Handlebars escapes
//! `{{ }}` expressions, so query-supplied text is safe to interpolate.

use std::path::Path;

use axum::response::Html;
use handlebars::Handlebars;
use serde::Serialize;

use crate::error::TemplateError;

/// Template name of the login page.
pub const LOGIN_PAGE: &str = "login.html";

/// Template name of the invalid-domain page.
pub const INVALID_DOMAIN_PAGE: &str = "invalid_domain.html";

const BUILTIN: [(&str, &str); 2] = [
    (LOGIN_PAGE, include_str!("../templates/login.html")),
    (
        INVALID_DOMAIN_PAGE,
        include_str!("../templates/invalid_domain.html"),
    ),
];

/// Context for the login page.
#[derive(Debug, Serialize)]
pub struct LoginPage<'a> {
    pub title: &'a str,
    pub authorization_url: &'a str,
}

/// Context for the invalid-domain page.
#[derive(Debug, Serialize)]
pub struct InvalidDomainPage<'a> {
    pub title: &'a str,
    pub authorization_url: &'a str,
    pub domain: &'a str,
}

/// Registry of the gateway's pages.
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    /// Registers the built-in pages only.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in template fails to compile.
    pub fn builtin() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        for (name, source) in BUILTIN {
            registry
                .register_template_string(name, source)
                .map_err(|e| TemplateError::Register {
                    name: name.to_string(),
                    details: e.to_string(),
                })?;
        }
        Ok(Self { registry })
    }

    /// Registers the pages, preferring files found in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if an override file exists but does not compile.
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let mut templates = Self::builtin()?;
        for (name, _) in BUILTIN {
            let path = dir.join(name);
            if !path.is_file() {
                continue;
            }
            templates
                .registry
                .register_template_file(name, &path)
                .map_err(|e| TemplateError::Register {
                    name: path.display().to_string(),
                    details: e.to_string(),
                })?;
            tracing::info!(template = name, path = %path.display(), "Using template override");
        }
        Ok(templates)
    }

    /// Renders a registered page with the given context.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<Html<String>, TemplateError> {
        self.registry
            .render(name, context)
            .map(Html)
            .map_err(|e| TemplateError::Render {
                name: name.to_string(),
                details: e.to_string(),
            })
    }
}
