use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tera::{Context, Tera};

use crate::error::ApiError;

/// Server-side templates, compiled into the binary.
const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("privacy.html", include_str!("../templates/privacy.html")),
    ("weddings.html", include_str!("../templates/weddings.html")),
    ("new_wedding.html", include_str!("../templates/new_wedding.html")),
    ("wedding.html", include_str!("../templates/wedding.html")),
    ("commitment.html", include_str!("../templates/commitment.html")),
];

pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<Html<String>, ApiError> {
        Ok(Html(self.tera.render(name, context)?))
    }

    /// Render with an explicit status, used to send a form back with errors.
    pub fn render_with_status(
        &self,
        status: StatusCode,
        name: &str,
        context: &Context,
    ) -> Result<Response, ApiError> {
        Ok((status, self.render(name, context)?).into_response())
    }
}
