//! Page templates compiled into the binary

use tera::Tera;

use crate::error::Result;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("macros.html", include_str!("../../templates/macros.html")),
    ("talent_card.html", include_str!("../../templates/talent_card.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("invite.html", include_str!("../../templates/invite.html")),
    ("error.html", include_str!("../../templates/error.html")),
    ("admin/dashboard.html", include_str!("../../templates/admin/dashboard.html")),
    ("admin/invites.html", include_str!("../../templates/admin/invites.html")),
    ("admin/talent.html", include_str!("../../templates/admin/talent.html")),
    (
        "admin/talent_detail.html",
        include_str!("../../templates/admin/talent_detail.html"),
    ),
    ("admin/intros.html", include_str!("../../templates/admin/intros.html")),
    ("admin/tags.html", include_str!("../../templates/admin/tags.html")),
    ("founder/browse.html", include_str!("../../templates/founder/browse.html")),
    ("founder/talent.html", include_str!("../../templates/founder/talent.html")),
    ("founder/intros.html", include_str!("../../templates/founder/intros.html")),
    ("founder/profile.html", include_str!("../../templates/founder/profile.html")),
    (
        "founder/shortlist.html",
        include_str!("../../templates/founder/shortlist.html"),
    ),
    ("talent/profile.html", include_str!("../../templates/talent/profile.html")),
    ("talent/intros.html", include_str!("../../templates/talent/intros.html")),
    (
        "talent/experience.html",
        include_str!("../../templates/talent/experience.html"),
    ),
];

pub const STYLESHEET: &str = include_str!("../../templates/site.css");

/// Build the template engine. `.html` templates are autoescaped.
pub fn load() -> Result<Tera> {
    let mut tera = Tera::default();
    // Registered together so inheritance resolves regardless of order
    tera.add_raw_templates(TEMPLATES.iter().copied())?;
    Ok(tera)
}
