// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::SetupEmail;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
	pub subject: String,
	pub html: String,
	pub text: String,
}

pub fn render_setup_email(email: &SetupEmail) -> RenderedEmail {
	let agency = escape_html(&email.agency_name);
	let url = email.setup_url.expose();
	let url_html = escape_html(url);

	let mut details_text = String::new();
	let mut details_html = String::new();
	if let Some(instance_url) = &email.instance_url {
		details_text.push_str(&format!("Instance: {instance_url}\n"));
		details_html.push_str(&format!(
			"<li>Instance: {}</li>",
			escape_html(instance_url)
		));
	}
	if let Some(project_id) = &email.project_id {
		details_text.push_str(&format!("Project: {project_id}\n"));
		details_html.push_str(&format!("<li>Project: {}</li>", escape_html(project_id)));
	}

	let subject = format!("Finish setting up {}", email.agency_name);

	let text = format!(
		"Hi,\n\n\
		 Your workspace for {name} is ready.\n\n\
		 {details_text}\n\
		 Finish setting up your account here (valid for 24 hours, single use):\n\
		 {url}\n",
		name = email.agency_name,
	);

	let html = format!(
		"<p>Hi,</p>\
		 <p>Your workspace for <strong>{agency}</strong> is ready.</p>\
		 <ul>{details_html}</ul>\
		 <p><a href=\"{url_html}\">Finish setting up your account</a></p>\
		 <p>This link is valid for 24 hours and can be used once.</p>"
	);

	RenderedEmail {
		subject,
		html,
		text,
	}
}

fn escape_html(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	for c in input.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use onboard_common_secret::SecretString;
	use proptest::prelude::*;

	fn email(agency: &str) -> SetupEmail {
		SetupEmail {
			agency_name: agency.to_string(),
			admin_email: "owner@acme.io".to_string(),
			setup_url: SecretString::from("https://app.example.com/setup?token=abc&x=1"),
			instance_url: Some("https://acme.db.example.com".to_string()),
			project_id: Some("prj_42".to_string()),
		}
	}

	#[test]
	fn includes_url_instance_and_project() {
		let rendered = render_setup_email(&email("Acme"));
		assert_eq!(rendered.subject, "Finish setting up Acme");
		assert!(rendered
			.text
			.contains("https://app.example.com/setup?token=abc&x=1"));
		assert!(rendered.text.contains("https://acme.db.example.com"));
		assert!(rendered.text.contains("prj_42"));
		assert!(rendered.html.contains("token=abc&amp;x=1"));
	}

	#[test]
	fn omits_missing_details() {
		let mut e = email("Acme");
		e.instance_url = None;
		e.project_id = None;
		let rendered = render_setup_email(&e);
		assert!(!rendered.text.contains("Instance:"));
		assert!(!rendered.html.contains("<li>"));
	}

	#[test]
	fn escapes_agency_name_in_html() {
		let rendered = render_setup_email(&email("<script>alert(1)</script>"));
		assert!(!rendered.html.contains("<script>"));
		assert!(rendered.html.contains("&lt;script&gt;"));
	}

	proptest! {
		#[test]
		fn escaped_output_has_no_raw_markup(s in ".{0,64}") {
			let escaped = escape_html(&s);
			prop_assert!(!escaped.contains('<'));
			prop_assert!(!escaped.contains('>'));
			prop_assert!(!escaped.contains('"'));
		}
	}
}
