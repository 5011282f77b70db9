//! Prompts that ask the model for a complete, styled poster document.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: the layout rules (page size, units, logo
//!    placeholder, "no commentary") live in exactly one place.
//!
//! 2. **Testability**: composing a prompt is a pure function of the profile
//!    and the output kind, so tests can assert on the exact text without a
//!    model in the loop.
//!
//! Two variants exist. The **document** prompt asks for a single A4 page in
//! millimetres with every section the data supports. The **social** prompt
//! asks for a 1080×1080 pixel canvas, heavy decoration, and only the most
//! eye-catching facts. Both name every non-empty field verbatim so the model
//! has no reason to invent facts, and both reserve [`LOGO_PLACEHOLDER`] as
//! the spot where [`crate::pipeline::embed`] later inlines the logo.

use crate::record::{ClubProfile, OutputKind};

/// Literal token the model must emit where the logo belongs.
///
/// Short and meaningless on purpose: the model reproduces it verbatim instead
/// of "helpfully" turning it into an `<img>` tag.
pub const LOGO_PLACEHOLDER: &str = "absjd";

/// A4 sheet size in millimetres (width, height).
pub const A4_MM: (u32, u32) = (210, 297);

/// Edge length of the square social canvas in CSS pixels.
pub const SOCIAL_CANVAS_PX: u32 = 1080;

/// Compose the generation prompt for `kind`.
///
/// Deterministic: the same profile and kind always yield the same string.
pub fn compose_prompt(profile: &ClubProfile, kind: OutputKind) -> String {
    match kind {
        OutputKind::Document => document_prompt(profile),
        OutputKind::Social => social_prompt(profile),
    }
}

/// Prompt for a single-page A4 print poster.
pub fn document_prompt(profile: &ClubProfile) -> String {
    let (w, h) = A4_MM;
    let mut prompt = format!(
        "Generate a COMPLETE HTML document (including <!DOCTYPE html>, <html>, <head>, and <body>) \
styled with embedded Tailwind CSS for a single-page A4 poster ({w}mm x {h}mm) using ALL the \
provided club details below.\n\n"
    );

    prompt.push_str(&club_information(profile));
    prompt.push_str(&audience_and_voice(profile));

    prompt.push_str(&format!(
        r#"<<< Design Requirements >>>
1. **Use ALL provided club information in relevant, visually distinct sections.**
2. **Mandatory sections:**
   - Header with club name, logo placeholder (use the text '{LOGO_PLACEHOLDER}' as a placeholder), and founding date.
   - Mission statement.
   - Achievements timeline or highlights.
   - Contact information (email, phone, website).
   - Social media handles (as text, not icons, for print).
3. **Optional sections (choose at least 2-3, or more if space allows):**
   - Membership benefits grid or list.
   - Upcoming events section.
   - Meeting schedule card.
   - Member statistics infographic.
   - Leadership team display.
   - If some data is missing, skip that section and use the space for creative design elements.
4. **Design and Layout:**
   - Use a professional, modern gradient background with high-contrast, readable text.
   - All measurements and sizing must be in millimeters (mm). Do NOT use other units.
   - Ensure ALL content fits on a single A4 page ({w}mm x {h}mm); do the math and make sure the units add up, leaving a small empty buffer at the edges.
   - Use Tailwind CSS for all styling.
   - Put the logo in a container that fits any aspect ratio (object-fit: contain).
   - This is for print: do NOT use social media icons, only text handles.
   - Use whitespace and sectioning for a clear visual hierarchy; keep the page balanced, not overcrowded.
5. **Technical:**
   - The HTML must be fully self-contained and ready for rendering in a headless browser.
   - The logo placeholder must be exactly the text '{LOGO_PLACEHOLDER}', with no image tag around it. The image is inserted afterwards.
   - Include:
     <style>
       @page {{ size: A4; }}
       body {{ -webkit-print-color-adjust: exact; }}
     </style>
   - Do NOT use external images, fonts, or scripts except for the Tailwind CDN.
   - Output exactly one HTML document and nothing else: no explanations before or after it.

"#
    ));

    prompt.push_str(&format!(
        r#"<<< Example Structure >>>
<!DOCTYPE html>
<html>
<head>
  <script src="https://cdn.tailwindcss.com"></script>
  <style>
    @page {{ size: A4; }}
    body {{ -webkit-print-color-adjust: exact; }}
  </style>
</head>
<body class="w-[{w}mm] h-[{h}mm] bg-gradient-to-br from-blue-100 to-purple-50 p-8 space-y-8">
  <header class="flex items-center gap-6 mb-8">
    <div class="w-32 h-32 bg-white rounded-full flex items-center justify-center shadow-lg overflow-hidden">
      {LOGO_PLACEHOLDER}
    </div>
    <div>
"#
    ));
    if !is_blank(&profile.name) {
        prompt.push_str(&format!(
            "      <h1 class=\"text-5xl font-bold text-blue-800\">{}</h1>\n",
            profile.name
        ));
    }
    if !is_blank(&profile.founding_date) {
        prompt.push_str(&format!(
            "      <p class=\"text-xl text-blue-600 mt-2\">Est. {}</p>\n",
            profile.founding_date
        ));
    }
    prompt.push_str(
        r#"    </div>
  </header>
  <!-- remaining sections, built from the club information above -->
</body>
</html>
"#,
    );
    prompt
}

/// Prompt for a square, decoration-heavy social media image.
///
/// Kept free of physical units: everything is specified in pixels.
pub fn social_prompt(profile: &ClubProfile) -> String {
    let px = SOCIAL_CANVAS_PX;
    let mut prompt = format!(
        "Generate a COMPLETE HTML document (including <!DOCTYPE html>, <html>, <head>, and <body>) \
styled with embedded Tailwind CSS for a **square social media post ({px}x{px}px)** using the \
provided club details below.\n\n"
    );

    prompt.push_str(&club_information(profile));
    prompt.push_str(&audience_and_voice(profile));

    prompt.push_str(&format!(
        r#"<<< Social Media Post Design Requirements >>>
1. **Make the post visually stunning and highly engaging for Instagram or similar platforms.**
2. **Decorate the borders and edges** with gradients, sparkles, abstract shapes, confetti, doodles or stickers.
3. **Use large, bold, playful typography** for the club name and key facts. Make the club name unmistakable.
4. **Logo placeholder:** write the text '{LOGO_PLACEHOLDER}' where the logo goes, centered or prominently placed, inside a rounded container that fits any aspect ratio (object-fit: contain).
5. **Be selective:** you do NOT need every field. Prioritise the club name, mission, one or two achievements, one or two benefits, and a call to action or upcoming event.
6. **Use emojis, icons and playful color schemes**, especially in headings and near the edges.
7. **All sizing must be in pixels (px) for the {px}x{px}px canvas.** Do NOT use other units.
8. **Spread the text out to fill the canvas** while keeping it readable and balanced.
9. **Do NOT use external images, fonts, or scripts except for the Tailwind CDN.**
10. **The logo placeholder must be exactly the text '{LOGO_PLACEHOLDER}'**, with no image tag around it. The image is inserted afterwards.
11. **Output exactly one HTML document and nothing else:** no explanations before or after it.

"#
    ));

    prompt.push_str(&format!(
        r#"<<< Example Structure >>>
<!DOCTYPE html>
<html>
<head>
  <script src="https://cdn.tailwindcss.com"></script>
  <style>
    body {{ width: {px}px; height: {px}px; margin: 0; padding: 0; overflow: hidden; }}
  </style>
</head>
<body class="relative w-[{px}px] h-[{px}px] bg-gradient-to-br from-pink-100 via-yellow-100 to-blue-100 flex flex-col items-center justify-center overflow-hidden">
  <div class="absolute top-0 left-0 w-full h-24 flex justify-between px-8 pointer-events-none">
    <div class="w-24 h-24 rounded-full bg-pink-300 opacity-60 blur-2xl"></div>
    <div class="w-24 h-24 rounded-full bg-yellow-300 opacity-60 blur-2xl"></div>
  </div>
  <div class="absolute top-10 left-10 text-4xl">✨</div>
  <div class="absolute bottom-10 right-10 text-4xl">🎉</div>
  <div class="relative z-10 flex flex-col items-center justify-center w-full h-full px-12 py-8">
    <div class="w-40 h-40 bg-white rounded-full shadow-lg flex items-center justify-center mb-6 overflow-hidden">
      {LOGO_PLACEHOLDER}
    </div>
"#
    ));

    if !is_blank(&profile.name) {
        prompt.push_str(&format!(
            "    <h1 class=\"text-5xl font-extrabold text-pink-700 mb-2 text-center\">{}</h1>\n",
            profile.name
        ));
    }
    if !is_blank(&profile.description) {
        prompt.push_str(&format!(
            "    <p class=\"text-2xl text-blue-700 mb-4 text-center\">{}</p>\n",
            profile.description
        ));
    }
    if let Some(event) = first_items(&profile.upcoming_events, 1).first() {
        prompt.push_str(&format!(
            "    <div class=\"bg-yellow-200 rounded-xl px-6 py-2 mb-4 text-lg font-semibold text-yellow-900 shadow\">Next: {event}</div>\n"
        ));
    }
    let benefits = first_items(&profile.benefits, 2);
    if !benefits.is_empty() {
        prompt.push_str("    <div class=\"flex flex-wrap gap-2 justify-center mb-4\">");
        for b in benefits {
            prompt.push_str(&format!(
                "<span class=\"bg-pink-200 rounded-full px-4 py-1 text-pink-800 text-base font-medium\">{b}</span>"
            ));
        }
        prompt.push_str("</div>\n");
    }
    if let Some(achievement) = first_items(&profile.achievements, 1).first() {
        prompt.push_str(&format!(
            "    <div class=\"text-lg text-purple-700 mb-4\">🏆 {achievement}</div>\n"
        ));
    }

    let handles = &profile.social_media;
    if !is_blank(&handles.instagram) || !is_blank(&handles.twitter) {
        prompt.push_str("    <div class=\"flex gap-4 mt-4\">\n");
        if !is_blank(&handles.instagram) {
            prompt.push_str(&format!(
                "      <span class=\"text-2xl\">📸 @{}</span>\n",
                handles.instagram
            ));
        }
        if !is_blank(&handles.twitter) {
            prompt.push_str(&format!(
                "      <span class=\"text-2xl\">🐦 @{}</span>\n",
                handles.twitter
            ));
        }
        prompt.push_str("    </div>\n");
    }

    prompt.push_str(
        r#"  </div>
</body>
</html>
"#,
    );
    prompt
}

// ── Shared blocks ────────────────────────────────────────────────────────

/// The fact sheet: one line per non-empty field, values copied verbatim.
fn club_information(profile: &ClubProfile) -> String {
    let mut block = String::from("<<< Club Information >>>\n");
    push_field(&mut block, "- Name", &profile.name);
    push_field(&mut block, "- Mission", &profile.description);
    push_field(&mut block, "- Founded", &profile.founding_date);
    push_field(&mut block, "- Current Members", &profile.current_member_count);
    push_field(&mut block, "- Meeting Frequency", &profile.meeting_frequency);
    push_field(&mut block, "- Meeting Location", &profile.meeting_location);
    push_field(&mut block, "- Upcoming Events", &profile.upcoming_events);
    push_field(&mut block, "- Membership Benefits", &profile.benefits);
    push_field(&mut block, "- Achievements", &profile.achievements);
    push_field(&mut block, "- Leadership Team", &profile.leadership_team);

    let handles = &profile.social_media;
    if !handles.is_empty() {
        block.push_str("- Social Media:\n");
        push_field(&mut block, "    Facebook", &handles.facebook);
        push_field(&mut block, "    Twitter", &handles.twitter);
        push_field(&mut block, "    Instagram", &handles.instagram);
    }

    push_field(&mut block, "- Contact Email", &profile.contact_email);
    push_field(&mut block, "- Contact Phone", &profile.contact_phone);
    push_field(&mut block, "- Website", &profile.website_url);
    block.push('\n');
    block
}

/// Optional block describing the intended audience and voice.
///
/// Empty string when the profile carries none of these fields.
fn audience_and_voice(profile: &ClubProfile) -> String {
    let mut lines = String::new();
    push_field(&mut lines, "- Club Type", &profile.club_type);
    let focus: Vec<&str> = profile
        .focus_areas
        .iter()
        .map(String::as_str)
        .filter(|s| !is_blank(s))
        .collect();
    if !focus.is_empty() {
        push_field(&mut lines, "- Focus Areas", &focus.join(", "));
    }
    push_field(&mut lines, "- Tone", &profile.tone);
    if let Some(audience) = profile.audience.as_ref().filter(|a| !a.is_empty()) {
        push_field(&mut lines, "- Target Group", &audience.target_group);
        push_field(&mut lines, "- Age Range", &audience.age_range);
        push_field(&mut lines, "- Interest Level", &audience.interest_level);
        push_field(&mut lines, "- Prior Knowledge", &audience.prior_knowledge);
    }

    if lines.is_empty() {
        return lines;
    }
    format!("<<< Audience & Voice >>>\n{lines}\n")
}

fn push_field(out: &mut String, label: &str, value: &str) {
    if !is_blank(value) {
        out.push_str(&format!("{label}: {value}\n"));
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// First `n` non-empty entries of a comma-separated list, trimmed.
fn first_items(list: &str, n: usize) -> Vec<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(n)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Audience, SocialHandles};

    fn full_profile() -> ClubProfile {
        ClubProfile {
            name: "Nature Explorers".into(),
            description: "Connect people with nature".into(),
            founding_date: "2010-04-22".into(),
            current_member_count: "75".into(),
            meeting_frequency: "Monthly on first Saturday at 9 AM".into(),
            meeting_location: "Riverside Hall".into(),
            upcoming_events: "Spring Hike on May 20, River Cleanup on June 5".into(),
            benefits: "Outdoor adventures, field guides, trail snacks".into(),
            achievements: "Planted 1,000 trees, restored two wetlands".into(),
            leadership_team: "Coordinator: Sarah Green".into(),
            social_media: SocialHandles {
                facebook: "fb.example/nature".into(),
                twitter: "nature_tw".into(),
                instagram: "nature_ig".into(),
            },
            contact_email: "info@nature.example".into(),
            contact_phone: "+1-555-987-6543".into(),
            website_url: "https://nature.example".into(),
            ..Default::default()
        }
    }

    fn all_values(p: &ClubProfile) -> Vec<&str> {
        vec![
            &p.name,
            &p.description,
            &p.founding_date,
            &p.current_member_count,
            &p.meeting_frequency,
            &p.meeting_location,
            &p.upcoming_events,
            &p.benefits,
            &p.achievements,
            &p.leadership_team,
            &p.social_media.facebook,
            &p.social_media.twitter,
            &p.social_media.instagram,
            &p.contact_email,
            &p.contact_phone,
            &p.website_url,
        ]
        .into_iter()
        .map(String::as_str)
        .collect()
    }

    #[test]
    fn document_prompt_names_every_field() {
        let p = full_profile();
        let prompt = compose_prompt(&p, OutputKind::Document);
        for value in all_values(&p) {
            assert!(prompt.contains(value), "missing {value:?}");
        }
    }

    #[test]
    fn document_prompt_specifies_a4_in_millimetres() {
        let prompt = compose_prompt(&full_profile(), OutputKind::Document);
        assert!(prompt.contains("210mm x 297mm"));
        assert!(prompt.contains("@page { size: A4; }"));
        assert!(!prompt.contains("1080x1080px"));
    }

    #[test]
    fn social_prompt_uses_pixel_canvas_only() {
        let prompt = compose_prompt(&full_profile(), OutputKind::Social);
        assert!(prompt.contains("1080x1080px"));
        assert!(prompt.contains("width: 1080px; height: 1080px"));
        assert!(!prompt.contains("mm"), "social prompt must not use millimetres");
        assert!(!prompt.to_lowercase().contains("millimet"));
    }

    #[test]
    fn social_prompt_names_every_field() {
        let p = full_profile();
        let prompt = compose_prompt(&p, OutputKind::Social);
        for value in all_values(&p) {
            assert!(prompt.contains(value), "missing {value:?}");
        }
    }

    #[test]
    fn social_example_highlights_first_items() {
        let prompt = social_prompt(&full_profile());
        assert!(prompt.contains("Next: Spring Hike on May 20</div>"));
        assert!(prompt.contains(">Outdoor adventures</span>"));
        assert!(prompt.contains(">field guides</span>"));
        assert!(!prompt.contains(">trail snacks</span>"));
        assert!(prompt.contains("🏆 Planted 1,000 trees</div>"));
        assert!(prompt.contains("📸 @nature_ig"));
        assert!(prompt.contains("🐦 @nature_tw"));
    }

    #[test]
    fn both_variants_reserve_the_placeholder() {
        for kind in [OutputKind::Document, OutputKind::Social] {
            let prompt = compose_prompt(&full_profile(), kind);
            assert!(prompt.contains(&format!("'{LOGO_PLACEHOLDER}'")), "{kind}");
            assert!(prompt.contains("Output exactly one HTML document"), "{kind}");
        }
    }

    #[test]
    fn empty_fields_are_omitted() {
        let p = ClubProfile {
            name: "Chess Club".into(),
            description: "We play chess on Tuesdays".into(),
            ..Default::default()
        };
        let prompt = compose_prompt(&p, OutputKind::Document);
        assert!(prompt.contains("- Name: Chess Club\n"));
        assert!(prompt.contains("- Mission: We play chess on Tuesdays\n"));
        assert!(!prompt.contains("- Founded:"));
        assert!(!prompt.contains("- Social Media:"));
        assert!(!prompt.contains("- Contact Email:"));
        assert!(!prompt.contains("Est. "));
        assert!(!prompt.contains("<<< Audience & Voice >>>"));

        let social = compose_prompt(&p, OutputKind::Social);
        assert!(!social.contains("Next: "));
        assert!(!social.contains("📸"));
    }

    #[test]
    fn audience_block_when_present() {
        let p = ClubProfile {
            name: "Robotics".into(),
            focus_areas: vec!["AI".into(), " ".into(), "Drones".into()],
            tone: "playful".into(),
            audience: Some(Audience {
                target_group: "students".into(),
                age_range: "18-25".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let prompt = document_prompt(&p);
        assert!(prompt.contains("<<< Audience & Voice >>>"));
        assert!(prompt.contains("- Focus Areas: AI, Drones\n"));
        assert!(prompt.contains("- Tone: playful\n"));
        assert!(prompt.contains("- Target Group: students\n"));
        assert!(!prompt.contains("- Prior Knowledge:"));
    }

    #[test]
    fn composition_is_deterministic() {
        let p = full_profile();
        for kind in [OutputKind::Document, OutputKind::Social] {
            assert_eq!(compose_prompt(&p, kind), compose_prompt(&p.clone(), kind));
        }
    }

    #[test]
    fn first_items_skips_blanks() {
        assert_eq!(first_items(" a, ,b ,c", 2), vec!["a", "b"]);
        assert!(first_items("", 2).is_empty());
    }
}
