//! Thread composition: records → ordered, platform-agnostic post units.
//!
//! A thread is a `Vec<PostUnit>`. Unit 0 is the announcement; every later
//! unit replies to it. Links and hashtags are carried as facets over UTF-8
//! byte ranges of the unit text, which is what rich-text post APIs expect.
//!
//! Every unit is kept within `max_length` characters. The only exception is
//! a reply chunk holding a single unbreakable word longer than the budget.

use crate::config::PipelineConfig;
use crate::countries::{self, Country};
use crate::pipeline::chunk::{char_len, chunk_with};
use crate::record::{DraftResolution, Record, Vote, VoteRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ── Post units ───────────────────────────────────────────────────────────

/// An image attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub alt: String,
}

/// What a facet annotates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FacetKind {
    Link { url: String },
    Tag { tag: String },
}

/// An annotation over `text[start..end]` (byte offsets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub start: usize,
    pub end: usize,
    #[serde(flatten)]
    pub kind: FacetKind,
}

/// One post of a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostUnit {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageAttachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<Facet>,
}

impl PostUnit {
    /// A plain-text unit.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn char_len(&self) -> usize {
        char_len(&self.text)
    }

    /// `(display text, url)` for every link facet.
    pub fn links(&self) -> impl Iterator<Item = (&str, &str)> {
        self.facets.iter().filter_map(|f| match &f.kind {
            FacetKind::Link { url } => Some((&self.text[f.start..f.end], url.as_str())),
            FacetKind::Tag { .. } => None,
        })
    }

    /// Hashtag values, without the leading `#`.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.facets.iter().filter_map(|f| match &f.kind {
            FacetKind::Tag { tag } => Some(tag.as_str()),
            FacetKind::Link { .. } => None,
        })
    }
}

/// Incrementally builds a unit's text and its facets.
#[derive(Debug, Default)]
pub struct TextBuilder {
    text: String,
    facets: Vec<Facet>,
}

impl TextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, s: &str) -> &mut Self {
        self.text.push_str(s);
        self
    }

    pub fn link(&mut self, display: &str, url: impl Into<String>) -> &mut Self {
        self.annotate(display, FacetKind::Link { url: url.into() })
    }

    pub fn tag(&mut self, display: &str, tag: impl Into<String>) -> &mut Self {
        self.annotate(display, FacetKind::Tag { tag: tag.into() })
    }

    fn annotate(&mut self, display: &str, kind: FacetKind) -> &mut Self {
        let start = self.text.len();
        self.text.push_str(display);
        self.facets.push(Facet {
            start,
            end: self.text.len(),
            kind,
        });
        self
    }

    pub fn char_len(&self) -> usize {
        char_len(&self.text)
    }

    pub fn build(self) -> PostUnit {
        PostUnit {
            text: self.text,
            images: Vec::new(),
            facets: self.facets,
        }
    }
}

// ── Formatting helpers ───────────────────────────────────────────────────

/// Format an ISO-8601 date as "Weekday, Mon D".
pub fn format_date(iso: &str) -> Option<String> {
    let iso = iso.trim();
    NaiveDate::parse_from_str(iso, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(iso, "%Y%m%d"))
        .ok()
        .map(|d| d.format("%A, %b %-d").to_string())
}

/// Shorten `title` so that it fits beside `base_length` characters of fixed
/// text within `max_length`.
pub fn truncate_title(title: &str, base_length: usize, max_length: usize) -> String {
    if char_len(title) + base_length <= max_length {
        return title.to_string();
    }
    let keep = max_length.saturating_sub(base_length + 3);
    let mut short: String = title.chars().take(keep).collect();
    short.push_str("...");
    short
}

/// Python-style title case: a letter is upper-cased when it does not follow
/// another letter, lower-cased otherwise.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Hashtag for a subject heading: `(display, tag value)`.
///
/// `"CHILDREN'S RIGHTS"` → `("#ChildrensRights", "childrensrights")`.
pub fn hashtag(keyword: &str) -> (String, String) {
    let cleaned = keyword.replace(['\'', '’'], "");
    let display: String = title_case(&cleaned)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let tag = display.to_lowercase();
    (format!("#{display}"), tag)
}

/// A unit of hashtags, filled in keyword order until the next tag would not
/// fit. Remaining keywords are dropped.
pub fn hashtag_unit(keywords: &[String], max_length: usize) -> Option<PostUnit> {
    let mut builder = TextBuilder::new();
    let mut added = 0;
    for (i, keyword) in keywords.iter().enumerate() {
        let (display, tag) = hashtag(keyword);
        if tag.is_empty() {
            continue;
        }
        let sep = usize::from(added > 0);
        if builder.char_len() + sep + char_len(&display) > max_length {
            debug!(
                "Hashtag line full; dropped {} keywords",
                keywords.len() - i
            );
            break;
        }
        if added > 0 {
            builder.text(" ");
        }
        builder.tag(&display, tag);
        added += 1;
    }
    (added > 0).then(|| builder.build())
}

fn attach_images(unit: &mut PostUnit, images: Vec<Vec<u8>>, what: &str) {
    unit.images = images
        .into_iter()
        .enumerate()
        .map(|(i, bytes)| ImageAttachment {
            bytes,
            alt: format!("Screenshot of page {} of the {}", i + 1, what),
        })
        .collect();
}

fn announcement(headline: &str, date: Option<&str>, id: &str) -> String {
    match date.and_then(format_date) {
        Some(d) => format!("{headline} From {d}:\n\n"),
        None => {
            warn!("Record {} has a missing or invalid date {:?}", id, date);
            format!("{headline}\n\n")
        }
    }
}

fn reply_units<'a>(
    paragraphs: impl IntoIterator<Item = &'a String>,
    config: &PipelineConfig,
) -> Vec<PostUnit> {
    paragraphs
        .into_iter()
        .flat_map(|p| chunk_with(p, config.reply_length(), &config.abbreviations))
        .map(PostUnit::plain)
        .collect()
}

// ── Reports ──────────────────────────────────────────────────────────────

/// Compose the thread for a report.
///
/// `images` are the rendered preview pages, `extra_paragraphs` an optional
/// richer summary fetched from the document itself.
pub fn compose_report(
    record: &Record,
    images: Vec<Vec<u8>>,
    extra_paragraphs: &[String],
    config: &PipelineConfig,
) -> Vec<PostUnit> {
    let mut root = report_root(record, config, true);
    if root.char_len() > config.max_length {
        debug!("Root of {} too long with page count; dropping it", record.id);
        root = report_root(record, config, false);
    }
    attach_images(&mut root, images, "report");

    let mut units = vec![root];
    units.extend(reply_units(
        record.summary.iter().chain(extra_paragraphs),
        config,
    ));
    units.extend(hashtag_unit(&record.keywords, config.max_length));
    units
}

fn report_root(record: &Record, config: &PipelineConfig, with_pages: bool) -> PostUnit {
    let title = truncate_title(&record.title, config.report_base_length, config.max_length);
    let mut b = TextBuilder::new();
    b.text(&announcement(
        "New report released!",
        record.date.as_deref(),
        &record.id,
    ))
    .text(&format!("❞ {title}\n\n→ "))
    .link("Read it here", config.record_url(&record.id));
    if let (true, Some(pages)) = (with_pages, &record.pages) {
        b.text(&format!(" ({pages})"));
    }
    b.build()
}

// ── Resolutions ──────────────────────────────────────────────────────────

const VOTES_LINK: &str = "Find voting data and transcript here";

/// Compose the thread for an adopted resolution and its draft.
pub fn compose_resolution(
    record: &VoteRecord,
    draft: &DraftResolution,
    images: Vec<Vec<u8>>,
    config: &PipelineConfig,
) -> Vec<PostUnit> {
    let title = truncate_title(&record.title, config.resolution_base_length, config.max_length);
    let mut b = TextBuilder::new();
    b.text(&announcement(
        "New resolution adopted!",
        record.date.as_deref(),
        &record.id,
    ))
    .text(&format!("❞ {title}"));

    let sponsors: Vec<&str> = draft
        .authors
        .iter()
        .filter_map(|a| countries::by_name(a))
        .map(|c| c.alpha3)
        .collect();
    if !sponsors.is_empty() {
        let flag_text = format!("\n\nAuthored by {}", countries::flags(sponsors));
        if config.resolution_base_length + char_len(&title) + char_len(&flag_text)
            <= config.max_length
        {
            b.text(&flag_text);
        }
    }
    b.text("\n\n→ ")
        .link("Read the draft resolution here", config.record_url(&draft.id));

    let mut root = b.build();
    attach_images(&mut root, images, "draft resolution");

    let mut units = vec![root, votes_unit(record, config)];
    units.extend(reply_units(&draft.summary, config));
    units.extend(hashtag_unit(&draft.keywords, config.max_length));
    units
}

/// The tally reply: one line per vote with population-ordered flags, or
/// "Adopted without vote." when there was no recorded vote.
pub fn votes_unit(record: &VoteRecord, config: &PipelineConfig) -> PostUnit {
    let tail = format!("→ {VOTES_LINK}");
    let budget = config.max_length.saturating_sub(char_len(&tail));

    let mut b = TextBuilder::new();
    if !record.votes.is_empty() {
        b.text(&votes_text(record, budget));
    } else if record.adopted_without_vote() {
        b.text("Adopted without vote.\n\n");
    }
    b.text("→ ").link(VOTES_LINK, config.record_url(&record.id));
    b.build()
}

fn votes_text(record: &VoteRecord, budget: usize) -> String {
    let groups: Vec<(Vote, Vec<&'static Country>)> = Vote::ALL
        .iter()
        .map(|v| (*v, countries::by_population(record.countries_voting(*v))))
        .collect();
    // Count and colon follow the recorded codes, flags only the known ones.
    let prefixes: Vec<String> = Vote::ALL
        .iter()
        .map(|vote| {
            let codes = record.countries_voting(*vote);
            let colon = if codes.is_empty() { "" } else { ": " };
            format!("{}x {}{}", codes.len(), vote.label(), colon)
        })
        .collect();

    let header = "Votes:\n\n";
    let fixed = char_len(header) + prefixes.iter().map(|p| char_len(p) + 1).sum::<usize>() + 1;
    let mut remaining = budget.saturating_sub(fixed);

    // No and Abstention lists are short; they are served before Yes.
    let mut rendered = vec![String::new(); groups.len()];
    for i in [1, 2, 0] {
        let (flags, used) = fit_flags(&groups[i].1, remaining);
        remaining -= used;
        rendered[i] = flags;
    }

    let mut text = String::from(header);
    for (prefix, flags) in prefixes.iter().zip(&rendered) {
        text.push_str(prefix);
        text.push_str(flags);
        text.push('\n');
    }
    text.push('\n');
    text
}

/// As many flags as fit in `avail` characters, with `…` when truncated.
fn fit_flags(list: &[&Country], avail: usize) -> (String, usize) {
    let full: String = list.iter().map(|c| c.flag()).collect();
    let full_len = char_len(&full);
    if full_len <= avail {
        return (full, full_len);
    }
    if avail == 0 {
        return (String::new(), 0);
    }
    let mut out = String::new();
    let mut used = 0;
    for flag in list.iter().map(|c| c.flag()) {
        let len = char_len(&flag);
        if used + len + 1 > avail {
            break;
        }
        out.push_str(&flag);
        used += len;
    }
    out.push('…');
    (out, used + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record() -> Record {
        Record {
            id: "4093287".into(),
            symbol: Some("A/80/312".into()),
            title: "Situation of human rights in Myanmar".into(),
            date: Some("2025-10-17".into()),
            pages: Some("21 p.".into()),
            summary: vec![],
            keywords: vec![],
            pdf_url: "https://example.org/A_80_312-EN.pdf".into(),
        }
    }

    fn vote_record(votes: BTreeMap<String, Vote>, notes: Vec<String>) -> VoteRecord {
        VoteRecord {
            id: "4090001".into(),
            symbol: None,
            title: "Promotion of peace".into(),
            date: Some("2025-10-01".into()),
            votes,
            notes,
            resolution: None,
            draft_symbol: Some("A/80/L.3".into()),
        }
    }

    #[test]
    fn date_format() {
        assert_eq!(format_date("2025-10-17").as_deref(), Some("Friday, Oct 17"));
        assert_eq!(format_date("20250102").as_deref(), Some("Thursday, Jan 2"));
        assert_eq!(format_date("soon"), None);
    }

    #[test]
    fn title_truncation() {
        let title = "t".repeat(250);
        let short = truncate_title(&title, 80, 300);
        assert_eq!(char_len(&short), 220);
        assert!(short.ends_with("..."));
        assert_eq!(&short[..217], &title[..217]);

        let fits = "t".repeat(220);
        assert_eq!(truncate_title(&fits, 80, 300), fits);
    }

    #[test]
    fn hashtags() {
        assert_eq!(
            hashtag("CHILDREN'S RIGHTS"),
            ("#ChildrensRights".to_string(), "childrensrights".to_string())
        );
        assert_eq!(hashtag("SELF-DETERMINATION OF PEOPLES").0, "#SelfDeterminationOfPeoples");
        assert_eq!(hashtag("COVID-19").0, "#Covid19");
    }

    #[test]
    fn hashtag_line_stops_at_first_overflow() {
        let keywords: Vec<String> = vec!["AAAA".into(), "B".repeat(20), "CC".into()];
        let unit = hashtag_unit(&keywords, 15).unwrap();
        assert_eq!(unit.text, "#Aaaa");
        assert_eq!(unit.tags().collect::<Vec<_>>(), vec!["aaaa"]);
        assert!(hashtag_unit(&[], 300).is_none());
    }

    #[test]
    fn hashtag_line_respects_limit() {
        let keywords: Vec<String> = (0..80).map(|i| format!("KEYWORD NUMBER {i}")).collect();
        let unit = hashtag_unit(&keywords, 300).unwrap();
        assert!(unit.char_len() <= 300);
        for (f, tag) in unit.facets.iter().zip(unit.tags()) {
            assert_eq!(&unit.text[f.start + 1..f.end].to_lowercase(), tag);
        }
    }

    #[test]
    fn report_root_layout() {
        let config = PipelineConfig::default();
        let units = compose_report(&record(), vec![vec![1, 2, 3]], &[], &config);
        assert_eq!(units.len(), 1);
        let root = &units[0];
        assert!(root.text.starts_with("New report released! From Friday, Oct 17:"));
        assert!(root.text.contains("❞ Situation of human rights in Myanmar"));
        assert!(root.text.ends_with("Read it here (21 p.)"));
        let links: Vec<_> = root.links().collect();
        assert_eq!(
            links,
            vec![(
                "Read it here",
                "https://digitallibrary.un.org/record/4093287?ln=en&v=pdf"
            )]
        );
        assert_eq!(root.images.len(), 1);
        assert_eq!(root.images[0].alt, "Screenshot of page 1 of the report");
    }

    #[test]
    fn invalid_date_degrades() {
        let mut r = record();
        r.date = Some("unknown".into());
        let units = compose_report(&r, vec![], &[], &PipelineConfig::default());
        assert!(units[0].text.starts_with("New report released!\n\n❞"));
    }

    #[test]
    fn oversized_page_annotation_is_dropped() {
        let mut r = record();
        r.title = "t".repeat(400);
        r.pages = Some("p".repeat(60));
        let config = PipelineConfig::default();
        let units = compose_report(&r, vec![], &[], &config);
        assert!(units[0].char_len() <= config.max_length);
        assert!(!units[0].text.contains("ppp"));
    }

    #[test]
    fn replies_follow_summary_then_extra_then_tags() {
        let mut r = record();
        r.summary = vec!["First note.".into()];
        r.keywords = vec!["HUMAN RIGHTS".into()];
        let extra = vec!["Richer summary.".into()];
        let units = compose_report(&r, vec![], &extra, &PipelineConfig::default());
        let texts: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(&texts[1..], &["First note.", "Richer summary.", "#HumanRights"]);
    }

    #[test]
    fn votes_tally() {
        let votes: BTreeMap<String, Vote> = [
            ("FRA", Vote::Yes),
            ("IND", Vote::Yes),
            ("USA", Vote::No),
            ("ISR", Vote::Abstention),
        ]
        .into_iter()
        .map(|(c, v)| (c.to_string(), v))
        .collect();
        let unit = votes_unit(&vote_record(votes, vec![]), &PipelineConfig::default());
        assert!(unit.text.starts_with("Votes:\n\n2x Yes: 🇮🇳🇫🇷\n1x No: 🇺🇸\n1x Abstention: 🇮🇱\n\n→ "));
        assert_eq!(unit.links().count(), 1);
    }

    #[test]
    fn empty_vote_group_has_no_colon() {
        let votes: BTreeMap<String, Vote> = [("FRA".to_string(), Vote::Yes)].into_iter().collect();
        let unit = votes_unit(&vote_record(votes, vec![]), &PipelineConfig::default());
        assert!(unit.text.contains("0x No\n"));
        assert!(unit.text.contains("0x Abstention\n"));
    }

    #[test]
    fn unknown_codes_count_and_keep_the_colon() {
        let votes: BTreeMap<String, Vote> = [("XXA", Vote::Yes), ("XXB", Vote::Yes)]
            .into_iter()
            .map(|(c, v)| (c.to_string(), v))
            .collect();
        let unit = votes_unit(&vote_record(votes, vec![]), &PipelineConfig::default());
        assert!(unit.text.starts_with("Votes:\n\n2x Yes: \n0x No\n"), "{}", unit.text);
    }

    #[test]
    fn adopted_without_vote() {
        let unit = votes_unit(
            &vote_record(BTreeMap::new(), vec!["ADOPTED WITHOUT VOTE".into()]),
            &PipelineConfig::default(),
        );
        assert!(unit.text.starts_with("Adopted without vote.\n\n→ "));

        let unit = votes_unit(&vote_record(BTreeMap::new(), vec![]), &PipelineConfig::default());
        assert!(unit.text.starts_with("→ "));
    }

    #[test]
    fn full_assembly_vote_fits() {
        let votes: BTreeMap<String, Vote> = countries::COUNTRIES
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let vote = match i % 20 {
                    0 => Vote::No,
                    1 => Vote::Abstention,
                    _ => Vote::Yes,
                };
                (c.alpha3.to_string(), vote)
            })
            .collect();
        let config = PipelineConfig::default();
        let unit = votes_unit(&vote_record(votes, vec![]), &config);
        assert!(unit.char_len() <= config.max_length, "{}", unit.char_len());
        assert!(unit.text.contains('…'));
        assert!(unit.text.contains("x No: "));
    }

    #[test]
    fn resolution_thread_shape() {
        let votes: BTreeMap<String, Vote> = [("GHA".to_string(), Vote::Yes)].into_iter().collect();
        let draft = DraftResolution {
            id: "4089000".into(),
            summary: vec!["The Assembly decides.".into()],
            keywords: vec!["PEACE".into()],
            authors: vec!["Ghana".into(), "France".into(), "Atlantis".into()],
            pdf_url: Some("https://example.org/L3-EN.pdf".into()),
        };
        let config = PipelineConfig::default();
        let units = compose_resolution(&vote_record(votes, vec![]), &draft, vec![vec![0]], &config);
        assert_eq!(units.len(), 4);
        let root = &units[0];
        assert!(root.text.starts_with("New resolution adopted! From Wednesday, Oct 1:"));
        assert!(root.text.contains("Authored by 🇫🇷🇬🇭"));
        assert_eq!(
            root.links().next().map(|(_, url)| url),
            Some("https://digitallibrary.un.org/record/4089000?ln=en&v=pdf")
        );
        assert_eq!(root.images[0].alt, "Screenshot of page 1 of the draft resolution");
        assert!(units[1].text.starts_with("Votes:"));
        assert_eq!(units[2].text, "The Assembly decides.");
        assert_eq!(units[3].text, "#Peace");
        assert!(units.iter().all(|u| u.char_len() <= config.max_length));
    }

    #[test]
    fn facets_cover_display_text() {
        let mut b = TextBuilder::new();
        b.text("❞ ").link("here", "https://example.org");
        let unit = b.build();
        assert_eq!(&unit.text[unit.facets[0].start..unit.facets[0].end], "here");
    }
}
