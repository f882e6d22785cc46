//! MARCXML extraction: catalogue export → typed records.
//!
//! The catalogue speaks MARC21: a numeric *tag* names a field, a one-letter
//! *code* names a sub-field inside it. Rather than scattering tag/code
//! literals through per-variant parsing code, every logical field is declared
//! once in [`fields`] as a [`FieldSpec`] and all three record variants are
//! assembled from the same [`MarcRecord`] tree.
//!
//! Feed order is preserved: the catalogue returns newest records first and
//! the dedup stage depends on that.

use crate::config::PipelineConfig;
use crate::error::HarvestError;
use crate::record::{DraftResolution, Record, Vote, VoteRecord};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use tracing::{debug, warn};

// ── Field table ──────────────────────────────────────────────────────────

/// How many values a logical field carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Only the first occurrence is meaningful.
    One,
    /// Every occurrence, in document order.
    Many,
}

/// Location of a logical field in the MARC schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub tag: &'static str,
    pub code: char,
    pub cardinality: Cardinality,
}

impl FieldSpec {
    const fn one(tag: &'static str, code: char) -> Self {
        Self {
            tag,
            code,
            cardinality: Cardinality::One,
        }
    }

    const fn many(tag: &'static str, code: char) -> Self {
        Self {
            tag,
            code,
            cardinality: Cardinality::Many,
        }
    }
}

/// The fields this crate reads.
pub mod fields {
    use super::FieldSpec;

    pub const CONTROL_ID: &str = "001";
    pub const SYMBOL: FieldSpec = FieldSpec::one("191", 'a');
    pub const TITLE: [FieldSpec; 3] = [
        FieldSpec::many("245", 'a'),
        FieldSpec::many("245", 'b'),
        FieldSpec::many("245", 'c'),
    ];
    pub const DATE: FieldSpec = FieldSpec::one("269", 'a');
    pub const PAGES: FieldSpec = FieldSpec::one("300", 'a');
    pub const SUMMARY: FieldSpec = FieldSpec::many("500", 'a');
    pub const NOTES: FieldSpec = FieldSpec::many("591", 'a');
    pub const KEYWORDS: FieldSpec = FieldSpec::many("650", 'a');
    pub const AUTHORS: FieldSpec = FieldSpec::many("710", 'a');
    pub const RESOLUTION: FieldSpec = FieldSpec::one("791", 'a');
    pub const DRAFT_SYMBOL: FieldSpec = FieldSpec::one("993", 'a');

    pub const LINK_TAG: &str = "856";
    pub const LINK_URL: char = 'u';
    pub const LINK_LANGUAGE: char = 'y';

    pub const VOTE_TAG: &str = "967";
    pub const VOTE_COUNTRY: char = 'c';
    pub const VOTE_LETTER: char = 'd';
}

// ── Raw tree ─────────────────────────────────────────────────────────────

/// One `<datafield>` with its sub-fields in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataField {
    pub tag: String,
    pub subfields: Vec<(char, String)>,
}

impl DataField {
    /// First sub-field with `code`.
    pub fn subfield(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, v)| v.as_str())
    }

    /// All sub-fields with `code`.
    pub fn subfields(&self, code: char) -> impl Iterator<Item = &str> {
        self.subfields
            .iter()
            .filter(move |(c, _)| *c == code)
            .map(|(_, v)| v.as_str())
    }
}

/// One `<record>`: control fields plus data fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarcRecord {
    pub control: Vec<(String, String)>,
    pub data: Vec<DataField>,
}

impl MarcRecord {
    pub fn control_field(&self, tag: &str) -> Option<&str> {
        self.control
            .iter()
            .find(|(t, v)| t == tag && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    pub fn datafields<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a DataField> {
        self.data.iter().filter(move |f| f.tag == tag)
    }

    /// Values of a logical field, honouring its cardinality.
    pub fn values(&self, spec: FieldSpec) -> Vec<&str> {
        let all = self
            .datafields(spec.tag)
            .flat_map(|f| f.subfields(spec.code));
        match spec.cardinality {
            Cardinality::One => all.take(1).collect(),
            Cardinality::Many => all.collect(),
        }
    }

    /// First value of a logical field.
    pub fn value(&self, spec: FieldSpec) -> Option<&str> {
        self.datafields(spec.tag)
            .flat_map(|f| f.subfields(spec.code))
            .next()
    }

    fn owned(&self, spec: FieldSpec) -> Vec<String> {
        self.values(spec).into_iter().map(str::to_string).collect()
    }

    fn owned_one(&self, spec: FieldSpec) -> Option<String> {
        self.value(spec).map(str::to_string)
    }

    fn id(&self, index: usize) -> Result<String, HarvestError> {
        self.control_field(fields::CONTROL_ID)
            .map(str::to_string)
            .ok_or(HarvestError::MalformedRecord { index })
    }

    fn title(&self) -> String {
        fields::TITLE
            .iter()
            .flat_map(|spec| self.values(*spec))
            .map(|t| t.trim_matches(|c: char| c == ':' || c == '/' || c.is_whitespace()))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" – ")
    }

    /// First link that points at the English rendition.
    fn english_pdf(&self, config: &PipelineConfig) -> Option<String> {
        self.datafields(fields::LINK_TAG).find_map(|field| {
            let labelled = field
                .subfield(fields::LINK_LANGUAGE)
                .is_some_and(|lang| lang.eq_ignore_ascii_case(&config.language_label));
            field
                .subfields(fields::LINK_URL)
                .find(|url| labelled || url.ends_with(&config.language_suffix))
                .map(str::to_string)
        })
    }

    fn votes(&self) -> BTreeMap<String, Vote> {
        let mut votes = BTreeMap::new();
        for field in self.datafields(fields::VOTE_TAG) {
            let (Some(country), Some(letter)) = (
                field.subfield(fields::VOTE_COUNTRY),
                field.subfield(fields::VOTE_LETTER),
            ) else {
                continue;
            };
            match Vote::from_letter(letter) {
                Some(vote) => {
                    votes.insert(country.to_string(), vote);
                }
                None => debug!("Ignoring vote letter {:?} for {}", letter, country),
            }
        }
        votes
    }
}

// ── Record variants ──────────────────────────────────────────────────────

/// Build a report from a raw record.
///
/// Returns `Ok(None)` when the record has no English PDF: many catalogue
/// entries lack one and they are simply not postable.
pub fn report_from_marc(
    marc: &MarcRecord,
    index: usize,
    config: &PipelineConfig,
) -> Result<Option<Record>, HarvestError> {
    let id = marc.id(index)?;
    let Some(pdf_url) = marc.english_pdf(config) else {
        debug!("Record {} has no English PDF; skipped", id);
        return Ok(None);
    };

    Ok(Some(Record {
        title: marc.title(),
        symbol: marc.owned_one(fields::SYMBOL),
        date: marc.owned_one(fields::DATE),
        pages: marc
            .value(fields::PAGES)
            .map(|p| p.replace(['[', ']'], "")),
        summary: marc.owned(fields::SUMMARY),
        keywords: marc.owned(fields::KEYWORDS),
        pdf_url,
        id,
    }))
}

/// Build a voting record from a raw record.
pub fn vote_record_from_marc(marc: &MarcRecord, index: usize) -> Result<VoteRecord, HarvestError> {
    Ok(VoteRecord {
        id: marc.id(index)?,
        symbol: marc.owned_one(fields::SYMBOL),
        title: marc.title(),
        date: marc.owned_one(fields::DATE),
        votes: marc.votes(),
        notes: marc.owned(fields::NOTES),
        resolution: marc.owned_one(fields::RESOLUTION),
        draft_symbol: marc.owned_one(fields::DRAFT_SYMBOL),
    })
}

/// Build a draft resolution from a raw record.
pub fn draft_from_marc(
    marc: &MarcRecord,
    index: usize,
    config: &PipelineConfig,
) -> Result<DraftResolution, HarvestError> {
    Ok(DraftResolution {
        id: marc.id(index)?,
        summary: marc.owned(fields::SUMMARY),
        keywords: marc.owned(fields::KEYWORDS),
        authors: marc.owned(fields::AUTHORS),
        pdf_url: marc.english_pdf(config),
    })
}

/// Extract postable reports from a MARCXML document, newest first.
///
/// Records without a control identifier are logged and skipped; records
/// without an English PDF are dropped silently.
pub fn extract_reports(xml: &str, config: &PipelineConfig) -> Result<Vec<Record>, HarvestError> {
    let mut out = Vec::new();
    for (index, marc) in parse_marc(xml)?.iter().enumerate() {
        match report_from_marc(marc, index, config) {
            Ok(Some(record)) => out.push(record),
            Ok(None) => {}
            Err(e) => warn!("{}", e),
        }
    }
    debug!("Extracted {} reports", out.len());
    Ok(out)
}

/// Extract voting records from a MARCXML document, newest first.
pub fn extract_resolutions(xml: &str) -> Result<Vec<VoteRecord>, HarvestError> {
    let mut out = Vec::new();
    for (index, marc) in parse_marc(xml)?.iter().enumerate() {
        match vote_record_from_marc(marc, index) {
            Ok(record) => out.push(record),
            Err(e) => warn!("{}", e),
        }
    }
    debug!("Extracted {} voting records", out.len());
    Ok(out)
}

/// Extract draft resolutions from a MARCXML document.
pub fn extract_drafts(
    xml: &str,
    config: &PipelineConfig,
) -> Result<Vec<DraftResolution>, HarvestError> {
    let mut out = Vec::new();
    for (index, marc) in parse_marc(xml)?.iter().enumerate() {
        match draft_from_marc(marc, index, config) {
            Ok(draft) => out.push(draft),
            Err(e) => warn!("{}", e),
        }
    }
    Ok(out)
}

// ── XML parsing ──────────────────────────────────────────────────────────

/// Parse every `<record>` of a MARCXML document.
///
/// Namespace prefixes are ignored (`marc:record` and `record` are the same
/// element). Sub-field text is trimmed of whitespace and surrounding colons;
/// empty sub-fields are dropped.
///
/// The document must be well-formed: exactly one root element, closed
/// before the end of input, and no text outside it.
pub fn parse_marc(xml: &str) -> Result<Vec<MarcRecord>, HarvestError> {
    let mut reader = Reader::from_str(xml);

    let mut records = Vec::new();
    let mut record: Option<MarcRecord> = None;
    let mut control_tag: Option<String> = None;
    let mut datafield: Option<DataField> = None;
    let mut subfield_code: Option<char> = None;
    let mut text = String::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    let parse_err = |reader: &Reader<&[u8]>, detail: String| HarvestError::Parse {
        position: reader.buffer_position(),
        detail,
    };

    loop {
        let event = reader
            .read_event()
            .map_err(|e| parse_err(&reader, e.to_string()))?;
        match event {
            Event::Start(_) | Event::Empty(_) if depth == 0 && seen_root => {
                return Err(parse_err(&reader, "more than one root element".into()));
            }
            Event::Empty(_) if depth == 0 => seen_root = true,
            Event::Text(ref t) if depth == 0 => {
                if !t.iter().all(u8::is_ascii_whitespace) {
                    return Err(parse_err(&reader, "text outside the root element".into()));
                }
            }
            Event::CData(_) if depth == 0 => {
                return Err(parse_err(&reader, "text outside the root element".into()));
            }
            Event::Start(ref e) => {
                depth += 1;
                seen_root = true;
                match e.local_name().as_ref() {
                    b"record" => record = Some(MarcRecord::default()),
                    b"controlfield" if record.is_some() => {
                        control_tag = attribute(e, "tag");
                        text.clear();
                    }
                    b"datafield" if record.is_some() => {
                        datafield = attribute(e, "tag").map(|tag| DataField {
                            tag,
                            subfields: Vec::new(),
                        });
                    }
                    b"subfield" if datafield.is_some() => {
                        subfield_code = attribute(e, "code").and_then(|c| c.chars().next());
                        text.clear();
                    }
                    _ => {}
                }
            }
            Event::Text(ref t) if control_tag.is_some() || subfield_code.is_some() => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| parse_err(&reader, e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(ref t) if control_tag.is_some() || subfield_code.is_some() => {
                text.push_str(&String::from_utf8_lossy(t));
            }
            Event::End(ref e) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"subfield" => {
                        if let (Some(code), Some(field)) =
                            (subfield_code.take(), datafield.as_mut())
                        {
                            let value = normalise(&text);
                            if !value.is_empty() {
                                field.subfields.push((code, value));
                            }
                        }
                    }
                    b"controlfield" => {
                        if let (Some(tag), Some(rec)) = (control_tag.take(), record.as_mut()) {
                            rec.control.push((tag, text.trim().to_string()));
                        }
                    }
                    b"datafield" => {
                        if let (Some(field), Some(rec)) = (datafield.take(), record.as_mut()) {
                            rec.data.push(field);
                        }
                    }
                    b"record" => {
                        if let Some(rec) = record.take() {
                            records.push(rec);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let unclosed = if !seen_root {
        Some("no root element")
    } else if record.is_some() {
        Some("document ended inside a <record> element")
    } else if depth > 0 {
        Some("document ended before the root element was closed")
    } else {
        None
    };
    if let Some(detail) = unclosed {
        return Err(HarvestError::Parse {
            position: xml.len(),
            detail: detail.into(),
        });
    }

    Ok(records)
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.trim().to_string())
}

fn normalise(text: &str) -> String {
    text.trim().trim_matches(':').trim().to_string()
}

/// Undo browser wrapping of an XML response.
///
/// Some fetch paths return the document with a rendering banner line and
/// without its XML declaration.
pub fn clean_feed_text(raw: &str) -> String {
    let body: Vec<&str> = raw
        .lines()
        .filter(|l| !l.starts_with("This XML file does not appear"))
        .collect();
    let body = body.join("\n");
    if body.trim_start().starts_with("<?xml") {
        body
    } else {
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", body)
    }
}
