//! Integration tests for un-threads.
//!
//! Everything except the pdfium test runs offline against in-memory feeds.
//! The pdfium test is gated behind `PDFIUM_TESTS` and needs a PDF at
//! `PDFIUM_TEST_PDF`:
//!
//!   PDFIUM_TESTS=1 PDFIUM_TEST_PDF=report.pdf cargo test --test pipeline -- --nocapture

use std::collections::HashSet;
use un_threads::pipeline::chunk::char_len;
use un_threads::{
    compose_report, extract_reports, extract_resolutions, next_unposted, DocumentSource,
    DraftLookup, DraftResolution, Harvester, HarvestError, Ledger, NoPreview, OutboxPublisher,
    PdfiumRenderer, PipelineConfig, Platform, Publisher, RenderConfig, Renderer, Status,
};

// ── Fixtures ─────────────────────────────────────────────────────────────────

const REPORTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<collection xmlns="http://www.loc.gov/MARC21/slim">
  <record>
    <controlfield tag="001">4093300</controlfield>
    <datafield tag="245" ind1="1" ind2="0"><subfield code="a">Only in French</subfield></datafield>
    <datafield tag="856" ind1="4" ind2=" "><subfield code="u">https://example.org/A_80_400-FR.pdf</subfield></datafield>
  </record>
  <record>
    <controlfield tag="001">4093287</controlfield>
    <datafield tag="191" ind1=" " ind2=" "><subfield code="a">A/80/312</subfield></datafield>
    <datafield tag="245" ind1="1" ind2="0"><subfield code="a">Situation of human rights in Myanmar</subfield></datafield>
    <datafield tag="269" ind1=" " ind2=" "><subfield code="a">2025-10-17</subfield></datafield>
    <datafield tag="300" ind1=" " ind2=" "><subfield code="a">[21] p.</subfield></datafield>
    <datafield tag="650" ind1=" " ind2="7"><subfield code="a">HUMAN RIGHTS</subfield></datafield>
    <datafield tag="856" ind1="4" ind2=" "><subfield code="u">https://example.org/A_80_312-EN.pdf</subfield></datafield>
  </record>
</collection>"#;

const VOTES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<collection xmlns="http://www.loc.gov/MARC21/slim">
  <record>
    <controlfield tag="001">4090001</controlfield>
    <datafield tag="245" ind1="1" ind2="0"><subfield code="a">Promotion of a culture of peace</subfield></datafield>
    <datafield tag="269" ind1=" " ind2=" "><subfield code="a">2025-10-01</subfield></datafield>
    <datafield tag="967" ind1=" " ind2=" "><subfield code="c">FRA</subfield><subfield code="d">Y</subfield></datafield>
    <datafield tag="967" ind1=" " ind2=" "><subfield code="c">GHA</subfield><subfield code="d">Y</subfield></datafield>
    <datafield tag="967" ind1=" " ind2=" "><subfield code="c">USA</subfield><subfield code="d">N</subfield></datafield>
    <datafield tag="993" ind1=" " ind2=" "><subfield code="a">A/80/L.3</subfield></datafield>
  </record>
</collection>"#;

fn paragraph(chars: usize) -> String {
    let sentence = "The Special Rapporteur documents continued violations across the country. ";
    let mut text = sentence.repeat(chars / sentence.len() + 1);
    text.truncate(chars);
    text.trim_end().to_string()
}

struct OfflineLibrary;

impl DocumentSource for OfflineLibrary {
    fn pdf(&self, url: &str) -> Result<Vec<u8>, HarvestError> {
        Err(HarvestError::DownloadFailed {
            url: url.into(),
            reason: "offline".into(),
        })
    }

    fn summary_docx(&self, symbol: &str) -> Result<Vec<u8>, HarvestError> {
        Err(HarvestError::Docx(format!("no rendition of {symbol}")))
    }
}

impl DraftLookup for OfflineLibrary {
    fn lookup(&self, symbol: &str) -> Result<Option<DraftResolution>, HarvestError> {
        Ok(Some(DraftResolution {
            id: "4089000".into(),
            summary: vec![paragraph(400)],
            keywords: vec!["PEACE".into(), "CULTURE OF PEACE".into()],
            authors: vec!["Ghana".into()],
            pdf_url: Some(format!("https://example.org/{}-EN.pdf", symbol.replace('/', "_"))),
        }))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn feed_to_thread() {
    let config = PipelineConfig::default();
    let reports = extract_reports(REPORTS, &config).unwrap();
    assert_eq!(reports.len(), 1, "record without English PDF is dropped");

    let record = next_unposted(&reports, &HashSet::new()).unwrap();
    let units = compose_report(record, vec![], &[paragraph(500)], &config);

    assert!(units.len() >= 3, "root plus at least two replies");
    assert!(units[0].text.contains("❞ Situation of human rights in Myanmar"));
    for reply in &units[1..units.len() - 1] {
        assert!(char_len(&reply.text) <= config.reply_length(), "{}", reply.text);
    }
    for unit in &units {
        assert!(unit.char_len() <= config.max_length);
    }
    assert_eq!(units.last().unwrap().text, "#HumanRights");
}

#[test]
fn harvest_into_outbox() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::default();
    let reports = extract_reports(REPORTS, &config).unwrap();
    let resolutions = extract_resolutions(VOTES).unwrap();

    let mut ledger = Ledger::load(dir.path().join("posted.json")).unwrap();
    let outbox_root = dir.path().join("outbox");
    let mut publishers: Vec<Box<dyn Publisher>> = Platform::ALL
        .iter()
        .map(|&p| {
            Box::new(
                OutboxPublisher::new(&outbox_root, p)
                    .unwrap()
                    .with_max_length(config.max_length),
            ) as Box<dyn Publisher>
        })
        .collect();

    let library = OfflineLibrary;
    let harvester = Harvester::new(&config, &library, &library, &NoPreview);
    let run = harvester.run(&reports, &resolutions, &mut publishers, &mut ledger);

    assert_eq!(run.failures().count(), 0, "{:?}", run.outcomes);
    assert_eq!(run.posted(), 4);

    let saved = Ledger::load(dir.path().join("posted.json")).unwrap();
    for platform in Platform::ALL {
        let ids = saved.published(platform);
        assert!(ids.contains("4093287"));
        assert!(ids.contains("4090001"));
        assert!(ids.contains("4089000"));
    }

    // A second run finds nothing new.
    let mut ledger = saved;
    let run = harvester.run(&reports, &resolutions, &mut publishers, &mut ledger);
    assert!(run
        .outcomes
        .iter()
        .all(|o| matches!(o.status, Status::NothingNew)));

    // Links in the outbox recover the ledger if it is lost.
    let outbox = OutboxPublisher::new(&outbox_root, Platform::X).unwrap();
    let mut fresh = Ledger::load(dir.path().join("lost.json")).unwrap();
    let links = outbox.links().unwrap();
    fresh.reconcile(Platform::X, links.iter().map(String::as_str));
    for id in ["4093287", "4090001", "4089000"] {
        assert!(fresh.contains(Platform::X, id), "missing {id}");
    }
}

#[test]
fn votes_thread_layout() {
    let config = PipelineConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let mut ledger = Ledger::load(dir.path().join("posted.json")).unwrap();
    let resolutions = extract_resolutions(VOTES).unwrap();
    let library = OfflineLibrary;
    let harvester = Harvester::new(&config, &library, &library, &NoPreview).dry_run(true);
    let mut publishers: Vec<Box<dyn Publisher>> =
        vec![Box::new(OutboxPublisher::new(dir.path(), Platform::Bluesky).unwrap())];

    let run = harvester.run(&[], &resolutions, &mut publishers, &mut ledger);
    let Status::Composed { units, .. } = &run.outcomes[1].status else {
        panic!("expected a composed resolution, got {:?}", run.outcomes[1]);
    };
    assert!(units[0].text.starts_with("New resolution adopted! From Wednesday, Oct 1:"));
    assert!(units[0].text.contains("Authored by 🇬🇭"));
    assert!(units[1]
        .text
        .starts_with("Votes:\n\n2x Yes: 🇫🇷🇬🇭\n1x No: 🇺🇸\n0x Abstention\n\n→ "));
    assert_eq!(units.last().unwrap().text, "#Peace #CultureOfPeace");
    assert!(units.iter().all(|u| u.char_len() <= config.max_length));
}

#[test]
fn pdfium_renders_previews_under_budget() {
    if std::env::var("PDFIUM_TESTS").is_err() {
        println!("SKIP — set PDFIUM_TESTS=1 to run pdfium tests");
        return;
    }
    let Ok(path) = std::env::var("PDFIUM_TEST_PDF") else {
        println!("SKIP — set PDFIUM_TEST_PDF to a PDF file");
        return;
    };
    let pdf = std::fs::read(&path).unwrap();
    let render = RenderConfig::default();
    let renderer = PdfiumRenderer::bind(render.clone()).unwrap();

    let images = renderer.render(&pdf, &render.pages);
    assert_eq!(images.len(), render.pages.len());
    for image in images.into_iter().flatten() {
        assert_eq!(&image[..2], &[0xFF, 0xD8]);
        assert!(image.len() <= render.byte_budget);
    }

    assert_eq!(renderer.render(b"not a pdf", &[0, 1]), vec![None, None]);
}
